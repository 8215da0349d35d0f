use crate::catalog::{self, STANDARD_RATIOS};
use crate::error::{RatioEngineError, Result};
use crate::forecast::ForecastPair;
use crate::normalizer::{normalize, same_field};
use crate::pipeline::{formula_identifiers, FormulaPipeline};
use crate::resolver::resolve_exact;
use crate::schema::{EngineConfig, ExtractedValues, PeriodData, RatioGroups, RatioKind, RatioRecord, RatioValue};
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodReport {
    pub label: String,
    pub period_end: Option<NaiveDate>,
    pub ratios: RatioGroups,
    /// Ratios that arrived without a value and were computed here.
    pub filled: usize,
}

impl PeriodReport {
    pub fn ratio(&self, category: &str, name: &str) -> Option<&RatioRecord> {
        self.ratios.get(category).and_then(|group| group.get(name))
    }
}

/// Ratios for every period plus line-item forecasts from the two latest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeReport {
    /// Oldest first.
    pub periods: Vec<PeriodReport>,
    pub forecasts: Vec<ForecastPair>,
}

impl ComparativeReport {
    pub fn build(periods: &[PeriodData], config: &EngineConfig) -> Result<Self> {
        ReportBuilder::new(config).build(periods)
    }

    pub fn period(&self, label: &str) -> Option<&PeriodReport> {
        self.periods.iter().find(|p| p.label == label)
    }

    pub fn current(&self) -> Option<&PeriodReport> {
        self.periods.last()
    }

    pub fn forecast(&self, line_item: &str) -> Option<&ForecastPair> {
        self.forecasts
            .iter()
            .find(|f| same_field(&f.line_item, line_item))
    }
}

pub struct ReportBuilder<'a> {
    config: &'a EngineConfig,
    pipeline: FormulaPipeline<'a>,
}

struct PendingRatio {
    category: String,
    name: String,
    /// Names of sibling ratios the formula refers to.
    references: Vec<String>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            pipeline: FormulaPipeline::new(config),
        }
    }

    pub fn build(&self, periods: &[PeriodData]) -> Result<ComparativeReport> {
        self.config.validate()?;
        if periods.is_empty() {
            return Err(RatioEngineError::NoPeriods);
        }

        let mut ordered: Vec<&PeriodData> = periods.iter().collect();
        ordered.sort_by(|a, b| (a.period_end, &a.label).cmp(&(b.period_end, &b.label)));

        let period_reports: Vec<PeriodReport> =
            ordered.iter().map(|period| self.fill_period(period)).collect();

        let current = ordered[ordered.len() - 1];
        let prior = ordered.len().checked_sub(2).map(|idx| ordered[idx]);
        let forecasts = self.forecast_line_items(current, prior);

        info!(
            "Built comparative report: {} periods, {} ratios filled, {} forecasts (current '{}', prior {:?})",
            period_reports.len(),
            period_reports.iter().map(|p| p.filled).sum::<usize>(),
            forecasts.len(),
            current.label,
            prior.map(|p| p.label.as_str())
        );

        Ok(ComparativeReport {
            periods: period_reports,
            forecasts,
        })
    }

    /// Fills every unset ratio of one period. Ratios whose formula names a
    /// sibling ratio are computed after it, and only once it has a value.
    pub fn fill_period(&self, period: &PeriodData) -> PeriodReport {
        let mut ratios = period.ratios.clone();
        if self.config.seed_standard_catalog {
            seed_catalog(&mut ratios);
        }

        let ratio_names: Vec<String> = ratios
            .values()
            .flat_map(|group| group.keys().cloned())
            .collect();

        let mut independent = Vec::new();
        let mut dependent = Vec::new();
        for (category, group) in &ratios {
            for (name, record) in group {
                if !record.is_unset() || record.formula.is_none() {
                    continue;
                }
                let references = ratio_references(record, name, &ratio_names, &period.values);
                let pending = PendingRatio {
                    category: category.clone(),
                    name: name.clone(),
                    references,
                };
                if pending.references.is_empty() {
                    independent.push(pending);
                } else {
                    dependent.push(pending);
                }
            }
        }

        let mut filled = 0;
        for pending in &independent {
            if self.fill_one(&mut ratios, pending, period) {
                filled += 1;
            }
        }

        loop {
            let (ready, waiting): (Vec<_>, Vec<_>) = dependent
                .into_iter()
                .partition(|p| p.references.iter().all(|r| numeric_ratio(&ratios, r).is_some()));
            dependent = waiting;

            for pending in &ready {
                if self.fill_one(&mut ratios, pending, period) {
                    filled += 1;
                }
            }

            if ready.is_empty() {
                break;
            }
        }

        for pending in &dependent {
            debug!(
                "Period '{}': '{}' left unset, referenced ratios {:?} have no value",
                period.label, pending.name, pending.references
            );
        }

        PeriodReport {
            label: period.label.clone(),
            period_end: period.period_end,
            ratios,
            filled,
        }
    }

    fn fill_one(&self, ratios: &mut RatioGroups, pending: &PendingRatio, period: &PeriodData) -> bool {
        let Some(existing) = ratios
            .get(&pending.category)
            .and_then(|group| group.get(&pending.name))
            .cloned()
        else {
            return false;
        };

        let scope = if pending.references.is_empty() {
            period.values.clone()
        } else {
            let siblings: Vec<(String, f64)> = ratios
                .values()
                .flat_map(|group| group.iter())
                .filter_map(|(name, record)| record.value.numeric().map(|v| (name.clone(), v)))
                .collect();
            period.values.extended_with(siblings)
        };

        let mut record = self.pipeline.fill_missing(&existing, None, &scope);
        if let Some(value) = record.value.numeric() {
            if self.config.infer_day_count && is_day_count(&pending.name) {
                record.value = RatioValue::Days(value);
            }
        }

        let filled = !record.is_unset();
        if let Some(group) = ratios.get_mut(&pending.category) {
            group.insert(pending.name.clone(), record);
        }
        filled
    }

    /// Pairs line items of the two latest periods by normalized label.
    pub fn forecast_line_items(
        &self,
        current: &PeriodData,
        prior: Option<&PeriodData>,
    ) -> Vec<ForecastPair> {
        let wanted: Option<HashSet<String>> = self
            .config
            .forecast_line_items
            .as_ref()
            .map(|items| items.iter().map(|item| normalize(item)).collect());

        let labels = current
            .values
            .labels()
            .chain(prior.into_iter().flat_map(|p| p.values.labels()));

        let mut seen = HashSet::new();
        let mut forecasts = Vec::new();
        for label in labels {
            let key = normalize(label);
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            if let Some(wanted) = &wanted {
                if !wanted.contains(&key) {
                    continue;
                }
            }

            let current_value = current.values.get_normalized(label).map(|(_, v)| v);
            let prior_value = prior
                .and_then(|p| p.values.get_normalized(label))
                .map(|(_, v)| v);
            forecasts.push(ForecastPair::new(label, current_value, prior_value));
        }

        forecasts
    }
}

fn seed_catalog(ratios: &mut RatioGroups) {
    for entry in STANDARD_RATIOS {
        let present = ratios
            .values()
            .flat_map(|group| group.keys())
            .any(|name| same_field(name, entry.name));
        if !present {
            ratios
                .entry(entry.category.to_string())
                .or_default()
                .insert(entry.name.to_string(), entry.seed_record());
        }
    }
}

/// Formula identifiers naming another ratio of the period or of the catalog
/// that the period's extracted values do not answer directly.
fn ratio_references(
    record: &RatioRecord,
    own_name: &str,
    ratio_names: &[String],
    values: &ExtractedValues,
) -> Vec<String> {
    let Some(formula) = record.formula.as_deref() else {
        return Vec::new();
    };

    formula_identifiers(formula)
        .into_iter()
        .filter(|ident| !same_field(ident, own_name))
        .filter(|ident| {
            ratio_names.iter().any(|name| same_field(name, ident))
                || catalog::lookup(ident).is_some()
        })
        .filter(|ident| !resolve_exact(ident, values).is_resolved())
        .collect()
}

fn numeric_ratio(ratios: &RatioGroups, name: &str) -> Option<f64> {
    ratios
        .values()
        .flat_map(|group| group.iter())
        .find(|(candidate, _)| same_field(candidate, name))
        .and_then(|(_, record)| record.value.numeric())
}

/// "Days Sales Outstanding (DSO)", "Inventory Days", "DPO".
fn is_day_count(name: &str) -> bool {
    if let Some(entry) = catalog::lookup(name) {
        return entry.kind == RatioKind::Days;
    }
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| {
            word.eq_ignore_ascii_case("days")
                || word.eq_ignore_ascii_case("dso")
                || word.eq_ignore_ascii_case("dio")
                || word.eq_ignore_ascii_case("dpo")
        })
}
