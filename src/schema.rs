use crate::error::{RatioEngineError, Result};
use crate::normalizer::normalize;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One period's label -> value mapping as handed over by the extraction step.
///
/// Labels keep their original casing and punctuation; "Net Sales" and
/// "NET SALES" may both be present and are not merged. Iteration order is the
/// lexicographic order of the raw labels, which is what first-match-wins
/// resolution walks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "BTreeMap<String, f64>")]
pub struct ExtractedValues {
    entries: BTreeMap<String, f64>,
}

impl ExtractedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries.get(label).copied()
    }

    /// Lookup by normalized key; the first matching raw label wins.
    pub fn get_normalized(&self, label: &str) -> Option<(&str, f64)> {
        let key = normalize(label);
        if key.is_empty() {
            return None;
        }
        self.iter().find(|(raw, _)| normalize(raw) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a new mapping with `extra` entries appended. An extra entry is
    /// skipped when a label with the same normalized key is already present,
    /// so extracted figures always take precedence.
    pub fn extended_with<I>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut entries = self.entries.clone();
        let mut keys: HashSet<String> = entries.keys().map(|k| normalize(k)).collect();

        for (label, value) in extra {
            let key = normalize(&label);
            if key.is_empty() || !value.is_finite() || !keys.insert(key) {
                continue;
            }
            entries.insert(label, value);
        }

        Self { entries }
    }
}

impl FromIterator<(String, f64)> for ExtractedValues {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, f64)> for ExtractedValues {
    fn from_iter<T: IntoIterator<Item = (&'a str, f64)>>(iter: T) -> Self {
        iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl From<BTreeMap<String, f64>> for ExtractedValues {
    fn from(entries: BTreeMap<String, f64>) -> Self {
        Self { entries }
    }
}

impl From<ExtractedValues> for BTreeMap<String, f64> {
    fn from(values: ExtractedValues) -> Self {
        values.entries
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    #[schemars(description = "A plain multiple such as 2.0x (Current Ratio, Debt-to-Equity)")]
    Multiple,

    #[schemars(description = "A value already scaled by 100 (margins, returns)")]
    Percentage,

    #[schemars(description = "A day count (DSO, DIO, DPO)")]
    Days,
}

/// The numeric payload of a ratio cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RatioValue {
    #[default]
    Unset,
    Multiple(f64),
    Percentage(f64),
    Days(f64),
}

impl RatioValue {
    pub fn of_kind(kind: RatioKind, value: f64) -> Self {
        match kind {
            RatioKind::Multiple => Self::Multiple(value),
            RatioKind::Percentage => Self::Percentage(value),
            RatioKind::Days => Self::Days(value),
        }
    }

    pub fn numeric(&self) -> Option<f64> {
        match *self {
            Self::Unset => None,
            Self::Multiple(v) | Self::Percentage(v) | Self::Days(v) => Some(v),
        }
    }

    pub fn kind(&self) -> Option<RatioKind> {
        match self {
            Self::Unset => None,
            Self::Multiple(_) => Some(RatioKind::Multiple),
            Self::Percentage(_) => Some(RatioKind::Percentage),
            Self::Days(_) => Some(RatioKind::Days),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

/// A ratio cell plus the formula text shown next to it for audit.
///
/// Serialized in the collaborator's wire shape (`value` / `percentage` /
/// `days` / `formula`), see [`crate::ingestion::WireRatio`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "crate::ingestion::WireRatio", into = "crate::ingestion::WireRatio")]
pub struct RatioRecord {
    pub value: RatioValue,
    /// Day count reported next to a turnover multiple, e.g. receivables
    /// turnover 8.0x alongside 45.6 days.
    pub days: Option<f64>,
    pub formula: Option<String>,
    pub interpretation: Option<String>,
}

impl RatioRecord {
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn new(value: RatioValue, formula: Option<String>) -> Self {
        Self {
            value,
            days: None,
            formula,
            interpretation: None,
        }
    }

    pub fn unset_with_formula(formula: impl Into<String>) -> Self {
        Self::new(RatioValue::Unset, Some(formula.into()))
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_unset()
    }
}

/// category -> ratio name -> record
pub type RatioGroups = BTreeMap<String, BTreeMap<String, RatioRecord>>;

/// Everything the extraction step produced for one reporting period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodData {
    /// Display label, e.g. "FY2023" or "2024".
    pub label: String,

    /// Balance-sheet date, used to order periods. Falls back to the label.
    #[serde(default)]
    pub period_end: Option<NaiveDate>,

    #[serde(default, rename = "extracted_values")]
    pub values: ExtractedValues,

    #[serde(default)]
    pub ratios: RatioGroups,
}

impl PeriodData {
    pub fn new(label: impl Into<String>, values: ExtractedValues) -> Self {
        Self {
            label: label.into(),
            period_end: None,
            values,
            ratios: BTreeMap::new(),
        }
    }

    pub fn with_period_end(mut self, period_end: NaiveDate) -> Self {
        self.period_end = Some(period_end);
        self
    }

    pub fn with_ratio(
        mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        record: RatioRecord,
    ) -> Self {
        self.ratios
            .entry(category.into())
            .or_default()
            .insert(name.into(), record);
        self
    }

    pub fn ratio(&self, category: &str, name: &str) -> Option<&RatioRecord> {
        self.ratios.get(category).and_then(|group| group.get(name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(
        description = "Allow resolver step 3: accept the first value whose key contains any whitespace-separated word of the token."
    )]
    pub enable_token_overlap: bool,

    #[schemars(
        description = "Allow resolver step 4: rebuild well-known concepts (revenue, net profit, equity, debt, ...) from related fields."
    )]
    pub enable_derived_heuristics: bool,

    #[schemars(
        description = "Report ratios whose name denotes a day count (Days..., DSO, DIO, DPO) as days instead of multiples."
    )]
    pub infer_day_count: bool,

    #[schemars(
        description = "Add every standard-catalog ratio missing from a period as an unset record carrying the catalog formula."
    )]
    pub seed_standard_catalog: bool,

    #[schemars(
        description = "Restrict forecasting to these line items (matched by normalized label). None forecasts every line item."
    )]
    pub forecast_line_items: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_token_overlap: true,
            enable_derived_heuristics: true,
            infer_day_count: true,
            seed_standard_catalog: false,
            forecast_line_items: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(items) = &self.forecast_line_items {
            for (idx, item) in items.iter().enumerate() {
                if normalize(item).is_empty() {
                    return Err(RatioEngineError::InvalidConfig(format!(
                        "forecast_line_items #{} ('{}') has no letters or digits",
                        idx, item
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_normalized_first_label_wins() {
        let values: ExtractedValues = [("NET SALES", 1.0), ("Net Sales", 2.0)]
            .into_iter()
            .collect();
        let (label, value) = values.get_normalized("net-sales").unwrap();
        assert_eq!(label, "NET SALES");
        assert_eq!(value, 1.0);
        assert!(values.get_normalized("!!").is_none());
    }

    #[test]
    fn test_extended_with_keeps_existing() {
        let values: ExtractedValues = [("Net Sales", 100.0)].into_iter().collect();
        let extended = values.extended_with(vec![
            ("net sales".to_string(), 5.0),
            ("Receivables Turnover".to_string(), 8.0),
            ("Broken".to_string(), f64::INFINITY),
        ]);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.get("Net Sales"), Some(100.0));
        assert_eq!(extended.get("Receivables Turnover"), Some(8.0));
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_ratio_value_accessors() {
        assert_eq!(RatioValue::Days(45.0).numeric(), Some(45.0));
        assert_eq!(RatioValue::Unset.numeric(), None);
        assert_eq!(
            RatioValue::of_kind(RatioKind::Percentage, 12.5),
            RatioValue::Percentage(12.5)
        );
        assert_eq!(RatioValue::Multiple(2.0).kind(), Some(RatioKind::Multiple));
    }

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());

        let config = EngineConfig {
            forecast_line_items: Some(vec!["Cash".to_string(), " - ".to_string()]),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RatioEngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_schema_generation() {
        let schema_json = EngineConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("enable_token_overlap"));
        assert!(schema_json.contains("forecast_line_items"));
    }

    #[test]
    fn test_config_partial_deserialization() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "enable_token_overlap": false }"#).unwrap();
        assert!(!config.enable_token_overlap);
        assert!(config.enable_derived_heuristics);
        assert!(config.forecast_line_items.is_none());
    }
}
