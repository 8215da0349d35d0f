//! # Financial Ratio Engine
//!
//! Fills in financial ratios that the extraction step left blank, and projects
//! every line item two periods forward from its latest observed growth.
//!
//! ## Core Concepts
//!
//! - **Extracted Values**: A period's label -> number map, with labels exactly as
//!   they appeared in the source statements ("Revenue from Operations", "NET SALES")
//! - **Field Resolution**: A formula identifier is matched to a label by exact text,
//!   normalized key, containment, word overlap, or a derived accounting heuristic
//!   ("Revenue" = "Net Sales" + "Other Operating Income")
//! - **Fail Closed**: A formula none of whose identifiers resolve stays unset instead
//!   of reporting a fabricated zero
//! - **Never Overwrite**: Ratios supplied with a value are passed through untouched
//! - **Forecast**: `(current - prior) / prior` compounded for two periods
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_ratio_engine::*;
//!
//! let values: ExtractedValues = [
//!     ("Net Profit", 50.0),
//!     ("Net Sales", 200.0),
//! ]
//! .into_iter()
//! .collect();
//!
//! let record = fill_missing(
//!     &RatioRecord::unset(),
//!     Some("(Net Profit / Net Sales) * 100"),
//!     &values,
//! );
//! assert_eq!(record.value, RatioValue::Percentage(25.0));
//!
//! let periods: Vec<PeriodData> = serde_json::from_str(payload)?;
//! let report = build_report(&periods, &EngineConfig::default())?;
//! ```

pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod forecast;
pub mod heuristics;
pub mod ingestion;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod schema;

pub use catalog::{CatalogEntry, STANDARD_RATIOS};
pub use error::{RatioEngineError, Result};
pub use evaluator::evaluate;
pub use forecast::{forecast, ForecastPair};
pub use heuristics::{DerivedConcept, DERIVED_CONCEPTS};
pub use ingestion::{convert_rows_to_periods, StatementRow, WirePeriod, WireRatio};
pub use normalizer::{normalize, same_field};
pub use pipeline::{classify, fill_missing, FormulaPipeline};
pub use report::{ComparativeReport, PeriodReport, ReportBuilder};
pub use resolver::{resolve, FieldResolver, MatchMethod, ResolutionOutcome};
pub use schema::*;

use log::{debug, info};

pub struct RatioEngine;

impl RatioEngine {
    pub fn process(periods: &[PeriodData], config: &EngineConfig) -> Result<ComparativeReport> {
        info!("Processing {} periods", periods.len());
        debug!(
            "Periods carry {} line items and {} ratio cells",
            periods.iter().map(|p| p.values.len()).sum::<usize>(),
            periods
                .iter()
                .flat_map(|p| p.ratios.values())
                .map(|group| group.len())
                .sum::<usize>()
        );

        ComparativeReport::build(periods, config)
    }

    /// Accepts the collaborator payload: a JSON array of periods.
    pub fn process_json(payload: &str, config: &EngineConfig) -> Result<ComparativeReport> {
        let periods: Vec<PeriodData> = serde_json::from_str(payload)?;
        Self::process(&periods, config)
    }
}

pub fn build_report(periods: &[PeriodData], config: &EngineConfig) -> Result<ComparativeReport> {
    RatioEngine::process(periods, config)
}

pub fn build_report_from_json(payload: &str, config: &EngineConfig) -> Result<ComparativeReport> {
    RatioEngine::process_json(payload, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_processing() {
        let payload = r#"[
            {
                "label": "2024",
                "period_end": "2024-03-31",
                "extracted_values": {
                    "Net Sales": 1000,
                    "Other Operating Income": 200,
                    "Net Profit": 120,
                    "Current Assets": "600",
                    "Current Liabilities": 300
                },
                "ratios": {
                    "Profitability": {
                        "Net Profit Margin": { "formula": "Net Profit / Revenue × 100" }
                    },
                    "Liquidity": {
                        "Current Ratio": { "value": 1.8, "formula": "Current Assets / Current Liabilities" }
                    }
                }
            },
            {
                "label": "2023",
                "period_end": "2023-03-31",
                "extracted_values": { "Net Sales": 800, "Net Profit": 100 }
            }
        ]"#;

        let report = build_report_from_json(payload, &EngineConfig::default()).unwrap();
        assert_eq!(report.periods.len(), 2);

        let current = report.period("2024").unwrap();
        assert_eq!(
            current.ratio("Profitability", "Net Profit Margin").unwrap().value,
            RatioValue::Percentage(10.0)
        );
        assert_eq!(
            current.ratio("Liquidity", "Current Ratio").unwrap().value,
            RatioValue::Multiple(1.8)
        );

        let sales = report.forecast("Net Sales").unwrap();
        assert!((sales.growth_rate.unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_payload() {
        let result = build_report_from_json("{ not json", &EngineConfig::default());
        assert!(matches!(result, Err(RatioEngineError::SerializationError(_))));

        let result = build_report_from_json("[]", &EngineConfig::default());
        assert!(matches!(result, Err(RatioEngineError::NoPeriods)));
    }
}
