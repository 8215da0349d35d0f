use crate::error::RatioEngineError;
use crate::schema::{ExtractedValues, PeriodData, RatioRecord, RatioValue};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A ratio cell as exchanged with the extraction and presentation sides.
/// Absent fields are omitted rather than sent as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WireRatio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Plain multiple, e.g. 2.0 for a 2:1 current ratio")]
    pub value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Value already scaled by 100")]
    pub percentage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Day count, e.g. days sales outstanding")]
    pub days: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Formula text the value was (or should be) computed from")]
    pub formula: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

impl From<WireRatio> for RatioRecord {
    fn from(wire: WireRatio) -> Self {
        let (value, days) = match (wire.percentage, wire.value, wire.days) {
            (Some(pct), _, days) => (RatioValue::Percentage(pct), days),
            (None, Some(value), days) => (RatioValue::Multiple(value), days),
            (None, None, Some(days)) => (RatioValue::Days(days), None),
            (None, None, None) => (RatioValue::Unset, None),
        };
        RatioRecord {
            value,
            days,
            formula: wire.formula,
            interpretation: wire.interpretation,
        }
    }
}

impl From<RatioRecord> for WireRatio {
    fn from(record: RatioRecord) -> Self {
        let mut wire = WireRatio {
            days: record.days,
            formula: record.formula,
            interpretation: record.interpretation,
            ..WireRatio::default()
        };
        match record.value {
            RatioValue::Unset => {}
            RatioValue::Multiple(v) => wire.value = Some(v),
            RatioValue::Percentage(v) => wire.percentage = Some(v),
            RatioValue::Days(v) => wire.days = Some(v),
        }
        wire
    }
}

/// One period of the collaborator payload, used for schema publication.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WirePeriod {
    #[schemars(description = "Period label, e.g. '2024'")]
    pub label: String,

    #[serde(default)]
    #[schemars(description = "Balance-sheet date in YYYY-MM-DD format")]
    pub period_end: Option<chrono::NaiveDate>,

    #[schemars(
        description = "Line item label -> value. Entries may be numbers, numeric strings, or objects with a 'value' member."
    )]
    pub extracted_values: BTreeMap<String, Value>,

    #[serde(default)]
    #[schemars(description = "Category -> ratio name -> ratio record")]
    pub ratios: BTreeMap<String, BTreeMap<String, WireRatio>>,
}

impl WirePeriod {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Vec<WirePeriod>)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

impl ExtractedValues {
    /// Flattens a JSON object into label -> number. Numbers and numeric
    /// strings are taken as-is; nested objects contribute their `value`
    /// member, or else their first numeric member. Anything else is skipped.
    pub fn from_json(value: &Value) -> crate::error::Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            RatioEngineError::InvalidConfig(format!(
                "extracted values must be a JSON object, got {}",
                json_type_name(value)
            ))
        })?;

        Ok(object
            .iter()
            .filter_map(|(label, entry)| flatten_entry(entry).map(|v| (label.clone(), v)))
            .collect())
    }
}

impl TryFrom<Value> for ExtractedValues {
    type Error = RatioEngineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

fn flatten_entry(entry: &Value) -> Option<f64> {
    let value = match entry {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        Value::Object(map) => match map.get("value") {
            Some(inner) if !inner.is_null() => flatten_entry(inner),
            _ => map.values().find_map(|v| v.as_f64()),
        },
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

/// "1,23,456", "(5000)" and "₹12000" style amounts.
fn parse_amount(raw: &str) -> Option<f64> {
    let mut text: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$' | '€' | '£' | '¥'))
        .collect();
    text = text.trim().to_string();

    let negative = text.starts_with('(') && text.ends_with(')') && text.len() >= 2;
    if negative {
        text = text[1..text.len() - 1].trim().to_string();
    }

    let value: f64 = text.parse().ok()?;
    Some(if negative { -value } else { value })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One line of a two-column comparative statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatementRow {
    pub line_item: String,
    pub current: Option<f64>,
    pub prior: Option<f64>,
}

/// Splits comparative statement rows into `(prior, current)` periods.
pub fn convert_rows_to_periods(
    rows: &[StatementRow],
    current_label: &str,
    prior_label: &str,
) -> (PeriodData, PeriodData) {
    let mut current = BTreeMap::new();
    let mut prior = BTreeMap::new();

    for row in rows {
        if let Some(value) = row.current {
            current.insert(row.line_item.clone(), value);
        }
        if let Some(value) = row.prior {
            prior.insert(row.line_item.clone(), value);
        }
    }

    (
        PeriodData::new(prior_label, ExtractedValues::from(prior)),
        PeriodData::new(current_label, ExtractedValues::from(current)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_to_record_precedence() {
        let wire: WireRatio = serde_json::from_value(json!({
            "value": 0.16,
            "percentage": 16.0,
            "formula": "Net Profit / Revenue × 100"
        }))
        .unwrap();
        let record = RatioRecord::from(wire);
        assert_eq!(record.value, RatioValue::Percentage(16.0));

        let record: RatioRecord =
            serde_json::from_value(json!({ "days": 45.6 })).unwrap();
        assert_eq!(record.value, RatioValue::Days(45.6));
        assert_eq!(record.days, None);

        let record: RatioRecord =
            serde_json::from_value(json!({ "formula": "Total Debt / Equity" })).unwrap();
        assert!(record.is_unset());
        assert_eq!(record.formula.as_deref(), Some("Total Debt / Equity"));
    }

    #[test]
    fn test_turnover_keeps_multiple_and_day_count() {
        let wire = json!({
            "value": 8.0,
            "days": 45.625,
            "formula": "Revenue / Receivables"
        });
        let record: RatioRecord = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(record.value, RatioValue::Multiple(8.0));
        assert_eq!(record.days, Some(45.625));
        assert_eq!(serde_json::to_value(&record).unwrap(), wire);
    }

    #[test]
    fn test_record_serializes_without_nulls() {
        let record = RatioRecord::new(RatioValue::Multiple(2.0), Some("CA / CL".to_string()));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({ "value": 2.0, "formula": "CA / CL" }));

        let json = serde_json::to_value(RatioRecord::unset()).unwrap();
        assert_eq!(json, json!({}));
    }

    #[test]
    fn test_flatten_extracted_values() {
        let values = ExtractedValues::from_json(&json!({
            "Revenue": 10000,
            "Net Profit": { "value": 5000.0, "confidence": 92.5 },
            "Inventory": { "confidence": "high", "amount": 700 },
            "Cash": "1,250",
            "Loss": "(300)",
            "Notes": "see annexure",
            "Flags": [1, 2],
            "Empty": null
        }))
        .unwrap();

        assert_eq!(values.get("Revenue"), Some(10000.0));
        assert_eq!(values.get("Net Profit"), Some(5000.0));
        assert_eq!(values.get("Inventory"), Some(700.0));
        assert_eq!(values.get("Cash"), Some(1250.0));
        assert_eq!(values.get("Loss"), Some(-300.0));
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn test_extracted_values_rejects_non_object() {
        assert!(ExtractedValues::from_json(&json!([1, 2, 3])).is_err());
        assert!(serde_json::from_value::<ExtractedValues>(json!("oops")).is_err());
    }

    #[test]
    fn test_period_deserialization() {
        let period: PeriodData = serde_json::from_value(json!({
            "label": "2024",
            "period_end": "2024-03-31",
            "extracted_values": { "Current Assets": 300000.0, "Current Liabilities": 150000.0 },
            "ratios": {
                "Liquidity": {
                    "Current Ratio": { "value": 2.0, "formula": "Current Assets / Current Liabilities" },
                    "Cash Ratio": { "formula": "Cash / Current Liabilities" }
                }
            }
        }))
        .unwrap();

        assert_eq!(period.values.len(), 2);
        assert_eq!(
            period.ratio("Liquidity", "Current Ratio").unwrap().value,
            RatioValue::Multiple(2.0)
        );
        assert!(period.ratio("Liquidity", "Cash Ratio").unwrap().is_unset());
    }

    #[test]
    fn test_convert_rows_to_periods() {
        let rows = vec![
            StatementRow {
                line_item: "Cash".to_string(),
                current: Some(120.0),
                prior: Some(100.0),
            },
            StatementRow {
                line_item: "Goodwill".to_string(),
                current: Some(40.0),
                prior: None,
            },
        ];
        let (prior, current) = convert_rows_to_periods(&rows, "FY2024", "FY2023");
        assert_eq!(prior.label, "FY2023");
        assert_eq!(prior.values.len(), 1);
        assert_eq!(current.values.get("Goodwill"), Some(40.0));
    }

    #[test]
    fn test_wire_schema_generation() {
        let schema_json = WirePeriod::schema_as_json().unwrap();
        assert!(schema_json.contains("extracted_values"));
        assert!(schema_json.contains("percentage"));
    }
}
