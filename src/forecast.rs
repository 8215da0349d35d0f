use serde::{Deserialize, Serialize};

/// Two-period projection for one line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPair {
    pub line_item: String,
    /// Value in the more recent observed period.
    pub current: Option<f64>,
    pub prior: Option<f64>,
    /// `(current - prior) / prior`; undefined when either value is missing
    /// or the prior is zero.
    pub growth_rate: Option<f64>,
    pub projected_plus_1: Option<f64>,
    pub projected_plus_2: Option<f64>,
}

impl ForecastPair {
    pub fn new(line_item: impl Into<String>, current: Option<f64>, prior: Option<f64>) -> Self {
        let (growth_rate, projected_plus_1, projected_plus_2) = forecast(current, prior);
        Self {
            line_item: line_item.into(),
            current,
            prior,
            growth_rate,
            projected_plus_1,
            projected_plus_2,
        }
    }

    pub fn percent_change(&self) -> Option<f64> {
        self.growth_rate.map(|rate| rate * 100.0)
    }

    /// Signed percent change with two decimals, e.g. "+10.00%".
    pub fn format_percent_change(&self) -> Option<String> {
        self.percent_change().map(|pct| format!("{:+.2}%", pct))
    }
}

/// Compounds the single observed growth rate two periods forward.
///
/// Returns `(growth_rate, plus_1, plus_2)`. Without a usable prior the current
/// value is carried forward flat; without a current value nothing is projected.
pub fn forecast(current: Option<f64>, prior: Option<f64>) -> (Option<f64>, Option<f64>, Option<f64>) {
    match (current, prior) {
        (Some(current), Some(prior)) if prior != 0.0 => {
            let rate = (current - prior) / prior;
            let plus_1 = current * (1.0 + rate);
            let plus_2 = plus_1 * (1.0 + rate);
            (Some(rate), Some(plus_1), Some(plus_2))
        }
        (Some(current), _) => (None, Some(current), Some(current)),
        (None, _) => (None, None, None),
    }
}
