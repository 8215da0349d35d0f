use crate::schema::{RatioKind, RatioRecord};

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub category: &'static str,
    pub name: &'static str,
    pub formula: &'static str,
    pub interpretation: &'static str,
    pub kind: RatioKind,
}

impl CatalogEntry {
    /// An unset record carrying this entry's formula and interpretation.
    pub fn seed_record(&self) -> RatioRecord {
        RatioRecord {
            interpretation: Some(self.interpretation.to_string()),
            ..RatioRecord::unset_with_formula(self.formula)
        }
    }
}

const fn entry(
    category: &'static str,
    name: &'static str,
    formula: &'static str,
    interpretation: &'static str,
    kind: RatioKind,
) -> CatalogEntry {
    CatalogEntry {
        category,
        name,
        formula,
        interpretation,
        kind,
    }
}

pub static STANDARD_RATIOS: &[CatalogEntry] = &[
    entry(
        "Liquidity",
        "Current Ratio",
        "Current Assets / Current Liabilities",
        "Measures ability to pay short-term obligations",
        RatioKind::Multiple,
    ),
    entry(
        "Liquidity",
        "Quick Ratio",
        "(Current Assets - Inventory) / Current Liabilities",
        "Ability to meet short-term obligations with liquid assets",
        RatioKind::Multiple,
    ),
    entry(
        "Liquidity",
        "Cash Ratio",
        "Cash and Cash Equivalents / Current Liabilities",
        "Most conservative liquidity measure",
        RatioKind::Multiple,
    ),
    entry(
        "Profitability",
        "Net Profit Margin",
        "Net Profit / Revenue × 100",
        "Profit earned per unit of revenue",
        RatioKind::Percentage,
    ),
    entry(
        "Profitability",
        "Gross Profit Margin",
        "Gross Profit / Revenue × 100",
        "Profitability after direct costs",
        RatioKind::Percentage,
    ),
    entry(
        "Profitability",
        "EBITDA Margin",
        "EBITDA / Revenue × 100",
        "Operating profitability before financing effects",
        RatioKind::Percentage,
    ),
    entry(
        "Profitability",
        "Operating Margin",
        "Operating Profit / Revenue × 100",
        "Efficiency of core operations",
        RatioKind::Percentage,
    ),
    entry(
        "Profitability",
        "Return on Assets (ROA)",
        "Net Profit / Total Assets × 100",
        "How efficiently assets generate profit",
        RatioKind::Percentage,
    ),
    entry(
        "Profitability",
        "Return on Equity (ROE)",
        "Net Profit / Equity × 100",
        "Return generated on shareholder investment",
        RatioKind::Percentage,
    ),
    entry(
        "Leverage",
        "Debt-to-Equity",
        "Total Debt / Equity",
        "Financial leverage; higher means more debt",
        RatioKind::Multiple,
    ),
    entry(
        "Leverage",
        "Debt-to-Assets",
        "Total Debt / Total Assets × 100",
        "Percentage of assets financed by debt",
        RatioKind::Percentage,
    ),
    entry(
        "Leverage",
        "Equity Ratio",
        "Equity / Total Assets × 100",
        "Percentage of assets owned by shareholders",
        RatioKind::Percentage,
    ),
    entry(
        "Leverage",
        "Debt-to-EBITDA",
        "Total Debt / EBITDA",
        "Years needed to repay debt with operating cash",
        RatioKind::Multiple,
    ),
    entry(
        "Efficiency",
        "Asset Turnover",
        "Revenue / Total Assets",
        "Revenue generated per unit of assets",
        RatioKind::Multiple,
    ),
    entry(
        "Efficiency",
        "Fixed Asset Turnover",
        "Revenue / Fixed Assets",
        "Efficiency of fixed asset utilization",
        RatioKind::Multiple,
    ),
    entry(
        "Efficiency",
        "Inventory Turnover",
        "Cost of Goods Sold / Inventory",
        "How quickly inventory is sold",
        RatioKind::Multiple,
    ),
    entry(
        "Efficiency",
        "Receivables Turnover",
        "Revenue / Trade Receivables",
        "How quickly receivables are collected",
        RatioKind::Multiple,
    ),
    entry(
        "Efficiency",
        "Payables Turnover",
        "Cost of Goods Sold / Trade Payables",
        "How quickly suppliers are paid",
        RatioKind::Multiple,
    ),
    entry(
        "Efficiency",
        "Days Sales Outstanding (DSO)",
        "365 / Receivables Turnover",
        "Average days to collect payment",
        RatioKind::Days,
    ),
    entry(
        "Efficiency",
        "Days Inventory Outstanding (DIO)",
        "365 / Inventory Turnover",
        "Average days inventory is held",
        RatioKind::Days,
    ),
    entry(
        "Efficiency",
        "Days Payables Outstanding (DPO)",
        "365 / Payables Turnover",
        "Average days to pay suppliers",
        RatioKind::Days,
    ),
    entry(
        "Efficiency",
        "Working Capital Turnover",
        "Revenue / Working Capital",
        "Efficiency of working capital usage",
        RatioKind::Multiple,
    ),
    entry(
        "Coverage",
        "Interest Coverage",
        "EBITDA / Interest",
        "Ability to cover interest payments",
        RatioKind::Multiple,
    ),
    entry(
        "Coverage",
        "Debt Service Coverage",
        "EBITDA / (Interest + Loan Installment)",
        "Ability to service total debt obligations",
        RatioKind::Multiple,
    ),
];

pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    STANDARD_RATIOS
        .iter()
        .find(|entry| crate::normalizer::same_field(entry.name, name))
}
