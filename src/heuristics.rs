//! Derived-concept fallbacks.
//!
//! When a token names a well-known financial concept that the period does not
//! report directly, the concept is rebuilt from related line items. The table
//! below is plain data: each concept lists ordered alternatives, each
//! alternative is a signed sum of terms, and each term names the synonyms it
//! may be read from. Sub-fields are looked up by exact or normalized-exact
//! label only, never through another derivation.

use crate::resolver::resolve_exact;
use crate::schema::ExtractedValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy)]
pub struct Term {
    /// Synonyms tried in order; the first present label supplies the value.
    pub fields: &'static [&'static str],
    pub sign: Sign,
    pub required: bool,
}

pub type Construction = &'static [Term];

#[derive(Debug)]
pub struct DerivedConcept {
    pub name: &'static str,
    /// Normalized fragments that identify the concept.
    pub includes: &'static [&'static str],
    /// Normalized fragments that veto the concept.
    pub excludes: &'static [&'static str],
    pub alternatives: &'static [Construction],
}

const fn plus(fields: &'static [&'static str]) -> Term {
    Term {
        fields,
        sign: Sign::Plus,
        required: true,
    }
}

const fn plus_opt(fields: &'static [&'static str]) -> Term {
    Term {
        fields,
        sign: Sign::Plus,
        required: false,
    }
}

const fn minus(fields: &'static [&'static str]) -> Term {
    Term {
        fields,
        sign: Sign::Minus,
        required: true,
    }
}

const fn minus_opt(fields: &'static [&'static str]) -> Term {
    Term {
        fields,
        sign: Sign::Minus,
        required: false,
    }
}

const TOTAL_INCOME: &[&str] = &["Total Income"];
const NET_SALES: &[&str] = &["Net Sales", "Revenue from Operations", "Total Sales"];
const SALES: &[&str] = &["Sales", "Turnover", "Net Turnover"];
const REVENUE: &[&str] = &["Revenue", "Total Revenue", "Net Revenue", "Gross Revenue"];
const OTHER_OPERATING_INCOME: &[&str] = &["Other Operating Income", "Other Operating Revenue"];
const NET_PROFIT: &[&str] = &[
    "Net Profit",
    "Profit After Tax",
    "PAT",
    "Net Income",
    "Profit for the Year",
    "Profit for the Period",
];
const TOTAL_EXPENSES: &[&str] = &["Total Expenses", "Total Expenditure"];
const TAX: &[&str] = &["Tax", "Income Tax", "Tax Expense", "Provision for Tax", "Taxation"];
const INTEREST: &[&str] = &[
    "Interest",
    "Interest Expense",
    "Interest Cost",
    "Finance Costs",
    "Finance Cost",
];
const EBITDA: &[&str] = &["EBITDA"];
const EQUITY: &[&str] = &[
    "Equity",
    "Total Equity",
    "Net Worth",
    "Shareholders Funds",
    "Shareholders Equity",
];
const TOTAL_ASSETS: &[&str] = &["Total Assets"];
const TOTAL_LIABILITIES: &[&str] = &["Total Liabilities"];
const TOTAL_DEBT: &[&str] = &["Total Debt", "Total Borrowings"];
const LONG_TERM_BORROWINGS: &[&str] = &[
    "Long-term Borrowings",
    "Long Term Loans",
    "Non-current Borrowings",
];
const SHORT_TERM_BORROWINGS: &[&str] = &[
    "Short-term Borrowings",
    "Current Borrowings",
    "Short Term Loans",
];
const WORKING_CAPITAL: &[&str] = &["Working Capital", "Net Working Capital"];
const CURRENT_ASSETS: &[&str] = &["Current Assets", "Total Current Assets"];
const CURRENT_LIABILITIES: &[&str] = &["Current Liabilities", "Total Current Liabilities"];
const LONG_TERM_LIABILITIES: &[&str] = &["Long-term Liabilities", "Non-current Liabilities"];
const COST_OF_GOODS_SOLD: &[&str] = &["Cost of Goods Sold", "COGS", "Cost of Sales", "Cost of Revenue"];
const OPENING_INVENTORY: &[&str] = &["Opening Inventory", "Opening Stock"];
const NET_PURCHASES: &[&str] = &["Net Purchases", "Purchases"];
const DIRECT_EXPENSES: &[&str] = &["Direct Expenses"];
const CLOSING_INVENTORY: &[&str] = &["Closing Inventory", "Closing Stock"];
const RECEIVABLES: &[&str] = &[
    "Trade Receivables",
    "Sundry Debtors",
    "Debtors",
    "Accounts Receivable",
    "Closing Debtors",
];
const PAYABLES: &[&str] = &["Trade Payables", "Sundry Creditors", "Creditors", "Accounts Payable"];
const INVENTORY: &[&str] = &[
    "Inventory",
    "Inventories",
    "Closing Inventory",
    "Closing Stock",
    "Stock in Trade",
];
const FIXED_ASSETS: &[&str] = &[
    "Fixed Assets",
    "Net Fixed Assets",
    "Tangible Assets",
    "Property Plant and Equipment",
    "Net Block",
];

/// Concepts in match order; a token is handled by the first concept it matches.
pub static DERIVED_CONCEPTS: &[DerivedConcept] = &[
    DerivedConcept {
        name: "revenue",
        includes: &["revenue", "sales", "totalincome"],
        excludes: &["cost", "returns"],
        alternatives: &[
            &[plus(TOTAL_INCOME)],
            &[plus(NET_SALES), plus(OTHER_OPERATING_INCOME)],
            &[plus(NET_SALES)],
            &[plus(SALES)],
            &[plus(REVENUE)],
        ],
    },
    DerivedConcept {
        name: "net profit",
        includes: &["netprofit", "netincome", "profitaftertax"],
        excludes: &["margin"],
        alternatives: &[
            &[plus(NET_PROFIT)],
            &[
                plus(TOTAL_INCOME),
                minus(TOTAL_EXPENSES),
                minus_opt(TAX),
                minus_opt(INTEREST),
            ],
        ],
    },
    DerivedConcept {
        name: "ebitda",
        includes: &["ebitda"],
        excludes: &["margin"],
        alternatives: &[
            &[plus(EBITDA)],
            &[plus(NET_PROFIT), plus_opt(INTEREST), plus_opt(TAX)],
        ],
    },
    DerivedConcept {
        name: "equity",
        includes: &["equity", "networth", "shareholdersfunds"],
        excludes: &["ratio", "return"],
        alternatives: &[
            &[plus(EQUITY)],
            &[plus(TOTAL_ASSETS), minus(TOTAL_LIABILITIES)],
        ],
    },
    DerivedConcept {
        name: "debt",
        includes: &["debt"],
        excludes: &["debtor", "service"],
        alternatives: &[
            &[plus(TOTAL_DEBT)],
            &[plus_opt(LONG_TERM_BORROWINGS), plus_opt(SHORT_TERM_BORROWINGS)],
        ],
    },
    DerivedConcept {
        name: "working capital",
        includes: &["workingcapital"],
        excludes: &["turnover"],
        alternatives: &[
            &[plus(WORKING_CAPITAL)],
            &[plus(CURRENT_ASSETS), minus(CURRENT_LIABILITIES)],
        ],
    },
    DerivedConcept {
        name: "current assets",
        includes: &["currentassets"],
        excludes: &["noncurrent"],
        alternatives: &[
            &[plus(CURRENT_ASSETS)],
            &[plus(TOTAL_ASSETS), minus(FIXED_ASSETS)],
        ],
    },
    DerivedConcept {
        name: "current liabilities",
        includes: &["currentliabilities"],
        excludes: &["noncurrent"],
        alternatives: &[
            &[plus(CURRENT_LIABILITIES)],
            &[plus(TOTAL_LIABILITIES), minus(LONG_TERM_LIABILITIES)],
        ],
    },
    DerivedConcept {
        name: "cost of goods sold",
        includes: &["costofgoodssold", "cogs", "costofsales", "costofrevenue"],
        excludes: &[],
        alternatives: &[
            &[plus(COST_OF_GOODS_SOLD)],
            &[
                plus(OPENING_INVENTORY),
                plus(NET_PURCHASES),
                plus_opt(DIRECT_EXPENSES),
                minus(CLOSING_INVENTORY),
            ],
        ],
    },
    DerivedConcept {
        name: "interest",
        includes: &["interest", "financecost"],
        excludes: &["coverage", "income", "received"],
        alternatives: &[&[plus(INTEREST)]],
    },
    DerivedConcept {
        name: "receivables",
        includes: &["receivable", "debtors"],
        excludes: &["opening", "turnover", "days"],
        alternatives: &[&[plus(RECEIVABLES)]],
    },
    DerivedConcept {
        name: "payables",
        includes: &["payable", "creditors"],
        excludes: &["turnover", "days"],
        alternatives: &[&[plus(PAYABLES)]],
    },
    DerivedConcept {
        name: "inventory",
        includes: &["inventory", "inventories", "closingstock", "stockintrade"],
        excludes: &["opening", "turnover", "days"],
        alternatives: &[&[plus(INVENTORY)]],
    },
    DerivedConcept {
        name: "fixed assets",
        includes: &["fixedasset", "tangibleasset", "propertyplant", "netblock"],
        excludes: &["intangible", "turnover"],
        alternatives: &[&[plus(FIXED_ASSETS)]],
    },
];

impl Term {
    fn lookup(&self, values: &ExtractedValues) -> Option<f64> {
        self.fields
            .iter()
            .find_map(|field| resolve_exact(field, values).value())
    }
}

impl DerivedConcept {
    pub fn matches(&self, key: &str) -> bool {
        self.includes.iter().any(|fragment| key.contains(fragment))
            && !self.excludes.iter().any(|fragment| key.contains(fragment))
    }

    /// First alternative that yields a value.
    pub fn derive(&self, values: &ExtractedValues) -> Option<f64> {
        self.alternatives
            .iter()
            .find_map(|construction| evaluate_construction(construction, values))
    }
}

/// All required terms must resolve and at least one term must resolve.
fn evaluate_construction(terms: &[Term], values: &ExtractedValues) -> Option<f64> {
    let mut total = 0.0;
    let mut found = false;

    for term in terms {
        match term.lookup(values) {
            Some(value) => {
                found = true;
                match term.sign {
                    Sign::Plus => total += value,
                    Sign::Minus => total -= value,
                }
            }
            None if term.required => return None,
            None => {}
        }
    }

    found.then_some(total)
}

pub fn concept_for(key: &str) -> Option<&'static DerivedConcept> {
    DERIVED_CONCEPTS.iter().find(|concept| concept.matches(key))
}

/// Derives a value for an already-normalized token. Returns the concept name
/// alongside the value.
pub fn derive(key: &str, values: &ExtractedValues) -> Option<(&'static str, f64)> {
    let concept = concept_for(key)?;
    concept.derive(values).map(|value| (concept.name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, f64)]) -> ExtractedValues {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_non_operating_income_stays_out_of_revenue() {
        let vals = values(&[("Net Sales", 100.0), ("Other Income", 30.0)]);
        assert_eq!(derive("revenue", &vals), Some(("revenue", 100.0)));
    }

    #[test]
    fn test_concept_matching() {
        assert_eq!(concept_for("revenue").unwrap().name, "revenue");
        assert_eq!(concept_for("netsales").unwrap().name, "revenue");
        assert_eq!(concept_for("costofsales").unwrap().name, "cost of goods sold");
        assert_eq!(concept_for("shareholdersequity").unwrap().name, "equity");
        assert!(concept_for("equityratio").is_none());
        assert_eq!(concept_for("sundrydebtors").unwrap().name, "receivables");
        assert_eq!(concept_for("totaldebt").unwrap().name, "debt");
        assert!(concept_for("intangibleassets").is_none());
        assert!(concept_for("goodwill").is_none());
    }

    #[test]
    fn test_revenue_prefers_total_income() {
        let vals = values(&[
            ("Total Income", 500.0),
            ("Net Sales", 400.0),
            ("Other Operating Income", 20.0),
        ]);
        assert_eq!(derive("revenue", &vals), Some(("revenue", 500.0)));
    }

    #[test]
    fn test_revenue_sum_then_single() {
        let vals = values(&[("Net Sales", 100.0), ("Other Operating Income", 20.0)]);
        assert_eq!(derive("revenue", &vals), Some(("revenue", 120.0)));

        let vals = values(&[("Net Sales", 100.0)]);
        assert_eq!(derive("revenue", &vals), Some(("revenue", 100.0)));

        let vals = values(&[("Sales", 90.0)]);
        assert_eq!(derive("totalincome", &vals), Some(("revenue", 90.0)));
    }

    #[test]
    fn test_net_profit_from_income_and_expenses() {
        let vals = values(&[
            ("Total Income", 1000.0),
            ("Total Expenses", 700.0),
            ("Tax", 50.0),
        ]);
        assert_eq!(derive("netprofit", &vals), Some(("net profit", 250.0)));

        let vals = values(&[("Total Income", 1000.0), ("Tax", 50.0)]);
        assert_eq!(derive("netprofit", &vals), None);
    }

    #[test]
    fn test_ebitda_requires_net_profit() {
        let vals = values(&[("Net Profit", 100.0), ("Interest", 10.0), ("Tax", 20.0)]);
        assert_eq!(derive("ebitda", &vals), Some(("ebitda", 130.0)));

        let vals = values(&[("Interest", 10.0), ("Tax", 20.0)]);
        assert_eq!(derive("ebitda", &vals), None);
    }

    #[test]
    fn test_equity_from_balance_sheet_totals() {
        let vals = values(&[("Total Assets", 1000.0), ("Total Liabilities", 600.0)]);
        assert_eq!(derive("equity", &vals), Some(("equity", 400.0)));

        let vals = values(&[("Total Assets", 1000.0)]);
        assert_eq!(derive("equity", &vals), None);
    }

    #[test]
    fn test_debt_accepts_either_borrowing() {
        let vals = values(&[
            ("Long-term Borrowings", 300.0),
            ("Short-term Borrowings", 200.0),
        ]);
        assert_eq!(derive("debt", &vals), Some(("debt", 500.0)));

        let vals = values(&[("Long-term Borrowings", 300.0), ("Total Assets", 900.0)]);
        assert_eq!(derive("totaldebt", &vals), Some(("debt", 300.0)));

        let vals = values(&[("Total Assets", 900.0)]);
        assert_eq!(derive("debt", &vals), None);
    }

    #[test]
    fn test_working_capital() {
        let vals = values(&[("Current Assets", 300.0), ("Current Liabilities", 120.0)]);
        assert_eq!(
            derive("workingcapital", &vals),
            Some(("working capital", 180.0))
        );
    }

    #[test]
    fn test_cost_of_goods_sold_from_inventory_movement() {
        let vals = values(&[
            ("Opening Stock", 50.0),
            ("Purchases", 400.0),
            ("Direct Expenses", 30.0),
            ("Closing Stock", 80.0),
        ]);
        assert_eq!(derive("cogs", &vals), Some(("cost of goods sold", 400.0)));
    }

    #[test]
    fn test_synonym_fallbacks() {
        let vals = values(&[
            ("Sundry Debtors", 70.0),
            ("Sundry Creditors", 40.0),
            ("Closing Stock", 25.0),
            ("Net Block", 500.0),
        ]);
        assert_eq!(derive("receivables", &vals), Some(("receivables", 70.0)));
        assert_eq!(derive("tradepayables", &vals), Some(("payables", 40.0)));
        assert_eq!(derive("inventory", &vals), Some(("inventory", 25.0)));
        assert_eq!(derive("fixedassets", &vals), Some(("fixed assets", 500.0)));
    }

    #[test]
    fn test_sub_fields_never_use_loose_matching() {
        // "Profit Before Tax" must not stand in for "Tax".
        let vals = values(&[
            ("Total Income", 1000.0),
            ("Total Expenses", 700.0),
            ("Profit Before Tax", 300.0),
        ]);
        assert_eq!(derive("netprofit", &vals), Some(("net profit", 300.0)));
    }
}
