/// Canonical matching key for a label: lower-cased, with every character that
/// is not an ASCII letter or digit removed.
///
/// # Examples
/// - "Net Profit" -> "netprofit"
/// - "Long-term Borrowings" -> "longtermborrowings"
/// - "Reserves & Surplus (Note 4)" -> "reservessurplusnote4"
pub fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Two labels denote the same field iff their keys are equal.
pub fn same_field(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_case_and_punctuation() {
        assert_eq!(normalize("Net Profit"), "netprofit");
        assert_eq!(normalize("NET-PROFIT"), "netprofit");
        assert_eq!(normalize("  net_profit. "), "netprofit");
        assert_eq!(normalize("Reserves & Surplus"), "reservessurplus");
    }

    #[test]
    fn test_normalize_keeps_digits() {
        assert_eq!(normalize("FY 2023 Revenue"), "fy2023revenue");
    }

    #[test]
    fn test_normalize_drops_non_ascii() {
        assert_eq!(normalize("Débiteurs"), "dbiteurs");
        assert_eq!(normalize("—"), "");
    }

    #[test]
    fn test_equivalent_labels() {
        assert!(same_field("Long-term Borrowings", "long term borrowings"));
        assert!(same_field("Cash & Cash Equivalents", "CASH CASH EQUIVALENTS"));
        assert!(!same_field("Net Sales", "Net Profit"));
    }
}
