use crate::evaluator::evaluate;
use crate::resolver::{FieldResolver, ResolutionOutcome};
use crate::schema::{EngineConfig, ExtractedValues, RatioKind, RatioRecord, RatioValue};
use log::{debug, warn};

/// Fills missing ratio cells from their formula text.
pub struct FormulaPipeline<'a> {
    resolver: FieldResolver<'a>,
}

/// The formula after glyph normalization and identifier substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutedFormula {
    pub expression: String,
    /// Identifier tokens in order of appearance.
    pub identifiers: Vec<String>,
    /// Number of identifiers that resolved to a value.
    pub matched: usize,
}

impl SubstitutedFormula {
    pub fn any_match(&self) -> bool {
        self.matched > 0
    }
}

impl<'a> FormulaPipeline<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            resolver: FieldResolver::new(config),
        }
    }

    /// Returns `existing` untouched when it already holds a value, otherwise
    /// evaluates `formula` (or the record's own formula) against `values`.
    /// Never fails: anything that cannot be computed yields an unset record.
    pub fn fill_missing(
        &self,
        existing: &RatioRecord,
        formula: Option<&str>,
        values: &ExtractedValues,
    ) -> RatioRecord {
        if !existing.is_unset() {
            return existing.clone();
        }

        let formula = formula
            .or(existing.formula.as_deref())
            .map(str::trim)
            .filter(|f| !f.is_empty());

        let Some(formula) = formula else {
            return existing.clone();
        };

        let value = self.compute(formula, values);

        RatioRecord {
            value,
            days: existing.days,
            formula: Some(formula.to_string()),
            interpretation: existing.interpretation.clone(),
        }
    }

    fn compute(&self, formula: &str, values: &ExtractedValues) -> RatioValue {
        let substituted = self.substitute(formula, values);

        let result = match evaluate(&substituted.expression) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Formula '{}' could not be evaluated ({}); leaving the ratio unset",
                    formula, e
                );
                return RatioValue::Unset;
            }
        };

        if !substituted.any_match() && (!substituted.identifiers.is_empty() || result == 0.0) {
            debug!(
                "Formula '{}' matched none of {} identifiers; leaving the ratio unset",
                formula,
                substituted.identifiers.len()
            );
            return RatioValue::Unset;
        }

        RatioValue::of_kind(classify(formula), result)
    }

    /// Replaces every identifier with its resolved value, or `0` when it
    /// cannot be resolved.
    pub fn substitute(&self, formula: &str, values: &ExtractedValues) -> SubstitutedFormula {
        let normalized = normalize_operators(formula);
        let mut expression = String::with_capacity(normalized.len());
        let mut identifiers = Vec::new();
        let mut matched = 0;

        for segment in split_formula(&normalized) {
            match segment {
                Segment::Operator(op) => expression.push(op),
                Segment::Text(text) => {
                    let token = text.trim();
                    if token.is_empty() {
                        expression.push(' ');
                    } else if is_numeric_literal(token) {
                        expression.push_str(token);
                    } else {
                        identifiers.push(token.to_string());
                        match self.resolver.resolve(token, values) {
                            ResolutionOutcome::Resolved { value, .. } if value.is_finite() => {
                                matched += 1;
                                expression.push_str(&format!("({})", value));
                            }
                            _ => expression.push('0'),
                        }
                    }
                }
            }
        }

        SubstitutedFormula {
            expression,
            identifiers,
            matched,
        }
    }
}

/// [`FormulaPipeline::fill_missing`] with the default configuration.
pub fn fill_missing(
    existing: &RatioRecord,
    formula: Option<&str>,
    values: &ExtractedValues,
) -> RatioRecord {
    FormulaPipeline::new(&EngineConfig::default()).fill_missing(existing, formula, values)
}

/// Percentage iff the formula text carries a "×100" style marker; the
/// magnitude of the result plays no part. The marker must end at the `100`,
/// so `* 1000` or `* 100.5` classify as a multiple.
pub fn classify(formula: &str) -> RatioKind {
    if has_percent_marker(formula) {
        RatioKind::Percentage
    } else {
        RatioKind::Multiple
    }
}

fn has_percent_marker(formula: &str) -> bool {
    let compact: Vec<char> = normalize_operators(formula)
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    compact.windows(4).enumerate().any(|(idx, window)| {
        matches!(window[0], '*' | '×' | 'x')
            && window[1..] == ['1', '0', '0']
            && !matches!(compact.get(idx + 4), Some(c) if c.is_ascii_digit() || *c == '.')
    })
}

/// Maps localized operator glyphs to ASCII and turns a standalone `x`
/// between operands ("Revenue x 100", "(A / B) x100") into `*`.
pub fn normalize_operators(formula: &str) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());

    for (idx, &c) in chars.iter().enumerate() {
        let mapped = match c {
            '×' | '✕' | '✖' | '·' | '∗' => '*',
            '÷' | '∕' => '/',
            '−' | '–' | '—' | '‒' | '﹣' | '－' => '-',
            '＋' => '+',
            'x' | 'X' if is_standalone_multiplier(&chars, idx) => '*',
            other => other,
        };
        out.push(mapped);
    }

    out
}

fn is_standalone_multiplier(chars: &[char], idx: usize) -> bool {
    let before_ok = idx == 0 || matches!(chars[idx - 1], c if c.is_whitespace() || c == ')');
    let after_ok = matches!(chars.get(idx + 1), Some(c) if c.is_whitespace() || c.is_ascii_digit() || *c == '(');
    before_ok && after_ok
}

enum Segment<'s> {
    Operator(char),
    Text(&'s str),
}

fn split_formula(formula: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;

    for (idx, c) in formula.char_indices() {
        if matches!(c, '+' | '-' | '*' | '/' | '(' | ')') {
            if start < idx {
                segments.push(Segment::Text(&formula[start..idx]));
            }
            segments.push(Segment::Operator(c));
            start = idx + c.len_utf8();
        }
    }
    if start < formula.len() {
        segments.push(Segment::Text(&formula[start..]));
    }

    segments
}

fn is_numeric_literal(token: &str) -> bool {
    let mut digits = 0;
    let mut points = 0;
    for c in token.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

/// Identifier tokens of a formula, in order of appearance.
pub fn formula_identifiers(formula: &str) -> Vec<String> {
    let normalized = normalize_operators(formula);
    split_formula(&normalized)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Text(text) => {
                let token = text.trim();
                (!token.is_empty() && !is_numeric_literal(token)).then(|| token.to_string())
            }
            Segment::Operator(_) => None,
        })
        .collect()
}
