use crate::error::{RatioEngineError, Result};

/// Evaluates an arithmetic expression over numeric literals.
///
/// ```text
/// expression := term (('+'|'-') term)*
/// term       := factor (('*'|'/') factor)*
/// factor     := number | '(' expression ')' | ('+'|'-') factor
/// ```
///
/// Whitespace is ignored. A numeral is ASCII digits with at most one decimal
/// point. Division by zero evaluates to positive infinity instead of failing.
/// Identifiers must already have been replaced by literals.
pub fn evaluate(expression: &str) -> Result<f64> {
    let mut parser = Parser::new(expression);
    let value = parser.expression()?;

    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(value),
        Some(')') => Err(RatioEngineError::UnbalancedParentheses {
            position: parser.pos,
        }),
        Some(_) => Err(RatioEngineError::TrailingInput {
            position: parser.pos,
        }),
    }
}

/// Deepest chain of parentheses and unary signs accepted.
pub const MAX_NESTING: usize = 256;

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn expression(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            if self.consume('+') {
                value += self.term()?;
            } else if self.consume('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        loop {
            if self.consume('*') {
                value *= self.factor()?;
            } else if self.consume('/') {
                let divisor = self.factor()?;
                value = divide(value, divisor);
            } else {
                return Ok(value);
            }
        }
    }

    fn factor(&mut self) -> Result<f64> {
        self.skip_whitespace();
        if self.depth >= MAX_NESTING {
            return Err(RatioEngineError::NestingTooDeep { position: self.pos });
        }

        self.depth += 1;
        let value = self.primary();
        self.depth -= 1;
        value
    }

    fn primary(&mut self) -> Result<f64> {
        let start = self.pos;

        match self.peek() {
            Some('+') => {
                self.pos += 1;
                self.factor()
            }
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.pos += 1;
                let value = self.expression()?;
                if self.consume(')') {
                    Ok(value)
                } else {
                    Err(RatioEngineError::UnbalancedParentheses { position: start })
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(')') | None => Err(RatioEngineError::EmptyFactor { position: start }),
            Some(c) if is_operator(c) => Err(RatioEngineError::EmptyFactor { position: start }),
            Some(c) => Err(RatioEngineError::UnexpectedCharacter {
                character: c,
                position: start,
            }),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        let mut seen_point = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' {
                if seen_point {
                    // "1.2.3": consume the whole run so the error shows it
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
                        self.pos += 1;
                    }
                    return Err(self.invalid_number(start));
                }
                seen_point = true;
                self.pos += 1;
            } else {
                break;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map_err(|_| RatioEngineError::InvalidNumber(text.clone()))
    }

    fn invalid_number(&self, start: usize) -> RatioEngineError {
        RatioEngineError::InvalidNumber(self.chars[start..self.pos].iter().collect())
    }

    fn consume(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }
}

fn is_operator(c: char) -> bool {
    matches!(c, '*' | '/')
}

fn divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::INFINITY
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(evaluate("2 + 3 * (4 - 1)").unwrap(), 11.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("100 / 10 / 2").unwrap(), 5.0);
    }

    #[test]
    fn test_unary_signs() {
        assert_eq!(evaluate("-5 + 2").unwrap(), -3.0);
        assert_eq!(evaluate("3 * -2").unwrap(), -6.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
        assert_eq!(evaluate("+(1.5)").unwrap(), 1.5);
    }

    #[test]
    fn test_decimals_and_whitespace() {
        assert!((evaluate(" 0.1+0.2 ").unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(evaluate(".5 * 4").unwrap(), 2.0);
        assert_eq!(evaluate("\t50\n/\n200 * 100").unwrap(), 25.0);
    }

    #[test]
    fn test_division_by_zero_is_positive_infinity() {
        assert_eq!(evaluate("10 / 0").unwrap(), f64::INFINITY);
        assert_eq!(evaluate("-10 / 0").unwrap(), f64::INFINITY);
        assert_eq!(evaluate("0 / (2 - 2)").unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            evaluate("(2"),
            Err(RatioEngineError::UnbalancedParentheses { .. })
        ));
        assert!(matches!(
            evaluate("2)"),
            Err(RatioEngineError::UnbalancedParentheses { .. })
        ));
        assert!(matches!(
            evaluate("((1 + 2)"),
            Err(RatioEngineError::UnbalancedParentheses { .. })
        ));
    }

    #[test]
    fn test_empty_factor() {
        assert!(matches!(evaluate(""), Err(RatioEngineError::EmptyFactor { .. })));
        assert!(matches!(evaluate("2 +"), Err(RatioEngineError::EmptyFactor { .. })));
        assert!(matches!(evaluate("()"), Err(RatioEngineError::EmptyFactor { .. })));
        assert!(matches!(evaluate("2 * / 3"), Err(RatioEngineError::EmptyFactor { .. })));
    }

    #[test]
    fn test_invalid_numeral() {
        match evaluate("1.2.3 + 1") {
            Err(RatioEngineError::InvalidNumber(text)) => assert_eq!(text, "1.2.3"),
            other => panic!("expected InvalidNumber, got {:?}", other),
        }
        assert!(matches!(evaluate("."), Err(RatioEngineError::InvalidNumber(_))));
    }

    #[test]
    fn test_unexpected_input() {
        assert!(matches!(
            evaluate("2 * Revenue"),
            Err(RatioEngineError::UnexpectedCharacter { character: 'R', .. })
        ));
        assert!(matches!(
            evaluate("2 3"),
            Err(RatioEngineError::TrailingInput { .. })
        ));
        assert!(evaluate("(2").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = evaluate(&deep).unwrap_err();
        assert!(matches!(err, RatioEngineError::NestingTooDeep { .. }));
        assert!(err.is_parse_error());

        assert!(evaluate(&"-".repeat(10_000)).unwrap_err().is_parse_error());

        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
    }
}
