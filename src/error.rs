use thiserror::Error;

#[derive(Error, Debug)]
pub enum RatioEngineError {
    #[error("Unbalanced parentheses at position {position}")]
    UnbalancedParentheses { position: usize },

    #[error("Expected a number or '(' at position {position}")]
    EmptyFactor { position: usize },

    #[error("Invalid numeral: {0}")]
    InvalidNumber(String),

    #[error("Unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("Unexpected trailing input at position {position}")]
    TrailingInput { position: usize },

    #[error("Expression nested too deeply at position {position}")]
    NestingTooDeep { position: usize },

    #[error("No periods supplied to the report")]
    NoPeriods,

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RatioEngineError {
    /// True for the malformed-expression family raised by the evaluator.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::UnbalancedParentheses { .. }
                | Self::EmptyFactor { .. }
                | Self::InvalidNumber(_)
                | Self::UnexpectedCharacter { .. }
                | Self::TrailingInput { .. }
                | Self::NestingTooDeep { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RatioEngineError>;
