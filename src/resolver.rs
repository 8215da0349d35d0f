use crate::heuristics;
use crate::normalizer::normalize;
use crate::schema::{EngineConfig, ExtractedValues};
use log::debug;
use serde::{Deserialize, Serialize};

/// How a token was tied to a value, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    /// The raw label equals the token (surrounding whitespace ignored).
    Exact,
    NormalizedExact,
    /// One normalized key contains the other.
    Containment,
    /// A whitespace-separated word of the token occurs in a normalized key.
    TokenOverlap,
    /// Rebuilt from related fields by the derived-concept table.
    DerivedHeuristic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Resolved {
        value: f64,
        method: MatchMethod,
        /// The matched label, or the concept name for derived values.
        source: String,
    },
    Unresolved,
}

impl ResolutionOutcome {
    fn resolved(value: f64, method: MatchMethod, source: &str) -> Self {
        Self::Resolved {
            value,
            method,
            source: source.to_string(),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Resolved { value, .. } => Some(*value),
            Self::Unresolved => None,
        }
    }

    pub fn method(&self) -> Option<MatchMethod> {
        match self {
            Self::Resolved { method, .. } => Some(*method),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Resolves formula tokens against one period's values.
///
/// Holds nothing but a borrowed configuration, so a single resolver can be
/// shared across threads and periods.
pub struct FieldResolver<'a> {
    config: &'a EngineConfig,
}

impl<'a> FieldResolver<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn resolve(&self, token: &str, values: &ExtractedValues) -> ResolutionOutcome {
        let key = normalize(token);
        if key.is_empty() {
            return ResolutionOutcome::Unresolved;
        }

        let outcome = resolve_exact(token, values);
        if outcome.is_resolved() {
            return log_match(token, outcome);
        }

        let outcome = resolve_containment(&key, values);
        if outcome.is_resolved() {
            return log_match(token, outcome);
        }

        if self.config.enable_token_overlap {
            let outcome = resolve_token_overlap(token, values);
            if outcome.is_resolved() {
                return log_match(token, outcome);
            }
        }

        if self.config.enable_derived_heuristics {
            if let Some((concept, value)) = heuristics::derive(&key, values) {
                return log_match(
                    token,
                    ResolutionOutcome::resolved(value, MatchMethod::DerivedHeuristic, concept),
                );
            }
        }

        debug!("Token '{}' unresolved against {} values", token, values.len());
        ResolutionOutcome::Unresolved
    }
}

/// Resolves with the default configuration (all four steps enabled).
pub fn resolve(token: &str, values: &ExtractedValues) -> ResolutionOutcome {
    FieldResolver::new(&EngineConfig::default()).resolve(token, values)
}

/// Step 1 only: a raw label equal to the token, else the first label with
/// the same normalized key.
pub fn resolve_exact(token: &str, values: &ExtractedValues) -> ResolutionOutcome {
    let trimmed = token.trim();
    if let Some(value) = values.get(trimmed) {
        return ResolutionOutcome::resolved(value, MatchMethod::Exact, trimmed);
    }

    match values.get_normalized(token) {
        Some((label, value)) => {
            ResolutionOutcome::resolved(value, MatchMethod::NormalizedExact, label)
        }
        None => ResolutionOutcome::Unresolved,
    }
}

fn resolve_containment(key: &str, values: &ExtractedValues) -> ResolutionOutcome {
    for (label, value) in values.iter() {
        let candidate = normalize(label);
        if candidate.is_empty() {
            continue;
        }
        if candidate.contains(key) || key.contains(candidate.as_str()) {
            return ResolutionOutcome::resolved(value, MatchMethod::Containment, label);
        }
    }
    ResolutionOutcome::Unresolved
}

fn resolve_token_overlap(token: &str, values: &ExtractedValues) -> ResolutionOutcome {
    let parts: Vec<String> = token
        .split_whitespace()
        .map(normalize)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return ResolutionOutcome::Unresolved;
    }

    for (label, value) in values.iter() {
        let candidate = normalize(label);
        if parts.iter().any(|part| candidate.contains(part.as_str())) {
            return ResolutionOutcome::resolved(value, MatchMethod::TokenOverlap, label);
        }
    }
    ResolutionOutcome::Unresolved
}

fn log_match(token: &str, outcome: ResolutionOutcome) -> ResolutionOutcome {
    if let ResolutionOutcome::Resolved {
        value,
        method,
        source,
    } = &outcome
    {
        debug!(
            "Resolved '{}' -> '{}' = {} via {:?}",
            token, source, value, method
        );
    }
    outcome
}
