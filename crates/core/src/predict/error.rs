use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("price history is empty")]
    EmptyHistory,

    #[error("{model} needs at least {needed} closes (got {got})")]
    InsufficientHistory {
        model: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("price history contains a non-finite value at index {index}")]
    NonFiniteInput { index: usize },

    #[error("normal equations are singular")]
    Singular,

    #[error("estimate is not finite")]
    NonFiniteEstimate,
}

pub(crate) fn ensure_finite(closes: &[f64]) -> Result<(), PredictError> {
    if closes.is_empty() {
        return Err(PredictError::EmptyHistory);
    }
    match closes.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(PredictError::NonFiniteInput { index }),
        None => Ok(()),
    }
}
