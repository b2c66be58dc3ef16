use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("Invalid projection parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Degenerate projection: {0}")]
    Degenerate(String),
}

impl ProjectionError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
