use analysis_core::ProviderError;
use thiserror::Error;

/// Reasons an assessment could not be evaluated at all.
///
/// These are distinct from suppression: a suppressed assessment is a valid
/// "do not trade" verdict, while an error means the inputs were unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualificationError {
    #[error("Contract violation in {field}: {reason}")]
    ContractViolation { field: String, reason: String },

    #[error("Upstream provider error: {0}")]
    Upstream(#[from] ProviderError),
}

impl QualificationError {
    pub fn contract(field: impl Into<String>, reason: impl Into<String>) -> Self {
        QualificationError::ContractViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, QualificationError::ContractViolation { .. })
    }
}

pub type QualificationResult<T> = Result<T, QualificationError>;
