use crate::domain::entity::EntityId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BillingError>;

/// Typed failure conditions shared by every core operation.
///
/// Insufficient funds is deliberately NOT modeled here; `deduct` reports it
/// as `Ok(false)` because callers treat it as an expected business outcome.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("no {kind} with id {id}")]
    NotFound { kind: &'static str, id: EntityId },
    #[error("{kind} with {field} \"{value}\" already exists")]
    AlreadyExists {
        kind: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BillingError {
    pub fn not_found(kind: &'static str, id: EntityId) -> Self {
        Self::NotFound { kind, id }
    }

    pub fn already_exists(kind: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            field,
            value: value.into(),
        }
    }

    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(source))
    }
}
