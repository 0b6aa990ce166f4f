use async_trait::async_trait;
use thiserror::Error;

use crate::contract::{Parameter, ParameterWrite, PutReceipt};

/// Failure reported by a parameter store, already classified by the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("parameter {name} not found")]
    NotFound { name: String },

    #[error("retryable store failure: {message}")]
    Retryable { message: String },

    #[error("store failure: {message}")]
    Other { message: String },
}

impl StoreError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

/// A regional key-value parameter service.
///
/// Implementations are long-lived handles shared by every invocation, so they
/// must be usable from concurrent tasks.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Reads a parameter with secure values decrypted.
    async fn get(&self, name: &str) -> Result<Parameter, StoreError>;

    async fn put(&self, write: &ParameterWrite) -> Result<PutReceipt, StoreError>;

    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}
