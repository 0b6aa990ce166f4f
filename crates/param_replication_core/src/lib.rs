//! Cross-region parameter replication primitives.
//!
//! This crate owns the change-event contract, the store abstraction and the
//! replicate-or-skip decision. It intentionally excludes AWS SDK and Lambda
//! runtime concerns; those live in `param_replication_lambda`.

pub mod completion;
pub mod contract;
pub mod replicator;
pub mod store;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
