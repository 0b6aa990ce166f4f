use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::{ChangeEvent, Operation, Parameter, ReplicationOutcome};
use crate::store::{ParameterStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    #[error("failed to read {name} from source: {source}")]
    SourceLookup { name: String, source: StoreError },

    #[error("failed to read {name} from target: {source}")]
    TargetLookup { name: String, source: StoreError },

    #[error("failed to write {name} to target: {source}")]
    TargetWrite { name: String, source: StoreError },

    #[error("failed to delete {name} from target: {source}")]
    TargetDelete { name: String, source: StoreError },

    #[error("invalid change event: {reason}")]
    InvalidEvent { reason: String },
}

impl ReplicationError {
    pub fn invalid_event(reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            reason: reason.into(),
        }
    }

    /// True when the underlying store marked the failure as transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SourceLookup { source, .. }
            | Self::TargetLookup { source, .. }
            | Self::TargetWrite { source, .. }
            | Self::TargetDelete { source, .. } => source.is_retryable(),
            Self::InvalidEvent { .. } => false,
        }
    }
}

/// Mirrors parameters from a source store into a target store.
pub struct Replicator<S, T> {
    source: S,
    target: T,
    target_region: String,
}

impl<S, T> Replicator<S, T>
where
    S: ParameterStore,
    T: ParameterStore,
{
    pub fn new(source: S, target: T, target_region: impl Into<String>) -> Self {
        Self {
            source,
            target,
            target_region: target_region.into(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_region(&self) -> &str {
        &self.target_region
    }

    pub async fn replicate(
        &self,
        event: &ChangeEvent,
    ) -> Result<ReplicationOutcome, ReplicationError> {
        match event.operation() {
            Operation::Create | Operation::Update => {
                let name = required_name(event)?;
                self.sync(name).await
            }
            Operation::Delete => {
                let name = required_name(event)?;
                self.purge(name).await
            }
            Operation::Unrecognized(raw) => {
                warn!(
                    operation = %raw,
                    name = event.detail.name.as_deref().unwrap_or_default(),
                    "ignoring unknown parameter operation"
                );
                Ok(ReplicationOutcome::Ignored {
                    operation: raw.clone(),
                })
            }
        }
    }

    /// Copies the source parameter to the target unless the target already
    /// holds the same value and type.
    pub async fn sync(&self, name: &str) -> Result<ReplicationOutcome, ReplicationError> {
        let source_parameter =
            self.source
                .get(name)
                .await
                .map_err(|source| ReplicationError::SourceLookup {
                    name: name.to_string(),
                    source,
                })?;

        let target_parameter = self.lookup_target(name).await?;
        if let Some(existing) = &target_parameter {
            if existing.matches(&source_parameter) {
                info!(
                    name,
                    target_region = %self.target_region,
                    "parameter already matches target, skipping write"
                );
                return Ok(ReplicationOutcome::Unchanged {
                    name: name.to_string(),
                });
            }
        }

        debug!(
            name,
            kind = %source_parameter.kind,
            target_present = target_parameter.is_some(),
            "writing parameter to target"
        );
        let receipt = self
            .target
            .put(&source_parameter.to_write(true))
            .await
            .map_err(|source| ReplicationError::TargetWrite {
                name: name.to_string(),
                source,
            })?;

        Ok(ReplicationOutcome::Written {
            name: name.to_string(),
            version: receipt.version,
            tier: receipt.tier,
        })
    }

    /// Removes the parameter from the target; a missing parameter is fine.
    pub async fn purge(&self, name: &str) -> Result<ReplicationOutcome, ReplicationError> {
        match self.target.delete(name).await {
            Ok(()) => Ok(ReplicationOutcome::Deleted {
                name: name.to_string(),
            }),
            Err(error) if error.is_not_found() => {
                info!(
                    name,
                    target_region = %self.target_region,
                    "parameter not found in target, nothing to delete"
                );
                Ok(ReplicationOutcome::AlreadyAbsent {
                    name: name.to_string(),
                })
            }
            Err(source) => Err(ReplicationError::TargetDelete {
                name: name.to_string(),
                source,
            }),
        }
    }

    async fn lookup_target(&self, name: &str) -> Result<Option<Parameter>, ReplicationError> {
        match self.target.get(name).await {
            Ok(parameter) => Ok(Some(parameter)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(source) => Err(ReplicationError::TargetLookup {
                name: name.to_string(),
                source,
            }),
        }
    }
}

fn required_name(event: &ChangeEvent) -> Result<&str, ReplicationError> {
    event.parameter_name().ok_or_else(|| {
        ReplicationError::invalid_event(format!(
            "{} event is missing detail.name",
            event.operation()
        ))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::contract::ParameterType;
    use crate::test_helpers::{InMemoryParameterStore, StoreCall, StoreOperation};

    fn replicator() -> Replicator<InMemoryParameterStore, InMemoryParameterStore> {
        Replicator::new(
            InMemoryParameterStore::new(),
            InMemoryParameterStore::new(),
            "eu-west-1",
        )
    }

    fn event(operation: &str, name: &str) -> ChangeEvent {
        ChangeEvent::from_value(json!({
            "detail-type": "Parameter Store Change",
            "source": "aws.ssm",
            "detail": {"operation": operation, "name": name}
        }))
        .expect("event should parse")
    }

    #[tokio::test]
    async fn create_writes_missing_parameter() {
        let replicator = replicator();
        replicator
            .source()
            .seed(Parameter::new("/a", "x", ParameterType::String));

        let outcome = replicator
            .replicate(&event("Create", "/a"))
            .await
            .expect("sync should succeed");

        assert_eq!(
            outcome,
            ReplicationOutcome::Written {
                name: "/a".to_string(),
                version: 1,
                tier: None,
            }
        );
        let written = replicator.target().writes();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].value, "x");
        assert_eq!(written[0].kind, ParameterType::String);
        assert!(written[0].overwrite);
    }

    #[tokio::test]
    async fn update_skips_identical_target() {
        let replicator = replicator();
        replicator
            .source()
            .seed(Parameter::new("/a", "x", ParameterType::String));
        replicator
            .target()
            .seed(Parameter::new("/a", "x", ParameterType::String));

        let outcome = replicator
            .replicate(&event("Update", "/a"))
            .await
            .expect("sync should succeed");

        assert_eq!(
            outcome,
            ReplicationOutcome::Unchanged {
                name: "/a".to_string()
            }
        );
        assert!(replicator.target().writes().is_empty());
    }

    #[tokio::test]
    async fn update_rewrites_when_only_type_differs() {
        let replicator = replicator();
        replicator
            .source()
            .seed(Parameter::new("/a", "x", ParameterType::SecureString));
        replicator
            .target()
            .seed(Parameter::new("/a", "x", ParameterType::String));

        replicator
            .replicate(&event("Update", "/a"))
            .await
            .expect("sync should succeed");

        let stored = replicator.target().stored("/a").expect("target should hold /a");
        assert_eq!(stored.kind, ParameterType::SecureString);
        assert_eq!(replicator.target().writes().len(), 1);
    }

    #[tokio::test]
    async fn version_and_data_type_do_not_trigger_writes() {
        let replicator = replicator();
        let mut source = Parameter::new("/a", "x", ParameterType::String);
        source.version = Some(9);
        source.data_type = Some("text".to_string());
        replicator.source().seed(source);
        replicator
            .target()
            .seed(Parameter::new("/a", "x", ParameterType::String));

        let outcome = replicator.sync("/a").await.expect("sync should succeed");
        assert!(matches!(outcome, ReplicationOutcome::Unchanged { .. }));
    }

    #[tokio::test]
    async fn missing_source_parameter_is_an_error() {
        let replicator = replicator();

        let error = replicator
            .sync("/missing")
            .await
            .expect_err("sync without source should fail");

        assert_eq!(
            error,
            ReplicationError::SourceLookup {
                name: "/missing".to_string(),
                source: StoreError::not_found("/missing"),
            }
        );
        assert!(!error.is_retryable());
        assert!(replicator.target().calls().is_empty());
    }

    #[tokio::test]
    async fn target_lookup_failure_propagates_without_write() {
        let replicator = replicator();
        replicator
            .source()
            .seed(Parameter::new("/a", "x", ParameterType::String));
        replicator
            .target()
            .fail_next(StoreOperation::Get, StoreError::retryable("throttled"));

        let error = replicator
            .sync("/a")
            .await
            .expect_err("target lookup failure should propagate");

        assert!(matches!(error, ReplicationError::TargetLookup { .. }));
        assert!(error.is_retryable());
        assert!(replicator.target().writes().is_empty());
    }

    #[tokio::test]
    async fn delete_of_absent_parameter_succeeds() {
        let replicator = replicator();

        let outcome = replicator
            .replicate(&event("Delete", "/a"))
            .await
            .expect("purge should succeed");

        assert_eq!(
            outcome,
            ReplicationOutcome::AlreadyAbsent {
                name: "/a".to_string()
            }
        );
        assert_eq!(
            replicator.target().calls(),
            vec![StoreCall::Delete("/a".to_string())]
        );
    }

    #[tokio::test]
    async fn delete_failure_other_than_not_found_propagates() {
        let replicator = replicator();
        replicator
            .target()
            .fail_next(StoreOperation::Delete, StoreError::other("access denied"));

        let error = replicator
            .purge("/a")
            .await
            .expect_err("purge should fail");
        assert!(matches!(error, ReplicationError::TargetDelete { .. }));
    }

    #[tokio::test]
    async fn unknown_operation_touches_no_store() {
        let replicator = replicator();

        let outcome = replicator
            .replicate(&event("LabelParameterVersion", "/a"))
            .await
            .expect("unknown operation should not fail");

        assert_eq!(
            outcome,
            ReplicationOutcome::Ignored {
                operation: "LabelParameterVersion".to_string()
            }
        );
        assert!(replicator.source().calls().is_empty());
        assert!(replicator.target().calls().is_empty());
    }

    #[tokio::test]
    async fn known_operation_without_name_is_invalid() {
        let replicator = replicator();
        let event = ChangeEvent::from_value(json!({"detail": {"operation": "Delete"}}))
            .expect("event should parse");

        let error = replicator
            .replicate(&event)
            .await
            .expect_err("missing name should fail");

        assert!(matches!(error, ReplicationError::InvalidEvent { .. }));
        assert!(!error.is_retryable());
        assert!(replicator.target().calls().is_empty());
    }
}
