use lambda_runtime::Error;
use param_replication_core::completion::{settle, ErrorPolicy};
use param_replication_core::contract::ChangeEvent;
use param_replication_core::replicator::{ReplicationError, Replicator};
use param_replication_core::store::ParameterStore;
use serde_json::Value;
use tracing::info;

/// Handles one Parameter Store change notification.
///
/// Returns the completion status on success. An `Err` tells the runtime the
/// invocation failed so the event is redelivered.
pub async fn handle_replication_event<S, T>(
    payload: Value,
    replicator: &Replicator<S, T>,
    policy: ErrorPolicy,
) -> Result<String, Error>
where
    S: ParameterStore,
    T: ParameterStore,
{
    info!(event = %payload, "received parameter change event");

    let result = match ChangeEvent::from_value(payload) {
        Ok(event) => replicator.replicate(&event).await,
        Err(error) => Err(ReplicationError::invalid_event(error.to_string())),
    };

    settle(result, policy)
        .map(str::to_string)
        .map_err(Error::from)
}
