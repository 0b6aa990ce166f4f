use lambda_runtime::{service_fn, Error, LambdaEvent};
use param_replication_core::replicator::Replicator;
use param_replication_lambda::adapters::ssm::SsmParameterStore;
use param_replication_lambda::config::ReplicatorConfig;
use param_replication_lambda::handlers::replicate::handle_replication_event;
use param_replication_lambda::logging::init_logging;
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = ReplicatorConfig::from_env()?;
    init_logging(config.log_format)?;

    if config.same_region() {
        warn!(
            region = %config.source_region,
            "source and target regions are identical; writes will be skipped as unchanged"
        );
    }

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let replicator = Replicator::new(
        SsmParameterStore::for_region(&aws_config, &config.source_region),
        SsmParameterStore::for_region(&aws_config, &config.target_region),
        config.target_region.clone(),
    );
    info!(
        source_region = replicator.source().region(),
        target_region = replicator.target_region(),
        error_policy = config.error_policy.as_str(),
        "parameter replicator initialized"
    );

    let replicator = &replicator;
    let policy = config.error_policy;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        let span = info_span!("invocation", request_id = %event.context.request_id);
        handle_replication_event(event.payload, replicator, policy)
            .instrument(span)
            .await
    }))
    .await
}
