use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::operation::delete_parameter::DeleteParameterError;
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use param_replication_core::contract::{Parameter, ParameterType, ParameterWrite, PutReceipt};
use param_replication_core::store::{ParameterStore, StoreError};

/// Error codes the AWS SDKs treat as throttling or transient.
const RETRYABLE_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "BandwidthLimitExceeded",
    "LimitExceededException",
    "RequestThrottled",
    "SlowDown",
    "PriorRequestNotComplete",
    "RequestTimeout",
    "RequestTimeoutException",
    "TooManyUpdates",
];

/// Parameter Store in one region.
#[derive(Clone, Debug)]
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
    region: String,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Builds a client from the shared SDK settings with the region pinned.
    pub fn for_region(shared: &SdkConfig, region: &str) -> Self {
        let config = aws_sdk_ssm::config::Builder::from(shared)
            .region(Region::new(region.to_string()))
            .build();
        Self::new(aws_sdk_ssm::Client::from_conf(config), region)
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str) -> Result<Parameter, StoreError> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|error| {
                classify_sdk_error(
                    name,
                    &self.region,
                    error,
                    GetParameterError::is_parameter_not_found,
                )
            })?;

        let parameter = output.parameter().ok_or_else(|| {
            StoreError::other(format!(
                "GetParameter returned no parameter for {name} in {}",
                self.region
            ))
        })?;

        Ok(Parameter {
            name: parameter.name().unwrap_or(name).to_string(),
            value: parameter.value().unwrap_or_default().to_string(),
            kind: parameter
                .r#type()
                .map(|kind| ParameterType::from(kind.as_str()))
                .unwrap_or(ParameterType::String),
            data_type: parameter.data_type().map(str::to_string),
            version: Some(parameter.version()),
        })
    }

    async fn put(&self, write: &ParameterWrite) -> Result<PutReceipt, StoreError> {
        let output = self
            .client
            .put_parameter()
            .name(&write.name)
            .value(&write.value)
            .r#type(aws_sdk_ssm::types::ParameterType::from(write.kind.as_str()))
            .overwrite(write.overwrite)
            .set_data_type(write.data_type.clone())
            .send()
            .await
            .map_err(|error| classify_sdk_error(&write.name, &self.region, error, |_| false))?;

        Ok(PutReceipt {
            version: output.version(),
            tier: output.tier().map(|tier| tier.as_str().to_string()),
        })
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.client
            .delete_parameter()
            .name(name)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                classify_sdk_error(
                    name,
                    &self.region,
                    error,
                    DeleteParameterError::is_parameter_not_found,
                )
            })
    }
}

/// Maps an SDK failure onto the store taxonomy. `is_not_found` recognizes the
/// operation's own not-found variant.
fn classify_sdk_error<E>(
    name: &str,
    region: &str,
    error: SdkError<E>,
    is_not_found: impl FnOnce(&E) -> bool,
) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let retryable = match &error {
        SdkError::ServiceError(context) => {
            if is_not_found(context.err()) {
                return StoreError::not_found(name);
            }
            is_retryable_service_failure(context.err().code(), context.raw().status().as_u16())
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        _ => false,
    };

    let message = format!("{name} in {region}: {}", DisplayErrorContext(&error));
    if retryable {
        StoreError::retryable(message)
    } else {
        StoreError::other(message)
    }
}

fn is_retryable_service_failure(code: Option<&str>, status: u16) -> bool {
    if code.is_some_and(|code| RETRYABLE_ERROR_CODES.contains(&code)) {
        return true;
    }
    status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use aws_sdk_ssm::config::http::HttpResponse;
    use aws_sdk_ssm::error::ErrorMetadata;
    use aws_sdk_ssm::types::error::ParameterNotFound;
    use aws_smithy_types::body::SdkBody;

    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse::new(
            status.try_into().expect("valid status code"),
            SdkBody::empty(),
        )
    }

    fn unhandled_get_error(code: &str, status: u16) -> SdkError<GetParameterError> {
        let error = GetParameterError::generic(ErrorMetadata::builder().code(code).build());
        SdkError::service_error(error, response(status))
    }

    #[test]
    fn missing_parameter_on_get_is_not_found() {
        let error = SdkError::service_error(
            GetParameterError::ParameterNotFound(ParameterNotFound::builder().build()),
            response(400),
        );

        let classified = classify_sdk_error(
            "/a",
            "eu-west-1",
            error,
            GetParameterError::is_parameter_not_found,
        );
        assert_eq!(classified, StoreError::not_found("/a"));
    }

    #[test]
    fn missing_parameter_on_delete_is_not_found() {
        let error = SdkError::service_error(
            DeleteParameterError::ParameterNotFound(ParameterNotFound::builder().build()),
            response(400),
        );

        let classified = classify_sdk_error(
            "/a",
            "eu-west-1",
            error,
            DeleteParameterError::is_parameter_not_found,
        );
        assert!(classified.is_not_found());
    }

    #[test]
    fn unhandled_server_error_response_is_retryable() {
        let error = unhandled_get_error("UnknownServiceFault", 500);

        let classified = classify_sdk_error(
            "/a",
            "eu-west-1",
            error,
            GetParameterError::is_parameter_not_found,
        );
        assert!(classified.is_retryable());
        assert!(classified.to_string().contains("/a in eu-west-1"));
    }

    #[test]
    fn throttled_service_error_is_retryable() {
        let error = unhandled_get_error("ThrottlingException", 400);

        let classified = classify_sdk_error(
            "/a",
            "eu-west-1",
            error,
            GetParameterError::is_parameter_not_found,
        );
        assert!(classified.is_retryable());
    }

    #[test]
    fn denied_service_error_is_not_retryable() {
        let error = unhandled_get_error("AccessDeniedException", 400);

        let classified = classify_sdk_error(
            "/a",
            "eu-west-1",
            error,
            GetParameterError::is_parameter_not_found,
        );
        assert!(!classified.is_retryable());
        assert!(!classified.is_not_found());
    }

    #[test]
    fn throttling_codes_are_retryable() {
        assert!(is_retryable_service_failure(Some("ThrottlingException"), 400));
        assert!(is_retryable_service_failure(Some("TooManyUpdates"), 400));
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(is_retryable_service_failure(Some("InternalServerError"), 500));
        assert!(is_retryable_service_failure(None, 503));
        assert!(is_retryable_service_failure(None, 429));
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!is_retryable_service_failure(Some("AccessDeniedException"), 400));
        assert!(!is_retryable_service_failure(Some("ValidationException"), 400));
        assert!(!is_retryable_service_failure(None, 403));
    }

    #[test]
    fn timeouts_are_retryable() {
        let error = SdkError::<GetParameterError>::timeout_error("operation timed out");

        let classified = classify_sdk_error("/a", "eu-west-1", error, |_| false);
        assert!(classified.is_retryable());
        assert!(classified.to_string().contains("/a in eu-west-1"));
    }

    #[test]
    fn construction_failures_are_not_retryable() {
        let error = SdkError::<GetParameterError>::construction_failure("missing name");

        let classified = classify_sdk_error("/a", "eu-west-1", error, |_| true);
        assert!(!classified.is_retryable());
        assert!(!classified.is_not_found());
    }
}
