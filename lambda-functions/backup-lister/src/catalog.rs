use async_trait::async_trait;
use aws_sdk_backup::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_backup::primitives::DateTime as AwsDateTime;
use aws_sdk_backup::types::BackupJobState;
use aws_sdk_backup::Client as BackupClient;
use paginated_fetcher::{FetchError, Page};

use crate::records::{
    to_aws, BackupJobRecord, BackupPlanRecord, BackupVaultRecord, ProtectedResourceRecord,
    RecoveryPointRecord,
};
use crate::request::{BackupJobFilter, CreationWindow, RecoveryPointFilter};

/// One page of each AWS Backup list operation, already projected.
///
/// `token` is the continuation token to send and `page_size` the
/// `MaxResults` hint; both are passed through untouched.
#[async_trait]
pub trait BackupCatalog: Send + Sync {
    async fn list_backup_vaults(
        &self,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<BackupVaultRecord>, FetchError>;

    async fn list_backup_jobs(
        &self,
        filter: BackupJobFilter,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<BackupJobRecord>, FetchError>;

    async fn list_recovery_points(
        &self,
        filter: RecoveryPointFilter,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<RecoveryPointRecord>, FetchError>;

    async fn list_backup_plans(
        &self,
        include_deleted: bool,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<BackupPlanRecord>, FetchError>;

    async fn list_protected_resources(
        &self,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<ProtectedResourceRecord>, FetchError>;
}

pub struct BackupCatalogClient {
    client: BackupClient,
}

impl BackupCatalogClient {
    pub fn new(client: BackupClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BackupCatalog for BackupCatalogClient {
    async fn list_backup_vaults(
        &self,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<BackupVaultRecord>, FetchError> {
        let output = self
            .client
            .list_backup_vaults()
            .set_next_token(token)
            .set_max_results(page_size)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let items = output.backup_vault_list.unwrap_or_default();
        Ok(Page::new(items, output.next_token).map(BackupVaultRecord::from))
    }

    async fn list_backup_jobs(
        &self,
        filter: BackupJobFilter,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<BackupJobRecord>, FetchError> {
        let (created_after, created_before) = creation_bounds(filter.created);

        let output = self
            .client
            .list_backup_jobs()
            .set_by_backup_vault_name(filter.backup_vault_name)
            .set_by_resource_arn(filter.resource_arn)
            .set_by_resource_type(filter.resource_type)
            .set_by_state(filter.state.as_deref().map(BackupJobState::from))
            .set_by_account_id(filter.account_id)
            .set_by_created_after(created_after)
            .set_by_created_before(created_before)
            .set_next_token(token)
            .set_max_results(page_size)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let items = output.backup_jobs.unwrap_or_default();
        Ok(Page::new(items, output.next_token).map(BackupJobRecord::from))
    }

    async fn list_recovery_points(
        &self,
        filter: RecoveryPointFilter,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<RecoveryPointRecord>, FetchError> {
        let (created_after, created_before) = creation_bounds(filter.created);

        let output = self
            .client
            .list_recovery_points_by_backup_vault()
            .backup_vault_name(filter.backup_vault_name)
            .set_by_resource_arn(filter.resource_arn)
            .set_by_resource_type(filter.resource_type)
            .set_by_backup_plan_id(filter.backup_plan_id)
            .set_by_created_after(created_after)
            .set_by_created_before(created_before)
            .set_next_token(token)
            .set_max_results(page_size)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let items = output.recovery_points.unwrap_or_default();
        Ok(Page::new(items, output.next_token).map(RecoveryPointRecord::from))
    }

    async fn list_backup_plans(
        &self,
        include_deleted: bool,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<BackupPlanRecord>, FetchError> {
        let output = self
            .client
            .list_backup_plans()
            .include_deleted(include_deleted)
            .set_next_token(token)
            .set_max_results(page_size)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let items = output.backup_plans_list.unwrap_or_default();
        Ok(Page::new(items, output.next_token).map(BackupPlanRecord::from))
    }

    async fn list_protected_resources(
        &self,
        token: Option<String>,
        page_size: Option<i32>,
    ) -> Result<Page<ProtectedResourceRecord>, FetchError> {
        let output = self
            .client
            .list_protected_resources()
            .set_next_token(token)
            .set_max_results(page_size)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        let items = output.results.unwrap_or_default();
        Ok(Page::new(items, output.next_token).map(ProtectedResourceRecord::from))
    }
}

/// SDK `ByCreatedAfter` / `ByCreatedBefore` values for an optional window.
fn creation_bounds(window: Option<CreationWindow>) -> (Option<AwsDateTime>, Option<AwsDateTime>) {
    match window {
        Some(window) => (
            window.after.as_ref().map(to_aws),
            window.before.as_ref().map(to_aws),
        ),
        None => (None, None),
    }
}

/// Map an SDK failure onto the fetcher's error taxonomy.
pub fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> FetchError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            FetchError::Transport(DisplayErrorContext(&err).to_string())
        }
        SdkError::ServiceError(context) => {
            let service_err = context.err();
            FetchError::service(
                service_err.code().unwrap_or("Unknown"),
                service_err.message().unwrap_or_default(),
            )
        }
        SdkError::ConstructionFailure(_) => {
            FetchError::InvalidRequest(DisplayErrorContext(&err).to_string())
        }
        _ => FetchError::Protocol(DisplayErrorContext(&err).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_backup::error::ErrorMetadata;
    use aws_sdk_backup::operation::list_backup_jobs::ListBackupJobsError;
    use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
    use aws_smithy_runtime_api::http::StatusCode;
    use aws_smithy_types::body::SdkBody;
    use chrono::{TimeZone, Utc};

    type JobsSdkError = SdkError<ListBackupJobsError, HttpResponse>;

    #[test]
    fn test_timeout_is_transport() {
        let err: JobsSdkError = SdkError::timeout_error("request timed out");
        let classified = classify_sdk_error(err);
        assert_eq!(classified.kind(), paginated_fetcher::ErrorKind::Transport);
    }

    #[test]
    fn test_service_error_keeps_code_and_message() {
        let service_err = ListBackupJobsError::generic(
            ErrorMetadata::builder()
                .code("ThrottlingException")
                .message("Rate exceeded")
                .build(),
        );
        let raw = HttpResponse::new(StatusCode::try_from(400).unwrap(), SdkBody::empty());
        let err: JobsSdkError = SdkError::service_error(service_err, raw);

        assert_eq!(
            classify_sdk_error(err),
            FetchError::service("ThrottlingException", "Rate exceeded")
        );
    }

    #[test]
    fn test_construction_failure_is_invalid_request() {
        let err: JobsSdkError = SdkError::construction_failure("missing BackupVaultName");
        assert!(matches!(
            classify_sdk_error(err),
            FetchError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_creation_bounds() {
        let after = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let window = CreationWindow::from_bounds(Some(after), None);

        let (sdk_after, sdk_before) = creation_bounds(window);
        assert_eq!(sdk_after.map(|t| t.secs()), Some(after.timestamp()));
        assert!(sdk_before.is_none());

        assert_eq!(creation_bounds(None), (None, None));
    }
}
