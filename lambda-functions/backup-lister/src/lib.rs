use aws_config::BehaviorVersion;
use aws_sdk_backup::Client as BackupClient;
use chrono::Utc;
use lambda_runtime::Error;
use paginated_fetcher::{fetch, FetchError, FetchOutcome, Page, PaginatedFetcher};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::info;

pub mod catalog;
pub mod config;
pub mod records;
pub mod request;

pub use catalog::{classify_sdk_error, BackupCatalog, BackupCatalogClient};
pub use config::ListerConfig;
pub use records::{
    BackupJobRecord, BackupPlanRecord, BackupVaultRecord, ProtectedResourceRecord,
    RecoveryPointRecord,
};
pub use request::{
    BackupJobFilter, CreationWindow, ListFilters, ListRequest, RecoveryPointFilter, ResourceKind,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    /// Every requested page was fetched.
    Success,
    /// A bounded listing stopped early on an error after returning items.
    Partial,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListResponse {
    pub status: ListStatus,
    pub resource: ResourceKind,
    pub items: Vec<serde_json::Value>,
    pub item_count: usize,
    pub next_token: Option<String>,
    pub pages_fetched: usize,
    pub truncated: usize,
    pub warning: Option<String>,
    pub timestamp: String,
}

impl ListResponse {
    pub fn from_outcome<T: Serialize>(
        resource: ResourceKind,
        outcome: FetchOutcome<T>,
    ) -> Result<Self, serde_json::Error> {
        let items = outcome
            .items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            status: if outcome.is_partial() {
                ListStatus::Partial
            } else {
                ListStatus::Success
            },
            resource,
            item_count: items.len(),
            items,
            next_token: outcome.next_token,
            pages_fetched: outcome.pages_fetched,
            truncated: outcome.truncated,
            warning: match outcome.soft_stop {
                Some(err) => Some(err.to_string()),
                None if outcome.truncated > 0 => Some(format!(
                    "{} items past max_items were dropped; the listing cannot be resumed",
                    outcome.truncated
                )),
                None => None,
            },
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}

pub struct BackupListerService<C> {
    pub catalog: C,
    pub config: ListerConfig,
}

impl BackupListerService<BackupCatalogClient> {
    pub async fn new() -> Result<Self, Error> {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let lister_config = ListerConfig::from_env()?;

        Ok(Self {
            catalog: BackupCatalogClient::new(BackupClient::new(&config)),
            config: lister_config,
        })
    }
}

impl<C: BackupCatalog> BackupListerService<C> {
    pub fn with_catalog(catalog: C, config: ListerConfig) -> Self {
        Self { catalog, config }
    }

    pub async fn list(&self, request: &ListRequest) -> Result<ListResponse, Error> {
        let options = request.fetch_options(&self.config);
        let catalog = &self.catalog;

        info!(
            resource = %request.resource,
            max_items = ?options.max_items,
            auto_advance = options.auto_advance,
            resuming = options.start_token.is_some(),
            "Listing AWS Backup resources"
        );

        match request.resource {
            ResourceKind::BackupVaults => {
                let fetcher = fetch(
                    move |token, page_size| catalog.list_backup_vaults(token, page_size),
                    options,
                );
                self.respond(request.resource, fetcher).await
            }
            ResourceKind::BackupJobs => {
                let filter = request.filters.backup_jobs()?;
                let fetcher = fetch(
                    move |token, page_size| {
                        catalog.list_backup_jobs(filter.clone(), token, page_size)
                    },
                    options,
                );
                self.respond(request.resource, fetcher).await
            }
            ResourceKind::RecoveryPoints => {
                let filter = request.filters.recovery_points()?;
                let fetcher = fetch(
                    move |token, page_size| {
                        catalog.list_recovery_points(filter.clone(), token, page_size)
                    },
                    options,
                );
                self.respond(request.resource, fetcher).await
            }
            ResourceKind::BackupPlans => {
                let include_deleted = request.filters.include_deleted();
                let fetcher = fetch(
                    move |token, page_size| {
                        catalog.list_backup_plans(include_deleted, token, page_size)
                    },
                    options,
                );
                self.respond(request.resource, fetcher).await
            }
            ResourceKind::ProtectedResources => {
                let fetcher = fetch(
                    move |token, page_size| catalog.list_protected_resources(token, page_size),
                    options,
                );
                self.respond(request.resource, fetcher).await
            }
        }
    }

    async fn respond<T, F, Fut>(
        &self,
        resource: ResourceKind,
        fetcher: PaginatedFetcher<T, F>,
    ) -> Result<ListResponse, Error>
    where
        T: Serialize,
        F: FnMut(Option<String>, Option<i32>) -> Fut,
        Fut: Future<Output = Result<Page<T>, FetchError>>,
    {
        let outcome = fetcher.collect().await?;
        let soft_stop_kind = outcome.soft_stop.as_ref().map(|err| err.kind().to_string());

        // Soft stops are logged at warn by the fetcher.
        let response = ListResponse::from_outcome(resource, outcome)?;
        info!(
            resource = %resource,
            items = response.item_count,
            pages = response.pages_fetched,
            has_more = response.next_token.is_some(),
            partial = response.status == ListStatus::Partial,
            soft_stop = ?soft_stop_kind,
            "Listed {} items",
            response.item_count
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization() {
        let outcome = FetchOutcome {
            items: vec![BackupVaultRecord {
                backup_vault_name: Some("primary".to_string()),
                backup_vault_arn: None,
                encryption_key_arn: None,
                creation_date: None,
            }],
            next_token: Some("next".to_string()),
            soft_stop: None,
            pages_fetched: 1,
            truncated: 0,
            cancelled: false,
        };

        let response = ListResponse::from_outcome(ResourceKind::BackupVaults, outcome).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["resource"], "backup_vaults");
        assert_eq!(json["item_count"], 1);
        assert_eq!(json["items"][0]["backup_vault_name"], "primary");
        assert_eq!(json["next_token"], "next");
        assert!(json["warning"].is_null());
    }

    #[test]
    fn test_partial_response() {
        let outcome: FetchOutcome<BackupPlanRecord> = FetchOutcome {
            items: Vec::new(),
            next_token: Some("t2".to_string()),
            soft_stop: Some(FetchError::Transport("connection reset".to_string())),
            pages_fetched: 1,
            truncated: 0,
            cancelled: false,
        };

        let response = ListResponse::from_outcome(ResourceKind::BackupPlans, outcome).unwrap();
        assert_eq!(response.status, ListStatus::Partial);
        assert_eq!(
            response.warning.as_deref(),
            Some("Transport error: connection reset")
        );
    }

    #[test]
    fn test_truncated_response_warns_and_has_no_token() {
        let outcome = FetchOutcome {
            items: vec![plan_record("a"), plan_record("b")],
            next_token: None,
            soft_stop: None,
            pages_fetched: 1,
            truncated: 1,
            cancelled: false,
        };

        let response = ListResponse::from_outcome(ResourceKind::BackupPlans, outcome).unwrap();
        assert_eq!(response.status, ListStatus::Success);
        assert_eq!(response.next_token, None);
        assert_eq!(
            response.warning.as_deref(),
            Some("1 items past max_items were dropped; the listing cannot be resumed")
        );
    }

    fn plan_record(id: &str) -> BackupPlanRecord {
        BackupPlanRecord {
            backup_plan_id: Some(id.to_string()),
            backup_plan_name: None,
            backup_plan_arn: None,
            version_id: None,
            creation_date: None,
            deletion_date: None,
        }
    }
}
