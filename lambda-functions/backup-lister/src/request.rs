use bon::Builder;
use chrono::{DateTime, Utc};
use paginated_fetcher::{FetchError, FetchOptions};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ListerConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    BackupVaults,
    BackupJobs,
    RecoveryPoints,
    BackupPlans,
    ProtectedResources,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackupVaults => write!(f, "backup_vaults"),
            Self::BackupJobs => write!(f, "backup_jobs"),
            Self::RecoveryPoints => write!(f, "recovery_points"),
            Self::BackupPlans => write!(f, "backup_plans"),
            Self::ProtectedResources => write!(f, "protected_resources"),
        }
    }
}

fn default_auto_advance() -> bool {
    true
}

/// Lambda event for one list invocation.
#[derive(Builder, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct ListRequest {
    pub resource: ResourceKind,

    /// Cap on returned items; falls back to the configured default.
    pub max_items: Option<usize>,

    /// Resume token from a previous response.
    pub next_token: Option<String>,

    #[builder(default = true)]
    #[serde(default = "default_auto_advance")]
    pub auto_advance: bool,

    pub strict_limit: Option<bool>,

    #[builder(default)]
    #[serde(default)]
    pub filters: ListFilters,
}

impl ListRequest {
    pub fn fetch_options(&self, config: &ListerConfig) -> FetchOptions {
        FetchOptions::builder()
            .maybe_start_token(self.next_token.clone())
            .maybe_max_items(self.max_items.or(config.default_max_items))
            .auto_advance(self.auto_advance)
            .strict_limit(self.strict_limit.unwrap_or(config.strict_limit))
            .service_max_page_size(config.max_page_size)
            .build()
    }
}

/// Filter parameters accepted by any list operation; each operation
/// picks the ones it understands.
#[derive(Builder, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ListFilters {
    pub backup_vault_name: Option<String>,
    pub resource_arn: Option<String>,
    pub resource_type: Option<String>,
    pub state: Option<String>,
    pub backup_plan_id: Option<String>,
    pub account_id: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub include_deleted: Option<bool>,
}

impl ListFilters {
    /// Present only when at least one creation-date bound was given.
    pub fn creation_window(&self) -> Result<Option<CreationWindow>, FetchError> {
        let window = CreationWindow::from_bounds(self.created_after, self.created_before);
        if let Some(window) = &window {
            window.validate()?;
        }
        Ok(window)
    }

    pub fn backup_jobs(&self) -> Result<BackupJobFilter, FetchError> {
        Ok(BackupJobFilter {
            backup_vault_name: self.backup_vault_name.clone(),
            resource_arn: self.resource_arn.clone(),
            resource_type: self.resource_type.clone(),
            state: self.state.clone(),
            account_id: self.account_id.clone(),
            created: self.creation_window()?,
        })
    }

    pub fn recovery_points(&self) -> Result<RecoveryPointFilter, FetchError> {
        let backup_vault_name = self
            .backup_vault_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                FetchError::InvalidRequest(
                    "backup_vault_name is required to list recovery points".to_string(),
                )
            })?;

        Ok(RecoveryPointFilter {
            backup_vault_name,
            resource_arn: self.resource_arn.clone(),
            resource_type: self.resource_type.clone(),
            backup_plan_id: self.backup_plan_id.clone(),
            created: self.creation_window()?,
        })
    }

    pub fn include_deleted(&self) -> bool {
        self.include_deleted.unwrap_or(false)
    }
}

/// Creation-date range filter carrying only the bounds that were set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationWindow {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl CreationWindow {
    pub fn from_bounds(
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        if after.is_none() && before.is_none() {
            return None;
        }
        Some(Self { after, before })
    }

    fn validate(&self) -> Result<(), FetchError> {
        match (self.after, self.before) {
            (Some(after), Some(before)) if after > before => Err(FetchError::InvalidRequest(
                format!("created_after ({after}) is later than created_before ({before})"),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupJobFilter {
    pub backup_vault_name: Option<String>,
    pub resource_arn: Option<String>,
    pub resource_type: Option<String>,
    pub state: Option<String>,
    pub account_id: Option<String>,
    pub created: Option<CreationWindow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryPointFilter {
    pub backup_vault_name: String,
    pub resource_arn: Option<String>,
    pub resource_type: Option<String>,
    pub backup_plan_id: Option<String>,
    pub created: Option<CreationWindow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"resource": "backup_jobs", "max_items": 25, "filters": {"state": "FAILED"}}"#;
        let request: ListRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.resource, ResourceKind::BackupJobs);
        assert_eq!(request.max_items, Some(25));
        assert!(request.auto_advance);
        assert_eq!(request.strict_limit, None);
        assert_eq!(request.filters.state.as_deref(), Some("FAILED"));
    }

    #[test]
    fn test_minimal_request() {
        let request: ListRequest = serde_json::from_str(r#"{"resource": "backup_vaults"}"#).unwrap();

        assert_eq!(request.resource, ResourceKind::BackupVaults);
        assert_eq!(request.max_items, None);
        assert_eq!(request.next_token, None);
        assert_eq!(request.filters, ListFilters::default());
    }

    #[test]
    fn test_creation_window_absent_without_bounds() {
        assert_eq!(CreationWindow::from_bounds(None, None), None);

        let after = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let window = CreationWindow::from_bounds(Some(after), None).unwrap();
        assert_eq!(window.after, Some(after));
        assert_eq!(window.before, None);
    }

    #[test]
    fn test_inverted_creation_window_rejected() {
        let filters = ListFilters::builder()
            .created_after(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap())
            .created_before(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
            .build();

        let err = filters.creation_window().unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[test]
    fn test_recovery_points_require_vault() {
        let err = ListFilters::default().recovery_points().unwrap_err();
        assert!(err.to_string().contains("backup_vault_name"));

        let filter = ListFilters::builder()
            .backup_vault_name("primary".to_string())
            .build()
            .recovery_points()
            .unwrap();
        assert_eq!(filter.backup_vault_name, "primary");
        assert_eq!(filter.created, None);
    }

    #[test]
    fn test_fetch_options_use_config_defaults() {
        let config = ListerConfig {
            max_page_size: 100,
            default_max_items: Some(500),
            strict_limit: true,
        };
        let request = ListRequest::builder()
            .resource(ResourceKind::BackupPlans)
            .build();

        let options = request.fetch_options(&config);
        assert_eq!(options.max_items, Some(500));
        assert!(options.strict_limit);
        assert_eq!(options.service_max_page_size, 100);
        assert!(options.auto_advance);
    }

    #[test]
    fn test_fetch_options_request_overrides() {
        let config = ListerConfig::default();
        let request = ListRequest::builder()
            .resource(ResourceKind::BackupJobs)
            .max_items(10)
            .next_token("resume".to_string())
            .auto_advance(false)
            .strict_limit(true)
            .build();

        let options = request.fetch_options(&config);
        assert_eq!(options.max_items, Some(10));
        assert_eq!(options.start_token.as_deref(), Some("resume"));
        assert!(!options.auto_advance);
        assert!(options.strict_limit);
    }
}
