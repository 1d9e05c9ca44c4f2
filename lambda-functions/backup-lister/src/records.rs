use aws_sdk_backup::primitives::DateTime as AwsDateTime;
use aws_sdk_backup::types::{
    BackupJob, BackupPlansListMember, BackupVaultListMember, ProtectedResource,
    RecoveryPointByBackupVault,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Flat, serializable projections of the SDK list results.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupVaultRecord {
    pub backup_vault_name: Option<String>,
    pub backup_vault_arn: Option<String>,
    pub encryption_key_arn: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupJobRecord {
    pub backup_job_id: Option<String>,
    pub backup_vault_name: Option<String>,
    pub resource_arn: Option<String>,
    pub resource_type: Option<String>,
    pub state: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecoveryPointRecord {
    pub recovery_point_arn: Option<String>,
    pub backup_vault_name: Option<String>,
    pub resource_arn: Option<String>,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupPlanRecord {
    pub backup_plan_id: Option<String>,
    pub backup_plan_name: Option<String>,
    pub backup_plan_arn: Option<String>,
    pub version_id: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub deletion_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProtectedResourceRecord {
    pub resource_arn: Option<String>,
    pub resource_type: Option<String>,
    pub last_backup_time: Option<DateTime<Utc>>,
}

pub fn to_utc(timestamp: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

pub fn to_aws(timestamp: &DateTime<Utc>) -> AwsDateTime {
    AwsDateTime::from_secs_and_nanos(timestamp.timestamp(), timestamp.timestamp_subsec_nanos())
}

impl From<BackupVaultListMember> for BackupVaultRecord {
    fn from(vault: BackupVaultListMember) -> Self {
        Self {
            creation_date: vault.creation_date.as_ref().and_then(to_utc),
            backup_vault_name: vault.backup_vault_name,
            backup_vault_arn: vault.backup_vault_arn,
            encryption_key_arn: vault.encryption_key_arn,
        }
    }
}

impl From<BackupJob> for BackupJobRecord {
    fn from(job: BackupJob) -> Self {
        Self {
            state: job.state.as_ref().map(|state| state.as_str().to_string()),
            creation_date: job.creation_date.as_ref().and_then(to_utc),
            completion_date: job.completion_date.as_ref().and_then(to_utc),
            backup_job_id: job.backup_job_id,
            backup_vault_name: job.backup_vault_name,
            resource_arn: job.resource_arn,
            resource_type: job.resource_type,
        }
    }
}

impl From<RecoveryPointByBackupVault> for RecoveryPointRecord {
    fn from(point: RecoveryPointByBackupVault) -> Self {
        Self {
            status: point.status.as_ref().map(|status| status.as_str().to_string()),
            creation_date: point.creation_date.as_ref().and_then(to_utc),
            recovery_point_arn: point.recovery_point_arn,
            backup_vault_name: point.backup_vault_name,
            resource_arn: point.resource_arn,
            resource_type: point.resource_type,
        }
    }
}

impl From<BackupPlansListMember> for BackupPlanRecord {
    fn from(plan: BackupPlansListMember) -> Self {
        Self {
            creation_date: plan.creation_date.as_ref().and_then(to_utc),
            deletion_date: plan.deletion_date.as_ref().and_then(to_utc),
            backup_plan_id: plan.backup_plan_id,
            backup_plan_name: plan.backup_plan_name,
            backup_plan_arn: plan.backup_plan_arn,
            version_id: plan.version_id,
        }
    }
}

impl From<ProtectedResource> for ProtectedResourceRecord {
    fn from(resource: ProtectedResource) -> Self {
        Self {
            last_backup_time: resource.last_backup_time.as_ref().and_then(to_utc),
            resource_arn: resource.resource_arn,
            resource_type: resource.resource_type,
        }
    }
}
