//! Route 53 record provider.

use super::{ChangeAction, ChangeOperation, ChangeReceipt, RecordProvider, RecordSet};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use aws_sdk_route53::config::retry::RetryConfig;
use aws_sdk_route53::config::{BehaviorVersion, Region};
use aws_sdk_route53::error::{BuildError, DisplayErrorContext};
use aws_sdk_route53::types::{
    Change, ChangeAction as SdkChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet,
    RrType,
};
use chrono::{DateTime, Utc};

const PROVIDER: &str = "route53";

/// Route 53 is a global service; this region is used when the profile has none.
const DEFAULT_REGION: &str = "us-east-1";

/// Route 53 provider backed by the AWS SDK.
pub struct Route53Provider {
    client: aws_sdk_route53::Client,
}

impl Route53Provider {
    /// Build a client from the named AWS CLI profile.
    ///
    /// SDK-level retries are switched off; a failed call is reported as-is.
    pub async fn from_profile(profile: &str) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(profile)
            .load()
            .await;

        let mut builder =
            aws_sdk_route53::config::Builder::from(&shared).retry_config(RetryConfig::disabled());
        if shared.region().is_none() {
            builder = builder.region(Region::new(DEFAULT_REGION));
        }

        Self::from_conf(builder.build())
    }

    /// Create from an explicit SDK configuration (for testing).
    pub fn from_conf(conf: aws_sdk_route53::Config) -> Self {
        Self {
            client: aws_sdk_route53::Client::from_conf(conf),
        }
    }
}

fn query_error(message: impl Into<String>) -> DdnsError {
    DdnsError::ProviderQuery {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}

fn write_error(message: impl Into<String>) -> DdnsError {
    DdnsError::ProviderWrite {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}

fn to_sdk_change(op: &ChangeOperation) -> std::result::Result<Change, BuildError> {
    let records = op
        .record
        .values
        .iter()
        .map(|value| ResourceRecord::builder().value(value).build())
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let record_set = ResourceRecordSet::builder()
        .name(&op.record.name)
        .r#type(RrType::from(op.record.record_type.as_str()))
        .set_ttl(op.record.ttl.map(i64::from))
        .set_resource_records(Some(records))
        .build()?;

    let action = match op.action {
        ChangeAction::Create => SdkChangeAction::Create,
        ChangeAction::Upsert => SdkChangeAction::Upsert,
    };

    Change::builder()
        .action(action)
        .resource_record_set(record_set)
        .build()
}

fn from_sdk_record_set(set: &ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: set.name().to_string(),
        record_type: set.r#type().as_str().to_string(),
        ttl: set.ttl().and_then(|ttl| u32::try_from(ttl).ok()),
        values: set
            .resource_records()
            .iter()
            .map(|record| record.value().to_string())
            .collect(),
    }
}

#[async_trait]
impl RecordProvider for Route53Provider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn list_records(
        &self,
        zone_id: &str,
        start_name: &str,
        start_type: &str,
        max_items: i32,
    ) -> Result<Vec<RecordSet>> {
        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .start_record_name(start_name)
            .start_record_type(RrType::from(start_type))
            .max_items(max_items)
            .send()
            .await
            .map_err(|e| query_error(DisplayErrorContext(&e).to_string()))?;

        Ok(output
            .resource_record_sets()
            .iter()
            .map(from_sdk_record_set)
            .collect())
    }

    async fn change_records(
        &self,
        zone_id: &str,
        changes: &[ChangeOperation],
    ) -> Result<ChangeReceipt> {
        let sdk_changes = changes
            .iter()
            .map(to_sdk_change)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| write_error(e.to_string()))?;

        let batch = ChangeBatch::builder()
            .set_changes(Some(sdk_changes))
            .comment("aaaa-sync")
            .build()
            .map_err(|e| write_error(e.to_string()))?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| write_error(DisplayErrorContext(&e).to_string()))?;

        let info = output
            .change_info()
            .ok_or_else(|| write_error("response carried no change info"))?;

        Ok(ChangeReceipt {
            id: info.id().to_string(),
            status: info.status().as_str().to_string(),
            submitted_at: DateTime::<Utc>::from_timestamp(
                info.submitted_at().secs(),
                info.submitted_at().subsec_nanos(),
            ),
        })
    }
}
