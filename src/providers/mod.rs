//! DNS provider capability and the record types exchanged with it.

mod route53;


pub use route53::Route53Provider;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record type managed by this tool.
pub const RECORD_TYPE: &str = "AAAA";

/// A provider's view of one name/type pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully-qualified record name.
    pub name: String,
    /// Record type, e.g. "AAAA".
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time-to-live in seconds.
    pub ttl: Option<u32>,
    /// Record values in provider order.
    pub values: Vec<String>,
}

impl RecordSet {
    /// Build an AAAA record set.
    pub fn aaaa(name: impl Into<String>, ttl: u32, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RECORD_TYPE.to_string(),
            ttl: Some(ttl),
            values,
        }
    }
}

/// Mutation kind. Deletion is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    Create,
    Upsert,
}

/// One entry of a change batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOperation {
    pub action: ChangeAction,
    pub record: RecordSet,
}

/// Acknowledgement returned for a submitted change batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReceipt {
    /// Provider change id.
    pub id: String,
    /// Provider status, e.g. "PENDING".
    pub status: String,
    /// When the provider accepted the batch.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// The two provider calls reconciliation needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// List up to `max_items` record sets starting at `start_name`/`start_type`
    /// in the zone's sort order.
    ///
    /// The first returned set is not necessarily the requested one: when the
    /// name is absent the provider returns whatever sorts after it.
    async fn list_records(
        &self,
        zone_id: &str,
        start_name: &str,
        start_type: &str,
        max_items: i32,
    ) -> Result<Vec<RecordSet>>;

    /// Apply `changes` as one atomic batch.
    async fn change_records(
        &self,
        zone_id: &str,
        changes: &[ChangeOperation],
    ) -> Result<ChangeReceipt>;
}

/// Create the Route 53 provider using credentials from the named profile.
pub async fn create_provider(profile: &str) -> Box<dyn RecordProvider> {
    Box::new(Route53Provider::from_profile(profile).await)
}
