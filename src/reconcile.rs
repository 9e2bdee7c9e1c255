//! One reconciliation pass: discover, read, diff, write.

use crate::changes::ChangeBuilder;
use crate::detector::{Discovery, InterfaceDetector};
use crate::error::{DdnsError, Result};
use crate::providers::{ChangeOperation, ChangeReceipt, RecordProvider, RECORD_TYPE};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The record being maintained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Provider zone identifier.
    pub zone_id: String,
    /// Fully-qualified hostname, dot-terminated.
    pub hostname: String,
}

/// Why a pass ended before contacting the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoAddressReason {
    /// The table was read but listed no global address for the interface.
    NoneOnInterface,
    /// The interface table does not exist.
    SourceMissing,
    /// The interface table could not be read.
    SourceUnreadable,
}

/// Result of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoAddresses(NoAddressReason),
    UpToDate,
    /// Changes computed but not submitted (dry run).
    Planned(Vec<ChangeOperation>),
    Applied {
        changes: Vec<ChangeOperation>,
        receipt: ChangeReceipt,
    },
}

/// Read the values currently published for the target's AAAA record.
///
/// The provider lists from a starting point rather than looking up a key,
/// so the first set is only accepted when both name and type match.
pub async fn current_values(provider: &dyn RecordProvider, target: &Target) -> Result<Vec<String>> {
    let records = provider
        .list_records(&target.zone_id, &target.hostname, RECORD_TYPE, 1)
        .await?;

    match records.into_iter().next() {
        Some(set) if set.name == target.hostname && set.record_type == RECORD_TYPE => {
            Ok(set.values)
        }
        Some(set) => {
            debug!(
                "No {} record for {}; listing starts at {} {}",
                RECORD_TYPE, target.hostname, set.name, set.record_type
            );
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

/// Submit a change batch in a single provider call.
pub async fn submit_changes(
    provider: &dyn RecordProvider,
    target: &Target,
    changes: &[ChangeOperation],
) -> Result<ChangeReceipt> {
    provider.change_records(&target.zone_id, changes).await
}

/// Runs one pass against injected detector and provider.
pub struct Reconciler<'a> {
    detector: &'a InterfaceDetector,
    provider: &'a dyn RecordProvider,
    target: Target,
    builder: ChangeBuilder,
    deadline: Duration,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        detector: &'a InterfaceDetector,
        provider: &'a dyn RecordProvider,
        target: Target,
        builder: ChangeBuilder,
        deadline: Duration,
    ) -> Self {
        Self {
            detector,
            provider,
            target,
            builder,
            deadline,
            dry_run: false,
        }
    }

    /// Compute changes without submitting them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<Outcome> {
        let interface = self.detector.interface();
        info!(
            "Starting {} sync for {} from {}",
            RECORD_TYPE, self.target.hostname, interface
        );

        let desired = match self.detector.discover() {
            Discovery::Found(addresses) if !addresses.is_empty() => addresses,
            Discovery::Found(_) => {
                warn!("No public IPv6 address found on {}", interface);
                return Ok(Outcome::NoAddresses(NoAddressReason::NoneOnInterface));
            }
            Discovery::SourceMissing => {
                warn!(
                    "No public IPv6 address found on {}: {} does not exist",
                    interface,
                    self.detector.path().display()
                );
                return Ok(Outcome::NoAddresses(NoAddressReason::SourceMissing));
            }
            Discovery::SourceUnreadable(e) => {
                warn!(
                    "No public IPv6 address found on {}: cannot read {}: {}",
                    interface,
                    self.detector.path().display(),
                    e
                );
                return Ok(Outcome::NoAddresses(NoAddressReason::SourceUnreadable));
            }
        };

        let listed: Vec<String> = desired.iter().map(ToString::to_string).collect();
        info!(
            "Attempting to sync {} with [{}] via {}",
            self.target.hostname,
            listed.join(", "),
            self.provider.name()
        );

        let existing = self
            .within_deadline("record lookup", current_values(self.provider, &self.target))
            .await?;
        debug!("Published values: {:?}", existing);

        let changes = self.builder.build(&desired, &existing);
        if changes.is_empty() {
            info!("{} record for {} is already up to date", RECORD_TYPE, self.target.hostname);
            return Ok(Outcome::UpToDate);
        }

        if self.dry_run {
            info!(
                "Dry run: {} change(s) for {} not submitted",
                changes.len(),
                self.target.hostname
            );
            return Ok(Outcome::Planned(changes));
        }

        let receipt = self
            .within_deadline(
                "record update",
                submit_changes(self.provider, &self.target, &changes),
            )
            .await?;
        info!(
            "{} record for {} updated successfully ({} change(s), id {}, status {})",
            RECORD_TYPE,
            self.target.hostname,
            changes.len(),
            receipt.id,
            receipt.status
        );

        Ok(Outcome::Applied { changes, receipt })
    }

    async fn within_deadline<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.deadline, call)
            .await
            .map_err(|_| DdnsError::Timeout {
                operation,
                secs: self.deadline.as_secs(),
            })?
    }
}
