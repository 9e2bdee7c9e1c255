//! Change batch construction from desired and published addresses.

use crate::config::UpsertMode;
use crate::detector::GlobalAddress;
use crate::providers::{ChangeAction, ChangeOperation, RecordSet};
use std::collections::HashSet;
use std::net::Ipv6Addr;

/// Computes the change batch for a single AAAA record.
#[derive(Debug, Clone)]
pub struct ChangeBuilder {
    name: String,
    ttl: u32,
    mode: UpsertMode,
}

impl ChangeBuilder {
    pub fn new(name: impl Into<String>, ttl: u32, mode: UpsertMode) -> Self {
        Self {
            name: name.into(),
            ttl,
            mode,
        }
    }

    /// Compare `desired` with the `existing` record values.
    ///
    /// - Nothing desired, or nothing new: no operations.
    /// - No existing values: one CREATE carrying every desired address.
    /// - Otherwise: UPSERTs shaped by the configured [`UpsertMode`].
    ///
    /// Existing values missing from `desired` are left alone; this never
    /// removes addresses. Order follows `desired`.
    pub fn build(&self, desired: &[GlobalAddress], existing: &[String]) -> Vec<ChangeOperation> {
        let desired = unique(desired.iter().map(ToString::to_string));
        if desired.is_empty() {
            return Vec::new();
        }

        if existing.is_empty() {
            return vec![self.operation(ChangeAction::Create, desired)];
        }

        let existing = unique(existing.iter().map(|value| canonical(value)));
        let new: Vec<String> = {
            let published: HashSet<&str> = existing.iter().map(String::as_str).collect();
            desired
                .into_iter()
                .filter(|addr| !published.contains(addr.as_str()))
                .collect()
        };

        if new.is_empty() {
            return Vec::new();
        }

        match self.mode {
            UpsertMode::PerAddress => new
                .into_iter()
                .map(|addr| self.operation(ChangeAction::Upsert, vec![addr]))
                .collect(),
            UpsertMode::Merged => {
                let mut values = existing;
                values.extend(new);
                vec![self.operation(ChangeAction::Upsert, values)]
            }
        }
    }

    fn operation(&self, action: ChangeAction, values: Vec<String>) -> ChangeOperation {
        ChangeOperation {
            action,
            record: RecordSet::aaaa(self.name.clone(), self.ttl, values),
        }
    }
}

/// Render a published value the way discovered addresses are rendered.
/// Values that are not IPv6 addresses are compared verbatim.
fn canonical(value: &str) -> String {
    value
        .trim()
        .parse::<Ipv6Addr>()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Drop repeats, keeping first occurrences in order.
fn unique(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(v.clone())).collect()
}
