//! # aaaa-sync
//!
//! Publishes a machine's global IPv6 addresses as a Route 53 AAAA record.
//!
//! Each run reads the kernel interface table, compares the global
//! addresses of one interface with the published record, and creates or
//! upserts the record only when something new appeared. It is meant to be
//! started by a scheduler such as cron or a systemd timer.
//!
//! ## Usage
//!
//! ```bash
//! # Sync home.example.com with the addresses on eth0
//! aaaa-sync --profile ddns --zone-id Z0123456789 --hostname home.example.com
//!
//! # Show what would change, mirroring log lines to the console
//! aaaa-sync -p ddns -z Z0123456789 -n home.example.com --dry-run --verbose
//! ```

pub mod changes;
pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod providers;
pub mod reconcile;

pub use config::Config;
pub use detector::InterfaceDetector;
pub use error::{DdnsError, Result};
pub use reconcile::{Outcome, Reconciler};
