//! Global IPv6 address discovery from the kernel interface table.

use std::fmt;
use std::io;
use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};

/// One row of the interface address table.
///
/// Rows look like
/// `20010db8000000000000000000000001 02 40 00 80 eth0`:
/// address, interface index, prefix length, scope, flags, interface name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Address exactly as it appears in the table.
    pub raw: String,
    /// Kernel scope field (0x00 global, 0x10 host, 0x20 link).
    pub scope: Option<u8>,
    /// Interface name.
    pub interface: String,
}

impl InterfaceAddress {
    /// Parse a table row. Rows with fewer than six fields yield `None`.
    pub fn from_row(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return None;
        }

        Some(Self {
            raw: fields[0].to_string(),
            scope: u8::from_str_radix(fields[3], 16).ok(),
            interface: fields[5].to_string(),
        })
    }
}

/// An IPv6 address that parsed cleanly and is globally routable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalAddress(Ipv6Addr);

impl GlobalAddress {
    /// Wrap an address, refusing anything [`is_global`] rejects.
    pub fn new(addr: Ipv6Addr) -> Option<Self> {
        is_global(&addr).then_some(Self(addr))
    }

    pub fn addr(&self) -> Ipv6Addr {
        self.0
    }
}

impl fmt::Display for GlobalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outcome of reading the interface table.
#[derive(Debug)]
pub enum Discovery {
    /// The table was read. The list may be empty.
    Found(Vec<GlobalAddress>),
    /// The table does not exist on this system.
    SourceMissing,
    /// The table exists but could not be read.
    SourceUnreadable(io::Error),
}

impl Discovery {
    /// Discovered addresses, empty for the source-problem variants.
    pub fn addresses(&self) -> &[GlobalAddress] {
        match self {
            Discovery::Found(addresses) => addresses,
            _ => &[],
        }
    }
}

/// Reads global addresses for one interface from the kernel table.
pub struct InterfaceDetector {
    path: PathBuf,
    interface: String,
}

impl InterfaceDetector {
    /// Create a detector for `interface` reading the table at `path`.
    pub fn new(path: impl Into<PathBuf>, interface: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            interface: interface.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the table and collect this interface's global addresses.
    pub fn discover(&self) -> Discovery {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Discovery::Found(parse_table(&content, &self.interface)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Discovery::SourceMissing,
            Err(e) => Discovery::SourceUnreadable(e),
        }
    }
}

/// Collect the global addresses listed for `interface`, in table order.
///
/// Malformed and non-global entries are dropped. Duplicates are kept.
pub fn parse_table(content: &str, interface: &str) -> Vec<GlobalAddress> {
    content
        .lines()
        .filter_map(InterfaceAddress::from_row)
        .filter(|row| row.interface == interface)
        .filter_map(|row| {
            let parsed = parse_address(&row.raw).and_then(GlobalAddress::new);
            if parsed.is_none() {
                tracing::debug!(
                    "Skipping {} on {} (scope {:?})",
                    row.raw,
                    row.interface,
                    row.scope
                );
            }
            parsed
        })
        .collect()
}

/// Parse an address given either in colon form or as the kernel's
/// undelimited 32-digit hex string.
pub fn parse_address(raw: &str) -> Option<Ipv6Addr> {
    if raw.contains(':') {
        return raw.parse().ok();
    }
    if !raw.is_ascii() {
        return None;
    }

    let grouped = raw
        .as_bytes()
        .chunks(4)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect::<Vec<_>>()
        .join(":");
    grouped.parse().ok()
}

/// Whether an address is publicly routable.
///
/// Rejects unspecified, loopback, multicast, link-local, site-local,
/// unique-local, IPv4-mapped and IPv4-compatible addresses, plus the
/// IANA special-purpose blocks that are not forwardable on the Internet:
/// the discard prefix `100::/64`, the `2001::/23` protocol block (Teredo,
/// ORCHID, benchmarking) apart from its registered global exceptions,
/// 6to4 `2002::/16`, local-use NAT64 `64:ff9b:1::/48` and the
/// documentation block `3fff::/20`. The older documentation block
/// `2001:db8::/32` is accepted since it is what lab and test networks
/// hand out.
pub fn is_global(addr: &Ipv6Addr) -> bool {
    let segments = addr.segments();

    let link_local = segments[0] & 0xffc0 == 0xfe80;
    let site_local = segments[0] & 0xffc0 == 0xfec0;
    let unique_local = segments[0] & 0xfe00 == 0xfc00;
    // Also covers :: and ::1.
    let ipv4_compatible = segments[..6] == [0; 6];
    let ipv4_mapped = segments[..5] == [0; 5] && segments[5] == 0xffff;
    let discard = segments[..4] == [0x0100, 0, 0, 0];
    let protocol_block =
        segments[0] == 0x2001 && segments[1] < 0x0200 && !protocol_exception(&segments);
    let six_to_four = segments[0] == 0x2002;
    let local_nat64 = segments[..3] == [0x0064, 0xff9b, 0x0001];
    let documentation = segments[0] == 0x3fff && segments[1] & 0xf000 == 0;

    !(addr.is_multicast()
        || link_local
        || site_local
        || unique_local
        || ipv4_compatible
        || ipv4_mapped
        || discard
        || protocol_block
        || six_to_four
        || local_nat64
        || documentation)
}

/// Globally reachable assignments inside `2001::/23`: the PCP and TURN
/// anycast addresses, AMT `2001:3::/32`, AS112 `2001:4:112::/48` and
/// ORCHIDv2 `2001:20::/28`, `2001:30::/28`.
fn protocol_exception(segments: &[u16; 8]) -> bool {
    let anycast =
        segments[1] == 0x0001 && segments[2..7] == [0; 5] && matches!(segments[7], 1 | 2);
    let amt = segments[1] == 0x0003;
    let as112 = segments[1] == 0x0004 && segments[2] == 0x0112;
    let orchid_v2 = matches!(segments[1] & 0xfff0, 0x0020 | 0x0030);

    anycast || amt || as112 || orchid_v2
}
