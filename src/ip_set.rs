//! Immutable set of canonical IP address strings.

use ahash::AHashSet;
use std::net::IpAddr;

/// A set of known Tor IP addresses.
///
/// Members are stored in canonical text form: IPv4-mapped IPv6 addresses are
/// reduced to their IPv4 address first, so `"::ffff:1.2.3.4"` and `"1.2.3.4"`
/// are the same entry, as are `"2001:db8::1"` and `"2001:0db8:0:0:0:0:0:1"`. A set is built once and never edited afterwards; refreshes
/// swap in a whole new set.
///
/// # Examples
/// ```
/// use torlist::IpSet;
///
/// let set = IpSet::parse("1.2.3.4 garbage\n2001:db8::1");
/// assert_eq!(set.len(), 2);
/// assert!(set.contains("1.2.3.4"));
/// assert!(set.contains("::ffff:1.2.3.4"));
/// assert!(!set.contains("garbage"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpSet {
    ips: AHashSet<String>,
}

impl IpSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse whitespace-separated IP tokens.
    ///
    /// Tokens that are not IP addresses are skipped.
    pub fn parse(text: &str) -> Self {
        text.split_whitespace()
            .filter_map(|token| token.parse::<IpAddr>().ok())
            .collect()
    }

    /// Parse raw bytes as text, replacing invalid UTF-8.
    pub fn parse_bytes(data: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(data))
    }

    /// Build a set from string tokens, dropping the unparsable ones.
    pub fn from_strs<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens
            .into_iter()
            .filter_map(|token| token.trim().parse::<IpAddr>().ok())
            .collect()
    }

    /// Check if an address (in any valid textual form) is in the set.
    ///
    /// Returns `false` for input that does not parse as an IP address.
    pub fn contains(&self, ip: &str) -> bool {
        match ip.trim().parse::<IpAddr>() {
            Ok(addr) => self.contains_ip(addr),
            Err(_) => false,
        }
    }

    /// Check if a parsed address is in the set.
    pub fn contains_ip(&self, ip: IpAddr) -> bool {
        self.ips.contains(&canonical(ip))
    }

    /// Get the number of addresses.
    pub fn len(&self) -> usize {
        self.ips.len()
    }

    /// Check if the set holds no addresses.
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty()
    }

    /// Iterate over the canonical address strings (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ips.iter().map(String::as_str)
    }

    /// Merge another set into this one.
    pub fn extend(&mut self, other: IpSet) {
        self.ips.extend(other.ips);
    }

    /// Return the union of two sets.
    pub fn union(&self, other: &IpSet) -> IpSet {
        IpSet {
            ips: self.ips.union(&other.ips).cloned().collect(),
        }
    }

    /// Serialize as one address per line.
    ///
    /// Lines are sorted so that identical sets produce identical files.
    pub fn to_lines(&self) -> String {
        let mut sorted: Vec<&str> = self.iter().collect();
        sorted.sort_unstable();

        let mut out = String::with_capacity(sorted.iter().map(|ip| ip.len() + 1).sum());
        for ip in sorted {
            out.push_str(ip);
            out.push('\n');
        }
        out
    }
}

impl FromIterator<IpAddr> for IpSet {
    fn from_iter<T: IntoIterator<Item = IpAddr>>(iter: T) -> Self {
        Self {
            ips: iter.into_iter().map(canonical).collect(),
        }
    }
}

/// Text form used for set members.
fn canonical(ip: IpAddr) -> String {
    ip.to_canonical().to_string()
}
