//! IPv4 CIDR arithmetic: network/broadcast ranges, overlap and containment.
//!
//! Pure and stateless — every function here takes its inputs by value and
//! has no side effects. IPv6 is rejected with [`CidrError::UnsupportedFamily`]
//! rather than silently truncated or panicking.

use std::net::Ipv4Addr;

use ipnetwork::{IpNetwork, Ipv4Network};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CidrError {
    #[error("only IPv4 is supported")]
    UnsupportedFamily,

    #[error("malformed address or CIDR: {0}")]
    Malformed(String),
}

/// Full-containment relation between two networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Neither,
    AContainsB,
    BContainsA,
    Equal,
}

fn range_of(net: Ipv4Network) -> (u32, u32) {
    (net.network().into(), net.broadcast().into())
}

/// True iff the integer ranges of `a` and `b` intersect.
pub fn overlaps(a: Ipv4Network, b: Ipv4Network) -> bool {
    let (a_lo, a_hi) = range_of(a);
    let (b_lo, b_hi) = range_of(b);
    a_lo <= b_hi && b_lo <= a_hi
}

/// Full-containment relation between `a` and `b`. Only meaningful when
/// `overlaps(a, b)` is true; returns [`Containment::Neither`] otherwise.
pub fn contains(a: Ipv4Network, b: Ipv4Network) -> Containment {
    let (a_lo, a_hi) = range_of(a);
    let (b_lo, b_hi) = range_of(b);

    let a_contains_b = a_lo <= b_lo && a_hi >= b_hi;
    let b_contains_a = b_lo <= a_lo && b_hi >= a_hi;

    match (a_contains_b, b_contains_a) {
        (true, true) => Containment::Equal,
        (true, false) => Containment::AContainsB,
        (false, true) => Containment::BContainsA,
        (false, false) => Containment::Neither,
    }
}

/// Parse `text` as either bare-IPv4 (promoted to `/32`) or `a.b.c.d/p` CIDR
/// notation. Rejects IPv6 with [`CidrError::UnsupportedFamily`].
pub fn parse_ipv4_cidr(text: &str) -> Result<Ipv4Network, CidrError> {
    let text = text.trim();
    if let Some((addr_part, prefix_part)) = text.split_once('/') {
        let addr: Ipv4Addr = addr_part
            .parse()
            .map_err(|_| classify_malformed(addr_part))?;
        let prefix: u8 = prefix_part
            .parse()
            .map_err(|_| CidrError::Malformed(text.to_string()))?;
        Ipv4Network::new(addr, prefix).map_err(|_| CidrError::Malformed(text.to_string()))
    } else {
        let addr: Ipv4Addr = text.parse().map_err(|_| classify_malformed(text))?;
        Ipv4Network::new(addr, 32).map_err(|_| CidrError::Malformed(text.to_string()))
    }
}

/// Parse `text` as a bare IPv4 address. Used by `/api/authorize`, which
/// never accepts CIDR notation for the source IP.
pub fn parse_bare_ipv4(text: &str) -> Result<Ipv4Addr, CidrError> {
    text.trim().parse().map_err(|_| classify_malformed(text))
}

fn classify_malformed(text: &str) -> CidrError {
    if text.parse::<std::net::Ipv6Addr>().is_ok() || text.parse::<IpNetwork>().is_ok_and(|n| n.is_ipv6()) {
        CidrError::UnsupportedFamily
    } else {
        CidrError::Malformed(text.to_string())
    }
}

/// Canonical text form stored as the list-store key: `a.b.c.d/p`.
pub fn canonical_text(net: Ipv4Network) -> String {
    format!("{}/{}", net.ip(), net.prefix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn net(s: &str) -> Ipv4Network {
        s.parse().unwrap()
    }

    #[test_case("10.0.0.64/26", "10.0.0.128/26", false; "adjacent disjoint quarters")]
    #[test_case("192.168.1.64/26", "192.168.1.128/26", false; "adjacent disjoint quarters 2")]
    #[test_case("192.168.1.0/25", "192.168.1.0/24", true; "b is supernet of a")]
    #[test_case("192.168.1.0/24", "192.168.1.128/25", true; "a contains b")]
    #[test_case("192.168.1.128/25", "192.168.1.0/24", true; "b contains a")]
    #[test_case("192.168.1.0/24", "192.168.2.0/24", false; "different networks")]
    #[test_case("10.0.0.0/8", "10.5.0.0/16", true; "a contains b wide")]
    #[test_case("172.16.0.0/16", "172.16.128.0/17", true; "a contains b half")]
    #[test_case("192.168.1.0/25", "192.168.1.128/25", false; "disjoint halves of the same /24")]
    fn overlaps_matches_expected(a: &str, b: &str, expected: bool) {
        assert_eq!(overlaps(net(a), net(b)), expected);
    }

    #[test]
    fn contains_reports_equal_for_identical_networks() {
        let a = net("10.0.0.0/24");
        assert_eq!(contains(a, a), Containment::Equal);
    }

    #[test]
    fn contains_reports_a_contains_b() {
        assert_eq!(
            contains(net("10.0.0.0/8"), net("10.5.0.0/16")),
            Containment::AContainsB
        );
    }

    #[test]
    fn contains_reports_b_contains_a() {
        assert_eq!(
            contains(net("10.5.0.0/16"), net("10.0.0.0/8")),
            Containment::BContainsA
        );
    }

    #[test]
    fn contains_reports_neither_for_disjoint_networks() {
        // Aligned CIDR blocks are always disjoint, equal, or nested, never a
        // partial overlap, so `Neither` only arises when they don't overlap
        // at all.
        assert_eq!(
            contains(net("192.168.1.0/25"), net("192.168.1.128/25")),
            Containment::Neither
        );
    }

    #[test]
    fn ipv6_cidr_is_rejected_not_panicked() {
        let err = parse_ipv4_cidr("2001:db8::/64").unwrap_err();
        assert_eq!(err, CidrError::UnsupportedFamily);
    }

    #[test]
    fn bare_ip_is_promoted_to_slash_32() {
        let parsed = parse_ipv4_cidr("198.51.100.7").unwrap();
        assert_eq!(parsed.prefix(), 32);
        assert_eq!(canonical_text(parsed), "198.51.100.7/32");
    }

    #[test]
    fn garbage_input_is_malformed_not_unsupported() {
        let err = parse_ipv4_cidr("not-an-ip").unwrap_err();
        assert_eq!(err, CidrError::Malformed("not-an-ip".to_string()));
    }

    #[test]
    fn authorize_rejects_cidr_notation() {
        let err = parse_bare_ipv4("10.0.0.0/8").unwrap_err();
        assert!(matches!(err, CidrError::Malformed(_)));
    }
}
