//! Parsing `in-addr.arpa` / `ip6.arpa` names back into binary addresses.
//!
//! Three encodings are accepted: dotted decimal octets for IPv4, dotted
//! single nibbles for IPv6, and the legacy escaped-bitstring literal
//! produced by the name codec for bitstring labels. Most of the IPv6
//! forms are obsolete, but there is no reason not to keep reading them.

use hearth_dns_domain::RecordFlags;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Longest reverse name we will look at (enough for any IPv6 form).
pub const MAX_ARPA_NAME: usize = 75;

/// A reverse name resolved to the address it encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverseName {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl ReverseName {
    pub fn ip(&self) -> IpAddr {
        match *self {
            ReverseName::V4(a) => IpAddr::V4(a),
            ReverseName::V6(a) => IpAddr::V6(a),
        }
    }

    /// The cache family flag for lookups under this address.
    pub fn family(&self) -> RecordFlags {
        match self {
            ReverseName::V4(_) => RecordFlags::IPV4,
            ReverseName::V6(_) => RecordFlags::IPV6,
        }
    }
}

fn eq_fold(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Converts a reverse-zone name into the address it stands for, or `None`
/// when the name is not a literal reverse name (such names are used as
/// CNAME targets for RFC 2317 delegation and must not match).
pub fn in_arpa_name_2_addr(name: &str) -> Option<ReverseName> {
    if name.len() > MAX_ARPA_NAME {
        return None;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 3 {
        return None;
    }
    let last = labels[labels.len() - 1];
    let penultimate = labels[labels.len() - 2];
    let chunks = &labels[..labels.len() - 2];

    if eq_fold(last, "arpa") && eq_fold(penultimate, "in-addr") {
        // Low-order octets may be missing from RFC 2317 partial
        // delegations; they stay zero. Anything non-numeric is a CNAME
        // target, not an address.
        let mut addr = [0u8; 4];
        for chunk in chunks {
            if !chunk.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            addr.copy_within(0..3, 1);
            addr[0] = chunk.parse::<u64>().unwrap_or(0) as u8;
        }
        return Some(ReverseName::V4(Ipv4Addr::from(addr)));
    }

    if eq_fold(penultimate, "ip6") && (eq_fold(last, "arpa") || eq_fold(last, "int")) {
        let mut addr = [0u8; 16];

        if let Some(hex) = chunks[0]
            .strip_prefix("\\[x")
            .or_else(|| chunks[0].strip_prefix("\\[X"))
        {
            // escaped bitstring literal: exactly 32 hex digits, then /bits
            let mut nibbles = 0usize;
            for b in hex.bytes() {
                let Some(digit) = (b as char).to_digit(16) else {
                    if b == b'/' && nibbles == 32 {
                        return Some(ReverseName::V6(Ipv6Addr::from(addr)));
                    }
                    return None;
                };
                if nibbles == 32 {
                    return None;
                }
                if nibbles % 2 == 0 {
                    addr[nibbles / 2] = (digit as u8) << 4;
                } else {
                    addr[nibbles / 2] |= digit as u8;
                }
                nibbles += 1;
            }
            return None;
        }

        // dotted nibbles, least significant first
        for chunk in chunks {
            if chunk.len() != 1 {
                return None;
            }
            let Some(digit) = chunk.chars().next().and_then(|c| c.to_digit(16)) else {
                return None;
            };
            for j in (1..16).rev() {
                addr[j] = (addr[j] >> 4) | (addr[j - 1] << 4);
            }
            addr[0] = (addr[0] >> 4) | ((digit as u8) << 4);
        }
        return Some(ReverseName::V6(Ipv6Addr::from(addr)));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_reverse_name() {
        assert_eq!(
            in_arpa_name_2_addr("4.3.2.1.in-addr.arpa"),
            Some(ReverseName::V4(Ipv4Addr::new(1, 2, 3, 4)))
        );
    }

    #[test]
    fn test_ipv4_case_folded_suffix() {
        assert_eq!(
            in_arpa_name_2_addr("4.3.2.1.IN-ADDR.ARPA"),
            Some(ReverseName::V4(Ipv4Addr::new(1, 2, 3, 4)))
        );
    }

    #[test]
    fn test_partial_delegation_defaults_low_octets_to_zero() {
        // RFC 2317 partial names: missing low-order octets stay zero.
        assert_eq!(
            in_arpa_name_2_addr("2.1.in-addr.arpa"),
            Some(ReverseName::V4(Ipv4Addr::new(1, 2, 0, 0)))
        );
    }

    #[test]
    fn test_more_than_four_labels_keeps_the_last_four() {
        assert_eq!(
            in_arpa_name_2_addr("5.4.3.2.1.in-addr.arpa"),
            Some(ReverseName::V4(Ipv4Addr::new(1, 2, 3, 4)))
        );
    }

    #[test]
    fn test_non_digit_label_is_a_cname_target_not_an_address() {
        assert_eq!(in_arpa_name_2_addr("50.0/24.67.28.64.in-addr.arpa"), None);
    }

    #[test]
    fn test_too_few_labels_rejected() {
        assert_eq!(in_arpa_name_2_addr("in-addr.arpa"), None);
        assert_eq!(in_arpa_name_2_addr("arpa"), None);
    }

    #[test]
    fn test_overlong_name_rejected() {
        let name = format!("{}.in-addr.arpa", "1.".repeat(40));
        assert!(name.len() > MAX_ARPA_NAME);
        assert_eq!(in_arpa_name_2_addr(&name), None);
    }

    #[test]
    fn test_ipv6_dotted_nibbles() {
        let name = "1.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.1.ip6.arpa";
        assert_eq!(
            in_arpa_name_2_addr(name),
            Some(ReverseName::V6("1000::1".parse().unwrap()))
        );
    }

    #[test]
    fn test_ipv6_nibbles_under_ip6_int() {
        let name = "8.b.d.0.1.0.0.2.ip6.int";
        let got = in_arpa_name_2_addr(name).unwrap();
        // eight nibbles fill the top of the address
        assert_eq!(got, ReverseName::V6("2001:db8::".parse().unwrap()));
    }

    #[test]
    fn test_ipv6_bitstring_literal() {
        let name = "\\[x20010db8000000000000000000000001/128].ip6.arpa";
        assert_eq!(
            in_arpa_name_2_addr(name),
            Some(ReverseName::V6("2001:db8::1".parse().unwrap()))
        );
    }

    #[test]
    fn test_ipv6_bitstring_wrong_digit_count_rejected() {
        assert_eq!(in_arpa_name_2_addr("\\[x2001/16].ip6.arpa"), None);
    }

    #[test]
    fn test_multi_nibble_label_rejected() {
        assert_eq!(in_arpa_name_2_addr("20.01.ip6.arpa"), None);
    }
}
