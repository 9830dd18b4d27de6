//! Reverse-lookup query names (RFC 1035 §3.5, RFC 3596 §2.5).

use crate::BrokerError;
use std::fmt::Write;
use std::net::IpAddr;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// `a.b.c.d` becomes `d.c.b.a.in-addr.arpa`.
pub fn reverse_name_v4(octets: &[u8; 4]) -> String {
    format!(
        "{}.{}.{}.{}.in-addr.arpa",
        octets[3], octets[2], octets[1], octets[0]
    )
}

/// One hex digit per nibble, low nibble first, last byte first, under `ip6.arpa`.
pub fn reverse_name_v6(octets: &[u8; 16]) -> String {
    // 32 nibble labels of two bytes each plus the suffix
    let mut name = String::with_capacity(32 * 2 + 8);
    for byte in octets.iter().rev() {
        name.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
        name.push('.');
        name.push(HEX_DIGITS[(byte >> 4) as usize] as char);
        name.push('.');
    }
    name.push_str("ip6.arpa");
    name
}

pub fn reverse_name(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(ipv4) => reverse_name_v4(&ipv4.octets()),
        IpAddr::V6(ipv6) => reverse_name_v6(&ipv6.octets()),
    }
}

/// Builds the query name for a raw address in network byte order.
///
/// Only 4 (IPv4) and 16 (IPv6) byte addresses are accepted.
pub fn reverse_name_from_bytes(addr: &[u8]) -> Result<String, BrokerError> {
    if let Ok(v4) = <&[u8; 4]>::try_from(addr) {
        return Ok(reverse_name_v4(v4));
    }
    if let Ok(v6) = <&[u8; 16]>::try_from(addr) {
        return Ok(reverse_name_v6(v6));
    }
    Err(BrokerError::InvalidAddressLength(addr.len()))
}

/// Inverse of [`reverse_name`]. Accepts a trailing root dot and any case.
pub fn address_from_reverse_name(name: &str) -> Option<IpAddr> {
    let name = name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase();

    if let Some(labels) = name.strip_suffix(".in-addr.arpa") {
        let mut octets = [0u8; 4];
        let parts: Vec<&str> = labels.split('.').collect();
        if parts.len() != 4 {
            return None;
        }
        for (i, part) in parts.iter().rev().enumerate() {
            octets[i] = part.parse().ok()?;
        }
        return Some(IpAddr::from(octets));
    }

    if let Some(labels) = name.strip_suffix(".ip6.arpa") {
        let nibbles: Vec<&str> = labels.split('.').collect();
        if nibbles.len() != 32 {
            return None;
        }
        let mut octets = [0u8; 16];
        for (i, pair) in nibbles.chunks(2).enumerate() {
            if pair[0].len() != 1 || pair[1].len() != 1 {
                return None;
            }
            let low = u8::from_str_radix(pair[0], 16).ok()?;
            let high = u8::from_str_radix(pair[1], 16).ok()?;
            octets[15 - i] = (high << 4) | low;
        }
        return Some(IpAddr::from(octets));
    }

    None
}

/// Renders an address the way it appears in log lines next to its query name.
pub fn describe_address(addr: &[u8]) -> String {
    if let Ok(v4) = <[u8; 4]>::try_from(addr) {
        return IpAddr::from(v4).to_string();
    }
    if let Ok(v6) = <[u8; 16]>::try_from(addr) {
        return IpAddr::from(v6).to_string();
    }

    let mut out = String::with_capacity(addr.len() * 3);
    for (i, b) in addr.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        let _ = write!(out, "{:02x}", b);
    }
    out
}
