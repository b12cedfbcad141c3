//! Socket endpoint parsing.

use crate::error::AddressError;

/// Parse an `address:port` endpoint as printed by lsof.
///
/// Handles multiple address formats:
/// - IPv4: "127.0.0.1:3000" or "*:8080"
/// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080" (host returned without brackets)
///
/// An empty host (":8080") is read as the wildcard `*`.
pub fn parse_address(address: &str) -> Result<(String, u16), AddressError> {
    let (host, port_str) = if let Some(rest) = address.strip_prefix('[') {
        let bracket_end = rest
            .find(']')
            .ok_or_else(|| AddressError::UnclosedBracket(address.to_string()))?;
        let port_str = rest[bracket_end + 1..]
            .strip_prefix(':')
            .ok_or_else(|| AddressError::MissingSeparator(address.to_string()))?;
        (&rest[..bracket_end], port_str)
    } else {
        let last_colon = address
            .rfind(':')
            .ok_or_else(|| AddressError::MissingSeparator(address.to_string()))?;
        let host = &address[..last_colon];
        let host = if host.is_empty() { "*" } else { host };
        (host, &address[last_colon + 1..])
    };

    Ok((host.to_string(), parse_port(address, port_str)?))
}

/// Digits only; `u16::from_str` alone would also accept a leading `+`.
fn parse_port(address: &str, port_str: &str) -> Result<u16, AddressError> {
    let invalid = || AddressError::InvalidPort {
        address: address.to_string(),
        port: port_str.to_string(),
    };
    if port_str.is_empty() || !port_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    port_str.parse().map_err(|_| invalid())
}
