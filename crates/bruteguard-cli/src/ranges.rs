//! Client-side expansion of the CLI's compact IP notation into individual
//! addresses the admin surface accepts.

use std::net::Ipv4Addr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid ip range: {0}")]
    InvalidRange(String),

    #[error("invalid ip in range: {0}")]
    InvalidEndpoint(String),

    #[error("invalid cidr: {0}")]
    InvalidCidr(String),

    #[error("invalid ip: {0}")]
    InvalidIp(String),
}

fn next_ip(addr: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr).wrapping_add(1))
}

/// Expand one comma-separated token list into individual `ip` or `cidr`
/// strings, inclusively expanding any `a.b.c.d-a.b.c.e` range into its
/// constituent `/32` addresses.
pub fn expand(input: &str) -> Result<Vec<String>, RangeError> {
    let mut results = Vec::new();

    for raw in input.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        if let Some((start_str, end_str)) = raw.split_once('-') {
            let start: Ipv4Addr = start_str
                .trim()
                .parse()
                .map_err(|_| RangeError::InvalidEndpoint(raw.to_string()))?;
            let end: Ipv4Addr = end_str
                .trim()
                .parse()
                .map_err(|_| RangeError::InvalidEndpoint(raw.to_string()))?;

            if u32::from(start) > u32::from(end) {
                return Err(RangeError::InvalidRange(raw.to_string()));
            }

            let mut cursor = start;
            loop {
                results.push(cursor.to_string());
                if cursor == end {
                    break;
                }
                cursor = next_ip(cursor);
            }
            continue;
        }

        if raw.contains('/') {
            let (addr, prefix) = raw
                .split_once('/')
                .ok_or_else(|| RangeError::InvalidCidr(raw.to_string()))?;
            addr.parse::<Ipv4Addr>()
                .map_err(|_| RangeError::InvalidCidr(raw.to_string()))?;
            let prefix: u8 = prefix
                .parse()
                .map_err(|_| RangeError::InvalidCidr(raw.to_string()))?;
            if prefix > 32 {
                return Err(RangeError::InvalidCidr(raw.to_string()));
            }
            results.push(raw.to_string());
            continue;
        }

        raw.parse::<Ipv4Addr>()
            .map_err(|_| RangeError::InvalidIp(raw.to_string()))?;
        results.push(raw.to_string());
    }

    Ok(results)
}
