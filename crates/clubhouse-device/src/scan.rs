//! Network scan target expansion.

use std::net::Ipv4Addr;

use clubhouse_core::error::AppError;

use crate::types::DeviceEndpoint;

/// Largest number of endpoints a single scan may probe.
pub const MAX_SCAN_TARGETS: usize = 4096;

/// Expand `prefix.start..=prefix.end` across every port.
///
/// `prefix` is the first three octets, e.g. `192.168.1`.
pub fn expand_targets(
    prefix: &str,
    start: u8,
    end: u8,
    ports: &[u16],
) -> Result<Vec<DeviceEndpoint>, AppError> {
    let prefix = prefix.trim().trim_end_matches('.');
    let octets: Vec<&str> = prefix.split('.').collect();
    if octets.len() != 3 || octets.iter().any(|o| o.parse::<u8>().is_err()) {
        return Err(AppError::validation(format!(
            "Invalid scan prefix '{prefix}': expected three octets such as 192.168.1"
        )));
    }
    if start > end {
        return Err(AppError::validation("Scan start must not exceed end"));
    }
    if ports.is_empty() || ports.contains(&0) {
        return Err(AppError::validation("Scan ports must be between 1 and 65535"));
    }

    let count = (usize::from(end - start) + 1) * ports.len();
    if count > MAX_SCAN_TARGETS {
        return Err(AppError::validation(format!(
            "Scan of {count} endpoints exceeds the limit of {MAX_SCAN_TARGETS}"
        )));
    }

    let mut targets = Vec::with_capacity(count);
    for host in start..=end {
        let ip = format!("{prefix}.{host}");
        if ip.parse::<Ipv4Addr>().is_err() {
            return Err(AppError::validation(format!("Invalid scan address '{ip}'")));
        }
        for port in ports {
            targets.push(DeviceEndpoint::new(ip.clone(), *port));
        }
    }
    Ok(targets)
}

/// Parse a comma-separated port list such as `4370,4371`.
pub fn parse_ports(raw: &str) -> Result<Vec<u16>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| AppError::validation(format!("Invalid port '{p}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_targets() {
        let targets = expand_targets("10.0.0", 1, 3, &[4370, 4371]).unwrap();
        assert_eq!(targets.len(), 6);
        assert_eq!(targets[0], DeviceEndpoint::new("10.0.0.1", 4370));
        assert_eq!(targets[5], DeviceEndpoint::new("10.0.0.3", 4371));
    }

    #[test]
    fn test_rejects_bad_prefix() {
        assert!(expand_targets("10.0", 1, 2, &[4370]).is_err());
        assert!(expand_targets("10.0.300", 1, 2, &[4370]).is_err());
        assert!(expand_targets("10.0.0", 5, 2, &[4370]).is_err());
    }

    #[test]
    fn test_parse_ports() {
        assert_eq!(parse_ports("4370, 80").unwrap(), vec![4370, 80]);
        assert!(parse_ports("4370,abc").is_err());
        assert!(parse_ports("0").is_err());
    }
}
