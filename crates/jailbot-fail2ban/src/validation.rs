use std::net::IpAddr;

use thiserror::Error;

pub const MAX_JAIL_NAME_CHARS: usize = 64;

/// Parses `raw` as an IPv4 or IPv6 literal. Anything the standard parser
/// rejects is invalid, regardless of length or shape.
pub fn validate_ip_address(raw: &str) -> Option<IpAddr> {
    raw.parse::<IpAddr>().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JailNameError {
    #[error("jail name cannot be empty")]
    Empty,
    #[error("jail name exceeds 64 characters")]
    TooLong,
    #[error("jail name cannot start with '-'")]
    LeadingDash,
    #[error("jail name contains unsupported character '{0}'")]
    UnsupportedCharacter(char),
}

/// Accepts jail names made of ASCII alphanumerics, `_`, `-` and `.`.
pub fn validate_jail_name(raw: &str) -> Result<&str, JailNameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(JailNameError::Empty);
    }
    if name.chars().count() > MAX_JAIL_NAME_CHARS {
        return Err(JailNameError::TooLong);
    }
    if name.starts_with('-') {
        return Err(JailNameError::LeadingDash);
    }
    if let Some(invalid) = name
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')))
    {
        return Err(JailNameError::UnsupportedCharacter(invalid));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::{validate_ip_address, validate_jail_name, JailNameError};
    use proptest::prelude::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn unit_accepts_ipv4_and_ipv6_literals() {
        assert!(validate_ip_address("10.0.0.5").is_some());
        assert!(validate_ip_address("::1").is_some());
        assert!(validate_ip_address("2001:db8::42").is_some());
    }

    #[test]
    fn unit_rejects_out_of_range_and_non_ip_text() {
        assert!(validate_ip_address("999.1.1.1").is_none());
        assert!(validate_ip_address("not-an-ip").is_none());
        assert!(validate_ip_address("").is_none());
        assert!(validate_ip_address("10.0.0.5; reboot").is_none());
    }

    #[test]
    fn unit_jail_name_accepts_common_names() {
        assert_eq!(validate_jail_name("sshd"), Ok("sshd"));
        assert_eq!(validate_jail_name(" manual_ban "), Ok("manual_ban"));
        assert_eq!(validate_jail_name("nginx-http.auth"), Ok("nginx-http.auth"));
    }

    #[test]
    fn regression_jail_name_rejects_flags_and_shell_metacharacters() {
        assert_eq!(validate_jail_name("--all"), Err(JailNameError::LeadingDash));
        assert_eq!(
            validate_jail_name("sshd;reboot"),
            Err(JailNameError::UnsupportedCharacter(';'))
        );
        assert_eq!(validate_jail_name("   "), Err(JailNameError::Empty));
        assert_eq!(
            validate_jail_name(&"a".repeat(65)),
            Err(JailNameError::TooLong)
        );
    }

    proptest! {
        #[test]
        fn property_every_ipv4_literal_validates(octets in any::<[u8; 4]>()) {
            let address = Ipv4Addr::from(octets).to_string();
            prop_assert!(validate_ip_address(&address).is_some());
        }

        #[test]
        fn property_every_ipv6_literal_validates(segments in any::<[u16; 8]>()) {
            let address = Ipv6Addr::from(segments).to_string();
            prop_assert!(validate_ip_address(&address).is_some());
        }

        #[test]
        fn property_first_octet_above_255_is_rejected(first in 256u32..10_000, rest in any::<[u8; 3]>()) {
            let address = format!("{first}.{}.{}.{}", rest[0], rest[1], rest[2]);
            prop_assert!(validate_ip_address(&address).is_none());
        }
    }
}
