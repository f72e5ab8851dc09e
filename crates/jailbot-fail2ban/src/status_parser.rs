//! Parsers for fail2ban-client's human-readable status reports.
//!
//! The legacy layout is not a versioned contract: the jail list is read from
//! the backtick-marked branch of `status` and the banned IPs from the 9th line
//! of `status <jail>`.

use thiserror::Error;

/// Major version whose `status` layout needs per-jail follow-up queries.
pub const LEGACY_STATUS_MAJOR_VERSION: &str = "0";
pub const LEGACY_BANNED_IP_LINE_INDEX: usize = 8;
const BANNED_IP_LIST_LABEL: &str = "Banned IP list";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusParseError {
    #[error("status output has no jail list section")]
    MissingJailList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Banned addresses currently held by one jail.
pub struct JailBannedIps {
    pub jail: String,
    pub banned_ips: Vec<String>,
}

impl JailBannedIps {
    pub fn has_bans(&self) -> bool {
        !self.banned_ips.is_empty()
    }

    pub fn render_ip_list(&self) -> String {
        self.banned_ips.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Jail name to banned-IP mapping, in the order fail2ban reported the jails.
pub struct JailStatusSnapshot {
    pub jails: Vec<JailBannedIps>,
}

impl JailStatusSnapshot {
    pub fn push(&mut self, jail: impl Into<String>, banned_ips: Vec<String>) {
        self.jails.push(JailBannedIps {
            jail: jail.into(),
            banned_ips,
        });
    }

    pub fn jails_with_bans(&self) -> impl Iterator<Item = &JailBannedIps> {
        self.jails.iter().filter(|entry| entry.has_bans())
    }

    pub fn banned_ips_for(&self, jail: &str) -> Option<&[String]> {
        self.jails
            .iter()
            .find(|entry| entry.jail == jail)
            .map(|entry| entry.banned_ips.as_slice())
    }
}

/// Extracts the major version from `fail2ban-client -V` output such as
/// `0.11.2` or `Fail2Ban v0.10.2`.
pub fn parse_version_major(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let version = line
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or(line)
        .trim_start_matches(['v', 'V']);
    let major = version.split('.').next().unwrap_or_default().trim();
    if major.is_empty() {
        None
    } else {
        Some(major.to_string())
    }
}

pub fn is_legacy_status_format(raw_version: &str) -> bool {
    parse_version_major(raw_version).as_deref() == Some(LEGACY_STATUS_MAJOR_VERSION)
}

/// Reads the comma-separated jail list from aggregate `status` output:
///
/// ```text
/// Status
/// |- Number of jail:      2
/// `- Jail list:   sshd, apache
/// ```
pub fn parse_legacy_jail_list(raw_status: &str) -> Result<Vec<String>, StatusParseError> {
    let (_, remainder) = raw_status
        .split_once('\n')
        .ok_or(StatusParseError::MissingJailList)?;
    let (_, after_marker) = remainder
        .split_once('`')
        .ok_or(StatusParseError::MissingJailList)?;
    let line = after_marker.lines().next().unwrap_or_default();
    let (_, list) = line
        .split_once(':')
        .ok_or(StatusParseError::MissingJailList)?;
    Ok(list
        .split(',')
        .map(str::trim)
        .filter(|jail| !jail.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reads the banned addresses from per-jail `status <jail>` output. An empty
/// vector means the jail currently holds no bans.
pub fn parse_legacy_jail_banned_ips(raw_jail_status: &str) -> Vec<String> {
    let lines = raw_jail_status.split('\n').collect::<Vec<_>>();
    let fixed_line = lines.get(LEGACY_BANNED_IP_LINE_INDEX).copied();
    let line = fixed_line
        .filter(|line| line.contains(BANNED_IP_LIST_LABEL))
        .or_else(|| {
            lines
                .iter()
                .copied()
                .find(|line| line.contains(BANNED_IP_LIST_LABEL))
        })
        .or(fixed_line);
    let Some((_, value)) = line.and_then(|line| line.split_once(':')) else {
        return Vec::new();
    };
    let value = value.trim();
    if value.chars().count() <= 1 {
        return Vec::new();
    }
    value.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::{
        is_legacy_status_format, parse_legacy_jail_banned_ips, parse_legacy_jail_list,
        parse_version_major, JailStatusSnapshot, StatusParseError,
    };

    const AGGREGATE_STATUS: &str =
        "Status\n|- Number of jail:\t2\n`- Jail list:\tsshd, apache\n";

    const SSHD_STATUS: &str = "Status for the jail: sshd\n\
|- Filter\n\
|  |- Currently failed:\t0\n\
|  |- Total failed:\t12\n\
|  `- File list:\t/var/log/auth.log\n\
`- Actions\n\
   |- Currently banned:\t2\n\
   |- Total banned:\t7\n\
   `- Banned IP list:\t203.0.113.7 198.51.100.23\n";

    const EMPTY_JAIL_STATUS: &str = "Status for the jail: apache\n\
|- Filter\n\
|  |- Currently failed:\t0\n\
|  |- Total failed:\t0\n\
|  `- File list:\t/var/log/apache2/error.log\n\
`- Actions\n\
   |- Currently banned:\t0\n\
   |- Total banned:\t0\n\
   `- Banned IP list:\t\n";

    #[test]
    fn unit_parse_version_major_handles_plain_and_labelled_versions() {
        assert_eq!(parse_version_major("0.11.2\n").as_deref(), Some("0"));
        assert_eq!(parse_version_major("Fail2Ban v0.10.2").as_deref(), Some("0"));
        assert_eq!(
            parse_version_major("\n1.0.2\nCopyright (c) 2004-2008 Cyril Jaquier\n").as_deref(),
            Some("1")
        );
        assert_eq!(parse_version_major("   \n"), None);
    }

    #[test]
    fn unit_is_legacy_status_format_only_for_major_zero() {
        assert!(is_legacy_status_format("0.11.2"));
        assert!(!is_legacy_status_format("1.1.0"));
        assert!(!is_legacy_status_format(""));
    }

    #[test]
    fn unit_parse_legacy_jail_list_trims_names() {
        assert_eq!(
            parse_legacy_jail_list(AGGREGATE_STATUS).expect("jail list"),
            vec!["sshd".to_string(), "apache".to_string()]
        );
    }

    #[test]
    fn unit_parse_legacy_jail_list_accepts_empty_list() {
        let raw = "Status\n|- Number of jail:\t0\n`- Jail list:\t\n";
        assert!(parse_legacy_jail_list(raw).expect("jail list").is_empty());
    }

    #[test]
    fn regression_parse_legacy_jail_list_rejects_unexpected_layout() {
        assert_eq!(
            parse_legacy_jail_list("Status"),
            Err(StatusParseError::MissingJailList)
        );
        assert_eq!(
            parse_legacy_jail_list("Status\nno jails here\n"),
            Err(StatusParseError::MissingJailList)
        );
    }

    #[test]
    fn unit_parse_legacy_jail_banned_ips_reads_ninth_line() {
        assert_eq!(
            parse_legacy_jail_banned_ips(SSHD_STATUS),
            vec!["203.0.113.7".to_string(), "198.51.100.23".to_string()]
        );
        assert!(parse_legacy_jail_banned_ips(EMPTY_JAIL_STATUS).is_empty());
    }

    #[test]
    fn regression_parse_legacy_jail_banned_ips_falls_back_to_labelled_line() {
        let shifted = format!("Extra header\n{SSHD_STATUS}");
        assert_eq!(
            parse_legacy_jail_banned_ips(&shifted),
            vec!["203.0.113.7".to_string(), "198.51.100.23".to_string()]
        );
    }

    #[test]
    fn regression_parse_legacy_jail_banned_ips_tolerates_truncated_output() {
        assert!(parse_legacy_jail_banned_ips("Status for the jail: sshd\n").is_empty());
        assert!(parse_legacy_jail_banned_ips("").is_empty());
    }

    #[test]
    fn functional_snapshot_keeps_tool_order_and_renders_ip_lists() {
        let mut snapshot = JailStatusSnapshot::default();
        snapshot.push("sshd", parse_legacy_jail_banned_ips(SSHD_STATUS));
        snapshot.push("apache", parse_legacy_jail_banned_ips(EMPTY_JAIL_STATUS));

        let with_bans = snapshot.jails_with_bans().collect::<Vec<_>>();
        assert_eq!(with_bans.len(), 1);
        assert_eq!(with_bans[0].jail, "sshd");
        assert_eq!(with_bans[0].render_ip_list(), "203.0.113.7, 198.51.100.23");
        assert_eq!(snapshot.banned_ips_for("apache"), Some(&[][..]));
        assert_eq!(snapshot.banned_ips_for("nginx"), None);
    }
}
