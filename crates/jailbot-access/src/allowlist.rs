use std::collections::BTreeSet;

pub const ACCESS_REASON_ALLOWLISTED: &str = "allow_allowlisted";
pub const ACCESS_REASON_MISSING_IDENTITY: &str = "deny_missing_identity";
pub const ACCESS_REASON_NOT_ALLOWLISTED: &str = "deny_not_allowlisted";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `AccessDecision` values.
pub enum AccessDecision {
    Allow { reason_code: String },
    Deny { reason_code: String },
}

impl AccessDecision {
    pub fn reason_code(&self) -> &str {
        match self {
            Self::Allow { reason_code } | Self::Deny { reason_code } => reason_code,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Immutable set of chat identities permitted to issue bot commands.
///
/// Identities are opaque strings; Telegram numeric user ids are stored in
/// their decimal form. Membership is exact after trimming, so `12` never
/// matches an allow-list entry of `123`.
pub struct AuthorizedIdentitySet {
    identities: BTreeSet<String>,
}

impl AuthorizedIdentitySet {
    /// Parses a comma-delimited identity list such as `"1111,2222, 3333"`.
    pub fn parse(raw: &str) -> Self {
        Self::from_identities(raw.split(','))
    }

    pub fn from_identities<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identities = identities
            .into_iter()
            .map(|identity| identity.as_ref().trim().to_string())
            .filter(|identity| !identity.is_empty())
            .collect();
        Self { identities }
    }

    pub fn contains(&self, identity: &str) -> bool {
        let identity = identity.trim();
        !identity.is_empty() && self.identities.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(String::as_str)
    }
}

/// Decides whether `identity` may use the bot. An empty allow-list denies
/// everyone.
pub fn evaluate_access(allowlist: &AuthorizedIdentitySet, identity: &str) -> AccessDecision {
    if identity.trim().is_empty() {
        return AccessDecision::Deny {
            reason_code: ACCESS_REASON_MISSING_IDENTITY.to_string(),
        };
    }
    if allowlist.contains(identity) {
        AccessDecision::Allow {
            reason_code: ACCESS_REASON_ALLOWLISTED.to_string(),
        }
    } else {
        AccessDecision::Deny {
            reason_code: ACCESS_REASON_NOT_ALLOWLISTED.to_string(),
        }
    }
}
