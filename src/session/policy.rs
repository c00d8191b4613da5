//! Staleness policy for the session cookie.
//!
//! The cookie is a read-through cache of user state. Each mutable field is
//! assigned an explicit refresh rule here instead of leaving the re-mint
//! decision to individual call sites.

/// When a field's backing record changes, does the cookie get rewritten?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Mutate the record, then immediately re-mint and rewrite the cookie.
    Immediate,
    /// Mutate the record only; the cookie resynchronizes at next login.
    NextLogin,
}

/// Mutable session-visible fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    Profile,
    Email,
    Avatar,
    Rank,
    Subscription,
    Widgets,
    SetupStatus,
    Theme,
}

/// The staleness rule for one field. Theme is deliberately the only
/// login-refresh field: theme churn is frequent and harmless when stale, so
/// it trades session staleness for fewer cookie writes.
pub fn refresh_rule(field: SessionField) -> Refresh {
    match field {
        SessionField::Theme => Refresh::NextLogin,
        SessionField::Profile
        | SessionField::Email
        | SessionField::Avatar
        | SessionField::Rank
        | SessionField::Subscription
        | SessionField::Widgets
        | SessionField::SetupStatus => Refresh::Immediate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_volatile_fields_remint_immediately() {
        for field in [
            SessionField::Profile,
            SessionField::Email,
            SessionField::Avatar,
            SessionField::Rank,
            SessionField::Subscription,
            SessionField::Widgets,
            SessionField::SetupStatus,
        ] {
            assert_eq!(refresh_rule(field), Refresh::Immediate);
        }
    }

    #[test]
    fn theme_waits_for_next_login() {
        assert_eq!(refresh_rule(SessionField::Theme), Refresh::NextLogin);
    }
}
