//! Host lifecycle phases and the outcomes a phase can produce.

use std::fmt;

/// Linux-PAM `PAM_SUCCESS`.
pub const PAM_SUCCESS: i32 = 0;
/// Linux-PAM `PAM_PERM_DENIED`.
pub const PAM_PERM_DENIED: i32 = 6;

/// Which host callback is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Login and screen unlock.
    Authenticate,
    SetCredentials,
    /// Login only.
    AccountManagement,
    OpenSession,
    CloseSession,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Authenticate,
        Phase::SetCredentials,
        Phase::AccountManagement,
        Phase::OpenSession,
        Phase::CloseSession,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticate => "authentication",
            Self::SetCredentials => "setcred",
            Self::AccountManagement => "account management",
            Self::OpenSession => "open session",
            Self::CloseSession => "close session",
        }
    }

    /// Account name as handed over by the host.
    ///
    /// Check phases reject names that are not UTF-8, which denies. Close
    /// session decodes lossily so the logout notification is still sent.
    pub fn decode_account(&self, raw: &[u8]) -> Option<String> {
        match self {
            Self::CloseSession => Some(String::from_utf8_lossy(raw).into_owned()),
            _ => std::str::from_utf8(raw).ok().map(str::to_owned),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result handed back to the host.
///
/// Only [`Outcome::Deny`] blocks the host flow; the other variants all map to
/// success and differ only for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allow,
    Deny,
    /// Nothing to do (setcred, or close-session without an account).
    NoOp,
    /// Something failed but the phase must not block (close-session).
    FailureIgnored,
}

impl Outcome {
    pub fn permits(&self) -> bool {
        !matches!(self, Self::Deny)
    }

    pub fn pam_code(&self) -> i32 {
        if self.permits() {
            PAM_SUCCESS
        } else {
            PAM_PERM_DENIED
        }
    }
}

/// One method per host callback.
///
/// `account` is whatever the host reported; `None` when it had no user.
pub trait PhaseHandler {
    fn authenticate(&self, account: Option<&str>) -> Outcome;
    fn set_credentials(&self, account: Option<&str>) -> Outcome;
    fn account_management(&self, account: Option<&str>) -> Outcome;
    fn open_session(&self, account: Option<&str>) -> Outcome;
    fn close_session(&self, account: Option<&str>) -> Outcome;

    fn dispatch(&self, phase: Phase, account: Option<&str>) -> Outcome {
        match phase {
            Phase::Authenticate => self.authenticate(account),
            Phase::SetCredentials => self.set_credentials(account),
            Phase::AccountManagement => self.account_management(account),
            Phase::OpenSession => self.open_session(account),
            Phase::CloseSession => self.close_session(account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_deny_blocks() {
        assert_eq!(Outcome::Allow.pam_code(), PAM_SUCCESS);
        assert_eq!(Outcome::NoOp.pam_code(), PAM_SUCCESS);
        assert_eq!(Outcome::FailureIgnored.pam_code(), PAM_SUCCESS);
        assert_eq!(Outcome::Deny.pam_code(), PAM_PERM_DENIED);
        assert!(!Outcome::Deny.permits());
    }

    struct Echo;

    impl PhaseHandler for Echo {
        fn authenticate(&self, _: Option<&str>) -> Outcome {
            Outcome::Allow
        }
        fn set_credentials(&self, _: Option<&str>) -> Outcome {
            Outcome::NoOp
        }
        fn account_management(&self, _: Option<&str>) -> Outcome {
            Outcome::Deny
        }
        fn open_session(&self, _: Option<&str>) -> Outcome {
            Outcome::Deny
        }
        fn close_session(&self, _: Option<&str>) -> Outcome {
            Outcome::FailureIgnored
        }
    }

    #[test]
    fn test_dispatch_routes_each_phase() {
        let got: Vec<Outcome> = Phase::ALL.iter().map(|p| Echo.dispatch(*p, None)).collect();
        assert_eq!(
            got,
            vec![
                Outcome::Allow,
                Outcome::NoOp,
                Outcome::Deny,
                Outcome::Deny,
                Outcome::FailureIgnored
            ]
        );
    }

    #[test]
    fn test_non_utf8_account_only_survives_close_session() {
        let raw = b"al\xffice";
        for phase in [Phase::Authenticate, Phase::AccountManagement, Phase::OpenSession] {
            assert_eq!(phase.decode_account(raw), None, "{phase}");
        }
        assert_eq!(
            Phase::CloseSession.decode_account(raw).as_deref(),
            Some("al\u{fffd}ice")
        );
        assert_eq!(Phase::Authenticate.decode_account(b"alice").as_deref(), Some("alice"));
    }

    #[test]
    fn test_phase_names_are_stable() {
        assert_eq!(Phase::Authenticate.to_string(), "authentication");
        assert_eq!(Phase::AccountManagement.to_string(), "account management");
    }
}
