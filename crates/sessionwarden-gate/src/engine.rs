//! Phase dispatcher.
//!
//! | phase              | bypass / root | authority          | result            |
//! |--------------------|---------------|--------------------|-------------------|
//! | authenticate       | yes           | `CheckLogin`       | allow iff true    |
//! | setcred            | -             | -                  | no-op             |
//! | account management | yes           | `CheckLogin`       | allow iff true    |
//! | open session       | **no**        | `CheckLogin`       | allow iff true    |
//! | close session      | -             | `NotifyLogout`     | always succeeds   |
//!
//! Every phase is an independent evaluation; nothing carries over between
//! calls. Missing account names deny the check phases.

use crate::config::GateConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::identity::{Exemption, IdentityDatabase, IdentityResolver};
use crate::phase::{Outcome, Phase, PhaseHandler};
use crate::transport::{AuthorityConnector, DecisionTransport, TransportError};
use std::sync::Arc;

/// What a decision was based on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Basis {
    NoAccount,
    BypassGroup(String),
    RootAccount,
    AuthorityAllowed,
    AuthorityDenied,
    /// Fail-closed: the authority gave no clear answer.
    TransportFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub phase: Phase,
    pub allowed: bool,
    pub basis: Basis,
}

impl Decision {
    fn outcome(&self) -> Outcome {
        if self.allowed {
            Outcome::Allow
        } else {
            Outcome::Deny
        }
    }
}

pub struct DecisionEngine<D, C> {
    resolver: IdentityResolver<D>,
    transport: DecisionTransport<C>,
    sink: Arc<dyn DiagnosticSink>,
}

impl<D: IdentityDatabase, C: AuthorityConnector> DecisionEngine<D, C> {
    pub fn new(config: GateConfig, identity: D, connector: C, sink: Arc<dyn DiagnosticSink>) -> Self {
        let GateConfig {
            endpoint,
            bypass_groups,
            root_account,
            ..
        } = config;
        Self {
            resolver: IdentityResolver::new(identity, bypass_groups, root_account),
            transport: DecisionTransport::new(connector, endpoint),
            sink,
        }
    }

    fn record(&self, event: DiagnosticEvent) {
        self.sink.record(&event);
    }

    /// Authenticate / account management: local bypass first, then authority.
    pub fn evaluate(&self, phase: Phase, account: Option<&str>) -> Decision {
        self.record(DiagnosticEvent::notice(phase, format!("sessionwarden called for {phase}")));

        let Some(account) = present(account) else {
            return self.no_account(phase);
        };

        match self.resolver.exemption(account) {
            Ok(Some(Exemption::BypassGroup(group))) => {
                self.record(DiagnosticEvent::debug(
                    phase,
                    format!("User {account} is in bypass group {group}, allowing"),
                ));
                return Decision {
                    phase,
                    allowed: true,
                    basis: Basis::BypassGroup(group),
                };
            }
            Ok(Some(Exemption::RootAccount)) => {
                self.record(DiagnosticEvent::debug(phase, "User is root, allowing"));
                return Decision {
                    phase,
                    allowed: true,
                    basis: Basis::RootAccount,
                };
            }
            Ok(None) => {}
            Err(e) => {
                self.record(DiagnosticEvent::debug(
                    phase,
                    format!("identity lookup failed, treating {account} as not exempt: {e}"),
                ));
            }
        }

        self.ask_authority(phase, account)
    }

    /// Open session: the authority is always asked.
    ///
    /// Stricter than [`evaluate`](Self::evaluate) on purpose: root and bypass
    /// group members get no fast path here. Do not merge the two.
    pub fn evaluate_without_bypass(&self, phase: Phase, account: Option<&str>) -> Decision {
        self.record(DiagnosticEvent::notice(phase, format!("sessionwarden called for {phase}")));

        let Some(account) = present(account) else {
            return self.no_account(phase);
        };
        self.ask_authority(phase, account)
    }

    fn no_account(&self, phase: Phase) -> Decision {
        self.record(DiagnosticEvent::debug(phase, "No user found"));
        Decision {
            phase,
            allowed: false,
            basis: Basis::NoAccount,
        }
    }

    fn ask_authority(&self, phase: Phase, account: &str) -> Decision {
        let mut scope = self.transport.scope();
        let answer = scope.check_login(account);
        drop(scope);

        let (allowed, basis) = match answer {
            Ok(true) => (true, Basis::AuthorityAllowed),
            Ok(false) => (false, Basis::AuthorityDenied),
            Err(e) => {
                self.record_transport_failure(phase, account, &e);
                (false, Basis::TransportFailure(e.to_string()))
            }
        };

        if allowed {
            self.record(DiagnosticEvent::debug(
                phase,
                format!("Access allowed by sessionwarden for {account}"),
            ));
        } else {
            self.record(DiagnosticEvent::debug(
                phase,
                format!("Access denied by sessionwarden for {account}"),
            ));
            self.record(DiagnosticEvent::notice(
                phase,
                format!("sessionwarden denied access for {account}"),
            ));
        }
        Decision {
            phase,
            allowed,
            basis,
        }
    }

    fn record_transport_failure(&self, phase: Phase, account: &str, err: &TransportError) {
        self.record(DiagnosticEvent::error(phase, err.to_string()));
        let detail = if err.is_connect() {
            "Failed to connect to D-Bus system bus".to_string()
        } else {
            format!("CheckLogin failed for user {account}: {err}")
        };
        self.record(DiagnosticEvent::debug(phase, detail));
    }

    /// Close session: best-effort `NotifyLogout`, never blocks the host.
    pub fn notify_session_end(&self, account: Option<&str>) -> Outcome {
        let phase = Phase::CloseSession;
        let Some(account) = present(account) else {
            self.record(DiagnosticEvent::debug(phase, "No user found, nothing to notify"));
            return Outcome::NoOp;
        };

        let mut scope = self.transport.scope();
        match scope.notify_logout(account) {
            Ok(()) => {
                self.record(DiagnosticEvent::debug(
                    phase,
                    format!("Sent logout notification for {account}"),
                ));
                Outcome::Allow
            }
            Err(e) => {
                self.record(DiagnosticEvent::error(phase, e.to_string()));
                self.record(DiagnosticEvent::debug(
                    phase,
                    format!("Failed to send logout notification for {account}: {e}"),
                ));
                Outcome::FailureIgnored
            }
        }
    }
}

/// Empty names are treated like a missing one.
fn present(account: Option<&str>) -> Option<&str> {
    account.filter(|a| !a.is_empty())
}

impl<D: IdentityDatabase, C: AuthorityConnector> PhaseHandler for DecisionEngine<D, C> {
    fn authenticate(&self, account: Option<&str>) -> Outcome {
        // Gates continuation only; credentials are another module's job.
        self.evaluate(Phase::Authenticate, account).outcome()
    }

    fn set_credentials(&self, _account: Option<&str>) -> Outcome {
        Outcome::NoOp
    }

    fn account_management(&self, account: Option<&str>) -> Outcome {
        self.evaluate(Phase::AccountManagement, account).outcome()
    }

    fn open_session(&self, account: Option<&str>) -> Outcome {
        self.evaluate_without_bypass(Phase::OpenSession, account)
            .outcome()
    }

    fn close_session(&self, account: Option<&str>) -> Outcome {
        self.notify_session_end(account)
    }
}

#[cfg(target_os = "linux")]
impl DecisionEngine<crate::identity::SystemIdentity, crate::transport::SystemBus> {
    /// Engine wired to the host: NSS identity, system bus, standard sinks.
    pub fn system() -> Self {
        let config = GateConfig::default();
        let sink = crate::diagnostics::standard_sink(&config);
        Self::new(
            config,
            crate::identity::SystemIdentity,
            crate::transport::SystemBus,
            sink,
        )
    }
}
