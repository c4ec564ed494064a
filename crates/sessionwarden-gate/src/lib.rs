//! SessionWarden login gate.
//!
//! Decides whether an account may pass a login, unlock or session-open
//! checkpoint, and tells the SessionWarden daemon when a session closes.
//! Root and members of the bypass groups pass the authenticate and account
//! checkpoints locally; everyone else needs an explicit `true` from the
//! daemon's `CheckLogin` method. Anything short of that is a denial.
//!
//! The PAM entry points live in the `pam-sessionwarden` crate; this crate has
//! no dependency on libpam.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod identity;
pub mod phase;
pub mod transport;

pub use config::{AuthorityEndpoint, GateConfig};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, Severity};
pub use engine::{Basis, Decision, DecisionEngine};
pub use identity::{IdentityDatabase, IdentityError, IdentityResolver};
pub use phase::{Outcome, Phase, PhaseHandler};
pub use transport::{AuthorityConnector, AuthoritySession, Reply, TransportError};
