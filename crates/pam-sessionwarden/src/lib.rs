//! PAM service module for SessionWarden.
//!
//! ```text
//! auth     required pam_sessionwarden.so
//! account  required pam_sessionwarden.so
//! session  optional pam_sessionwarden.so
//! ```
//!
//! Each callback builds a fresh engine, so no connection or lookup result
//! outlives the call that made it.
#![allow(unsafe_code)]

use pamsm::{pam_module, Pam, PamError, PamFlags, PamLibExt, PamServiceModule};
use sessionwarden_gate::{DecisionEngine, Outcome, Phase, PhaseHandler};

struct SessionWarden;

fn account_name(pamh: &Pam, phase: Phase) -> Option<String> {
    match pamh.get_user(None) {
        Ok(Some(user)) => phase.decode_account(user.to_bytes()),
        _ => None,
    }
}

fn status(outcome: Outcome) -> PamError {
    if outcome.permits() {
        PamError::SUCCESS
    } else {
        PamError::PERM_DENIED
    }
}

impl PamServiceModule for SessionWarden {
    fn authenticate(pamh: Pam, _flags: PamFlags, _args: Vec<String>) -> PamError {
        let account = account_name(&pamh, Phase::Authenticate);
        status(DecisionEngine::system().authenticate(account.as_deref()))
    }

    fn setcred(pamh: Pam, _flags: PamFlags, _args: Vec<String>) -> PamError {
        let account = account_name(&pamh, Phase::SetCredentials);
        status(DecisionEngine::system().set_credentials(account.as_deref()))
    }

    fn acct_mgmt(pamh: Pam, _flags: PamFlags, _args: Vec<String>) -> PamError {
        let account = account_name(&pamh, Phase::AccountManagement);
        status(DecisionEngine::system().account_management(account.as_deref()))
    }

    fn open_session(pamh: Pam, _flags: PamFlags, _args: Vec<String>) -> PamError {
        let account = account_name(&pamh, Phase::OpenSession);
        status(DecisionEngine::system().open_session(account.as_deref()))
    }

    fn close_session(pamh: Pam, _flags: PamFlags, _args: Vec<String>) -> PamError {
        let account = account_name(&pamh, Phase::CloseSession);
        status(DecisionEngine::system().close_session(account.as_deref()))
    }
}

pam_module!(SessionWarden);
