//! Compiled-in gate configuration.
//!
//! The module reads no files and no environment; everything it needs is a
//! constant here. [`GateConfig`] exists so that tests (and embedders) can
//! inject a different endpoint or bypass list without touching the constants.

use std::path::PathBuf;

/// Well-known bus name of the SessionWarden daemon.
pub const SERVICE_NAME: &str = "io.github.soarinferret.sessionwarden";
/// Object path exported by the daemon.
pub const OBJECT_PATH: &str = "/io/github/soarinferret/sessionwarden";
/// Interface carrying `CheckLogin` / `NotifyLogout`.
pub const INTERFACE_NAME: &str = "io.github.soarinferret.sessionwarden.Manager";

/// Groups whose members skip the authority at auth/account checkpoints.
pub const DEFAULT_BYPASS_GROUPS: &[&str] = &["wheel", "sudo"];

pub const ROOT_ACCOUNT: &str = "root";

/// Flat trace file written next to syslog.
pub const DEFAULT_TRACE_FILE: &str = "/tmp/sessionwarden_pam.log";

/// Name used as the syslog prefix.
pub const MODULE_NAME: &str = "pam_sessionwarden";

/// Addressing of the authority on the system bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityEndpoint {
    pub service: String,
    pub object_path: String,
    pub interface: String,
}

impl Default for AuthorityEndpoint {
    fn default() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            object_path: OBJECT_PATH.to_string(),
            interface: INTERFACE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub endpoint: AuthorityEndpoint,
    /// Ordered; resolved to gids on every check.
    pub bypass_groups: Vec<String>,
    pub root_account: String,
    pub trace_file: PathBuf,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            endpoint: AuthorityEndpoint::default(),
            bypass_groups: DEFAULT_BYPASS_GROUPS.iter().map(|g| g.to_string()).collect(),
            root_account: ROOT_ACCOUNT.to_string(),
            trace_file: PathBuf::from(DEFAULT_TRACE_FILE),
        }
    }
}

impl GateConfig {
    pub fn with_bypass_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bypass_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_endpoint(mut self, endpoint: AuthorityEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_trace_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_file = path.into();
        self
    }
}
