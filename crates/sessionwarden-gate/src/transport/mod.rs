//! Request/response plumbing to the SessionWarden authority.
//!
//! A [`DecisionTransport`] owns the endpoint and a connector. Each host
//! invocation opens a [`TransportScope`], which connects lazily on first use
//! and drops the connection when the scope goes away. At most one
//! `CheckLogin` and one `NotifyLogout` go out per scope; there are no retries.

#[cfg(target_os = "linux")]
mod bus;
mod error;

#[cfg(target_os = "linux")]
pub use bus::{BusSession, SystemBus};
pub use error::TransportError;

use crate::config::AuthorityEndpoint;

pub const CHECK_LOGIN: &str = "CheckLogin";
pub const NOTIFY_LOGOUT: &str = "NotifyLogout";

/// Shape of a method reply, as far as the gate cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    NoArguments,
    /// Exactly one boolean argument.
    Boolean(bool),
    /// Anything else; `signature` is the bus type signature of the body.
    Other { signature: String },
}

/// Opens sessions to the authority.
pub trait AuthorityConnector {
    type Session: AuthoritySession;

    fn connect(&self, endpoint: &AuthorityEndpoint) -> Result<Self::Session, TransportError>;
}

/// One open connection. Dropping it releases the connection.
pub trait AuthoritySession {
    /// Blocking call carrying a single string argument.
    fn call(
        &self,
        endpoint: &AuthorityEndpoint,
        method: &str,
        account: &str,
    ) -> Result<Reply, TransportError>;

    /// Sends a single-string method call flagged as expecting no reply.
    fn send_no_reply(
        &self,
        endpoint: &AuthorityEndpoint,
        method: &str,
        account: &str,
    ) -> Result<(), TransportError>;
}

pub struct DecisionTransport<C> {
    connector: C,
    endpoint: AuthorityEndpoint,
}

impl<C: AuthorityConnector> DecisionTransport<C> {
    pub fn new(connector: C, endpoint: AuthorityEndpoint) -> Self {
        Self {
            connector,
            endpoint,
        }
    }

    /// Start an invocation. Nothing is connected until a method needs it.
    pub fn scope(&self) -> TransportScope<'_, C> {
        TransportScope {
            transport: self,
            session: None,
            decision_requested: false,
            logout_sent: false,
        }
    }
}

pub struct TransportScope<'t, C: AuthorityConnector> {
    transport: &'t DecisionTransport<C>,
    session: Option<C::Session>,
    decision_requested: bool,
    logout_sent: bool,
}

impl<C: AuthorityConnector> TransportScope<'_, C> {
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn session(&mut self) -> Result<&C::Session, TransportError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.transport.connector.connect(&self.transport.endpoint)?,
        };
        Ok(self.session.insert(session))
    }

    /// Ask whether `account` may proceed.
    ///
    /// `Ok` only when the authority answered with exactly one boolean.
    pub fn check_login(&mut self, account: &str) -> Result<bool, TransportError> {
        if self.decision_requested {
            return Err(TransportError::AlreadySent { method: CHECK_LOGIN });
        }
        self.decision_requested = true;

        let transport = self.transport;
        let reply = self
            .session()?
            .call(&transport.endpoint, CHECK_LOGIN, account)?;
        match reply {
            Reply::Boolean(allowed) => Ok(allowed),
            Reply::NoArguments => Err(TransportError::NoArguments),
            Reply::Other { signature } => Err(TransportError::UnexpectedType { signature }),
        }
    }

    /// Tell the authority `account`'s session ended. Never waits for a reply.
    pub fn notify_logout(&mut self, account: &str) -> Result<(), TransportError> {
        if self.logout_sent {
            return Err(TransportError::AlreadySent {
                method: NOTIFY_LOGOUT,
            });
        }
        self.logout_sent = true;

        let transport = self.transport;
        self.session()?
            .send_no_reply(&transport.endpoint, NOTIFY_LOGOUT, account)
    }
}
