#![cfg(target_os = "linux")]

use super::{AuthorityConnector, AuthoritySession, Reply, TransportError};
use crate::config::AuthorityEndpoint;
use zbus::blocking::Connection;
use zbus::message::Flags;
use zbus::Message;

/// Connects to the system message bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBus;

impl AuthorityConnector for SystemBus {
    type Session = BusSession;

    fn connect(&self, _endpoint: &AuthorityEndpoint) -> Result<BusSession, TransportError> {
        let conn = Connection::system().map_err(TransportError::connect)?;
        tracing::debug!(unique_name = ?conn.unique_name(), "connected to system bus");
        Ok(BusSession { conn })
    }
}

/// A private system-bus connection; closed on drop.
pub struct BusSession {
    conn: Connection,
}

impl AuthoritySession for BusSession {
    fn call(
        &self,
        endpoint: &AuthorityEndpoint,
        method: &str,
        account: &str,
    ) -> Result<Reply, TransportError> {
        // No method timeout: blocks until the bus answers or errors out.
        let reply = self
            .conn
            .call_method(
                Some(endpoint.service.as_str()),
                endpoint.object_path.as_str(),
                Some(endpoint.interface.as_str()),
                method,
                &(account,),
            )
            .map_err(TransportError::call)?;
        Ok(classify_reply(&reply))
    }

    fn send_no_reply(
        &self,
        endpoint: &AuthorityEndpoint,
        method: &str,
        account: &str,
    ) -> Result<(), TransportError> {
        let msg = Message::method(endpoint.object_path.as_str(), method)
            .and_then(|b| b.destination(endpoint.service.as_str()))
            .and_then(|b| b.interface(endpoint.interface.as_str()))
            .and_then(|b| b.with_flags(Flags::NoReplyExpected))
            .and_then(|b| b.build(&(account,)))
            .map_err(TransportError::send)?;
        self.conn.send(&msg).map_err(TransportError::send)
    }
}

fn classify_reply(reply: &Message) -> Reply {
    let signature = reply
        .header()
        .signature()
        .map(|s| s.to_string())
        .unwrap_or_default();
    classify_signature(&signature, || reply.body().deserialize::<bool>().ok())
}

fn classify_signature(signature: &str, read_bool: impl FnOnce() -> Option<bool>) -> Reply {
    match signature {
        "" => Reply::NoArguments,
        "b" => match read_bool() {
            Some(value) => Reply::Boolean(value),
            None => Reply::Other {
                signature: signature.to_string(),
            },
        },
        other => Reply::Other {
            signature: other.to_string(),
        },
    }
}
