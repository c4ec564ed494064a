#![allow(dead_code)]

use sessionwarden_gate::config::GateConfig;
use sessionwarden_gate::diagnostics::{DiagnosticEvent, DiagnosticSink, Severity};
use sessionwarden_gate::identity::{GroupId, GroupListFill, IdentityDatabase, IdentityError};
use sessionwarden_gate::transport::{AuthorityConnector, AuthoritySession, Reply, TransportError};
use sessionwarden_gate::{AuthorityEndpoint, DecisionEngine};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Default, Clone)]
pub struct FakeIdentity {
    accounts: HashMap<String, (GroupId, Vec<GroupId>)>,
    groups: HashMap<String, GroupId>,
}

impl FakeIdentity {
    /// wheel=10, sudo=27, users=100; alice in users, bob in users+wheel,
    /// root with gid 0 and no bypass groups.
    pub fn standard() -> Self {
        Self::default()
            .group("wheel", 10)
            .group("sudo", 27)
            .group("users", 100)
            .account("alice", 1000, &[100])
            .account("bob", 1001, &[100, 10])
            .account("root", 0, &[])
    }

    pub fn account(mut self, name: &str, primary: GroupId, supplementary: &[GroupId]) -> Self {
        self.accounts
            .insert(name.to_string(), (primary, supplementary.to_vec()));
        self
    }

    pub fn group(mut self, name: &str, gid: GroupId) -> Self {
        self.groups.insert(name.to_string(), gid);
        self
    }
}

impl IdentityDatabase for FakeIdentity {
    fn primary_group(&self, account: &str) -> Result<Option<GroupId>, IdentityError> {
        Ok(self.accounts.get(account).map(|(p, _)| *p))
    }

    fn fill_group_list(
        &self,
        account: &str,
        primary: GroupId,
        buf: &mut [GroupId],
    ) -> Result<GroupListFill, IdentityError> {
        let mut all = vec![primary];
        if let Some((_, supplementary)) = self.accounts.get(account) {
            all.extend(supplementary);
        }
        if buf.len() < all.len() {
            return Ok(GroupListFill::Insufficient {
                required: Some(all.len()),
            });
        }
        buf[..all.len()].copy_from_slice(&all);
        Ok(GroupListFill::Complete(all.len()))
    }

    fn group_id(&self, group: &str) -> Result<Option<GroupId>, IdentityError> {
        Ok(self.groups.get(group).copied())
    }
}

// ---------------------------------------------------------------------------
// Authority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Script {
    Reply(Reply),
    ErrorReply(String),
    Unreachable,
}

#[derive(Default)]
pub struct AuthorityStats {
    pub connects: AtomicUsize,
    pub releases: AtomicUsize,
    pub calls: Mutex<Vec<(String, String)>>,
    pub notifications: Mutex<Vec<(String, String)>>,
}

impl AuthorityStats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().unwrap().clone()
    }

    /// Every interaction, connects included.
    pub fn transport_activity(&self) -> usize {
        self.connects() + self.calls().len() + self.notifications().len()
    }
}

pub struct ScriptedAuthority {
    script: Script,
    fail_sends: bool,
    pub stats: Arc<AuthorityStats>,
}

impl ScriptedAuthority {
    pub fn answering(allowed: bool) -> Self {
        Self::new(Script::Reply(Reply::Boolean(allowed)))
    }

    pub fn unreachable() -> Self {
        Self::new(Script::Unreachable)
    }

    pub fn new(script: Script) -> Self {
        Self {
            script,
            fail_sends: false,
            stats: Arc::default(),
        }
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }
}

pub struct ScriptedSession {
    script: Script,
    fail_sends: bool,
    stats: Arc<AuthorityStats>,
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl AuthorityConnector for ScriptedAuthority {
    type Session = ScriptedSession;

    fn connect(&self, _endpoint: &AuthorityEndpoint) -> Result<ScriptedSession, TransportError> {
        if let Script::Unreachable = self.script {
            return Err(TransportError::connect(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "/run/dbus/system_bus_socket: No such file or directory",
            )));
        }
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            script: self.script.clone(),
            fail_sends: self.fail_sends,
            stats: self.stats.clone(),
        })
    }
}

impl AuthoritySession for ScriptedSession {
    fn call(
        &self,
        _endpoint: &AuthorityEndpoint,
        method: &str,
        account: &str,
    ) -> Result<Reply, TransportError> {
        self.stats
            .calls
            .lock()
            .unwrap()
            .push((method.to_string(), account.to_string()));
        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::ErrorReply(name) => Err(TransportError::call(std::io::Error::other(name.clone()))),
            Script::Unreachable => unreachable!("connect refuses unreachable scripts"),
        }
    }

    fn send_no_reply(
        &self,
        _endpoint: &AuthorityEndpoint,
        method: &str,
        account: &str,
    ) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::send(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "connection reset",
            )));
        }
        self.stats
            .notifications
            .lock()
            .unwrap()
            .push((method.to_string(), account.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }

    pub fn any(&self, severity: Severity, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, event: &DiagnosticEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub engine: DecisionEngine<FakeIdentity, ScriptedAuthority>,
    pub stats: Arc<AuthorityStats>,
    pub sink: Arc<RecordingSink>,
}

pub fn harness(identity: FakeIdentity, authority: ScriptedAuthority) -> Harness {
    harness_with(GateConfig::default(), identity, authority)
}

pub fn harness_with(config: GateConfig, identity: FakeIdentity, authority: ScriptedAuthority) -> Harness {
    let stats = authority.stats.clone();
    let sink = Arc::new(RecordingSink::default());
    let engine = DecisionEngine::new(config, identity, authority, sink.clone());
    Harness {
        engine,
        stats,
        sink,
    }
}
