//! Diagnostic side channel.
//!
//! Sinks are write-only and infallible from the caller's point of view: every
//! write error is swallowed. Nothing recorded here feeds back into a decision.

mod syslog;
mod trace_file;

pub use self::syslog::SyslogSink;
pub use self::trace_file::TraceFileSink;

use crate::config::{GateConfig, MODULE_NAME};
use crate::phase::Phase;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Trace-file only.
    Debug,
    Notice,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Notice => "notice",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    pub phase: Option<Phase>,
    pub message: String,
}

impl DiagnosticEvent {
    pub fn new(severity: Severity, phase: Option<Phase>, message: impl Into<String>) -> Self {
        Self {
            severity,
            phase,
            message: message.into(),
        }
    }

    pub fn debug(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, Some(phase), message)
    }

    pub fn notice(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(Severity::Notice, Some(phase), message)
    }

    pub fn error(phase: Phase, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Some(phase), message)
    }
}

/// Control characters in the message are escaped, so a rendered event is
/// always one line whatever the account name contained.
impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(phase) = self.phase {
            write!(f, "[{phase}] ")?;
        }
        write_escaped(f, &self.message)
    }
}

pub(crate) fn write_escaped(f: &mut impl fmt::Write, message: &str) -> fmt::Result {
    for c in message.chars() {
        if c.is_control() {
            write!(f, "{}", c.escape_debug())?;
        } else {
            f.write_char(c)?;
        }
    }
    Ok(())
}

pub trait DiagnosticSink: Send + Sync {
    fn record(&self, event: &DiagnosticEvent);
}

pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: &DiagnosticEvent) {}
}

/// Forwards into `tracing`. A no-op when the host installed no subscriber.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &DiagnosticEvent) {
        let phase = event.phase.map(|p| p.as_str()).unwrap_or("-");
        match event.severity {
            Severity::Debug => tracing::debug!(phase, "{}", event.message),
            Severity::Notice => tracing::info!(phase, "{}", event.message),
            Severity::Error => tracing::error!(phase, "{}", event.message),
        }
    }
}

pub struct FanoutSink {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn DiagnosticSink>>) -> Self {
        Self { sinks }
    }
}

impl DiagnosticSink for FanoutSink {
    fn record(&self, event: &DiagnosticEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

/// syslog + trace file + tracing, as the PAM module uses them.
pub fn standard_sink(config: &GateConfig) -> Arc<dyn DiagnosticSink> {
    Arc::new(FanoutSink::new(vec![
        Arc::new(SyslogSink::new(MODULE_NAME)),
        Arc::new(TraceFileSink::new(config.trace_file.clone())),
        Arc::new(TracingSink),
    ]))
}
