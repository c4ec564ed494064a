#![allow(unsafe_code)]

use super::{write_escaped, DiagnosticEvent, DiagnosticSink, Severity};
use std::ffi::CString;

/// Writes to the system log under `LOG_AUTHPRIV`.
///
/// Does not call `openlog`: the host process owns the syslog identity, so
/// every line carries its own `module(phase):` prefix instead, the way
/// `pam_syslog` formats it. Debug events are not sent.
pub struct SyslogSink {
    ident: String,
}

impl SyslogSink {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
        }
    }

    fn line(&self, event: &DiagnosticEvent) -> String {
        let mut line = match event.phase {
            Some(phase) => format!("{}({}): ", self.ident, phase),
            None => format!("{}: ", self.ident),
        };
        // Writing into a String cannot fail.
        let _ = write_escaped(&mut line, &event.message);
        line
    }
}

impl DiagnosticSink for SyslogSink {
    fn record(&self, event: &DiagnosticEvent) {
        let level = match event.severity {
            Severity::Debug => return,
            Severity::Notice => libc::LOG_NOTICE,
            Severity::Error => libc::LOG_ERR,
        };
        let Ok(line) = CString::new(self.line(event)) else {
            return;
        };
        // SAFETY: constant "%s" format with one NUL-terminated argument.
        unsafe {
            libc::syslog(
                libc::LOG_AUTHPRIV | level,
                b"%s\0".as_ptr().cast(),
                line.as_ptr(),
            );
        }
    }
}
