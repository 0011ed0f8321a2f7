//! Worker exit classification and stop signals.

use std::fmt;
use std::process::ExitStatus;

use serde::Deserialize;

/// How a worker process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Exit code zero. Intentional, never restarted.
    Clean,
    /// Non-zero exit code, or killed by a signal (`code` is `None`).
    Crashed { code: Option<i32> },
}

impl ExitKind {
    #[must_use]
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Self::Clean,
            code => Self::Crashed { code },
        }
    }

    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        Self::from_code(status.code())
    }

    #[must_use]
    pub fn is_crash(self) -> bool {
        matches!(self, Self::Crashed { .. })
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "0"),
            Self::Crashed { code: Some(code) } => write!(f, "{code}"),
            Self::Crashed { code: None } => write!(f, "signal"),
        }
    }
}

/// Signal used to stop a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopSignal {
    /// SIGINT: the worker closes its gateway connection and exits 0.
    #[default]
    Interrupt,
    /// SIGTERM: handled like SIGINT.
    Terminate,
    /// SIGKILL: immediate, non-zero exit.
    Kill,
}

impl StopSignal {
    #[cfg(unix)]
    #[must_use]
    pub fn as_raw(self) -> libc::c_int {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Terminate => libc::SIGTERM,
            Self::Kill => libc::SIGKILL,
        }
    }
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Kill => "SIGKILL",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_clean() {
        assert_eq!(ExitKind::from_code(Some(0)), ExitKind::Clean);
        assert!(!ExitKind::Clean.is_crash());
    }

    #[test]
    fn non_zero_and_signal_deaths_are_crashes() {
        assert!(ExitKind::from_code(Some(1)).is_crash());
        assert!(ExitKind::from_code(Some(-1)).is_crash());
        assert!(ExitKind::from_code(None).is_crash());
    }

    #[test]
    fn displays_exit_code() {
        assert_eq!(ExitKind::Crashed { code: Some(3) }.to_string(), "3");
        assert_eq!(ExitKind::Crashed { code: None }.to_string(), "signal");
        assert_eq!(StopSignal::Interrupt.to_string(), "SIGINT");
    }
}
