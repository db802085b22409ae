// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::signals;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Spawning the worker.
    Starting,
    /// Worker alive, no terminate-class signal seen yet.
    Running,
    /// Stop timeout armed, waiting for the worker to exit.
    ShuttingDown,
    /// Worker outcome known; the supervisor is about to exit.
    Terminated,
}

impl SupervisorState {
    pub(crate) fn can_transition_to(self, next: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (self, next),
            (Starting, Running)
                | (Running, ShuttingDown)
                | (Running, Terminated)
                | (ShuttingDown, Terminated)
        )
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Starting => write!(f, "starting"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::ShuttingDown => write!(f, "shutting down"),
            SupervisorState::Terminated => write!(f, "terminated"),
        }
    }
}

/// How the managed child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    /// Killed by this raw signal number, real-time signals included.
    Signaled(i32),
    /// Reported but neither an exit nor a fatal signal.
    Indeterminate,
}

impl ExitOutcome {
    /// Shell-style exit status: the code itself, or 128 + signal number.
    pub fn exit_code(self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => code,
            ExitOutcome::Signaled(sig) => 128 + sig,
            ExitOutcome::Indeterminate => 1,
        }
    }

    /// Decode a raw `waitpid` status word.
    pub fn from_wait_status(status: libc::c_int) -> Self {
        if libc::WIFEXITED(status) {
            ExitOutcome::Exited(libc::WEXITSTATUS(status))
        } else if libc::WIFSIGNALED(status) {
            ExitOutcome::Signaled(libc::WTERMSIG(status))
        } else {
            ExitOutcome::Indeterminate
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exit code {code}"),
            ExitOutcome::Signaled(sig) => write!(f, "signal {}", signals::name(*sig)),
            ExitOutcome::Indeterminate => write!(f, "indeterminate status"),
        }
    }
}
