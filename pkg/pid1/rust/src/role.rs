// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// Not pid 1 and not re-executed: run the application in-process.
    Direct,
    /// Pid 1: spawn the worker and act as init.
    Supervisor,
    /// The re-executed copy running the application.
    Worker,
}

impl ProcessRole {
    /// The marker wins over the pid: a worker re-executed in a fresh pid
    /// namespace is pid 1 too.
    pub fn detect(is_pid1: bool, marker_present: bool) -> Self {
        match (is_pid1, marker_present) {
            (_, true) => ProcessRole::Worker,
            (true, false) => ProcessRole::Supervisor,
            (false, false) => ProcessRole::Direct,
        }
    }

    /// Role of the current process.
    pub fn current() -> Self {
        Self::detect(is_pid1(), config::marker_present())
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessRole::Direct => write!(f, "direct"),
            ProcessRole::Supervisor => write!(f, "supervisor"),
            ProcessRole::Worker => write!(f, "worker"),
        }
    }
}

pub fn is_pid1() -> bool {
    std::process::id() == 1
}
