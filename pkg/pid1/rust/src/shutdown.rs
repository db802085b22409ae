// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{Duration, Instant, sleep_until};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Unarmed,
    Armed(Instant),
    Fired,
}

/// One-shot stop timeout. Armed by the first terminate-class signal; later
/// arms are no-ops, so a chatty sender cannot push the kill back.
#[derive(Debug)]
pub struct ShutdownTimer {
    duration: Duration,
    deadline: OnceLock<Instant>,
    fired: AtomicBool,
}

impl ShutdownTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: OnceLock::new(),
            fired: AtomicBool::new(false),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start the countdown. Returns true only for the call that armed it.
    pub fn arm(&self) -> bool {
        self.deadline.set(Instant::now() + self.duration).is_ok()
    }

    pub fn state(&self) -> TimerState {
        match self.deadline.get() {
            None => TimerState::Unarmed,
            Some(_) if self.fired.load(Ordering::Acquire) => TimerState::Fired,
            Some(&deadline) => TimerState::Armed(deadline),
        }
    }

    /// Deadline still waiting to fire, if any.
    pub fn pending_deadline(&self) -> Option<Instant> {
        match self.state() {
            TimerState::Armed(deadline) => Some(deadline),
            _ => None,
        }
    }

    /// Mark the timer as fired. Returns false if it had already fired or was
    /// never armed.
    pub fn fire(&self) -> bool {
        self.deadline.get().is_some()
            && self
                .fired
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}

/// Resolves at `deadline`, or never when there is none.
pub async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
