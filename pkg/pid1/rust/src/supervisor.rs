// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config;
use crate::process::{self, ManagedChild, SignalTarget};
use crate::reaper;
use crate::role::is_pid1;
use crate::shutdown::{self, ShutdownTimer};
use crate::signals;
use crate::state::{ExitOutcome, SupervisorState};
use log::{debug, error, info, warn};
use tokio::sync::oneshot;
use tokio::time::Duration;
use tokio_stream::{Stream, StreamExt};

/// Pause between the worker's exit and the final sweep, so descendants that
/// died together with it can be collected before we exit.
pub const GRACE_PERIOD: Duration = Duration::from_millis(50);

/// Exit code of the supervisor when the worker cannot be started.
pub const EXIT_SPAWN_FAILURE: i32 = 125;

enum Event {
    Exited(ExitOutcome),
    Received(i32),
    StopTimeout,
}

/// Process-1 state machine: forwards signals to `target`, escalates to
/// SIGKILL once the stop timeout runs out, and resolves to the worker's
/// outcome.
pub struct Supervisor<T> {
    target: T,
    timer: ShutdownTimer,
    state: SupervisorState,
}

impl<T: SignalTarget> Supervisor<T> {
    /// `target` is the already-spawned worker, so this starts out `Running`.
    pub fn new(target: T, timer: ShutdownTimer) -> Self {
        let mut supervisor = Self {
            target,
            timer,
            state: SupervisorState::Starting,
        };
        supervisor.transition(SupervisorState::Running);
        supervisor
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn timer(&self) -> &ShutdownTimer {
        &self.timer
    }

    /// Run until the worker's outcome arrives on `exited`.
    ///
    /// `signals` yields every signal received by the supervisor. `exited` is
    /// fed by the reaper; a dropped sender counts as an indeterminate exit.
    pub async fn drive<S>(
        &mut self,
        mut signals: S,
        mut exited: oneshot::Receiver<ExitOutcome>,
    ) -> ExitOutcome
    where
        S: Stream<Item = i32> + Unpin,
    {
        loop {
            let deadline = self.timer.pending_deadline();
            let event = tokio::select! {
                res = &mut exited => Event::Exited(res.unwrap_or_else(|_| lost_reaper())),
                Some(sig) = signals.next() => Event::Received(sig),
                _ = shutdown::expired(deadline) => Event::StopTimeout,
            };

            match event {
                Event::Received(sig) => self.forward(sig),
                Event::Exited(outcome) => {
                    info!("worker exited with {outcome}");
                    tokio::time::sleep(GRACE_PERIOD).await;
                    let swept = reaper::drain_zombies();
                    if swept > 0 {
                        debug!("collected {swept} straggler(s) after worker exit");
                    }
                    self.transition(SupervisorState::Terminated);
                    return outcome;
                }
                Event::StopTimeout => {
                    warn!(
                        "stop timeout ({}) reached, sending SIGKILL to worker process group",
                        humantime::format_duration(self.timer.duration())
                    );
                    self.deliver(libc::SIGKILL);
                    self.timer.fire();
                    let outcome = (&mut exited).await.unwrap_or_else(|_| lost_reaper());
                    info!("worker exited with {outcome}");
                    self.transition(SupervisorState::Terminated);
                    return outcome;
                }
            }
        }
    }

    fn forward(&mut self, sig: i32) {
        self.deliver(sig);
        if signals::is_terminate(sig) && self.timer.arm() {
            info!(
                "received {}, worker has {} to exit",
                signals::name(sig),
                humantime::format_duration(self.timer.duration())
            );
            self.transition(SupervisorState::ShuttingDown);
        }
    }

    /// Best effort: the group may already be gone.
    fn deliver(&self, sig: i32) {
        let sig_name = signals::name(sig);
        match self.target.signal(sig) {
            Ok(()) => debug!("forwarded {sig_name} to worker process group"),
            Err(e) => debug!("could not deliver {sig_name} to worker process group: {e}"),
        }
    }

    fn transition(&mut self, next: SupervisorState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid supervisor transition {} -> {next}",
            self.state
        );
        debug!("supervisor {} -> {next}", self.state);
        self.state = next;
    }
}

fn lost_reaper() -> ExitOutcome {
    warn!("reaper stopped without reporting the worker's status");
    ExitOutcome::Indeterminate
}

/// The process-1 role: spawn the worker, supervise it, return the exit code
/// the supervisor should terminate with.
pub async fn run() -> i32 {
    let stop_timeout = config::stop_timeout_from_env();
    // Listen before spawning so nothing sent during startup is lost.
    let signals = signals::listen(signals::forwardable_signals());

    if !is_pid1() {
        become_subreaper();
    }

    let child = match process::worker_command().and_then(ManagedChild::spawn) {
        Ok(child) => child,
        Err(e) => {
            error!("{e}");
            return EXIT_SPAWN_FAILURE;
        }
    };

    let pid = child.pid();
    let (tx, rx) = oneshot::channel();
    tokio::task::spawn_blocking(move || {
        let _ = tx.send(reaper::reap_until_exit(pid));
    });

    let mut supervisor = Supervisor::new(child, ShutdownTimer::new(stop_timeout));
    let outcome = supervisor.drive(signals, rx).await;
    let code = outcome.exit_code();
    info!("exiting with code {code}");
    code
}

/// Have orphaned descendants re-parented to us when we are not pid 1.
#[cfg(target_os = "linux")]
fn become_subreaper() {
    match nix::sys::prctl::set_child_subreaper(true) {
        Ok(()) => debug!("registered as child subreaper"),
        Err(e) => warn!("could not become child subreaper, orphans will not be reaped: {e}"),
    }
}

#[cfg(not(target_os = "linux"))]
fn become_subreaper() {
    warn!("not running as pid 1, orphaned descendants will not be reaped");
}
