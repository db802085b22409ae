// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Zombie collection. As pid 1 (or a subreaper) every orphaned descendant is
//! re-parented to us and stays a zombie until we wait on it.

use crate::state::ExitOutcome;
use log::{debug, warn};
use nix::errno::Errno;
use nix::unistd::Pid;
use std::time::Duration;

const ANY_CHILD: libc::pid_t = -1;
const WAIT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// `waitpid(-1, flags)` returning the raw status word. nix's `WaitStatus`
/// rejects real-time termination signals after the child is already gone,
/// which would lose the worker's outcome.
fn wait_any(flags: libc::c_int) -> nix::Result<Option<(Pid, ExitOutcome)>> {
    let mut status: libc::c_int = 0;
    let pid = Errno::result(unsafe { libc::waitpid(ANY_CHILD, &mut status, flags) })?;
    Ok((pid > 0).then(|| (Pid::from_raw(pid), ExitOutcome::from_wait_status(status))))
}

/// Reap descendants until `child` exits and return its outcome. Blocks the
/// calling thread; other pids collected on the way are orphans and are
/// dropped.
pub fn reap_until_exit(child: Pid) -> ExitOutcome {
    loop {
        match wait_any(0) {
            Ok(Some((pid, outcome))) if pid == child => {
                debug!("reaped managed child (pid={pid}, {outcome})");
                return outcome;
            }
            Ok(Some((pid, outcome))) => debug!("reaped orphan (pid={pid}, {outcome})"),
            Ok(None) => {}
            Err(Errno::EINTR) => {}
            Err(Errno::ECHILD) => {
                // Only reachable if the child's status was collected elsewhere.
                warn!("no children left while waiting for pid {child}, assuming exit code 0");
                return ExitOutcome::Exited(0);
            }
            Err(e) => {
                debug!("waitpid failed: {e}, retrying");
                std::thread::sleep(WAIT_ERROR_BACKOFF);
            }
        }
    }
}

/// Collect every child that has already exited, without blocking. Returns
/// how many were collected.
pub fn drain_zombies() -> usize {
    let mut reaped = 0;
    loop {
        match wait_any(libc::WNOHANG) {
            Ok(Some((pid, outcome))) => {
                debug!("swept straggler (pid={pid}, {outcome})");
                reaped += 1;
            }
            Ok(None) | Err(_) => break,
        }
    }
    reaped
}
