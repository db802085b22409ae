// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Minimal init for single-process containers.
//!
//! Wrap the application's entry point with [`run`]:
//!
//! ```ignore
//! fn main() {
//!     dd_pid1::run(|token| async move {
//!         token.cancelled().await;
//!         0
//!     })
//! }
//! ```
//!
//! Outside pid 1 the entry function simply runs. As pid 1 the binary
//! re-executes itself as a worker in a new process group and stays behind as
//! init: it reaps zombies, forwards every catchable signal to the worker's
//! group and SIGKILLs the group if it is still alive `DD_PID1_STOP_TIMEOUT`
//! (default 30s) after the first SIGTERM, SIGINT, SIGQUIT or SIGHUP.

pub mod config;
pub mod error;
pub mod process;
pub mod reaper;
pub mod role;
pub mod shutdown;
pub mod signals;
pub mod state;
pub mod supervisor;
pub mod worker;

pub use config::{child_marker, effective_stop_timeout};
pub use error::{Error, Result};
pub use role::{ProcessRole, is_pid1};
pub use state::{ExitOutcome, SupervisorState};
pub use tokio_util::sync::CancellationToken;

use log::error;
use std::future::Future;

/// Run `entry` in the role picked from the pid and the worker marker, then
/// exit the process with the resulting code. Never returns.
pub fn run<F, Fut>(entry: F) -> !
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = i32>,
{
    run_as(ProcessRole::current(), entry)
}

/// Like [`run`], with the role chosen by the caller.
pub fn run_as<F, Fut>(role: ProcessRole, entry: F) -> !
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = i32>,
{
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("{}", Error::Runtime(e));
            std::process::exit(1);
        }
    };

    let code = match role {
        // Nobody ever cancels this token.
        ProcessRole::Direct => runtime.block_on(entry(CancellationToken::new())),
        ProcessRole::Worker => runtime.block_on(worker::run(entry)),
        ProcessRole::Supervisor => runtime.block_on(supervisor::run()),
    };
    std::process::exit(code)
}
