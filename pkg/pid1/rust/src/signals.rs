// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Which signals the supervisor listens for, and how it listens.
//!
//! Signals are carried as raw numbers so the real-time range, which has no
//! `nix::sys::signal::Signal` variant, travels the same path as the rest.
//! Every catchable signal is forwarded to the worker's process group except
//! SIGCHLD, which belongs to the reaper.

use log::warn;
use nix::sys::signal::Signal;
use tokio::signal::unix::{SignalKind, signal};
use tokio_stream::wrappers::SignalStream;
use tokio_stream::{Stream, StreamExt, StreamMap};

/// Signals that ask for a graceful stop.
pub const TERMINATE_SIGNALS: [i32; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT, libc::SIGHUP];

pub fn is_terminate(sig: i32) -> bool {
    TERMINATE_SIGNALS.contains(&sig)
}

/// SIGKILL and SIGSTOP cannot be caught, and tokio refuses SIGILL, SIGFPE
/// and SIGSEGV.
pub fn is_forwardable(sig: i32) -> bool {
    !matches!(
        sig,
        libc::SIGKILL | libc::SIGSTOP | libc::SIGCHLD | libc::SIGILL | libc::SIGFPE | libc::SIGSEGV
    )
}

pub fn forwardable_signals() -> Vec<i32> {
    Signal::iterator()
        .map(|sig| sig as i32)
        .chain(realtime_signals())
        .filter(|sig| is_forwardable(*sig))
        .collect()
}

#[cfg(target_os = "linux")]
fn realtime_signals() -> impl Iterator<Item = i32> {
    libc::SIGRTMIN()..=libc::SIGRTMAX()
}

#[cfg(not(target_os = "linux"))]
fn realtime_signals() -> impl Iterator<Item = i32> {
    std::iter::empty()
}

#[cfg(target_os = "linux")]
fn realtime_offset(sig: i32) -> Option<i32> {
    (libc::SIGRTMIN()..=libc::SIGRTMAX())
        .contains(&sig)
        .then(|| sig - libc::SIGRTMIN())
}

#[cfg(not(target_os = "linux"))]
fn realtime_offset(_sig: i32) -> Option<i32> {
    None
}

/// Human-readable name: `SIGTERM`, `SIGRTMIN+3`, or the bare number.
pub fn name(sig: i32) -> String {
    match Signal::try_from(sig) {
        Ok(known) => known.as_str().to_string(),
        Err(_) => match realtime_offset(sig) {
            Some(n) => format!("SIGRTMIN+{n}"),
            None => sig.to_string(),
        },
    }
}

/// Register a handler for each of `signals` and merge them into one stream of
/// received signals. Must be called from inside a tokio runtime.
///
/// A signal the runtime refuses to register is skipped with a warning; it
/// then keeps its default disposition.
pub fn listen(signals: impl IntoIterator<Item = i32>) -> impl Stream<Item = i32> + Unpin + Send {
    let mut streams = StreamMap::new();
    for sig in signals {
        match signal(SignalKind::from_raw(sig)) {
            Ok(rx) => {
                streams.insert(sig, SignalStream::new(rx));
            }
            Err(e) => warn!("cannot listen for {}: {e}", name(sig)),
        }
    }
    streams.map(|(sig, ())| sig)
}
