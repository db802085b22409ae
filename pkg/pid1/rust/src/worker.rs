// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::signals::{TERMINATE_SIGNALS, listen, name};
use log::{debug, info};
use std::future::Future;
use std::sync::Once;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

/// Run the entry function in the re-executed worker and return its exit code.
///
/// Termination-class signals cancel the token handed to `entry`; reacting to
/// it is up to the entry function. The supervisor enforces the deadline.
pub async fn run<F, Fut>(entry: F) -> i32
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = i32>,
{
    let token = CancellationToken::new();
    let signals = listen(TERMINATE_SIGNALS);
    tokio::spawn(cancel_on_signal(signals, token.clone()));

    let code = entry(token).await;
    debug!("entry function returned {code}");
    code
}

/// Cancel `token` on the first signal from `signals`. Later signals are
/// accepted and have no further effect.
pub async fn cancel_on_signal<S>(mut signals: S, token: CancellationToken)
where
    S: Stream<Item = i32> + Unpin,
{
    let cancel = Once::new();
    while let Some(sig) = signals.next().await {
        let sig = name(sig);
        let mut first = false;
        cancel.call_once(|| {
            token.cancel();
            first = true;
        });
        if first {
            info!("received {sig}, cancelling application");
        } else {
            debug!("received {sig}, cancellation already requested");
        }
    }
}
