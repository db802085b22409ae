// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Example application wrapped by `dd_pid1::run`.
//!
//! `DD_PID1_EXAMPLE_MODE` picks what the application does:
//! - `sleep` (default): sleep `DD_PID1_EXAMPLE_SLEEP` seconds or until cancelled, exit 0
//! - `exit`: exit right away with `DD_PID1_EXAMPLE_CODE`
//! - `wait`: exit 99 once cancelled, 23 if nothing happens for 30s
//! - `stubborn`: ignore cancellation entirely
//! - `grandchild`: run `sleep 300` and wait for it, exit 99 once cancelled
//! - `orphan`: leave a short-lived background process behind, then exit 0
//!
//! `DD_PID1_EXAMPLE_SUPERVISE=1` acts as pid 1 even when it is not.

use anyhow::{Context, Result, anyhow};
use dd_pid1::{CancellationToken, ProcessRole, config};
use log::{Level, error, info};
use std::env;
use std::process::{Command, Stdio};
use std::time::Duration;

const LOG_LEVEL_ENV: &str = "DD_PID1_LOG_LEVEL";
const MODE_ENV: &str = "DD_PID1_EXAMPLE_MODE";
const CODE_ENV: &str = "DD_PID1_EXAMPLE_CODE";
const SLEEP_ENV: &str = "DD_PID1_EXAMPLE_SLEEP";
const SUPERVISE_ENV: &str = "DD_PID1_EXAMPLE_SUPERVISE";

fn log_level() -> Result<Level> {
    match env::var(LOG_LEVEL_ENV) {
        Ok(v) => v
            .parse()
            .map_err(|e| anyhow!("invalid {LOG_LEVEL_ENV}={v:?}: {e}")),
        Err(_) => Ok(Level::Info),
    }
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

async fn app(token: CancellationToken) -> i32 {
    let mode = env::var(MODE_ENV).unwrap_or_else(|_| "sleep".to_string());
    info!("example running (mode={mode}, pid={})", std::process::id());

    let result = match mode.as_str() {
        "sleep" => sleep(token).await,
        "exit" => Ok(env_number(CODE_ENV, 0)),
        "wait" => Ok(wait(token).await),
        "stubborn" => Ok(stubborn().await),
        "grandchild" => grandchild(token).await,
        "orphan" => orphan().await,
        other => Err(anyhow!("unknown {MODE_ENV}={other:?}")),
    };

    match result {
        Ok(code) => {
            info!("example done (code={code})");
            code
        }
        Err(e) => {
            error!("example failed: {e:#}");
            1
        }
    }
}

async fn sleep(token: CancellationToken) -> Result<i32> {
    let secs = env_number(SLEEP_ENV, 10u64);
    info!("sleeping for {secs} seconds");
    tokio::select! {
        _ = token.cancelled() => info!("cancelled"),
        _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
    }
    Ok(0)
}

async fn wait(token: CancellationToken) -> i32 {
    tokio::select! {
        _ = token.cancelled() => 99,
        _ = tokio::time::sleep(Duration::from_secs(30)) => 23,
    }
}

async fn stubborn() -> i32 {
    info!("ignoring cancellation");
    tokio::time::sleep(Duration::from_secs(300)).await;
    0
}

async fn grandchild(token: CancellationToken) -> Result<i32> {
    let mut child = Command::new("sleep")
        .arg("300")
        .spawn()
        .context("spawning grandchild")?;
    info!("spawned grandchild (pid={})", child.id());

    let status = tokio::task::spawn_blocking(move || child.wait())
        .await?
        .context("waiting for grandchild")?;
    info!("grandchild exited with {status}");

    // The signal that killed the grandchild reached us at the same moment.
    let cancelled = tokio::time::timeout(Duration::from_secs(5), token.cancelled())
        .await
        .is_ok();
    Ok(if cancelled { 99 } else { 1 })
}

async fn orphan() -> Result<i32> {
    let out = Command::new("/bin/sh")
        .args(["-c", "sleep 0.5 >/dev/null 2>&1 & echo $!"])
        .stderr(Stdio::inherit())
        .output()
        .context("spawning orphan")?;
    let pid = String::from_utf8_lossy(&out.stdout).trim().to_string();
    info!("left orphan behind (pid={pid})");
    tokio::time::sleep(Duration::from_secs(2)).await;
    Ok(0)
}

fn main() -> Result<()> {
    simple_logger::init_with_level(log_level()?)?;

    let role = if env::var(SUPERVISE_ENV).as_deref() == Ok("1") {
        ProcessRole::detect(true, config::marker_present())
    } else {
        ProcessRole::current()
    };
    info!("dd-pid1-example starting as {role}");
    dd_pid1::run_as(role, app)
}
