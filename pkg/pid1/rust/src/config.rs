// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::error::{Error, Result};
use log::warn;
use std::time::Duration;

/// Set on the re-executed worker so it takes the worker path even as pid 1.
pub const CHILD_ENV_KEY: &str = "DD_PID1_CHILD";
pub const CHILD_ENV_VAL: &str = "1";

/// How long the supervisor waits after the first terminate-class signal
/// before it SIGKILLs the worker's process group.
pub const STOP_TIMEOUT_ENV: &str = "DD_PID1_STOP_TIMEOUT";
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw value of the worker marker variable, if set.
pub fn child_marker() -> Option<String> {
    std::env::var(CHILD_ENV_KEY).ok()
}

pub fn marker_present() -> bool {
    child_marker().as_deref() == Some(CHILD_ENV_VAL)
}

/// Parse a stop timeout value.
///
/// Returns `Ok(None)` for an empty value (use the default). Bare digits are
/// seconds; anything else is a duration expression such as `1m15s` or `250ms`.
pub fn parse_stop_timeout(raw: &str) -> Result<Option<Duration>> {
    let val = raw.trim();
    if val.is_empty() {
        return Ok(None);
    }

    if is_all_digits(val) {
        let secs: u64 = val.parse().map_err(|e| invalid(val, e))?;
        return Ok(Some(Duration::from_secs(secs)));
    }

    if let Some(magnitude) = val.strip_prefix('-') {
        // "-0s" is still zero, anything else below zero is refused.
        return match humantime::parse_duration(&with_leading_zeros(magnitude)) {
            Ok(d) if d.is_zero() => Ok(Some(d)),
            Ok(_) => Err(Error::NegativeStopTimeout {
                var: STOP_TIMEOUT_ENV,
                value: val.to_string(),
            }),
            Err(e) => Err(invalid(val, e)),
        };
    }

    let expr = val.strip_prefix('+').unwrap_or(val);
    humantime::parse_duration(&with_leading_zeros(expr))
        .map(Some)
        .map_err(|e| invalid(val, e))
}

/// Read the stop timeout from the environment, falling back to
/// [`DEFAULT_STOP_TIMEOUT`] with a warning when the value is unusable.
pub fn stop_timeout_from_env() -> Duration {
    let raw = std::env::var_os(STOP_TIMEOUT_ENV)
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    match parse_stop_timeout(&raw) {
        Ok(Some(timeout)) => timeout,
        Ok(None) => DEFAULT_STOP_TIMEOUT,
        Err(e) => {
            warn!(
                "{e}; using default {}",
                humantime::format_duration(DEFAULT_STOP_TIMEOUT)
            );
            DEFAULT_STOP_TIMEOUT
        }
    }
}

/// The stop timeout a supervisor started now would use.
pub fn effective_stop_timeout() -> Duration {
    stop_timeout_from_env()
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `.5s` means `0.5s`; humantime wants a digit before the point.
fn with_leading_zeros(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len() + 1);
    let mut after_digit = false;
    for c in expr.chars() {
        if c == '.' && !after_digit {
            out.push('0');
        }
        after_digit = c.is_ascii_digit();
        out.push(c);
    }
    out
}

fn invalid(val: &str, reason: impl ToString) -> Error {
    Error::InvalidStopTimeout {
        var: STOP_TIMEOUT_ENV,
        value: val.to_string(),
        reason: reason.to_string(),
    }
}
