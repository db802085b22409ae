// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The worker process could not be started. Fatal for the supervisor.
    #[error("failed to spawn worker {}: {source}", .exe.display())]
    Spawn {
        exe: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not resolve current executable: {0}")]
    CurrentExe(#[source] io::Error),

    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("invalid {var}={value:?}: {reason}")]
    InvalidStopTimeout {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid {var}={value:?}: duration must not be negative")]
    NegativeStopTimeout { var: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
