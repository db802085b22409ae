// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to a running dd-pid1-example process.
pub struct ExampleHandle {
    child: Child,
    log_lines: Arc<Mutex<Vec<String>>>,
    _stdout_thread: JoinHandle<()>,
    _stderr_thread: JoinHandle<()>,
}

fn collect_lines(
    stream: impl Read + Send + 'static,
    tag: &'static str,
    lines: Arc<Mutex<Vec<String>>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(l) => {
                    eprintln!("[{tag}] {l}");
                    lines.lock().unwrap().push(l);
                }
                Err(_) => break,
            }
        }
    })
}

impl ExampleHandle {
    /// Start the example with a clean dd-pid1 environment plus `envs`.
    pub fn start(envs: &[(&str, &str)]) -> Self {
        let bin = env!("CARGO_BIN_EXE_dd-pid1-example");
        let mut cmd = Command::new(bin);
        for key in [
            "DD_PID1_CHILD",
            "DD_PID1_STOP_TIMEOUT",
            "DD_PID1_LOG_LEVEL",
            "DD_PID1_EXAMPLE_MODE",
            "DD_PID1_EXAMPLE_CODE",
            "DD_PID1_EXAMPLE_SLEEP",
            "DD_PID1_EXAMPLE_SUPERVISE",
        ] {
            cmd.env_remove(key);
        }
        let mut child = cmd
            .envs(envs.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start dd-pid1-example");

        let stdout = child.stdout.take().expect("failed to capture stdout");
        let stderr = child.stderr.take().expect("failed to capture stderr");
        let log_lines = Arc::new(Mutex::new(Vec::<String>::new()));

        Self {
            child,
            _stdout_thread: collect_lines(stdout, "example", Arc::clone(&log_lines)),
            _stderr_thread: collect_lines(stderr, "example:err", Arc::clone(&log_lines)),
            log_lines,
        }
    }

    /// Start the example as if it were pid 1.
    pub fn supervise(envs: &[(&str, &str)]) -> Self {
        let mut all = vec![("DD_PID1_EXAMPLE_SUPERVISE", "1")];
        all.extend_from_slice(envs);
        Self::start(&all)
    }

    /// Wait until a log line containing `pattern` appears, or timeout.
    pub fn wait_for_log(&self, pattern: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.has_log(pattern) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    pub fn wait_for_log_default(&self, pattern: &str) -> bool {
        self.wait_for_log(pattern, DEFAULT_TIMEOUT)
    }

    pub fn has_log(&self, pattern: &str) -> bool {
        let lines = self.log_lines.lock().unwrap();
        lines.iter().any(|l| l.contains(pattern))
    }

    /// Extract the number following `marker` (e.g. `"pid="`) in the first
    /// line containing it.
    pub fn number_after(&self, marker: &str) -> Option<u32> {
        let lines = self.log_lines.lock().unwrap();
        lines.iter().find_map(|l| {
            let start = l.find(marker)? + marker.len();
            let rest = &l[start..];
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            rest[..end].parse().ok()
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send a signal to the example's top-level process.
    pub fn send_signal(&self, sig: Signal) {
        signal::kill(Pid::from_raw(self.pid() as i32), sig)
            .expect("failed to send signal to example");
    }

    /// Send a raw signal number, for signals `Signal` cannot name.
    pub fn send_raw_signal(&self, sig: i32) {
        let rc = unsafe { libc::kill(self.pid() as i32, sig) };
        assert_eq!(rc, 0, "failed to send signal {sig} to example");
    }

    /// Wait for the example to exit within the given timeout, killing it if
    /// it does not.
    pub fn wait_with_timeout(&mut self, timeout: Duration) -> ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            match self
                .child
                .try_wait()
                .expect("failed to check example status")
            {
                Some(status) => return status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        return self.child.wait().expect("failed to wait on killed example");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }

    pub fn wait_default(&mut self) -> ExitStatus {
        self.wait_with_timeout(DEFAULT_TIMEOUT)
    }
}

impl Drop for ExampleHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Check if a PID is still alive.
pub fn pid_is_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Wait until a PID is no longer alive, or timeout.
pub fn wait_for_pid_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !pid_is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
