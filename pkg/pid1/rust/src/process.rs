// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::{CHILD_ENV_KEY, CHILD_ENV_VAL};
use crate::error::{Error, Result};
use log::info;
use nix::errno::Errno;
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Something the supervisor can deliver signals to.
pub trait SignalTarget {
    /// `sig` is a raw signal number so real-time signals can be delivered.
    fn signal(&self, sig: i32) -> nix::Result<()>;
}

/// The single process the supervisor manages. It leads its own process
/// group, so signalling the group reaches everything it spawned.
#[derive(Debug)]
pub struct ManagedChild {
    pid: Pid,
}

impl ManagedChild {
    /// Spawn `cmd` as the leader of a new process group.
    ///
    /// The std `Child` handle is dropped on purpose: its status is collected
    /// by the reaper through `waitpid(-1)`, never through the handle.
    pub fn spawn(mut cmd: Command) -> Result<Self> {
        cmd.process_group(0);
        let exe = PathBuf::from(cmd.get_program());
        let child = cmd.spawn().map_err(|source| Error::Spawn { exe, source })?;

        let pid = Pid::from_raw(child.id() as i32);
        info!("spawned worker (pid={pid}, cmd={})", cmd.get_program().display());
        Ok(Self { pid })
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Equal to the pid: the child is its own group leader.
    pub fn pgid(&self) -> Pid {
        self.pid
    }
}

impl SignalTarget for ManagedChild {
    fn signal(&self, sig: i32) -> nix::Result<()> {
        Errno::result(unsafe { libc::killpg(self.pgid().as_raw(), sig) }).map(drop)
    }
}

/// Command that re-executes the current binary, with the same argv, as the
/// worker.
pub fn worker_command() -> Result<Command> {
    let mut args = std::env::args_os();
    let argv0 = args.next();
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => argv0.clone().map(PathBuf::from).ok_or(Error::CurrentExe(e))?,
    };

    let mut cmd = Command::new(exe);
    if let Some(argv0) = argv0 {
        cmd.arg0(argv0);
    }
    cmd.args(args)
        .env(CHILD_ENV_KEY, CHILD_ENV_VAL)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaper::reap_until_exit;
    use crate::state::ExitOutcome;
    use nix::unistd::getpgid;
    use std::time::Duration;
    use serial_test::serial;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", script])
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    #[test]
    #[serial]
    fn test_spawn_leads_new_group() {
        let child = ManagedChild::spawn(sh("sleep 30")).unwrap();
        assert_eq!(child.pgid(), child.pid());
        assert_eq!(getpgid(Some(child.pid())).unwrap(), child.pid());
        assert_ne!(
            getpgid(None).unwrap(),
            child.pid(),
            "child must not share our group"
        );

        child.signal(libc::SIGKILL).unwrap();
        assert_eq!(
            reap_until_exit(child.pid()),
            ExitOutcome::Signaled(libc::SIGKILL)
        );
    }

    #[test]
    #[serial]
    fn test_signal_reaches_group() {
        // The shell waits on its background job; both live in the group.
        let child = ManagedChild::spawn(sh("trap 'exit 5' TERM; sleep 30 & wait")).unwrap();
        std::thread::sleep(Duration::from_millis(200));

        child.signal(libc::SIGTERM).unwrap();
        assert_eq!(reap_until_exit(child.pid()), ExitOutcome::Exited(5));
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[serial]
    fn test_realtime_signal_reaches_group() {
        let sig = libc::SIGRTMIN() + 2;
        let child = ManagedChild::spawn(sh("sleep 30 & wait")).unwrap();
        std::thread::sleep(Duration::from_millis(200));

        child.signal(sig).unwrap();
        assert_eq!(reap_until_exit(child.pid()), ExitOutcome::Signaled(sig));
    }

    #[test]
    #[serial]
    fn test_spawn_nonexistent_binary() {
        let err = ManagedChild::spawn(Command::new("/nonexistent/binary")).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/binary"));
    }

    #[test]
    #[serial]
    fn test_signal_after_exit_is_an_error_not_a_panic() {
        let child = ManagedChild::spawn(sh("exit 0")).unwrap();
        assert_eq!(reap_until_exit(child.pid()), ExitOutcome::Exited(0));
        assert_eq!(child.signal(libc::SIGTERM), Err(Errno::ESRCH));
    }

    #[test]
    fn test_worker_command_sets_marker() {
        let cmd = worker_command().unwrap();
        let marker = cmd
            .get_envs()
            .find(|(k, _)| *k == CHILD_ENV_KEY)
            .and_then(|(_, v)| v);
        assert_eq!(marker, Some(std::ffi::OsStr::new(CHILD_ENV_VAL)));

        let args: Vec<_> = cmd.get_args().collect();
        let expected: Vec<_> = std::env::args_os().skip(1).collect();
        assert_eq!(args, expected.iter().map(|a| a.as_os_str()).collect::<Vec<_>>());
    }
}
