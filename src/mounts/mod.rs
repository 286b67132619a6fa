//! Mount orchestration.
//!
//! `MountManager` ties the scanner, the mount-point lifecycle, and the
//! command builder together: dupe-checked mounts, lookup-checked unmounts,
//! and subprocess execution with output streamed to the terminal.
//!
//! One manager lives for one CLI invocation. It carries what the original
//! tool kept in process-global state: the verbose flag, the platform
//! command strategy, and the memoized mount-table scan.

pub mod command;
pub mod mountpoint;
pub mod scan;

pub use command::{platform_commands, PlatformCommands};
pub use scan::{ActiveMount, ActiveMounts};

use std::process::Stdio;

use async_trait::async_trait;
use console::style;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::config::MountSpec;
use crate::error::{Result, SshfsmountError};

/// Executes built command lines. The seam lets orchestration logic be
/// exercised without spawning real processes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, cmd: &str) -> Result<bool>;
}

/// Runs commands under `sh -c`, streaming output to the controlling
/// terminal. Blocks until the command completes; remote filesystems may
/// legitimately take a while.
struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, cmd: &str) -> Result<bool> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        Ok(status.success())
    }
}

pub struct MountManager {
    verbose: bool,
    commands: Box<dyn PlatformCommands>,
    runner: Box<dyn CommandRunner>,
    active: OnceCell<ActiveMounts>,
}

impl MountManager {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            commands: platform_commands(),
            runner: Box::new(ShellRunner),
            active: OnceCell::new(),
        }
    }

    #[cfg(test)]
    fn stubbed(active: ActiveMounts, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            verbose: false,
            commands: platform_commands(),
            runner,
            active: OnceCell::new_with(Some(active)),
        }
    }

    /// Active SSHFS mounts, scanned once per invocation. OS state is
    /// assumed not to change for the remainder of the run.
    async fn active_mounts(&self) -> Result<&ActiveMounts> {
        self.active
            .get_or_try_init(|| scan::list_active_mounts(self.commands.as_ref()))
            .await
    }

    /// Mount `spec` under its configured name.
    ///
    /// Refuses when the resolved local path is already actively mounted
    /// (double-mounting can corrupt FUSE state). On subprocess failure the
    /// mount-point directory is left in place for inspection or retry.
    pub async fn mount(&self, name: &str, spec: &MountSpec) -> Result<bool> {
        let local = mountpoint::absolutize(&spec.local);
        if let Some(existing) = self.active_mounts().await?.get(&local) {
            return Err(SshfsmountError::DuplicateMount(format!(
                "{} is already mounted: {}",
                name,
                existing.describe()
            )));
        }

        let local = mountpoint::prepare_mount_point(&spec.local)?;
        let volname = spec.volname.as_deref().unwrap_or(name);
        let cmd = self.commands.mount_command(spec, volname, &local);

        println!(
            "Mounting {} to {} as \"{}\"",
            style(&spec.remote).cyan(),
            style(local.display()).cyan(),
            style(volname).bold()
        );
        self.run(&cmd).await
    }

    /// Unmount the volume at `spec.local`.
    ///
    /// The local path must be actively mounted. A mount-table entry with no
    /// controlling process is only a warning (stale entry after a crash).
    /// The mount-point directory is removed only after the unmount command
    /// succeeds.
    pub async fn unmount(&self, name: &str, spec: &MountSpec) -> Result<bool> {
        let local = mountpoint::absolutize(&spec.local);
        let Some(existing) = self.active_mounts().await?.get(&local) else {
            return Err(SshfsmountError::NotMounted(format!(
                "no active SSHFS mount for {} at {}",
                name,
                local.display()
            )));
        };

        if existing.pid.is_none() {
            tracing::warn!(
                "No sshfs process found for {} (PID: none found); the mount-table entry may be stale",
                local.display()
            );
        }

        let cmd = self.commands.unmount_command(&local);
        println!("Unmounting {}", style(local.display()).cyan());
        if !self.run(&cmd).await? {
            return Err(SshfsmountError::Unmount(format!(
                "unmount command failed for {}",
                local.display()
            )));
        }

        mountpoint::remove_mount_point(&spec.local)?;
        Ok(true)
    }

    async fn run(&self, cmd: &str) -> Result<bool> {
        if self.verbose {
            eprintln!("> {}", cmd);
        }
        self.runner.run(cmd).await
    }
}
