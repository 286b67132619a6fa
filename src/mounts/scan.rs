//! Active mount discovery.
//!
//! Scans the OS mount table for SSHFS-style entries and associates each one
//! with a running sshfs process where possible. Everything here is a
//! read-only, best-effort snapshot: other actors mutate the mount and
//! process tables without coordination, so results may be stale by the time
//! an action executes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;
use tokio::process::Command;

use crate::error::Result;
use crate::mounts::command::PlatformCommands;
use crate::mounts::mountpoint::absolutize;

/// One SSHFS entry from the OS mount table.
#[derive(Debug, Clone)]
pub struct ActiveMount {
    /// Canonical absolute local mount point (the map key)
    pub local: PathBuf,

    /// Remote spec in `user@host:/path` form
    pub remote: String,

    /// Raw option string from the mount-table entry
    pub options: String,

    /// Controlling sshfs process, when one could be found. A mount can
    /// outlive its process (e.g. after a crash), so `None` is not an error.
    pub pid: Option<u32>,
}

impl ActiveMount {
    /// One-line description for user-facing messages.
    pub fn describe(&self) -> String {
        let pid = self
            .pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "none found".to_string());
        format!("{} on {} (PID: {})", self.remote, self.local.display(), pid)
    }
}

/// Active mounts keyed by canonical local path. At most one entry per path.
pub type ActiveMounts = HashMap<PathBuf, ActiveMount>;

/// Matches mount-table lines of the form
/// `<user>@<host>:<remote-path> on <local-path> (fuse-family options)`,
/// tolerating the Linux `... type fuse.sshfs (options)` variant.
fn mount_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<remote>[^\s@]+@[^\s:]+:\S*) on (?P<local>.+?)(?: type (?P<fstype>\S+))? \((?P<opts>[^)]*)\)$",
        )
        .expect("mount-table pattern compiles")
    })
}

/// Parse one mount-table line into `(remote, local, options)`.
///
/// Lines that are not SSHFS-style mounts return `None`; most of the mount
/// table is irrelevant and skipping is not an error.
fn parse_mount_line(line: &str) -> Option<(String, String, String)> {
    let caps = mount_line_regex().captures(line.trim())?;

    let fstype = caps.name("fstype").map(|m| m.as_str()).unwrap_or("");
    let opts = caps.name("opts").map(|m| m.as_str()).unwrap_or("");
    if !fstype.contains("fuse") && !opts.contains("fuse") {
        return None;
    }

    Some((
        caps["remote"].to_string(),
        caps["local"].to_string(),
        opts.to_string(),
    ))
}

/// Parse `pgrep -fl` output into `(pid, command line)` pairs.
fn parse_process_list(output: &str) -> Vec<(u32, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (pid, cmdline) = line.trim().split_once(char::is_whitespace)?;
            Some((pid.parse().ok()?, cmdline.trim().to_string()))
        })
        .collect()
}

/// Find the sshfs process whose command line names both the remote spec and
/// the local mount point.
fn find_pid(processes: &[(u32, String)], remote: &str, local: &Path) -> Option<u32> {
    let local = local.to_string_lossy();
    processes
        .iter()
        .find(|(_, cmdline)| cmdline.contains(remote) && cmdline.contains(local.as_ref()))
        .map(|(pid, _)| *pid)
}

async fn run_query(cmd: &str) -> Result<String> {
    let output = Command::new("sh").arg("-c").arg(cmd).output().await?;
    if !output.status.success() {
        // pgrep exits non-zero when nothing matches, so this is routine.
        tracing::debug!("`{}` exited with {}", cmd, output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Scan the OS for currently active SSHFS mounts.
///
/// Read-only. Callers are expected to compute this at most once per
/// invocation; the manager memoizes the result.
pub async fn list_active_mounts(commands: &dyn PlatformCommands) -> Result<ActiveMounts> {
    let table = run_query(commands.mount_table_command()).await?;
    let processes = parse_process_list(&run_query(&commands.process_list_command()).await?);

    let mut mounts = ActiveMounts::new();
    for line in table.lines() {
        let Some((remote, local, options)) = parse_mount_line(line) else {
            continue;
        };

        let local = absolutize(&local);
        let pid = find_pid(&processes, &remote, &local);
        if pid.is_none() {
            tracing::debug!("No sshfs process found for {}", local.display());
        }

        mounts.insert(
            local.clone(),
            ActiveMount {
                local,
                remote,
                options,
                pid,
            },
        );
    }

    Ok(mounts)
}
