//! External command construction for mount, unmount, and process queries.
//!
//! Everything here builds strings; execution happens in the manager. Every
//! config-supplied component is shell-escaped before interpolation so it
//! cannot be interpreted as shell syntax.
//!
//! Platform-specific command selection is a pluggable strategy: macOS keeps
//! `diskutil unmount`, other unix systems use `fusermount -u`.

use std::borrow::Cow;
use std::path::Path;

use crate::config::MountSpec;

/// Basic SSHFS flags applied to every mount.
const SSHFS_FLAGS: [&str; 5] = [
    "-o local",
    "-o workaround=nonodelaysrv",
    "-o transform_symlinks",
    "-o idmap=user",
    "-C",
];

pub const DEFAULT_PORT: u16 = 22;

/// Quote a string so the shell treats it as a single literal word.
///
/// Strings made only of safe characters pass through unchanged; anything
/// else is wrapped in single quotes, with embedded single quotes rendered
/// as `'\''`.
pub fn shell_escape(s: &str) -> Cow<'_, str> {
    if s.is_empty() {
        return Cow::Borrowed("''");
    }

    let safe = |c: char| c.is_ascii_alphanumeric() || "-_./:@=+,".contains(c);
    if s.chars().all(safe) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(format!("'{}'", s.replace('\'', r"'\''")))
    }
}

/// Platform-specific command set for mount/unmount/query operations.
pub trait PlatformCommands: Send + Sync {
    /// Path or name of the SSHFS client binary.
    fn sshfs_binary(&self) -> &str;

    /// Command that unmounts the filesystem at `local` (already absolute).
    fn unmount_command(&self, local: &Path) -> String;

    /// Command that prints the OS mount table, one line per mounted
    /// filesystem.
    fn mount_table_command(&self) -> &'static str {
        "mount"
    }

    /// Pattern matched against process command lines to find running SSHFS
    /// clients.
    fn process_pattern(&self) -> &'static str {
        "sshfs"
    }

    /// Command that lists running SSHFS processes (pid + command line).
    fn process_list_command(&self) -> String {
        format!("pgrep -fl {}", shell_escape(self.process_pattern()))
    }

    /// Full SSHFS invocation for mounting `spec.remote` at `local` with the
    /// given volume label.
    fn mount_command(&self, spec: &MountSpec, volname: &str, local: &Path) -> String {
        let local = local.to_string_lossy();
        let p_remote = shell_escape(&spec.remote);
        let p_local = shell_escape(&local);
        // The volname option is escaped as one word; quoting the label
        // separately inside double quotes would leave shell syntax live.
        let volopt = format!("volname=\"{}\"", volname);
        let p_volopt = shell_escape(&volopt);
        let port = spec.port.unwrap_or(DEFAULT_PORT);

        format!(
            "{} {} {} -o {} {} -p {}",
            shell_escape(self.sshfs_binary()),
            p_remote,
            p_local,
            p_volopt,
            SSHFS_FLAGS.join(" "),
            port
        )
    }
}

/// Resolve the sshfs binary from PATH, falling back to the bare name so the
/// shell gets a chance to find it at execution time.
fn resolve_sshfs() -> String {
    which::which("sshfs")
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "sshfs".to_string())
}

/// macOS command set: unmounting goes through `diskutil`.
pub struct DiskutilCommands {
    sshfs: String,
}

impl DiskutilCommands {
    pub fn new() -> Self {
        Self {
            sshfs: resolve_sshfs(),
        }
    }
}

impl Default for DiskutilCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformCommands for DiskutilCommands {
    fn sshfs_binary(&self) -> &str {
        &self.sshfs
    }

    fn unmount_command(&self, local: &Path) -> String {
        format!("diskutil unmount {}", shell_escape(&local.to_string_lossy()))
    }
}

/// Generic unix command set: unmounting goes through `fusermount -u`.
pub struct FusermountCommands {
    sshfs: String,
}

impl FusermountCommands {
    pub fn new() -> Self {
        Self {
            sshfs: resolve_sshfs(),
        }
    }
}

impl Default for FusermountCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformCommands for FusermountCommands {
    fn sshfs_binary(&self) -> &str {
        &self.sshfs
    }

    fn unmount_command(&self, local: &Path) -> String {
        format!("fusermount -u {}", shell_escape(&local.to_string_lossy()))
    }
}

/// Command set for the platform this binary was built for.
pub fn platform_commands() -> Box<dyn PlatformCommands> {
    #[cfg(target_os = "macos")]
    {
        Box::new(DiskutilCommands::new())
    }

    #[cfg(not(target_os = "macos"))]
    {
        Box::new(FusermountCommands::new())
    }
}
