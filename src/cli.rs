//! CLI surface for sshfsmount.
//!
//! The command tree is built at runtime: one subcommand per configured
//! mount name, plus the built-in `active` listing. `-u/--unmount` and
//! `-v/--verbose` are global so they work before or after the subcommand.

use std::process::Stdio;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::Config;
use crate::error::{Result, SshfsmountError};
use crate::mounts::{platform_commands, MountManager};

const ACTIVE: &str = "active";

/// Build the clap command tree from the configured mounts.
pub fn build_cli(config: &Config) -> Command {
    let mut cli = Command::new("sshfsmount")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A simple front-end CLI to SSHFS")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("unmount")
                .short('u')
                .long("unmount")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Unmount the volume"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Show verbose output"),
        )
        .subcommand(Command::new(ACTIVE).about("List active SSHFS processes"));

    for (name, spec) in &config.mounts {
        if name == ACTIVE {
            tracing::warn!("Mount name `{}` shadows a built-in command, skipping", name);
            continue;
        }
        cli = cli.subcommand(
            Command::new(name.clone()).about(format!("mount {} to {}", spec.remote, spec.local)),
        );
    }

    cli
}

/// Dispatch a parsed invocation.
pub async fn run(config: &Config, matches: &ArgMatches) -> Result<()> {
    let Some((name, sub)) = matches.subcommand() else {
        return Ok(());
    };

    // Global flags land on whichever level they were written at.
    let verbose = matches.get_flag("verbose") || sub.get_flag("verbose");
    let unmount = matches.get_flag("unmount") || sub.get_flag("unmount");

    if name == ACTIVE {
        return active().await;
    }

    let spec = config.mounts.get(name).ok_or_else(|| {
        SshfsmountError::Config(format!("no mount named `{}` in the config file", name))
    })?;

    let manager = MountManager::new(verbose);
    let ok = if unmount {
        manager.unmount(name, spec).await?
    } else {
        manager.mount(name, spec).await?
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// List running SSHFS processes, mirroring the listing command's exit code.
async fn active() -> Result<()> {
    let cmd = platform_commands().process_list_command();
    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&cmd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await?;

    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MountSpec;

    fn config() -> Config {
        let mut config = Config::default();
        config.mounts.insert(
            "work".to_string(),
            MountSpec {
                remote: "user@host:/srv".to_string(),
                local: "/tmp/work".to_string(),
                volname: None,
                port: None,
            },
        );
        config.mounts.insert(
            "active".to_string(),
            MountSpec {
                remote: "user@host:/other".to_string(),
                local: "/tmp/other".to_string(),
                volname: None,
                port: None,
            },
        );
        config
    }

    #[test]
    fn builds_one_subcommand_per_mount() {
        let cli = build_cli(&config());
        let names: Vec<_> = cli.get_subcommands().map(|c| c.get_name()).collect();

        assert!(names.contains(&"work"));
        // The configured "active" mount is skipped; only the built-in stays.
        assert_eq!(names.iter().filter(|n| **n == "active").count(), 1);
    }

    #[test]
    fn global_flags_parse_before_the_subcommand() {
        let matches = build_cli(&config())
            .try_get_matches_from(["sshfsmount", "-u", "-v", "work"])
            .unwrap();

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "work");
        assert!(matches.get_flag("unmount") || sub.get_flag("unmount"));
        assert!(matches.get_flag("verbose") || sub.get_flag("verbose"));
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let matches = build_cli(&config())
            .try_get_matches_from(["sshfsmount", "work", "-u"])
            .unwrap();

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "work");
        assert!(matches.get_flag("unmount") || sub.get_flag("unmount"));
        assert!(!(matches.get_flag("verbose") || sub.get_flag("verbose")));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(build_cli(&config())
            .try_get_matches_from(["sshfsmount", "nope"])
            .is_err());
    }
}
