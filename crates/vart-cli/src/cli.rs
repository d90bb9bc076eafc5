use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vart_sdk::Version;

#[derive(Parser)]
#[command(
    name = "vart",
    about = "vart: versioned artifacts with aliases and weighted rollouts",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the local object store.
    #[arg(long, global = true, default_value = ".vart")]
    pub root: PathBuf,

    /// Repository settings (TOML). Defaults to `<root>/vart.toml` if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a file as the LATEST version of an artifact
    Put(PutArgs),
    /// Show one version's record
    Get(VersionArgs),
    /// Write one version's content to stdout or a file
    Cat(CatArgs),
    /// List live versions, LATEST first
    Versions(NameArgs),
    /// Snapshot LATEST as the next numbered version
    Publish(NameArgs),
    /// Delete one version
    Delete(VersionArgs),
    /// List artifact names
    Names,
    /// Manage aliases
    Alias(AliasArgs),
    /// Resolve an alias with a weighted draw and output the chosen content
    Resolve(ResolveArgs),
    /// Remove old versions by retention policy
    Purge(PurgeArgs),
    /// Remove an artifact with all versions and aliases
    PurgeArtifact(NameArgs),
    /// Remove everything in the repository
    PurgeAll(PurgeAllArgs),
}

#[derive(Args)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub name: String,
    pub file: PathBuf,
    #[arg(long)]
    pub content_type: Option<String>,
    /// Object metadata, KEY=VALUE (repeatable)
    #[arg(long = "meta", value_parser = parse_key_value)]
    pub metadata: Vec<(String, String)>,
    /// Object tag, KEY=VALUE (repeatable)
    #[arg(long = "tag", value_parser = parse_key_value)]
    pub tags: Vec<(String, String)>,
}

#[derive(Args)]
pub struct VersionArgs {
    pub name: String,
    /// Version number or LATEST
    #[arg(long = "version")]
    pub version: Option<Version>,
}

#[derive(Args)]
pub struct CatArgs {
    pub name: String,
    #[arg(long = "version")]
    pub version: Option<Version>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct AliasArgs {
    #[command(subcommand)]
    pub action: AliasAction,
}

#[derive(Subcommand)]
pub enum AliasAction {
    /// Create or replace an alias
    Set {
        name: String,
        alias: String,
        version: Version,
        #[arg(long, requires = "weight")]
        secondary: Option<Version>,
        /// Percentage of draws that pick the secondary version (0..=99)
        #[arg(long)]
        weight: Option<u32>,
    },
    Get {
        name: String,
        alias: String,
    },
    List {
        name: String,
    },
    Rm {
        name: String,
        alias: String,
    },
}

#[derive(Args)]
pub struct ResolveArgs {
    pub name: String,
    pub alias: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PurgeArgs {
    pub name: String,
    /// Numbered versions always kept, newest first
    #[arg(long, default_value = "10")]
    pub keep: usize,
    /// Only versions older than this many days are removed
    #[arg(long, default_value = "90")]
    pub older_than_days: i64,
}

#[derive(Args)]
pub struct PurgeAllArgs {
    /// Required; there is no undo
    #[arg(long)]
    pub yes: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_put_with_metadata() {
        let cli = Cli::try_parse_from([
            "vart", "put", "app", "build.zip", "--meta", "commit=abc", "--tag", "team=core",
        ])
        .unwrap();
        if let Command::Put(args) = cli.command {
            assert_eq!(args.name, "app");
            assert_eq!(args.metadata, vec![("commit".into(), "abc".into())]);
            assert_eq!(args.tags, vec![("team".into(), "core".into())]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn bad_key_value_is_rejected() {
        assert!(Cli::try_parse_from(["vart", "put", "app", "f", "--meta", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["vart", "put", "app", "f", "--meta", "=x"]).is_err());
    }

    #[test]
    fn parse_versions() {
        let cli = Cli::try_parse_from(["vart", "get", "app", "--version", "3"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.version, Some(Version::Number(3)));
        } else {
            panic!("wrong command");
        }
        let cli = Cli::try_parse_from(["vart", "cat", "app", "--version", "LATEST"]).unwrap();
        if let Command::Cat(args) = cli.command {
            assert_eq!(args.version, Some(Version::Latest));
        } else {
            panic!("wrong command");
        }
        assert!(Cli::try_parse_from(["vart", "get", "app", "--version", "0"]).is_err());
    }

    #[test]
    fn parse_alias_set_with_secondary() {
        let cli = Cli::try_parse_from([
            "vart", "alias", "set", "app", "prod", "1", "--secondary", "2", "--weight", "20",
        ])
        .unwrap();
        if let Command::Alias(AliasArgs {
            action:
                AliasAction::Set {
                    version,
                    secondary,
                    weight,
                    ..
                },
        }) = cli.command
        {
            assert_eq!(version, Version::Number(1));
            assert_eq!(secondary, Some(Version::Number(2)));
            assert_eq!(weight, Some(20));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn secondary_requires_weight() {
        assert!(
            Cli::try_parse_from(["vart", "alias", "set", "app", "prod", "1", "--secondary", "2"])
                .is_err()
        );
    }

    #[test]
    fn parse_purge_defaults() {
        let cli = Cli::try_parse_from(["vart", "purge", "app"]).unwrap();
        if let Command::Purge(args) = cli.command {
            assert_eq!(args.keep, 10);
            assert_eq!(args.older_than_days, 90);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "vart", "names", "--root", "/tmp/r", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("/tmp/r"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Names));
    }

    #[test]
    fn parse_purge_artifact_kebab_case() {
        let cli = Cli::try_parse_from(["vart", "purge-artifact", "app"]).unwrap();
        assert!(matches!(cli.command, Command::PurgeArtifact(_)));
    }
}
