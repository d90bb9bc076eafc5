use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use vart_sdk::{
    Alias, AliasTarget, Artifact, PurgeReport, PutOptions, Repository, RepositoryBuilder,
    RepositoryConfig, RetentionPolicy,
};
use vart_store::LocalObjectStore;

use crate::cli::*;

/// Settings file looked up under `--root` when `--config` is not given.
const CONFIG_FILE: &str = "vart.toml";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let repo = open_repository(&cli.root, cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(repo.as_ref(), cli.command, cli.format, &mut out)
}

pub fn open_repository(root: &Path, config: Option<&Path>) -> anyhow::Result<Box<dyn Repository>> {
    let config = match config {
        Some(path) => RepositoryConfig::load(path)?,
        None => {
            let default = root.join(CONFIG_FILE);
            if default.is_file() {
                RepositoryConfig::load(&default)?
            } else {
                RepositoryConfig::default()
            }
        }
    };
    debug!(root = %root.display(), prefix = %config.prefix, "opening repository");
    let store = LocalObjectStore::open(root)
        .with_context(|| format!("opening store at {}", root.display()))?;
    Ok(RepositoryBuilder::new(Arc::new(store)).config(config).build()?)
}

pub fn execute(
    repo: &dyn Repository,
    command: Command,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Put(args) => cmd_put(repo, args, format, out),
        Command::Get(args) => {
            let artifact = repo.get_artifact_version(&args.name, args.version)?;
            print_artifacts(std::slice::from_ref(&artifact), format, out)
        }
        Command::Cat(args) => {
            let bytes = repo.get_artifact_content(&args.name, args.version)?;
            write_payload(&bytes, args.output.as_deref(), out)
        }
        Command::Versions(args) => {
            print_artifacts(&repo.list_artifact_versions(&args.name)?, format, out)
        }
        Command::Publish(args) => {
            let artifact = repo.publish_artifact_version(&args.name)?;
            if format == OutputFormat::Text {
                write!(out, "{} Published ", "✓".green().bold())?;
            }
            print_artifacts(std::slice::from_ref(&artifact), format, out)
        }
        Command::Delete(args) => {
            let version = args.version.unwrap_or_default();
            repo.delete_artifact_version(&args.name, Some(version))?;
            let how = if repo.supports_soft_delete() {
                "soft-deleted"
            } else {
                "deleted permanently"
            };
            report(out, format, json!({ "name": args.name, "version": version, "deleted": how }), || {
                format!("{} {}@{} {how}", "✓".green(), args.name.bold(), version)
            })
        }
        Command::Names => {
            let names = repo.list_artifact_names()?;
            match format {
                OutputFormat::Json => write_json(out, &names),
                OutputFormat::Text => {
                    for name in names {
                        writeln!(out, "{name}")?;
                    }
                    Ok(())
                }
            }
        }
        Command::Alias(args) => cmd_alias(repo, args.action, format, out),
        Command::Resolve(args) => {
            let content = repo.get_alias_content(&args.name, &args.alias)?;
            debug!(name = %args.name, alias = %args.alias, version = %content.version, "resolved alias");
            write_payload(&content.bytes, args.output.as_deref(), out)
        }
        Command::Purge(args) => {
            let policy =
                RetentionPolicy::new(args.keep, chrono::Duration::days(args.older_than_days));
            let report = repo.purge_artifact_versions(&args.name, &policy)?;
            print_purge(&report, format, out)
        }
        Command::PurgeArtifact(args) => {
            repo.purge_artifact(&args.name)?;
            report(out, format, json!({ "purged": args.name }), || {
                format!("{} Purged {}", "✓".green(), args.name.bold())
            })
        }
        Command::PurgeAll(args) => {
            if !args.yes {
                bail!("refusing to purge the whole repository without --yes");
            }
            repo.purge_all()?;
            report(out, format, json!({ "purged": "all" }), || {
                format!("{} Repository purged", "✓".green().bold())
            })
        }
    }
}

fn cmd_put(
    repo: &dyn Repository,
    args: PutArgs,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let content =
        fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let mut options = PutOptions::new();
    if let Some(content_type) = args.content_type {
        options = options.with_content_type(content_type);
    }
    for (key, value) in args.metadata {
        options = options.with_metadata(key, value);
    }
    for (key, value) in args.tags {
        options = options.with_tag(key, value);
    }
    let artifact = repo.put_artifact(&args.name, &content, &options)?;
    print_artifacts(std::slice::from_ref(&artifact), format, out)
}

fn cmd_alias(
    repo: &dyn Repository,
    action: AliasAction,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match action {
        AliasAction::Set {
            name,
            alias,
            version,
            secondary,
            weight,
        } => {
            let target = AliasTarget {
                version,
                secondary_version: secondary,
                secondary_version_weight: weight,
            };
            let written = repo.put_alias(&name, &alias, &target)?;
            print_aliases(std::slice::from_ref(&written), format, out)
        }
        AliasAction::Get { name, alias } => {
            let found = repo.get_alias(&name, &alias)?;
            print_aliases(std::slice::from_ref(&found), format, out)
        }
        AliasAction::List { name } => print_aliases(&repo.list_aliases(&name)?, format, out),
        AliasAction::Rm { name, alias } => {
            repo.delete_alias(&name, &alias)?;
            report(out, format, json!({ "name": name, "alias": alias, "deleted": true }), || {
                format!("{} Removed alias {}:{}", "✓".green(), name.bold(), alias.yellow())
            })
        }
    }
}

// ---- Output ----

fn write_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn report(
    out: &mut dyn Write,
    format: OutputFormat,
    value: serde_json::Value,
    text: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(out, &value),
        OutputFormat::Text => {
            writeln!(out, "{}", text())?;
            Ok(())
        }
    }
}

fn write_payload(bytes: &[u8], path: Option<&Path>, out: &mut dyn Write) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
            writeln!(out, "{} Wrote {} bytes to {}", "✓".green(), bytes.len(), path.display())?;
        }
        None => out.write_all(bytes)?,
    }
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

fn print_artifacts(
    artifacts: &[Artifact],
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, artifacts);
    }
    if artifacts.is_empty() {
        writeln!(out, "No versions.")?;
    }
    for a in artifacts {
        writeln!(
            out,
            "{}@{}  {}  {}  {}",
            a.name.bold(),
            a.version.to_string().yellow(),
            a.updated_at.format("%Y-%m-%d %H:%M:%S"),
            short_hash(&a.content_hash).dimmed(),
            a.locator
        )?;
    }
    Ok(())
}

fn print_aliases(aliases: &[Alias], format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, aliases);
    }
    if aliases.is_empty() {
        writeln!(out, "No aliases.")?;
    }
    for a in aliases {
        let split = match (a.secondary_version, a.secondary_version_weight) {
            (Some(secondary), Some(weight)) => format!(
                "{} ({}%) / {} ({}%)",
                a.version,
                a.primary_weight(),
                secondary,
                weight
            ),
            _ => a.version.to_string(),
        };
        writeln!(out, "{}:{} -> {}", a.name.bold(), a.alias.yellow(), split.cyan())?;
    }
    Ok(())
}

fn print_purge(report: &PurgeReport, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, report);
    }
    writeln!(
        out,
        "{} Purged {} version(s) older than {}",
        "✓".green(),
        report.purged.len(),
        report.cutoff.format("%Y-%m-%d %H:%M:%S")
    )?;
    for a in &report.purged {
        writeln!(out, "  {}@{}", a.name, a.version)?;
    }
    Ok(())
}
