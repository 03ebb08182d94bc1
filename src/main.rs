use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use asset_rules::hasher::{crc32_hex, digest, md5_hex};
use asset_rules::{BundlePlanner, DiskView, PatternKind, ProjectConfig, RuleSet};

#[derive(Debug, Parser)]
#[command(name = "asset-rules", version, about = "Resolve asset bundle rules for a project")]
struct Cli {
    /// Project directory containing the assets and configuration.
    #[arg(long, short, global = true, default_value = ".")]
    project: PathBuf,

    /// Rule set file, overriding the configured location.
    #[arg(long, short, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the rule set and print or write the bundle plan.
    Resolve {
        /// Write the plan JSON here instead of printing a summary.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Write the plan to the configured output path.
        #[arg(long, conflicts_with = "output")]
        write: bool,
    },
    /// Print the CRC32 and MD5 of files.
    Digest {
        /// Files to hash.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Append one rule per selected path and save the rule set.
    ApplyRule {
        /// Pattern kind: text, prefab, png, material, controller, asset, scene or directory.
        #[arg(long, short)]
        kind: PatternKind,
        /// Project-relative roots to add rules for.
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ProjectConfig::discover(&cli.project);
    if let Some(relative) = cli
        .rules
        .as_deref()
        .and_then(|path| project_relative(&cli.project, path))
    {
        config.rules_file = relative;
    }
    let rules_path = cli
        .rules
        .clone()
        .unwrap_or_else(|| config.rules_path(&cli.project));

    match cli.command {
        Command::Resolve { output, write } => {
            let rule_set = RuleSet::load_from_path(&rules_path)?;
            if rule_set.is_empty() {
                log::warn!("no rules found in {}", rules_path.display());
            }

            if let Some(relative) = output
                .as_deref()
                .and_then(|path| project_relative(&cli.project, path))
            {
                config.plan_output = relative;
            }

            let view = DiskView::new(&cli.project);
            let plan = BundlePlanner::new(&view, &config).plan(&rule_set)?;

            let target = output.or_else(|| write.then(|| config.plan_path(&cli.project)));
            match target {
                Some(path) => {
                    plan.write_to(&path)?;
                    log::info!("wrote bundle plan to {}", path.display());
                }
                None => {
                    for (bundle, members) in &plan.bundles {
                        println!("{bundle}");
                        for member in members {
                            println!("  {member}");
                        }
                    }
                    for diagnostic in &plan.diagnostics {
                        println!("warning: {diagnostic}");
                    }
                }
            }
        }
        Command::Digest { files } => {
            let mut failures = 0usize;
            for path in &files {
                let result = File::open(path)
                    .and_then(digest)
                    .with_context(|| format!("failed to read {}", path.display()));
                match result {
                    Ok(result) => println!(
                        "{} {} {}",
                        crc32_hex(result.crc32),
                        md5_hex(&result.md5),
                        path.display()
                    ),
                    Err(err) => {
                        log::error!("{err:#}");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                anyhow::bail!("{failures} of {} file(s) could not be hashed", files.len());
            }
        }
        Command::ApplyRule { kind, paths } => {
            let mut rule_set = RuleSet::load_from_path(&rules_path)?;
            let added = rule_set.apply_to_selection(&paths, kind);
            rule_set.save_to_path(&rules_path)?;
            log::info!(
                "added {added} rule(s) to {} ({} total)",
                rules_path.display(),
                rule_set.len()
            );
        }
    }

    Ok(())
}

/// `path` relative to the project directory, when it lies inside it.
fn project_relative(project: &Path, path: &Path) -> Option<String> {
    let project = std::path::absolute(project).ok()?;
    let path = std::path::absolute(path).ok()?;
    let relative = path.strip_prefix(&project).ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}
