// # ipamctl - IPAM sync command line
//
// This binary is a THIN integration layer:
// - Parses arguments (every flag can also come from an `IPAM_*` variable)
// - Initializes tracing and the runtime
// - Calls into ipam-core and formats the result
//
// All merge, registry and cleanup logic lives in ipam-core.
//
// ## Commands
//
// - `list [--entity <substr>] [--format table|json|yaml]`
// - `find <entity> [--format table|json]`
// - `cleanup <ids...> [--output <file>] [--dry-run] [--quiet]`
// - `remove <id>`
// - `validate <id>`
// - `merge <env> [--source-dir <dir>] [--strategy <s>] [--dry-run] [--no-backup] [--report <file>]`
//
// ## Environment
//
// - `IPAM_CONFIG_PATH`: Directory holding the category files (default `.`)
// - `IPAM_LOG_LEVEL`: trace, debug, info, warn, error (default `warn`)
// - `IPAM_STRICT`: Reject duplicate BackstageIds
// - `IPAM_ROOT`: Repository root for `merge` (default `.`)
//
// ## Example
//
// ```bash
// ipamctl --config-path live/dev/configs find my-app
// ipamctl merge dev --source-dir staging --strategy manual-protected --dry-run
// ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use ipam_core::engine::FileOutcome;
use ipam_core::identifier::{BackstageId, EXPECTED_FORMAT};
use ipam_core::{
    CategoryFileNames, Environment, FileDocumentStore, MergeEngine, MergeReport, MergeStrategy,
    ResourceManager, ResourceSummary, SyncConfig,
};

/// Default report file name, relative to the repository root
const DEFAULT_REPORT_FILE: &str = "backstage-merge-report.md";

/// Exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpamExitCode {
    /// Command succeeded
    Success = 0,
    /// Command ran and failed (invalid id, missing resource, merge failure)
    Failure = 1,
    /// Bad flags or environment
    ConfigError = 2,
}

impl From<IpamExitCode> for ExitCode {
    fn from(code: IpamExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Manage Backstage-generated IPAM resources
#[derive(Parser, Debug)]
#[command(name = "ipamctl", author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the category files
    #[arg(short = 'p', long, env = "IPAM_CONFIG_PATH", default_value = ".", global = true)]
    config_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "IPAM_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Fail when a BackstageId appears more than once
    #[arg(long, env = "IPAM_STRICT", global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List Backstage-managed resources
    List {
        /// Only entities whose name contains this text
        #[arg(short, long)]
        entity: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },

    /// Show the resources of one entity
    Find {
        /// Exact entity name
        entity_name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = FindFormat::Table)]
        format: FindFormat,
    },

    /// Plan the removal of resources
    Cleanup {
        /// BackstageIds to remove
        #[arg(required = true)]
        backstage_ids: Vec<String>,

        /// Write the plan as YAML to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only show what would be removed; nothing is written
        #[arg(long)]
        dry_run: bool,

        /// Print nothing but errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Remove a resource from its config file
    Remove {
        /// BackstageId of the resource
        backstage_id: String,
    },

    /// Check the format of a BackstageId
    Validate {
        /// BackstageId to check
        backstage_id: String,
    },

    /// Merge staging output into an environment
    Merge {
        /// Target environment
        environment: Environment,

        /// Repository root holding live/ and backups/
        #[arg(short, long, env = "IPAM_ROOT", default_value = ".")]
        root: PathBuf,

        /// Directory with the generated category files
        #[arg(short, long, default_value = ".")]
        source_dir: PathBuf,

        /// Conflict resolution strategy
        #[arg(short = 't', long, env = "IPAM_MERGE_STRATEGY", default_value = "backstage-wins")]
        strategy: MergeStrategy,

        /// Resolve and report without writing
        #[arg(short, long)]
        dry_run: bool,

        /// Skip the pre-merge backup
        #[arg(long)]
        no_backup: bool,

        /// Report file (default: <root>/backstage-merge-report.md)
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListFormat {
    Table,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FindFormat {
    Table,
    Json,
}

fn main() -> ExitCode {
    let Cli {
        config_path,
        log_level,
        strict,
        command,
    } = Cli::parse();

    let log_level = match parse_log_level(&log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return IpamExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IpamExitCode::ConfigError.into();
    }

    let Some(command) = command else {
        let _ = Cli::command().print_help();
        return IpamExitCode::Failure.into();
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpamExitCode::Failure.into();
        }
    };

    let result = rt.block_on(run(command, &config_path, strict));

    match result {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            IpamExitCode::Failure.into()
        }
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "IPAM_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

async fn run(command: Commands, config_path: &Path, strict: bool) -> Result<IpamExitCode> {
    match command {
        Commands::Validate { backstage_id } => Ok(validate(&backstage_id)),
        Commands::Merge {
            environment,
            root,
            source_dir,
            strategy,
            dry_run,
            no_backup,
            report,
        } => {
            let mut config = SyncConfig::new(root, environment).with_strategy(strategy);
            config.merge.backup = !no_backup;
            config.merge.dry_run = dry_run;
            config.merge.report_path =
                Some(report.unwrap_or_else(|| config.root_path.join(DEFAULT_REPORT_FILE)));
            config.registry.strict = strict;
            merge(config, &source_dir).await
        }
        command => {
            let mut manager = ResourceManager::load(
                FileDocumentStore::new(),
                config_path,
                CategoryFileNames::default(),
                strict,
            )
            .await
            .with_context(|| format!("Failed to load resources from {}", config_path.display()))?;
            manage(command, &mut manager).await
        }
    }
}

async fn manage(
    command: Commands,
    manager: &mut ResourceManager<FileDocumentStore>,
) -> Result<IpamExitCode> {
    match command {
        Commands::List { entity, format } => {
            let resources = manager.list(entity.as_deref());
            match format {
                ListFormat::Table => print!("{}", render_table(&resources)),
                ListFormat::Json => println!("{}", serde_json::to_string_pretty(&resources)?),
                ListFormat::Yaml => print!("{}", serde_yaml::to_string(&resources)?),
            }
            Ok(IpamExitCode::Success)
        }

        Commands::Find {
            entity_name,
            format,
        } => {
            let resources = manager.find_by_entity(&entity_name);
            match format {
                FindFormat::Table => print!("{}", render_entity(&entity_name, &resources)),
                FindFormat::Json => println!("{}", serde_json::to_string_pretty(&resources)?),
            }
            Ok(IpamExitCode::Success)
        }

        Commands::Cleanup {
            backstage_ids,
            output,
            dry_run,
            quiet,
        } => {
            let plan = manager.cleanup_plan(backstage_ids.as_slice());
            let yaml = serde_yaml::to_string(&plan)?;

            if dry_run {
                if !quiet {
                    println!("🔍 Dry run - showing what would be removed:");
                    print!("{}", yaml);
                }
            } else if let Some(path) = output {
                tokio::fs::write(&path, &yaml)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !quiet {
                    println!("Cleanup plan written to {}", path.display());
                }
            } else if !quiet {
                print!("{}", yaml);
            }

            if plan.len() < backstage_ids.len() && !quiet {
                eprintln!(
                    "{} of {} BackstageId(s) not found",
                    backstage_ids.len() - plan.len(),
                    backstage_ids.len()
                );
            }
            Ok(IpamExitCode::Success)
        }

        Commands::Remove { backstage_id } => match manager.remove(&backstage_id).await {
            Ok(removed) => {
                println!(
                    "✅ Removed {} ('{}' from {})",
                    removed.backstage_id,
                    removed.resource_key,
                    removed.path.display()
                );
                Ok(IpamExitCode::Success)
            }
            Err(e) if e.is_not_found() => {
                eprintln!("❌ {}", e);
                Ok(IpamExitCode::Failure)
            }
            Err(e) => Err(e.into()),
        },

        Commands::Validate { .. } | Commands::Merge { .. } => {
            anyhow::bail!("command does not operate on a config directory")
        }
    }
}

fn validate(backstage_id: &str) -> IpamExitCode {
    match BackstageId::parse(backstage_id) {
        Ok(id) => {
            println!("✅ Valid BackstageId: {}", id);
            println!("   Entity: {}", id.entity());
            println!("   Environment: {}", id.environment());
            println!("   Timestamp: {}", id.timestamp());
            IpamExitCode::Success
        }
        Err(_) => {
            println!("❌ Invalid BackstageId: {}", backstage_id);
            println!("Expected format: {}", EXPECTED_FORMAT);
            IpamExitCode::Failure
        }
    }
}

async fn merge(config: SyncConfig, source_dir: &Path) -> Result<IpamExitCode> {
    let dry_run = config.merge.dry_run;
    let report_path = config.merge.report_path.clone();

    let engine = MergeEngine::new(FileDocumentStore::new(), config)?;
    let report = engine
        .run(source_dir)
        .await
        .context("Merge aborted")?;

    for file in &report.files {
        info!("{}: {:?}", file.file_name, file.outcome);
    }

    let report_path = if dry_run { None } else { report_path };
    print!("{}", render_merge_summary(&report, report_path.as_deref()));

    let merged = report
        .files
        .iter()
        .filter(|f| matches!(f.outcome, FileOutcome::Merged(_)))
        .count();

    match report.ensure_success() {
        Ok(()) => {
            println!("✅ Merge completed: {} file(s) merged", merged);
            Ok(IpamExitCode::Success)
        }
        Err(e) => {
            eprintln!("❌ Merge failed: {}", e);
            for conflict in report.files.iter().flat_map(|f| f.outcome.conflicts()) {
                eprintln!("  - {}", conflict);
            }
            Ok(IpamExitCode::Failure)
        }
    }
}

/// Operator output after a merge: where the report went, then the report
fn render_merge_summary(report: &MergeReport, written_to: Option<&Path>) -> String {
    let mut out = String::new();
    if let Some(path) = written_to {
        out.push_str(&format!("Merge report written to {}\n", path.display()));
    }
    out.push_str(&"=".repeat(60));
    out.push('\n');
    out.push_str(&report.render());
    out
}

fn render_table(resources: &[ResourceSummary]) -> String {
    if resources.is_empty() {
        return "No Backstage-managed resources found.\n".to_string();
    }

    let mut out = format!(
        "{:<40} {:<20} {:<30} {:<10} {:<15}\n",
        "Backstage ID", "Entity", "Resource", "Type", "Owner"
    );
    out.push_str(&"-".repeat(120));
    out.push('\n');

    for r in resources {
        out.push_str(&format!(
            "{:<40} {:<20} {:<30} {:<10} {:<15}\n",
            r.backstage_id,
            r.entity_name.as_deref().unwrap_or("N/A"),
            r.resource_name,
            r.record_type.as_str(),
            r.owner.as_deref().unwrap_or("N/A")
        ));
    }
    out
}

fn render_entity(entity_name: &str, resources: &[ResourceSummary]) -> String {
    if resources.is_empty() {
        return format!("No resources found for entity '{}'\n", entity_name);
    }

    let mut out = format!("Resources for entity '{}':\n", entity_name);
    for r in resources {
        out.push_str(&format!(
            "  - {} ({})\n",
            r.backstage_id,
            r.record_type.as_str()
        ));
    }
    out
}
