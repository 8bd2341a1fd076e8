use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use matrix_core::time::{format_remaining, parse_tz};
use matrix_core::{
    decode_bucket, decode_quadrant, rank_tasks, PriorityCode, PriorityEngine, RecomputeReport, Scope, Task, TaskStore,
};
use matrix_ingest::{import_csv, JsonFileStore};
use std::path::PathBuf;

mod config;
mod remote;
mod state;

use config::Config;
use remote::RemoteTaskStore;

#[derive(Parser, Debug)]
#[command(
    name = "matrix",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MATRIX_BUILD_SHA"), ")"),
    about = "Priority matrix: rank tasks per timeframe into sortable priority codes"
)]
struct Cli {
    /// Task document to use instead of the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// IANA timezone for deadlines without an offset (overrides config)
    #[arg(long, global = true)]
    tz: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    Day,
    Week,
    Month,
    All,
}

impl ScopeArg {
    fn scopes(self) -> Vec<Scope> {
        match self {
            ScopeArg::Day => vec![Scope::Day],
            ScopeArg::Week => vec![Scope::Week],
            ScopeArg::Month => vec![Scope::Month],
            ScopeArg::All => Scope::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute and store priority codes for a timeframe
    Recompute {
        #[arg(long, value_enum, default_value_t = ScopeArg::Day)]
        scope: ScopeArg,
    },

    /// List a timeframe's tasks, highest priority first
    Show {
        #[arg(long, value_enum, default_value_t = ScopeArg::Day)]
        scope: ScopeArg,

        /// Rank without storing the new codes
        #[arg(long)]
        preview: bool,
    },

    /// Decode stored priority codes
    Decode {
        #[arg(required = true)]
        codes: Vec<u32>,
    },

    /// Import tasks from a CSV export (id,name,timeframe,quadrant,end_date,units,completed)
    Import {
        #[arg(long)]
        csv: PathBuf,
    },

    /// Work directly against the dashboard backend
    Remote {
        #[command(subcommand)]
        command: RemoteCommand,
    },

    /// Manage ~/.matrix/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RemoteCommand {
    /// Fetch tasks, rank a timeframe and write codes back over HTTP
    Recompute {
        #[arg(long, value_enum, default_value_t = ScopeArg::Day)]
        scope: ScopeArg,

        /// Backend root URL (overrides config)
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let timezone = cli.tz.clone().unwrap_or_else(|| cfg.time.timezone.clone());
    parse_tz(&timezone)?;

    match cli.command {
        Command::Recompute { scope } => {
            let store = open_store(&cli.store, &cfg, &timezone)?;
            recompute_local(store, scope)?;
        }

        Command::Show { scope, preview } => {
            let store = open_store(&cli.store, &cfg, &timezone)?;
            show(&store, scope, preview)?;
        }

        Command::Decode { codes } => {
            for code in codes {
                print_decoded(code);
            }
        }

        Command::Import { csv } => {
            if !csv.exists() {
                bail!("CSV not found: {}", csv.display());
            }
            let mut store = open_store(&cli.store, &cfg, &timezone)?;
            let summary = import_csv(&csv, &mut store)
                .with_context(|| format!("importing {}", csv.display()))?;
            store.flush()?;
            println!(
                "Imported {} tasks into {} (added {}, updated {}, skipped {})",
                summary.added + summary.updated,
                store.path().display(),
                summary.added,
                summary.updated,
                summary.skipped
            );
        }

        Command::Remote { command } => match command {
            RemoteCommand::Recompute { scope, base_url } => {
                let base = base_url.unwrap_or_else(|| cfg.api.base_url.clone());
                let remote = RemoteTaskStore::new(base, cfg.api_token()?);
                let mut failed = 0;
                for report in remote.recompute_scopes(&scope.scopes(), &timezone).await? {
                    print_report(&report);
                    failed += report.failures.len();
                }
                if failed > 0 {
                    bail!("{failed} priority code(s) were not stored");
                }
            }
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn open_store(flag: &Option<PathBuf>, cfg: &Config, timezone: &str) -> Result<JsonFileStore> {
    let path = match flag {
        Some(p) => p.clone(),
        None => cfg.store_path()?,
    };
    JsonFileStore::open(&path, timezone)
}

fn recompute_local(store: JsonFileStore, scope: ScopeArg) -> Result<()> {
    let mut engine = PriorityEngine::new(store);
    let mut failed = 0;
    for s in scope.scopes() {
        let report = engine.recompute_scope(s)?;
        print_report(&report);
        failed += report.failures.len();
    }

    // Codes that did persist are kept even if some writes failed.
    let mut store = engine.into_store();
    store.flush()?;

    if failed > 0 {
        bail!("{failed} priority code(s) were not stored");
    }
    Ok(())
}

fn show(store: &JsonFileStore, scope: ScopeArg, preview: bool) -> Result<()> {
    let now = Utc::now();

    for s in scope.scopes() {
        let listed = store.list_tasks_in_scope(s)?;
        let mut tasks = if preview { rank_tasks(listed) } else { listed };
        tasks.sort_by(|a, b| b.priority_code.cmp(&a.priority_code));

        println!("## {} ({} tasks)\n", s, tasks.len());
        for t in &tasks {
            print_task_line(t, now);
        }
        println!();
    }
    Ok(())
}

fn print_task_line(t: &Task, now: chrono::DateTime<Utc>) {
    let code = t
        .priority_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "---".to_string());
    let bucket = t.priority_code.map(|c| c.bucket()).unwrap_or(t.bucket);
    let left = t
        .deadline
        .map(|d| format_remaining(d, now))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "- [{}] {:<10} | {} | remaining={} | {}% | due in {}",
        code,
        bucket,
        t.title,
        t.remaining_units(),
        t.progress_percent(),
        left
    );
}

fn print_report(report: &RecomputeReport) {
    println!("## {}: {} tasks ranked\n", report.scope, report.codes.len());
    for (id, code) in report.ordered() {
        println!(
            "- {} {:<10} t={} u={} | {}",
            code,
            code.bucket(),
            code.time_rank(),
            code.unit_rank(),
            id
        );
    }
    for f in &report.failures {
        println!("! not stored: {} ({})", f.task_id, f.reason);
    }
    println!();
}

fn print_decoded(raw: u32) {
    let code = PriorityCode::from_raw(raw);
    println!(
        "{} -> quadrant={} ({}) time_rank={} unit_rank={}",
        raw,
        decode_quadrant(raw),
        decode_bucket(raw),
        code.time_rank(),
        code.unit_rank()
    );
}
