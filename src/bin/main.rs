//! joinwise CLI - infer table links and compile product specs to SQL
//!
//! Usage:
//!   joinwise resolve <catalog.json> [--previous <links.json>]
//!   joinwise plan <catalog.json> <spec.json> [--links <links.json>] [--output sql|plan|both]
//!
//! Examples:
//!   joinwise resolve data/catalog.json > links.json
//!   joinwise plan data/catalog.json orders_by_customer.json --links links.json
//!   JOINWISE_LOG=debug joinwise plan data/catalog.json spec.json --output plan

use clap::{Parser, Subcommand, ValueEnum};
use joinwise::config::Settings;
use joinwise::metadata::{Catalog, InMemoryOracle, MetadataStore};
use joinwise::semantic::inference::{resolve_all, LinkSet};
use joinwise::semantic::planner::{ProductSpec, QueryPlanner};
use joinwise::semantic::RelationshipGraph;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "JOINWISE_LOG";

#[derive(Parser)]
#[command(name = "joinwise")]
#[command(about = "Infer relationships between tables and compile field requests to SQL")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $JOINWISE_CONFIG, ./joinwise.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer keys and links for every table in a catalog
    Resolve {
        /// Path to the catalog JSON file
        catalog: PathBuf,

        /// A previous link set; returned unchanged if the catalog has not changed
        #[arg(short, long)]
        previous: Option<PathBuf>,
    },

    /// Compile a product spec against a catalog
    Plan {
        /// Path to the catalog JSON file
        catalog: PathBuf,

        /// Path to the product spec JSON file
        spec: PathBuf,

        /// Use a resolved link set instead of resolving again
        #[arg(short, long)]
        links: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output the query plan as JSON
    Plan,
    /// Output plan and SQL as one JSON document
    Both,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Resolve { catalog, previous } => cmd_resolve(&settings, catalog, previous),
        Commands::Plan {
            catalog,
            spec,
            links,
            output,
        } => cmd_plan(&settings, catalog, spec, links, output),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_resolve(settings: &Settings, catalog: PathBuf, previous: Option<PathBuf>) -> ExitCode {
    let Some((store, oracle)) = load_catalog(&catalog) else {
        return ExitCode::FAILURE;
    };
    let previous = match previous.as_deref().map(load_links).transpose() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let links = match resolve_all(&store, &oracle, &settings.inference_config(), previous.as_ref()) {
        Ok(links) => links,
        Err(e) => {
            eprintln!("Error resolving links: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_json(&links)
}

fn cmd_plan(
    settings: &Settings,
    catalog: PathBuf,
    spec: PathBuf,
    links: Option<PathBuf>,
    output: OutputFormat,
) -> ExitCode {
    let Some((store, oracle)) = load_catalog(&catalog) else {
        return ExitCode::FAILURE;
    };

    let spec: ProductSpec = match fs::read_to_string(&spec)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Error reading product spec '{}': {}", spec.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let links = match links.as_deref().map(load_links).transpose() {
        Ok(Some(links)) => links,
        Ok(None) => match resolve_all(&store, &oracle, &settings.inference_config(), None) {
            Ok(links) => links,
            Err(e) => {
                eprintln!("Error resolving links: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let graph = RelationshipGraph::from_link_set(&store, &links);
    let planner = QueryPlanner::new(&store, &graph, settings.planner_config());
    let compiled = match planner.compile(&spec) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("Error planning '{}': {}", spec.name, e);
            return ExitCode::FAILURE;
        }
    };

    match output {
        OutputFormat::Sql => {
            println!("{}", compiled.sql);
            ExitCode::SUCCESS
        }
        OutputFormat::Plan => print_json(&compiled.plan),
        OutputFormat::Both => print_json(&compiled),
    }
}

fn load_catalog(path: &Path) -> Option<(MetadataStore, InMemoryOracle)> {
    match Catalog::from_file(path).and_then(Catalog::into_parts) {
        Ok(parts) => Some(parts),
        Err(e) => {
            eprintln!("Error loading catalog '{}': {}", path.display(), e);
            None
        }
    }
}

fn load_links(path: &Path) -> Result<LinkSet, String> {
    fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
        .map_err(|e| format!("Error reading links '{}': {}", path.display(), e))
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}
