//! Agira operator CLI.
//!
//! Renders reports into the configured report store and inspects agent cache
//! keys and configuration.
//!
//! Usage:
//!   agira render --key change.v1 --object-type change --object-id 42 --context ctx.json
//!   agira list-reports
//!   agira cache-key --agent summarizer --input "text" --version 2
//!   agira cache-config --definition agent.json
//!   agira headers --path /embed/issues/
//!
//! Every command accepts `--config agira.toml`; `AGIRA_REDIS_*` variables
//! override the file.

use std::{
    fs,
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use agira_cache::{build_cache_key, parse_cache_config, AgentCacheService};
use agira_contracts::{
    cache::DEFAULT_AGENT_VERSION,
    config::AgiraConfig,
    error::{AgiraError, AgiraResult},
    report::ReportContext,
};
use agira_core::{
    pipeline::{Pipeline, Request, Response},
    ReportService,
};
use agira_reports::{default_registry, FsFileStore, JsonlReportRepository};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "agira", about = "Agira report generation and agent cache tools")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a report, store the PDF and append its row to the index.
    Render {
        #[arg(long)]
        key: String,
        #[arg(long)]
        object_type: String,
        #[arg(long)]
        object_id: String,
        /// JSON file holding the report context object.
        #[arg(long)]
        context: PathBuf,
        #[arg(long)]
        created_by: Option<String>,
        /// JSON file with extra metadata stored on the row.
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// List registered report keys.
    ListReports,
    /// Print the cache key for an agent invocation.
    CacheKey {
        #[arg(long)]
        agent: String,
        #[arg(long)]
        input: String,
        #[arg(long, default_value_t = DEFAULT_AGENT_VERSION)]
        version: u32,
    },
    /// Show the effective cache config of an agent definition and whether
    /// the configured cache would serve it.
    CacheConfig {
        #[arg(long)]
        definition: PathBuf,
    },
    /// Print the response headers the configured middleware pipeline sets
    /// for a request path.
    Headers {
        #[arg(long)]
        path: String,
        #[arg(long, default_value = "GET")]
        method: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Render {
            key,
            object_type,
            object_id,
            context,
            created_by,
            metadata,
        } => run_render(
            &config,
            &key,
            &object_type,
            &object_id,
            &context,
            created_by.as_deref(),
            metadata.as_deref(),
        ),
        Command::ListReports => run_list_reports(),
        Command::CacheKey {
            agent,
            input,
            version,
        } => {
            println!("{}", build_cache_key(&agent, &input, version));
            Ok(())
        }
        Command::CacheConfig { definition } => run_cache_config(&config, &definition),
        Command::Headers { path, method } => run_headers(&config, &method, &path),
    });

    if let Err(e) = result {
        if e.is_report_failure() {
            eprintln!("{}", e.user_message());
            debug!(error = %e, "report failure detail");
        } else {
            eprintln!("agira: {}", e);
        }
        process::exit(1);
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> AgiraResult<AgiraConfig> {
    let mut config = match path {
        Some(path) => AgiraConfig::from_file(path)?,
        None => AgiraConfig::default(),
    };
    config.apply_env_overrides()?;

    // Unknown middleware names fail at startup, whatever the command.
    let pipeline = Pipeline::from_names(config.pipeline.order.as_slice())?;
    debug!(middleware = ?pipeline.names(), "pipeline order validated");
    Ok(config)
}

/// Read a JSON file, wrapping any failure with `error`.
fn read_json(path: &Path, error: fn(String) -> AgiraError) -> AgiraResult<Value> {
    let text = fs::read_to_string(path)
        .map_err(|e| error(format!("cannot read '{}': {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| error(format!("'{}' is not valid JSON: {}", path.display(), e)))
}

fn invalid_context(reason: String) -> AgiraError {
    AgiraError::InvalidContext { reason }
}

fn config_error(reason: String) -> AgiraError {
    AgiraError::ConfigError { reason }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_render(
    config: &AgiraConfig,
    key: &str,
    object_type: &str,
    object_id: &str,
    context_path: &Path,
    created_by: Option<&str>,
    metadata_path: Option<&Path>,
) -> AgiraResult<()> {
    let context: ReportContext = match read_json(context_path, invalid_context)? {
        Value::Object(map) => map,
        _ => {
            return Err(AgiraError::InvalidContext {
                reason: format!("'{}' must hold a JSON object", context_path.display()),
            })
        }
    };
    let metadata = metadata_path
        .map(|path| read_json(path, invalid_context))
        .transpose()?;

    let service = ReportService::new(
        default_registry()?,
        Arc::new(FsFileStore::new(&config.reports.storage_dir)),
        Arc::new(JsonlReportRepository::new(&config.reports.index_file)),
    );

    let document =
        service.generate_and_store(key, object_type, object_id, &context, created_by, metadata.as_ref())?;

    println!("id:        {}", document.id);
    println!("file:      {}", document.file_path);
    println!("sha256:    {}", document.sha256);
    println!("size:      {} bytes", document.size_bytes);
    Ok(())
}

fn run_list_reports() -> AgiraResult<()> {
    for key in default_registry()?.list() {
        println!("{}", key);
    }
    Ok(())
}

fn run_cache_config(config: &AgiraConfig, definition_path: &Path) -> AgiraResult<()> {
    let definition = read_json(definition_path, config_error)?;
    let agent_config = parse_cache_config(&definition);
    let service = AgentCacheService::connect(&config.cache);

    let rendered = serde_json::to_string_pretty(&agent_config).map_err(|e| config_error(e.to_string()))?;
    println!("{}", rendered);
    println!("cache backend enabled: {}", service.is_enabled());
    println!("caching active for agent: {}", service.is_cache_enabled(Some(&agent_config)));
    Ok(())
}

fn run_headers(config: &AgiraConfig, method: &str, path: &str) -> AgiraResult<()> {
    let pipeline = Pipeline::from_names(config.pipeline.order.as_slice())?;
    for line in header_lines(&pipeline, method, path) {
        println!("{}", line);
    }
    Ok(())
}

/// Run an empty 200 response for `method path` through `pipeline` and list
/// the status and resulting headers, sorted by name.
fn header_lines(pipeline: &Pipeline, method: &str, path: &str) -> Vec<String> {
    let response = pipeline.handle(Request::new(method, path), |_| Response::new(200, ""));
    std::iter::once(format!("status: {}", response.status))
        .chain(
            response
                .headers
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value)),
        )
        .collect()
}
