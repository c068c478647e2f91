use anyhow::{Context, bail};
use futures::StreamExt;
use repurpose::{
    AppState, ConfigManager, Query, QueryOptions, RunStatus, WorkerRegistry, WorkflowEvent,
    WorkflowOutput,
    api::routes::app,
    cli::{Cli, Commands, output::Output},
    types::{TaskStatus, WorkerKind},
    utils::{telemetry::init_telemetry, toml_config::AppConfig},
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "repurpose.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let (config_manager, used_defaults) = load_config(&cli.config)?;
    let config = config_manager.config();

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    init_telemetry(log_level, cli.json_logs);
    if used_defaults {
        warn!(path = %cli.config.display(), "Config file not found, using built-in defaults");
    }

    match &cli.command {
        Commands::Query { text, stream, .. } => {
            let options = cli.command.query_options().unwrap_or_default();
            let state = AppState::from_config_manager(Arc::new(config_manager))?;
            run_query(&state, text, options, *stream, &output).await
        }
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState::from_config_manager(Arc::new(config_manager))?;
            serve(state, &host, port).await
        }
        Commands::Workers => {
            list_workers(&config, &output);
            Ok(())
        }
        Commands::Config { validate } => {
            show_config(&cli.config, &config, *validate, used_defaults, &output);
            Ok(())
        }
    }
}

/// Load the config file; a missing default file falls back to built-in defaults.
fn load_config(path: &Path) -> anyhow::Result<(ConfigManager, bool)> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG) {
        return Ok((ConfigManager::from_config(AppConfig::default()), true));
    }
    let manager = ConfigManager::new(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok((manager, false))
}

async fn run_query(
    state: &AppState,
    text: &str,
    options: QueryOptions,
    stream: bool,
    output: &Output,
) -> anyhow::Result<()> {
    let query = Query::with_options(text, options);

    let result = if stream {
        let events = state.engine().run_stream(query, CancellationToken::new());
        futures::pin_mut!(events);

        let mut finished: Option<WorkflowOutput> = None;
        while let Some(event) = events.next().await {
            match event {
                WorkflowEvent::Stage { stage, status } => output.stage(stage.as_str(), &status),
                WorkflowEvent::TasksStarted { tasks } => tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::InProgress)
                    .for_each(|t| output.list_item(t.worker.display_name())),
                WorkflowEvent::Finished(out) => finished = Some(*out),
            }
        }
        match finished {
            Some(out) => out,
            None => bail!("Workflow ended without a result"),
        }
    } else {
        state.engine().run(query).await
    };

    if result.status == RunStatus::Failed {
        bail!(
            "Query failed: {}",
            result.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    println!("{}", result.response);
    if !result.success {
        output.warning("No worker produced results for this query");
    }
    if let Some(path) = &result.report_path {
        output.success(&format!("Report saved to {}", path));
    }
    info!(
        duration_ms = result.execution_time_ms,
        agents = result.agent_count,
        "Query finished"
    );
    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(state.clone()));

    info!("Server listening on http://{}", addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Reload the configuration on every SIGHUP
#[cfg(unix)]
async fn reload_on_hangup(state: AppState) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!(error = %e, "Failed to listen for SIGHUP, config reload disabled");
            return;
        }
    };
    while hangup.recv().await.is_some() {
        info!("SIGHUP received");
        if let Err(e) = state.reload() {
            warn!(error = %e, "Config reload failed, keeping previous configuration");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn list_workers(config: &AppConfig, output: &Output) {
    let registry = WorkerRegistry::synthetic(&config.report);

    output.header("Workers");
    output.worker_table(&registry.kinds());

    for kind in WorkerKind::ALL {
        output.subheader(kind.display_name());
        output.kv("Description", kind.description());
        output.kv("Data sources", &kind.data_sources().join(", "));
        for example in kind.example_queries() {
            output.list_item(example);
        }
    }
    output.newline();
}

fn show_config(
    path: &Path,
    config: &AppConfig,
    validate: bool,
    used_defaults: bool,
    output: &Output,
) {
    if validate {
        if used_defaults {
            output.warning(&format!("{} not found, defaults are valid", path.display()));
        } else {
            output.success(&format!("{} is valid", path.display()));
        }
        return;
    }

    output.header("Configuration");
    output.kv(
        "File",
        &if used_defaults {
            "(built-in defaults)".to_string()
        } else {
            path.display().to_string()
        },
    );

    output.subheader("Server");
    output.kv("Address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("Log level", &config.server.log_level);

    output.subheader("Workflow");
    output.kv("Parallel workers", &config.workflow.parallel_workers.to_string());
    output.kv("Max concurrency", &config.workflow.max_concurrency.to_string());
    output.kv("Worker timeout", &format!("{}s", config.workflow.worker_timeout_secs));
    output.kv("Summary timeout", &format!("{}s", config.workflow.summary_timeout_secs));

    output.subheader("Report");
    output.kv("Output dir", &config.report.output_dir.display().to_string());
    output.kv("Format", config.report.format.extension());

    output.subheader("Summaries");
    match &config.llm {
        Some(llm) => output.kv("Provider", &format!("{:?}", llm)),
        None => output.kv("Provider", "none (deterministic fallback)"),
    }

    if !config.planner.priorities.is_empty() {
        output.subheader("Priority overrides");
        for (worker, priority) in &config.planner.priorities {
            output.kv(worker, &priority.to_string());
        }
    }
    output.newline();
}
