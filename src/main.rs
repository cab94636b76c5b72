mod cli;

use mvgraph::{
    backend,
    config::{self, Config},
    server::{self, AppContext},
    Session,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mvgraph_compiler::{source, ParameterBindings};
use mvgraph_engine::PlaybackMode;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config bindings overlaid with the ones given on the command line.
fn merge_bindings(config: &Config, params: Vec<(String, String)>) -> ParameterBindings {
    let mut bindings = config.graph.params.clone();
    bindings.extend(params);
    bindings
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mvgraph=trace,mvgraph_compiler=trace,mvgraph_engine=trace,tower_http=debug".to_string()
        } else {
            "mvgraph=info,mvgraph_compiler=info,mvgraph_engine=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so `compile --stdout` output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile {
            input,
            params,
            stdout,
            output,
        } => compile_graph(&input, params, stdout, output, cli.config.as_deref()),
        Commands::Run {
            input,
            params,
            mode,
            duration,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_graph(
                &input,
                params,
                mode,
                duration,
                cli.config.as_deref(),
            ))
        }
        Commands::Serve {
            host,
            port,
            graph,
            params,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(host, port, graph, params, cli.config.as_deref()))
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mvgraph {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn compile_graph(
    input: &Path,
    params: Vec<(String, String)>,
    stdout: bool,
    output: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let bindings = merge_bindings(&config, params);
    let options = config.engine.convert_options();

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    if stdout || output.is_some() {
        let loaded = source::load(input, &bindings, &options)
            .with_context(|| format!("Failed to compile {:?}", input))?;
        match output {
            Some(path) => {
                std::fs::write(&path, &loaded.compiled.materialized)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!(
                    "Compiled {} directives ({}) to {}",
                    loaded.compiled.sequence.len(),
                    loaded.format,
                    path.display()
                );
            }
            None => print!("{}", loaded.compiled.materialized),
        }
        return Ok(());
    }

    let (loaded, target) = source::load_and_materialize(input, &bindings, &options)
        .with_context(|| format!("Failed to compile {:?}", input))?;
    println!(
        "Compiled {} directives ({}) to {}",
        loaded.compiled.sequence.len(),
        loaded.format,
        target.display()
    );
    Ok(())
}

async fn run_graph(
    input: &Path,
    params: Vec<(String, String)>,
    mode: Option<PlaybackMode>,
    duration: Option<u64>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let bindings = merge_bindings(&config, params);

    let (loaded, target) =
        source::load_and_materialize(input, &bindings, &config.engine.convert_options())
            .with_context(|| format!("Failed to compile {:?}", input))?;
    tracing::info!("Materialized {:?} to {:?}", input, target);

    let session = Session::from_boxed(backend::create_engine(&config.engine)?);
    session.stage(loaded.compiled.sequence).await;

    let result = play_until_stopped(&session, mode, duration).await;

    if let Err(e) = session.destroy().await {
        tracing::warn!("Failed to destroy graph: {}", e);
    }
    result
}

async fn play_until_stopped(
    session: &Session,
    mode: Option<PlaybackMode>,
    duration: Option<u64>,
) -> Result<()> {
    let filters = session.build().await.context("Failed to build graph")?;
    println!("Built graph with {} filters", filters.len());
    for filter in &filters {
        println!("  [{}] {}", filter.id, filter.symbolic_name);
    }

    if let Some(mode) = mode {
        session.set_playback_mode(mode).await?;
    }

    let handle = session.play().await.context("Failed to start playback")?;
    let mode = handle.mode();
    handle.wait().await.context("Playback failed")?;
    println!("Playing ({})", mode);

    match duration {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {},
                _ = server::shutdown_signal() => {},
            }
        }
        None => {
            println!("Press Ctrl-C to stop");
            server::shutdown_signal().await;
        }
    }

    println!("Stopping graph");
    Ok(())
}

async fn serve(
    host: Option<String>,
    port: Option<u16>,
    graph: Option<PathBuf>,
    params: Vec<(String, String)>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.graph.params = merge_bindings(&config, params);
    if graph.is_some() {
        config.graph.path = graph;
    }

    tracing::info!("Starting mvgraph server");
    tracing::info!(
        "Server will listen on {}:{} ({} engine)",
        config.server.host,
        config.server.port,
        config.engine.backend
    );

    let session = Session::from_boxed(backend::create_engine(&config.engine)?);

    if let Some(path) = config.graph.path.clone() {
        let (loaded, target) = source::load_and_materialize(
            &path,
            &config.graph.params,
            &config.engine.convert_options(),
        )
        .with_context(|| format!("Failed to compile {:?}", path))?;
        tracing::info!("Materialized {:?} to {:?}", path, target);
        session.stage(loaded.compiled.sequence).await;
        let filters = session
            .build()
            .await
            .with_context(|| format!("Failed to build {:?}", path))?;
        tracing::info!("Preloaded {:?} with {} filters", path, filters.len());
    }

    server::start_server(AppContext::new(session, config)).await
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Engine backend: {}", config.engine.backend);
            println!("  Memory pool: {}", config.engine.memory_pool);
            println!("  Graph name: {}", config.engine.graph_name);
            if let Some(ref graph) = config.graph.path {
                println!("  Graph: {}", graph.display());
            }
            println!("  Parameter bindings: {}", config.graph.params.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Engine backend: {}", config.engine.backend);
        }
    }

    Ok(())
}
