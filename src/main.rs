use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

use brandscope::api::{AppState, create_router};
use brandscope::{ApiKeys, AppConfig, Pipeline};

mod args;
use args::{AnalyzeArgs, Args, Command};

fn load_config(path: Option<&Path>) -> brandscope::Result<AppConfig> {
    let config = match path {
        Some(path) => {
            ::log::info!("Loading configuration from {}", path.display());
            AppConfig::from_file(path)?
        }
        None => AppConfig::default(),
    };
    Ok(config.with_env_overrides())
}

async fn serve(config: Option<&Path>, bind: Option<String>) -> brandscope::Result<()> {
    let mut config = load_config(config)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let keys = ApiKeys::from_env();
    let pipeline = Pipeline::from_config(&config, &keys, true).await?;
    let app = create_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str()).await?;
    ::log::info!("Listening on {}", config.server.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn analyze(args: &AnalyzeArgs) -> brandscope::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let keys = ApiKeys::from_env();
    let pipeline = Pipeline::from_config(&config, &keys, args.needs_browser()).await?;

    let result = pipeline.comprehensive(&args.to_request()).await;
    pipeline.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let outcome = match &args.command {
        Command::Serve { config, bind } => serve(config.as_deref(), bind.clone()).await,
        Command::Analyze(analyze_args) => analyze(analyze_args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
