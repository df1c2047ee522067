use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use postcraft::{config, logging, workflow, AppError, AppResult, Config, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "postcraft", about = "Generate, caption and publish images to Instagram", version)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "PATH")]
    config: PathBuf,

    /// single: one post, scheduled: recurring posts, account: print account info
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Override image_generator.default_prompt
    #[arg(long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Override output_directory
    #[arg(long, value_name = "PATH")]
    output_dir: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Single,
    Scheduled,
    Account,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code(&e);
        }
    };
    if let Some(prompt) = cli.prompt.clone() {
        conf.image_generator.default_prompt = prompt;
    }
    if let Some(dir) = cli.output_dir.clone() {
        conf.output_directory = dir;
    }

    let _log = match logging::init(&conf.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code(&e);
        }
    };
    tracing::info!("Configuration loaded from {}", cli.config.display());
    conf.log_summary();

    match run(cli.mode, &conf).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error in main execution: {}", e);
            exit_code(&e)
        }
    }
}

async fn run(mode: Mode, conf: &Config) -> AppResult<()> {
    match mode {
        Mode::Account => {
            let client = workflow::graph_client(conf)?;
            let info = client.account_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Mode::Single => {
            create_output_directory(&conf.output_directory).await?;
            let pipeline = Pipeline::from_config(conf)?;
            let outcome = pipeline.run_single_post().await?;
            println!("{}", serde_json::to_string_pretty(&outcome.result)?);
            Ok(())
        }
        Mode::Scheduled => {
            create_output_directory(&conf.output_directory).await?;
            let pipeline = Pipeline::from_config(conf)?;
            let interval = conf.instagram_poster.post_interval()?;
            let report = pipeline
                .run_scheduled(conf.instagram_poster.scheduled_posts_count, interval)
                .await;
            for failure in &report.failures {
                tracing::warn!("Post {} failed: {}", failure.index, failure.error);
            }
            Ok(())
        }
    }
}

async fn create_output_directory(dir: &std::path::Path) -> AppResult<()> {
    let existed = tokio::fs::metadata(dir).await.is_ok();
    tokio::fs::create_dir_all(dir).await?;
    if !existed {
        tracing::info!("Created output directory: {}", dir.display());
    }
    Ok(())
}

fn exit_code(e: &AppError) -> ExitCode {
    ExitCode::from(e.exit_code().clamp(1, 255) as u8)
}
