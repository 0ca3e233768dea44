use anyhow::Result;
use clap::Parser;
use retail_vision::{config::{Config, DEFAULT_MODEL_PATH}, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retail-vision")]
#[command(about = "Clothing image auto-tagger backed by an ONNX classifier")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8501")]
    bind: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Path to the ONNX model file
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model: String,

    /// Keep the original image polarity instead of inverting it
    #[arg(long)]
    no_invert: bool,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level))
        )
        .with_target(false)
        .init();

    tracing::info!("Starting RetailVision auto-tagger...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model path: {}", args.model);

    let config = Config::new(args.bind, args.model, !args.no_invert, args.dev)?;

    serve(config).await?;

    Ok(())
}
