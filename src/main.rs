use bookcast::ai::{OpenAiGenerator, SampleGenerator};
use bookcast::infra::{FsStorage, SystemClock};
use bookcast::{server, AppError, Config, FeedPipeline, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    // Check for --generate flag (headless run, meant for cron)
    let generate = args.len() >= 2 && args[1] == "--generate";

    if generate {
        run_pipeline(&config).await?;
        println!(
            "Feed generated successfully at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        return Ok(());
    }

    server::serve(&config)
}

async fn run_pipeline(config: &Config) -> Result<()> {
    let storage = FsStorage;
    let clock = SystemClock;

    if config.development {
        tracing::info!("running in development mode, using the sample topic");
        let sample_audio = std::fs::read(config.audio_dir().join("sample.mp3")).ok();
        let generator = SampleGenerator::new(sample_audio);
        return FeedPipeline::new(config, generator, storage, clock).run().await;
    }

    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| AppError::Config("openai_api_key is not set".to_string()))?;
    let generator = OpenAiGenerator::new(api_key, config.model.clone());
    FeedPipeline::new(config, generator, storage, clock).run().await
}
