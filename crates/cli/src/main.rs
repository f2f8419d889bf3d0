use anyhow::{Context, Result};
use catalog::{Catalog, ClothingType};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pipeline::{BodyShapeResult, Recommendation};
use rand::Rng;
use server::{Config, PipelineOrchestrator, SuggestionRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;
use vision::{DetectedItem, ImageHandle};

/// OutfitRecs - Clothing detection and outfit recommendations
#[derive(Parser)]
#[command(name = "outfit-recs")]
#[command(about = "Detect clothing and body shape in a photo and recommend catalog items", long_about = None)]
struct Cli {
    /// gRPC address of the vision service [env: OUTFIT_VISION_ADDR]
    #[arg(long, global = true)]
    vision_addr: Option<String>,

    /// Catalog file (.json or .dat) [env: OUTFIT_CATALOG_PATH]
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Seed for base affinity scores [env: OUTFIT_AFFINITY_SEED]
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Fail when a model cannot be loaded instead of returning empty results
    #[arg(long, global = true)]
    strict: bool,

    /// Clothing types never to recommend, comma-separated [env: OUTFIT_EXCLUDE_TYPES]
    #[arg(long, global = true, value_delimiter = ',')]
    exclude: Vec<ClothingType>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect clothing items in a photo
    Detect {
        /// Image file
        image: PathBuf,
    },

    /// Recommend catalog items for a photo
    Suggest {
        /// Image file
        image: PathBuf,

        /// Maximum price per item
        #[arg(long)]
        budget: String,

        /// Preferred clothing types (repeat or comma-separate)
        #[arg(long, value_delimiter = ',')]
        style: Vec<String>,

        /// Also print detections and body shape
        #[arg(long)]
        explain: bool,
    },

    /// Classify body shape from a photo
    Analyze {
        /// Image file
        image: PathBuf,
    },

    /// Prepare a virtual try-on for one clothing type
    TryOn {
        /// Image file
        image: PathBuf,

        /// Clothing type to try on (default: all)
        #[arg(long)]
        clothing_type: Option<String>,
    },

    /// List catalog items
    Catalog {
        /// Only show this clothing type
        #[arg(long = "type")]
        clothing_type: Option<ClothingType>,
    },

    /// Load the models and report their status
    Health,

    /// Run concurrent suggestion requests to test performance
    Benchmark {
        /// Image file
        image: PathBuf,

        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli);
    debug!("Configuration: {:?}", config);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Detect { image } => handle_detect(&config, &image).await?,
        Commands::Suggest {
            image,
            budget,
            style,
            explain,
        } => handle_suggest(&config, &image, budget, style, explain).await?,
        Commands::Analyze { image } => handle_analyze(&config, &image).await?,
        Commands::TryOn {
            image,
            clothing_type,
        } => handle_try_on(&config, &image, clothing_type).await?,
        Commands::Catalog { clothing_type } => handle_catalog(&config, clothing_type)?,
        Commands::Health => handle_health(&config).await?,
        Commands::Benchmark {
            image,
            requests,
            concurrent,
        } => handle_benchmark(&config, &image, requests, concurrent).await?,
    }

    Ok(())
}

/// Environment configuration with command-line overrides
fn build_config(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(addr) = &cli.vision_addr {
        config.vision_addr = addr.clone();
    }
    if let Some(path) = &cli.catalog {
        config.catalog_path = Some(path.clone());
    }
    if let Some(seed) = cli.seed {
        config.affinity_seed = seed;
    }
    config.strict_models |= cli.strict;
    if !cli.exclude.is_empty() {
        config.exclude_types = cli
            .exclude
            .iter()
            .copied()
            .filter(|t| *t != ClothingType::Unknown)
            .collect();
    }
    // One-shot commands load models on demand
    config.warm_up = false;
    config
}

async fn load_image(path: &Path) -> Result<ImageHandle> {
    ImageHandle::open(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))
}

/// Handle the 'detect' command
async fn handle_detect(config: &Config, image: &Path) -> Result<()> {
    let orchestrator = PipelineOrchestrator::from_config(config)?;
    let image = load_image(image).await?;

    let response = orchestrator.detect_clothing(&image).await?;
    print_detections(&response.data);
    Ok(())
}

/// Handle the 'suggest' command
async fn handle_suggest(
    config: &Config,
    image: &Path,
    budget: String,
    style: Vec<String>,
    explain: bool,
) -> Result<()> {
    let orchestrator = PipelineOrchestrator::from_config(config)?;
    let image = load_image(image).await?;

    let mut request = SuggestionRequest::new(budget);
    if !style.is_empty() {
        request = request.with_style(style);
    }

    let start = Instant::now();
    let response = orchestrator.generate_suggestions(&image, request).await?;

    if explain {
        print_detections(&response.detected);
        print_body_shape(&response.body_shape);
    }
    print_recommendations(&response.suggestions);
    println!("{} Done in {:?}", "✓".green(), start.elapsed());
    Ok(())
}

/// Handle the 'analyze' command
async fn handle_analyze(config: &Config, image: &Path) -> Result<()> {
    let orchestrator = PipelineOrchestrator::from_config(config)?;
    let image = load_image(image).await?;

    let response = orchestrator.analyze_body_shape(&image).await?;
    println!("Poses detected: {}", response.poses_detected);
    print_body_shape(&response.analysis);
    Ok(())
}

/// Handle the 'try-on' command
async fn handle_try_on(
    config: &Config,
    image: &Path,
    clothing_type: Option<String>,
) -> Result<()> {
    let orchestrator = PipelineOrchestrator::from_config(config)?;
    let image = load_image(image).await?;

    let response = orchestrator
        .process_try_on(&image, clothing_type.as_deref())
        .await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Handle the 'catalog' command
fn handle_catalog(config: &Config, clothing_type: Option<ClothingType>) -> Result<()> {
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load_from_path(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin(),
    };

    println!("{}", format!("Catalog ({} items):", catalog.len()).bold().blue());
    for item in catalog.items() {
        if clothing_type.is_some_and(|t| t != item.clothing_type) {
            continue;
        }
        println!(
            "{}: {} ${:.2} [{}] by {}",
            item.id.to_string().green(),
            item.clothing_type,
            item.price,
            item.colors.join(", "),
            item.brands.join(", ")
        );
    }
    Ok(())
}

/// Handle the 'health' command
async fn handle_health(config: &Config) -> Result<()> {
    let orchestrator = PipelineOrchestrator::from_config(config)?;
    orchestrator.warm_up().await;

    let health = orchestrator.health();
    println!("{}", health.status.bold());
    for model in &health.models {
        let status = model.status.to_string();
        let status = match model.status {
            vision::ModelStatus::Ready => status.green(),
            vision::ModelStatus::Loading => status.yellow(),
            vision::ModelStatus::Unloaded => status.red(),
        };
        println!("{}{}: {}", "• ".cyan(), model.name, status);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    config: &Config,
    image: &Path,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    anyhow::ensure!(requests > 0, "requests must be at least 1");

    let orchestrator = PipelineOrchestrator::from_config(config)?;
    orchestrator.warm_up().await;
    let image = load_image(image).await?;
    let limit = Arc::new(Semaphore::new(concurrent.max(1)));

    // Random budgets between $20 and $200
    let mut rng = rand::rng();
    let budgets: Vec<f64> = (0..requests)
        .map(|_| rng.random_range(20.0..200.0))
        .collect();

    let started = Instant::now();

    // Use tokio::spawn to make concurrent requests
    let mut handles = vec![];
    for budget in budgets {
        let orchestrator = orchestrator.clone();
        let image = image.clone();
        let limit = Arc::clone(&limit);
        let handle = tokio::spawn(async move {
            let _permit = limit.acquire_owned().await?;
            let start = Instant::now();
            orchestrator
                .generate_suggestions(&image, SuggestionRequest::new(budget))
                .await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        });
        handles.push(handle);
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = started.elapsed();

    let total: Duration = timings.iter().sum();
    let avg_latency = total / (timings.len() as u32);
    timings.sort();
    let p50 = timings[timings.len() / 2];
    let p95 = timings[(timings.len() as f32 * 0.95) as usize];
    let p99 = timings[(timings.len() as f32 * 0.99) as usize];
    let throughput = requests as f32 / wall_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_detections(items: &[DetectedItem]) {
    println!("{}", "Detected clothing:".bold().blue());
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        let b = &item.bounding_box;
        println!(
            "{}{} ({:.0}%) at ({:.0}, {:.0}) {:.0}x{:.0}",
            "• ".green(),
            item.clothing_type,
            item.confidence * 100.0,
            b.x,
            b.y,
            b.width,
            b.height
        );
    }
}

fn print_body_shape(result: &BodyShapeResult) {
    println!(
        "{} {} (confidence {:.2})",
        "Body shape:".bold().blue(),
        result.shape,
        result.confidence
    );
    for advice in &result.recommendations {
        println!("{}{}", "• ".cyan(), advice);
    }
}

fn print_recommendations(recommendations: &[Recommendation]) {
    println!("{}", "Recommendations:".bold().blue());
    if recommendations.is_empty() {
        println!("  (nothing within budget)");
    }
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. #{} {} ${:.2} [{}] by {} - Score: {:.2}",
            (i + 1).to_string().green(),
            rec.item.id,
            rec.item.clothing_type,
            rec.item.price,
            rec.item.colors.join(", "),
            rec.item.brands.join(", "),
            rec.match_score
        );
    }
}
