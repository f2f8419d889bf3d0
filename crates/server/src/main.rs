//! Simple test harness for the pipeline orchestrator.
//!
//! Runs every operation once against an image, using the vision service
//! and catalog from the `OUTFIT_*` environment.
//!
//! Usage: server <image> [budget] [style...]

use anyhow::{Context, Result};
use tracing::{info, warn};

use server::{Config, PipelineOrchestrator, SuggestionRequest};
use vision::ImageHandle;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info,server=debug,vision=debug,pipeline=debug")
        .init();

    let mut args = std::env::args().skip(1);
    let image_path = args
        .next()
        .context("usage: server <image> [budget] [style...]")?;
    let budget = args.next().unwrap_or_else(|| "150".to_string());
    let style: Vec<String> = args.collect();

    info!("Starting outfit pipeline test harness");
    let config = Config::from_env();
    info!("Vision service: {}", config.vision_addr);

    let orchestrator = PipelineOrchestrator::from_config(&config)?;
    if config.warm_up {
        orchestrator.warm_up().await;
    }

    let image = ImageHandle::open(&image_path)
        .await
        .with_context(|| format!("Failed to read image {}", image_path))?;
    info!("Loaded image {} ({} bytes)", image_path, image.len());

    let detection = orchestrator.detect_clothing(&image).await?;
    info!("Detected {} clothing items:", detection.data.len());
    for item in &detection.data {
        info!("   {} ({:.2})", item.clothing_type, item.confidence);
    }

    let analysis = orchestrator.analyze_body_shape(&image).await?;
    info!(
        "Body shape: {} (confidence {:.2}, {} poses)",
        analysis.analysis.shape, analysis.analysis.confidence, analysis.poses_detected
    );
    for advice in &analysis.analysis.recommendations {
        info!("   {}", advice);
    }

    let mut request = SuggestionRequest::new(budget);
    if !style.is_empty() {
        request = request.with_style(style);
    }
    match orchestrator.generate_suggestions(&image, request).await {
        Ok(response) => {
            info!("Received {} suggestions:", response.suggestions.len());
            for (i, rec) in response.suggestions.iter().enumerate() {
                info!(
                    "{}. #{} {} ${:.2} - Score: {:.3} [{}]",
                    i + 1,
                    rec.item.id,
                    rec.item.clothing_type,
                    rec.item.price,
                    rec.match_score,
                    rec.item.brands.join(", ")
                );
            }
        }
        Err(e) => warn!("Suggestions rejected ({:?}): {}", e.class(), e),
    }

    let health = orchestrator.health();
    info!("{}", serde_json::to_string(&health)?);

    Ok(())
}
