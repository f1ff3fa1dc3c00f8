// file: src/pipeline/models.rs
// description: download the configured embedding models into the local cache
// reference: one hub snapshot per requested model, sequentially

use crate::config::Settings;
use crate::embedding::{DownloadReport, ModelDownloader};
use crate::error::Result;
use crate::utils::logging::{format_info, format_success};
use tracing::info;

/// Requested models, or the configured primary and secondary ones; duplicates dropped in order.
pub fn download_targets(settings: &Settings, requested: &[String]) -> Vec<String> {
    let candidates = if requested.is_empty() {
        vec![settings.models.primary.clone(), settings.models.secondary.clone()]
    } else {
        requested.to_vec()
    };

    let mut targets: Vec<String> = Vec::with_capacity(candidates.len());
    for name in candidates {
        let name = name.trim().to_string();
        if !name.is_empty() && !targets.contains(&name) {
            targets.push(name);
        }
    }
    targets
}

pub async fn download_models(
    settings: &Settings,
    requested: &[String],
    colored: bool,
) -> Result<Vec<DownloadReport>> {
    let downloader = ModelDownloader::new(&settings.paths.model_cache_dir, colored)?;
    let mut reports = Vec::new();

    for model in download_targets(settings, requested) {
        println!("{}", format_info(&format!("Downloading {}", model)));
        let report = downloader.download(&model).await?;
        info!(
            "{}: {} fetched, {} already present, {} bytes",
            report.model,
            report.stats.files_fetched,
            report.stats.files_skipped,
            report.stats.bytes_written
        );
        println!("  -> {}", report.target_dir.display());
        reports.push(report);
    }

    println!("{}", format_success("Download complete"));
    Ok(reports)
}
