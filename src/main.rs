// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use warehouse_kit::database::VectorTableAction;
use warehouse_kit::pipeline::download_models;
use warehouse_kit::utils::logging::{format_error, format_info, format_warning};
use warehouse_kit::{
    BootstrapOptions, ClickHouseConnector, EmbeddingGenerator, GenerateOptions, ModelCache,
    ObjectStoreManager, Settings, VectorMigration, WarehouseError, generate_vectors,
    run_bootstrap, run_check, run_demo,
};

#[derive(Parser)]
#[command(name = "warehouse")]
#[command(version)]
#[command(about = "Bootstrap a ClickHouse + S3 warehouse with local text embeddings", long_about = None)]
struct Cli {
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables, load the samples, stage the CSV to S3 and map it back
    Bootstrap {
        /// Drop and recreate the vector table even when its dimension matches
        #[arg(long)]
        recreate_vectors: bool,
    },

    /// Query the loaded tables and run a similarity search
    Demo,

    /// Embed the sample catalog and write the vector dataset
    GenerateVectors {
        /// Hub model name; defaults to ACTIVE_EMBEDDING_MODEL
        #[arg(long)]
        model: Option<String>,

        /// Output path; defaults to <DATA_DIR>/vector_items.jsonl
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        #[arg(long)]
        overwrite: bool,
    },

    /// Download embedding models into the local model cache
    DownloadModels {
        /// Repeat to download several models; defaults to the primary and secondary models
        #[arg(long = "model", value_name = "NAME")]
        models: Vec<String>,
    },

    /// Report on database, bucket, model cache and dataset health
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    warehouse_kit::utils::logging::init_logger(cli.color, cli.verbose);

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(resource) = err
                .downcast_ref::<WarehouseError>()
                .filter(|e| e.is_missing_resource())
            {
                eprintln!("{}", format_error(&resource.to_string()));
                if let Some(hint) = resource.remediation() {
                    eprintln!("{}", format_info(hint));
                }
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load().context("Failed to resolve settings")?;
    info!(
        "ClickHouse at {} (native port {}), bucket {}",
        settings.clickhouse.http_url(),
        settings.clickhouse.native_port,
        settings.s3.bucket
    );

    match cli.command {
        Commands::Bootstrap { recreate_vectors } => {
            cmd_bootstrap(&settings, recreate_vectors).await?;
        }
        Commands::Demo => {
            cmd_demo(&settings).await?;
        }
        Commands::GenerateVectors {
            model,
            output,
            overwrite,
        } => {
            cmd_generate(&settings, model, output, overwrite)?;
        }
        Commands::DownloadModels { models } => {
            download_models(&settings, &models, cli.color)
                .await
                .context("Model download failed")?;
        }
        Commands::Check => {
            cmd_check(&settings).await?;
        }
    }

    Ok(())
}

async fn cmd_bootstrap(settings: &Settings, recreate_vectors: bool) -> Result<()> {
    let connector = ClickHouseConnector::new(&settings.clickhouse);
    let store = ObjectStoreManager::from_settings(&settings.s3);

    let options = BootstrapOptions {
        vector_migration: if recreate_vectors {
            VectorMigration::AlwaysRecreate
        } else {
            VectorMigration::OnDimensionChange
        },
    };

    let report = run_bootstrap(settings, &connector, &store, options)
        .await
        .context("Bootstrap failed")?;

    if let VectorTableAction::Recreated { previous } = report.vector_table {
        warn!(
            "Vector table was recreated (previous dimension: {})",
            previous.map_or_else(|| "unknown".to_string(), |d| d.to_string())
        );
    }
    Ok(())
}

async fn cmd_demo(settings: &Settings) -> Result<()> {
    let connector = ClickHouseConnector::new(&settings.clickhouse);
    let store = ObjectStoreManager::from_settings(&settings.s3);

    run_demo(settings, &connector, &store)
        .await
        .context("Demo failed")?;
    Ok(())
}

fn cmd_generate(
    settings: &Settings,
    model: Option<String>,
    output: Option<PathBuf>,
    overwrite: bool,
) -> Result<()> {
    let mut generator = EmbeddingGenerator::new(&settings.paths, ModelCache::default());

    let report = generate_vectors(
        settings,
        &mut generator,
        GenerateOptions {
            model,
            output,
            overwrite,
        },
    )
    .context("Vector dataset generation failed")?;

    info!(
        "{} records from {} -> {}",
        report.records.len(),
        report.model,
        report.output.display()
    );
    Ok(())
}

async fn cmd_check(settings: &Settings) -> Result<()> {
    let connector = ClickHouseConnector::new(&settings.clickhouse);
    let store = ObjectStoreManager::from_settings(&settings.s3);

    let report = run_check(settings, &connector, &store)
        .await
        .context("Health check failed")?;

    if !report.health.is_healthy() {
        println!(
            "{}",
            format_warning(&format!("Overall status: {:?}", report.health.overall_status))
        );
    }
    if report.health.overall_status == warehouse_kit::HealthStatus::Unhealthy {
        anyhow::bail!("One or more warehouse components are unhealthy");
    }
    Ok(())
}
