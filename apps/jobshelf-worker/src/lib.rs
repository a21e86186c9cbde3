pub mod backfill;

mod error;

pub use error::{Error, Result};

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobshelf_service::Providers;
use jobshelf_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = jobshelf_cli::VERSION,
	rename_all = "kebab",
	styles = jobshelf_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

/// Fills every missing category embedding once and exits.
pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = jobshelf_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;
	let providers = Providers::default();
	let report = backfill::backfill_categories(
		&db,
		providers.embedding.as_ref(),
		&config.providers.embedding,
	)
	.await?;

	tracing::info!(
		total = report.total,
		updated = report.updated,
		skipped = report.skipped,
		failed = report.failed,
		"Category embedding backfill finished."
	);

	db.pool.close().await;

	Ok(())
}
