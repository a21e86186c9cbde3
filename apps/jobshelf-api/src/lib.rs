pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use jobshelf_service::trending;

use crate::state::AppState;

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

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = jobshelf_config::load(&args.config)?;

	init_tracing(&config);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let state = AppState::new(config).await?;
	let cache = state.service.trending.clone();
	let outcome = cache.refresh().await;

	tracing::info!(?outcome, "Initial trending refresh finished.");

	let refresh_loop = trending::spawn_refresh_loop(cache);
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let served = axum::serve(listener, app).await;

	refresh_loop.abort();

	Ok(served?)
}

fn init_tracing(config: &jobshelf_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
