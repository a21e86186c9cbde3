use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = jobshelf_worker::Args::parse();

	jobshelf_worker::run(args).await
}
