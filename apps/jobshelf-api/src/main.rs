use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = jobshelf_api::Args::parse();

	jobshelf_api::run(args).await
}
