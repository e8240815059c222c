use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = shoplens_api::Args::parse();

	shoplens_api::run(args).await
}
