use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = inq_api::Args::parse();

	inq_api::run(args).await
}
