use anyhow::Result;
use fitbuddy::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
