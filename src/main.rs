use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    outreach_cli::cli::app::run().await
}
