use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    codedesk_cli::main_entry().await
}
