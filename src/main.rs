#[tokio::main]
async fn main() -> anyhow::Result<()> {
    showcase::run().await
}
