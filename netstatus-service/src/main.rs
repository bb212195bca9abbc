#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netstatus_service::run().await
}
