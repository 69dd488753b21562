#[tokio::main]
async fn main() -> anyhow::Result<()> {
    construct_relay::run().await
}
