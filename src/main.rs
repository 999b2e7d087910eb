#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jwalk_lib::run().await
}
