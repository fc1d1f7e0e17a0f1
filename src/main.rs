#[tokio::main]
async fn main() -> anyhow::Result<()> {
    godot_architect_lib::run().await
}
