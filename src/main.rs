use healthy_living::bootstrap::{init_tracing_subscriber, load_config, resolve_config_path, run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing_subscriber()?;

    let config_path = resolve_config_path();
    let config = load_config(config_path.as_deref())?;

    run_app(config).await
}
