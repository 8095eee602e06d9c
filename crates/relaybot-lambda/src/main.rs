use std::sync::Arc;

use lambda_http::{run, Error};
use tracing::{info, warn};

use relaybot_core::config;
use relaybot_core::http::{create_router, AppState};
use relaybot_core::store::dynamo::DynamoKvStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relaybot_lambda=info".parse().unwrap())
                .add_directive("relaybot_core=info".parse().unwrap()),
        )
        .with_ansi(false)
        .init();

    info!("relaybot Lambda starting...");

    let table_name = std::env::var("RELAYBOT_DYNAMODB_TABLE")
        .unwrap_or_else(|_| "relaybot-store".to_string());

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let dynamo_client = aws_sdk_dynamodb::Client::new(&aws_config);

    let cfg = config::load_from_env();
    if cfg.telegram.token.is_empty() {
        warn!("TELEGRAM_BOT_TOKEN is not set; every webhook call will be rejected");
    }

    let store = Arc::new(DynamoKvStore::new(dynamo_client, table_name));
    let state = Arc::new(AppState::new(cfg, store));

    let router = create_router(state);

    run(router).await?;

    Ok(())
}
