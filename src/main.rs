mod args;
mod badge;
mod client;
mod database;
mod dota2;
mod rate;
mod service;
mod view;

use std::{sync::Arc, time::Duration};

use args::Args;
use client::Client;
use database::Database;
use service::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional, real environment variables take precedence
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse_or_exit();

    let client = Client::new(&args.api_url, args.proxy.as_deref())?;
    let database = Database::new(
        &args.database_url,
        &args.database_name,
        &args.collection,
        args.database_user.as_deref(),
        args.database_password.as_deref(),
    )
    .await?;

    let state = Arc::new(AppState::new(
        Arc::new(client),
        Arc::new(database),
        Duration::from_millis(args.dispatch_interval),
    ));
    let app = service::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    log::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
