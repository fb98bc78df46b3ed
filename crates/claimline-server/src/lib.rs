//! HTTP and websocket surface for the Claimline service.

mod events;
mod routes;
mod ws;

pub use events::EventRouter;

use claimline_config::ClaimlineConfig;
use claimline_core::Orchestrator;
use log::info;
use rocket::{Build, Rocket, routes};
use std::sync::Arc;

/// Shared handles the routes operate on.
#[derive(Clone)]
pub struct ServerState {
    pub orchestrator: Arc<Orchestrator>,
    pub router: Arc<EventRouter>,
}

/// Assemble the rocket instance with routes mounted and limits applied.
pub fn rocket(config: &ClaimlineConfig, state: ServerState) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port))
        .merge(("limits.bytes", config.chat.max_document_bytes as u64));

    rocket::custom(figment).manage(state).mount(
        "/",
        routes![
            routes::health,
            routes::create_session,
            routes::list_sessions,
            routes::history,
            routes::list_documents,
            routes::upload_document,
            ws::chat_socket,
        ],
    )
}

/// Run the server until shutdown. The orchestrator must have been built
/// with the router as its event sink so exchange events reach sockets.
pub async fn serve(
    config: ClaimlineConfig,
    orchestrator: Arc<Orchestrator>,
    router: Arc<EventRouter>,
) -> anyhow::Result<()> {
    info!(
        "starting server (address={}, port={})",
        config.server.address, config.server.port
    );
    let state = ServerState { orchestrator, router };
    rocket(&config, state).launch().await?;
    Ok(())
}
