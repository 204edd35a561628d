use anyhow::Result;
use chrono::Utc;
use store::sessions;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::config::{initialize_app_state, ServerArgs};
use crate::router::create_router;
use crate::schemas::AppState;

pub async fn serve(args: &ServerArgs) -> Result<()> {
    trace!("Entering serve function");
    info!("Academia application starting up");

    let state = initialize_app_state(args).await?;
    run_server(state, &args.bind_address).await
}

/// Binds the listener and serves the API until the process is stopped.
pub async fn run_server(state: AppState, bind_address: &str) -> Result<()> {
    let purged = sessions::purge_expired(&state.db, Utc::now()).await?;
    debug!("Removed {} expired sessions", purged);

    let app = create_router(state);
    debug!("Router created successfully");

    info!("Starting server on {}", bind_address);
    let listener = match TcpListener::bind(bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("Academia API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
