use anyhow::Result;
use tracing::{info, trace};

use super::initdb::apply_migrations;
use super::serve::run_server;
use crate::config::{initialize_app_state, ServerArgs};

pub async fn migrate_and_serve(args: &ServerArgs) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    let state = initialize_app_state(args).await?;
    apply_migrations(&state.db).await?;

    run_server(state, &args.bind_address).await
}
