use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::app::create_app;
use crate::configs::Settings;

pub mod app;
pub mod configs;
pub mod errors;
pub mod handles;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;

pub async fn run(settings: &Arc<Settings>) -> Result<(), anyhow::Error> {
    let (app, control) = create_app(settings).await?;

    let ip_addr = settings
        .server
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("invalid server host {}", settings.server.host))?;

    let address = SocketAddr::from((ip_addr, settings.server.port));

    let listener = TcpListener::bind(&address).await?;

    tracing::info!("listening on {:?}", address);

    tokio::select! {
        served = axum::serve(listener, app).into_future() => served?,
        stopped = control.stopped() => return Err(stopped),
    }

    Ok(())
}
