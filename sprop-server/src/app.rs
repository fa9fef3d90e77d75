use std::sync::Arc;

use axum::Router;
use sprop_analyser::RuleEngine;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{Auth, SchemaManager, Settings, Storage};
use crate::handles::*;
use crate::middlewares::TokenState;
use crate::models::StorageOffset;
use crate::repositories::UserRepository;
use crate::services::{
    AuthService, CommandPublisher, GatewayService, HistoryService, IngestService, SettingService, TokenService,
};

/// Inbound messages buffered between the broker and ingestion.
const INBOUND_CAPACITY: usize = 100;

/// Broker side of the app. Control is gone once either task ends.
pub struct ControlTasks {
    pub gateway: JoinHandle<()>,
    pub ingestion: JoinHandle<()>,
}

impl ControlTasks {
    /// Resolves when the first task ends, aborting the other.
    pub async fn stopped(self) -> anyhow::Error {
        let Self {
            mut gateway,
            mut ingestion,
        } = self;

        let (task, result) = tokio::select! {
            result = &mut gateway => ("gateway", result),
            result = &mut ingestion => ("ingestion", result),
        };
        gateway.abort();
        ingestion.abort();

        let error = match result {
            Ok(()) => anyhow::anyhow!("{} task ended", task),
            Err(e) => anyhow::anyhow!("{} task failed: {}", task, e),
        };
        tracing::error!("{}", error);
        error
    }
}

pub async fn create_app(settings: &Arc<Settings>) -> Result<(Router, ControlTasks), anyhow::Error> {
    let storage = Arc::new(Storage::new(settings.database.clone(), SchemaManager::default()).await?);
    let offset = StorageOffset::from_hours(settings.control.storage_offset_hours)?;
    let engine = RuleEngine::new(settings.control.policy, settings.control.thresholds)?;
    let setting_service = Arc::new(SettingService::new(storage.clone()));

    let gateway = GatewayService::new(&settings.gateway)?;
    let publisher: Arc<dyn CommandPublisher> = Arc::new(gateway.publisher());
    let (sender, receiver) = mpsc::channel(INBOUND_CAPACITY);
    let gateway = gateway.start(sender);

    let ingest_service = IngestService::new(
        engine,
        settings.gateway.topic.clone(),
        offset,
        storage.clone(),
        setting_service.clone(),
        publisher,
    );
    let ingestion = tokio::spawn(ingest_service.run(receiver));

    tracing::info!(
        "control policy {}, storage offset {}h, broker {}:{}",
        engine.policy(),
        settings.control.storage_offset_hours,
        settings.gateway.host,
        settings.gateway.port
    );

    Ok((
        create_router(storage, setting_service, offset, &settings.auth),
        ControlTasks { gateway, ingestion },
    ))
}

/// HTTP surface only, the broker side is wired in [`create_app`].
pub fn create_router(
    storage: Arc<Storage>,
    setting_service: Arc<SettingService>,
    offset: StorageOffset,
    auth: &Auth,
) -> Router {
    let token_service = Arc::new(TokenService::new(auth.clone()));
    let token_state = TokenState {
        token_service: token_service.clone(),
        required: auth.required,
    };

    Router::new()
        .merge(system_router(SystemState {
            storage: storage.clone(),
        }))
        .merge(sensor_router(
            SensorState {
                history_service: Arc::new(HistoryService::new(storage.clone(), offset)),
            },
            token_state.clone(),
        ))
        .merge(setting_router(
            SettingState { setting_service },
            token_state.clone(),
        ))
        .merge(auth_router(
            AuthState {
                auth_service: Arc::new(AuthService::new()),
                token_service,
                user_repository: Arc::new(UserRepository::new(storage.clone())),
                storage,
            },
            token_state,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
