#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use serde::de::DeserializeOwned;
use sprop_analyser::RuleEngine;
use sprop_server::app::create_router;
use sprop_server::configs::{Auth, Database, GatewayTopic, SchemaManager, Storage};
use sprop_server::errors::GatewayError;
use sprop_server::models::{SensorRecord, StorageOffset, User};
use sprop_server::repositories::{SensorRecordRepository, UserRepository};
use sprop_server::services::{
    AuthService, Command, CommandPublisher, IngestService, SettingService, TokenService,
};
use time::OffsetDateTime;
use tower::ServiceExt;

pub const STORAGE_OFFSET_HOURS: i8 = 8;

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub setting_service: Arc<SettingService>,
    pub offset: StorageOffset,
    pub auth: Auth,
    pub user: User,
    pub token: String,
    pub router: Router,
}

impl MockApp {
    pub async fn new() -> Self {
        Self::with_auth_required(true).await
    }

    pub async fn with_auth_required(required: bool) -> Self {
        let storage = Arc::new(
            Storage::new(
                Database {
                    migration_path: None,
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );

        let auth = Auth {
            secret: String::from("test"),
            expiration: 1000,
            required,
        };
        let auth_service = Arc::new(AuthService::new());
        let token_service = Arc::new(TokenService::new(auth.clone()));
        let setting_service = Arc::new(SettingService::new(storage.clone()));
        let offset = StorageOffset::from_hours(STORAGE_OFFSET_HOURS).unwrap();

        let user = Self::create_test_user(&storage, &auth_service).await;
        let token = token_service.generate_token(&user).unwrap().token;

        let router = create_router(storage.clone(), setting_service.clone(), offset, &auth);

        Self {
            storage,
            auth_service,
            token_service,
            setting_service,
            offset,
            auth,
            user,
            token,
            router,
        }
    }

    async fn create_test_user(storage: &Arc<Storage>, auth_service: &AuthService) -> User {
        let repository = UserRepository::new(storage.clone());
        let mut user = User {
            id: 0,
            username: String::from("grower"),
            password: auth_service.hash("orchid").unwrap(),
            created_at: OffsetDateTime::now_utc(),
        };

        let mut tx = storage.get_pool().begin().await.unwrap();
        user.id = repository.create(&user, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        user
    }

    /// Stores a reading taken at the genuine instant `at`.
    pub async fn insert_reading(&self, at: OffsetDateTime, temperature: f64, humidity: f64) {
        let repository = SensorRecordRepository::new(self.storage.clone());
        let record = SensorRecord {
            id: 0,
            timestamp: self.offset.to_stored(at),
            temperature,
            humidity,
        };

        let mut tx = self.storage.get_pool().begin().await.unwrap();
        repository.create(&record, &mut tx).await.unwrap();
        tx.commit().await.unwrap();
    }

    pub fn ingest_service(&self, publisher: Arc<dyn CommandPublisher>) -> IngestService {
        IngestService::new(
            RuleEngine::default(),
            GatewayTopic::default(),
            self.offset,
            self.storage.clone(),
            self.setting_service.clone(),
            publisher,
        )
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<String>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Publisher that keeps every command instead of sending it.
#[derive(Default)]
pub struct RecordingPublisher {
    pub sent: Mutex<Vec<Command>>,
    pub offline: bool,
}

impl RecordingPublisher {
    pub fn offline() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            offline: true,
        }
    }

    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn publish(&self, command: &Command) -> Result<(), GatewayError> {
        if self.offline {
            return Err(GatewayError::Disconnected);
        }

        self.sent.lock().unwrap().push(*command);
        Ok(())
    }
}
