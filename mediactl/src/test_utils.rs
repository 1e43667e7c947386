//! Test utilities for handler and integration tests.

use std::sync::Arc;

use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use sqlx::PgPool;
use url::Url;

use crate::{
    AppState, Application,
    auth::csrf,
    blob::InMemoryBlobStorage,
    config::{BlobStorageConfig, Config, DatabaseConfig, PoolSettings},
    images::{ImageService, InMemoryMetadataStore},
};

pub const TEST_USER: &str = "editor@example.com";
pub const TEST_BLOB_BASE: &str = "http://blobs.test/media/";

pub fn create_test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "postgres://localhost:5432/mediactl_test".to_string(),
            pool: PoolSettings {
                max_connections: 2,
                min_connections: 0,
                ..Default::default()
            },
        },
        blob_storage: BlobStorageConfig::Memory {
            public_base_url: Url::parse(TEST_BLOB_BASE).expect("valid test URL"),
        },
        secret_key: Some("test-secret-key-for-forms".to_string()),
        ..Default::default()
    }
}

/// A server wired to in-memory stores, with handles to inspect them
pub struct TestApp {
    pub server: TestServer,
    pub config: Config,
    pub blobs: Arc<InMemoryBlobStorage>,
    pub metadata: Arc<InMemoryMetadataStore>,
}

impl TestApp {
    /// Headers the authenticating proxy would add
    pub fn auth(&self) -> (String, String) {
        (self.config.auth.proxy_header.header_name.clone(), TEST_USER.to_string())
    }

    pub fn csrf_token(&self) -> String {
        csrf_token_for(&self.config, TEST_USER)
    }
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_config(create_test_config())
}

pub fn create_test_app_with_config(config: Config) -> TestApp {
    let blobs = Arc::new(InMemoryBlobStorage::new(TEST_BLOB_BASE));
    let metadata = Arc::new(InMemoryMetadataStore::new());
    let images = ImageService::new(&config, blobs.clone(), metadata.clone());

    let state = AppState::builder().config(config.clone()).images(images).build();
    let router = crate::build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        config,
        blobs,
        metadata,
    }
}

/// Full application on a real pool; blobs go to the configured memory backend
pub async fn create_pg_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();
    let app = Application::new_with_pool(config, pool)
        .await
        .expect("Failed to create application");
    app.into_test_server()
}

pub fn csrf_token_for(config: &Config, user: &str) -> String {
    let secret = csrf::secret_key(config).expect("test config has a secret key");
    csrf::issue_token(secret, user).expect("Failed to issue token")
}

pub fn image_part(name: &str, content_type: &str) -> Part {
    Part::bytes(b"\x89PNG\r\n\x1a\nfake image".to_vec())
        .file_name(name)
        .mime_type(content_type)
}

pub fn profile_form(token: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text(csrf::FORM_FIELD, token)
        .add_text("first_name", "Ada")
        .add_text("last_name", "Lovelace")
        .add_text("position", "Engineer")
        .add_text("email", "ada@example.com")
}
