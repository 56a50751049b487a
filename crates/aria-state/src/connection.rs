//! SurrealDB connection setup
//!
//! Resolves where memory records live (in-memory, local SurrealKV directory,
//! explicit URL, or SurrealDB Cloud) and opens a ready-to-use connection with
//! the schema initialized.

use std::path::PathBuf;

use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::info;

use crate::error::StorageError;
use crate::migrations;
use crate::storage_traits::StorageResult;

pub const DEFAULT_NAMESPACE: &str = "aria";
pub const DEFAULT_DATABASE: &str = "memory";
/// Local database directory used when nothing else is configured.
pub const DEFAULT_LOCAL_PATH: &str = ".aria/db";
/// Environment variable naming an explicit SurrealDB URL.
pub const DB_URL_ENV: &str = "ARIA_DB_URL";

/// Configuration for SurrealDB Cloud connection
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "aria")
    /// - SURREALDB_DATABASE (optional, default: "memory")
    /// - SURREALDB_ROOT (optional, default: "false")
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("SURREALDB_ENDPOINT").map_err(|_| "SURREALDB_ENDPOINT not set")?;
        let username =
            std::env::var("SURREALDB_USERNAME").map_err(|_| "SURREALDB_USERNAME not set")?;
        let password =
            std::env::var("SURREALDB_PASSWORD").map_err(|_| "SURREALDB_PASSWORD not set")?;
        let namespace = std::env::var("SURREALDB_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database =
            std::env::var("SURREALDB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let is_root = std::env::var("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// Where the memory store keeps its data.
#[derive(Debug, Clone)]
pub enum StoreLocation {
    /// Process-local, discarded on exit (`mem://`)
    Memory,
    /// SurrealKV files under a local directory
    Local(PathBuf),
    /// Any URL the SurrealDB `any` engine accepts
    Url(String),
    /// Authenticated SurrealDB Cloud instance
    Cloud(CloudConfig),
}

impl StoreLocation {
    /// Resolve from the environment: cloud credentials, then `ARIA_DB_URL`,
    /// then the default local directory.
    pub fn from_env() -> Self {
        if let Ok(config) = CloudConfig::from_env() {
            return StoreLocation::Cloud(config);
        }
        if let Ok(url) = std::env::var(DB_URL_ENV) {
            return StoreLocation::parse(&url);
        }
        StoreLocation::Local(PathBuf::from(DEFAULT_LOCAL_PATH))
    }

    /// Parse a user-supplied location: `memory`, a URL with a scheme, or a
    /// filesystem path.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("memory") || spec == "mem://" {
            StoreLocation::Memory
        } else if spec.contains("://") {
            StoreLocation::Url(spec.to_string())
        } else {
            StoreLocation::Local(PathBuf::from(spec))
        }
    }

    /// Human-readable location without credentials.
    pub fn describe(&self) -> String {
        match self {
            StoreLocation::Memory => "mem://".to_string(),
            StoreLocation::Local(path) => format!("surrealkv://{}", path.display()),
            StoreLocation::Url(url) => url.clone(),
            StoreLocation::Cloud(config) => config.endpoint.clone(),
        }
    }
}

/// Open a connection to `location`, select the ARIA namespace/database and
/// initialize the schema.
pub async fn connect(location: &StoreLocation) -> StorageResult<Surreal<Any>> {
    let (db, namespace, database) = match location {
        StoreLocation::Memory => (open("mem://").await?, DEFAULT_NAMESPACE, DEFAULT_DATABASE),
        StoreLocation::Local(path) => {
            std::fs::create_dir_all(path).map_err(|e| {
                StorageError::Connection(format!(
                    "failed to create database directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let url = format!("surrealkv://{}", path.display());
            (open(&url).await?, DEFAULT_NAMESPACE, DEFAULT_DATABASE)
        }
        StoreLocation::Url(url) => (open(url).await?, DEFAULT_NAMESPACE, DEFAULT_DATABASE),
        StoreLocation::Cloud(config) => {
            let db = open(&config.endpoint).await?;
            if config.is_root {
                db.signin(Root {
                    username: &config.username,
                    password: &config.password,
                })
                .await
                .map_err(|e| StorageError::Connection(format!("root auth failed: {e}")))?;
            } else {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &config.username,
                    password: &config.password,
                })
                .await
                .map_err(|e| StorageError::Connection(format!("database auth failed: {e}")))?;
            }
            (db, config.namespace.as_str(), config.database.as_str())
        }
    };

    db.use_ns(namespace)
        .use_db(database)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    migrations::init_schema(&db).await?;
    info!(location = %location.describe(), "memory store connected");
    Ok(db)
}

async fn open(url: &str) -> StorageResult<Surreal<Any>> {
    surrealdb::engine::any::connect(url)
        .await
        .map_err(|e| StorageError::Connection(format!("failed to connect to {url}: {e}")))
}
