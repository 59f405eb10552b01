use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use pragma_engine::{Command, EngineRegistry};
use pragma_types::{Collection, Document};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Name of the collection seeded by [`PragmaServer::seed_demo`].
pub const DEMO_COLLECTION: &str = "test";

/// PragmaDB HTTP server.
pub struct PragmaServer {
    config: ServerConfig,
    registry: Arc<EngineRegistry>,
}

impl PragmaServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry(config, Arc::new(EngineRegistry::new()))
    }

    pub fn with_registry(config: ServerConfig, registry: Arc<EngineRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(
            AppState::new(Arc::clone(&self.registry)),
            self.config.max_body_size,
        )
    }

    /// Install configured snapshot imports and, if enabled, the demo data.
    pub async fn bootstrap(&self) -> ServerResult<()> {
        for path in &self.config.import {
            let collection = pragma_ketchup::import_from_path(path)?;
            Collection::validate_name(collection.name())?;
            self.registry.install(collection)?;
        }
        if self.config.seed_demo {
            self.seed_demo().await?;
        }
        Ok(())
    }

    /// Seed the `test` collection: two revisions of Alfred and a text note.
    pub async fn seed_demo(&self) -> ServerResult<()> {
        let engine = self.registry.create_or_get(DEMO_COLLECTION)?;
        let alfred = engine
            .insert(Document::json(r#"{"name":"Alfred","age":24}"#))
            .await?;

        let (note, note_reply) = Command::insert(Document::text("This is just some plain text"));
        let (update, update_reply) =
            Command::update(alfred.id, r#"{"name":"Alfred","age":25}"#, Some(alfred.revision));
        engine.accept_all([note, update]);
        note_reply.await?;
        update_reply.await?;

        info!(collection = DEMO_COLLECTION, "seeded demo collection");
        Ok(())
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            addr = %self.config.bind_addr,
            collections = self.registry.len(),
            "PragmaDB server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = PragmaServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:8081".parse().unwrap());
        assert!(server.registry().is_empty());
    }

    #[test]
    fn router_builds() {
        let server = PragmaServer::new(ServerConfig::default());
        let _router = server.router();
    }

    #[tokio::test]
    async fn demo_seed_has_three_revisions() {
        let server = PragmaServer::new(ServerConfig {
            seed_demo: true,
            ..ServerConfig::default()
        });
        server.bootstrap().await.unwrap();

        let engine = server.registry().find(DEMO_COLLECTION).unwrap();
        assert_eq!(engine.get_all(false).await.unwrap().len(), 2);
        assert_eq!(engine.get_all(true).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn bootstrap_installs_imports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.ketchup");
        let mut collection = Collection::new("people");
        let stored = collection.save(Document::json("{}"));
        pragma_ketchup::export_to_path(&collection, &path).unwrap();

        let server = PragmaServer::new(ServerConfig {
            import: vec![path],
            ..ServerConfig::default()
        });
        server.bootstrap().await.unwrap();

        let engine = server.registry().find("people").unwrap();
        assert_eq!(engine.get(stored.id, None).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn bootstrap_rejects_unroutable_import_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spaced.ketchup");
        pragma_ketchup::export_to_path(&Collection::new("my docs"), &path).unwrap();

        let server = PragmaServer::new(ServerConfig {
            import: vec![path],
            ..ServerConfig::default()
        });
        let err = server.bootstrap().await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(server.registry().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_rejects_duplicate_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.ketchup");
        pragma_ketchup::export_to_path(&Collection::new("dup"), &path).unwrap();

        let server = PragmaServer::new(ServerConfig {
            import: vec![path.clone(), path],
            ..ServerConfig::default()
        });
        let err = server.bootstrap().await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    }
}
