//! # Strata Server
//!
//! Serves any `strata_store::Store` over HTTP+JSON. Each exposed kind gets
//! a method allow-list; requests outside it are rejected with 405. The
//! back-end is wrapped in the [`InternalStore`] decorator so identity
//! tokens and timestamps are always assigned server-side, regardless of
//! what clients send.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_server::{expose, Action, RestServer};
//! use strata_store::{MemoryStore, Schema};
//!
//! # async fn run(schema: Arc<Schema>) -> std::io::Result<()> {
//! let backend = Arc::new(MemoryStore::new(schema.clone()));
//! let server = RestServer::new(
//!     schema,
//!     backend,
//!     vec![expose(
//!         "World",
//!         &[Action::Get, Action::Create, Action::Update, Action::Delete],
//!     )],
//! );
//! let handle = server.serve("0.0.0.0:8000").await?;
//! handle.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod internal;
pub mod query;
mod routes;

pub use error::ServerError;
pub use internal::InternalStore;

use axum::http::Method;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use strata_store::{Schema, Store};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Operations a kind can be exposed for, keyed to HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Get,
    Create,
    Update,
    Delete,
}

impl Action {
    pub(crate) fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Action::Get),
            Method::POST => Some(Action::Create),
            Method::PUT => Some(Action::Update),
            Method::DELETE => Some(Action::Delete),
            _ => None,
        }
    }
}

/// A kind and its method allow-list.
pub struct Expose {
    kind: String,
    actions: Vec<Action>,
}

/// Expose one kind with the given allow-list.
pub fn expose(kind: impl Into<String>, actions: &[Action]) -> Expose {
    Expose {
        kind: kind.into(),
        actions: actions.to_vec(),
    }
}

/// State shared across handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) schema: Arc<Schema>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) exposed: Arc<HashMap<String, Vec<Action>>>,
}

/// The REST server: schema + back-end + per-kind allow-lists.
pub struct RestServer {
    state: AppState,
}

impl RestServer {
    pub fn new(schema: Arc<Schema>, backend: Arc<dyn Store>, exposed: Vec<Expose>) -> Self {
        let store = Arc::new(InternalStore::new(schema.clone(), backend));
        let exposed = exposed
            .into_iter()
            .map(|e| (e.kind.to_lowercase(), e.actions))
            .collect();

        Self {
            state: AppState {
                schema,
                store,
                exposed: Arc::new(exposed),
            },
        }
    }

    /// The assembled router, for embedding or tests.
    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    /// Bind and serve. Returns once the listener is up.
    pub async fn serve(self, addr: &str) -> std::io::Result<ServerHandle> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        let (shutdown, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(err) = serve.await {
                tracing::error!("server error: {err}");
            }
        });

        tracing::info!("listening on {addr}");
        Ok(ServerHandle {
            addr,
            shutdown,
            task,
        })
    }
}

/// A running server: its bound address and a graceful-shutdown handle.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL clients should use.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shut the listener down and wait for in-flight requests.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }

    /// Block until the server exits on its own.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}
