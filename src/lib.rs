//! cdn-store - A small file storage service with role-based access control
//!
//! This crate provides:
//! - A file store keyed by opaque ids, persisted in an embedded redb database
//! - An identity & role registry (Viewer, Publisher, Admin) with an
//!   always-one-Admin invariant
//! - A mutable runtime policy (upload limit, uploads switch, serving domain)
//! - A request router that authorizes and executes one call at a time
//! - A REST API with bearer sessions and multipart upload support

pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use tokio::sync::Mutex;

use api::session::SessionStore;
use config::Config;
use service::Service;

/// Shared application state
pub struct AppState {
    pub config: Config,
    /// The router. The mutex is FIFO, so calls run one at a time in arrival order.
    pub service: Mutex<Service>,
    pub sessions: SessionStore,
}
