use std::sync::Arc;

use crate::blobs::BlobStore;
use crate::config::Config;
use crate::services::SessionService;
use crate::store::Store;
use crate::websocket::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub blobs: Arc<dyn BlobStore>,
    pub registry: ConnectionRegistry,
    pub sessions: Arc<SessionService>,
    pub config: Arc<Config>,
}
