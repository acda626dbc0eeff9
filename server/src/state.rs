use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::storage::Storage;
use crate::store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<SessionStore>>,
    pub storage: Arc<dyn Storage>,
    /// Held from taking a snapshot until it is written, so saves land in order.
    pub save_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: SessionStore, storage: Arc<dyn Storage>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            storage,
            save_lock: Arc::new(Mutex::new(())),
        }
    }
}
