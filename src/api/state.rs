use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::storage::StorageConfig;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageConfig>,
    pub fetcher: Arc<Fetcher>,
}
