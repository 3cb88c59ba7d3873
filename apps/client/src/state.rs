use std::sync::Arc;

use tracing::info;

use crate::api::ApiClient;
use crate::auth::TokenStore;
use crate::config::Config;
use crate::context::ContextStore;

/// Shared session state wired once at startup and handed to the presentation
/// shell. Clones share the same underlying token store, API client, and
/// context store.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: TokenStore,
    pub api: Arc<ApiClient>,
    pub store: Arc<ContextStore>,
}

impl AppState {
    pub fn initialize(config: Config) -> Self {
        let auth = TokenStore::new();

        let api = Arc::new(ApiClient::new(
            config.api_base_url.clone(),
            config.request_timeout,
            auth.clone(),
        ));
        info!("API client initialized (base: {})", config.api_base_url);

        let store = Arc::new(ContextStore::new(api.clone(), config.sync_debounce));
        info!(
            "Context store initialized (debounce: {}ms)",
            config.sync_debounce.as_millis()
        );

        Self {
            config,
            auth,
            api,
            store,
        }
    }
}
