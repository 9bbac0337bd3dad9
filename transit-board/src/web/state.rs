//! Application state for the web layer.

use std::sync::Arc;

use crate::service::TransitService;

/// Shared application state.
pub struct AppState<S> {
    /// Catalog, feeds and arrival snapshot
    pub transit: Arc<TransitService<S>>,
}

impl<S> AppState<S> {
    pub fn new(transit: Arc<TransitService<S>>) -> Self {
        Self { transit }
    }
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            transit: Arc::clone(&self.transit),
        }
    }
}
