//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use positions_core::ports::TokenVerifier;
use positions_core::PositionService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// Everything in it is immutable; the only shared resource underneath is the pool.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PositionService>,
    pub config: Arc<Config>,
    pub tokens: Arc<dyn TokenVerifier>,
}
