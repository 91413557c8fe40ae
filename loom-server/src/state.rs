//! Composition root (§9 re-architecture note: "construct both in a
//! composition root at startup, inject by reference" — `AppState` holds
//! the single shared `SessionManager` and generator for the process).

use std::sync::Arc;

use loom_session::{SessionManager, WireframeGenerator};

#[derive(Clone)]
pub struct AppState {
    pub session_manager: Arc<SessionManager>,
    pub generator: Arc<dyn WireframeGenerator>,
}
