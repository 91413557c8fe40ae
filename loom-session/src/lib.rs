//! The Session Manager and Version Manager (§4.2, §4.4): the orchestrator
//! that composes the State Store and Context Engine into session
//! lifecycle, edit application, history, and integrity/metrics reporting.

pub mod generator;
pub mod session_manager;
pub mod version_manager;

pub use generator::{placeholder_wireframe, PlaceholderGenerator, TimeoutGenerator, WireframeGenerator};
pub use session_manager::SessionManager;
pub use version_manager::VersionManager;
