//! Gradpilot client core.
//!
//! Headless client-side state and API layer for the Gradpilot career
//! assistant. The crate owns the session-wide shared context (one CV file and
//! one job-description string), keeps every registered UI slot consistent
//! with it, and replicates it to the backend: immediately for file changes,
//! debounced for text. A presentation shell drives the crate through
//! [`context::ContextCommand`]s and reads slot state back out; it owns no
//! part of the shared context itself.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod state;
pub mod telemetry;
