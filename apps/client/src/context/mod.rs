//! Session-shared context: the canonical CV file + job-description state,
//! the slot registry that keeps independent input widgets consistent, and
//! the replication machinery that pushes the combined context to the backend.

pub mod command;
pub mod scheduler;
pub mod slots;
pub mod store;

pub use command::ContextCommand;
pub use slots::{FieldKind, SlotBinding};
pub use store::{Context, ContextPusher, ContextStore, CvFile};
