use crate::context::store::CvFile;

/// A user action on the shared context, produced by the presentation layer
/// and consumed by [`crate::context::ContextStore::dispatch`]. Keeping the
/// seam command-shaped means the store's logic is testable without any UI
/// framework in the loop.
#[derive(Debug, Clone)]
pub enum ContextCommand {
    /// A file was chosen in the widget identified by `source`.
    SetFile { file: CvFile, source: String },
    /// Text was entered in the widget identified by `source`.
    SetText { text: String, source: String },
}

impl ContextCommand {
    /// Id of the widget the command originated from.
    pub fn source(&self) -> &str {
        match self {
            ContextCommand::SetFile { source, .. } => source,
            ContextCommand::SetText { source, .. } => source,
        }
    }
}
