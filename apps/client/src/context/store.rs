use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::command::ContextCommand;
use crate::context::scheduler::DebounceScheduler;
use crate::context::slots::{FieldKind, SlotBinding, SlotRegistry};
use crate::errors::ApiError;

/// The uploaded CV: raw bytes plus the name and MIME type the backend sees
/// in the multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct CvFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Bytes,
}

impl CvFile {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes,
        }
    }

    /// Loads a CV from disk, taking the file name from the path and the MIME
    /// type from the extension. Convenience for non-browser shells.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("No usable file name in path {}", path.display()))?
            .to_string();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read CV file {}", path.display()))?;
        let mime_type = match path.extension().and_then(|e| e.to_str()) {
            Some("pdf") => Some("application/pdf".to_string()),
            _ => None,
        };
        Ok(Self {
            name,
            mime_type,
            bytes: Bytes::from(bytes),
        })
    }
}

/// The session-wide shared state: current CV file and job-description text.
/// Both start empty and live exactly as long as the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub file: Option<CvFile>,
    pub job_text: String,
}

impl Context {
    /// An entirely empty context is never worth replicating.
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.job_text.is_empty()
    }
}

/// Replication seam between the store and the backend. The store hands over
/// a full snapshot every time; the server treats each push as
/// replace-whole-context, so pushes are idempotent and last-write-wins.
#[async_trait]
pub trait ContextPusher: Send + Sync {
    async fn push_context(&self, snapshot: Context) -> Result<(), ApiError>;
}

struct State {
    context: Context,
    slots: SlotRegistry,
}

struct Shared {
    session_id: Uuid,
    state: Mutex<State>,
    pusher: Arc<dyn ContextPusher>,
    last_pushed_at: Mutex<Option<DateTime<Utc>>>,
}

impl Shared {
    /// Best-effort replication of the current context. Reads the snapshot at
    /// call time, skips the network entirely when there is nothing to send,
    /// and swallows failures: local state is already correct and
    /// authoritative, so a lost push only means the server catches up on the
    /// next one.
    async fn push(&self) {
        let snapshot = self
            .state
            .lock()
            .expect("context lock poisoned")
            .context
            .clone();

        if snapshot.is_empty() {
            debug!(session_id = %self.session_id, "context empty; skipping sync");
            return;
        }

        match self.pusher.push_context(snapshot).await {
            Ok(()) => {
                *self
                    .last_pushed_at
                    .lock()
                    .expect("context lock poisoned") = Some(Utc::now());
                debug!(session_id = %self.session_id, "context synced to backend");
            }
            Err(e) => warn!(session_id = %self.session_id, "failed to sync context: {e}"),
        }
    }
}

/// Canonical owner of the shared context. One instance per session,
/// constructed at startup and handed by reference to whatever wires up the
/// UI; all mutation goes through [`set_file`](ContextStore::set_file),
/// [`set_text`](ContextStore::set_text), or [`dispatch`](ContextStore::dispatch).
///
/// Slot propagation is synchronous: by the time a setter returns, every
/// registered slot of that kind (except the source) reflects the new value,
/// and only then is a push issued or scheduled. File updates replicate
/// immediately; text updates are debounced so only the last call in a typing
/// burst reaches the network, carrying whatever the context holds when the
/// quiet period ends.
pub struct ContextStore {
    shared: Arc<Shared>,
    scheduler: DebounceScheduler,
    debounce: Duration,
}

impl ContextStore {
    pub fn new(pusher: Arc<dyn ContextPusher>, debounce: Duration) -> Self {
        let session_id = Uuid::new_v4();
        info!(%session_id, "context store created");
        Self {
            shared: Arc::new(Shared {
                session_id,
                state: Mutex::new(State {
                    context: Context::default(),
                    slots: SlotRegistry::default(),
                }),
                pusher,
                last_pushed_at: Mutex::new(None),
            }),
            scheduler: DebounceScheduler::new(),
            debounce,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    /// Registers a slot the store must keep synchronized from now on.
    pub fn register_slot(&self, kind: FieldKind, binding: SlotBinding) {
        self.shared
            .state
            .lock()
            .expect("context lock poisoned")
            .slots
            .register(kind, binding);
    }

    /// Stores `file` as the session CV, mirrors its name into every other
    /// file slot, and immediately pushes the combined context. A file pick
    /// is a discrete, rare event, so it skips the text debounce entirely:
    /// it neither waits for it nor resets it.
    pub fn set_file(&self, file: CvFile, source_id: &str) {
        {
            let mut state = self.shared.state.lock().expect("context lock poisoned");
            state.slots.propagate_file_name(&file.name, source_id);
            state.context.file = Some(file);
        }
        debug!(source = source_id, "cv updated; pushing context");
        let shared = self.shared.clone();
        tokio::spawn(async move { shared.push().await });
    }

    /// Stores `text` as the session job description, mirrors it into every
    /// other text slot, and (re)schedules the debounced push. The scheduled
    /// task snapshots the context when it fires, so a burst of edits
    /// replicates only its final state.
    pub fn set_text(&self, text: &str, source_id: &str) {
        {
            let mut state = self.shared.state.lock().expect("context lock poisoned");
            state.context.job_text = text.to_string();
            state.slots.propagate_text(text, source_id);
        }
        let shared = self.shared.clone();
        self.scheduler
            .schedule(self.debounce, async move { shared.push().await });
    }

    /// Command-shaped entry point for presentation layers.
    pub fn dispatch(&self, command: ContextCommand) {
        match command {
            ContextCommand::SetFile { file, source } => self.set_file(file, &source),
            ContextCommand::SetText { text, source } => self.set_text(&text, &source),
        }
    }

    pub fn context(&self) -> Context {
        self.shared
            .state
            .lock()
            .expect("context lock poisoned")
            .context
            .clone()
    }

    pub fn job_text(&self) -> String {
        self.context().job_text
    }

    pub fn file_name(&self) -> Option<String> {
        self.context().file.map(|f| f.name)
    }

    pub fn slot_value(&self, id: &str) -> Option<String> {
        self.shared
            .state
            .lock()
            .expect("context lock poisoned")
            .slots
            .value_of(id)
            .map(String::from)
    }

    pub fn slot_label(&self, id: &str) -> Option<String> {
        self.shared
            .state
            .lock()
            .expect("context lock poisoned")
            .slots
            .get(id)
            .and_then(|s| s.label.clone())
    }

    /// Whether the slot currently shows the propagated-change indicator.
    pub fn slot_changed(&self, id: &str) -> Option<bool> {
        self.shared
            .state
            .lock()
            .expect("context lock poisoned")
            .slots
            .get(id)
            .map(|s| s.changed)
    }

    /// True while a debounced text push is waiting for its quiet period.
    pub fn is_sync_scheduled(&self) -> bool {
        self.scheduler.is_scheduled()
    }

    pub fn last_pushed_at(&self) -> Option<DateTime<Utc>> {
        *self
            .shared
            .last_pushed_at
            .lock()
            .expect("context lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DEBOUNCE: Duration = Duration::from_millis(1000);

    /// Records every snapshot it is handed, in arrival order.
    #[derive(Default)]
    struct RecordingPusher {
        pushes: Mutex<Vec<Context>>,
    }

    impl RecordingPusher {
        fn pushed(&self) -> Vec<Context> {
            self.pushes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContextPusher for RecordingPusher {
        async fn push_context(&self, snapshot: Context) -> Result<(), ApiError> {
            self.pushes.lock().unwrap().push(snapshot);
            Ok(())
        }
    }

    struct FailingPusher;

    #[async_trait]
    impl ContextPusher for FailingPusher {
        async fn push_context(&self, _snapshot: Context) -> Result<(), ApiError> {
            Err(ApiError::Api {
                status: 503,
                message: "backend down".to_string(),
            })
        }
    }

    fn store_with_recorder() -> (ContextStore, Arc<RecordingPusher>) {
        let pusher = Arc::new(RecordingPusher::default());
        let store = ContextStore::new(pusher.clone(), DEBOUNCE);
        store.register_slot(FieldKind::Text, SlotBinding::new("job-description"));
        store.register_slot(
            FieldKind::Text,
            SlotBinding::new("analysis-job-description"),
        );
        store.register_slot(FieldKind::File, SlotBinding::new("cv-file"));
        store.register_slot(
            FieldKind::File,
            SlotBinding::with_display("analysis-cv-file", "analysis-file-name"),
        );
        store.register_slot(
            FieldKind::File,
            SlotBinding::with_display("profile-cv-file", "profile-file-name"),
        );
        (store, pusher)
    }

    fn sample_cv() -> CvFile {
        CvFile::new(
            "cv.pdf",
            Some("application/pdf".to_string()),
            Bytes::from_static(b"%PDF-1.4 fake"),
        )
    }

    /// Lets timer tasks and detached pushes run on the current-thread test
    /// runtime.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_propagates_synchronously_before_any_push() {
        let (store, pusher) = store_with_recorder();

        store.set_text("Backend engineer", "analysis-job-description");

        assert_eq!(
            store.slot_value("job-description").as_deref(),
            Some("Backend engineer")
        );
        // Source slot untouched by propagation; it already holds the text
        // from direct input.
        assert_eq!(
            store.slot_value("analysis-job-description").as_deref(),
            Some("")
        );
        assert!(pusher.pushed().is_empty());
        assert!(store.is_sync_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_burst_collapses_to_one_push_with_latest_value() {
        let (store, pusher) = store_with_recorder();

        store.set_text("Backend engineer", "analysis-job-description");
        tokio::time::advance(Duration::from_millis(200)).await;
        store.set_text("Backend engineer role", "analysis-job-description");

        tokio::time::advance(Duration::from_millis(1100)).await;
        settle().await;

        let pushes = pusher.pushed();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].job_text, "Backend engineer role");
        assert!(!store.is_sync_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_pushes_immediately_without_debounce() {
        let (store, pusher) = store_with_recorder();

        store.set_file(sample_cv(), "cv-file");
        settle().await;

        let pushes = pusher.pushed();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].file.as_ref().unwrap().name, "cv.pdf");
        assert!(!store.is_sync_scheduled());
        assert!(store.last_pushed_at().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_propagation_skips_source_and_marks_changed() {
        let (store, _pusher) = store_with_recorder();

        store.set_file(sample_cv(), "analysis-cv-file");

        assert_eq!(store.slot_value("cv-file").as_deref(), Some("cv.pdf"));
        assert_eq!(
            store.slot_label("profile-cv-file").as_deref(),
            Some("cv.pdf")
        );
        assert_eq!(store.slot_changed("profile-cv-file"), Some(true));
        assert_eq!(store.slot_value("analysis-cv-file").as_deref(), Some(""));
        assert_eq!(store.slot_changed("analysis-cv-file"), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_push_leaves_pending_text_timer_alone() {
        let (store, pusher) = store_with_recorder();

        store.set_text("Backend engineer role", "job-description");
        tokio::time::advance(Duration::from_millis(200)).await;

        store.set_file(sample_cv(), "cv-file");
        settle().await;

        // Immediate file push carries the combined context.
        let pushes = pusher.pushed();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].job_text, "Backend engineer role");
        assert!(pushes[0].file.is_some());
        assert!(store.is_sync_scheduled());

        // The text timer still fires on its original schedule.
        tokio::time::advance(Duration::from_millis(900)).await;
        settle().await;

        assert_eq!(pusher.pushed().len(), 2);
        assert!(!store.is_sync_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_context_push_makes_no_network_call() {
        let (store, pusher) = store_with_recorder();

        store.set_text("", "job-description");
        tokio::time::advance(Duration::from_millis(1100)).await;
        settle().await;

        assert!(pusher.pushed().is_empty());
        assert!(store.last_pushed_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_failure_is_swallowed_and_state_kept() {
        let store = ContextStore::new(Arc::new(FailingPusher), DEBOUNCE);
        store.register_slot(FieldKind::Text, SlotBinding::new("job-description"));

        store.set_file(sample_cv(), "cv-file");
        store.set_text("Backend engineer", "analysis-job-description");
        tokio::time::advance(Duration::from_millis(1100)).await;
        settle().await;

        // Local state stays authoritative; only the server is behind.
        assert_eq!(store.file_name().as_deref(), Some("cv.pdf"));
        assert_eq!(store.job_text(), "Backend engineer");
        assert!(store.last_pushed_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_routes_commands() {
        let (store, pusher) = store_with_recorder();

        store.dispatch(ContextCommand::SetText {
            text: "Backend engineer".to_string(),
            source: "job-description".to_string(),
        });
        store.dispatch(ContextCommand::SetFile {
            file: sample_cv(),
            source: "cv-file".to_string(),
        });

        assert_eq!(
            store.slot_value("analysis-job-description").as_deref(),
            Some("Backend engineer")
        );
        assert_eq!(
            store.slot_value("analysis-cv-file").as_deref(),
            Some("cv.pdf")
        );

        tokio::time::advance(Duration::from_millis(1100)).await;
        settle().await;

        // One immediate file push plus one debounced text push.
        assert_eq!(pusher.pushed().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_text_push_reads_context_at_fire_time() {
        let (store, pusher) = store_with_recorder();

        store.set_text("Backend engineer role", "job-description");
        tokio::time::advance(Duration::from_millis(500)).await;

        // File arrives while the text timer is still pending; the text push
        // must carry it anyway.
        store.set_file(sample_cv(), "cv-file");
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;

        let pushes = pusher.pushed();
        assert_eq!(pushes.len(), 2);
        let last = pushes.last().unwrap();
        assert_eq!(last.file.as_ref().unwrap().name, "cv.pdf");
        assert_eq!(last.job_text, "Backend engineer role");
    }

    #[test]
    fn test_cv_file_from_path_reads_name_mime_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.4 fake").unwrap();

        let cv = CvFile::from_path(&path).unwrap();
        assert_eq!(cv.name, "resume.pdf");
        assert_eq!(cv.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(cv.bytes, Bytes::from_static(b"%PDF-1.4 fake"));
    }

    #[test]
    fn test_cv_file_from_path_missing_file_errors() {
        assert!(CvFile::from_path("/definitely/not/here.pdf").is_err());
    }

    #[test]
    fn test_context_is_empty() {
        assert!(Context::default().is_empty());
        assert!(!Context {
            file: None,
            job_text: "x".to_string(),
        }
        .is_empty());
    }
}
