use std::sync::Arc;

use pdf2docx_core::{
    ArtifactLocks, DocumentConverter, PdfBackend, RemovalScheduler, Settings, Storage,
    StorageError,
};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub settings: Settings,
    pub storage: Storage,
    pub converter: Arc<dyn DocumentConverter>,
    pub backend: Arc<dyn PdfBackend>,
    pub removals: RemovalScheduler,
    pub locks: ArtifactLocks,
}

impl AppState {
    /// Create the state and make sure both storage directories exist.
    pub fn new(
        settings: Settings,
        converter: Arc<dyn DocumentConverter>,
        backend: Arc<dyn PdfBackend>,
    ) -> Result<Self, StorageError> {
        let storage = Storage::new(&settings.upload_dir, &settings.converted_dir);
        storage.ensure()?;

        Ok(Self {
            settings,
            storage,
            converter,
            backend,
            removals: RemovalScheduler::new(),
            locks: ArtifactLocks::new(),
        })
    }
}
