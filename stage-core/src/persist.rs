//! Document file I/O.

use std::path::Path;

use crate::document::SceneDocument;
use crate::error::StageResult;

/// Write the exported document to `path`.
///
/// # Errors
///
/// Returns [`StageError::Io`](crate::StageError::Io) if the file cannot be
/// written.
pub fn save_document(document: &SceneDocument, path: impl AsRef<Path>) -> StageResult<()> {
    let path = path.as_ref();
    let bytes = document.export_json()?;
    if let Err(e) = std::fs::write(path, &bytes) {
        tracing::warn!("Failed to save scene to {}: {e}", path.display());
        return Err(e.into());
    }
    tracing::debug!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Replace `document` with the scene stored at `path`.
///
/// On error the document is unchanged.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a scene.
pub fn load_document(document: &mut SceneDocument, path: impl AsRef<Path>) -> StageResult<()> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        tracing::warn!("Failed to read scene {}: {e}", path.display());
        e
    })?;
    document.load_json(&bytes)
}
