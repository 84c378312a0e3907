//! Opening files into the editor and saving them back.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{IdeError, Result};

use super::EditorFacade;

/// Read `path` and replace the editor contents with it.
///
/// On failure the editor is left exactly as it was.
pub fn open_file(path: &Path, editor: &mut dyn EditorFacade) -> Result<()> {
    let text = fs::read_to_string(path).map_err(|source| IdeError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    editor.set_text(&text);
    info!("Opened {} ({} bytes)", path.display(), text.len());
    Ok(())
}

/// Write the editor contents to `path`, replacing any existing file.
pub fn save_file(path: &Path, editor: &dyn EditorFacade) -> Result<()> {
    let text = editor.text();
    fs::write(path, &text).map_err(|source| IdeError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved {} ({} bytes)", path.display(), text.len());
    Ok(())
}
