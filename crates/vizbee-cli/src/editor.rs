//! External editor for dataset queries.
//!
//! Uses `$VISUAL`, then `$EDITOR`, then `vi`.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Failed to create temp file: {0}")]
    TempFile(#[from] io::Error),

    #[error("Editor command failed: {0}")]
    CommandFailed(String),

    #[error("Failed to read edited content: {0}")]
    ReadFailed(io::Error),
}

/// The user's preferred editor command, possibly with arguments.
pub fn find_editor() -> String {
    ["VISUAL", "EDITOR"]
        .into_iter()
        .filter_map(|var| env::var(var).ok())
        .find(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

/// Let the user edit `initial` in their editor; returns the saved text
/// without trailing whitespace.
pub fn edit(initial: &str, extension: &str) -> Result<String, EditorError> {
    edit_with(&find_editor(), initial, extension)
}

pub fn edit_with(editor: &str, initial: &str, extension: &str) -> Result<String, EditorError> {
    let file = create_temp_file(initial, extension)?;
    run_editor(editor, file.path())?;
    let content = fs::read_to_string(file.path()).map_err(EditorError::ReadFailed)?;
    Ok(content.trim_end().to_string())
}

fn create_temp_file(content: &str, extension: &str) -> Result<NamedTempFile, EditorError> {
    let mut file = tempfile::Builder::new()
        .prefix("vizbee-")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// `editor` may carry arguments, e.g. `code --wait`.
fn run_editor(editor: &str, path: &Path) -> Result<(), EditorError> {
    let mut parts = editor.split_whitespace();
    let cmd = parts
        .next()
        .ok_or_else(|| EditorError::CommandFailed("empty editor command".into()))?;

    let status = Command::new(cmd)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|e| EditorError::CommandFailed(format!("{cmd}: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(EditorError::CommandFailed(format!(
            "Editor exited with status: {status}"
        )))
    }
}
