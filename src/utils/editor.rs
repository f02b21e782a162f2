//! External editor handoff.
//!
//! The transcript is written to a scoped temporary file and opened in the
//! user's editor with inherited stdio. The caller is responsible for giving
//! up the terminal first. The temporary file is removed when the handoff
//! returns, whether the editor succeeded or not.

use std::error::Error as StdError;
use std::fmt;
use std::io::Write;
use std::process::{Command, ExitStatus};
use tempfile::Builder;
use tracing::{info, warn};

pub const DEFAULT_EDITOR: &str = "vim";

#[derive(Debug)]
pub enum EditorError {
    TempFile(std::io::Error),
    Launch {
        editor: String,
        source: std::io::Error,
    },
    Exit {
        editor: String,
        status: ExitStatus,
    },
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::TempFile(source) => {
                write!(f, "Failed to prepare a temporary file: {source}")
            }
            EditorError::Launch { editor, source } => {
                write!(f, "Failed to launch editor '{editor}': {source}")
            }
            EditorError::Exit { editor, status } => {
                write!(f, "Editor '{editor}' exited with {status}")
            }
        }
    }
}

impl StdError for EditorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            EditorError::TempFile(source) | EditorError::Launch { source, .. } => Some(source),
            EditorError::Exit { .. } => None,
        }
    }
}

/// `$EDITOR`, or vim when unset or blank.
pub fn editor_command() -> String {
    std::env::var("EDITOR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Open `transcript` in `editor` and block until it exits.
///
/// `editor` may carry arguments (`code --wait`); it is split on whitespace.
pub fn open_in_editor(editor: &str, transcript: &str) -> Result<(), EditorError> {
    let mut temp_file = Builder::new()
        .prefix("gail-")
        .suffix(".md")
        .tempfile()
        .map_err(EditorError::TempFile)?;
    temp_file
        .write_all(transcript.as_bytes())
        .and_then(|_| temp_file.flush())
        .map_err(EditorError::TempFile)?;

    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or(DEFAULT_EDITOR);
    info!(editor = program, path = %temp_file.path().display(), "opening transcript in editor");

    let status = Command::new(program)
        .args(parts)
        .arg(temp_file.path())
        .status()
        .map_err(|source| EditorError::Launch {
            editor: editor.to_string(),
            source,
        })?;

    if !status.success() {
        warn!(%status, "editor exited unsuccessfully");
        return Err(EditorError::Exit {
            editor: editor.to_string(),
            status,
        });
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn editor_receives_transcript_file() {
        let out_dir = TempDir::new().unwrap();
        let copy = out_dir.path().join("seen.md");
        let script = out_dir.path().join("fake-editor.sh");
        fs::write(&script, format!("#!/bin/sh\ncp \"$1\" {}\n", copy.display())).unwrap();

        open_in_editor(&format!("sh {}", script.display()), "You: hi\n\nGail: hello").unwrap();

        assert_eq!(fs::read_to_string(&copy).unwrap(), "You: hi\n\nGail: hello");
    }

    #[test]
    fn temp_file_is_removed_even_when_editor_fails() {
        let out_dir = TempDir::new().unwrap();
        let record = out_dir.path().join("path.txt");
        let script = out_dir.path().join("failing-editor.sh");
        fs::write(
            &script,
            format!("#!/bin/sh\nprintf '%s' \"$1\" > {}\nexit 3\n", record.display()),
        )
        .unwrap();

        let err = open_in_editor(&format!("sh {}", script.display()), "text").unwrap_err();

        assert!(matches!(err, EditorError::Exit { .. }));
        let temp_path = fs::read_to_string(&record).unwrap();
        assert!(temp_path.ends_with(".md"));
        assert!(!std::path::Path::new(&temp_path).exists());
    }

    #[test]
    fn missing_editor_is_a_launch_error() {
        let err = open_in_editor("gail-no-such-editor-binary", "text").unwrap_err();
        assert!(matches!(err, EditorError::Launch { .. }));
    }
}
