use std::{io, path::Path};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    CredlifyResult,
};

/// Writes `write_context` into a brand new file at `file_path`.
///
/// The file is opened in exclusive-create mode: if anything already exists at the
/// destination the write is refused and nothing on disk changes. Parent directories are
/// never created here; the structure stage owns directory creation.
///
/// # Errors
/// Every failure is a general (per item) pipeline error:
/// - `FileAlreadyExists`: the destination already exists.
/// - `FileCreationFailed`: the file could not be created for any other reason.
/// - `FileWriteFailed`: writing or syncing the content failed.
pub async fn write_file(file_path: &Path, write_context: &str) -> CredlifyResult<()> {
    tracing::debug!("Creating file exclusively: {:?}", file_path);

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    options.mode(0o644);

    let mut file = options.open(file_path).await.map_err(|err| {
        if err.kind() == io::ErrorKind::AlreadyExists {
            CredlifyError::raise_general_pipeline_error(
                ErrorKind::FileAlreadyExists,
                &format!("File at '{}' already exists", file_path.display()),
                ErrorAction::Notify,
            )
        } else {
            CredlifyError::raise_general_pipeline_error(
                ErrorKind::FileCreationFailed,
                &format!("Could not create file at '{}': {}", file_path.display(), err),
                ErrorAction::Notify,
            )
        }
    })?;

    tracing::debug!(
        "Writing content to file. Content size: {} bytes.",
        write_context.len()
    );

    file.write_all(write_context.as_bytes())
        .await
        .map_err(|err| {
            CredlifyError::raise_general_pipeline_error(
                ErrorKind::FileWriteFailed,
                &format!("Could not write file at '{}': {}", file_path.display(), err),
                ErrorAction::Notify,
            )
        })?;

    file.sync_all().await.map_err(|err| {
        CredlifyError::raise_general_pipeline_error(
            ErrorKind::FileWriteFailed,
            &format!("Could not sync file at '{}': {}", file_path.display(), err),
            ErrorAction::Notify,
        )
    })?;

    Ok(())
}
