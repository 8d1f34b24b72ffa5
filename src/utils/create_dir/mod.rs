use std::path::{Path, PathBuf};

use tokio::fs::DirBuilder;

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    CredlifyResult,
};

/// Creates `dir_path` and any missing parent directories.
///
/// On unix the directories get `rwxr-xr-x` permissions. Returns the created path so that
/// callers fanning out several creations can tell which ones succeeded.
pub async fn create_dir(dir_path: &Path) -> CredlifyResult<PathBuf> {
    tracing::debug!("Creating directory: {:?}", dir_path);

    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    builder.mode(0o755);

    builder.create(dir_path).await.map_err(|err| {
        CredlifyError::raise_general_pipeline_error(
            ErrorKind::DirCreationFailed,
            &format!(
                "Could not create directory at '{}': {}",
                dir_path.display(),
                err
            ),
            ErrorAction::Notify,
        )
    })?;

    Ok(dir_path.to_path_buf())
}
