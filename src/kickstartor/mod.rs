use std::path::{Path, PathBuf};

use futures::future::join_all;

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    events::CredlifyAlerts,
    trailblazer::ProjectConfig,
    utils::{create_dir::create_dir, pretty_print::pretty_print},
    CredlifyResult,
};

/// The `Kickstartor` lays down the directory skeleton of the project: the source and
/// destination roots, then their script and style folders.
#[derive(Clone, PartialEq, Debug)]
pub struct Kickstartor<'a> {
    root_path: &'a Path,
    config: &'a ProjectConfig,
}

impl<'a> Kickstartor<'a> {
    pub fn new(root_path: &'a Path, config: &'a ProjectConfig) -> Self {
        Self { root_path, config }
    }

    /// Builds the directory structure and returns every directory it created.
    ///
    /// The run is refused outright, with nothing created, if the layout is invalid or if
    /// the source or destination root already exists. Otherwise creation happens in two
    /// concurrent waves (roots, then typed subdirectories). Every creation is attempted;
    /// if any of them failed, each error is printed and a critical error is returned.
    /// Directories created before the failure are left in place.
    ///
    /// # Errors
    /// - `InvalidProjectConfig`: the layout did not resolve to safe relative paths.
    /// - `ProjectRootExists`: the source or destination root is already there.
    /// - `StructureCreationFailed`: at least one directory could not be created.
    pub async fn build(&self) -> CredlifyResult<Vec<PathBuf>> {
        tracing::info!("Creating source/destination directories in {:?}", self.root_path);

        self.config.validate()?;
        self.ensure_roots_are_free().await?;

        let mut created = vec![];
        let mut errors = vec![];

        let roots = vec![
            self.config.source_root(self.root_path),
            self.config.destination_root(self.root_path),
        ];

        let typed_dirs = vec![
            self.config.app_module_dir(self.root_path),
            self.config.source_styles(self.root_path),
            self.config.destination_scripts(self.root_path),
            self.config.destination_styles(self.root_path),
        ];

        for wave in [roots, typed_dirs] {
            let results = join_all(wave.iter().map(|dir_path| create_dir(dir_path))).await;

            for result in results {
                match result {
                    Ok(dir_path) => created.push(dir_path),
                    Err(err) => errors.push(err),
                }
            }
        }

        if !errors.is_empty() {
            let error_count = errors.len();

            for err in errors {
                pretty_print(CredlifyAlerts::create_credlify_error(err));
            }

            return Err(CredlifyError::raise_critical_pipeline_error(
                ErrorKind::StructureCreationFailed,
                &format!(
                    "Project structure generation failed: {} directories could not be created",
                    error_count
                ),
                ErrorAction::Exit,
            ));
        }

        tracing::info!("Created {} directories.", created.len());

        Ok(created)
    }

    async fn ensure_roots_are_free(&self) -> CredlifyResult<()> {
        let checks = [
            ("Source", self.config.source_root(self.root_path)),
            ("Destination", self.config.destination_root(self.root_path)),
        ];

        for (label, root) in checks {
            // Symlinks are not followed: a dangling link is still taken, and so is any
            // location that cannot be inspected.
            let taken = match tokio::fs::symlink_metadata(&root).await {
                Ok(_) => true,
                Err(err) => err.kind() != std::io::ErrorKind::NotFound,
            };

            if taken {
                return Err(CredlifyError::raise_critical_preflight_error(
                    ErrorKind::ProjectRootExists,
                    &format!(
                        "{} directory '{}' already exists, exiting to avoid breaking anything",
                        label,
                        root.display()
                    ),
                    ErrorAction::Fix,
                ));
            }
        }

        Ok(())
    }
}
