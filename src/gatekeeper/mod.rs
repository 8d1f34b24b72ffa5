use std::path::{Path, PathBuf};

use futures::future::join_all;

use crate::{
    configatron::{Configatron, CredlifyArgs},
    error::{CredlifyError, ErrorAction, ErrorKind},
    manifestor::PackageManifest,
    templatron::Templatron,
    CredlifyResult,
};

/// Everything the pipeline needs once the preflight check let the run through.
#[derive(Clone, Debug)]
pub struct Admission {
    pub manifest: PackageManifest,
    pub configatron: Configatron,
    pub catalog: Templatron,
}

/// The `Gatekeeper` decides whether a run may touch the working directory at all.
#[derive(Clone, PartialEq, Debug)]
pub struct Gatekeeper<'a> {
    root_path: &'a Path,
}

impl<'a> Gatekeeper<'a> {
    pub fn new(root_path: &'a Path) -> Self {
        Self { root_path }
    }

    /// Runs the preflight check.
    ///
    /// Reads the package manifest, merges the run configuration, loads the template catalog
    /// and, when the file stage is enabled, makes sure no flat template destination is
    /// already taken. Nothing is written.
    ///
    /// # Errors
    /// - Manifest errors from `PackageManifest::read`.
    /// - `TemplateDirReadFailed`: the template directory cannot be listed.
    /// - `TemplateConflict`: one or more destinations exist; all of them are listed.
    pub async fn admit(&self, args: &CredlifyArgs) -> CredlifyResult<Admission> {
        tracing::info!("Running preflight check in {:?}", self.root_path);

        let manifest = PackageManifest::read(self.root_path).await?;
        let configatron = Configatron::from_sources(args, manifest.credlify.as_ref());
        let catalog =
            Templatron::resolve(configatron.get_templates_dir().map(PathBuf::as_path))?;

        if configatron.get_create_files() {
            self.ensure_destinations_are_free(&catalog).await?;
        }

        tracing::info!("Preflight check passed.");

        Ok(Admission {
            manifest,
            configatron,
            catalog,
        })
    }

    /// Checks every flat template destination concurrently, without following symlinks.
    pub async fn ensure_destinations_are_free(&self, catalog: &Templatron) -> CredlifyResult<()> {
        let destinations: Vec<PathBuf> = catalog
            .flat_descriptors()
            .map(|descriptor| self.root_path.join(descriptor.get_destination_name()))
            .collect();

        let checks = join_all(destinations.iter().map(|destination| async move {
            tokio::fs::symlink_metadata(destination)
                .await
                .is_ok()
                .then_some(destination)
        }))
        .await;

        let conflicts: Vec<String> = checks
            .into_iter()
            .flatten()
            .map(|destination| format!("  {}", destination.display()))
            .collect();

        if conflicts.is_empty() {
            return Ok(());
        }

        Err(CredlifyError::raise_critical_preflight_error(
            ErrorKind::TemplateConflict,
            &format!(
                "Files conflicting with templates already exist, nothing was changed:\n{}",
                conflicts.join("\n")
            ),
            ErrorAction::Fix,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{
        configatron::CredlifyArgs,
        error::ErrorKind,
        gatekeeper::Gatekeeper,
        templatron::{TemplateSource, Templatron},
    };

    fn template_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gulpfile.babel.js"), "").unwrap();
        fs::write(dir.path().join("_.gitignore"), "").unwrap();
        fs::write(dir.path().join("__index.html"), "").unwrap();

        dir
    }

    fn args(templates: &tempfile::TempDir) -> CredlifyArgs {
        CredlifyArgs {
            templates: Some(templates.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_manifest_is_refused() {
        let templates = template_dir();
        let project = tempfile::tempdir().unwrap();

        let err = Gatekeeper::new(project.path())
            .admit(&args(&templates))
            .await
            .unwrap_err();

        assert!(err.is_critical());
        assert_eq!(err.get_kind(), ErrorKind::ManifestMissing);
    }

    #[tokio::test]
    async fn admits_a_clean_package() {
        let templates = template_dir();
        let project = tempfile::tempdir().unwrap();
        fs::write(
            project.path().join("package.json"),
            r#"{ "name": "demo", "credlify": { "deps": false } }"#,
        )
        .unwrap();

        let admission = Gatekeeper::new(project.path())
            .admit(&args(&templates))
            .await
            .unwrap();

        assert_eq!(admission.catalog.get_descriptors().len(), 3);
        assert!(!admission.configatron.get_install_deps());
        assert!(admission.configatron.get_create_files());
    }

    #[tokio::test]
    async fn admits_with_the_shipped_templates_by_default() {
        let project = tempfile::tempdir().unwrap();
        fs::write(project.path().join("package.json"), r#"{ "name": "demo" }"#).unwrap();

        let admission = Gatekeeper::new(project.path())
            .admit(&CredlifyArgs::default())
            .await
            .unwrap();

        assert_eq!(admission.catalog.get_source(), &TemplateSource::Shipped);
        assert!(admission
            .catalog
            .get_descriptors()
            .iter()
            .any(|descriptor| descriptor.get_relative_name() == "config.json"));
    }

    #[tokio::test]
    async fn shipped_template_conflicts_are_reported() {
        let project = tempfile::tempdir().unwrap();
        fs::write(project.path().join("package.json"), r#"{ "name": "demo" }"#).unwrap();
        fs::write(project.path().join("webpack.config.js"), "mine").unwrap();

        let err = Gatekeeper::new(project.path())
            .admit(&CredlifyArgs::default())
            .await
            .unwrap_err();

        assert_eq!(err.get_kind(), ErrorKind::TemplateConflict);
        assert!(err.get_message().contains("webpack.config.js"));
    }

    #[tokio::test]
    async fn reports_every_conflict_at_once() {
        let templates = template_dir();
        let project = tempfile::tempdir().unwrap();
        fs::write(project.path().join("gulpfile.babel.js"), "mine").unwrap();
        fs::write(project.path().join(".gitignore"), "mine").unwrap();
        let catalog = Templatron::load(templates.path()).unwrap();

        let err = Gatekeeper::new(project.path())
            .ensure_destinations_are_free(&catalog)
            .await
            .unwrap_err();

        assert_eq!(err.get_kind(), ErrorKind::TemplateConflict);
        assert!(err.get_message().contains("gulpfile.babel.js"));
        assert!(err.get_message().contains(".gitignore"));
    }

    #[tokio::test]
    async fn captured_destinations_are_not_scanned() {
        let templates = template_dir();
        let project = tempfile::tempdir().unwrap();
        fs::write(project.path().join("index.html"), "mine").unwrap();
        let catalog = Templatron::load(templates.path()).unwrap();

        let result = Gatekeeper::new(project.path())
            .ensure_destinations_are_free(&catalog)
            .await;

        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dangling_symlinks_count_as_conflicts() {
        let templates = template_dir();
        let project = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(
            project.path().join("nowhere"),
            project.path().join(".gitignore"),
        )
        .unwrap();
        let catalog = Templatron::load(templates.path()).unwrap();

        let err = Gatekeeper::new(project.path())
            .ensure_destinations_are_free(&catalog)
            .await
            .unwrap_err();

        assert_eq!(err.get_kind(), ErrorKind::TemplateConflict);
    }

    #[tokio::test]
    async fn file_stage_disabled_skips_the_scan() {
        let templates = template_dir();
        let project = tempfile::tempdir().unwrap();
        fs::write(project.path().join("package.json"), r#"{ "name": "demo" }"#).unwrap();
        fs::write(project.path().join("gulpfile.babel.js"), "mine").unwrap();

        let args = CredlifyArgs {
            no_files: true,
            ..args(&templates)
        };

        assert!(Gatekeeper::new(project.path()).admit(&args).await.is_ok());
    }
}
