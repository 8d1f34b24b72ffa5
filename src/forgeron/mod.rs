use std::path::{Path, PathBuf};

use futures::future::join_all;
use indexmap::IndexMap;

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    events::CredlifyAlerts,
    intaker::Intake,
    licensor::LicenseOracle,
    templatron::{TemplateDescriptor, Templatron},
    trailblazer::ProjectConfig,
    utils::{pretty_print::pretty_print, write_file::write_file},
    CredlifyResult,
};

/// Captured template written as the placeholder of the nested app module directory.
pub const CAPTURED_GITKEEP: &str = ".gitkeep";

/// Captured template written as the root page of the destination directory.
pub const CAPTURED_INDEX_HTML: &str = "index.html";

/// Rendered captured templates, keyed by their stripped name.
pub type CapturedTemplates = IndexMap<String, String>;

/// What one template turned into.
#[derive(Clone, PartialEq, Debug)]
enum TemplateOutcome {
    Written(PathBuf),
    Captured { name: String, content: String },
}

/// Summary of a materialization pass.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ForgeReport {
    /// Files created, in completion order of their stage.
    pub written: Vec<PathBuf>,
    /// Rendered captured templates.
    pub captured: CapturedTemplates,
    /// Per item failures; each one was already reported to the user.
    pub failures: Vec<CredlifyError>,
}

/// The `Forgeron` renders every cataloged template and writes the result into the project,
/// never overwriting anything already there.
#[derive(Clone, Debug)]
pub struct Forgeron<'a, L: LicenseOracle> {
    root_path: &'a Path,
    catalog: &'a Templatron,
    config: &'a ProjectConfig,
    oracle: &'a L,
}

impl<'a, L: LicenseOracle> Forgeron<'a, L> {
    pub fn new(
        root_path: &'a Path,
        catalog: &'a Templatron,
        config: &'a ProjectConfig,
        oracle: &'a L,
    ) -> Self {
        Self {
            root_path,
            catalog,
            config,
            oracle,
        }
    }

    /// Materializes the template set into the project.
    ///
    /// Templates are processed concurrently. A template that cannot be read or written is
    /// reported and skipped while the others carry on. When `structure_created` is set, the
    /// structure dependent files (script and stylesheet entry points, the app module
    /// placeholder and the root page) are written too, under the same rules.
    ///
    /// # Errors
    /// Only a missing captured template needed by the structure files is fatal.
    pub async fn materialize(
        &self,
        intake: &Intake,
        structure_created: bool,
    ) -> CredlifyResult<ForgeReport> {
        tracing::info!("Materializing {} templates.", self.catalog.get_descriptors().len());

        let license_text = self.fetch_license_text(intake).await;
        let intake = intake.with_field("licenseText", &license_text);

        let mut report = ForgeReport::default();

        let outcomes = join_all(
            self.catalog
                .get_descriptors()
                .iter()
                .map(|descriptor| self.forge_template(descriptor, &intake)),
        )
        .await;

        for outcome in outcomes {
            match outcome {
                Ok(TemplateOutcome::Written(file_path)) => report.written.push(file_path),
                Ok(TemplateOutcome::Captured { name, content }) => {
                    report.captured.insert(name, content);
                }
                Err(err) => Self::record_failure(&mut report, err),
            }
        }

        if structure_created {
            self.forge_structure_files(&mut report).await?;
        }

        tracing::info!(
            "Materialization finished: {} written, {} captured, {} failed.",
            report.written.len(),
            report.captured.len(),
            report.failures.len()
        );

        Ok(report)
    }

    /// Looks up the license text for the record's license identifier.
    ///
    /// Any failure downgrades to an empty license body and a warning.
    async fn fetch_license_text(&self, intake: &Intake) -> String {
        let identifier = intake.get("license").unwrap_or_default();

        if identifier.is_empty() {
            return String::new();
        }

        match self.oracle.license_text(identifier).await {
            Ok(text) if !text.is_empty() => text,
            result => {
                if let Err(err) = result {
                    tracing::warn!("License lookup for '{}' failed: {}", identifier, err);
                }

                pretty_print(CredlifyAlerts::create_warning(
                    "No valid OSI license ID found in package.json; an empty license file was generated. See https://opensource.org/licenses/alphabetical",
                ));

                String::new()
            }
        }
    }

    async fn forge_template(
        &self,
        descriptor: &TemplateDescriptor,
        intake: &Intake,
    ) -> CredlifyResult<TemplateOutcome> {
        let raw_template = self.catalog.read_template(descriptor).await?;

        let content = intake.injectron().render(&raw_template);

        if descriptor.is_captured() {
            tracing::debug!("Captured template: {}", descriptor.get_destination_name());

            return Ok(TemplateOutcome::Captured {
                name: descriptor.get_destination_name().to_string(),
                content,
            });
        }

        let file_path = self.root_path.join(descriptor.get_destination_name());
        write_file(&file_path, &content).await?;

        Ok(TemplateOutcome::Written(file_path))
    }

    async fn forge_structure_files(&self, report: &mut ForgeReport) -> CredlifyResult<()> {
        let gitkeep = Self::take_captured(&report.captured, CAPTURED_GITKEEP)?;
        let index_html = Self::take_captured(&report.captured, CAPTURED_INDEX_HTML)?;

        let files = vec![
            (self.config.source_scripts(self.root_path).join("index.js"), String::new()),
            (self.config.source_styles(self.root_path).join("index.scss"), String::new()),
            (self.config.app_module_dir(self.root_path).join(CAPTURED_GITKEEP), gitkeep),
            (self.config.destination_root(self.root_path).join(CAPTURED_INDEX_HTML), index_html),
        ];

        let results = join_all(files.iter().map(|(file_path, content)| async move {
            write_file(file_path, content).await.map(|_| file_path.clone())
        }))
        .await;

        for result in results {
            match result {
                Ok(file_path) => report.written.push(file_path),
                Err(err) => Self::record_failure(report, err),
            }
        }

        Ok(())
    }

    fn take_captured(captured: &CapturedTemplates, name: &str) -> CredlifyResult<String> {
        captured.get(name).cloned().ok_or_else(|| {
            CredlifyError::raise_critical_pipeline_error(
                ErrorKind::CapturedTemplateMissing,
                &format!("Captured template '{}' is missing from the template set", name),
                ErrorAction::Exit,
            )
        })
    }

    fn record_failure(report: &mut ForgeReport, err: CredlifyError) {
        pretty_print(CredlifyAlerts::create_credlify_error(err.clone()));

        report.failures.push(err);
    }
}
