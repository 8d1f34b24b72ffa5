use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    events::CredlifyAlerts,
    intaker::Intake,
    templatron::{TemplateDescriptor, Templatron, CONFIG_TEMPLATE_NAME},
    utils::{pretty_print::pretty_print, sanitize_rel_path::sanitize_rel_path},
    CredlifyResult,
};

/// Project relative locations of the source and destination trees.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPaths {
    pub source: String,
    pub destination: String,
    pub source_scripts: String,
    pub source_styles: String,
    pub destination_scripts: String,
    pub destination_styles: String,
}

impl ProjectPaths {
    fn entries(&self) -> [(&'static str, &String); 6] {
        [
            ("source", &self.source),
            ("destination", &self.destination),
            ("sourceScripts", &self.source_scripts),
            ("sourceStyles", &self.source_styles),
            ("destinationScripts", &self.destination_scripts),
            ("destinationStyles", &self.destination_styles),
        ]
    }

    fn entries_mut(&mut self) -> [&mut String; 6] {
        [
            &mut self.source,
            &mut self.destination,
            &mut self.source_scripts,
            &mut self.source_styles,
            &mut self.destination_scripts,
            &mut self.destination_styles,
        ]
    }
}

/// The path layout of the project being scaffolded, parsed from the rendered config
/// template.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug, Default)]
pub struct ProjectConfig {
    pub paths: ProjectPaths,
}

impl ProjectConfig {
    /// Checks that every path is non-empty, relative, sanitized and stays inside the project.
    ///
    /// # Errors
    /// The first offending path is reported as a critical pipeline error.
    pub fn validate(&self) -> CredlifyResult<()> {
        for (name, path) in self.paths.entries() {
            let problem = if path.is_empty() {
                Some("is empty")
            } else if sanitize_rel_path(path) != *path {
                Some("has leading or trailing slashes or whitespace")
            } else if Path::new(path).is_absolute() {
                Some("is absolute")
            } else if Path::new(path)
                .components()
                .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
            {
                Some("leaves the project directory")
            } else {
                None
            };

            if let Some(problem) = problem {
                return Err(CredlifyError::raise_critical_pipeline_error(
                    ErrorKind::InvalidProjectConfig,
                    &format!("Project path '{}' ('{}') {}", name, path, problem),
                    ErrorAction::Fix,
                ));
            }
        }

        Ok(())
    }

    pub fn source_root(&self, root_path: &Path) -> PathBuf {
        root_path.join(&self.paths.source)
    }

    pub fn destination_root(&self, root_path: &Path) -> PathBuf {
        root_path.join(&self.paths.destination)
    }

    pub fn source_scripts(&self, root_path: &Path) -> PathBuf {
        root_path.join(&self.paths.source_scripts)
    }

    pub fn source_styles(&self, root_path: &Path) -> PathBuf {
        root_path.join(&self.paths.source_styles)
    }

    pub fn destination_scripts(&self, root_path: &Path) -> PathBuf {
        root_path.join(&self.paths.destination_scripts)
    }

    pub fn destination_styles(&self, root_path: &Path) -> PathBuf {
        root_path.join(&self.paths.destination_styles)
    }

    /// Placeholder module directory nested in the script sources.
    pub fn app_module_dir(&self, root_path: &Path) -> PathBuf {
        self.source_scripts(root_path).join("node_modules").join("app")
    }
}

/// The `Trailblazer` charts the project layout: it renders the config template against
/// the user input and parses the result into a `ProjectConfig`.
#[derive(Clone, Debug)]
pub struct Trailblazer<'a> {
    catalog: &'a Templatron,
}

impl<'a> Trailblazer<'a> {
    pub fn new(catalog: &'a Templatron) -> Self {
        Self { catalog }
    }

    /// Resolves the project layout for `intake`.
    ///
    /// Never fails: any problem is logged, shown as a warning, and degrades to
    /// `ProjectConfig::default()`, which the structure stage then refuses.
    pub async fn resolve(&self, intake: &Intake) -> ProjectConfig {
        tracing::info!("Resolving project layout from the config template.");

        match self.try_resolve(intake).await {
            Ok(config) => {
                tracing::info!("Resolved project layout: {:?}", config.paths);

                config
            }
            Err(err) => {
                tracing::warn!("Falling back to an empty project layout: {}", err);

                pretty_print(CredlifyAlerts::create_warning(&format!(
                    "Config data could not be loaded: {}",
                    err.get_message()
                )));

                ProjectConfig::default()
            }
        }
    }

    async fn try_resolve(&self, intake: &Intake) -> CredlifyResult<ProjectConfig> {
        let descriptor = TemplateDescriptor::classify(CONFIG_TEMPLATE_NAME);
        let raw_template = self.catalog.read_template(&descriptor).await?;

        let rendered = intake.injectron().render(&raw_template);

        Self::parse(&rendered)
    }

    /// Parses rendered config text, sanitizing every path before validating the layout.
    pub fn parse(rendered: &str) -> CredlifyResult<ProjectConfig> {
        let mut config: ProjectConfig = serde_json::from_str(rendered).map_err(|err| {
            CredlifyError::raise_general_pipeline_error(
                ErrorKind::ConfigParseFailed,
                &format!("Rendered config could not be parsed: {}", err),
                ErrorAction::Notify,
            )
        })?;

        for path in config.paths.entries_mut() {
            *path = sanitize_rel_path(path);
        }

        config.validate()?;

        Ok(config)
    }
}
