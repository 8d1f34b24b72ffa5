use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    CredlifyResult,
};

/// Marker prefixing template file names. One marker escapes a file name from packaging
/// tools (`_.gitignore`), two markers capture the template (`__index.html`).
pub const TEMPLATE_MARKER: char = '_';

/// Template that doubles as the source of the project path layout.
pub const CONFIG_TEMPLATE_NAME: &str = "config.json";

/// How a template is materialized.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TemplateKind {
    /// Written into the project root under its own name.
    Normal,
    /// Written into the project root with its single marker stripped, so packaging tools
    /// leave the shipped file alone (`_.gitignore`).
    StructureDependent,
    /// Rendered and held in memory; written later under a path derived from the project
    /// structure, never under its own name.
    Captured,
}

/// A single template file and how it should be materialized.
#[derive(Clone, PartialEq, Debug)]
pub struct TemplateDescriptor {
    relative_name: String,
    kind: TemplateKind,
    destination_name: String,
}

impl TemplateDescriptor {
    /// Classifies a template by its file name.
    pub fn classify(relative_name: &str) -> Self {
        let double_marker = format!("{}{}", TEMPLATE_MARKER, TEMPLATE_MARKER);

        let (kind, destination_name) =
            if let Some(stripped) = relative_name.strip_prefix(double_marker.as_str()) {
                (TemplateKind::Captured, stripped)
            } else if let Some(stripped) = relative_name.strip_prefix(TEMPLATE_MARKER) {
                (TemplateKind::StructureDependent, stripped)
            } else {
                (TemplateKind::Normal, relative_name)
            };

        Self {
            relative_name: relative_name.to_string(),
            kind,
            destination_name: destination_name.to_string(),
        }
    }

    pub fn get_relative_name(&self) -> &str {
        &self.relative_name
    }

    pub fn get_kind(&self) -> TemplateKind {
        self.kind
    }

    /// The file name inside the project (for captured templates, the key under which the
    /// rendered content is held).
    pub fn get_destination_name(&self) -> &str {
        &self.destination_name
    }

    pub fn is_captured(&self) -> bool {
        self.kind == TemplateKind::Captured
    }
}

/// Templates compiled into the binary, used unless a template directory is given.
pub const SHIPPED_TEMPLATES: [(&str, &str); 8] = [
    (".babelrc", include_str!("../../templates/.babelrc")),
    ("LICENSE", include_str!("../../templates/LICENSE")),
    ("_.gitignore", include_str!("../../templates/_.gitignore")),
    ("__.gitkeep", include_str!("../../templates/__.gitkeep")),
    ("__index.html", include_str!("../../templates/__index.html")),
    ("config.json", include_str!("../../templates/config.json")),
    ("gulpfile.babel.js", include_str!("../../templates/gulpfile.babel.js")),
    ("webpack.config.js", include_str!("../../templates/webpack.config.js")),
];

/// Where template contents come from.
#[derive(Clone, PartialEq, Debug)]
pub enum TemplateSource {
    /// Files of a template directory on disk.
    Directory(PathBuf),
    /// The `SHIPPED_TEMPLATES` set.
    Shipped,
}

/// The catalog of templates available to this run, listed once.
#[derive(Clone, PartialEq, Debug)]
pub struct Templatron {
    source: TemplateSource,
    descriptors: Vec<TemplateDescriptor>,
}

impl Templatron {
    /// Catalog of the given template directory, or of the shipped templates when none is
    /// given.
    pub fn resolve(directory: Option<&Path>) -> CredlifyResult<Self> {
        match directory {
            Some(directory) => Self::load(directory),
            None => Ok(Self::shipped()),
        }
    }

    /// Catalog of the templates compiled into the binary.
    pub fn shipped() -> Self {
        let mut descriptors: Vec<TemplateDescriptor> = SHIPPED_TEMPLATES
            .iter()
            .map(|(name, _)| TemplateDescriptor::classify(name))
            .collect();

        descriptors.sort_by(|a, b| a.relative_name.cmp(&b.relative_name));

        tracing::info!("Using {} shipped templates.", descriptors.len());

        Self {
            source: TemplateSource::Shipped,
            descriptors,
        }
    }

    /// Lists the direct entries of `directory` and classifies each file.
    ///
    /// Hidden files are part of the catalog (`.babelrc`), and ignore files found inside the
    /// directory are treated as plain templates rather than as ignore rules. Descriptors are
    /// sorted by name so that every run walks them in the same order.
    ///
    /// # Errors
    /// A missing or unreadable template directory is a packaging problem and returns a
    /// critical error.
    pub fn load(directory: &Path) -> CredlifyResult<Self> {
        tracing::info!("Loading template catalog from: {:?}", directory);

        if !directory.is_dir() {
            return Err(CredlifyError::raise_critical_other_error(
                ErrorKind::TemplateDirReadFailed,
                &format!(
                    "Template directory '{}' could not be read",
                    directory.display()
                ),
                ErrorAction::Exit,
            ));
        }

        let walker = WalkBuilder::new(directory)
            .max_depth(Some(1)) // Direct entries only
            .hidden(false) // Dotfiles are templates too
            .ignore(false)
            .parents(false)
            .git_global(false)
            .git_ignore(false)
            .git_exclude(false)
            .build();

        let mut descriptors = vec![];

        for dir_entry in walker {
            let dir_entry = dir_entry.map_err(|err| {
                CredlifyError::raise_critical_other_error(
                    ErrorKind::TemplateDirReadFailed,
                    &err.to_string(),
                    ErrorAction::Exit,
                )
            })?;

            if dir_entry.depth() == 0 || !dir_entry.path().is_file() {
                continue;
            }

            let file_name = dir_entry.file_name().to_string_lossy().to_string();
            let descriptor = TemplateDescriptor::classify(&file_name);

            tracing::debug!("Cataloged template {:?} as {:?}", file_name, descriptor.kind);

            descriptors.push(descriptor);
        }

        descriptors.sort_by(|a, b| a.relative_name.cmp(&b.relative_name));

        tracing::info!("Template catalog holds {} templates.", descriptors.len());

        Ok(Self {
            source: TemplateSource::Directory(directory.to_path_buf()),
            descriptors,
        })
    }

    pub fn get_source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn get_descriptors(&self) -> &[TemplateDescriptor] {
        &self.descriptors
    }

    /// Raw contents of the template behind `descriptor`.
    ///
    /// # Errors
    /// An unreadable or unknown template is a general pipeline error.
    pub async fn read_template(&self, descriptor: &TemplateDescriptor) -> CredlifyResult<String> {
        let read_error = |reason: String| {
            CredlifyError::raise_general_pipeline_error(
                ErrorKind::TemplateReadFailed,
                &format!(
                    "Template file '{}' could not be read: {}",
                    descriptor.relative_name, reason
                ),
                ErrorAction::Notify,
            )
        };

        match &self.source {
            TemplateSource::Directory(directory) => {
                tokio::fs::read_to_string(directory.join(&descriptor.relative_name))
                    .await
                    .map_err(|err| read_error(err.to_string()))
            }
            TemplateSource::Shipped => SHIPPED_TEMPLATES
                .iter()
                .find(|(name, _)| *name == descriptor.relative_name)
                .map(|(_, content)| content.to_string())
                .ok_or_else(|| read_error("not a shipped template".to_string())),
        }
    }

    /// Descriptors written straight into the project root (everything but captured ones).
    pub fn flat_descriptors(&self) -> impl Iterator<Item = &TemplateDescriptor> {
        self.descriptors.iter().filter(|d| !d.is_captured())
    }
}
