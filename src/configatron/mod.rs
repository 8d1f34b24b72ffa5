use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Command line arguments of the scaffolder.
#[derive(Parser, Clone, Debug, Default)]
#[command(
    name = "credlify",
    version,
    about = "Scaffolds a gulp, webpack and sass build pipeline into the current npm package"
)]
pub struct CredlifyArgs {
    /// Skip creating the source and destination directory structure.
    #[arg(long = "no-dirs")]
    pub no_dirs: bool,

    /// Skip materializing the template files.
    #[arg(long = "no-files")]
    pub no_files: bool,

    /// Skip installing the build dependencies.
    #[arg(long = "no-deps")]
    pub no_deps: bool,

    /// Directory holding the templates to materialize instead of the built-in set.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Package manager executable used to install the dependencies.
    #[arg(long = "package-manager", value_name = "BIN")]
    pub package_manager: Option<String>,

    /// Write a trace log of the run into this directory.
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

/// Scaffolder settings read from the `credlify` object of `package.json`.
///
/// Every field is optional; missing stages default to enabled.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ConfigurationJson {
    /// Create the directory structure. Defaults to `true`.
    #[serde(default = "enabled_by_default")]
    pub dirs: bool,

    /// Materialize the template files. Defaults to `true`.
    #[serde(default = "enabled_by_default")]
    pub files: bool,

    /// Install the dependencies. Defaults to `true`.
    #[serde(default = "enabled_by_default")]
    pub deps: bool,

    /// Package manager executable, renamed in JSON as `packageManager`.
    #[serde(rename = "packageManager", default)]
    pub package_manager: Option<String>,
}

impl Default for ConfigurationJson {
    fn default() -> Self {
        Self {
            dirs: true,
            files: true,
            deps: true,
            package_manager: None,
        }
    }
}

/// Returns `true` as the default value, used for fields requiring an enabled default state.
fn enabled_by_default() -> bool {
    info!("Setting default: true");

    true
}

/// Default package manager executable for the current platform.
pub fn default_package_manager() -> String {
    if cfg!(windows) {
        "npm.cmd".to_string()
    } else {
        "npm".to_string()
    }
}

/// The settings of a single run, built once at startup and passed by reference through
/// the pipeline.
#[derive(Clone, PartialEq, Debug)]
pub struct Configatron {
    /// Whether the structure stage runs.
    create_dirs: bool,
    /// Whether the file stage runs.
    create_files: bool,
    /// Whether the dependency stage runs.
    install_deps: bool,
    /// Directory the template catalog is read from; the shipped templates when unset.
    templates_dir: Option<PathBuf>,
    /// Package manager executable.
    package_manager: String,
}

impl Configatron {
    pub fn new(
        create_dirs: bool,
        create_files: bool,
        install_deps: bool,
        templates_dir: Option<PathBuf>,
        package_manager: String,
    ) -> Self {
        Self {
            create_dirs,
            create_files,
            install_deps,
            templates_dir,
            package_manager,
        }
    }

    /// Merges command line arguments with the manifest settings.
    ///
    /// A stage runs only if neither source disables it. The package manager given on the
    /// command line wins over the manifest one, which wins over the platform default.
    pub fn from_sources(args: &CredlifyArgs, manifest_config: Option<&ConfigurationJson>) -> Self {
        let fallback = ConfigurationJson::default();
        let manifest_config = manifest_config.unwrap_or(&fallback);

        let package_manager = args
            .package_manager
            .clone()
            .or_else(|| manifest_config.package_manager.clone())
            .unwrap_or_else(default_package_manager);

        Self::new(
            manifest_config.dirs && !args.no_dirs,
            manifest_config.files && !args.no_files,
            manifest_config.deps && !args.no_deps,
            args.templates.clone(),
            package_manager,
        )
    }

    pub fn get_create_dirs(&self) -> bool {
        self.create_dirs
    }

    pub fn get_create_files(&self) -> bool {
        self.create_files
    }

    pub fn get_install_deps(&self) -> bool {
        self.install_deps
    }

    pub fn get_templates_dir(&self) -> Option<&PathBuf> {
        self.templates_dir.as_ref()
    }

    pub fn get_package_manager(&self) -> &str {
        &self.package_manager
    }
}
