use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use configatron::{Configatron, CredlifyArgs};
use error::{CredlifyError, ErrorAction, ErrorKind};
use events::CredlifyAlerts;
use forgeron::Forgeron;
use gatekeeper::Gatekeeper;
use intaker::{prompt_answers, Intake};
use kickstartor::Kickstartor;
use licensor::{LicenseOracle, SpdxLicenseOracle};
use provisionor::{InstallRunner, NpmRunner, Provisionor};
use templatron::Templatron;
use tracing::{level_filters::LevelFilter, Level};
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling,
};
use tracing_subscriber::{
    fmt::format::{DefaultFields, Format},
    FmtSubscriber,
};
use trailblazer::Trailblazer;
use utils::pretty_print::pretty_print;

pub mod configatron;
pub mod error;
pub mod events;
pub mod forgeron;
pub mod gatekeeper;
pub mod injectron;
pub mod intaker;
pub mod kickstartor;
pub mod licensor;
pub mod manifestor;
pub mod provisionor;
pub mod templatron;
pub mod trailblazer;
pub mod utils;

pub type CredlifyResult<T> = Result<T, CredlifyError>;
pub type CredlifyRuntimeResult = CredlifyResult<i32>;

/// Where the scaffolding pipeline currently stands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PipelineStage {
    PreflightCheck,
    StructureStage,
    FileStage,
    DepsStage,
    Done,
    Aborted,
}

#[derive(Debug)]
pub struct CredlifyRuntime {
    args: CredlifyArgs,
    current_dir: PathBuf,
    stage: PipelineStage,
    // Flushes the trace log when the runtime goes away.
    _guard: Option<WorkerGuard>,
}

impl CredlifyRuntime {
    pub fn new(args: CredlifyArgs, current_dir: PathBuf) -> Self {
        Self {
            args,
            current_dir,
            stage: PipelineStage::PreflightCheck,
            _guard: None,
        }
    }

    pub fn get_stage(&self) -> PipelineStage {
        self.stage
    }

    /// Runs a full scaffolding session in the current directory and returns the exit code
    /// of the process.
    pub async fn run(&mut self) -> CredlifyRuntimeResult {
        self.start_tracing()?;

        let start_time = Local::now();

        tracing::info!("Starting credlify in {:?}", self.current_dir);

        let admitted = Gatekeeper::new(&self.current_dir).admit(&self.args).await;

        let admission = match admitted {
            Ok(admission) => admission,
            Err(err) => return Err(self.abort(err)),
        };

        let collected = self.collect_intake(&admission.manifest).await;

        let intake = match collected {
            Ok(intake) => intake,
            Err(err) => return Err(self.abort(err)),
        };

        let oracle = SpdxLicenseOracle::default();
        let runner = NpmRunner::new(admission.configatron.get_package_manager());

        let exit_code = self
            .scaffold(
                &admission.configatron,
                &admission.catalog,
                &intake,
                &oracle,
                &runner,
            )
            .await?;

        pretty_print(Self::completion_alert(start_time, exit_code));

        Ok(exit_code)
    }

    /// Closing alert of a finished run: success only if the installer chain succeeded too.
    fn completion_alert(start_time: DateTime<Local>, exit_code: i32) -> CredlifyAlerts {
        if exit_code == 0 {
            return CredlifyAlerts::create_success(
                start_time,
                "Your build pipeline is ready, run 'npx gulp' to start it",
            );
        }

        CredlifyAlerts::create_warning(&format!(
            "Scaffolding finished but the package manager exited with code {}, check its output and install the dependencies again",
            exit_code
        ))
    }

    async fn collect_intake(
        &self,
        manifest: &manifestor::PackageManifest,
    ) -> CredlifyResult<Intake> {
        let answers = prompt_answers().await?;

        Intake::finalize(&answers, manifest)
    }

    /// Runs the structure, file and dependency stages in order, each one unless disabled.
    ///
    /// Item failures inside the file stage are reported and do not stop the pipeline; any
    /// error returned by a stage moves it to `Aborted` and is passed on.
    pub async fn scaffold<L, R>(
        &mut self,
        configatron: &Configatron,
        catalog: &Templatron,
        intake: &Intake,
        oracle: &L,
        runner: &R,
    ) -> CredlifyRuntimeResult
    where
        L: LicenseOracle,
        R: InstallRunner,
    {
        let config = Trailblazer::new(catalog).resolve(intake).await;
        let mut structure_created = false;

        self.stage = PipelineStage::StructureStage;

        if configatron.get_create_dirs() {
            pretty_print(CredlifyAlerts::create_information(
                "Creating source/destination directories...",
            ));

            let built = Kickstartor::new(&self.current_dir, &config).build().await;

            match built {
                Ok(_) => structure_created = true,
                Err(err) => return Err(self.abort(err)),
            }
        } else {
            Self::skipped("creating the source/destination directories");
        }

        self.stage = PipelineStage::FileStage;

        if configatron.get_create_files() {
            pretty_print(CredlifyAlerts::create_information(
                "Creating build pipeline files...",
            ));

            let forged = Forgeron::new(&self.current_dir, catalog, &config, oracle)
                .materialize(intake, structure_created)
                .await;

            match forged {
                Ok(report) if !report.failures.is_empty() => {
                    pretty_print(CredlifyAlerts::create_warning(&format!(
                        "{} files could not be created",
                        report.failures.len()
                    )));
                }
                Ok(_) => {}
                Err(err) => return Err(self.abort(err)),
            }
        } else {
            Self::skipped("creating the build pipeline files");
        }

        self.stage = PipelineStage::DepsStage;

        let mut exit_code = 0;

        if configatron.get_install_deps() {
            pretty_print(CredlifyAlerts::create_information(
                "Installing build pipeline dependencies...",
            ));

            let installed = Provisionor::new(runner).install_all().await;

            match installed {
                Ok(code) => exit_code = code,
                Err(err) => return Err(self.abort(err)),
            }
        } else {
            Self::skipped("installing the build pipeline dependencies");
        }

        self.stage = PipelineStage::Done;

        tracing::info!("Pipeline finished with exit code {}.", exit_code);

        Ok(exit_code)
    }

    fn skipped(what: &str) {
        tracing::info!("Skipped {}.", what);

        pretty_print(CredlifyAlerts::create_information(&format!(
            "Skipped {}",
            what
        )));
    }

    fn abort(&mut self, err: CredlifyError) -> CredlifyError {
        tracing::error!("Pipeline aborted during {:?}: {}", self.stage, err);

        self.stage = PipelineStage::Aborted;

        err
    }

    fn start_tracing(&mut self) -> CredlifyResult<()> {
        let log_dir = match &self.args.log_dir {
            Some(log_dir) => log_dir.clone(),
            None => return Ok(()),
        };

        let (subscriber, guard) = self.generate_log_subscriber(&log_dir);

        tracing::subscriber::set_global_default(subscriber).map_err(|err| {
            CredlifyError::raise_critical_other_error(
                ErrorKind::TracingSubscriberInitializationFailed,
                &format!("Could not start the trace log: {}", err),
                ErrorAction::Notify,
            )
        })?;

        self._guard = Some(guard);

        Ok(())
    }

    fn generate_log_filename(&self) -> String {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

        format!("credlify_log_{}.log", timestamp)
    }

    fn generate_log_subscriber(
        &self,
        log_dir: &Path,
    ) -> (
        FmtSubscriber<DefaultFields, Format, LevelFilter, NonBlocking>,
        WorkerGuard,
    ) {
        let file_name = self.generate_log_filename();
        let file_appender = rolling::never(log_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::TRACE)
            .with_writer(non_blocking)
            .finish();

        (subscriber, guard)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        future::Future,
        sync::{Arc, Mutex},
    };

    use chrono::Local;

    use indexmap::IndexMap;

    use crate::{
        configatron::{Configatron, CredlifyArgs},
        error::{CredlifyError, ErrorAction, ErrorKind},
        events::CredlifyAlerts,
        intaker::Intake,
        licensor::LicenseOracle,
        manifestor::PackageManifest,
        provisionor::{InstallRunner, SaveMode},
        templatron::Templatron,
        CredlifyResult, CredlifyRuntime, PipelineStage,
    };

    struct StaticOracle;

    impl LicenseOracle for StaticOracle {
        fn license_text(
            &self,
            identifier: &str,
        ) -> impl Future<Output = CredlifyResult<String>> + Send {
            let text = format!("{} License", identifier);

            async move { Ok(text) }
        }
    }

    /// Runner logging when each installation starts and exits.
    #[derive(Default)]
    struct RecordingRunner {
        events: Arc<Mutex<Vec<(&'static str, SaveMode)>>>,
    }

    impl InstallRunner for RecordingRunner {
        fn install(
            &self,
            mode: SaveMode,
            _packages: &[&str],
        ) -> impl Future<Output = CredlifyResult<i32>> + Send {
            let events = Arc::clone(&self.events);

            async move {
                events.lock().unwrap().push(("start", mode));
                tokio::task::yield_now().await;
                events.lock().unwrap().push(("exit", mode));

                Ok(0)
            }
        }
    }

    struct BrokenRunner;

    impl InstallRunner for BrokenRunner {
        fn install(
            &self,
            _mode: SaveMode,
            _packages: &[&str],
        ) -> impl Future<Output = CredlifyResult<i32>> + Send {
            async move {
                Err(CredlifyError::raise_critical_pipeline_error(
                    ErrorKind::InstallSpawnFailed,
                    "no package manager",
                    ErrorAction::Exit,
                ))
            }
        }
    }

    fn configatron(create_dirs: bool, create_files: bool, install_deps: bool) -> Configatron {
        Configatron::new(
            create_dirs,
            create_files,
            install_deps,
            None,
            "npm".to_string(),
        )
    }

    fn intake() -> Intake {
        let manifest: PackageManifest = serde_json::from_str(
            r#"{ "name": "demo", "description": "Demo app", "license": "MIT" }"#,
        )
        .unwrap();

        let answers: IndexMap<String, String> = [
            ("src", "source"),
            ("dest", "build"),
            ("srcJs", "scripts"),
            ("destJs", "js"),
            ("srcSass", "sass"),
            ("destSass", "css"),
            ("serverTask", "yes"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Intake::finalize(&answers, &manifest).unwrap()
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "demo" }"#).unwrap();

        dir
    }

    #[tokio::test]
    async fn scaffolds_a_complete_project() {
        let dir = project();
        let catalog = Templatron::shipped();
        let runner = RecordingRunner::default();
        let mut runtime = CredlifyRuntime::new(CredlifyArgs::default(), dir.path().to_path_buf());

        let code = runtime
            .scaffold(
                &configatron(true, true, true),
                &catalog,
                &intake(),
                &StaticOracle,
                &runner,
            )
            .await
            .unwrap();

        let root = dir.path();

        assert_eq!(code, 0);
        assert_eq!(runtime.get_stage(), PipelineStage::Done);
        assert!(root.join("source/scripts/node_modules/app/.gitkeep").is_file());
        assert!(root.join("source/scripts/index.js").is_file());
        assert!(root.join("source/sass/index.scss").is_file());
        assert!(root.join("build/js").is_dir());
        assert!(root.join("build/css").is_dir());
        assert!(fs::read_to_string(root.join("build/index.html"))
            .unwrap()
            .contains("demo"));
        assert!(fs::read_to_string(root.join("gulpfile.babel.js"))
            .unwrap()
            .contains("liveServer"));
        assert_eq!(
            fs::read_to_string(root.join("LICENSE")).unwrap(),
            "MIT License\n"
        );
        assert!(root.join(".gitignore").is_file());
        assert!(!root.join("_.gitignore").exists());
        assert!(!root.join("index.html").exists());

        let leftovers = fs::read_dir(root)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("config-"))
            .count();

        assert_eq!(leftovers, 0);
        assert_eq!(
            *runner.events.lock().unwrap(),
            vec![
                ("start", SaveMode::Runtime),
                ("exit", SaveMode::Runtime),
                ("start", SaveMode::Development),
                ("exit", SaveMode::Development),
            ]
        );
    }

    #[tokio::test]
    async fn skipped_stages_leave_the_directory_alone() {
        let dir = project();
        let catalog = Templatron::shipped();
        let runner = RecordingRunner::default();
        let mut runtime = CredlifyRuntime::new(CredlifyArgs::default(), dir.path().to_path_buf());

        let code = runtime
            .scaffold(
                &configatron(false, false, false),
                &catalog,
                &intake(),
                &StaticOracle,
                &runner,
            )
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(runner.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn files_without_structure_skip_the_structure_files() {
        let dir = project();
        let catalog = Templatron::shipped();
        let mut runtime = CredlifyRuntime::new(CredlifyArgs::default(), dir.path().to_path_buf());

        runtime
            .scaffold(
                &configatron(false, true, false),
                &catalog,
                &intake(),
                &StaticOracle,
                &RecordingRunner::default(),
            )
            .await
            .unwrap();

        assert!(dir.path().join("gulpfile.babel.js").is_file());
        assert!(!dir.path().join("build").exists());
        assert!(!dir.path().join("source").exists());
    }

    #[tokio::test]
    async fn existing_root_aborts_before_files_are_written() {
        let dir = project();
        fs::create_dir(dir.path().join("build")).unwrap();
        let catalog = Templatron::shipped();
        let runner = RecordingRunner::default();
        let mut runtime = CredlifyRuntime::new(CredlifyArgs::default(), dir.path().to_path_buf());

        let err = runtime
            .scaffold(
                &configatron(true, true, true),
                &catalog,
                &intake(),
                &StaticOracle,
                &runner,
            )
            .await
            .unwrap_err();

        assert_eq!(err.get_kind(), ErrorKind::ProjectRootExists);
        assert_eq!(runtime.get_stage(), PipelineStage::Aborted);
        assert!(!dir.path().join("gulpfile.babel.js").exists());
        assert!(runner.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn installer_failure_aborts_the_pipeline() {
        let dir = project();
        let catalog = Templatron::shipped();
        let mut runtime = CredlifyRuntime::new(CredlifyArgs::default(), dir.path().to_path_buf());

        let err = runtime
            .scaffold(
                &configatron(false, false, true),
                &catalog,
                &intake(),
                &StaticOracle,
                &BrokenRunner,
            )
            .await
            .unwrap_err();

        assert_eq!(err.get_kind(), ErrorKind::InstallSpawnFailed);
        assert_eq!(runtime.get_stage(), PipelineStage::Aborted);
    }

    #[tokio::test]
    async fn run_without_manifest_aborts_in_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime = CredlifyRuntime::new(CredlifyArgs::default(), dir.path().to_path_buf());

        let err = runtime.run().await.unwrap_err();

        assert_eq!(err.get_kind(), ErrorKind::ManifestMissing);
        assert_eq!(runtime.get_stage(), PipelineStage::Aborted);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn completion_alert_depends_on_the_installer_result() {
        let start_time = Local::now();

        assert!(matches!(
            CredlifyRuntime::completion_alert(start_time, 0),
            CredlifyAlerts::Success { .. }
        ));

        match CredlifyRuntime::completion_alert(start_time, 1) {
            CredlifyAlerts::Warning { message, .. } => assert!(message.contains("code 1")),
            other => panic!("Expected a warning, got {:?}", other),
        }
    }
}
