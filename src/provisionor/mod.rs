use std::{future::Future, process::Stdio};

use tokio::process::Command;

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    events::CredlifyAlerts,
    utils::pretty_print::pretty_print,
    CredlifyResult,
};

/// Where installed packages are recorded in the manifest.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SaveMode {
    Runtime,
    Development,
}

impl SaveMode {
    pub fn flag(&self) -> &'static str {
        match self {
            SaveMode::Runtime => "--save",
            SaveMode::Development => "--save-dev",
        }
    }
}

/// A batch of packages installed by one package manager invocation.
#[derive(Clone, PartialEq, Debug)]
pub struct DependencyGroup {
    pub mode: SaveMode,
    pub packages: &'static [&'static str],
}

/// The packages the generated pipeline needs, runtime group first.
pub const DEPENDENCY_GROUPS: [DependencyGroup; 2] = [
    DependencyGroup {
        mode: SaveMode::Runtime,
        packages: &["@babel/runtime"],
    },
    DependencyGroup {
        mode: SaveMode::Development,
        packages: &[
            "@babel/core",
            "@babel/plugin-proposal-class-properties",
            "@babel/plugin-proposal-export-default-from",
            "@babel/plugin-proposal-object-rest-spread",
            "@babel/plugin-syntax-dynamic-import",
            "@babel/plugin-transform-async-to-generator",
            "@babel/plugin-transform-runtime",
            "@babel/preset-env",
            "@babel/register",
            "babel-loader",
            "babel-minify-webpack-plugin",
            "del",
            "gulp",
            "gulp-clean-css",
            "gulp-load-plugins",
            "gulp-plumber",
            "gulp-sass",
            "gulp-sourcemaps",
            "live-server",
            "minimist",
            "minimist-options",
            "webpack",
            "webpack-stream",
        ],
    },
];

/// Runs one package manager installation and reports its exit code.
pub trait InstallRunner {
    fn install(
        &self,
        mode: SaveMode,
        packages: &[&str],
    ) -> impl Future<Output = CredlifyResult<i32>> + Send;
}

/// Installs through the configured package manager, sharing the terminal with it.
#[derive(Clone, PartialEq, Debug)]
pub struct NpmRunner {
    program: String,
}

impl NpmRunner {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    /// Command line arguments for one installation.
    pub fn arguments(mode: SaveMode, packages: &[&str]) -> Vec<String> {
        let mut args = vec!["install".to_string(), mode.flag().to_string()];
        args.extend(packages.iter().map(|package| package.to_string()));

        args
    }
}

impl InstallRunner for NpmRunner {
    fn install(
        &self,
        mode: SaveMode,
        packages: &[&str],
    ) -> impl Future<Output = CredlifyResult<i32>> + Send {
        let program = self.program.clone();
        let args = Self::arguments(mode, packages);

        async move {
            tracing::info!("Running: {} {}", program, args.join(" "));

            let mut child = Command::new(&program)
                .args(&args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|err| {
                    CredlifyError::raise_critical_pipeline_error(
                        ErrorKind::InstallSpawnFailed,
                        &format!("Failed to start '{}': {}", program, err),
                        ErrorAction::Exit,
                    )
                })?;

            let status = child.wait().await.map_err(|err| {
                CredlifyError::raise_critical_pipeline_error(
                    ErrorKind::InstallWaitFailed,
                    &format!("Failed to wait for '{}': {}", program, err),
                    ErrorAction::Exit,
                )
            })?;

            // Termination by signal has no exit code.
            Ok(status.code().unwrap_or(-1))
        }
    }
}

/// The `Provisionor` installs the dependency groups one after the other.
#[derive(Clone, Debug)]
pub struct Provisionor<'a, R: InstallRunner> {
    runner: &'a R,
}

impl<'a, R: InstallRunner> Provisionor<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Installs every group in order and returns the exit code of the last installation.
    ///
    /// A non-zero exit code is reported as a warning and the next group still runs.
    ///
    /// # Errors
    /// Failing to start or wait on the package manager aborts the stage.
    pub async fn install_all(&self) -> CredlifyResult<i32> {
        let mut exit_code = 0;

        for group in DEPENDENCY_GROUPS.iter() {
            pretty_print(CredlifyAlerts::create_information(&format!(
                "Installing {} packages ({})...",
                group.packages.len(),
                group.mode.flag()
            )));

            exit_code = self.runner.install(group.mode, group.packages).await?;

            if exit_code != 0 {
                tracing::warn!(
                    "Installation with {} exited with code {}.",
                    group.mode.flag(),
                    exit_code
                );

                pretty_print(CredlifyAlerts::create_warning(&format!(
                    "Package installation ({}) exited with code {}",
                    group.mode.flag(),
                    exit_code
                )));
            }
        }

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        future::Future,
        sync::{Arc, Mutex},
    };

    use crate::{
        provisionor::{InstallRunner, NpmRunner, Provisionor, SaveMode, DEPENDENCY_GROUPS},
        CredlifyResult,
    };

    /// Runner recording each invocation, logging when each one starts and exits, and
    /// answering with scripted exit codes.
    struct RecordingRunner {
        calls: Arc<Mutex<Vec<(SaveMode, usize)>>>,
        events: Arc<Mutex<Vec<(&'static str, SaveMode)>>>,
        codes: Vec<i32>,
    }

    impl InstallRunner for RecordingRunner {
        fn install(
            &self,
            mode: SaveMode,
            packages: &[&str],
        ) -> impl Future<Output = CredlifyResult<i32>> + Send {
            let mut calls = self.calls.lock().unwrap();
            let code = self.codes.get(calls.len()).copied().unwrap_or(0);
            calls.push((mode, packages.len()));

            let events = Arc::clone(&self.events);

            async move {
                events.lock().unwrap().push(("start", mode));
                tokio::task::yield_now().await;
                events.lock().unwrap().push(("exit", mode));

                Ok(code)
            }
        }
    }

    fn runner(codes: Vec<i32>) -> RecordingRunner {
        RecordingRunner {
            calls: Arc::new(Mutex::new(vec![])),
            events: Arc::new(Mutex::new(vec![])),
            codes,
        }
    }

    #[tokio::test]
    async fn installs_runtime_group_before_development_group() {
        let runner = runner(vec![0, 0]);

        let code = Provisionor::new(&runner).install_all().await.unwrap();
        let calls = runner.calls.lock().unwrap();

        assert_eq!(code, 0);
        assert_eq!(
            *calls,
            vec![
                (SaveMode::Runtime, 1),
                (SaveMode::Development, DEPENDENCY_GROUPS[1].packages.len())
            ]
        );
    }

    #[tokio::test]
    async fn next_group_starts_after_the_previous_one_exited() {
        let runner = runner(vec![0, 0]);

        Provisionor::new(&runner).install_all().await.unwrap();

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
    async fn keeps_going_after_a_failed_installation() {
        let runner = runner(vec![1, 0]);

        let code = Provisionor::new(&runner).install_all().await.unwrap();

        assert_eq!(code, 0);
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reports_the_last_exit_code() {
        let runner = runner(vec![0, 3]);

        let code = Provisionor::new(&runner).install_all().await.unwrap();

        assert_eq!(code, 3);
    }

    #[test]
    fn builds_install_arguments() {
        let args = NpmRunner::arguments(SaveMode::Development, &["gulp", "del"]);

        assert_eq!(args, vec!["install", "--save-dev", "gulp", "del"]);
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let runner = NpmRunner::new("credlify-no-such-package-manager");

        let err = runner
            .install(SaveMode::Runtime, &["left-pad"])
            .await
            .unwrap_err();

        assert!(err.is_critical());
        assert_eq!(err.get_kind(), crate::error::ErrorKind::InstallSpawnFailed);
    }
}
