use std::fmt;

use tracing::error;

/// Enum representing errors raised while scaffolding a project. A `CriticalError` stops the
/// pipeline at the point it is raised, while a `GeneralError` is scoped to a single item
/// (one template, one file, one license lookup) and never stops its siblings.
#[derive(Clone, PartialEq, Debug)]
pub enum CredlifyError {
    /// A fatal error: a failed precondition or a failed stage.
    CriticalError(CredlifyErrorType),
    /// A recoverable, per-item error that is reported and then skipped.
    GeneralError(CredlifyErrorType),
}

impl fmt::Display for CredlifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TYPE: {:?}\nKIND: {:?}\nACTION: {:?}\nMESSAGE: {}",
            self.get_type(),
            self.get_kind(),
            self.get_action(),
            self.get_message()
        )
    }
}

impl CredlifyError {
    /// Checks if the error is a critical error.
    ///
    /// # Returns
    /// `true` if the error is a `CriticalError`, otherwise `false`.
    pub fn is_critical(&self) -> bool {
        matches!(self, CredlifyError::CriticalError(_))
    }

    /// Checks if the error is a general error.
    ///
    /// # Returns
    /// `true` if the error is a `GeneralError`, otherwise `false`.
    pub fn is_general(&self) -> bool {
        matches!(self, CredlifyError::GeneralError(_))
    }

    /// Returns the action associated with this error.
    pub fn get_action(&self) -> ErrorAction {
        match self {
            CredlifyError::CriticalError(err) => err.get_action(),
            CredlifyError::GeneralError(err) => err.get_action(),
        }
    }

    /// Retrieves the error message associated with the error.
    pub fn get_message(&self) -> String {
        match self {
            CredlifyError::CriticalError(err) => err.get_message(),
            CredlifyError::GeneralError(err) => err.get_message(),
        }
    }

    /// Retrieves the kind of the error.
    pub fn get_kind(&self) -> ErrorKind {
        match self {
            CredlifyError::CriticalError(err) => err.get_kind(),
            CredlifyError::GeneralError(err) => err.get_kind(),
        }
    }

    /// Retrieves the type of the error.
    pub fn get_type(&self) -> ErrorType {
        match self {
            CredlifyError::CriticalError(err) => err.get_type(),
            CredlifyError::GeneralError(err) => err.get_type(),
        }
    }

    /// ==============================================================================================================
    ///
    /// Each `raise_*` constructor encodes both the severity (critical vs. general) and the
    /// source of the error (preflight, pipeline, interface, other) in its name, so a call
    /// site reads as what went wrong and how far the failure reaches. Every constructor
    /// also records the error through `tracing` before handing it back.
    ///
    /// ==============================================================================================================

    /// Raises a critical error detected before any mutation of the project.
    ///
    /// Used for the missing package manifest, pre-existing conflicting files and
    /// pre-existing source or destination roots.
    pub fn raise_critical_preflight_error(
        kind: ErrorKind,
        message: &str,
        action: ErrorAction,
    ) -> Self {
        error!(
            "Critical Preflight Error raised. Kind: {:?}, Message: '{}', Action: {:?}",
            kind, message, action
        );

        CredlifyError::CriticalError(CredlifyErrorType::PreflightError {
            kind,
            message: message.to_string(),
            action,
        })
    }

    /// Raises a critical error that terminates the remaining pipeline stages.
    pub fn raise_critical_pipeline_error(
        kind: ErrorKind,
        message: &str,
        action: ErrorAction,
    ) -> Self {
        error!(
            "Critical Pipeline Error raised. Kind: {:?}, Message: '{}', Action: {:?}",
            kind, message, action
        );

        CredlifyError::CriticalError(CredlifyErrorType::PipelineError {
            kind,
            message: message.to_string(),
            action,
        })
    }

    /// Raises a critical error coming from the user facing surface (prompt, terminal).
    pub fn raise_critical_interface_error(
        kind: ErrorKind,
        message: &str,
        action: ErrorAction,
    ) -> Self {
        error!(
            "Critical Interface Error raised. Kind: {:?}, Message: '{}', Action: {:?}",
            kind, message, action
        );

        CredlifyError::CriticalError(CredlifyErrorType::InterfaceError {
            kind,
            message: message.to_string(),
            action,
        })
    }

    pub fn raise_critical_other_error(kind: ErrorKind, message: &str, action: ErrorAction) -> Self {
        error!(
            "Critical Error raised. Kind: {:?}, Message: '{}', Action: {:?}",
            kind, message, action
        );

        CredlifyError::CriticalError(CredlifyErrorType::OtherError {
            kind,
            message: message.to_string(),
            action,
        })
    }

    /// Raises a recoverable error scoped to a single pipeline item.
    ///
    /// The stage that raised it keeps processing the remaining items.
    pub fn raise_general_pipeline_error(
        kind: ErrorKind,
        message: &str,
        action: ErrorAction,
    ) -> Self {
        error!(
            "General Pipeline Error raised. Kind: {:?}, Message: '{}', Action: {:?}",
            kind, message, action
        );

        CredlifyError::GeneralError(CredlifyErrorType::PipelineError {
            kind,
            message: message.to_string(),
            action,
        })
    }

    pub fn raise_general_other_error(kind: ErrorKind, message: &str, action: ErrorAction) -> Self {
        error!(
            "General Error raised. Kind: {:?}, Message: '{}', Action: {:?}",
            kind, message, action
        );

        CredlifyError::GeneralError(CredlifyErrorType::OtherError {
            kind,
            message: message.to_string(),
            action,
        })
    }
}

/// The source of an error, each variant carrying its kind, message and suggested action.
#[derive(Clone, PartialEq, Debug)]
pub enum CredlifyErrorType {
    PreflightError {
        kind: ErrorKind,
        message: String,
        action: ErrorAction,
    },
    PipelineError {
        kind: ErrorKind,
        message: String,
        action: ErrorAction,
    },
    InterfaceError {
        kind: ErrorKind,
        message: String,
        action: ErrorAction,
    },
    OtherError {
        kind: ErrorKind,
        message: String,
        action: ErrorAction,
    },
}

impl CredlifyErrorType {
    pub fn get_action(&self) -> ErrorAction {
        match self {
            CredlifyErrorType::PreflightError { action, .. } => action.clone(),
            CredlifyErrorType::PipelineError { action, .. } => action.clone(),
            CredlifyErrorType::InterfaceError { action, .. } => action.clone(),
            CredlifyErrorType::OtherError { action, .. } => action.clone(),
        }
    }

    pub fn get_message(&self) -> String {
        match self {
            CredlifyErrorType::PreflightError { message, .. } => message.clone(),
            CredlifyErrorType::PipelineError { message, .. } => message.clone(),
            CredlifyErrorType::InterfaceError { message, .. } => message.clone(),
            CredlifyErrorType::OtherError { message, .. } => message.clone(),
        }
    }

    pub fn get_kind(&self) -> ErrorKind {
        match self {
            CredlifyErrorType::PreflightError { kind, .. } => kind.clone(),
            CredlifyErrorType::PipelineError { kind, .. } => kind.clone(),
            CredlifyErrorType::InterfaceError { kind, .. } => kind.clone(),
            CredlifyErrorType::OtherError { kind, .. } => kind.clone(),
        }
    }

    pub fn get_type(&self) -> ErrorType {
        match self {
            CredlifyErrorType::PreflightError { .. } => ErrorType::PreflightError,
            CredlifyErrorType::PipelineError { .. } => ErrorType::PipelineError,
            CredlifyErrorType::InterfaceError { .. } => ErrorType::InterfaceError,
            CredlifyErrorType::OtherError { .. } => ErrorType::OtherError,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ErrorAction {
    /// Stop the run; the user has to fix something first.
    Exit,
    /// Report and keep going.
    Notify,
    /// Nothing to report beyond the log.
    Ignore,
    /// The user has to fix the named path or setting.
    Fix,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ErrorType {
    PreflightError,
    PipelineError,
    InterfaceError,
    OtherError,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ErrorKind {
    CurrentWorkingDirRetrievalFailed,
    TracingSubscriberInitializationFailed,
    ManifestMissing,
    ManifestReadFailed,
    ManifestParseFailed,
    TemplateDirReadFailed,
    TemplateReadFailed,
    TemplateConflict,
    ProjectRootExists,
    InvalidProjectConfig,
    ConfigParseFailed,
    DirCreationFailed,
    StructureCreationFailed,
    FileAlreadyExists,
    FileCreationFailed,
    FileWriteFailed,
    CapturedTemplateMissing,
    LicenseIdentifierInvalid,
    LicenseLookupFailed,
    InstallSpawnFailed,
    InstallWaitFailed,
    PromptFailed,
    InvalidPromptAnswer,
    TaskFailure,
}
