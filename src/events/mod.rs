use chrono::{DateTime, Local, TimeDelta};

use crate::error::CredlifyError;

/// Console diagnostics emitted while scaffolding, rendered by `utils::pretty_print`.
#[derive(Clone, PartialEq, Debug)]
pub enum CredlifyAlerts {
    Success {
        start_time: DateTime<Local>,
        ending_time: DateTime<Local>,
        duration: TimeDelta,
        message: String,
    },
    Information {
        start_time: DateTime<Local>,
        message: String,
    },
    Warning {
        start_time: DateTime<Local>,
        message: String,
    },
    CredlifyError {
        start_time: DateTime<Local>,
        error: CredlifyError,
    },
}

impl CredlifyAlerts {
    pub fn create_success(start_time: DateTime<Local>, message: &str) -> Self {
        let ending_time = Local::now();

        CredlifyAlerts::Success {
            duration: ending_time - start_time,
            start_time,
            ending_time,
            message: message.to_string(),
        }
    }

    pub fn create_information(message: &str) -> Self {
        CredlifyAlerts::Information {
            start_time: Local::now(),
            message: message.to_string(),
        }
    }

    pub fn create_warning(message: &str) -> Self {
        CredlifyAlerts::Warning {
            start_time: Local::now(),
            message: message.to_string(),
        }
    }

    pub fn create_credlify_error(error: CredlifyError) -> Self {
        CredlifyAlerts::CredlifyError {
            start_time: Local::now(),
            error,
        }
    }
}
