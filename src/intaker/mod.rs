use dialoguer::{theme::ColorfulTheme, Input};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    injectron::Injectron,
    manifestor::PackageManifest,
    utils::sanitize_rel_path::sanitize_rel_path,
    CredlifyResult,
};

lazy_static! {
    static ref PATH_RE: Regex = Regex::new(r#"^[^\\:*?"<>|\n]+$"#).unwrap();
    static ref YES_NO_RE: Regex = Regex::new(r"(?i)^(y|n|yes|no)$").unwrap();
}

/// Gulp task appended to the pipeline when the user asks for a live server.
const SERVER_TASK_SNIPPET: &str = include_str!("../../snippets/server-task.js");

const PATH_MESSAGE: &str =
    "Path may not contain any of the following characters: \\:*?\"<>| or newlines";

/// How an answer is validated and normalized.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FieldKind {
    /// A relative path, sanitized before validation.
    Path,
    /// `y`, `n`, `yes` or `no`, in any case.
    YesNo,
}

/// One question asked to the user.
#[derive(Clone, PartialEq, Debug)]
pub struct PromptField {
    pub key: &'static str,
    pub description: &'static str,
    pub default: &'static str,
    pub kind: FieldKind,
}

/// The questions, in the order they are asked.
pub const PROMPT_FIELDS: [PromptField; 7] = [
    PromptField {
        key: "src",
        description: "Source directory (relative to project root)",
        default: "src",
        kind: FieldKind::Path,
    },
    PromptField {
        key: "dest",
        description: "Destination directory (relative to project root)",
        default: "dist",
        kind: FieldKind::Path,
    },
    PromptField {
        key: "srcJs",
        description: "JavaScript source directory (relative to source)",
        default: "js",
        kind: FieldKind::Path,
    },
    PromptField {
        key: "destJs",
        description: "JavaScript bundle destination directory (relative to destination)",
        default: "assets/js",
        kind: FieldKind::Path,
    },
    PromptField {
        key: "srcSass",
        description: "SASS source directory (relative to source)",
        default: "sass",
        kind: FieldKind::Path,
    },
    PromptField {
        key: "destSass",
        description: "Stylesheet bundle destination directory (relative to destination)",
        default: "assets/css",
        kind: FieldKind::Path,
    },
    PromptField {
        key: "serverTask",
        description: "Add optional live server gulp task ('yes' or 'no')",
        default: "yes",
        kind: FieldKind::YesNo,
    },
];

impl PromptField {
    /// Normalizes a raw answer the way it is stored in the record.
    pub fn normalize(&self, raw: &str) -> String {
        match self.kind {
            FieldKind::Path => sanitize_rel_path(raw),
            FieldKind::YesNo => raw.trim().to_lowercase(),
        }
    }

    /// Validates a raw answer, returning the message shown to the user on rejection.
    pub fn validate(&self, raw: &str) -> Result<(), String> {
        let normalized = self.normalize(raw);

        match self.kind {
            FieldKind::Path if PATH_RE.is_match(&normalized) => Ok(()),
            FieldKind::Path => Err(PATH_MESSAGE.to_string()),
            FieldKind::YesNo if YES_NO_RE.is_match(&normalized) => Ok(()),
            FieldKind::YesNo => Err("Choose 'yes' or 'no'".to_string()),
        }
    }
}

/// The answers of a run plus the fields derived from them.
///
/// Finalized once, then only read: every later stage renders templates against it.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Intake {
    fields: IndexMap<String, String>,
}

impl Intake {
    pub fn new(fields: IndexMap<String, String>) -> Self {
        Self { fields }
    }

    /// Validates raw answers and completes them into the final record.
    ///
    /// Adds the resolved server task (`serverTask`, `serverImport`, `serverTaskName`, all
    /// empty when declined) and the manifest derived `appName`, `description` and `license`.
    ///
    /// # Errors
    /// A missing or invalid answer is a critical interface error.
    pub fn finalize(
        answers: &IndexMap<String, String>,
        manifest: &PackageManifest,
    ) -> CredlifyResult<Self> {
        let mut fields = IndexMap::new();

        for field in PROMPT_FIELDS.iter() {
            let raw = answers.get(field.key).map(String::as_str).unwrap_or(field.default);

            field.validate(raw).map_err(|message| {
                CredlifyError::raise_critical_interface_error(
                    ErrorKind::InvalidPromptAnswer,
                    &format!("Invalid answer for '{}': {}", field.key, message),
                    ErrorAction::Fix,
                )
            })?;

            fields.insert(field.key.to_string(), field.normalize(raw));
        }

        let wants_server = matches!(
            fields.get("serverTask").map(String::as_str),
            Some("y") | Some("yes")
        );

        if wants_server {
            fields.insert(
                "serverImport".to_string(),
                "import liveServer from \"live-server\";".to_string(),
            );
            fields.insert("serverTaskName".to_string(), ", \"server\"".to_string());

            let snippet = Injectron::new(&fields).render(SERVER_TASK_SNIPPET);
            fields.insert("serverTask".to_string(), snippet);
        } else {
            fields.insert("serverImport".to_string(), String::new());
            fields.insert("serverTaskName".to_string(), String::new());
            fields.insert("serverTask".to_string(), String::new());
        }

        fields.insert("appName".to_string(), manifest.get_name());
        fields.insert("description".to_string(), manifest.get_description());
        fields.insert("license".to_string(), manifest.infer_license());

        tracing::info!("Finalized user input with {} fields.", fields.len());

        Ok(Self { fields })
    }

    /// Returns a copy of the record with `key` set to `value`.
    pub fn with_field(&self, key: &str, value: &str) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.to_string(), value.to_string());

        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn get_fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    /// An `Injectron` rendering against this record.
    pub fn injectron(&self) -> Injectron<'_> {
        Injectron::new(&self.fields)
    }
}

/// Asks every prompt field on the terminal and returns the raw answers.
///
/// The prompt blocks on stdin, so it runs on the blocking pool.
pub async fn prompt_answers() -> CredlifyResult<IndexMap<String, String>> {
    tokio::task::spawn_blocking(ask_fields)
        .await
        .map_err(|err| {
            CredlifyError::raise_critical_other_error(
                ErrorKind::TaskFailure,
                &err.to_string(),
                ErrorAction::Exit,
            )
        })?
}

fn ask_fields() -> CredlifyResult<IndexMap<String, String>> {
    let theme = ColorfulTheme::default();
    let mut answers = IndexMap::new();

    for field in PROMPT_FIELDS.iter() {
        let answer = Input::<String>::with_theme(&theme)
            .with_prompt(field.description)
            .default(field.default.to_string())
            .validate_with(|input: &String| field.validate(input))
            .interact_text()
            .map_err(|err| {
                CredlifyError::raise_critical_interface_error(
                    ErrorKind::PromptFailed,
                    &format!("An unknown error occurred while prompting: {}", err),
                    ErrorAction::Exit,
                )
            })?;

        answers.insert(field.key.to_string(), answer);
    }

    Ok(answers)
}
