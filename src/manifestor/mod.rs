use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    configatron::ConfigurationJson,
    error::{CredlifyError, ErrorAction, ErrorKind},
    CredlifyResult,
};

/// File name of the npm package manifest.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// The handful of `package.json` fields the scaffolder reads.
#[derive(Clone, Deserialize, Debug, Default)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Either an SPDX expression string or the legacy `{ "type": ... }` object.
    #[serde(default)]
    pub license: Option<Value>,

    /// Optional scaffolder settings stored alongside the package.
    #[serde(default)]
    pub credlify: Option<ConfigurationJson>,
}

impl PackageManifest {
    /// Path of the manifest inside `root_path`.
    pub fn manifest_path(root_path: &Path) -> PathBuf {
        root_path.join(MANIFEST_FILE_NAME)
    }

    /// Reads and parses the manifest of the package at `root_path`.
    ///
    /// # Errors
    /// Missing, unreadable or malformed manifests are critical preflight errors: the tool
    /// only runs inside an initialized npm package.
    pub async fn read(root_path: &Path) -> CredlifyResult<Self> {
        let manifest_path = Self::manifest_path(root_path);

        tracing::info!("Reading package manifest: {:?}", manifest_path);

        let raw_manifest = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => CredlifyError::raise_critical_preflight_error(
                    ErrorKind::ManifestMissing,
                    "This isn't an npm package, run 'npm init' first",
                    ErrorAction::Fix,
                ),
                _ => CredlifyError::raise_critical_preflight_error(
                    ErrorKind::ManifestReadFailed,
                    &format!("Could not read '{}': {}", manifest_path.display(), err),
                    ErrorAction::Fix,
                ),
            })?;

        serde_json::from_str(&raw_manifest).map_err(|err| {
            CredlifyError::raise_critical_preflight_error(
                ErrorKind::ManifestParseFailed,
                &format!("Could not parse '{}': {}", manifest_path.display(), err),
                ErrorAction::Fix,
            )
        })
    }

    pub fn get_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }

    pub fn get_description(&self) -> String {
        self.description.clone().unwrap_or_default()
    }

    /// Infers the license identifier declared by the package, if any.
    ///
    /// `UNLICENSED` and `SEE LICENSE IN <file>` declare no open source license and yield an
    /// empty identifier, as does a missing field.
    pub fn infer_license(&self) -> String {
        let identifier = match &self.license {
            Some(Value::String(license)) => license.trim().to_string(),
            Some(Value::Object(license)) => license
                .get("type")
                .and_then(Value::as_str)
                .map(|license| license.trim().to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };

        if identifier.eq_ignore_ascii_case("UNLICENSED") || identifier.starts_with("SEE LICENSE") {
            return String::new();
        }

        identifier
    }
}

#[cfg(test)]
mod tests {
    use crate::{error::ErrorKind, manifestor::PackageManifest};

    fn parse(raw: &str) -> PackageManifest {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn reads_name_and_description() {
        let manifest = parse(r#"{ "name": "demo", "description": "A demo app" }"#);

        assert_eq!(manifest.get_name(), "demo");
        assert_eq!(manifest.get_description(), "A demo app");
        assert_eq!(manifest.infer_license(), "");
        assert!(manifest.credlify.is_none());
    }

    #[test]
    fn infers_license_from_string_and_object_forms() {
        assert_eq!(parse(r#"{ "license": " MIT " }"#).infer_license(), "MIT");
        assert_eq!(
            parse(r#"{ "license": { "type": "ISC", "url": "x" } }"#).infer_license(),
            "ISC"
        );
        assert_eq!(parse(r#"{ "license": "UNLICENSED" }"#).infer_license(), "");
        assert_eq!(
            parse(r#"{ "license": "SEE LICENSE IN LICENSE.txt" }"#).infer_license(),
            ""
        );
    }

    #[tokio::test]
    async fn missing_manifest_is_a_critical_preflight_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = PackageManifest::read(dir.path()).await.unwrap_err();

        assert!(err.is_critical());
        assert_eq!(err.get_kind(), ErrorKind::ManifestMissing);
    }

    #[tokio::test]
    async fn malformed_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{ nope").unwrap();

        let err = PackageManifest::read(dir.path()).await.unwrap_err();

        assert_eq!(err.get_kind(), ErrorKind::ManifestParseFailed);
    }
}
