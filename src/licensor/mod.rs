use std::future::Future;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::{CredlifyError, ErrorAction, ErrorKind},
    CredlifyResult,
};

lazy_static! {
    static ref LICENSE_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.+-]*$").unwrap();
}

/// Base URL of the plain text license bodies published by SPDX.
pub const SPDX_TEXT_BASE_URL: &str =
    "https://raw.githubusercontent.com/spdx/license-list-data/main/text";

/// Maps a license identifier to the full text of the license.
pub trait LicenseOracle {
    fn license_text(&self, identifier: &str) -> impl Future<Output = CredlifyResult<String>> + Send;
}

/// License oracle backed by the SPDX license list.
#[derive(Clone, Debug)]
pub struct SpdxLicenseOracle {
    client: reqwest::Client,
    base_url: String,
}

impl Default for SpdxLicenseOracle {
    fn default() -> Self {
        Self::new(SPDX_TEXT_BASE_URL)
    }
}

impl SpdxLicenseOracle {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the text of `identifier`, or an error for identifiers that cannot name an
    /// SPDX license (expressions such as `MIT OR Apache-2.0` included).
    pub fn text_url(&self, identifier: &str) -> CredlifyResult<String> {
        if !LICENSE_ID_RE.is_match(identifier) {
            return Err(CredlifyError::raise_general_other_error(
                ErrorKind::LicenseIdentifierInvalid,
                &format!("'{}' is not a single SPDX license identifier", identifier),
                ErrorAction::Ignore,
            ));
        }

        Ok(format!("{}/{}.txt", self.base_url, identifier))
    }
}

impl LicenseOracle for SpdxLicenseOracle {
    fn license_text(&self, identifier: &str) -> impl Future<Output = CredlifyResult<String>> + Send {
        let url = self.text_url(identifier);
        let client = self.client.clone();

        async move {
            let url = url?;

            tracing::info!("Fetching license text from: {}", url);

            let lookup_error = |message: String| {
                CredlifyError::raise_general_other_error(
                    ErrorKind::LicenseLookupFailed,
                    &message,
                    ErrorAction::Ignore,
                )
            };

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|err| lookup_error(err.to_string()))?;

            if !response.status().is_success() {
                return Err(lookup_error(format!(
                    "License lookup at '{}' answered {}",
                    url,
                    response.status()
                )));
            }

            let text = response
                .text()
                .await
                .map_err(|err| lookup_error(err.to_string()))?;

            if text.trim().is_empty() {
                return Err(lookup_error(format!("License text at '{}' is empty", url)));
            }

            Ok(text)
        }
    }
}
