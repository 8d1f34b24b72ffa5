use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches `%%[identifier]%%` where the identifier is made of letters, digits,
    /// underscores, hyphens and periods.
    pub static ref INJECTRON_RE: Regex = Regex::new(r"%%\[([A-Za-z0-9._-]+)\]%%").unwrap();
}

/// The `Injectron` substitutes placeholder tokens in template text with the answers of the
/// current run.
///
/// Substitution is a single left-to-right pass over the original text: a substituted value
/// is never scanned again, and tokens naming an unknown key are left exactly as written.
/// There is no escape for literal token syntax.
#[derive(Clone, PartialEq, Debug)]
pub struct Injectron<'a> {
    values: &'a IndexMap<String, String>,
}

impl<'a> Injectron<'a> {
    /// Creates a new `Injectron` over the given key/value record. Keys are case sensitive.
    pub fn new(values: &'a IndexMap<String, String>) -> Self {
        Self { values }
    }

    /// Renders `template`, replacing every known placeholder with its value.
    pub fn render(&self, template: &str) -> String {
        let rendered = INJECTRON_RE.replace_all(template, |caps: &regex::Captures| {
            match self.values.get(&caps[1]) {
                Some(value) => value.to_owned(),
                None => {
                    tracing::debug!("Leaving unknown placeholder untouched: {}", &caps[0]);

                    caps[0].to_string()
                }
            }
        });

        rendered.into_owned()
    }
}
