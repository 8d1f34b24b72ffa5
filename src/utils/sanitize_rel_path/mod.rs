use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EDGE_RE: Regex = Regex::new(r"^[/\s]+|[/\s]+$").unwrap();
}

/// Normalizes a user supplied relative path by removing every leading and trailing run of
/// slashes and whitespace. Inner separators are left alone.
///
/// # Examples
///
/// `" /assets/js/ "` becomes `"assets/js"`; `"///"` becomes `""`.
pub fn sanitize_rel_path(path: &str) -> String {
    EDGE_RE.replace_all(path, "").to_string()
}

#[cfg(test)]
mod tests {
    use crate::utils::sanitize_rel_path::sanitize_rel_path;

    #[test]
    fn strips_slashes_and_whitespace_from_both_ends() {
        assert_eq!(sanitize_rel_path(" /assets/js/ "), "assets/js");
        assert_eq!(sanitize_rel_path("\t/src\n"), "src");
        assert_eq!(sanitize_rel_path("//a / b//"), "a / b");
    }

    #[test]
    fn keeps_clean_paths_untouched() {
        assert_eq!(sanitize_rel_path("scripts"), "scripts");
        assert_eq!(sanitize_rel_path("assets/css"), "assets/css");
    }

    #[test]
    fn collapses_separator_only_input_to_empty() {
        assert_eq!(sanitize_rel_path("///"), "");
        assert_eq!(sanitize_rel_path("  "), "");
        assert_eq!(sanitize_rel_path(""), "");
    }
}
