//! Whitespace normalization for raw page text.

/// Collapse raw page text into a single normalized line.
///
/// Leading and trailing whitespace is removed and every interior run of
/// whitespace (spaces, newlines, tabs) becomes one space. Returns an empty
/// string for whitespace-only input; callers skip such pages entirely.
pub fn normalize_page_text(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(word);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_interior_whitespace_runs() {
        assert_eq!(
            normalize_page_text("Energy\n\tuse   fell\r\nsharply"),
            "Energy use fell sharply"
        );
    }

    #[test]
    fn trims_leading_and_trailing_whitespace() {
        assert_eq!(normalize_page_text("  scope 1  "), "scope 1");
    }

    #[test]
    fn whitespace_only_input_yields_empty_string() {
        assert_eq!(normalize_page_text(" \n\t "), "");
        assert_eq!(normalize_page_text(""), "");
    }
}
