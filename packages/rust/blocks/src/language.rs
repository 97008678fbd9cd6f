//! Code-block language normalization against the destination's accepted set.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Fallback when a language is absent or unrecognized.
pub const DEFAULT_LANGUAGE: &str = "plain text";

/// Languages the destination accepts verbatim.
static KNOWN_LANGUAGES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "javascript",
        "typescript",
        "python",
        "java",
        "c",
        "c++",
        "c#",
        "go",
        "rust",
        "ruby",
        "php",
        "swift",
        "kotlin",
        "scala",
        "html",
        "css",
        "sql",
        "shell",
        "bash",
        "powershell",
        "json",
        "yaml",
        "xml",
        "markdown",
        "plain text",
    ])
});

/// Normalize a raw language tag to one the destination accepts.
///
/// Known names pass through lowercased; common short aliases expand;
/// anything else becomes [`DEFAULT_LANGUAGE`].
pub fn normalize_language(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return DEFAULT_LANGUAGE.to_string();
    };

    let lower = raw.trim().to_lowercase();
    if KNOWN_LANGUAGES.contains(lower.as_str()) {
        return lower;
    }

    let expanded = match lower.as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "sh" => "shell",
        "yml" => "yaml",
        "md" => "markdown",
        "cpp" => "c++",
        "csharp" | "cs" => "c#",
        "golang" => "go",
        "rs" => "rust",
        _ => DEFAULT_LANGUAGE,
    };
    expanded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_language_passes_through() {
        assert_eq!(normalize_language(Some("rust")), "rust");
        assert_eq!(normalize_language(Some("Python")), "python");
    }

    #[test]
    fn aliases_expand() {
        assert_eq!(normalize_language(Some("py")), "python");
        assert_eq!(normalize_language(Some("ts")), "typescript");
        assert_eq!(normalize_language(Some("cpp")), "c++");
        assert_eq!(normalize_language(Some("golang")), "go");
        assert_eq!(normalize_language(Some("yml")), "yaml");
    }

    #[test]
    fn unknown_and_missing_fall_back() {
        assert_eq!(normalize_language(Some("brainfuck")), DEFAULT_LANGUAGE);
        assert_eq!(normalize_language(None), DEFAULT_LANGUAGE);
        assert_eq!(normalize_language(Some("  ")), DEFAULT_LANGUAGE);
    }
}
