use std::path::Path;

/// Version-control metadata directories pruned from every walk.
pub(crate) const VCS_METADATA_DIRS: &[&str] = &[".git", ".hg", ".svn"];

pub(crate) fn is_vcs_metadata_dir(name: &str) -> bool {
    VCS_METADATA_DIRS.contains(&name)
}

/// Check if a file is likely binary based on extension.
pub(crate) fn is_likely_binary(name: &str) -> bool {
    let binary_extensions = [
        ".exe", ".dll", ".so", ".dylib", ".a", ".o", ".obj", ".png", ".jpg", ".jpeg", ".gif",
        ".bmp", ".ico", ".webp", ".mp3", ".mp4", ".avi", ".mov", ".mkv", ".wav", ".flac", ".zip",
        ".tar", ".gz", ".bz2", ".xz", ".7z", ".rar", ".pdf", ".doc", ".docx", ".xls", ".xlsx",
        ".ppt", ".pptx", ".wasm", ".pyc", ".pyo", ".class", ".jar", ".ttf", ".otf", ".woff",
        ".woff2", ".eot", ".redb", ".db", ".sqlite",
    ];

    let lower = name.to_lowercase();
    binary_extensions.iter().any(|ext| lower.ends_with(ext))
}

/// True when `path` has one of the (normalized) extensions, or the list is empty.
pub(crate) fn extension_allowed(path: &Path, file_types: &[String]) -> bool {
    if file_types.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| file_types.iter().any(|t| t.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Match a file against a glob the way a recursive glob would.
///
/// Patterns without a `/` apply to the file name. Patterns with one apply to
/// the path relative to the search root, at any depth.
pub(crate) fn matches_file_pattern(pattern: &str, file_name: &str, relative: &str) -> bool {
    if pattern.is_empty() || pattern == "*" || pattern == "**/*" || pattern == "**" {
        return true;
    }
    if pattern.contains('/') {
        glob_match::glob_match(pattern, relative)
            || glob_match::glob_match(&format!("**/{}", pattern), relative)
    } else {
        glob_match::glob_match(pattern, file_name)
    }
}

/// Relative path with `/` separators, for glob matching on every platform.
pub(crate) fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_vcs_metadata_dir() {
        assert!(is_vcs_metadata_dir(".git"));
        assert!(is_vcs_metadata_dir(".svn"));
        assert!(!is_vcs_metadata_dir("target"));
        assert!(!is_vcs_metadata_dir(".venv"));
        assert!(!is_vcs_metadata_dir("src"));
    }

    #[test]
    fn test_is_likely_binary() {
        assert!(is_likely_binary("image.PNG"));
        assert!(is_likely_binary("archive.zip"));
        assert!(!is_likely_binary("main.rs"));
        assert!(!is_likely_binary("README.md"));
    }

    #[test]
    fn test_extension_allowed() {
        let types = vec!["md".to_string()];
        assert!(extension_allowed(Path::new("/a/README.MD"), &types));
        assert!(!extension_allowed(Path::new("/a/notes.txt"), &types));
        assert!(!extension_allowed(Path::new("/a/Makefile"), &types));
        assert!(extension_allowed(Path::new("/a/Makefile"), &[]));
    }

    #[test]
    fn test_matches_file_pattern() {
        assert!(matches_file_pattern("*.txt", "a.txt", "docs/a.txt"));
        assert!(!matches_file_pattern("*.txt", "b.md", "b.md"));
        assert!(matches_file_pattern("**/*", "b.md", "b.md"));
        assert!(matches_file_pattern("src/*.rs", "lib.rs", "src/lib.rs"));
        assert!(matches_file_pattern("src/*.rs", "lib.rs", "crates/a/src/lib.rs"));
        assert!(!matches_file_pattern("src/*.rs", "lib.rs", "tests/lib.rs"));
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_slash_path(root, Path::new("/repo/src/main.rs")),
            "src/main.rs"
        );
    }
}
