//! Collected source files and the delimited blob sent for analysis
//!
//! Every input mode (paste, local files, raw URLs, repository import) ends up
//! as an ordered list of [`SourceFile`]s. The blob framing records each file's
//! byte length so [`split_blob`] recovers the exact files [`build_blob`] was
//! given, whatever the content looks like.

use serde::{Deserialize, Serialize};

/// Files larger than this are skipped by every input mode.
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

const HEADER_PREFIX: &str = "--- FILE: ";
const HEADER_SUFFIX: &str = " bytes) ---";
const FOOTER: &str = "--- END FILE ---";
const TRUNCATION_NOTICE: &str = "\n[... truncated ...]";

/// Extensions never worth sending to a language model.
pub const BLOCKED_EXTENSIONS: &[&str] = &[
    // Executables and objects
    "exe", "dll", "so", "dylib", "bin", "o", "a", "obj", "class", "jar", "war", "pyc", "pyo",
    "wasm", // Images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "icns", "webp", "tiff", "psd", "svgz",
    // Audio and video
    "mp3", "wav", "ogg", "flac", "aac", "m4a", "mp4", "mov", "avi", "mkv", "webm",
    // Archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "zst", // Documents and fonts
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "ttf", "otf", "woff", "woff2", "eot",
    // Databases and lockfiles
    "db", "sqlite", "sqlite3", "lock", "lockb",
];

/// File names of dependency lockfiles, matched on the last path component.
pub const LOCKFILE_NAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "Cargo.lock",
    "poetry.lock",
    "Pipfile.lock",
    "composer.lock",
    "Gemfile.lock",
    "go.sum",
    "mix.lock",
    "flake.lock",
];

/// A single collected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Lowercased extension of the last path component, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Whether a path must be excluded from collection by extension or lockfile name.
pub fn is_blocked_path(path: &str) -> bool {
    let name = file_name(path);
    if LOCKFILE_NAMES.iter().any(|lock| lock.eq_ignore_ascii_case(name)) {
        return true;
    }
    extension(path).is_some_and(|ext| BLOCKED_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a file of `size` bytes fits under [`MAX_FILE_BYTES`].
pub fn is_within_size_limit(size: u64) -> bool {
    size <= MAX_FILE_BYTES
}

/// Concatenate files, in order, into the delimited blob.
pub fn build_blob(files: &[SourceFile]) -> String {
    files
        .iter()
        .map(|file| {
            format!(
                "{HEADER_PREFIX}{} ({}{HEADER_SUFFIX}\n{}\n{FOOTER}",
                file.path,
                file.content.len(),
                file.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Recover the files framed by [`build_blob`].
///
/// Returns `None` if the blob is not a well-formed sequence of frames.
pub fn split_blob(blob: &str) -> Option<Vec<SourceFile>> {
    let mut files = Vec::new();
    let mut rest = blob;

    while !rest.is_empty() {
        let header_end = rest.find('\n')?;
        let header = &rest[..header_end];
        let inner = header
            .strip_prefix(HEADER_PREFIX)?
            .strip_suffix(HEADER_SUFFIX)?;
        let (path, len) = inner.rsplit_once(" (")?;
        let len: usize = len.parse().ok()?;

        let body_start = header_end + 1;
        let body_end = body_start.checked_add(len)?;
        let content = rest.get(body_start..body_end)?;

        rest = rest.get(body_end..)?.strip_prefix('\n')?.strip_prefix(FOOTER)?;
        files.push(SourceFile::new(path, content));

        if !rest.is_empty() {
            rest = rest.strip_prefix("\n\n")?;
        }
    }

    Some(files)
}

/// Cut a blob down to at most `max_chars` characters, marking the cut.
pub fn truncate_blob(blob: &str, max_chars: usize) -> String {
    match blob.char_indices().nth(max_chars) {
        None => blob.to_string(),
        Some((byte_index, _)) => format!("{}{TRUNCATION_NOTICE}", &blob[..byte_index]),
    }
}

/// Total content size in bytes, for status output.
pub fn total_bytes(files: &[SourceFile]) -> usize {
    files.iter().map(|f| f.content.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SourceFile> {
        vec![
            SourceFile::new("src/main.rs", "fn main() {}\n"),
            SourceFile::new("README.md", "# Title\n\n--- END FILE ---\n"),
            SourceFile::new("empty.txt", ""),
            SourceFile::new("weird (1).py", "print('ünïcødé')"),
        ]
    }

    #[test]
    fn test_blob_round_trip() {
        let files = sample();
        let blob = build_blob(&files);
        assert_eq!(split_blob(&blob).unwrap(), files);
    }

    #[test]
    fn test_blob_round_trip_with_fake_header_in_content() {
        let files = vec![
            SourceFile::new("a.txt", "--- FILE: b.txt (3 bytes) ---\nabc\n--- END FILE ---"),
            SourceFile::new("b.txt", "real"),
        ];
        assert_eq!(split_blob(&build_blob(&files)).unwrap(), files);
    }

    #[test]
    fn test_blob_contains_each_marker_once_in_order() {
        let files = sample();
        let blob = build_blob(&files);

        let mut last = 0;
        for file in &files {
            let marker = format!("--- FILE: {} (", file.path);
            assert_eq!(blob.matches(&marker).count(), 1, "marker for {}", file.path);
            let pos = blob.find(&marker).unwrap();
            assert!(pos >= last);
            last = pos;
        }
    }

    #[test]
    fn test_empty_file_list() {
        assert_eq!(build_blob(&[]), "");
        assert_eq!(split_blob("").unwrap(), Vec::<SourceFile>::new());
    }

    #[test]
    fn test_split_rejects_garbage() {
        assert!(split_blob("hello world").is_none());
        assert!(split_blob("--- FILE: a (99 bytes) ---\nshort\n--- END FILE ---").is_none());
    }

    #[test]
    fn test_truncate_blob() {
        assert_eq!(truncate_blob("abc", 10), "abc");
        assert_eq!(truncate_blob("abc", 3), "abc");
        assert_eq!(truncate_blob("abcdef", 3), "abc\n[... truncated ...]");
        // Multi-byte characters are never split.
        assert_eq!(truncate_blob("ééé", 2), "éé\n[... truncated ...]");
    }

    #[test]
    fn test_blocked_extensions() {
        assert!(is_blocked_path("bin/tool.exe"));
        assert!(is_blocked_path("assets/Logo.PNG"));
        assert!(is_blocked_path("archive.tar.gz"));
        assert!(!is_blocked_path("src/lib.rs"));
        assert!(!is_blocked_path("Makefile"));
        assert!(!is_blocked_path(".gitignore"));
    }

    #[test]
    fn test_lockfiles_blocked() {
        assert!(is_blocked_path("package-lock.json"));
        assert!(is_blocked_path("web/yarn.lock"));
        assert!(is_blocked_path("Cargo.lock"));
        assert!(is_blocked_path("go.sum"));
        assert!(!is_blocked_path("package.json"));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a/b/c.RS").as_deref(), Some("rs"));
        assert_eq!(extension(".env"), None);
        assert_eq!(extension("Dockerfile"), None);
        assert_eq!(extension("dir.d/file"), None);
    }

    #[test]
    fn test_size_limit() {
        assert!(is_within_size_limit(MAX_FILE_BYTES));
        assert!(!is_within_size_limit(MAX_FILE_BYTES + 1));
    }
}
