use crate::prelude::{eprintln, *};
use codeprompt_core::source::{is_blocked_path, is_within_size_limit, SourceFile};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, clap::Args)]
pub struct LocalOptions {
    /// Files or folders to collect
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

pub async fn run(options: LocalOptions, global: &crate::Global) -> Result<Vec<SourceFile>> {
    if global.verbose {
        eprintln!("Collecting {} path(s)...", options.paths.len());
    }

    let paths = options.paths;
    tokio::task::spawn_blocking(move || collect_local_data(&paths))
        .await
        .context("Local collection task failed")?
}

/// Collect files and walk folders, skipping blocked, oversized and non UTF-8 files.
///
/// Folder entries are recorded relative to the folder's parent, so the folder
/// name stays part of each path.
pub fn collect_local_data(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let base = path.parent().unwrap_or(Path::new(""));
            let walker = WalkBuilder::new(path)
                .hidden(true)
                .git_ignore(true)
                .require_git(false)
                .ignore(true)
                .sort_by_file_name(|a, b| a.cmp(b))
                .build();

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("Skipping unreadable entry: {e}");
                        continue;
                    }
                };
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                let display = display_path(entry.path().strip_prefix(base).unwrap_or(entry.path()));
                if let Some(file) = read_source_file(entry.path(), display) {
                    files.push(file);
                }
            }
        } else if path.is_file() {
            let display = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| display_path(path));
            if let Some(file) = read_source_file(path, display) {
                files.push(file);
            }
        } else {
            return Err(eyre!("Path not found: {}", path.display()));
        }
    }

    if files.is_empty() {
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        return Err(codeprompt_core::Error::EmptyImport(names.join(", ")).into());
    }

    Ok(files)
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn read_source_file(path: &Path, display: String) -> Option<SourceFile> {
    if is_blocked_path(&display) {
        log::debug!("Skipping blocked file type: {display}");
        return None;
    }

    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            log::warn!("Skipping {display}: {e}");
            return None;
        }
    };
    if !is_within_size_limit(size) {
        log::warn!("Skipping {display}: {size} bytes exceeds the per-file limit");
        return None;
    }

    match fs::read(path).map(String::from_utf8) {
        Ok(Ok(content)) => Some(SourceFile::new(display, content)),
        Ok(Err(_)) => {
            log::warn!("Skipping {display}: not valid UTF-8");
            None
        }
        Err(e) => {
            log::warn!("Skipping {display}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_folder_relative_to_parent() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("proj");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("src").join("main.rs"), "fn main() {}").unwrap();
        fs::write(project.join("README.md"), "# proj").unwrap();
        fs::write(project.join("tool.exe"), "MZ").unwrap();
        fs::write(project.join("Cargo.lock"), "# lock").unwrap();

        let files = collect_local_data(&[project]).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["proj/README.md", "proj/src/main.rs"]);
        assert_eq!(files[1].content, "fn main() {}");
    }

    #[test]
    fn test_honours_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("proj");
        fs::create_dir_all(project.join("target")).unwrap();
        fs::write(project.join(".gitignore"), "target/\n").unwrap();
        fs::write(project.join("target").join("out.txt"), "built").unwrap();
        fs::write(project.join("lib.rs"), "pub fn f() {}").unwrap();

        let files = collect_local_data(&[project]).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["proj/lib.rs"]);
    }

    #[test]
    fn test_skips_non_utf8_and_keeps_single_files() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("data.txt");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        let script = dir.path().join("a.py");
        fs::write(&script, "print(1)").unwrap();

        let files = collect_local_data(&[binary, script]).unwrap();
        assert_eq!(files, vec![SourceFile::new("a.py", "print(1)")]);
    }

    #[test]
    fn test_nothing_eligible_is_empty_import() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("logo.png");
        fs::write(&image, "png").unwrap();

        let err = collect_local_data(&[image]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<codeprompt_core::Error>(),
            Some(codeprompt_core::Error::EmptyImport(_))
        ));
    }

    #[test]
    fn test_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_local_data(&[dir.path().join("missing")]).is_err());
    }
}
