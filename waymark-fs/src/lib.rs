//! Shared filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let parent = if parent.as_str().is_empty() {
        Utf8Path::new(".")
    } else {
        parent
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Return whether a path exists and is a directory.
pub fn dir_is_dir(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_dir())
}

/// Size in bytes of the file at `path`.
pub fn file_len(path: &Utf8Path) -> io::Result<u64> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.len())
}

/// List the stems of regular files in `dir` whose extension equals `extension`.
///
/// Stems are returned sorted so callers observe a stable order regardless of
/// directory iteration order. Entries that are not valid UTF-8 are skipped.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// # let tmp = tempfile::tempdir()?;
/// # let root = Utf8Path::from_path(tmp.path()).ok_or("utf-8")?;
/// std::fs::write(root.join("texas.db"), b"")?;
/// std::fs::write(root.join("notes.txt"), b"")?;
/// let stems = waymark_fs::list_file_stems(root, "db")?;
/// assert_eq!(stems, vec!["texas".to_owned()]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn list_file_stems(dir: &Utf8Path, extension: &str) -> io::Result<Vec<String>> {
    let handle = fs_utf8::Dir::open_ambient_dir(dir, ambient_authority())?;
    let mut stems = Vec::new();
    for entry in handle.entries()? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name() else {
            continue;
        };
        let path = Utf8Path::new(&name);
        if path.extension() == Some(extension)
            && let Some(stem) = path.file_stem()
        {
            stems.push(stem.to_owned());
        }
    }
    stems.sort_unstable();
    Ok(stems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn workspace() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        (tmp, root)
    }

    #[rstest]
    fn lists_only_matching_files_in_sorted_order(workspace: (TempDir, Utf8PathBuf)) {
        let (_tmp, root) = workspace;
        for name in ["virginia.db", "arkansas.db", "readme.md", "texas.db-journal"] {
            std::fs::write(root.join(name), b"").expect("write file");
        }
        std::fs::create_dir(root.join("nested.db")).expect("create dir");

        let stems = list_file_stems(&root, "db").expect("list stems");

        assert_eq!(stems, vec!["arkansas".to_owned(), "virginia".to_owned()]);
    }

    #[rstest]
    fn listing_a_missing_directory_fails(workspace: (TempDir, Utf8PathBuf)) {
        let (_tmp, root) = workspace;
        let err = list_file_stems(&root.join("absent"), "db").expect_err("missing dir");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn reports_file_kinds_and_lengths(workspace: (TempDir, Utf8PathBuf)) {
        let (_tmp, root) = workspace;
        let file = root.join("ohio.db");
        std::fs::write(&file, b"12345").expect("write file");

        assert!(file_is_file(&file).expect("inspect file"));
        assert!(!file_is_file(&root).unwrap_or(false));
        assert!(dir_is_dir(&root).expect("inspect dir"));
        assert_eq!(file_len(&file).expect("length"), 5);
    }
}
