//! Path resolution shared by the config loader and the authorizer.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` lexically, without touching the filesystem.
///
/// `..` at the root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.components().fold(PathBuf::new(), |mut result, component| {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other),
        }
        result
    })
}

/// Make `path` absolute against the process working directory.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Canonicalize a path that may not exist yet.
///
/// The longest existing prefix is canonicalized through the filesystem
/// (resolving symlinks); the missing tail is appended as-is. Errors other
/// than `NotFound` are returned to the caller, and so is a dangling symlink
/// anywhere along the path, since its target could appear later.
pub async fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let normalized = normalize_path(&absolutize(path)?);

    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    loop {
        match tokio::fs::canonicalize(existing).await {
            Ok(mut real) => {
                real.extend(missing.iter().rev());
                return Ok(real);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if tokio::fs::symlink_metadata(existing).await.is_ok() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("dangling symlink at {}", existing.display()),
                    ));
                }
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Ok(normalized),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn normalize_resolves_dots() {
        assert_eq!(
            normalize_path(Path::new("/srv/./data/../sample.txt")),
            PathBuf::from("/srv/sample.txt")
        );
        assert_eq!(normalize_path(Path::new("/../..")), PathBuf::from("/"));
        assert_eq!(normalize_path(Path::new("a/b/../c")), PathBuf::from("a/c"));
    }

    #[tokio::test]
    async fn existing_path_is_fully_canonical() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("sample.txt");
        tokio::fs::write(&file, "hello").await.unwrap();

        let resolved = canonicalize_lenient(&file).await.unwrap();
        assert_eq!(resolved, file.canonicalize().unwrap());
    }

    #[tokio::test]
    async fn missing_tail_is_appended() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let resolved = canonicalize_lenient(&dir.path().join("nope/deeper/file.txt"))
            .await
            .unwrap();
        assert_eq!(resolved, root.join("nope/deeper/file.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_prefix_is_resolved() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let resolved = canonicalize_lenient(&link.join("missing.txt")).await.unwrap();
        assert_eq!(resolved, real.canonicalize().unwrap().join("missing.txt"));
    }
}
