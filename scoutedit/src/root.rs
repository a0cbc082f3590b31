use std::path::{Component, Path, PathBuf};

use crate::errors::{unify_path, SearchError, SearchResult};

/// The directory every relative path is anchored to.
///
/// Relative paths handed to scoutedit must resolve to a location inside the
/// root. Anything that climbs out with `..`, is absolute, or follows a symlink
/// to somewhere outside is rejected with [`SearchError::PathEscapesRoot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    root: PathBuf,
}

impl ProjectRoot {
    /// Opens a project root, canonicalizing it.
    pub fn new(root: impl AsRef<Path>) -> SearchResult<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(SearchError::path_not_found(root));
        }
        if !root.is_dir() {
            return Err(SearchError::not_a_directory(root));
        }
        Ok(Self {
            root: unify_path(root),
        })
    }

    /// The canonical root path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path to an existing absolute path inside the root.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> SearchResult<PathBuf> {
        let relative = relative.as_ref();
        let normalized = self.normalize_lexically(relative)?;
        let joined = if normalized.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(&normalized)
        };
        if !joined.exists() {
            return Err(SearchError::path_not_found(relative));
        }

        // Lexically inside, but a symlink along the way may still point out
        let resolved = unify_path(&joined);
        if !resolved.starts_with(&self.root) {
            return Err(SearchError::path_escapes_root(relative, &self.root));
        }
        Ok(joined)
    }

    /// Returns true if `path` (after resolving symlinks) lies inside the root.
    pub fn contains(&self, path: &Path) -> bool {
        unify_path(path).starts_with(&self.root)
    }

    /// Path of `absolute` relative to the root with `/` separators, if it is
    /// lexically under the root.
    pub fn relative_of(&self, absolute: &Path) -> Option<String> {
        absolute
            .strip_prefix(&self.root)
            .ok()
            .map(normalize_separators)
    }

    fn normalize_lexically(&self, relative: &Path) -> SearchResult<PathBuf> {
        let mut normalized = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(SearchError::path_escapes_root(relative, &self.root));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(SearchError::path_escapes_root(relative, &self.root));
                }
            }
        }
        Ok(normalized)
    }
}

/// Renders a relative path with `/` separators and no leading `./`.
pub fn normalize_separators(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_inside_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/nested")).unwrap();
        fs::write(temp.path().join("src/nested/lib.rs"), "fn main() {}").unwrap();

        let root = ProjectRoot::new(temp.path()).unwrap();
        let resolved = root.resolve("src/nested/lib.rs").unwrap();
        assert!(resolved.ends_with("src/nested/lib.rs"));
        assert_eq!(
            root.relative_of(&resolved).as_deref(),
            Some("src/nested/lib.rs")
        );

        // `..` that stays inside the root is fine
        assert!(root.resolve("src/nested/../nested/lib.rs").is_ok());
        assert_eq!(root.resolve("").unwrap(), root.path());
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let temp = TempDir::new().unwrap();
        let root = ProjectRoot::new(temp.path()).unwrap();

        let err = root.resolve("../outside.txt").unwrap_err();
        assert!(matches!(err, SearchError::PathEscapesRoot { .. }));

        let err = root.resolve("/etc/passwd").unwrap_err();
        assert!(matches!(err, SearchError::PathEscapesRoot { .. }));
    }

    #[test]
    fn test_resolve_missing_path() {
        let temp = TempDir::new().unwrap();
        let root = ProjectRoot::new(temp.path()).unwrap();
        let err = root.resolve("nope.txt").unwrap_err();
        assert!(matches!(err, SearchError::PathNotFound(_)));
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            ProjectRoot::new(&file),
            Err(SearchError::NotADirectory(_))
        ));
        assert!(matches!(
            ProjectRoot::new(temp.path().join("missing")),
            Err(SearchError::PathNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_rejected() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let root = ProjectRoot::new(temp.path()).unwrap();
        let err = root.resolve("link/secret.txt").unwrap_err();
        assert!(matches!(err, SearchError::PathEscapesRoot { .. }));
        assert!(!root.contains(&temp.path().join("link/secret.txt")));
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_separators(Path::new("./a/b/c.rs")), "a/b/c.rs");
        assert_eq!(normalize_separators(Path::new("")), "");
    }
}
