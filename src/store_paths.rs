//! Purpose: Shared storage-file path resolution for the CLI.
//! Exports: `default_store_path` and `resolve_store_path`.
//! Invariants: The default file stays `orders.orderlite` in the working directory.

use std::path::PathBuf;

pub(crate) const DEFAULT_STORE_FILE: &str = "orders.orderlite";

pub(crate) fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_FILE)
}

pub(crate) fn resolve_store_path(file: Option<PathBuf>) -> PathBuf {
    file.unwrap_or_else(default_store_path)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_STORE_FILE, resolve_store_path};
    use std::path::PathBuf;

    #[test]
    fn default_when_no_override() {
        assert_eq!(
            resolve_store_path(None),
            PathBuf::from(DEFAULT_STORE_FILE)
        );
    }

    #[test]
    fn override_wins() {
        let path = PathBuf::from("/tmp/elsewhere.orderlite");
        assert_eq!(resolve_store_path(Some(path.clone())), path);
    }
}
