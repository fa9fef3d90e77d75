use std::env;
use std::io;
use std::path::PathBuf;

mod schema;
mod settings;
mod storage;

pub use schema::SchemaManager;
pub use settings::{Auth, Control, Database, Gateway, GatewayAuth, GatewayTopic, Logger, Server, Settings};
pub use storage::Storage;

fn project_root() -> Result<PathBuf, io::Error> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // development and testing environments
        Ok(PathBuf::from(manifest_dir))
    } else {
        // runtime root relative path `folder/executable` -> `folder/`
        let exe = env::current_exe()?;
        exe.parent()
            .map(|path| path.to_path_buf())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))
    }
}

/// Expands a leading `~/` against the project root, leaves anything else untouched.
pub fn normalize_path(path: &str) -> Result<PathBuf, io::Error> {
    match path.strip_prefix("~/") {
        Some(relative) => Ok(project_root()?.join(relative)),
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_path() {
        let path = normalize_path("/etc/ssl/cert.pem").unwrap();
        assert_eq!(path, PathBuf::from("/etc/ssl/cert.pem"));
    }

    #[test]
    fn test_normalize_home_relative_path() {
        let path = normalize_path("~/certs/client.pem").unwrap();
        assert!(path.ends_with("certs/client.pem"));
        assert!(!path.to_string_lossy().contains('~'));
    }
}
