//! Log file setup
//!
//! The terminal belongs to the UI, so log records are written to a file instead
//! of stderr. The filter comes from `RUST_LOG` and defaults to `info`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use env_logger::{Builder, Env, Target};
use thiserror::Error;

/// Name of the log file inside the cache directory
const LOG_FILE_NAME: &str = "headlines.log";

/// Errors that can occur while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    /// No home directory to derive a default path from
    #[error("Could not determine a log directory")]
    NoLogDirectory,

    /// The log file could not be opened
    #[error("Could not open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global logger was already installed
    #[error("Logger already initialized")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

/// Default log location, e.g. `~/.cache/headlines/headlines.log` on Linux
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "headlines")?;
    Some(project_dirs.cache_dir().join(LOG_FILE_NAME))
}

/// Opens `path` for appending, creating parent directories as needed
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open = || -> io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    };

    open().map_err(|source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Installs the global logger, writing to `path` or the default location
///
/// # Returns
/// * `Ok(PathBuf)` - Where records will be written
/// * `Err(LoggingError)` - If no file could be opened or a logger exists
pub fn init(path: Option<&Path>) -> Result<PathBuf, LoggingError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_log_path().ok_or(LoggingError::NoLogDirectory)?,
    };
    let file = open_log_file(&path)?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_log_path_is_named_after_project() {
        if let Some(path) = default_log_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("headlines"));
            assert!(path_str.ends_with(LOG_FILE_NAME));
        }
        // Passes if there is no home directory (e.g. in CI)
    }

    #[test]
    fn test_open_log_file_creates_missing_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("logs").join("app.log");

        open_log_file(&path).expect("Should open log file");

        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_appends() {
        use std::io::Write;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("app.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_reports_path_on_failure() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        // A directory cannot be opened as a file
        let err = open_log_file(temp_dir.path()).unwrap_err();

        assert!(err.to_string().contains(&temp_dir.path().display().to_string()));
    }
}
