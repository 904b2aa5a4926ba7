//! Where readhelper keeps its files

use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "readhelper";
pub const DATA_DIR_ENV: &str = "READHELPER_DATA_DIR";
pub const CONFIG_FILENAME: &str = "config.json";
pub const LOG_FILENAME: &str = "readhelper.log";

/// Directory for notes, bookmarks, history and the log file.
///
/// An explicit path wins, then `READHELPER_DATA_DIR`, then the platform data
/// directory. Falls back to the working directory when none is known.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `config.json` next to the executable
fn portable_config_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(CONFIG_FILENAME))
}

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(CONFIG_FILENAME))
}

/// Config file location: explicit path, then a portable config next to the
/// executable if one exists, then the platform config directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = portable_config_path() {
        if path.exists() {
            return path;
        }
    }
    preferred_config_path().unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn explicit_data_dir_wins() {
        unsafe { std::env::set_var(DATA_DIR_ENV, "/from/env") };
        assert_eq!(data_dir(Some(Path::new("/explicit"))), PathBuf::from("/explicit"));
        assert_eq!(data_dir(None), PathBuf::from("/from/env"));
        unsafe { std::env::remove_var(DATA_DIR_ENV) };
    }

    #[test]
    #[serial]
    fn default_data_dir_is_namespaced() {
        unsafe { std::env::remove_var(DATA_DIR_ENV) };
        let dir = data_dir(None);
        if dirs::data_dir().is_some() {
            assert!(dir.ends_with(APP_NAME));
        }
    }

    #[test]
    fn explicit_config_path_wins() {
        assert_eq!(
            config_path(Some(Path::new("/tmp/custom.json"))),
            PathBuf::from("/tmp/custom.json")
        );
        assert!(config_path(None).ends_with(CONFIG_FILENAME));
    }
}
