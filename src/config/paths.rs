//! Where dsctl keeps its configuration files
//!
//! The root config lives in the platform config directory and profiles live
//! under the platform data directory, both resolved through `ProjectDirs`.
//! `DSCTL_CONFIG_DIR` and `DSCTL_DATA_DIR` replace either location.

use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "dsctl";

fn resolve(env_var: &str, pick: fn(&ProjectDirs) -> PathBuf) -> PathBuf {
    if let Some(dir) = std::env::var_os(env_var) {
        return PathBuf::from(dir);
    }
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| pick(&dirs))
        // No home directory: keep files next to the working directory
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_NAME)))
}

/// Directory holding the root `config.yaml`
pub fn config_dir() -> PathBuf {
    resolve("DSCTL_CONFIG_DIR", |dirs| dirs.config_dir().to_path_buf())
}

/// Directory holding per-profile configuration
pub fn data_dir() -> PathBuf {
    resolve("DSCTL_DATA_DIR", |dirs| dirs.data_dir().to_path_buf())
}

pub fn root_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

pub fn profile_config_path(profile: &str) -> PathBuf {
    data_dir().join("profiles").join(profile).join("config.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_config_file_name() {
        let path = root_config_path();
        assert!(path.starts_with(config_dir()));
        assert!(path.ends_with("config.yaml"));
    }

    #[test]
    fn test_profile_path_is_nested_in_data_dir() {
        let path = profile_config_path("staging");
        assert!(path.starts_with(data_dir()));
        assert!(path.ends_with("profiles/staging/config.yaml"));
    }
}
