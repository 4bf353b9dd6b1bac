use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "EVHOST_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "evhost.toml";

const QUALIFIER: &str = "com";
const ORGANISATION: &str = "Toon";
const APPLICATION: &str = "EvHost";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

/// Where the active configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Passed with `--config` / `EVHOST_CONFIG`; must exist.
    Explicit(PathBuf),
    /// Default location in the config directory; built-in defaults apply when missing.
    Discovered(PathBuf),
}

impl ConfigLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Discovered(path) => path,
        }
    }
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))
            .context("failed to resolve evhost config directory")?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    pub fn locate_config(&self, explicit: Option<&Path>) -> ConfigLocation {
        match explicit {
            Some(path) => ConfigLocation::Explicit(path.to_path_buf()),
            None => ConfigLocation::Discovered(self.config_file()),
        }
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_takes_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let config_dir = root.path().join("config");
        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, &config_dir);

        let paths = AppPaths::discover().unwrap();

        assert_eq!(paths.config_dir(), config_dir.as_path());
        assert_eq!(paths.config_file(), config_dir.join(CONFIG_FILE_NAME));
    }

    #[test]
    fn explicit_config_wins_over_discovered() {
        let paths = AppPaths::from_raw(PathBuf::from("/tmp/evhost"));
        let explicit = PathBuf::from("/srv/curves.toml");

        assert_eq!(
            paths.locate_config(Some(&explicit)),
            ConfigLocation::Explicit(explicit.clone())
        );
        assert_eq!(
            paths.locate_config(None).path(),
            Path::new("/tmp/evhost/evhost.toml")
        );
    }
}
