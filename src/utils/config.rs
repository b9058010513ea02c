use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::Deserialize;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read the config file at {0}: {1}")]
    FailedToReadConfig(PathBuf, String),

    #[error("Failed to parse the config file at {0} as JSON5: {1}")]
    FailedToParseConfig(PathBuf, String),

    #[error("Cookies file {0} does not exist")]
    CookiesFileNotFound(PathBuf),

    #[error("Music directory {0} does not exist")]
    MusicDirNotFound(PathBuf),

    #[error("Download directory {0} does not exist")]
    DownloadDirNotFound(PathBuf),

    #[error("Could not determine the user's home directory to locate the default config path")]
    NoHomeDir,
}

/// Raw, on-disk shape of `$HOME/.pijudrc`. Every field is optional; missing
/// fields fall back to a sensible default.
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    cookies: Option<PathBuf>,
    music_dir: Option<PathBuf>,
    download_dir: Option<PathBuf>,
    server_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cookies_file: Option<PathBuf>,
    pub music_dir: PathBuf,
    pub download_dir: PathBuf,
    pub server_name: String,
}

impl Config {
    fn default_music_dir() -> Result<PathBuf, ConfigError> {
        Ok(home_dir()?.join("Music"))
    }

    fn default_download_dir() -> PathBuf {
        std::env::temp_dir()
    }

    fn default_server_name() -> String {
        env::var("HOSTNAME").unwrap_or_else(|_| "piju".to_string())
    }

    /// Locates the config file: `$PIJU_CONFIG` if set, else `$HOME/.pijudrc`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = env::var("PIJU_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        Ok(home_dir()?.join(".pijudrc"))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = if path.is_file() {
            let contents = fs::read_to_string(path)
                .map_err(|e| ConfigError::FailedToReadConfig(path.to_path_buf(), e.to_string()))?;
            json5::from_str::<RawConfig>(&contents)
                .map_err(|e| ConfigError::FailedToParseConfig(path.to_path_buf(), e.to_string()))?
        } else {
            RawConfig::default()
        };

        let music_dir = match raw.music_dir {
            Some(dir) => dir,
            None => Self::default_music_dir()?,
        };
        let download_dir = raw.download_dir.unwrap_or_else(Self::default_download_dir);
        let server_name = raw.server_name.unwrap_or_else(Self::default_server_name);
        let cookies_file = raw.cookies;

        if let Some(cookies) = &cookies_file {
            if !cookies.is_file() {
                return Err(ConfigError::CookiesFileNotFound(cookies.clone()));
            }
        }
        if !music_dir.is_dir() {
            return Err(ConfigError::MusicDirNotFound(music_dir));
        }
        if !download_dir.is_dir() {
            return Err(ConfigError::DownloadDirNotFound(download_dir));
        }

        Ok(Self { cookies_file, music_dir, download_dir, server_name })
    }
}

fn home_dir() -> Result<PathBuf, ConfigError> {
    env::var_os("HOME").map(PathBuf::from).ok_or(ConfigError::NoHomeDir)
}

static CONFIG: OnceLock<Result<Config, ConfigError>> = OnceLock::new();

/// Loads and caches the config for the process lifetime, reading from the
/// path resolved by `Config::default_path` unless `init_from_path` already
/// primed the cache with the CLI's `-c` override.
pub fn get_config() -> Result<&'static Config, ConfigError> {
    CONFIG
        .get_or_init(|| {
            let path = Config::default_path()?;
            Config::load(&path)
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Primes the config cache from an explicit path (the CLI's `-c` flag).
/// Must be called before the first `get_config()` call to take effect.
pub fn init_from_path(path: &std::path::Path) -> Result<&'static Config, ConfigError> {
    CONFIG.get_or_init(|| Config::load(path)).as_ref().map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_falls_back_to_defaults_and_validates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nonexistent.rc");
        let result = Config::load(&missing);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_music_and_download_dirs_are_honored() {
        let tmp = tempfile::tempdir().unwrap();
        let music = tmp.path().join("music");
        let downloads = tmp.path().join("downloads");
        std::fs::create_dir(&music).unwrap();
        std::fs::create_dir(&downloads).unwrap();

        let config_path = tmp.path().join(".pijudrc");
        std::fs::write(
            &config_path,
            format!(
                r#"{{music_dir: "{}", download_dir: "{}", server_name: "test-piju"}}"#,
                music.display(),
                downloads.display()
            ),
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.music_dir, music);
        assert_eq!(config.download_dir, downloads);
        assert_eq!(config.server_name, "test-piju");
    }
}
