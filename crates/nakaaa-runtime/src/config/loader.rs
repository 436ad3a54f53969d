//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults, then [`ConfigLoader::merge`]d configs
//! 2. Profile-specific config file (`nakaaa.{profile}.toml`)
//! 3. Main config file (`nakaaa.toml` / `config.toml`)
//! 4. Environment variables (`NAKAAA_*`)
//! 5. Flat bot variables (`BOT_NAME`, `BOT_TOKEN`, ...)
//! 6. Keyed overrides from [`ConfigLoader::set`]
//!
//! `.env.local` and `.env` are read into the process environment before the
//! environment layers are extracted. Variables that are already set win.
//!
//! # Environment Variable Mapping
//!
//! - `NAKAAA_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `NAKAAA_EMOJI__ERROR=x` → `emoji.error = "x"`
//! - `BOT_PREFIX=!` → `bot.prefix = "!"`
//!
//! # Example
//!
//! ```rust,ignore
//! use nakaaa_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/nakaaa.toml")
//!     .load()?;
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::NakaaaConfig;
use super::validation::validate_config;

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "NAKAAA_PROFILE";

/// Flat variables mapped onto the `[bot]` section.
pub const BOT_ENV_VARS: &[&str] = &["BOT_NAME", "BOT_ICON", "BOT_TOKEN", "BOT_PREFIX", "BOT_AUTHOR"];

/// Dotenv files, most specific first.
pub const DOTENV_FILES: &[&str] = &[".env.local", ".env"];

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `NAKAAA_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loads dotenv files into the process environment.
///
/// Missing files are skipped. Returns the files that were read.
pub fn load_dotenv<P: AsRef<Path>>(dir: P) -> ConfigResult<Vec<PathBuf>> {
    let mut loaded = Vec::new();
    for name in DOTENV_FILES {
        let path = dir.as_ref().join(name);
        match dotenvy::from_path(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Loaded dotenv file");
                loaded.push(path);
            }
            Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::DotenvError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(loaded)
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    load_dotenv: bool,
    validate: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            load_dotenv: true,
            validate: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds `<user config dir>/nakaaa` to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("nakaaa"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables both environment layers.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Skips reading `.env` files.
    pub fn without_dotenv(mut self) -> Self {
        self.load_dotenv = false;
        self
    }

    /// Skips [`validate_config`] after extraction.
    pub fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Merges a whole configuration on top of the built-in defaults.
    ///
    /// Files and environment variables still override it.
    pub fn merge(mut self, config: NakaaaConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Overrides a single dotted key after every other source.
    ///
    /// ```rust,ignore
    /// ConfigLoader::new().set("bot.prefix", "!").load()?;
    /// ```
    pub fn set<V: Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<NakaaaConfig> {
        let profile = self.profile.clone();
        let validate = self.validate;
        let figment = self.build_figment()?;

        let config: NakaaaConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        if validate {
            validate_config(&config)?;
        }

        debug!(
            profile = %profile,
            bot = %config.bot.name,
            prefix = %config.bot.prefix,
            handlers = ?config.handler.list,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(NakaaaConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = self.config_file.clone() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            if self.load_dotenv {
                for dir in self.dotenv_dirs() {
                    load_dotenv(dir)?;
                }
            }

            trace!("Loading environment variables with NAKAAA_ prefix");
            figment = figment
                .merge(
                    Env::prefixed("NAKAAA_")
                        .ignore(&["PROFILE"])
                        .split("__"),
                )
                .merge(Env::raw().only(BOT_ENV_VARS).map(|key| {
                    key.as_str()
                        .to_ascii_lowercase()
                        .replacen("bot_", "bot.", 1)
                        .into()
                }));
        }

        Ok(figment.merge(self.overrides))
    }

    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("nakaaa"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// Explicit search paths, or the working directory.
    fn dotenv_dirs(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            std::env::current_dir().into_iter().collect()
        } else {
            self.search_paths.clone()
        }
    }

    /// Profile variant first, then the base file; stops at the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["nakaaa.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["nakaaa.yaml", "nakaaa.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

// =============================================================================
// Tests
// =============================================================================
