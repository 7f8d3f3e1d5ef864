use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "ORBIT_SCENE_CONFIG";
pub const HEADLESS_ENV: &str = "ORBIT_SCENE_HEADLESS";
pub const FRAMES_ENV: &str = "ORBIT_SCENE_FRAMES";
pub const SHADER_DIR_ENV: &str = "ORBIT_SCENE_SHADER_DIR";

const VERTEX_SHADER_FILE: &str = "lighting.vert.wgsl";
const FRAGMENT_SHADER_FILE: &str = "lighting.frag.wgsl";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is not a valid {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Runtime settings. Defaults describe the stock 800x600 "Test" window.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
    /// Requested MSAA sample count; lowered to 1 when the adapter cannot
    /// provide it.
    pub msaa_samples: u32,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// Skip window creation and run the headless backend.
    pub headless: bool,
    /// Frames rendered by the headless backend before it closes.
    pub headless_frames: u64,
    pub headless_frame_delta: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let shader_dir = PathBuf::from("shaders");
        Self {
            window_width: 800,
            window_height: 600,
            title: "Test".to_string(),
            msaa_samples: 4,
            vertex_shader: shader_dir.join(VERTEX_SHADER_FILE),
            fragment_shader: shader_dir.join(FRAGMENT_SHADER_FILE),
            headless: false,
            headless_frames: 60,
            headless_frame_delta: 1.0 / 60.0,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `ORBIT_SCENE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads a TOML config file. Keys it leaves out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// The file named by `ORBIT_SCENE_CONFIG` (or the defaults), then the
    /// remaining overrides from whatever `lookup` returns for each known key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV).filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(value) = lookup(HEADLESS_ENV) {
            config.headless = parse_flag(HEADLESS_ENV, &value)?;
        }
        if let Some(value) = lookup(FRAMES_ENV) {
            config.headless_frames = parse_number(FRAMES_ENV, &value, "frame count")?;
        }
        if let Some(dir) = lookup(SHADER_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            let dir = PathBuf::from(dir);
            config.vertex_shader = dir.join(VERTEX_SHADER_FILE);
            config.fragment_shader = dir.join(FRAGMENT_SHADER_FILE);
        }
        Ok(config)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            expected: "boolean",
        }),
    }
}

fn parse_number<T: FromStr>(
    key: &'static str,
    value: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        expected,
    })
}
