use crate::core::network::DEFAULT_SKIN_API_URL;
use directories::ProjectDirs;
use log::{LevelFilter, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, PoisonError};

const CONFIG_PATH: &str = "standskin.ini";
const FALLBACK_CONFIG_ROOT: &str = "config/standskin";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.parse(&content);
        Ok(())
    }

    pub fn parse(&mut self, content: &str) {
        self.sections.clear();
        let mut current_section = String::new();

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = name.trim().to_string();
                self.sections.entry(current_section.clone()).or_default();
                continue;
            }

            if let Some((key_raw, value_raw)) = line.split_once('=') {
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                self.sections
                    .entry(current_section.clone())
                    .or_default()
                    .insert(key.to_string(), value_raw.trim().to_string());
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }

    pub fn has(&self, section: &str, key: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|s| s.contains_key(key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Host ticks per second in the headless loop.
    pub tick_rate_hz: u16,
    pub host_timeout_seconds: u32,
    pub skin_base_url: String,
    /// None = platform config directory.
    pub config_root: Option<PathBuf>,
    pub download_attempts: u8,
    pub retry_delay_ms: u32,
    pub connect_timeout_ms: u32,
    pub read_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            tick_rate_hz: 20,
            host_timeout_seconds: 30,
            skin_base_url: DEFAULT_SKIN_API_URL.to_string(),
            config_root: None,
            download_attempts: 3,
            retry_delay_ms: 1000,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Directory that holds `skins/`.
    pub fn resolved_config_root(&self) -> PathBuf {
        if let Some(root) = &self.config_root {
            return root.clone();
        }
        ProjectDirs::from("", "", "standskin").map_or_else(
            || PathBuf::from(FALLBACK_CONFIG_ROOT),
            |dirs| dirs.config_dir().to_path_buf(),
        )
    }
}

static CONFIG: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

const OPTION_KEYS: [&str; 3] = ["HostTimeoutSeconds", "LogLevel", "TickRateHz"];
const SKIN_KEYS: [&str; 6] = [
    "BaseUrl",
    "ConfigRoot",
    "ConnectTimeoutMs",
    "DownloadAttempts",
    "ReadTimeoutMs",
    "RetryDelayMs",
];

fn parse_or<T: FromStr>(conf: &SimpleIni, section: &str, key: &str, default: T) -> T {
    conf.get(section, key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Builds a config from parsed INI contents. Missing or malformed values fall
/// back to defaults; numeric values are clamped to their allowed ranges.
pub fn parse_config(conf: &SimpleIni) -> Config {
    let default = Config::default();

    let skin_base_url = conf
        .get("Skins", "BaseUrl")
        .filter(|v| !v.is_empty())
        .unwrap_or(default.skin_base_url);
    let config_root = conf
        .get("Skins", "ConfigRoot")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    Config {
        log_level: conf
            .get("Options", "LogLevel")
            .and_then(|v| LogLevel::from_str(&v).ok())
            .unwrap_or(default.log_level),
        tick_rate_hz: parse_or(conf, "Options", "TickRateHz", default.tick_rate_hz).clamp(1, 240),
        host_timeout_seconds: parse_or(
            conf,
            "Options",
            "HostTimeoutSeconds",
            default.host_timeout_seconds,
        )
        .clamp(1, 3600),
        skin_base_url,
        config_root,
        download_attempts: parse_or(conf, "Skins", "DownloadAttempts", default.download_attempts)
            .clamp(1, 10),
        retry_delay_ms: parse_or(conf, "Skins", "RetryDelayMs", default.retry_delay_ms),
        connect_timeout_ms: parse_or(
            conf,
            "Skins",
            "ConnectTimeoutMs",
            default.connect_timeout_ms,
        )
        .max(1),
        read_timeout_ms: parse_or(conf, "Skins", "ReadTimeoutMs", default.read_timeout_ms).max(1),
    }
}

/// Serializes `cfg` with keys in alphabetical order per section.
fn render_config(cfg: &Config) -> String {
    let config_root = cfg
        .config_root
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let mut content = String::new();
    content.push_str("[Options]\n");
    content.push_str(&format!("HostTimeoutSeconds={}\n", cfg.host_timeout_seconds));
    content.push_str(&format!("LogLevel={}\n", cfg.log_level.as_str()));
    content.push_str(&format!("TickRateHz={}\n", cfg.tick_rate_hz));
    content.push('\n');

    content.push_str("[Skins]\n");
    content.push_str(&format!("BaseUrl={}\n", cfg.skin_base_url));
    content.push_str(&format!("ConfigRoot={config_root}\n"));
    content.push_str(&format!("ConnectTimeoutMs={}\n", cfg.connect_timeout_ms));
    content.push_str(&format!("DownloadAttempts={}\n", cfg.download_attempts));
    content.push_str(&format!("ReadTimeoutMs={}\n", cfg.read_timeout_ms));
    content.push_str(&format!("RetryDelayMs={}\n", cfg.retry_delay_ms));
    content.push('\n');
    content
}

fn missing_keys(conf: &SimpleIni) -> bool {
    OPTION_KEYS.iter().any(|k| !conf.has("Options", k))
        || SKIN_KEYS.iter().any(|k| !conf.has("Skins", k))
}

fn create_default_config_file() -> Result<(), std::io::Error> {
    info!("'{CONFIG_PATH}' not found, creating with default values.");
    std::fs::write(CONFIG_PATH, render_config(&Config::default()))
}

pub fn load() {
    if !Path::new(CONFIG_PATH).exists()
        && let Err(e) = create_default_config_file()
    {
        warn!("Failed to create default config file: {e}");
    }

    let mut conf = SimpleIni::new();
    match conf.load(CONFIG_PATH) {
        Ok(()) => {
            let parsed = parse_config(&conf);
            *CONFIG.lock().unwrap_or_else(PoisonError::into_inner) = parsed.clone();
            info!("Configuration loaded from '{CONFIG_PATH}'.");

            if missing_keys(&conf) {
                if let Err(e) = std::fs::write(CONFIG_PATH, render_config(&parsed)) {
                    warn!("Failed to save config file: {e}");
                } else {
                    info!("'{CONFIG_PATH}' updated with default values for any missing fields.");
                }
            } else {
                info!("Configuration OK; no write needed.");
            }
        }
        Err(e) => {
            warn!("Failed to load '{CONFIG_PATH}': {e}. Using default values.");
        }
    }
}

pub fn get() -> Config {
    CONFIG
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
