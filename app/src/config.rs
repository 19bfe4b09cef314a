use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com";
const DEFAULT_WEB_BASE: &str = "https://drive.google.com";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub log_level: String,
    pub drive_api_key: Option<String>,
    pub drive_api_base: String,
    pub drive_web_base: String,
    pub events_file: Option<PathBuf>,
    pub batch_size: usize,
    pub page_size: usize,
    pub batch_delay_ms: u64,
    pub probe_timeout_secs: u64,
    pub data_dir: PathBuf,
    /// Set when the Drive key came from the environment; such keys are
    /// never written back to the config file.
    #[serde(skip)]
    pub api_key_from_env: bool,
}

#[derive(Default)]
pub struct AppConfigOverrides {
    pub log_level: Option<String>,
    pub events_file: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub page_size: Option<usize>,
    pub probe_timeout_secs: Option<u64>,
}

fn default_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bandsite")
}

impl AppConfig {
    /// Read the config file (optional) and `BANDSITE_*` environment
    /// variables. The Drive key may also come from `DRIVE_API_KEY`.
    pub fn load_from(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(|| default_dir().join("config"));
        let cfg = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("BANDSITE"))
            .build()
            .unwrap_or_default();

        let log_level = cfg
            .get_string("log_level")
            .unwrap_or_else(|_| "info".to_string());
        let configured_key = cfg
            .get_string("drive_api_key")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let prefixed_env_key = std::env::var("BANDSITE_DRIVE_API_KEY").is_ok();
        let api_key_from_env = prefixed_env_key || configured_key.is_none();
        let drive_api_key = configured_key
            .or_else(|| std::env::var("DRIVE_API_KEY").ok())
            .filter(|k| !k.trim().is_empty());
        let api_key_from_env = api_key_from_env && drive_api_key.is_some();
        let drive_api_base = cfg
            .get_string("drive_api_base")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let drive_web_base = cfg
            .get_string("drive_web_base")
            .unwrap_or_else(|_| DEFAULT_WEB_BASE.to_string());
        let events_file = cfg.get_string("events_file").ok().map(PathBuf::from);
        let batch_size = cfg.get_int("batch_size").unwrap_or(10).max(1) as usize;
        let page_size = cfg.get_int("page_size").unwrap_or(10).max(1) as usize;
        let batch_delay_ms = cfg.get_int("batch_delay_ms").unwrap_or(50).max(0) as u64;
        let probe_timeout_secs = cfg.get_int("probe_timeout_secs").unwrap_or(10).max(1) as u64;
        let data_dir = cfg
            .get_string("data_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_dir());

        Self {
            log_level,
            drive_api_key,
            drive_api_base,
            drive_web_base,
            events_file,
            batch_size,
            page_size,
            batch_delay_ms,
            probe_timeout_secs,
            data_dir,
            api_key_from_env,
        }
    }

    pub fn apply_overrides(mut self, ov: &AppConfigOverrides) -> Self {
        if let Some(l) = &ov.log_level {
            self.log_level = l.clone();
        }
        if let Some(f) = &ov.events_file {
            self.events_file = Some(f.clone());
        }
        if let Some(b) = ov.batch_size {
            self.batch_size = b.max(1);
        }
        if let Some(p) = ov.page_size {
            self.page_size = p.max(1);
        }
        if let Some(t) = ov.probe_timeout_secs {
            self.probe_timeout_secs = t.max(1);
        }
        self
    }

    /// Write the config as TOML and return the path it was written to.
    pub fn save_to(&self, path: Option<PathBuf>) -> std::io::Result<PathBuf> {
        let path = path.unwrap_or_else(|| default_dir().join("config"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut persisted = self.clone();
        if persisted.api_key_from_env {
            persisted.drive_api_key = None;
        }
        let data = toml::to_string(&persisted)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&path, data)?;
        Ok(path)
    }
}
