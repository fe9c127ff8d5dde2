use dotenv::var;
use serde::{Deserialize, Serialize};
use shieldlcd_pio::lcd::hd44780::driver::LcdTiming;
use shieldlcd_pio::raw::RawPioLayout;
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown backend {0:?}, expected \"raw\" or \"recording\"")]
    UnknownBackend(String),
}

/// Where the PIO writes go.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Memory-mapped registers.
    #[default]
    Raw,
    /// Nothing is written, the bus traffic is logged instead.
    Recording,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Backend::Raw),
            "recording" => Ok(Backend::Recording),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub mem_path: String,
    pub base_address: u64,
    pub group_stride: usize,
    pub settle_delay_us: u64,
    pub strobe_delay_us: u64,
    pub text: String,
}

impl Config {
    fn path() -> String {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("shieldlcd.json"));
        config_str.to_string_lossy().into_owned()
    }

    pub fn try_load() -> Result<Option<Self>, ConfigError> {
        let config_str = Self::path();
        let config_path = Path::new(&config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path)?;
            let reader = std::io::BufReader::new(file);
            Ok(Some(serde_json::from_reader(reader)?))
        } else {
            Ok(None)
        }
    }

    /// Loads the config file (or the defaults), then applies `SHIELDLCD_BACKEND` if set.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::try_load()?.unwrap_or_default();
        if let Ok(backend) = var("SHIELDLCD_BACKEND") {
            config.backend = backend.parse()?;
        }
        Ok(config)
    }

    pub fn layout(&self) -> RawPioLayout {
        RawPioLayout {
            base_address: self.base_address,
            group_stride: self.group_stride,
        }
    }

    pub fn timing(&self) -> LcdTiming {
        LcdTiming {
            settle: Duration::from_micros(self.settle_delay_us),
            strobe: Duration::from_micros(self.strobe_delay_us),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let layout = RawPioLayout::default();
        Config {
            backend: Backend::default(),
            mem_path: "/dev/mem".to_string(),
            base_address: layout.base_address,
            group_stride: layout.group_stride,
            settle_delay_us: 0,
            strobe_delay_us: 0,
            text: "Hello, World!".to_string(),
        }
    }
}
