use crate::servername::{Convention, ServerNameWriter, SIDECAR_SUFFIX};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "servername.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub convention: Convention,
    pub sidecar_suffix: String,
    pub log_file: Option<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            convention: Convention::Sidecar,
            sidecar_suffix: SIDECAR_SUFFIX.into(),
            log_file: Some("vpn-servername.log".into()),
        }
    }
}

impl WriterConfig {
    /// Writer for the configured convention, or `convention` when given.
    pub fn writer(&self, convention: Option<Convention>) -> ServerNameWriter {
        ServerNameWriter::new(convention.unwrap_or(self.convention))
            .with_sidecar_suffix(self.sidecar_suffix.clone())
    }
}

/**
 * @brief Load the writer configuration, creating it with defaults if missing.
 * @param path Config path; `servername.toml` when `None`.
 * @return Parsed WriterConfig.
 */
pub fn load_writer_config(path: Option<PathBuf>) -> Result<WriterConfig, Box<dyn std::error::Error>> {
    let p = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if !p.exists() {
        let def = WriterConfig::default();
        let s = toml::to_string_pretty(&def)?;
        fs::write(&p, s)?;
        log::info!("Created default config at {}", p.display());
        return Ok(def);
    }
    let s = fs::read_to_string(&p)?;
    let cfg: WriterConfig = toml::from_str(&s)?;
    // An empty suffix would point the sidecar at the config file itself.
    if cfg.sidecar_suffix.is_empty() {
        return Err(format!("{}: sidecar_suffix must not be empty", p.display()).into());
    }
    Ok(cfg)
}
