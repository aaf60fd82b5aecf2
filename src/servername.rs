use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Suffix appended to the output path under the sidecar convention.
pub const SIDECAR_SUFFIX: &str = ".servername";
/// Variable name used by the inline env convention.
pub const ENV_KEY: &str = "SERVER_NAME";
/// Owner read/write only.
pub const RECORD_MODE: u32 = 0o600;

/// Where and how the server name is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// `<outfile>.servername` holding the raw name, no trailing newline.
    #[default]
    Sidecar,
    /// `<outfile>` overwritten with `SERVER_NAME='<name>'\n`.
    InlineEnv,
}

impl Convention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Convention::Sidecar => "sidecar",
            Convention::InlineEnv => "inline_env",
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Convention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sidecar" => Ok(Convention::Sidecar),
            "inline_env" | "inline-env" => Ok(Convention::InlineEnv),
            other => Err(format!("unknown convention '{}' (expected sidecar or inline_env)", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to write server name to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to restrict permissions on {}: {source}", .path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid server name: {reason}")]
    InvalidServerName { reason: String },
    #[error("sidecar suffix is empty; the record would overwrite the config itself")]
    EmptySidecarSuffix,
}

/// Persists a server name next to a WireGuard config file.
#[derive(Debug, Clone)]
pub struct ServerNameWriter {
    convention: Convention,
    sidecar_suffix: String,
}

impl Default for ServerNameWriter {
    fn default() -> Self {
        Self::new(Convention::default())
    }
}

impl ServerNameWriter {
    pub fn new(convention: Convention) -> Self {
        Self {
            convention,
            sidecar_suffix: SIDECAR_SUFFIX.to_string(),
        }
    }

    pub fn with_sidecar_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sidecar_suffix = suffix.into();
        self
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    /**
     * @brief Resolve the file that holds the record for `output_path`.
     * @param output_path Base path, usually the generated WireGuard config.
     * @return Sidecar path for the sidecar convention, `output_path` itself otherwise.
     */
    pub fn target_path(&self, output_path: &Path) -> PathBuf {
        match self.convention {
            Convention::Sidecar => {
                let mut p = output_path.as_os_str().to_os_string();
                p.push(&self.sidecar_suffix);
                PathBuf::from(p)
            }
            Convention::InlineEnv => output_path.to_path_buf(),
        }
    }

    fn record_path(&self, output_path: &Path) -> io::Result<PathBuf> {
        if self.convention == Convention::Sidecar && self.sidecar_suffix.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, WriteError::EmptySidecarSuffix.to_string()));
        }
        Ok(self.target_path(output_path))
    }

    /**
     * @brief Render the record content for `server_name`, byte for byte.
     * @param server_name Opaque VPN server name.
     * @return Raw name for the sidecar convention, a `SERVER_NAME='...'` line otherwise.
     */
    pub fn render(&self, server_name: &str) -> String {
        match self.convention {
            Convention::Sidecar => server_name.to_string(),
            Convention::InlineEnv => format!("{}='{}'\n", ENV_KEY, server_name),
        }
    }

    /**
     * @brief Check that a record can be written without touching the filesystem.
     * @param server_name Opaque VPN server name.
     */
    pub fn validate(&self, server_name: &str) -> Result<(), WriteError> {
        if self.convention == Convention::Sidecar && self.sidecar_suffix.is_empty() {
            return Err(WriteError::EmptySidecarSuffix);
        }
        if server_name.is_empty() {
            return Err(WriteError::InvalidServerName { reason: "server name is empty".into() });
        }
        if self.convention == Convention::InlineEnv {
            // The value is single-quoted on one line; there is no escape syntax.
            if let Some(c) = server_name.chars().find(|c| matches!(c, '\'' | '\n' | '\r')) {
                return Err(WriteError::InvalidServerName {
                    reason: format!("{:?} cannot appear inside {}='...'", c, ENV_KEY),
                });
            }
        }
        Ok(())
    }

    /**
     * @brief Write `server_name` for `output_path`, replacing any previous record.
     * @param output_path Base path used to derive the target file.
     * @param server_name Opaque VPN server name.
     * @return Path of the file that was written.
     */
    pub fn write(&self, output_path: impl AsRef<Path>, server_name: &str) -> Result<PathBuf, WriteError> {
        self.validate(server_name)?;
        let target = self.target_path(output_path.as_ref());
        write_restricted(&target, self.render(server_name).as_bytes())?;
        debug!("Wrote server name {} to {} ({})", server_name, target.display(), self.convention);
        Ok(target)
    }

    /**
     * @brief Read back the server name stored for `output_path`.
     * @param output_path Base path used to derive the target file.
     * @return Stored server name; `InvalidData` if an env file has no entry.
     */
    pub fn read(&self, output_path: impl AsRef<Path>) -> io::Result<String> {
        let target = self.record_path(output_path.as_ref())?;
        let contents = fs::read_to_string(&target)?;
        debug!("Read server name record {}", target.display());
        match self.convention {
            Convention::Sidecar => Ok(contents),
            Convention::InlineEnv => {
                let prefix = format!("{}='", ENV_KEY);
                contents
                    .lines()
                    .find_map(|line| line.strip_prefix(prefix.as_str())?.strip_suffix('\'').map(str::to_owned))
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("no {} entry in {}", ENV_KEY, target.display()),
                        )
                    })
            }
        }
    }

    /**
     * @brief Delete the record for `output_path`.
     * @param output_path Base path used to derive the target file.
     * @return `false` when there was nothing to delete.
     */
    pub fn remove(&self, output_path: impl AsRef<Path>) -> io::Result<bool> {
        let target = self.record_path(output_path.as_ref())?;
        match fs::remove_file(&target) {
            Ok(()) => {
                debug!("Removed server name record {}", target.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/**
 * @brief Write the server name sidecar for `output_path` (`<output_path>.servername`).
 * @param output_path Path of the generated WireGuard config.
 * @param server_name Opaque VPN server name.
 * @return Path of the sidecar file.
 */
pub fn write_server_name_file(output_path: impl AsRef<Path>, server_name: &str) -> Result<PathBuf, WriteError> {
    ServerNameWriter::default().write(output_path, server_name)
}

fn write_restricted(path: &Path, contents: &[u8]) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io { path: path.to_path_buf(), source };
    let mut opts = OpenOptions::new();
    opts.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(RECORD_MODE);
    }
    let mut file = opts.open(path).map_err(io_err)?;
    file.write_all(contents).map_err(io_err)?;
    // mode() only applies on creation; narrow files that already existed.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(RECORD_MODE))
            .map_err(|source| WriteError::Permissions { path: path.to_path_buf(), source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "us_california-lax.pia.privateinternetaccess.com";

    #[test]
    fn sidecar_target_appends_suffix() {
        let w = ServerNameWriter::default();
        assert_eq!(w.target_path(Path::new("test-wg.conf")), PathBuf::from("test-wg.conf.servername"));
        let w = w.with_sidecar_suffix(".server");
        assert_eq!(w.target_path(Path::new("out/wg0.conf")), PathBuf::from("out/wg0.conf.server"));
    }

    #[test]
    fn inline_target_is_output_path() {
        let w = ServerNameWriter::new(Convention::InlineEnv);
        assert_eq!(w.target_path(Path::new("test-wg.conf")), PathBuf::from("test-wg.conf"));
    }

    #[test]
    fn render_formats() {
        assert_eq!(ServerNameWriter::default().render(NAME), NAME);
        assert_eq!(
            ServerNameWriter::new(Convention::InlineEnv).render(NAME),
            format!("SERVER_NAME='{}'\n", NAME)
        );
    }

    #[test]
    fn sidecar_accepts_quotes_but_not_empty() {
        let w = ServerNameWriter::default();
        assert!(w.validate("o'brien.example").is_ok());
        assert!(matches!(w.validate(""), Err(WriteError::InvalidServerName { .. })));
    }

    #[test]
    fn inline_rejects_quote_and_newlines() {
        let w = ServerNameWriter::new(Convention::InlineEnv);
        for bad in ["a'b", "a\nb", "a\rb", ""] {
            assert!(matches!(w.validate(bad), Err(WriteError::InvalidServerName { .. })), "{:?}", bad);
        }
        assert!(w.validate(NAME).is_ok());
    }

    #[test]
    fn empty_sidecar_suffix_is_rejected() {
        let w = ServerNameWriter::default().with_sidecar_suffix("");
        assert!(matches!(w.validate(NAME), Err(WriteError::EmptySidecarSuffix)));
        // the inline convention never uses the suffix
        let w = ServerNameWriter::new(Convention::InlineEnv).with_sidecar_suffix("");
        assert!(w.validate(NAME).is_ok());
    }

    #[test]
    fn permissions_error_names_path_and_keeps_source() {
        use std::error::Error as _;
        let err = WriteError::Permissions {
            path: PathBuf::from("wg0.conf.servername"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("failed to restrict permissions on wg0.conf.servername"));
        let source = err.source().and_then(|e| e.downcast_ref::<io::Error>()).unwrap();
        assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn convention_parses_and_displays() {
        assert_eq!("sidecar".parse::<Convention>().unwrap(), Convention::Sidecar);
        assert_eq!("inline_env".parse::<Convention>().unwrap(), Convention::InlineEnv);
        assert_eq!("inline-env".parse::<Convention>().unwrap(), Convention::InlineEnv);
        assert!("dotenv".parse::<Convention>().is_err());
        assert_eq!(Convention::InlineEnv.to_string(), "inline_env");
    }
}
