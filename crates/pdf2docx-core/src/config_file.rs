use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay before an unretrieved artifact is removed.
pub const DEFAULT_REMOVAL_DELAY: Duration = Duration::from_secs(120);

/// Default cap on the request body of an upload.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 100;

pub const DEFAULT_PORT: u16 = 5000;

/// Contents of a `config.toml` / `.pdf2docx.toml` file.
///
/// Every key may be omitted; [`Settings`] fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: Option<StorageConfig>,
    pub server: Option<ServerConfig>,
    pub cleanup: Option<CleanupConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: Option<String>,
    pub converted_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_mb: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupConfig {
    pub removal_delay_secs: Option<u64>,
}

/// `<config_dir>/pdf2docx/config.toml`, if the platform has a config dir.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pdf2docx").join("config.toml"))
}

/// Read the platform file, then `.pdf2docx.toml` in the working directory.
/// Keys in the working-directory file win.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".pdf2docx.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Parse one config file. Missing or malformed files yield `None`; the
/// latter is logged.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Key-by-key merge where `overlay` wins.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let storage = |f: fn(&StorageConfig) -> Option<String>| {
        overlay
            .storage
            .as_ref()
            .and_then(f)
            .or_else(|| base.storage.as_ref().and_then(f))
    };
    let host = overlay
        .server
        .as_ref()
        .and_then(|s| s.host.clone())
        .or_else(|| base.server.as_ref().and_then(|s| s.host.clone()));
    let port = overlay
        .server
        .as_ref()
        .and_then(|s| s.port)
        .or_else(|| base.server.as_ref().and_then(|s| s.port));
    let max_upload_mb = overlay
        .server
        .as_ref()
        .and_then(|s| s.max_upload_mb)
        .or_else(|| base.server.as_ref().and_then(|s| s.max_upload_mb));
    let removal_delay_secs = overlay
        .cleanup
        .as_ref()
        .and_then(|c| c.removal_delay_secs)
        .or_else(|| base.cleanup.as_ref().and_then(|c| c.removal_delay_secs));

    ConfigFile {
        storage: Some(StorageConfig {
            upload_dir: storage(|s| s.upload_dir.clone()),
            converted_dir: storage(|s| s.converted_dir.clone()),
        }),
        server: Some(ServerConfig {
            host,
            port,
            max_upload_mb,
        }),
        cleanup: Some(CleanupConfig { removal_delay_secs }),
    }
}

/// Resolved runtime settings, injected into the service at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub upload_dir: PathBuf,
    pub converted_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub removal_delay: Duration,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("pdf2docx");
        Self {
            upload_dir: base.join("uploads"),
            converted_dir: base.join("converted_files"),
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            removal_delay: DEFAULT_REMOVAL_DELAY,
            max_upload_bytes: megabytes(DEFAULT_MAX_UPLOAD_MB),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the config file cascade, overlaid with the
    /// process environment.
    pub fn load() -> Self {
        Self::from_config_file(&load_config()).with_env(|key| std::env::var(key).ok())
    }

    pub fn from_config_file(config: &ConfigFile) -> Self {
        let mut settings = Self::default();

        if let Some(storage) = &config.storage {
            if let Some(dir) = &storage.upload_dir {
                settings.upload_dir = PathBuf::from(dir);
            }
            if let Some(dir) = &storage.converted_dir {
                settings.converted_dir = PathBuf::from(dir);
            }
        }
        if let Some(server) = &config.server {
            if let Some(host) = &server.host {
                settings.set_host(host);
            }
            if let Some(port) = server.port {
                settings.bind_addr.set_port(port);
            }
            if let Some(mb) = server.max_upload_mb {
                settings.max_upload_bytes = megabytes(mb);
            }
        }
        if let Some(secs) = config.cleanup.as_ref().and_then(|c| c.removal_delay_secs) {
            settings.removal_delay = Duration::from_secs(secs);
        }

        settings
    }

    /// Apply `PDF2DOCX_*` overrides read through `lookup`.
    ///
    /// Unparsable numeric values are logged and ignored.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("PDF2DOCX_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("PDF2DOCX_CONVERTED_DIR") {
            self.converted_dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup("PDF2DOCX_HOST") {
            self.set_host(&host);
        }
        if let Some(port) = parse_env::<u16>(&lookup, "PDF2DOCX_PORT") {
            self.bind_addr.set_port(port);
        }
        if let Some(secs) = parse_env::<u64>(&lookup, "PDF2DOCX_REMOVAL_DELAY_SECS") {
            self.removal_delay = Duration::from_secs(secs);
        }
        if let Some(mb) = parse_env::<usize>(&lookup, "PDF2DOCX_MAX_UPLOAD_MB") {
            self.max_upload_bytes = megabytes(mb);
        }
        self
    }

    fn set_host(&mut self, host: &str) {
        match host.parse::<IpAddr>() {
            Ok(ip) => self.bind_addr.set_ip(ip),
            Err(e) => tracing::warn!(host, error = %e, "ignoring invalid host"),
        }
    }
}

/// Byte count for a limit given in MiB, clamped at `usize::MAX`.
fn megabytes(mb: usize) -> usize {
    mb.saturating_mul(1024 * 1024)
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment value");
            None
        }
    }
}
