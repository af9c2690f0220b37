//! Server configuration: CLI flags (with env fallback) over an optional TOML
//! file over built-in defaults. The resulting [`Config`] is immutable for the
//! lifetime of the process.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_ROOT_DIR: &str = "downloads";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(name = "lanshare", version, about = "Share a directory over the local network")]
struct Args {
    /// Directory served for browsing and downloads
    #[arg(short = 'd', long, env = "LANSHARE_ROOT_DIR")]
    root_dir: Option<PathBuf>,

    /// Directory incoming uploads are written to
    #[arg(short = 'u', long, env = "LANSHARE_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Port to listen on (all interfaces)
    #[arg(short = 'p', long, env = "LANSHARE_PORT")]
    port: Option<u16>,

    /// Maximum accepted upload body in bytes
    #[arg(long, env = "LANSHARE_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<u64>,

    /// TOML config file; flags and environment take precedence over it
    #[arg(short = 'c', long, env = "LANSHARE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    root_dir: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
    port: Option<u16>,
    max_upload_bytes: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub root_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub bind: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn load() -> anyhow::Result<Config> {
        Config::from_args(Args::parse())
    }

    fn from_args(args: Args) -> anyhow::Result<Config> {
        let file = match &args.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str::<FileConfig>(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);

        Ok(Config {
            root_dir: args
                .root_dir
                .or(file.root_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_DIR)),
            upload_dir: args
                .upload_dir
                .or(file.upload_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            max_upload_bytes: args
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES) as usize,
        })
    }

    /// Create the served directories if missing and pin both to canonical
    /// absolute paths. Every later containment check builds on these.
    pub fn prepare_dirs(&mut self) -> anyhow::Result<()> {
        for dir in [&mut self.root_dir, &mut self.upload_dir] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
            *dir = dunce::canonicalize(&dir)
                .with_context(|| format!("resolving directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_args() -> Args {
        Args {
            root_dir: None,
            upload_dir: None,
            port: None,
            max_upload_bytes: None,
            config: None,
        }
    }

    #[test]
    fn defaults_match_the_fixed_directory_names() {
        let config = Config::from_args(bare_args()).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("downloads"));
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.bind, "0.0.0.0:5000".parse().unwrap());
    }

    #[test]
    fn config_file_overrides_defaults_but_not_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lanshare.toml");
        std::fs::write(&path, "root_dir = \"pub\"\nport = 8080\n").unwrap();

        let mut args = bare_args();
        args.config = Some(path);
        args.port = Some(9000);

        let config = Config::from_args(args).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("pub"));
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn unknown_config_keys_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lanshare.toml");
        std::fs::write(&path, "bogus = true\n").unwrap();

        let mut args = bare_args();
        args.config = Some(path);
        assert!(Config::from_args(args).is_err());
    }

    #[test]
    fn prepare_dirs_creates_and_canonicalizes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_args(bare_args()).unwrap();
        config.root_dir = dir.path().join("served");
        config.upload_dir = dir.path().join("incoming");

        config.prepare_dirs().unwrap();
        assert!(config.root_dir.is_absolute());
        assert!(config.root_dir.is_dir());
        assert!(config.upload_dir.is_dir());
    }
}
