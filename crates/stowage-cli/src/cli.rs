use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stowage_core::app::{BackendKind, StorageConfig};

/// Store, fetch and sign objects through the storage port.
///
/// Settings are layered: built-in defaults, then `--config <json>`,
/// then flags / `STOWAGE_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "stowage", version, about, long_about = None)]
pub(crate) struct Args {
    /// JSON config file
    #[arg(long, env = "STOWAGE_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Storage backend: mock, memory or filesystem
    /// (memory lives only as long as one command)
    #[arg(short, long, env = "STOWAGE_BACKEND")]
    pub(crate) backend: Option<BackendKind>,

    /// Root directory of the filesystem backend
    #[arg(long, env = "STOWAGE_ROOT")]
    pub(crate) root: Option<PathBuf>,

    /// Base of object locators
    #[arg(long, env = "STOWAGE_PUBLIC_BASE")]
    pub(crate) public_base: Option<String>,

    /// Shared secret for HMAC signed urls
    #[arg(long, env = "STOWAGE_SIGNING_SECRET", hide_env_values = true)]
    pub(crate) signing_secret: Option<String>,

    /// Default lifetime of signed urls, in seconds
    #[arg(long, env = "STOWAGE_SIGNED_URL_TTL")]
    pub(crate) signed_url_ttl: Option<u64>,

    /// Reject payloads larger than this
    #[arg(long, env = "STOWAGE_MAX_UPLOAD_BYTES")]
    pub(crate) max_upload_bytes: Option<usize>,

    /// Allowed content types, e.g. `image/*` (repeatable or comma separated)
    #[arg(long = "allow", env = "STOWAGE_ALLOWED_CONTENT_TYPES", value_delimiter = ',')]
    pub(crate) allowed_content_types: Vec<String>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Check a payload without storing it (no file means "no data")
    Validate {
        file: Option<PathBuf>,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Store a file under a key
    Put {
        key: String,
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Fetch an object to stdout or a file
    Get {
        key: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Remove an object (succeeds when it is already gone)
    Delete { key: String },
    /// Report whether a key is stored
    Exists { key: String },
    /// Issue an access url
    Sign {
        key: String,
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Check an access url and print the key it grants
    Verify { url: String },
    /// Upload files under generated keys, all or nothing
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Args {
    pub(crate) fn storage_config(&self) -> anyhow::Result<StorageConfig> {
        let mut config = match &self.config {
            Some(path) => StorageConfig::from_json_file(path)?,
            None => StorageConfig::default(),
        };

        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(root) = &self.root {
            config.root = Some(root.clone());
        }
        if let Some(base) = &self.public_base {
            config.public_base = base.clone();
        }
        if let Some(secret) = &self.signing_secret {
            config.signing_secret = Some(secret.clone());
        }
        if let Some(ttl) = self.signed_url_ttl {
            config.signed_url_ttl_secs = ttl;
        }
        if let Some(max) = self.max_upload_bytes {
            config.max_upload_bytes = Some(max);
        }
        if !self.allowed_content_types.is_empty() {
            config.allowed_content_types = self.allowed_content_types.clone();
        }

        Ok(config)
    }
}

/// 1 回のコマンドの間しかデータが残らない設定への警告
pub(crate) fn ephemeral_backend_warning(config: &StorageConfig) -> Option<&'static str> {
    match config.backend {
        BackendKind::Memory => {
            Some("memory backend keeps objects only for this invocation; use filesystem to persist")
        }
        _ => None,
    }
}
