use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use wbg_cli::LayoutOpts;
use wbg_gallery::{CatalogPolicy, Gallery};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 600;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("Config file error")]
    ConfigParse(#[from] toml::de::Error),
}

/// Optional overrides read from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub bind: Option<String>,
    pub root: Option<String>,
    pub folder_list: Option<String>,
    pub catalog_data: Option<String>,
    pub catalog_script: Option<String>,
    pub catalog_variable: Option<String>,
    pub public_prefix: Option<String>,
    pub catalog_policy: Option<CatalogPolicy>,
    pub max_upload_bytes: Option<usize>,
    pub upload_timeout_secs: Option<u64>,
}

impl ConfigFile {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;

        Ok(toml::from_str(&contents)?)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub layout: LayoutOpts,
    pub policy: CatalogPolicy,
    pub max_upload_bytes: usize,
    pub upload_timeout: Duration,
}

impl ServerConfig {
    pub fn new(bind: String, layout: LayoutOpts) -> Self {
        let policy = if layout.append {
            CatalogPolicy::Append
        } else {
            CatalogPolicy::Replace
        };

        Self {
            bind,
            layout,
            policy,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }

    /// Values present in the file take precedence.
    pub fn apply(mut self, file: ConfigFile) -> Self {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut self.bind, file.bind);
        set(&mut self.layout.root, file.root);
        set(&mut self.layout.folder_list, file.folder_list);
        set(&mut self.layout.catalog_data, file.catalog_data);
        set(&mut self.layout.catalog_script, file.catalog_script);
        set(&mut self.layout.catalog_variable, file.catalog_variable);
        set(&mut self.policy, file.catalog_policy);
        set(&mut self.max_upload_bytes, file.max_upload_bytes);
        set(
            &mut self.upload_timeout,
            file.upload_timeout_secs.map(Duration::from_secs),
        );

        if file.public_prefix.is_some() {
            self.layout.public_prefix = file.public_prefix;
        }

        self
    }

    pub fn gallery(&self) -> Gallery {
        Gallery::from_layout(&self.layout).with_policy(self.policy)
    }
}
