use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::Result;

const SECTION: &str = "main";
const CLIENT_ID: &str = "client_id";
const CLIENT_SECRET: &str = "client_secret";
const ACCESS_TOKEN: &str = "access_token";

/// OAuth credentials and the access token obtained with them.
///
/// Blank values are treated the same as missing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
}

impl Config {
    pub fn client_id(&self) -> Option<&str> {
        non_blank(&self.client_id)
    }

    pub fn client_secret(&self) -> Option<&str> {
        non_blank(&self.client_secret)
    }

    pub fn access_token(&self) -> Option<&str> {
        non_blank(&self.access_token)
    }

    /// Client id and secret, if both are set.
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        Some((self.client_id()?, self.client_secret()?))
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

pub trait ConfigStore {
    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Config>>;

    fn save(&self, config: &Config) -> Result<()>;
}

/// Loads the stored config, creating an empty one if there is none.
///
/// The flag is `true` when the config was just created.
pub fn load_or_create(store: &impl ConfigStore) -> Result<(Config, bool)> {
    if let Some(config) = store.load()? {
        return Ok((config, false));
    }

    let config = Config::default();
    store.save(&config)?;
    tracing::info!("Created empty config");
    Ok((config, true))
}

/// Config kept in the `[main]` section of an INI file.
#[derive(Debug, Clone)]
pub struct IniConfigStore {
    path: PathBuf,
}

impl IniConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for IniConfigStore {
    fn load(&self) -> Result<Option<Config>> {
        if !self.path.is_file() {
            return Ok(None);
        }

        let ini = Ini::load_from_file(&self.path)?;
        let get = |key: &str| {
            ini.get_from(Some(SECTION), key)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Some(Config {
            client_id: get(CLIENT_ID),
            client_secret: get(CLIENT_SECRET),
            access_token: get(ACCESS_TOKEN),
        }))
    }

    fn save(&self, config: &Config) -> Result<()> {
        let mut ini = if self.path.is_file() {
            Ini::load_from_file(&self.path)?
        } else {
            Ini::new()
        };

        ini.with_section(Some(SECTION))
            .set(CLIENT_ID, config.client_id.as_str())
            .set(CLIENT_SECRET, config.client_secret.as_str())
            .set(ACCESS_TOKEN, config.access_token.as_str());
        ini.write_to_file(&self.path)?;

        tracing::debug!(path = %self.path.display(), "Saved config");
        Ok(())
    }
}
