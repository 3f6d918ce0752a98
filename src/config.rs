use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../default.toml");

/// Configuration file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "udi.toml";

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    ReadFile {
        err: std::io::Error,
        path: String,
    },

    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A udi.toml file, merged over the built-in defaults.
#[derive(Deserialize, Debug, Clone)]
pub struct File {
    pub description: Option<String>,
    pub storage: Storage,
    pub spreadsheet: Spreadsheet,
}

/// Bucket holding the build artifacts.
#[serde_inline_default]
#[derive(Deserialize, Debug, Clone)]
pub struct Storage {
    pub bucket: String,
    pub region: String,
    #[serde_inline_default("/".to_string())]
    pub delimiter: String,
}

/// Release tracking spreadsheet.
#[serde_inline_default]
#[derive(Deserialize, Debug, Clone)]
pub struct Spreadsheet {
    pub id: String,
    /// Column range searched for artifact names, relative to each sheet.
    #[serde_inline_default("A1:A50".to_string())]
    pub index_range: String,
}

impl Default for File {
    fn default() -> Self {
        // The default config is compiled into the program, so
        // make sure to test default() to catch panics compile-time.
        toml::from_str(DEFAULT_CONFIG).unwrap()
    }
}

/// Recursively overlay `user` on top of `base`. Tables merge key by key,
/// any other value in `user` replaces the one in `base`.
fn merge(base: &mut toml::Table, user: toml::Table) {
    for (key, value) in user {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(user_table)) => {
                merge(base_table, user_table)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

impl File {
    /// Parse a user configuration and merge it over the built-in defaults.
    pub fn default_with_user_config(user_config: &str) -> Result<Self, Error> {
        let mut config: toml::Table = toml::from_str(DEFAULT_CONFIG)?;
        merge(&mut config, toml::from_str(user_config)?);
        Ok(toml::Value::Table(config).try_into()?)
    }

    /// Read a user configuration file and merge it over the built-in defaults.
    pub fn default_with_user_config_file(path: &str) -> Result<Self, Error> {
        let user_config = std::fs::read_to_string(path).map_err(|err| Error::ReadFile {
            err,
            path: path.to_string(),
        })?;
        Self::default_with_user_config(&user_config)
    }
}

#[cfg(test)]
pub mod test {
    use super::File;

    #[test]
    pub fn load_default_configuration() {
        let cfg = File::default();
        assert_eq!(cfg.description, Some("Default configuration file".into()));
        assert_eq!(cfg.storage.bucket, "isentia-build-artifacts");
        assert_eq!(cfg.storage.region, "ap-southeast-2");
        assert_eq!(cfg.storage.delimiter, "/");
        assert_eq!(cfg.spreadsheet.index_range, "A1:A50");
    }

    #[test]
    pub fn user_configuration_overrides_defaults() {
        let cfg = File::default_with_user_config(
            r#"
            [spreadsheet]
            id = "my-sheet"
            "#,
        ).unwrap();
        assert_eq!(cfg.spreadsheet.id, "my-sheet");
        assert_eq!(cfg.spreadsheet.index_range, "A1:A50");
        assert_eq!(cfg.storage.bucket, "isentia-build-artifacts");
    }

    #[test]
    pub fn invalid_user_configuration() {
        assert!(File::default_with_user_config("[storage]\nbucket = 3").is_err());
        assert!(File::default_with_user_config("not toml").is_err());
    }
}
