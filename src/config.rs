use std::fs;
use std::path::Path;

use serde::Deserialize;
use validator::Validate;

use crate::core::GenericResult;
use crate::taxes::TaxTableRegistry;

#[derive(Deserialize, Validate, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Tax year to calculate the taxes for when it's not specified explicitly (the latest year with
    /// known tables by default)
    #[validate(range(min = 2000, max = 2100))]
    pub tax_year: Option<i32>,

    /// Path to a file with extra tax tables which are merged over the built-in ones
    pub tables: Option<String>,
}

impl Config {
    pub fn new(config_dir: &str) -> GenericResult<Config> {
        let config_path = Path::new(config_dir).join("config.yaml");

        Ok(if config_path.exists() {
            load_config(&config_path).map_err(|e| format!(
                "Error while reading {config_path:?} configuration file: {e}"))?
        } else {
            Config::default()
        })
    }

    #[cfg(test)]
    pub fn mock() -> Config {
        Config::default()
    }

    pub fn load_tables(&self) -> GenericResult<TaxTableRegistry> {
        Ok(match self.tables.as_ref() {
            Some(path) => TaxTableRegistry::load(Path::new(path))?,
            None => TaxTableRegistry::builtin()?,
        })
    }

    /// Resolves the tax year to use: the explicitly specified one, the configured one or the latest
    /// known one.
    pub fn tax_year(&self, registry: &TaxTableRegistry, year: Option<i32>) -> GenericResult<i32> {
        if let Some(year) = year.or(self.tax_year) {
            return Ok(year);
        }

        match registry.latest() {
            Some(year) => Ok(year),
            None => Err!("There are no tax tables for any tax year"),
        }
    }
}

fn load_config(path: &Path) -> GenericResult<Config> {
    let data = fs::read(path)?;

    let mut config: Config = serde_yaml::from_slice(&data)?;
    config.validate()?;

    if let Some(tables) = config.tables.as_mut() {
        *tables = shellexpand::tilde(tables).to_string();
    }

    Ok(config)
}
