use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::ShareMapping;

/// Settings read from the JSON config file.
///
/// ```json
/// {
///   "currency_symbol": "₹",
///   "members": [
///     { "name": "Alice", "share": 0.3 },
///     { "name": "Bob", "share": 0.3 },
///     { "name": "Carol", "share": 0.4 }
///   ]
/// }
/// ```
///
/// `members` seeds the share mapping when a database is initialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency_symbol: String,
    pub members: ShareMapping,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".into(),
            members: ShareMapping::default_group(),
        }
    }
}

impl Config {
    /// Read the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}
