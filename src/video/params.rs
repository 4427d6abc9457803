//! Configuration of a `Context`.

use serde::{Deserialize, Serialize};

use super::errors::*;

/// A structure containing configuration data of a `Context`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextParams {
    /// Sets the size in pixels of the drawable area, which is the viewport of
    /// the root frame.
    pub dimensions: (u32, u32),
    /// Starts with the dependency graph recording on.
    pub debug: bool,
    /// Caps the number of texture units below the device limit.
    pub max_texture_units: Option<u32>,
}

impl Default for ContextParams {
    fn default() -> Self {
        ContextParams {
            dimensions: (640, 320),
            debug: false,
            max_texture_units: None,
        }
    }
}

impl ContextParams {
    /// Parses params from JSON. Missing fields take their default value.
    pub fn from_json(text: &str) -> Result<Self> {
        let params: ContextParams = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions.0 == 0 || self.dimensions.1 == 0 {
            return Err(Error::InvalidParams(format!(
                "dimensions {:?} must be non-zero",
                self.dimensions
            )));
        }

        if self.max_texture_units == Some(0) {
            return Err(Error::InvalidParams(
                "max_texture_units must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
