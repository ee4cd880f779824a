//! Tile URL templates.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::coord::TileCoord;

const PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlTemplateError {
    #[error("URL template '{template}' is missing the {placeholder} placeholder")]
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },
}

/// A URL with `{z}`, `{x}` and `{y}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(pub(crate) String);

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, UrlTemplateError> {
        if let Some(placeholder) = PLACEHOLDERS.iter().copied().find(|p| !template.contains(p)) {
            return Err(UrlTemplateError::MissingPlaceholder {
                template: template.to_string(),
                placeholder,
            });
        }
        Ok(Self(template.to_string()))
    }

    /// URL of `tile`.
    pub fn url_for(&self, tile: TileCoord) -> String {
        self.0
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UrlTemplate {
    type Err = UrlTemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
