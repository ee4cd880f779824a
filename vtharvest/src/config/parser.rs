//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::MAX_ZOOM;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::GeoBoundingBox;
use crate::fetch::UrlTemplate;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [region] section
    if let Some(section) = ini.section(Some("region")) {
        if let Some(v) = non_empty(section, "name") {
            config.region.name = v.to_string();
        }
        if let Some(v) = section.get("bbox") {
            config.region.bbox = GeoBoundingBox::from_str(v).map_err(|e| {
                invalid("region", "bbox", v, &format!("{} (expected minLon,minLat,maxLon,maxLat)", e))
            })?;
        }
        if let Some(v) = section.get("zoom") {
            config.region.zoom = match v.trim().parse::<u8>() {
                Ok(zoom) if zoom <= MAX_ZOOM => zoom,
                _ => {
                    return Err(invalid(
                        "region",
                        "zoom",
                        v,
                        &format!("must be an integer between 0 and {}", MAX_ZOOM),
                    ))
                }
            };
        }
    }

    // [source] section
    if let Some(section) = ini.section(Some("source")) {
        if let Some(v) = section.get("url") {
            config.source.url = UrlTemplate::parse(v.trim())
                .map_err(|e| invalid("source", "url", v, &e.to_string()))?;
        }
        if let Some(v) = section.get("referer") {
            let v = v.trim();
            config.source.referer = (!v.is_empty()).then(|| v.to_string());
        }
    }

    // [fetch] section
    if let Some(section) = ini.section(Some("fetch")) {
        if let Some(v) = section.get("concurrency") {
            config.fetch.concurrency = parse_positive(v, "fetch", "concurrency")?;
        }
        if let Some(v) = section.get("timeout_secs") {
            config.fetch.timeout_secs = parse_positive(v, "fetch", "timeout_secs")?;
        }
        if let Some(v) = section.get("max_attempts") {
            config.fetch.max_attempts = parse_positive(v, "fetch", "max_attempts")?;
        }
        if let Some(v) = section.get("retry_delay_ms") {
            config.fetch.retry_delay_ms = v
                .trim()
                .parse()
                .map_err(|_| invalid("fetch", "retry_delay_ms", v, "must be a non-negative integer"))?;
        }
    }

    // [merge] section
    if let Some(section) = ini.section(Some("merge")) {
        if let Some(v) = section.get("ignore_layers") {
            config.merge.ignore_layers = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = section.get("compression") {
            config.merge.compression = match v.trim().parse::<u32>() {
                Ok(level) if level <= 9 => level,
                _ => return Err(invalid("merge", "compression", v, "must be between 0 and 9")),
            };
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "directory") {
            config.cache.directory = expand_tilde(v);
        }
    }

    // [convert] section
    if let Some(section) = ini.section(Some("convert")) {
        if let Some(v) = non_empty(section, "ogr2ogr") {
            config.convert.ogr2ogr = v.to_string();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive<T>(value: &str, section: &str, key: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(invalid(section, key, value, "must be a positive integer")),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
