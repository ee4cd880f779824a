//! `ogr2ogr` invocation.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info, warn};

use super::{ConvertError, GeometryKind};

/// Runs the conversion tool with a prepared argument list.
///
/// Lets the stage drivers run without GDAL installed in tests.
pub trait CommandRunner {
    fn run(&self, layer: &str, args: &[OsString]) -> Result<(), ConvertError>;
}

/// Runs `ogr2ogr` as a child process and forwards its output to the log.
#[derive(Debug, Clone)]
pub struct Ogr2Ogr {
    program: String,
}

impl Ogr2Ogr {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for Ogr2Ogr {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_OGR2OGR)
    }
}

impl CommandRunner for Ogr2Ogr {
    fn run(&self, layer: &str, args: &[OsString]) -> Result<(), ConvertError> {
        debug!(program = %self.program, layer = layer, ?args, "Starting conversion");

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            info!(layer = layer, "{}", line);
        }
        for line in stderr.lines() {
            warn!(layer = layer, "{}", line);
        }

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                program: self.program.clone(),
                layer: layer.to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        info!(layer = layer, "Conversion finished");
        Ok(())
    }
}

/// GDAL virtual path reading a gzip file transparently.
fn vsigzip(path: &Path) -> OsString {
    let mut out = OsString::from("/vsigzip/");
    out.push(path);
    out
}

/// Arguments converting a layer stream into a single-layer GeoPackage.
pub fn geopackage_args(name: &str, kind: GeometryKind, src: &Path, dst: &Path) -> Vec<OsString> {
    vec![
        "-nln".into(),
        name.into(),
        "-lco".into(),
        "GEOMETRY_NAME=geometry".into(),
        "-explodecollections".into(),
        "-makevalid".into(),
        "-nlt".into(),
        kind.ogr_name().into(),
        dst.into(),
        vsigzip(src),
    ]
}

/// Arguments unioning a GeoPackage layer into a gzip GeoJSONSeq stream.
pub fn union_args(name: &str, columns: &[String], src: &Path, dst: &Path) -> Vec<OsString> {
    vec![
        "-f".into(),
        "GeoJSONSeq".into(),
        vsigzip(dst),
        src.into(),
        "-dialect".into(),
        "SQLite".into(),
        "-sql".into(),
        union_sql(name, columns).into(),
    ]
}

/// SQL merging all geometries that share the same attribute values.
pub fn union_sql(name: &str, columns: &[String]) -> String {
    let table = quote_ident(name);
    if columns.is_empty() {
        return format!("SELECT ST_Union(geometry) AS geometry FROM {}", table);
    }
    let cols = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT ST_Union(geometry) AS geometry, {cols} FROM {table} GROUP BY {cols}",
        cols = cols,
        table = table
    )
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
