//! reading documents from readers and files
//!
//! Input is expected to be UTF-8; anything else fails with [Error::Io](crate::error::Error::Io).
use crate::configuration::Configuration;
use crate::error::Result;
use crate::parser::Recovery;
use crate::value::Map;
use std::io::Read;
use std::path::Path;

/// Reads `reader` to the end and reduces it
pub fn load_reader(mut reader: impl Read, recovery: impl Into<Recovery>) -> Result<Map> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    crate::parse_with(&source, recovery)
}

pub fn load_file(path: impl AsRef<Path>, recovery: impl Into<Recovery>) -> Result<Map> {
    let source = read_file(path.as_ref())?;
    crate::parse_with(&source, recovery)
}

pub fn load_configuration(
    path: impl AsRef<Path>,
    recovery: impl Into<Recovery>,
) -> Result<Configuration> {
    let source = read_file(path.as_ref())?;
    crate::parse_configuration(&source, recovery)
}

fn read_file(path: &Path) -> Result<String> {
    tracing::info!(path=%path.display(), "loading file");
    Ok(std::fs::read_to_string(path)?)
}
