//! Loading graph descriptions from disk.

use crate::canonical::{compile, CompiledGraph, ParameterBindings};
use crate::error::{Error, Result};
use crate::writer::ConvertOptions;
use crate::{flat, hierarchical};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Source syntax of a graph description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// XML pipeline document.
    Xml,
    /// JSON filter list.
    Json,
    /// Canonical `~` lines.
    Text,
}

impl SourceFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Text => "txt",
        }
    }

    /// Convert source text into canonical text.
    pub fn to_canonical(self, source: &str, options: &ConvertOptions) -> Result<String> {
        match self {
            Self::Xml => hierarchical::to_canonical(source, options),
            Self::Json => flat::to_canonical(source, options),
            Self::Text => Ok(source.to_string()),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "txt" | "text" | "canonical" => Ok(Self::Text),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Convert and compile source text of a known format.
pub fn compile_source(
    source: &str,
    format: SourceFormat,
    bindings: &ParameterBindings,
    options: &ConvertOptions,
) -> Result<CompiledGraph> {
    let canonical = format.to_canonical(source, options)?;
    compile(&canonical, bindings)
}

/// Where the materialized text of `source` is written:
/// `<dir>/<stem>_from_<ext>.txt`.
pub fn materialized_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "graph".to_string());
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}_from_{ext}.txt"))
}

/// A compiled graph file.
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub source: PathBuf,
    pub format: SourceFormat,
    pub compiled: CompiledGraph,
}

/// Read, convert and compile a graph file.
pub fn load(
    path: &Path,
    bindings: &ParameterBindings,
    options: &ConvertOptions,
) -> Result<LoadedGraph> {
    let format = SourceFormat::from_path(path)?;
    let source = std::fs::read_to_string(path)?;
    let compiled = compile_source(&source, format, bindings, options)?;

    tracing::info!(
        path = %path.display(),
        %format,
        directives = compiled.sequence.len(),
        "loaded graph"
    );

    Ok(LoadedGraph {
        source: path.to_path_buf(),
        format,
        compiled,
    })
}

/// [`load`], then write the materialized text next to the source.
pub fn load_and_materialize(
    path: &Path,
    bindings: &ParameterBindings,
    options: &ConvertOptions,
) -> Result<(LoadedGraph, PathBuf)> {
    let loaded = load(path, bindings, options)?;
    let target = materialized_path(path);
    std::fs::write(&target, &loaded.compiled.materialized)?;
    tracing::debug!(target = %target.display(), "wrote materialized graph");
    Ok((loaded, target))
}
