use mvgraph_compiler::{ConvertOptions, ParameterBindings};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub graph: GraphConfig,
}

/// Which engine adapter a session talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// In-process engine, no native library required.
    #[default]
    Simulated,
    /// The native engine library (`native-engine` feature).
    Native,
}

impl std::fmt::Display for EngineBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineBackend::Simulated => write!(f, "simulated"),
            EngineBackend::Native => write!(f, "native"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub backend: EngineBackend,

    /// Directory the native engine loads its filter plugins from
    #[serde(default)]
    pub plugin_path: Option<PathBuf>,

    /// Engine memory pool size, also written into converted graphs
    #[serde(default = "default_memory_pool")]
    pub memory_pool: u32,

    /// Graph name used by the XML and JSON converters
    #[serde(default = "default_graph_name")]
    pub graph_name: String,
}

fn default_memory_pool() -> u32 {
    1000
}
fn default_graph_name() -> String {
    "pipeline".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::default(),
            plugin_path: None,
            memory_pool: default_memory_pool(),
            graph_name: default_graph_name(),
        }
    }
}

impl EngineConfig {
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            graph_name: self.graph_name.clone(),
            memory_pool: self.memory_pool,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    7500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Graph preloaded by `serve` and default parameter bindings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// `$NAME$` token values
    #[serde(default)]
    pub params: ParameterBindings,
}
