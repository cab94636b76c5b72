mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Largest memory pool the engine accepts.
pub const MAX_MEMORY_POOL: u32 = 50_000;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mvgraph.toml",
        "./config.toml",
        "~/.config/mvgraph/config.toml",
        "/etc/mvgraph/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn expand_paths(config: &mut Config) {
    if let Some(path) = config.engine.plugin_path.as_mut() {
        *path = expand_path(path);
    }
    if let Some(path) = config.graph.path.as_mut() {
        *path = expand_path(path);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    let pool = config.engine.memory_pool;
    if !(1..=MAX_MEMORY_POOL).contains(&pool) {
        anyhow::bail!(
            "Engine memory pool must be between 1 and {}, got {}",
            MAX_MEMORY_POOL,
            pool
        );
    }

    if config.engine.graph_name.trim().is_empty() {
        anyhow::bail!("Engine graph name cannot be empty");
    }

    if config.engine.backend == EngineBackend::Native && config.engine.plugin_path.is_none() {
        anyhow::bail!("The native engine backend requires engine.plugin_path");
    }

    if let Some(path) = &config.graph.path {
        if !path.exists() {
            tracing::warn!("Graph file does not exist: {:?}", path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 7500);
        assert_eq!(config.engine.backend, EngineBackend::Simulated);
        assert_eq!(config.engine.convert_options().graph_name, "pipeline");
        assert_eq!(config.engine.convert_options().memory_pool, 1000);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
[engine]
backend = "simulated"
memory_pool = 2048
graph_name = "studio"

[server]
host = "127.0.0.1"
port = 9000

[graph]
path = "/srv/graphs/studio.xml"

[graph.params]
INPUT = "/media/in.mvx"
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.engine.memory_pool, 2048);
        assert_eq!(config.engine.graph_name, "studio");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.graph.params["INPUT"], "/media/in.mvx");
    }

    #[test]
    fn test_memory_pool_out_of_range() {
        let file = write_config("[engine]\nmemory_pool = 50001\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("memory pool"));

        let file = write_config("[engine]\nmemory_pool = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_port_zero_rejected() {
        let file = write_config("[server]\nport = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_native_requires_plugin_path() {
        let file = write_config("[engine]\nbackend = \"native\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("plugin_path"));
    }

    #[test]
    fn test_tilde_expanded() {
        let file = write_config(
            "[engine]\nbackend = \"native\"\nplugin_path = \"~/mvx/plugins\"\n",
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.engine.plugin_path.unwrap(),
            PathBuf::from(shellexpand::tilde("~/mvx/plugins").as_ref())
        );
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[engine\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
