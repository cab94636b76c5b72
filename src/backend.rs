//! Engine adapter selection.

use crate::config::{EngineBackend, EngineConfig};
use anyhow::Result;
use mvgraph_engine::{GraphEngine, SimulatedEngine};

/// Create the engine adapter named by the `[engine]` config section.
pub fn create_engine(config: &EngineConfig) -> Result<Box<dyn GraphEngine>> {
    match config.backend {
        EngineBackend::Simulated => {
            tracing::info!("Using simulated graph engine");
            Ok(Box::new(SimulatedEngine::new()))
        }
        EngineBackend::Native => native(config),
    }
}

#[cfg(feature = "native-engine")]
fn native(config: &EngineConfig) -> Result<Box<dyn GraphEngine>> {
    use anyhow::Context;

    let plugins = config
        .plugin_path
        .as_deref()
        .context("The native engine backend requires engine.plugin_path")?;
    tracing::info!("Initialising native graph engine with plugins from {:?}", plugins);
    let engine = mvgraph_engine::NativeEngine::init(plugins, config.memory_pool)
        .context("Failed to initialise the native graph engine")?;
    Ok(Box::new(engine))
}

#[cfg(not(feature = "native-engine"))]
fn native(_config: &EngineConfig) -> Result<Box<dyn GraphEngine>> {
    anyhow::bail!("mvgraph was built without the native-engine feature")
}
