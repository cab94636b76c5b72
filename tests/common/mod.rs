//! Shared test harness for integration tests.
//!
//! [`TestHarness`] pairs a [`Session`] with the [`SimulatedHandle`] of the
//! engine it drives, so tests can inspect the engine's call journal and
//! inject faults.

#![allow(dead_code)]

use mvgraph::config::Config;
use mvgraph::server::{create_router, AppContext};
use mvgraph::Session;
use mvgraph_compiler::{compile, CommandSequence, ParameterBindings};
use mvgraph_engine::{SimulatedEngine, SimulatedHandle};

/// Two attached filters and a captured forward-loop run mode.
pub const CAMERA_GRAPH: &str = "\
SetMemoryPool~1000~b

creategraph~pipeline~b
createfilterbyname~Camera~camera_1~b
setParams~camera_1~Exposure~12~b
createfilterbyname~Encoder~encoder_1~b
setParams~encoder_1~Bitrate~4000~b
attachfilter~pipeline~camera_1~b
attachfilter~pipeline~encoder_1~b
getParams~pipeline~camera_1~b
rungraph~pipeline~1~b
";

/// Like [`CAMERA_GRAPH`] but without a run directive.
pub const NO_RUN_GRAPH: &str = "\
creategraph~pipeline~b
createfilterbyname~Camera~camera_1~b
attachfilter~pipeline~camera_1~b
";

pub fn sequence(text: &str) -> CommandSequence {
    compile(text, &ParameterBindings::new())
        .expect("test graph compiles")
        .sequence
}

pub struct TestHarness {
    pub session: Session,
    pub engine: SimulatedHandle,
}

impl TestHarness {
    pub fn new() -> Self {
        let engine = SimulatedEngine::new();
        let handle = engine.handle();
        Self {
            session: Session::new(engine),
            engine: handle,
        }
    }

    /// A harness whose session already has `text` staged.
    pub async fn staged(text: &str) -> Self {
        let harness = Self::new();
        harness.session.stage(sequence(text)).await;
        harness
    }

    /// A harness whose session has built `text`.
    pub async fn built(text: &str) -> Self {
        let harness = Self::staged(text).await;
        harness.session.build().await.expect("test graph builds");
        harness
    }

    pub fn context(&self) -> AppContext {
        AppContext::new(self.session.clone(), Config::default())
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.context())
    }
}
