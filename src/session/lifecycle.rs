//! Lifecycle transitions.
//!
//! ```text
//! NOT_BUILT --build--> STOPPED --play--> PLAYING --pause--> PAUSED --resume--> PLAYING
//! PLAYING | PAUSED --stop--> STOPPED
//! any --destroy--> NOT_BUILT
//! ```
//!
//! A failed build or lifecycle engine call moves the graph to ERROR.

use super::{DispatchMode, FilterInstance, SessionCore};
use crate::error::{Error, Result};
use mvgraph_engine::{EngineOperation, GraphState, PlaybackMode};

impl SessionCore {
    fn expect_state(&self, operation: &'static str, allowed: &[GraphState]) -> Result<()> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(Error::InvalidState { operation, state })
        }
    }

    pub(super) fn build(&mut self) -> Result<Vec<FilterInstance>> {
        self.expect_state("build", &[GraphState::NotBuilt])?;
        if self.graph_created || !self.registry.is_empty() {
            return Err(Error::InvalidState {
                operation: "build before destroying the previous attempt",
                state: self.state(),
            });
        }
        let sequence = self.sequence.clone().ok_or(Error::NoGraphLoaded)?;

        tracing::info!(directives = sequence.len(), "building graph");
        let report = match self.run_sequence(&sequence, DispatchMode::Build) {
            Ok(report) => report,
            Err(e) => {
                if matches!(e, Error::Engine { .. }) {
                    self.set_state(GraphState::Error);
                }
                return Err(e);
            }
        };
        self.lifecycle_call(EngineOperation::BuildGraph, |e| e.build_graph())?;
        self.set_state(GraphState::Stopped);

        tracing::info!(
            executed = report.executed,
            filters = self.registry.len(),
            "graph built"
        );
        Ok(self.registry.attached())
    }

    /// Validate a play request without touching the engine.
    pub(super) fn check_playable(&self) -> Result<PlaybackMode> {
        match self.state() {
            GraphState::Playing => Err(Error::AlreadyPlaying),
            GraphState::Stopped | GraphState::Paused => {
                self.playback_mode.ok_or(Error::NoPlaybackMode)
            }
            state => Err(Error::InvalidState {
                operation: "play",
                state,
            }),
        }
    }

    pub(super) fn start_playback(&mut self, mode: PlaybackMode) -> Result<()> {
        self.lifecycle_call(EngineOperation::Play, |e| e.play(mode))?;
        self.set_state(GraphState::Playing);
        Ok(())
    }

    pub(super) fn pause(&mut self) -> Result<()> {
        self.expect_state("pause", &[GraphState::Playing])?;
        self.lifecycle_call(EngineOperation::Pause, |e| e.pause())?;
        self.set_state(GraphState::Paused);
        Ok(())
    }

    pub(super) fn resume(&mut self) -> Result<()> {
        self.expect_state("resume", &[GraphState::Paused])?;
        self.lifecycle_call(EngineOperation::Resume, |e| e.resume())?;
        self.set_state(GraphState::Playing);
        Ok(())
    }

    pub(super) fn stop(&mut self) -> Result<()> {
        self.expect_state("stop", &[GraphState::Playing, GraphState::Paused])?;
        self.lifecycle_call(EngineOperation::Stop, |e| e.stop())?;
        self.set_state(GraphState::Stopped);
        Ok(())
    }

    pub(super) fn destroy(&mut self) -> Result<()> {
        let state = self.state();
        if !self.needs_teardown() {
            self.clear();
            return Ok(());
        }

        if matches!(state, GraphState::Playing | GraphState::Paused) {
            // Keep tearing down even if the engine refuses to stop.
            if let Err(e) = self.lifecycle_call(EngineOperation::Stop, |e| e.stop()) {
                tracing::warn!(error = %e, "stop before destroy failed");
            }
        }
        self.lifecycle_call(EngineOperation::DestroyGraph, |e| e.destroy_graph())?;

        self.clear();
        self.set_state(GraphState::NotBuilt);
        tracing::info!("graph destroyed");
        Ok(())
    }
}
