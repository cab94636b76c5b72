//! Directive dispatch.

use super::SessionCore;
use crate::error::{Error, Result};
use mvgraph_compiler::{CanonicalCommand, CommandKind, CommandSequence};
use mvgraph_engine::{EngineOperation, PlaybackMode};
use serde::Serialize;

/// Which directives of a sequence run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Everything except no-op directives.
    Build,
    /// Only `setparams`.
    Set,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub executed: usize,
    pub skipped: usize,
}

fn require_args(cmd: &CanonicalCommand, expected: usize) -> Result<()> {
    if cmd.args.len() < expected {
        return Err(Error::InvalidArguments {
            command: cmd.name.clone(),
            line: cmd.line,
            expected,
            actual: cmd.args.len(),
        });
    }
    Ok(())
}

fn parse_mode(value: &str) -> Result<PlaybackMode> {
    value
        .parse()
        .map_err(|_| Error::InvalidPlaybackMode(value.to_string()))
}

impl SessionCore {
    /// Run `sequence` in order, stopping at the first error.
    pub(super) fn run_sequence(
        &mut self,
        sequence: &CommandSequence,
        mode: DispatchMode,
    ) -> Result<DispatchReport> {
        let mut report = DispatchReport::default();
        for cmd in sequence {
            let runs = match mode {
                DispatchMode::Build => !cmd.kind.is_noop(),
                DispatchMode::Set => cmd.kind == CommandKind::SetParams,
            };
            if !runs {
                report.skipped += 1;
                continue;
            }
            self.dispatch(cmd).inspect_err(|e| {
                tracing::error!(line = cmd.line, command = %cmd, error = %e, "directive failed");
            })?;
            report.executed += 1;
        }
        Ok(report)
    }

    fn dispatch(&mut self, cmd: &CanonicalCommand) -> Result<()> {
        tracing::debug!(line = cmd.line, command = %cmd, "dispatching");
        let args = &cmd.args;

        match cmd.kind {
            CommandKind::SetMemoryPool | CommandKind::SetAgent => Ok(()),
            CommandKind::CreateFilterByName => {
                require_args(cmd, 2)?;
                let (filter_type, name) = (&args[0], &args[1]);
                self.registry.ensure_vacant(name)?;
                let id = self.engine_call(EngineOperation::CreateFilterByName, |e| {
                    e.create_filter_by_name(filter_type)
                })?;
                self.registry.register(name, id)
            }
            CommandKind::CreateFilterByGuid | CommandKind::CreateFilter => {
                require_args(cmd, 2)?;
                let (guid, name) = (&args[0], &args[1]);
                self.registry.ensure_vacant(name)?;
                let id = self.engine_call(EngineOperation::CreateFilterByGuid, |e| {
                    e.create_filter_by_guid(guid, name)
                })?;
                self.registry.register(name, id)
            }
            CommandKind::CreateGraph => {
                require_args(cmd, 1)?;
                self.engine_call(EngineOperation::CreateGraph, |e| e.create_graph())?;
                self.graph_created = true;
                Ok(())
            }
            CommandKind::AttachFilter => {
                require_args(cmd, 2)?;
                let id = self.registry.lookup(&args[1])?;
                self.engine_call(EngineOperation::AddFilterToGraph, |e| {
                    e.add_filter_to_graph(id)
                })?;
                self.registry.mark_attached(&args[1])
            }
            CommandKind::SetParams => {
                require_args(cmd, 3)?;
                let id = self.registry.lookup(&args[0])?;
                self.engine_call(EngineOperation::SetParam, |e| {
                    e.set_param(id, &args[1], &args[2])
                })
            }
            CommandKind::GetParams => {
                require_args(cmd, 2)?;
                let id = self.registry.lookup(&args[1])?;
                let params = self.engine_query(EngineOperation::GetParams, |e| e.get_params(id))?;
                tracing::info!(filter = %args[1], %params, "filter parameters");
                Ok(())
            }
            CommandKind::RunGraph => {
                require_args(cmd, 2)?;
                let mode = parse_mode(&args[1])?;
                tracing::debug!(%mode, "captured playback mode");
                self.playback_mode = Some(mode);
                Ok(())
            }
            CommandKind::StopGraph => self.stop(),
            CommandKind::PauseGraph => self.pause(),
            CommandKind::ResumeGraph => self.resume(),
            CommandKind::DeleteFilter => {
                require_args(cmd, 1)?;
                let id = self.registry.lookup(&args[0])?;
                self.engine_call(EngineOperation::DestroyFilter, |e| e.destroy_filter(id))?;
                self.registry.remove(&args[0]);
                Ok(())
            }
            CommandKind::DeleteGraph | CommandKind::CleanAll => self.destroy(),
        }
    }
}
