//! Canonical command types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every command the canonical line format understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    SetMemoryPool,
    SetAgent,
    CreateFilterByName,
    CreateFilterByGuid,
    CreateFilter,
    CreateGraph,
    AttachFilter,
    GetParams,
    SetParams,
    RunGraph,
    StopGraph,
    PauseGraph,
    ResumeGraph,
    DeleteFilter,
    DeleteGraph,
    CleanAll,
}

impl CommandKind {
    pub const ALL: [CommandKind; 16] = [
        Self::SetMemoryPool,
        Self::SetAgent,
        Self::CreateFilterByName,
        Self::CreateFilterByGuid,
        Self::CreateFilter,
        Self::CreateGraph,
        Self::AttachFilter,
        Self::GetParams,
        Self::SetParams,
        Self::RunGraph,
        Self::StopGraph,
        Self::PauseGraph,
        Self::ResumeGraph,
        Self::DeleteFilter,
        Self::DeleteGraph,
        Self::CleanAll,
    ];

    /// Lowercase command name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetMemoryPool => "setmemorypool",
            Self::SetAgent => "setagent",
            Self::CreateFilterByName => "createfilterbyname",
            Self::CreateFilterByGuid => "createfilterbyguid",
            Self::CreateFilter => "createfilter",
            Self::CreateGraph => "creategraph",
            Self::AttachFilter => "attachfilter",
            Self::GetParams => "getparams",
            Self::SetParams => "setparams",
            Self::RunGraph => "rungraph",
            Self::StopGraph => "stopgraph",
            Self::PauseGraph => "pausegraph",
            Self::ResumeGraph => "resumegraph",
            Self::DeleteFilter => "deletefilter",
            Self::DeleteGraph => "deletegraph",
            Self::CleanAll => "cleanall",
        }
    }

    /// Commands that are accepted but have no effect on a session.
    pub fn is_noop(self) -> bool {
        matches!(self, Self::SetMemoryPool | Self::SetAgent)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive lookup by command name.
impl FromStr for CommandKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or(())
    }
}

/// One directive line, split on `~`.
///
/// `args` holds everything after the command name, including the trailing
/// `b` suffix token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCommand {
    pub kind: CommandKind,
    /// Command name as spelled in the source.
    pub name: String,
    pub args: Vec<String>,
    /// 0-based index of the source line.
    pub line: usize,
}

impl CanonicalCommand {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

impl fmt::Display for CanonicalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, "~{arg}")?;
        }
        Ok(())
    }
}

/// Ordered directives of one compiled graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSequence(Vec<CanonicalCommand>);

impl CommandSequence {
    pub fn new(commands: Vec<CanonicalCommand>) -> Self {
        Self(commands)
    }

    pub fn commands(&self) -> &[CanonicalCommand] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalCommand> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of directives of the given kind.
    pub fn count(&self, kind: CommandKind) -> usize {
        self.0.iter().filter(|c| c.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a CommandSequence {
    type Item = &'a CanonicalCommand;
    type IntoIter = std::slice::Iter<'a, CanonicalCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<CanonicalCommand> for CommandSequence {
    fn from_iter<I: IntoIterator<Item = CanonicalCommand>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
