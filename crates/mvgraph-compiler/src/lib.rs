//! # mvgraph-compiler
//!
//! Turns pipeline descriptions into ordered graph command sequences.
//!
//! Three source syntaxes are supported:
//! - XML pipeline documents ([`hierarchical`])
//! - JSON filter lists ([`flat`])
//! - Canonical `COMMAND~ARG~...~b` lines with `$NAME$` parameter tokens
//!
//! The converters only produce canonical text; [`compile`] performs
//! substitution and validation and returns the [`CommandSequence`] together
//! with the materialized (substituted) text.
//!
//! ## Example
//!
//! ```
//! use mvgraph_compiler::{compile, CommandKind, ParameterBindings};
//!
//! let text = "SetMemoryPool~1000~b\n\ncreatefilterbyname~Reader~reader_1~b\n\
//!             setParams~reader_1~Path~$INPUT$~b\n";
//! let mut bindings = ParameterBindings::new();
//! bindings.insert("INPUT".to_string(), "/media/in.mvx".to_string());
//!
//! let compiled = compile(text, &bindings).unwrap();
//! assert_eq!(compiled.sequence.len(), 3);
//! assert_eq!(compiled.sequence.commands()[2].kind, CommandKind::SetParams);
//! assert!(compiled.materialized.starts_with("SetMemoryPool~1000~b\n##\n"));
//! ```

mod canonical;
mod command;
mod error;
pub mod flat;
pub mod hierarchical;
pub mod source;
mod writer;

pub use canonical::{compile, referenced_tokens, CompiledGraph, ParameterBindings, PLACEHOLDER, SEPARATOR};
pub use command::{CanonicalCommand, CommandKind, CommandSequence};
pub use error::{Error, Result};
pub use source::{compile_source, load, load_and_materialize, LoadedGraph, SourceFormat};
pub use writer::ConvertOptions;
