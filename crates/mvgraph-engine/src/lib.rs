//! # mvgraph-engine
//!
//! The boundary between mvgraph and the stateful native graph engine.
//!
//! This crate provides:
//! - [`GraphEngine`], the adapter trait mirroring the engine's operation set
//! - The lifecycle, playback and filter identity types shared by every adapter
//! - [`SimulatedEngine`], an in-memory engine with a call journal and fault injection
//! - `NativeEngine`, FFI bindings to the engine library (`native-engine` feature)
//!
//! ## Features
//!
//! - `native-engine` - Link the native engine library and expose `NativeEngine`
//!
//! ## Example
//!
//! ```
//! use mvgraph_engine::{EngineOperation, GraphEngine, GraphState, SimulatedEngine};
//!
//! let mut engine = SimulatedEngine::new();
//! let journal = engine.handle();
//!
//! engine.create_graph().unwrap();
//! let id = engine.create_filter_by_name("Camera").unwrap();
//! engine.add_filter_to_graph(id).unwrap();
//! engine.build_graph().unwrap();
//!
//! assert_eq!(engine.state().unwrap(), GraphState::Stopped);
//! assert_eq!(journal.count(EngineOperation::CreateFilterByName), 1);
//! ```

mod engine;
mod error;
#[cfg(feature = "native-engine")]
pub mod native;
pub mod simulated;
mod types;

pub use engine::{CallFailed, CallResult, EngineOperation, GraphEngine};
pub use error::{Error, Result};
#[cfg(feature = "native-engine")]
pub use native::NativeEngine;
pub use simulated::{EngineCall, HeldCall, SimulatedEngine, SimulatedHandle};
pub use types::{FilterId, GraphState, PlaybackMode};
