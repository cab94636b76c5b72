//! mvgraph - media pipeline graph runner
//!
//! Compiles pipeline descriptions with [`mvgraph_compiler`] and drives a
//! graph engine through a [`session::Session`]. The HTTP control surface lives
//! in [`server`]; the library crate is exposed for the binary and for
//! integration testing.

pub mod backend;
pub mod config;
pub mod error;
pub mod server;
pub mod session;

pub use error::{Error, Result};
pub use session::Session;
