//! # courier-std
//!
//! Standard implementations built on the Courier dispatch contract.
//!
//! This crate provides:
//! - **Plugins**: logging, validation, retry, throttle, debounce, timeout
//! - **History**: undo/redo tracking of successful commands via an after-dispatch hook
//! - **State**: get/set cells exposing loading / error / value state
//! - **Testing**: recording hooks, counting handlers, marker plugins
//!
//! Everything here is ordinary client code of `courier-core`; nothing in this
//! crate has access the core does not give to any other plugin.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use courier_core;

// Modules
pub mod history;
pub mod plugins;
pub mod state;
pub mod testing;
