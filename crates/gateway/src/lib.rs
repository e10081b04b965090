//! LeafLyzer gateway: HTTP surface and turn orchestration for the
//! crop-disease diagnosis assistant.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
