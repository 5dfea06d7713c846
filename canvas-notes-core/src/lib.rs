#![doc = "canvas-notes-core: core logic library for canvas-notes."]

//! This crate contains the synchronisation core: course rule parsing, paging
//! through the Canvas assignments API, reconciling remote assignments with
//! local notes, and rendering notes.
//!
//! Network, file system and persistence are reached only through the traits
//! in [`contract`]; the CLI crate provides the real implementations.

pub mod assignment;
pub mod cache;
pub mod contract;
pub mod course;
pub mod error;
pub mod html;
#[cfg(any(test, feature = "test-export-mocks"))]
pub mod memory;
pub mod pagination;
pub mod path;
pub mod render;
pub mod settings;
pub mod synchronise;
