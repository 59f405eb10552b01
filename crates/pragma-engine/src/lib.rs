//! Command-queue storage engine for PragmaDB.
//!
//! Every collection is owned by exactly one [`StorageEngine`]. Callers never
//! touch a collection directly: they build a [`Command`], hand it to the
//! engine with [`StorageEngine::accept`], and observe the outcome through the
//! command's [`Reply`] (or a continuation registered at construction).
//!
//! # Design Rules
//!
//! 1. `accept` never blocks. The intake queue is unbounded.
//! 2. One worker thread per engine drains the queue; it is the only code that
//!    mutates the collection.
//! 3. Each command is processed to completion, reply included, before the next
//!    one is taken.
//! 4. Every accepted command is resolved exactly once, with a value or an
//!    error. A failing command never affects any other command.
//! 5. Engines share nothing, so collections are processed in parallel.
//!
//! The [`EngineRegistry`] maps collection names to engines.

pub mod command;
pub mod engine;
pub mod error;
pub mod registry;
pub mod reply;

pub use command::Command;
pub use engine::StorageEngine;
pub use error::{EngineError, EngineResult};
pub use registry::EngineRegistry;
pub use reply::{Reply, Responder};
