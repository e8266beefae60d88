//! # chipdb Common Library
//!
//! Shared code for the chipdb ingestion tool and query service:
//! - Component record model (the closed set of recognized constructs)
//! - Line classifier for one-construct-per-line HDL source
//! - SQLite-backed component store
//! - Report and optimization queries over the store
//! - Store location and configuration resolution

pub mod classifier;
pub mod config;
pub mod error;
pub mod model;
pub mod report;
pub mod store;

pub use classifier::{classify_line, ClassifiedLine, LineClass, LineClassifier, LineTally};
pub use error::{Error, Result};
pub use model::{Component, ComponentId, ComponentKind, NewComponent};
pub use store::{ComponentFilter, ComponentStore};
