// src/copy/mod.rs

//! Source selection, change detection and copying.
//!
//! - [`selection`] compiles a task's source globs and lists matching files.
//! - [`changed`] decides whether a source file needs to be re-processed.
//! - [`copier`] copies selected files into the destination tree.

pub mod changed;
pub mod copier;
pub mod selection;

pub use changed::{is_stale, ChangeRecord};
pub use copier::Copier;
pub use selection::{SourceFile, SourceSelection};
