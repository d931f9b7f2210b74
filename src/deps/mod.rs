//! Dependency discovery between templates.
//!
//! - [`syntax`]: what a declaration line looks like
//! - [`scanner`]: direct declarers of a page
//! - [`resolver`]: transitive dependents, dependency-first
//! - [`rewrite`]: repoint declarations after a rename

pub mod resolver;
pub mod rewrite;
pub mod scanner;
pub mod syntax;

pub use resolver::{Dependents, transitive_dependents};
pub use rewrite::rewrite_declaration;
pub use scanner::RelationScanner;
