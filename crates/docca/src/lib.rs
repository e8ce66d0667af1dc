//! # Docca
//!
//! API reference generation from Doxygen XML.
//!
//! Docca reads the XML that Doxygen emits for a C++ code base, builds a
//! graph of the documented entities with their converted descriptions, and
//! renders that graph through a Jinja template. The built-in template
//! produces QuickBook reference pages.
//!
//! ## Architecture
//!
//! - **XML**: Parse Doxygen files into an owned element tree
//! - **Entities**: Construct namespaces, classes, functions and the rest
//!   into a [`Corpus`] keyed by Doxygen identifier
//! - **Resolution**: Adopt nested scopes, then convert descriptions and
//!   types once every entity is known
//! - **Templates**: Render the corpus with `minijinja`
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use docca::{collect_compound_refs, environment, render, Config, Corpus, TemplateLoader};
//!
//! # fn main() -> docca::Result<()> {
//! let dir = Path::new("xml");
//! let index = std::fs::read_to_string(dir.join("index.xml")).unwrap();
//! let corpus = Corpus::load(dir, &collect_compound_refs(&index)?)?;
//! let env = environment(&Config::default(), TemplateLoader::default());
//! let output = render(&env, docca::DEFAULT_TEMPLATE, Arc::new(corpus))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod content;
pub mod corpus;
pub mod entity;
pub mod error;
pub mod template;
pub mod xml;

// Re-export main types
pub use config::Config;
pub use content::{Block, Inline, Phrase};
pub use corpus::{collect_compound_refs, Corpus};
pub use entity::{
    Access, Entity, EntityId, EntityKind, FunctionKind, Member, MemberKey, OverloadSet,
    OverloadSetId, VirtualKind,
};
pub use error::{DoccaError, Result};
pub use template::{environment, render, TemplateLoader, DEFAULT_TEMPLATE};

/// Docca version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
