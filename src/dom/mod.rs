//! Tree module
//!
//! The default tree representation and its collaborators:
//! - Element: mutable node with ordered attributes, children, and content
//! - TreeBuilder: assembles a tree from parser events
//! - XmlWriter: re-emits a tree as XML text

pub mod builder;
pub mod node;
pub mod writer;

pub use builder::TreeBuilder;
pub use node::{Attribute, Element};
pub use writer::XmlWriter;
