//! picoxml - minimal non-validating streaming XML parser
//!
//! A character-stream parser built around a stack of pushback readers:
//! entity expansions, re-injected DTD sections and external files become
//! transparent sub-streams of one logical character sequence. A
//! recursive-descent element parser reports structure to a pluggable
//! [`Builder`]; DTD subsets are scanned non-validatingly for entity
//! declarations and attribute defaults only.
//!
//! ```
//! let root = picoxml::parse_str("<greeting lang=\"en\">hello</greeting>").unwrap();
//! assert_eq!(root.name(), "greeting");
//! assert_eq!(root.attribute("lang"), Some("en"));
//! assert_eq!(root.content(), "hello");
//! ```

pub mod core;
pub mod dom;
pub mod error;
pub mod reader;
pub mod sax;

pub use crate::core::entities::EntityResolver;
pub use crate::core::parser::XmlParser;
pub use crate::dom::{Attribute, Element, TreeBuilder, XmlWriter};
pub use crate::error::{Result, XmlError};
pub use crate::reader::{FileSource, NoSource, Reader, StreamSource};
pub use crate::sax::{Builder, EventCollector, NonValidator, Validator, XmlEvent};

use std::path::Path;

/// Parses a document from a string into an element tree. External
/// references are not resolved.
pub fn parse_str(input: &str) -> Result<Element> {
    XmlParser::new(Reader::from_str(input), TreeBuilder::new()).parse()
}

/// Parses a document from raw bytes, sniffing BOM and declared encoding.
pub fn parse_bytes(input: &[u8]) -> Result<Element> {
    XmlParser::new(Reader::from_bytes(input)?, TreeBuilder::new()).parse()
}

/// Parses a document from a file. Relative external references resolve
/// next to the file.
pub fn parse_file(path: &Path) -> Result<Element> {
    XmlParser::new(Reader::from_file(path)?, TreeBuilder::new()).parse()
}

/// Parses a document from a string into the flat event sequence.
pub fn parse_events(input: &str) -> Result<Vec<XmlEvent>> {
    XmlParser::new(Reader::from_str(input), EventCollector::new()).parse()
}
