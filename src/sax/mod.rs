//! Builder and validator interfaces
//!
//! The parser reports structure through two collaborators constructed once
//! per parse: a [`Builder`] receiving structural events, and a [`Validator`]
//! receiving element/attribute notifications and owning the DTD bookkeeping
//! (entity declarations, attribute defaults).
//!
//! ## Architecture
//!
//! ```text
//! Parser ---> Builder  (start_element / add_attribute / add_pcdata / ...)
//!    |
//!    +-----> Validator (parse_dtd / attribute_added / defaults injection)
//! ```
//!
//! Builder callbacks may fail; the parser re-wraps such failures as a fatal
//! parse error that preserves the original cause.

pub mod collector;
pub mod events;

pub use collector::EventCollector;
pub use events::XmlEvent;

use crate::core::dtd::{self, AttributeDefaults};
use crate::core::entities::EntityResolver;
use crate::error::Result;
use crate::reader::Reader;

/// Error type produced by builder callbacks.
pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Receives the structural events of one parse.
///
/// `take_result` is polled by the driver after every top-level item; the
/// parse stops as soon as it yields a value, letting a builder short-circuit
/// once the root element closes.
pub trait Builder {
    type Output;

    /// A parse is starting at the given position.
    fn start_building(&mut self, system_id: &str, line_nr: u32) -> std::result::Result<(), BuildError>;

    /// An element opened. `name` is the local name; the prefix and resolved
    /// namespace URI are passed alongside.
    fn start_element(
        &mut self,
        name: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
        system_id: &str,
        line_nr: u32,
    ) -> std::result::Result<(), BuildError>;

    /// An attribute of the currently opening element.
    fn add_attribute(
        &mut self,
        key: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
        value: &str,
        attr_type: &str,
    ) -> std::result::Result<(), BuildError>;

    /// All attributes of the currently opening element have been reported.
    fn element_attributes_processed(
        &mut self,
        name: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
    ) -> std::result::Result<(), BuildError>;

    /// The element closed (or was self-closing).
    fn end_element(
        &mut self,
        name: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
    ) -> std::result::Result<(), BuildError>;

    /// Text content, entities already expanded.
    fn add_pcdata(
        &mut self,
        content: &str,
        system_id: &str,
        line_nr: u32,
    ) -> std::result::Result<(), BuildError>;

    /// A processing instruction other than the XML declaration.
    fn processing_instruction(
        &mut self,
        target: &str,
        data: &str,
    ) -> std::result::Result<(), BuildError>;

    /// The finished result, once available. The driver stops scanning as
    /// soon as this yields a value.
    fn take_result(&mut self) -> Option<Self::Output>;
}

/// Receives element/attribute notifications and owns DTD bookkeeping.
pub trait Validator {
    /// Parse one DTD subset, registering entities into `entities` and
    /// recording attribute defaults for later injection.
    fn parse_dtd(
        &mut self,
        reader: &mut Reader,
        entities: &mut EntityResolver,
        external: bool,
    ) -> Result<()>;

    fn element_started(&mut self, name: &str, system_id: &str, line_nr: u32);

    fn element_ended(&mut self, name: &str, system_id: &str, line_nr: u32);

    fn attribute_added(&mut self, key: &str, value: &str, system_id: &str, line_nr: u32);

    /// All explicit attributes of `name` have been reported. Defaults for
    /// attributes not explicitly present are appended to `extra`.
    fn element_attributes_processed(
        &mut self,
        name: &str,
        extra: &mut Vec<(String, String)>,
        system_id: &str,
        line_nr: u32,
    );
}

/// The standard non-validating implementation: scans DTD subsets for entity
/// declarations and attribute defaults, and performs no content-model
/// checking at all.
pub struct NonValidator {
    parameter_entities: EntityResolver,
    defaults: AttributeDefaults,
}

impl NonValidator {
    pub fn new() -> Self {
        NonValidator {
            parameter_entities: EntityResolver::empty(),
            defaults: AttributeDefaults::new(),
        }
    }
}

impl Default for NonValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for NonValidator {
    fn parse_dtd(
        &mut self,
        reader: &mut Reader,
        entities: &mut EntityResolver,
        external: bool,
    ) -> Result<()> {
        dtd::process_subset(
            reader,
            entities,
            &mut self.parameter_entities,
            &mut self.defaults,
            external,
        )
    }

    fn element_started(&mut self, _name: &str, _system_id: &str, _line_nr: u32) {}

    fn element_ended(&mut self, _name: &str, _system_id: &str, _line_nr: u32) {}

    fn attribute_added(&mut self, _key: &str, _value: &str, _system_id: &str, _line_nr: u32) {}

    fn element_attributes_processed(
        &mut self,
        name: &str,
        extra: &mut Vec<(String, String)>,
        _system_id: &str,
        _line_nr: u32,
    ) {
        for (attr, value) in self.defaults.defaults_for(name) {
            extra.push((attr.clone(), value.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_validator_injects_defaults() {
        let mut v = NonValidator::new();
        let mut reader = Reader::from_str("<!ATTLIST e a CDATA \"v\">]");
        let mut entities = EntityResolver::new();
        v.parse_dtd(&mut reader, &mut entities, false).unwrap();

        let mut extra = Vec::new();
        v.element_attributes_processed("e", &mut extra, "", 1);
        assert_eq!(extra, vec![("a".to_string(), "v".to_string())]);

        extra.clear();
        v.element_attributes_processed("other", &mut extra, "", 1);
        assert!(extra.is_empty());
    }

    #[test]
    fn non_validator_routes_parameter_entities() {
        let mut v = NonValidator::new();
        let mut entities = EntityResolver::new();
        let mut reader = Reader::from_str("<!ENTITY % pe \"<!ENTITY a 'b'>\"> %pe; ]");
        v.parse_dtd(&mut reader, &mut entities, false).unwrap();
        assert!(entities.contains("a"));
        assert!(!entities.contains("pe"));
    }
}
