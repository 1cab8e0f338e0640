//! Entity tables and resolution
//!
//! Maps entity names to replacement text (internal) or to public/system IDs
//! (external). Resolving a name pushes a new frame onto the reader, so the
//! replacement is consumed transparently by whatever scan is in progress.
//!
//! The five predefined XML entities are seeded with their double-escaped
//! replacement text (`lt` is `&#60;`, not `<`), so an expanded `&lt;` decodes
//! to text instead of opening a tag.

use std::collections::HashMap;

use crate::error::{Result, XmlError};
use crate::reader::Reader;

/// One declared entity.
#[derive(Debug, Clone)]
pub enum Entity {
    /// Replacement text, substituted in place.
    Internal(String),
    /// Reference to another resource, opened through the reader's stream
    /// source when first used.
    External { public_id: String, system_id: String },
}

/// Name → entity table. First declaration wins, matching XML semantics for
/// duplicate entity names.
#[derive(Debug)]
pub struct EntityResolver {
    table: HashMap<String, Entity>,
}

impl EntityResolver {
    /// Resolver pre-seeded with the five built-in document entities.
    pub fn new() -> Self {
        let mut table = HashMap::new();
        table.insert("amp".to_string(), Entity::Internal("&#38;".to_string()));
        table.insert("quot".to_string(), Entity::Internal("&#34;".to_string()));
        table.insert("apos".to_string(), Entity::Internal("&#39;".to_string()));
        table.insert("lt".to_string(), Entity::Internal("&#60;".to_string()));
        table.insert("gt".to_string(), Entity::Internal("&#62;".to_string()));
        EntityResolver { table }
    }

    /// Empty resolver, used for parameter entities.
    pub fn empty() -> Self {
        EntityResolver { table: HashMap::new() }
    }

    /// Registers an internal entity. No-op if the name is already taken.
    pub fn add_internal_entity(&mut self, name: &str, value: &str) {
        self.table
            .entry(name.to_string())
            .or_insert_with(|| Entity::Internal(value.to_string()));
    }

    /// Registers an external entity. No-op if the name is already taken.
    pub fn add_external_entity(&mut self, name: &str, public_id: &str, system_id: &str) {
        self.table.entry(name.to_string()).or_insert_with(|| Entity::External {
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    /// True when the name is registered as an external entity. Decides
    /// whether the pushed stream frame carries a live line counter.
    pub fn is_external(&self, name: &str) -> bool {
        matches!(self.table.get(name), Some(Entity::External { .. }))
    }

    /// True when the name is registered at all.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Pushes the entity's replacement as a new stream on the reader.
    /// Internal entities get an uncounted frame; external entities are
    /// opened through the stream source and get their own line counter.
    pub fn resolve(&self, name: &str, reader: &mut Reader) -> Result<()> {
        match self.table.get(name) {
            Some(Entity::Internal(text)) => {
                let text = text.clone();
                reader.start_new_stream(&text, true)
            }
            Some(Entity::External { public_id, system_id }) => {
                let (public_id, system_id) = (public_id.clone(), system_id.clone());
                reader
                    .open_external(&public_id, &system_id)
                    .map_err(|e| match e {
                        // An unopenable external entity reads as unresolvable.
                        XmlError::Io { system_id, line, .. } => XmlError::UnresolvableEntity {
                            name: name.to_string(),
                            system_id,
                            line,
                        },
                        other => other,
                    })
            }
            None => Err(XmlError::UnresolvableEntity {
                name: name.to_string(),
                system_id: reader.system_id().to_string(),
                line: reader.line_nr(),
            }),
        }
    }
}

impl Default for EntityResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(reader: &mut Reader) -> String {
        let mut out = String::new();
        while !reader.at_eof() {
            out.push(reader.read().unwrap());
        }
        out
    }

    #[test]
    fn builtins_are_preseeded() {
        let r = EntityResolver::new();
        for name in ["amp", "quot", "apos", "lt", "gt"] {
            assert!(r.contains(name), "missing builtin {name}");
            assert!(!r.is_external(name));
        }
    }

    #[test]
    fn builtins_cannot_be_overridden() {
        let mut r = EntityResolver::new();
        r.add_internal_entity("amp", "bogus");
        let mut reader = Reader::from_str("");
        r.resolve("amp", &mut reader).unwrap();
        assert_eq!(drain(&mut reader), "&#38;");
    }

    #[test]
    fn first_declaration_wins() {
        let mut r = EntityResolver::empty();
        r.add_internal_entity("x", "first");
        r.add_internal_entity("x", "second");
        let mut reader = Reader::from_str("");
        r.resolve("x", &mut reader).unwrap();
        assert_eq!(drain(&mut reader), "first");
    }

    #[test]
    fn internal_resolution_pushes_uncounted_frame() {
        let mut r = EntityResolver::empty();
        r.add_internal_entity("x", "a\nb");
        let mut reader = Reader::from_str("\n\nrest");
        reader.read().unwrap();
        reader.read().unwrap();
        r.resolve("x", &mut reader).unwrap();
        reader.read().unwrap();
        reader.read().unwrap(); // the entity's newline
        assert_eq!(reader.line_nr(), 3, "internal entity must not shift lines");
    }

    #[test]
    fn unknown_name_is_unresolvable() {
        let r = EntityResolver::empty();
        let mut reader = Reader::from_str("");
        match r.resolve("nope", &mut reader) {
            Err(XmlError::UnresolvableEntity { name, .. }) => assert_eq!(name, "nope"),
            other => panic!("expected UnresolvableEntity, got {other:?}"),
        }
    }

    #[test]
    fn external_without_source_is_unresolvable() {
        let mut r = EntityResolver::empty();
        r.add_external_entity("ext", "", "missing.xml");
        assert!(r.is_external("ext"));
        let mut reader = Reader::from_str("");
        assert!(matches!(
            r.resolve("ext", &mut reader),
            Err(XmlError::UnresolvableEntity { .. })
        ));
    }

    #[test]
    fn xml_char_ranges() {
        assert!(is_valid_xml_char(0x9));
        assert!(is_valid_xml_char('a' as u32));
        assert!(is_valid_xml_char(0x10FFFF));
        assert!(!is_valid_xml_char(0x0));
        assert!(!is_valid_xml_char(0xFFFE));
        assert!(!is_valid_xml_char(0xD800));
    }
}
