//! Recursive-descent element parser
//!
//! The driver reads "next significant character" through the scanner, which
//! may transparently expand an entity by pushing a new stream frame. On `<`
//! it dispatches: processing instruction, comment, DOCTYPE, CDATA, or an
//! element, recursing into itself for nested children. All structural
//! findings are reported to the [`Builder`]; DTD subsets are delegated to
//! the [`Validator`], which later injects attribute defaults back into the
//! attribute loop.
//!
//! Namespace context is an immutable-per-level struct cloned only when an
//! element actually declares namespaces, so siblings can never observe each
//! other's declarations.

use std::collections::HashMap;

use crate::core::entities::EntityResolver;
use crate::core::scanner::{self, Unit};
use crate::error::{Result, XmlError};
use crate::reader::Reader;
use crate::sax::{BuildError, Builder, NonValidator, Validator};

/// The always-bound `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix bindings visible at one point of the element tree. Children get a
/// copy, never a shared reference.
#[derive(Debug, Clone, Default)]
struct Namespaces {
    default_uri: Option<String>,
    prefixes: HashMap<String, String>,
}

impl Namespaces {
    /// URI for an element name: prefixed names resolve through the prefix
    /// map, unprefixed names take the default namespace.
    fn resolve_element(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some(p) => self.resolve_prefix(p),
            None => self.default_uri.as_deref(),
        }
    }

    /// URI for a prefix. Unprefixed attributes never take the default
    /// namespace, so attribute resolution calls this only for a prefix.
    fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.prefixes.get(prefix).map(String::as_str)
    }
}

/// Splits a qualified name at the first `:`.
///
/// `"foo:bar"` → `(Some("foo"), "bar")`
/// `"bar"` → `(None, "bar")`
fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(pos) => (Some(&name[..pos]), &name[pos + 1..]),
        None => (None, name),
    }
}

#[inline]
fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// One parse: a reader, a builder, a validator, and the general entity
/// table. Consumed by [`XmlParser::parse`]; tables are not reused across
/// parses.
pub struct XmlParser<B: Builder, V: Validator = NonValidator> {
    reader: Reader,
    builder: B,
    validator: V,
    entities: EntityResolver,
}

impl<B: Builder> XmlParser<B, NonValidator> {
    pub fn new(reader: Reader, builder: B) -> Self {
        Self::with_validator(reader, builder, NonValidator::new())
    }
}

impl<B: Builder, V: Validator> XmlParser<B, V> {
    pub fn with_validator(reader: Reader, builder: B, validator: V) -> Self {
        XmlParser {
            reader,
            builder,
            validator,
            entities: EntityResolver::new(),
        }
    }

    /// The general entity table, for registering entities up front.
    pub fn entities_mut(&mut self) -> &mut EntityResolver {
        &mut self.entities
    }

    /// Runs the parse to completion and returns the builder's result.
    pub fn parse(mut self) -> Result<B::Output> {
        let system_id = self.reader.system_id().to_string();
        self.builder
            .start_building(&system_id, self.reader.line_nr())
            .map_err(|e| self.wrap(e))?;

        loop {
            if let Some(result) = self.builder.take_result() {
                return Ok(result);
            }
            scanner::skip_whitespace(&mut self.reader, None)?;
            if self.reader.at_eof() {
                break;
            }
            match scanner::read(&mut self.reader, '&')? {
                Unit::Reference(name) => self.entities.resolve(&name, &mut self.reader)?,
                Unit::Char('<') => self.scan_some_tag(false, true, &Namespaces::default())?,
                Unit::Char(ch) if is_whitespace(ch) => {}
                Unit::Char(ch) => {
                    return Err(self.invalid(format!("unexpected '{ch}' outside the root element")))
                }
            }
        }

        match self.builder.take_result() {
            Some(result) => Ok(result),
            None => Err(XmlError::UnexpectedEof {
                system_id,
                line: self.reader.line_nr(),
            }),
        }
    }

    /// Dispatches one tag; the `<` has been consumed.
    fn scan_some_tag(
        &mut self,
        cdata_allowed: bool,
        dtd_allowed: bool,
        ns: &Namespaces,
    ) -> Result<()> {
        let ch = self.reader.read()?;
        match ch {
            '?' => self.process_pi(),
            '!' => {
                let next = self.reader.read()?;
                match next {
                    '-' => {
                        scanner::check_literal(&mut self.reader, "-")?;
                        scanner::skip_comment(&mut self.reader)
                    }
                    'D' => {
                        scanner::check_literal(&mut self.reader, "OCTYPE")?;
                        if !dtd_allowed {
                            return Err(self.invalid("DOCTYPE not allowed here"));
                        }
                        self.process_doctype()
                    }
                    '[' => {
                        scanner::check_literal(&mut self.reader, "CDATA[")?;
                        if !cdata_allowed {
                            return Err(XmlError::UnexpectedCdata {
                                system_id: self.reader.system_id().to_string(),
                                line: self.reader.line_nr(),
                            });
                        }
                        let line = self.reader.line_nr();
                        let system_id = self.reader.system_id().to_string();
                        let text = self.scan_cdata_body()?;
                        self.builder
                            .add_pcdata(&text, &system_id, line)
                            .map_err(|e| self.wrap(e))
                    }
                    _ => Err(self.invalid(format!("unexpected '<!{next}'"))),
                }
            }
            '/' => Err(self.invalid("unexpected closing tag")),
            '&' => {
                self.reader.unread('&');
                match scanner::read(&mut self.reader, '&')? {
                    Unit::Reference(name) => Err(XmlError::UnexpectedEntity {
                        name,
                        system_id: self.reader.system_id().to_string(),
                        line: self.reader.line_nr(),
                    }),
                    Unit::Char(_) => Err(self.invalid("character reference not allowed in a tag name")),
                }
            }
            _ => {
                self.reader.unread(ch);
                self.process_element(ns)
            }
        }
    }

    /// Processing instruction; `<?` has been consumed. A target equal to
    /// `xml` (case-insensitive) is the XML declaration: swallowed, never
    /// forwarded.
    fn process_pi(&mut self) -> Result<()> {
        let target = scanner::scan_identifier(&mut self.reader)?;
        scanner::skip_whitespace(&mut self.reader, None)?;
        let data = self.scan_pi_data()?;
        if target.eq_ignore_ascii_case("xml") {
            return Ok(());
        }
        self.builder
            .processing_instruction(&target, &data)
            .map_err(|e| self.wrap(e))
    }

    /// Bounded scan of PI parameter text, up to `?>`.
    fn scan_pi_data(&mut self) -> Result<String> {
        let mut buf = String::new();
        loop {
            let ch = self.reader.read()?;
            if ch == '?' {
                let next = self.reader.read()?;
                if next == '>' {
                    return Ok(buf);
                }
                self.reader.unread(next);
            }
            buf.push(ch);
        }
    }

    /// DOCTYPE declaration; `<!DOCTYPE` has been consumed. The internal
    /// subset is parsed first, then — if a system ID was given — the
    /// external subset is opened and parsed through the same validator.
    fn process_doctype(&mut self) -> Result<()> {
        scanner::skip_whitespace(&mut self.reader, None)?;
        let _root_name = scanner::scan_identifier(&mut self.reader)?;
        scanner::skip_whitespace(&mut self.reader, None)?;

        let mut public_id = String::new();
        let mut system_id = String::new();
        let mut ch = self.reader.read()?;
        if scanner::is_name_char(ch) {
            self.reader.unread(ch);
            let keyword = scanner::scan_identifier(&mut self.reader)?;
            match keyword.as_str() {
                "PUBLIC" => {
                    scanner::skip_whitespace(&mut self.reader, None)?;
                    public_id = scanner::scan_string(&mut self.reader, '&', None)?;
                    scanner::skip_whitespace(&mut self.reader, None)?;
                    system_id = scanner::scan_string(&mut self.reader, '&', None)?;
                }
                "SYSTEM" => {
                    scanner::skip_whitespace(&mut self.reader, None)?;
                    system_id = scanner::scan_string(&mut self.reader, '&', None)?;
                }
                _ => {
                    return Err(self.invalid(format!(
                        "expected PUBLIC or SYSTEM in DOCTYPE, found '{keyword}'"
                    )))
                }
            }
            scanner::skip_whitespace(&mut self.reader, None)?;
            ch = self.reader.read()?;
        }

        if ch == '[' {
            self.validator
                .parse_dtd(&mut self.reader, &mut self.entities, false)?;
            scanner::skip_whitespace(&mut self.reader, None)?;
            ch = self.reader.read()?;
        }
        if ch != '>' {
            return Err(self.invalid(format!("expected '>' to close DOCTYPE, found '{ch}'")));
        }

        if !system_id.is_empty() {
            self.reader.open_external(&public_id, &system_id)?;
            self.validator
                .parse_dtd(&mut self.reader, &mut self.entities, true)?;
        }
        Ok(())
    }

    /// One element: open tag, attributes, defaults, namespaces, content,
    /// close tag. Recurses for nested children.
    fn process_element(&mut self, parent_ns: &Namespaces) -> Result<()> {
        let line = self.reader.line_nr();
        let system_id = self.reader.system_id().to_string();
        let full_name = scanner::scan_identifier(&mut self.reader)?;
        self.validator.element_started(&full_name, &system_id, line);

        // Raw attributes, in document order, before namespace resolution.
        let mut attrs: Vec<(String, String)> = Vec::new();
        let self_closing = loop {
            scanner::skip_whitespace(&mut self.reader, None)?;
            let ch = self.reader.read()?;
            match ch {
                '/' => {
                    let next = self.reader.read()?;
                    if next != '>' {
                        return Err(self.invalid(format!("expected '>' after '/', found '{next}'")));
                    }
                    break true;
                }
                '>' => break false,
                '&' => {
                    self.reader.unread('&');
                    match scanner::read(&mut self.reader, '&')? {
                        Unit::Reference(name) => {
                            return Err(XmlError::UnexpectedEntity {
                                name,
                                system_id: self.reader.system_id().to_string(),
                                line: self.reader.line_nr(),
                            })
                        }
                        Unit::Char(_) => {
                            return Err(self.invalid("character reference not allowed in a tag"))
                        }
                    }
                }
                _ => {
                    self.reader.unread(ch);
                    let key = scanner::scan_identifier(&mut self.reader)?;
                    scanner::skip_whitespace(&mut self.reader, None)?;
                    let eq = self.reader.read()?;
                    if eq != '=' {
                        return Err(
                            self.invalid(format!("expected '=' after attribute '{key}'"))
                        );
                    }
                    scanner::skip_whitespace(&mut self.reader, None)?;
                    let value = scanner::scan_string(&mut self.reader, '&', Some(&self.entities))?;
                    if attrs.iter().any(|(k, _)| k == &key) {
                        return Err(XmlError::DuplicateAttribute {
                            name: key,
                            system_id: self.reader.system_id().to_string(),
                            line: self.reader.line_nr(),
                        });
                    }
                    self.validator
                        .attribute_added(&key, &value, &system_id, self.reader.line_nr());
                    attrs.push((key, value));
                }
            }
        };

        // ATTLIST defaults for names not explicitly present. An explicit
        // attribute silently shadows its default.
        let mut extra: Vec<(String, String)> = Vec::new();
        self.validator
            .element_attributes_processed(&full_name, &mut extra, &system_id, line);
        for (key, value) in extra {
            if !attrs.iter().any(|(k, _)| k == &key) {
                attrs.push((key, value));
            }
        }

        // xmlns declarations update the context before anything resolves.
        let declares = attrs
            .iter()
            .any(|(k, _)| k == "xmlns" || k.starts_with("xmlns:"));
        let owned_ns = if declares {
            let mut ns = parent_ns.clone();
            for (key, value) in &attrs {
                if key == "xmlns" {
                    ns.default_uri = if value.is_empty() {
                        None
                    } else {
                        Some(value.clone())
                    };
                } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                    ns.prefixes.insert(prefix.to_string(), value.clone());
                }
            }
            Some(ns)
        } else {
            None
        };
        let ns = owned_ns.as_ref().unwrap_or(parent_ns);

        let (prefix, local) = split_name(&full_name);
        let uri = ns.resolve_element(prefix);

        self.builder
            .start_element(local, prefix, uri, &system_id, line)
            .map_err(|e| self.wrap(e))?;
        for (key, value) in &attrs {
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let (attr_prefix, attr_local) = split_name(key);
            let attr_uri = attr_prefix.and_then(|p| ns.resolve_prefix(p));
            self.builder
                .add_attribute(attr_local, attr_prefix, attr_uri, value, "CDATA")
                .map_err(|e| self.wrap(e))?;
        }
        self.builder
            .element_attributes_processed(local, prefix, uri)
            .map_err(|e| self.wrap(e))?;

        if self_closing {
            self.builder
                .end_element(local, prefix, uri)
                .map_err(|e| self.wrap(e))?;
            self.validator
                .element_ended(&full_name, &system_id, self.reader.line_nr());
            return Ok(());
        }

        // Content loop. Leading whitespace is buffered: it belongs to the
        // PCDATA that may follow, and is dropped before markup.
        loop {
            let mut leading = String::new();
            scanner::skip_whitespace(&mut self.reader, Some(&mut leading))?;
            let ch = self.reader.read()?;
            if ch == '<' {
                let next = self.reader.read()?;
                if next == '/' {
                    let close_line = self.reader.line_nr();
                    let found = scanner::scan_identifier(&mut self.reader)?;
                    if found != full_name {
                        return Err(XmlError::MismatchedTag {
                            expected: full_name.clone(),
                            found,
                            system_id: self.reader.system_id().to_string(),
                            line: close_line,
                        });
                    }
                    scanner::skip_whitespace(&mut self.reader, None)?;
                    let gt = self.reader.read()?;
                    if gt != '>' {
                        return Err(self.invalid(format!("expected '>' to close tag, found '{gt}'")));
                    }
                    break;
                }
                self.reader.unread(next);
                self.scan_some_tag(true, false, ns)?;
            } else {
                self.reader.unread(ch);
                let pcdata_line = self.reader.line_nr();
                let text = self.scan_pcdata(leading)?;
                self.builder
                    .add_pcdata(&text, &system_id, pcdata_line)
                    .map_err(|e| self.wrap(e))?;
            }
        }

        self.builder
            .end_element(local, prefix, uri)
            .map_err(|e| self.wrap(e))?;
        self.validator
            .element_ended(&full_name, &system_id, self.reader.line_nr());
        Ok(())
    }

    /// Bounded PCDATA scan: expands entities, decodes character references,
    /// and stops exactly at the next raw `<` (pushed back for the caller).
    /// A `<` arriving as a decoded character reference is text.
    fn scan_pcdata(&mut self, mut buf: String) -> Result<String> {
        loop {
            let ch = self.reader.read()?;
            match ch {
                '<' => {
                    self.reader.unread('<');
                    return Ok(buf);
                }
                '&' => {
                    self.reader.unread('&');
                    match scanner::read(&mut self.reader, '&')? {
                        Unit::Char(decoded) => buf.push(decoded),
                        Unit::Reference(name) => self.entities.resolve(&name, &mut self.reader)?,
                    }
                }
                _ => buf.push(ch),
            }
        }
    }

    /// CDATA body scan; `<![CDATA[` has been consumed. Only an exact `]]>`
    /// terminates; `]]` followed by anything else is content.
    fn scan_cdata_body(&mut self) -> Result<String> {
        let mut buf = String::new();
        loop {
            let ch = self.reader.read()?;
            if ch != ']' {
                buf.push(ch);
                continue;
            }
            let c2 = self.reader.read()?;
            if c2 != ']' {
                buf.push(']');
                self.reader.unread(c2);
                continue;
            }
            // A run of ']' may hide the terminator at its tail.
            let mut c3 = self.reader.read()?;
            while c3 == ']' {
                buf.push(']');
                c3 = self.reader.read()?;
            }
            if c3 == '>' {
                return Ok(buf);
            }
            buf.push_str("]]");
            buf.push(c3);
        }
    }

    fn invalid(&self, detail: impl Into<String>) -> XmlError {
        XmlError::InvalidInput {
            detail: detail.into(),
            system_id: self.reader.system_id().to_string(),
            line: self.reader.line_nr(),
        }
    }

    fn wrap(&self, source: BuildError) -> XmlError {
        XmlError::Builder {
            source,
            system_id: self.reader.system_id().to_string(),
            line: self.reader.line_nr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sax::{EventCollector, XmlEvent};

    fn parse(input: &str) -> Result<Vec<XmlEvent>> {
        XmlParser::new(Reader::from_str(input), EventCollector::new()).parse()
    }

    fn pcdata_of(events: &[XmlEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                XmlEvent::PcData { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn minimal_document() {
        let events = parse("<root/>").unwrap();
        assert_eq!(events[0].element_name(), Some("root"));
        assert!(events.last().unwrap().is_end_element());
    }

    #[test]
    fn nested_elements_in_order() {
        let events = parse("<a><b><c/></b></a>").unwrap();
        let names: Vec<_> = events
            .iter()
            .filter(|e| e.is_start_element())
            .map(|e| e.element_name().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn attributes_reported_in_order() {
        let events = parse("<e one=\"1\" two='2'/>").unwrap();
        let attrs: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                XmlEvent::Attribute { name, value, .. } => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            attrs,
            [("one".to_string(), "1".to_string()), ("two".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn pcdata_with_builtin_entities() {
        let events = parse("<r>&lt;&amp;&gt;</r>").unwrap();
        assert_eq!(pcdata_of(&events), "<&>");
    }

    #[test]
    fn declared_entity_round_trip() {
        let events = parse("<!DOCTYPE r [<!ENTITY x \"hello\">]><r>&x;</r>").unwrap();
        assert_eq!(pcdata_of(&events), "hello");
    }

    #[test]
    fn entity_expanding_to_markup() {
        let events = parse("<!DOCTYPE r [<!ENTITY e \"<b>bold</b>\">]><r>&e;</r>").unwrap();
        let names: Vec<_> = events
            .iter()
            .filter(|e| e.is_start_element())
            .map(|e| e.element_name().unwrap().to_string())
            .collect();
        assert_eq!(names, ["r", "b"]);
        assert_eq!(pcdata_of(&events), "bold");
    }

    #[test]
    fn unresolvable_entity() {
        assert!(matches!(
            parse("<r>&nope;</r>"),
            Err(XmlError::UnresolvableEntity { name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn self_referential_entity_terminates() {
        let result = parse("<!DOCTYPE r [<!ENTITY x \"&x;\">]><r>&x;</r>");
        assert!(result.is_err());
    }

    #[test]
    fn char_references_decode() {
        let events = parse("<r>&#65;&#x42;</r>").unwrap();
        assert_eq!(pcdata_of(&events), "AB");
    }

    #[test]
    fn decoded_lt_is_text_not_markup() {
        let events = parse("<r>a&#60;b</r>").unwrap();
        assert_eq!(pcdata_of(&events), "a<b");
    }

    #[test]
    fn cdata_section_is_pcdata() {
        let events = parse("<r><![CDATA[<not-a-tag> & friends]]></r>").unwrap();
        assert_eq!(pcdata_of(&events), "<not-a-tag> & friends");
    }

    #[test]
    fn cdata_double_bracket_not_terminator() {
        let events = parse("<r><![CDATA[a]]x]]]>b</r>").unwrap();
        // "]]x" stays, "]]]>" closes with one bracket of content.
        assert_eq!(pcdata_of(&events), "a]]x]b");
    }

    #[test]
    fn cdata_at_top_level_rejected() {
        assert!(matches!(
            parse("<![CDATA[x]]><r/>"),
            Err(XmlError::UnexpectedCdata { .. })
        ));
    }

    #[test]
    fn mismatched_close_tag() {
        match parse("<a>\n<b>\n</a>") {
            Err(XmlError::MismatchedTag { expected, found, line, .. }) => {
                assert_eq!(expected, "b");
                assert_eq!(found, "a");
                assert_eq!(line, 3);
            }
            other => panic!("expected MismatchedTag, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_attribute_rejected() {
        assert!(matches!(
            parse("<e a=\"1\" a=\"2\"/>"),
            Err(XmlError::DuplicateAttribute { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn stray_character_before_root() {
        assert!(matches!(
            parse("junk <r/>"),
            Err(XmlError::InvalidInput { .. })
        ));
    }

    #[test]
    fn entity_in_tag_position_rejected() {
        assert!(matches!(
            parse("<&e;/>"),
            Err(XmlError::UnexpectedEntity { name, .. }) if name == "e"
        ));
    }

    #[test]
    fn unclosed_element_is_eof() {
        assert!(matches!(
            parse("<r><child>"),
            Err(XmlError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn empty_input_is_eof() {
        assert!(matches!(parse("   "), Err(XmlError::UnexpectedEof { .. })));
    }

    #[test]
    fn xml_declaration_swallowed() {
        let events = parse("<?xml version=\"1.0\"?><r/>").unwrap();
        assert!(events[0].is_start_element());
    }

    #[test]
    fn processing_instruction_forwarded() {
        let events = parse("<?xml-stylesheet href=\"a.css\"?><r/>").unwrap();
        match &events[0] {
            XmlEvent::ProcessingInstruction { target, data } => {
                assert_eq!(target, "xml-stylesheet");
                assert_eq!(data, "href=\"a.css\"");
            }
            other => panic!("expected PI, got {other:?}"),
        }
    }

    #[test]
    fn comments_are_skipped() {
        let events = parse("<!-- before --><r><!-- inside --></r>").unwrap();
        assert_eq!(events.len(), 3); // start, attributes-end, end
    }

    #[test]
    fn attribute_default_injected() {
        let events = parse("<!DOCTYPE e [<!ATTLIST e a CDATA \"v\">]><e/>").unwrap();
        let attr = events.iter().find_map(|e| match e {
            XmlEvent::Attribute { name, value, .. } => Some((name.clone(), value.clone())),
            _ => None,
        });
        assert_eq!(attr, Some(("a".to_string(), "v".to_string())));
    }

    #[test]
    fn explicit_attribute_shadows_default() {
        let events = parse("<!DOCTYPE e [<!ATTLIST e a CDATA \"v\">]><e a=\"w\"/>").unwrap();
        let attrs: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                XmlEvent::Attribute { value, .. } => Some(value.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(attrs, ["w"]);
    }

    #[test]
    fn entity_in_attribute_value() {
        let events =
            parse("<!DOCTYPE e [<!ENTITY who \"world\">]><e greeting=\"hello &who;\"/>").unwrap();
        let attr = events.iter().find_map(|e| match e {
            XmlEvent::Attribute { value, .. } => Some(value.clone()),
            _ => None,
        });
        assert_eq!(attr, Some("hello world".to_string()));
    }

    #[test]
    fn default_namespace_inherited() {
        let events = parse("<a xmlns=\"urn:x\"><b/></a>").unwrap();
        let namespaces: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                XmlEvent::StartElement { name, namespace, .. } => {
                    Some((name.clone(), namespace.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            namespaces,
            [
                ("a".to_string(), Some("urn:x".to_string())),
                ("b".to_string(), Some("urn:x".to_string())),
            ]
        );
    }

    #[test]
    fn sibling_namespace_does_not_leak() {
        let events = parse("<a><b xmlns=\"urn:b\"/><c/></a>").unwrap();
        let c_ns = events.iter().find_map(|e| match e {
            XmlEvent::StartElement { name, namespace, .. } if name == "c" => {
                Some(namespace.clone())
            }
            _ => None,
        });
        assert_eq!(c_ns, Some(None));
    }

    #[test]
    fn prefixed_names_resolve() {
        let events = parse("<p:a xmlns:p=\"urn:p\" p:attr=\"1\"/>").unwrap();
        match &events[0] {
            XmlEvent::StartElement { name, prefix, namespace, .. } => {
                assert_eq!(name, "a");
                assert_eq!(prefix.as_deref(), Some("p"));
                assert_eq!(namespace.as_deref(), Some("urn:p"));
            }
            other => panic!("expected start element, got {other:?}"),
        }
        match &events[1] {
            XmlEvent::Attribute { name, prefix, namespace, .. } => {
                assert_eq!(name, "attr");
                assert_eq!(prefix.as_deref(), Some("p"));
                assert_eq!(namespace.as_deref(), Some("urn:p"));
            }
            other => panic!("expected attribute, got {other:?}"),
        }
    }

    #[test]
    fn xmlns_not_forwarded_as_attribute() {
        let events = parse("<a xmlns=\"urn:x\" xmlns:p=\"urn:p\"/>").unwrap();
        assert!(!events
            .iter()
            .any(|e| matches!(e, XmlEvent::Attribute { .. })));
    }

    #[test]
    fn unprefixed_attribute_has_no_namespace() {
        let events = parse("<a xmlns=\"urn:x\" attr=\"1\"/>").unwrap();
        match events.iter().find(|e| matches!(e, XmlEvent::Attribute { .. })) {
            Some(XmlEvent::Attribute { namespace, .. }) => assert_eq!(namespace, &None),
            other => panic!("expected attribute, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_between_children_dropped() {
        let events = parse("<a>\n  <b/>\n  <c/>\n</a>").unwrap();
        assert!(!events.iter().any(|e| e.is_pcdata()));
    }

    #[test]
    fn leading_whitespace_kept_in_mixed_content() {
        let events = parse("<a>  text</a>").unwrap();
        assert_eq!(pcdata_of(&events), "  text");
    }

    #[test]
    fn close_tag_whitespace_tolerated() {
        let events = parse("<a></a  >").unwrap();
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn doctype_in_content_rejected() {
        assert!(matches!(
            parse("<a><!DOCTYPE a []></a>"),
            Err(XmlError::InvalidInput { .. })
        ));
    }

    #[test]
    fn builder_failure_is_wrapped() {
        struct FailingBuilder;
        impl Builder for FailingBuilder {
            type Output = ();
            fn start_building(&mut self, _: &str, _: u32) -> std::result::Result<(), BuildError> {
                Ok(())
            }
            fn start_element(
                &mut self,
                _: &str,
                _: Option<&str>,
                _: Option<&str>,
                _: &str,
                _: u32,
            ) -> std::result::Result<(), BuildError> {
                Err("element refused".into())
            }
            fn add_attribute(
                &mut self,
                _: &str,
                _: Option<&str>,
                _: Option<&str>,
                _: &str,
                _: &str,
            ) -> std::result::Result<(), BuildError> {
                Ok(())
            }
            fn element_attributes_processed(
                &mut self,
                _: &str,
                _: Option<&str>,
                _: Option<&str>,
            ) -> std::result::Result<(), BuildError> {
                Ok(())
            }
            fn end_element(
                &mut self,
                _: &str,
                _: Option<&str>,
                _: Option<&str>,
            ) -> std::result::Result<(), BuildError> {
                Ok(())
            }
            fn add_pcdata(&mut self, _: &str, _: &str, _: u32) -> std::result::Result<(), BuildError> {
                Ok(())
            }
            fn processing_instruction(
                &mut self,
                _: &str,
                _: &str,
            ) -> std::result::Result<(), BuildError> {
                Ok(())
            }
            fn take_result(&mut self) -> Option<()> {
                None
            }
        }

        let err = XmlParser::new(Reader::from_str("<r/>"), FailingBuilder)
            .parse()
            .unwrap_err();
        match err {
            XmlError::Builder { source, .. } => {
                assert_eq!(source.to_string(), "element refused")
            }
            other => panic!("expected Builder error, got {other:?}"),
        }
    }

    #[test]
    fn preregistered_entity_is_used() {
        let mut parser = XmlParser::new(Reader::from_str("<r>&app;</r>"), EventCollector::new());
        parser.entities_mut().add_internal_entity("app", "picoxml");
        let events = parser.parse().unwrap();
        assert_eq!(pcdata_of(&events), "picoxml");
    }
}
