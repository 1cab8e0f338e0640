//! DTD subset processing
//!
//! Non-validating scan of the internal and external DTD subsets. Only two
//! kinds of declarations leave a trace: `ENTITY` (general and parameter,
//! routed to the matching resolver) and `ATTLIST` defaults with a literal or
//! `#FIXED` literal value. Everything else — `ELEMENT`, `NOTATION`, and any
//! declaration this parser does not understand — is skipped as an opaque tag
//! with balanced `<`/`>` counting.
//!
//! Conditional sections are handled the way the subset stream model wants:
//! `IGNORE` is discarded verbatim up to its matching `]]>`, while `INCLUDE`
//! captures the bracketed text and re-injects it as a new stream so its
//! declarations are processed by the same loop.

use std::collections::HashMap;

use crate::core::entities::EntityResolver;
use crate::core::scanner::{self, Unit};
use crate::error::Result;
use crate::reader::Reader;

/// Attribute defaults captured from `ATTLIST` declarations, per element
/// name, in declaration order. First declaration wins for a repeated
/// attribute name.
#[derive(Debug, Default)]
pub struct AttributeDefaults {
    table: HashMap<String, Vec<(String, String)>>,
}

impl AttributeDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a default value for `element`'s attribute `name`.
    pub fn record(&mut self, element: &str, name: &str, value: &str) {
        let entries = self.table.entry(element.to_string()).or_default();
        if entries.iter().any(|(n, _)| n == name) {
            return;
        }
        entries.push((name.to_string(), value.to_string()));
    }

    /// Defaults declared for `element`, in declaration order.
    pub fn defaults_for(&self, element: &str) -> &[(String, String)] {
        self.table.get(element).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Scans one DTD subset. For the internal subset (`external = false`) the
/// scan ends at the first unbalanced `]`; for an external subset it ends
/// when the reads fall back out of the stream the subset was pushed on.
pub fn process_subset(
    reader: &mut Reader,
    general: &mut EntityResolver,
    parameter: &mut EntityResolver,
    defaults: &mut AttributeDefaults,
    external: bool,
) -> Result<()> {
    let start_level = reader.stream_level();
    log::debug!(
        "scanning {} DTD subset at level {start_level}",
        if external { "external" } else { "internal" }
    );
    loop {
        if external && (reader.at_eof() || reader.stream_level() < start_level) {
            return Ok(());
        }
        match scanner::read(reader, '%')? {
            Unit::Reference(name) => parameter.resolve(&name, reader)?,
            Unit::Char(ch) if is_whitespace(ch) => {}
            Unit::Char('<') => process_markup(reader, general, parameter, defaults)?,
            Unit::Char(']') if !external => return Ok(()),
            Unit::Char(ch) => {
                return Err(scanner::invalid(
                    reader,
                    format!("unexpected '{ch}' in DTD subset"),
                ))
            }
        }
    }
}

/// Dispatches one markup item of the subset. The `<` has been consumed.
fn process_markup(
    reader: &mut Reader,
    general: &mut EntityResolver,
    parameter: &mut EntityResolver,
    defaults: &mut AttributeDefaults,
) -> Result<()> {
    let ch = reader.read()?;
    match ch {
        '!' => {
            let next = reader.read()?;
            match next {
                '-' => {
                    scanner::check_literal(reader, "-")?;
                    scanner::skip_comment(reader)
                }
                '[' => process_conditional(reader, parameter),
                _ => {
                    reader.unread(next);
                    let keyword = scanner::scan_identifier(reader)?;
                    match keyword.as_str() {
                        "ENTITY" => process_entity_decl(reader, general, parameter),
                        "ATTLIST" => process_attlist(reader, parameter, defaults),
                        _ => {
                            log::debug!("ignoring DTD declaration <!{keyword}");
                            skip_opaque(reader)
                        }
                    }
                }
            }
        }
        '?' => skip_pi(reader),
        _ => {
            reader.unread(ch);
            skip_opaque(reader)
        }
    }
}

/// Conditional section: `<![` has been consumed. `INCLUDE` re-injects the
/// bracketed text as a new stream; `IGNORE` discards it.
fn process_conditional(reader: &mut Reader, parameter: &EntityResolver) -> Result<()> {
    skip_subset_whitespace(reader, parameter)?;
    let keyword = scanner::scan_identifier(reader)?;
    skip_subset_whitespace(reader, parameter)?;
    let ch = reader.read()?;
    if ch != '[' {
        return Err(scanner::invalid(
            reader,
            format!("expected '[' after {keyword}, found '{ch}'"),
        ));
    }
    match keyword.as_str() {
        "INCLUDE" => {
            let text = scan_conditional_body(reader, true)?;
            reader.start_new_stream(&text, false)
        }
        "IGNORE" => {
            scan_conditional_body(reader, false)?;
            Ok(())
        }
        _ => Err(scanner::invalid(
            reader,
            format!("expected INCLUDE or IGNORE, found '{keyword}'"),
        )),
    }
}

/// Consumes up to the matching `]]>`, counting nested `<![` sections.
/// Returns the consumed text when `capture` is set.
fn scan_conditional_body(reader: &mut Reader, capture: bool) -> Result<String> {
    let mut buf = String::new();
    let mut depth = 1u32;
    loop {
        let ch = reader.read()?;
        match ch {
            '<' => {
                let c2 = reader.read()?;
                if c2 == '!' {
                    let c3 = reader.read()?;
                    if c3 == '[' {
                        depth += 1;
                        if capture {
                            buf.push_str("<![");
                        }
                    } else {
                        reader.unread(c3);
                        if capture {
                            buf.push_str("<!");
                        }
                    }
                } else {
                    reader.unread(c2);
                    if capture {
                        buf.push('<');
                    }
                }
            }
            ']' => {
                let c2 = reader.read()?;
                if c2 != ']' {
                    reader.unread(c2);
                    if capture {
                        buf.push(']');
                    }
                    continue;
                }
                // A run of ']' may hide the real terminator at its tail.
                let mut c3 = reader.read()?;
                while c3 == ']' {
                    if capture {
                        buf.push(']');
                    }
                    c3 = reader.read()?;
                }
                if c3 == '>' {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(buf);
                    }
                    if capture {
                        buf.push_str("]]>");
                    }
                } else {
                    if capture {
                        buf.push_str("]]");
                        buf.push(c3);
                    }
                }
            }
            _ => {
                if capture {
                    buf.push(ch);
                }
            }
        }
    }
}

/// `<!ENTITY` declaration; the keyword has been consumed. A leading `%`
/// marks a parameter entity routed to the parameter resolver.
fn process_entity_decl(
    reader: &mut Reader,
    general: &mut EntityResolver,
    parameter: &mut EntityResolver,
) -> Result<()> {
    scanner::skip_whitespace(reader, None)?;
    let ch = reader.read()?;
    let is_parameter = ch == '%';
    if is_parameter {
        scanner::skip_whitespace(reader, None)?;
    } else {
        reader.unread(ch);
    }
    let name = scanner::scan_identifier(reader)?;
    scanner::skip_whitespace(reader, None)?;

    let ch = reader.read()?;
    reader.unread(ch);
    if ch == '"' || ch == '\'' {
        // Literal value; parameter references expand at declaration time.
        let value = scanner::scan_string(reader, '%', Some(parameter))?;
        let target = if is_parameter { parameter } else { general };
        target.add_internal_entity(&name, &value);
    } else {
        let keyword = scanner::scan_identifier(reader)?;
        let (public_id, system_id) = match keyword.as_str() {
            "PUBLIC" => {
                scanner::skip_whitespace(reader, None)?;
                let public_id = scanner::scan_string(reader, '%', None)?;
                scanner::skip_whitespace(reader, None)?;
                let system_id = scanner::scan_string(reader, '%', None)?;
                (public_id, system_id)
            }
            "SYSTEM" => {
                scanner::skip_whitespace(reader, None)?;
                let system_id = scanner::scan_string(reader, '%', None)?;
                (String::new(), system_id)
            }
            _ => {
                return Err(scanner::invalid(
                    reader,
                    format!("expected PUBLIC, SYSTEM or a literal value, found '{keyword}'"),
                ))
            }
        };
        let target = if is_parameter { parameter } else { general };
        target.add_external_entity(&name, &public_id, &system_id);
    }

    // Consume the declaration tail, tolerating NDATA clauses.
    loop {
        let ch = reader.read()?;
        if ch == '>' {
            return Ok(());
        }
    }
}

/// `<!ATTLIST` declaration; the keyword has been consumed. Only literal and
/// `#FIXED` literal defaults are recorded; `#REQUIRED` and `#IMPLIED` are
/// parsed and discarded.
fn process_attlist(
    reader: &mut Reader,
    parameter: &EntityResolver,
    defaults: &mut AttributeDefaults,
) -> Result<()> {
    skip_subset_whitespace(reader, parameter)?;
    let element = scanner::scan_identifier(reader)?;
    loop {
        skip_subset_whitespace(reader, parameter)?;
        let ch = reader.read()?;
        if ch == '>' {
            return Ok(());
        }
        reader.unread(ch);

        let attr = scanner::scan_identifier(reader)?;
        skip_subset_whitespace(reader, parameter)?;

        // Type: either an enumeration group or a keyword (NOTATION carries
        // its own group after the keyword).
        let ch = reader.read()?;
        if ch == '(' {
            skip_group(reader)?;
        } else {
            reader.unread(ch);
            scanner::scan_identifier(reader)?;
            skip_subset_whitespace(reader, parameter)?;
            let ch = reader.read()?;
            if ch == '(' {
                skip_group(reader)?;
            } else {
                reader.unread(ch);
            }
        }
        skip_subset_whitespace(reader, parameter)?;

        let ch = reader.read()?;
        if ch == '#' {
            let keyword = scanner::scan_identifier(reader)?;
            match keyword.as_str() {
                "REQUIRED" | "IMPLIED" => {}
                "FIXED" => {
                    scanner::skip_whitespace(reader, None)?;
                    let value = scanner::scan_string(reader, '%', Some(parameter))?;
                    defaults.record(&element, &attr, &value);
                }
                _ => {
                    return Err(scanner::invalid(
                        reader,
                        format!("unknown attribute default '#{keyword}'"),
                    ))
                }
            }
        } else if ch == '"' || ch == '\'' {
            reader.unread(ch);
            let value = scanner::scan_string(reader, '%', Some(parameter))?;
            defaults.record(&element, &attr, &value);
        } else {
            return Err(scanner::invalid(
                reader,
                format!("expected an attribute default, found '{ch}'"),
            ));
        }
    }
}

/// Consumes the rest of an enumeration/notation group up to `)`.
fn skip_group(reader: &mut Reader) -> Result<()> {
    loop {
        let ch = reader.read()?;
        if ch == ')' {
            return Ok(());
        }
    }
}

/// Skips a declaration this parser does not understand, counting balanced
/// `<`/`>` pairs. The opening `<` has already been consumed.
fn skip_opaque(reader: &mut Reader) -> Result<()> {
    let mut depth = 1u32;
    loop {
        match reader.read()? {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}

/// Skips a processing instruction inside the subset, up to `?>`.
fn skip_pi(reader: &mut Reader) -> Result<()> {
    loop {
        let ch = reader.read()?;
        if ch == '?' {
            let next = reader.read()?;
            if next == '>' {
                return Ok(());
            }
            reader.unread(next);
        }
    }
}

/// Whitespace skip that also expands parameter-entity references found
/// between declarations and keywords.
fn skip_subset_whitespace(reader: &mut Reader, parameter: &EntityResolver) -> Result<()> {
    loop {
        if reader.at_eof() {
            return Ok(());
        }
        match scanner::read(reader, '%')? {
            Unit::Reference(name) => parameter.resolve(&name, reader)?,
            Unit::Char(ch) if is_whitespace(ch) => {}
            Unit::Char(ch) => {
                reader.unread(ch);
                return Ok(());
            }
        }
    }
}

#[inline]
fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}
