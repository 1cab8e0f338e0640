//! Low-level scanning utilities
//!
//! Bounded scans over the stacked [`Reader`]: identifiers, whitespace runs,
//! quoted literals, fixed keywords, and the entity-aware single-unit read
//! that all higher-level scanning is built on. Every scan returns owned text
//! rather than a nested stream, so no lookahead is ever stranded in a
//! sub-reader.

use crate::core::entities::{is_valid_xml_char, EntityResolver};
use crate::error::{Result, XmlError};
use crate::reader::Reader;

/// One logical unit of input: a plain character, or the name of a
/// `&name;` / `%name;` reference.
#[derive(Debug, PartialEq, Eq)]
pub enum Unit {
    Char(char),
    Reference(String),
}

/// True for XML name characters: `[A-Za-z0-9_:.-]` plus everything above
/// U+007E.
#[inline]
pub fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | ':' | '.' | '-') || ch > '\u{7e}'
}

/// An `InvalidInput` error at the reader's current position.
pub(crate) fn invalid(reader: &Reader, detail: impl Into<String>) -> XmlError {
    XmlError::InvalidInput {
        detail: detail.into(),
        system_id: reader.system_id().to_string(),
        line: reader.line_nr(),
    }
}

/// Consumes the maximal run of name characters and pushes back the
/// terminator. Fails if no name character is present.
pub fn scan_identifier(reader: &mut Reader) -> Result<String> {
    let mut name = String::new();
    loop {
        if reader.at_eof() {
            break;
        }
        let ch = reader.read()?;
        if !is_name_char(ch) {
            reader.unread(ch);
            break;
        }
        name.push(ch);
    }
    if name.is_empty() {
        return Err(invalid(reader, "expected an identifier"));
    }
    Ok(name)
}

/// Consumes a whitespace run. With a collector the run is kept, normalized:
/// CR and CR LF become a single `\n`, other whitespace becomes a space.
/// Stops silently at end of input.
pub fn skip_whitespace(reader: &mut Reader, mut collector: Option<&mut String>) -> Result<()> {
    loop {
        if reader.at_eof() {
            return Ok(());
        }
        let ch = reader.read()?;
        let normalized = match ch {
            ' ' | '\t' => ' ',
            '\n' => '\n',
            '\r' => {
                if !reader.at_eof() {
                    let next = reader.read()?;
                    if next != '\n' {
                        reader.unread(next);
                    }
                }
                '\n'
            }
            _ => {
                reader.unread(ch);
                return Ok(());
            }
        };
        if let Some(buf) = collector.as_mut() {
            buf.push(normalized);
        }
    }
}

/// Reads one logical unit: a bare character, or — when the character equals
/// `entity_char` — the full reference up to and including `;`. Numeric
/// character references are decoded to their character on the spot.
pub fn read(reader: &mut Reader, entity_char: char) -> Result<Unit> {
    let ch = reader.read()?;
    if ch != entity_char {
        return Ok(Unit::Char(ch));
    }
    let next = reader.read()?;
    if next == '#' && entity_char == '&' {
        return Ok(Unit::Char(process_char_literal(reader)?));
    }
    reader.unread(next);
    Ok(Unit::Reference(scan_reference_name(reader)?))
}

/// Scans the `name;` tail of an entity reference, consuming the `;`.
fn scan_reference_name(reader: &mut Reader) -> Result<String> {
    let mut name = String::new();
    loop {
        let ch = reader.read()?;
        if ch == ';' {
            break;
        }
        if !is_name_char(ch) {
            return Err(invalid(
                reader,
                format!("expected ';' to close entity reference, found '{ch}'"),
            ));
        }
        name.push(ch);
    }
    if name.is_empty() {
        return Err(invalid(reader, "empty entity reference"));
    }
    Ok(name)
}

/// Decodes the digits of a `&#NNN;` or `&#xHHH;` character reference. The
/// leading `&#` has already been consumed.
pub fn process_char_literal(reader: &mut Reader) -> Result<char> {
    let mut digits = String::new();
    loop {
        let ch = reader.read()?;
        if ch == ';' {
            break;
        }
        digits.push(ch);
    }
    let value = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16)
    } else {
        digits.parse::<u32>()
    };
    let value = value.map_err(|_| invalid(reader, format!("bad character reference '&#{digits};'")))?;
    if !is_valid_xml_char(value) {
        return Err(invalid(
            reader,
            format!("character reference out of range '&#{digits};'"),
        ));
    }
    char::from_u32(value)
        .ok_or_else(|| invalid(reader, format!("bad character reference '&#{digits};'")))
}

/// Reads a `'`- or `"`-delimited literal, expanding entities inline. The
/// closing quote only counts at the stream level recorded when the scan
/// started, so a quote inside an expanded entity's replacement text does not
/// terminate the literal. With no resolver (DTD PUBLIC/SYSTEM literals) the
/// text is taken verbatim.
pub fn scan_string(
    reader: &mut Reader,
    entity_char: char,
    resolver: Option<&EntityResolver>,
) -> Result<String> {
    let delim = reader.read()?;
    if delim != '"' && delim != '\'' {
        return Err(invalid(reader, format!("expected a quoted string, found '{delim}'")));
    }
    let start_level = reader.stream_level();
    let mut out = String::new();
    loop {
        match resolver {
            Some(res) => match read(reader, entity_char)? {
                Unit::Char(ch) if ch == delim && reader.stream_level() == start_level => break,
                Unit::Char(ch) => out.push(ch),
                Unit::Reference(name) => res.resolve(&name, reader)?,
            },
            None => {
                let ch = reader.read()?;
                if ch == delim && reader.stream_level() == start_level {
                    break;
                }
                out.push(ch);
            }
        }
    }
    Ok(out)
}

/// Consumes and verifies a fixed keyword tail, character by character.
pub fn check_literal(reader: &mut Reader, literal: &str) -> Result<()> {
    for expected in literal.chars() {
        let ch = reader.read()?;
        if ch != expected {
            return Err(invalid(reader, format!("expected '{literal}'")));
        }
    }
    Ok(())
}

/// Skips a comment body up to `-->`. The opening `<!--` has been consumed.
/// Two consecutive `-` followed by `>` terminate; any other run of `-`
/// resets the count.
pub fn skip_comment(reader: &mut Reader) -> Result<()> {
    let mut dashes = 0u32;
    loop {
        let ch = reader.read()?;
        match ch {
            '-' => dashes += 1,
            '>' if dashes >= 2 => return Ok(()),
            _ => dashes = 0,
        }
    }
}
