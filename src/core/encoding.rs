//! XML Encoding Detection and Conversion
//!
//! Handles detection of UTF-16 and other encodings based on BOM and the
//! `encoding` pseudo-attribute of the XML declaration. Converts the whole
//! byte stream to a decoded string before parsing begins; the scan of the
//! declaration consumes nothing, so the parser still sees `<?xml ...?>`.

use memchr::memmem;

/// Detected encoding of XML input based on BOM or byte patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Ascii,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes.
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return XmlEncoding::Utf8;
        }

        // Check for BOM
        match (input[0], input[1]) {
            // UTF-16 LE BOM: 0xFF 0xFE
            (0xFF, 0xFE) => XmlEncoding::Utf16Le,
            // UTF-16 BE BOM: 0xFE 0xFF
            (0xFE, 0xFF) => XmlEncoding::Utf16Be,
            // UTF-8 BOM: 0xEF 0xBB 0xBF (detected but treated as UTF-8)
            (0xEF, 0xBB) if input.len() >= 3 && input[2] == 0xBF => XmlEncoding::Utf8,
            // No BOM - check for UTF-16 pattern (< followed by null or null followed by <)
            (0x00, b'<') => XmlEncoding::Utf16Be,
            (b'<', 0x00) => XmlEncoding::Utf16Le,
            _ => XmlEncoding::Utf8,
        }
    }

    /// Map an `encoding="..."` label onto a supported encoding.
    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8") {
            Some(XmlEncoding::Utf8)
        } else if label.eq_ignore_ascii_case("utf-16le") {
            Some(XmlEncoding::Utf16Le)
        } else if label.eq_ignore_ascii_case("utf-16be") || label.eq_ignore_ascii_case("utf-16") {
            Some(XmlEncoding::Utf16Be)
        } else if label.eq_ignore_ascii_case("iso-8859-1") || label.eq_ignore_ascii_case("latin1") {
            Some(XmlEncoding::Latin1)
        } else if label.eq_ignore_ascii_case("us-ascii") || label.eq_ignore_ascii_case("ascii") {
            Some(XmlEncoding::Ascii)
        } else {
            None
        }
    }
}

/// Decode a whole document: BOM sniff, then, absent a BOM, the `<?xml ...?>`
/// declaration's `encoding` pseudo-attribute. A declared encoding that fails
/// to decode falls back to UTF-8.
pub fn decode_document(input: &[u8]) -> Result<String, String> {
    match XmlEncoding::detect(input) {
        XmlEncoding::Utf16Le => return convert_utf16_le(input),
        XmlEncoding::Utf16Be => return convert_utf16_be(input),
        _ => {}
    }

    // Skip UTF-8 BOM if present
    let input = if input.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &input[3..]
    } else {
        input
    };

    if let Some(label) = declared_encoding(input) {
        match XmlEncoding::from_label(&label) {
            Some(XmlEncoding::Utf16Le) => return convert_utf16_le(input),
            Some(XmlEncoding::Utf16Be) => return convert_utf16_be(input),
            Some(XmlEncoding::Latin1) => return Ok(convert_latin1(input)),
            Some(XmlEncoding::Ascii) | Some(XmlEncoding::Utf8) => {}
            None => {
                log::warn!("unsupported declared encoding '{label}', falling back to UTF-8");
            }
        }
    }

    match std::str::from_utf8(input) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => {
            log::warn!("input is not valid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(input).into_owned())
        }
    }
}

/// Scan the `encoding` pseudo-attribute of a leading `<?xml ...?>`
/// declaration without consuming past it.
fn declared_encoding(input: &[u8]) -> Option<String> {
    if !input.starts_with(b"<?xml") {
        return None;
    }
    let end = memmem::find(input, b"?>")?;
    let decl = std::str::from_utf8(&input[..end]).ok()?;
    let idx = decl.find("encoding")?;
    let rest = decl[idx + "encoding".len()..].trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let close = rest.find(quote)?;
    Some(rest[..close].to_string())
}

/// Convert UTF-16 LE to a string
fn convert_utf16_le(input: &[u8]) -> Result<String, String> {
    // Skip BOM if present
    let start = if input.starts_with(&[0xFF, 0xFE]) { 2 } else { 0 };
    let bytes = &input[start..];

    if bytes.len() % 2 != 0 {
        return Err("Invalid UTF-16 LE: odd number of bytes".to_string());
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units).map_err(|e| format!("Invalid UTF-16 LE: {}", e))
}

/// Convert UTF-16 BE to a string
fn convert_utf16_be(input: &[u8]) -> Result<String, String> {
    // Skip BOM if present
    let start = if input.starts_with(&[0xFE, 0xFF]) { 2 } else { 0 };
    let bytes = &input[start..];

    if bytes.len() % 2 != 0 {
        return Err("Invalid UTF-16 BE: odd number of bytes".to_string());
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units).map_err(|e| format!("Invalid UTF-16 BE: {}", e))
}

/// ISO-8859-1 maps bytes 1:1 onto the first 256 code points.
fn convert_latin1(input: &[u8]) -> String {
    input.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8() {
        assert_eq!(XmlEncoding::detect(b"<root/>"), XmlEncoding::Utf8);
        assert_eq!(XmlEncoding::detect(b"<?xml"), XmlEncoding::Utf8);
    }

    #[test]
    fn test_detect_utf8_bom() {
        assert_eq!(
            XmlEncoding::detect(&[0xEF, 0xBB, 0xBF, b'<']),
            XmlEncoding::Utf8
        );
    }

    #[test]
    fn test_detect_utf16_le_bom() {
        assert_eq!(
            XmlEncoding::detect(&[0xFF, 0xFE, b'<', 0x00]),
            XmlEncoding::Utf16Le
        );
    }

    #[test]
    fn test_detect_utf16_be_bom() {
        assert_eq!(
            XmlEncoding::detect(&[0xFE, 0xFF, 0x00, b'<']),
            XmlEncoding::Utf16Be
        );
    }

    #[test]
    fn test_detect_utf16_without_bom() {
        assert_eq!(XmlEncoding::detect(&[0x00, b'<']), XmlEncoding::Utf16Be);
        assert_eq!(XmlEncoding::detect(&[b'<', 0x00]), XmlEncoding::Utf16Le);
    }

    #[test]
    fn test_convert_utf16_le() {
        // "<r/>" in UTF-16 LE with BOM
        let utf16_le = vec![
            0xFF, 0xFE, // BOM
            b'<', 0x00, b'r', 0x00, b'/', 0x00, b'>', 0x00,
        ];
        let result = decode_document(&utf16_le).unwrap();
        assert_eq!(result, "<r/>");
    }

    #[test]
    fn test_convert_utf16_be() {
        // "<r/>" in UTF-16 BE with BOM
        let utf16_be = vec![
            0xFE, 0xFF, // BOM
            0x00, b'<', 0x00, b'r', 0x00, b'/', 0x00, b'>',
        ];
        let result = decode_document(&utf16_be).unwrap();
        assert_eq!(result, "<r/>");
    }

    #[test]
    fn test_utf8_passthrough() {
        let result = decode_document(b"<root>hello</root>").unwrap();
        assert_eq!(result, "<root>hello</root>");
    }

    #[test]
    fn test_declared_latin1() {
        let mut doc = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>".to_vec();
        doc.push(0xE9); // e-acute in Latin-1
        doc.extend_from_slice(b"</r>");
        let result = decode_document(&doc).unwrap();
        assert!(result.contains('\u{e9}'), "{result}");
    }

    #[test]
    fn test_declared_encoding_scan() {
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding='UTF-8'?><r/>"),
            Some("UTF-8".to_string())
        );
        assert_eq!(declared_encoding(b"<r/>"), None);
        // Declaration without an encoding attribute
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><r/>"), None);
    }

    #[test]
    fn test_unknown_declared_encoding_falls_back() {
        let doc = b"<?xml version=\"1.0\" encoding=\"KOI8-R\"?><r/>";
        let result = decode_document(doc).unwrap();
        assert!(result.ends_with("<r/>"));
    }

    #[test]
    fn test_invalid_utf8_falls_back_lossy() {
        let doc = b"<r>\xFF</r>";
        let result = decode_document(doc).unwrap();
        assert!(result.starts_with("<r>"));
    }
}
