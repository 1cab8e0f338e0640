//! Tree serializer
//!
//! Re-emits an [`Element`] tree as XML text, escaping markup characters.
//! Attributes are written as stored; namespace declarations that were
//! consumed during parsing are not resynthesized.

use std::borrow::Cow;
use std::io::{self, Write};

use memchr::memchr3;

use super::node::Element;

/// Escape text content for XML output (`<`, `>`, `&`).
pub fn escape_pcdata(input: &str) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if memchr3(b'<', b'>', b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape an attribute value (`<`, `>`, `&` plus both quote kinds).
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    if memchr3(b'<', b'&', b'"', input.as_bytes()).is_none()
        && !input.as_bytes().contains(&b'\'')
        && !input.as_bytes().contains(&b'>')
    {
        return Cow::Borrowed(input);
    }
    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Serializes element trees to a writer.
pub struct XmlWriter<W: Write> {
    out: W,
    pretty: bool,
    indent: usize,
}

impl<W: Write> XmlWriter<W> {
    /// Compact output, no added whitespace.
    pub fn new(out: W) -> Self {
        XmlWriter {
            out,
            pretty: false,
            indent: 0,
        }
    }

    /// Indented output, `indent` spaces per nesting level.
    pub fn pretty(out: W, indent: usize) -> Self {
        XmlWriter {
            out,
            pretty: true,
            indent,
        }
    }

    /// Writes one element tree.
    pub fn write(&mut self, element: &Element) -> io::Result<()> {
        self.write_level(element, 0)?;
        if self.pretty {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_level(&mut self, element: &Element, level: usize) -> io::Result<()> {
        if self.pretty && level > 0 {
            writeln!(self.out)?;
            write!(self.out, "{:width$}", "", width = level * self.indent)?;
        }
        write!(self.out, "<{}", element.full_name())?;
        for attr in element.attributes() {
            write!(
                self.out,
                " {}=\"{}\"",
                attr.full_name(),
                escape_attribute(&attr.value)
            )?;
        }

        if element.children().is_empty() && element.content().is_empty() {
            return write!(self.out, "/>");
        }

        write!(self.out, ">")?;
        if !element.content().is_empty() {
            write!(self.out, "{}", escape_pcdata(element.content()))?;
        }
        for child in element.children() {
            self.write_level(child, level + 1)?;
        }
        if self.pretty && !element.children().is_empty() {
            writeln!(self.out)?;
            write!(self.out, "{:width$}", "", width = level * self.indent)?;
        }
        write!(self.out, "</{}>", element.full_name())
    }
}

/// Serializes a tree into a string, compact.
pub fn to_string(element: &Element) -> String {
    let mut buf = Vec::new();
    XmlWriter::new(&mut buf)
        .write(element)
        .expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("writer emits UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_rules() {
        assert_eq!(escape_pcdata("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_pcdata("plain"), "plain");
        assert!(matches!(escape_pcdata("plain"), Cow::Borrowed(_)));
        assert_eq!(escape_attribute("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape_attribute("it's"), "it&apos;s");
    }

    #[test]
    fn empty_element_self_closes() {
        let e = Element::new("empty");
        assert_eq!(to_string(&e), "<empty/>");
    }

    #[test]
    fn attributes_and_content() {
        let mut e = Element::new("greet");
        e.set_attribute("to", "world & co");
        e.set_content("hello <there>");
        assert_eq!(
            to_string(&e),
            "<greet to=\"world &amp; co\">hello &lt;there&gt;</greet>"
        );
    }

    #[test]
    fn nested_children() {
        let mut root = Element::new("root");
        let mut child = Element::new("child");
        child.set_content("x");
        root.add_child(child);
        root.add_child(Element::new("other"));
        assert_eq!(
            to_string(&root),
            "<root><child>x</child><other/></root>"
        );
    }

    #[test]
    fn pretty_output_indents() {
        let mut root = Element::new("root");
        root.add_child(Element::new("child"));
        let mut buf = Vec::new();
        XmlWriter::pretty(&mut buf, 2).write(&root).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "<root>\n  <child/>\n</root>\n");
    }
}
