//! Stacked character reader
//!
//! The parser never looks at bytes directly: it pulls characters from a
//! [`Reader`], which manages a stack of stream frames. A new frame is pushed
//! whenever an entity expands, a conditional DTD section is re-injected, or
//! an external file (DTD subset, external entity) is opened. Reads always
//! come from the top frame; an exhausted frame is popped transparently so
//! callers see one continuous character sequence.
//!
//! Each frame carries its own two-slot pushback buffer, its own system and
//! public ID, and an optional line counter. Frames created for internal
//! entities have no counter, so line numbers keep referring to the document
//! that contained the reference.

use std::fs;
use std::io;
use std::path::Path;

use crate::core::encoding;
use crate::error::{Result, XmlError};

/// Upper bound on stream pushes per parse. Stops runaway expansion of
/// self-referential entities.
const MAX_STREAM_PUSHES: u32 = 10_000;

/// Resolves public/system IDs to raw bytes.
///
/// External I/O is a collaborator: the reader only requires bytes in, and
/// decodes them itself (BOM and encoding-declaration sniffing).
pub trait StreamSource {
    fn open(&mut self, public_id: &str, system_id: &str) -> io::Result<Vec<u8>>;
}

/// Resolves system IDs as local file paths.
pub struct FileSource;

impl StreamSource for FileSource {
    fn open(&mut self, _public_id: &str, system_id: &str) -> io::Result<Vec<u8>> {
        fs::read(system_id)
    }
}

/// Refuses all external resolution. The default for in-memory parses.
pub struct NoSource;

impl StreamSource for NoSource {
    fn open(&mut self, _public_id: &str, system_id: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("external stream resolution disabled ({system_id})"),
        ))
    }
}

/// One nested character source: entity expansion, re-injected conditional
/// section text, or an opened file.
struct StreamFrame {
    text: Vec<char>,
    pos: usize,
    /// Two-slot pushback ring, most recently pushed char read back first.
    pushback: [char; 2],
    pushback_len: usize,
    /// 1-based line counter. `None` for internal-entity frames, which must
    /// not shift the line numbers of the stream that referenced them.
    line: Option<u32>,
    system_id: String,
    public_id: String,
}

impl StreamFrame {
    fn new(text: &str, line: Option<u32>, system_id: String, public_id: String) -> Self {
        StreamFrame {
            text: text.chars().collect(),
            pos: 0,
            pushback: ['\0'; 2],
            pushback_len: 0,
            line,
            system_id,
            public_id,
        }
    }

    /// Next character from this frame, or `None` when exhausted.
    fn next(&mut self) -> Option<char> {
        if self.pushback_len > 0 {
            self.pushback_len -= 1;
            return Some(self.pushback[self.pushback_len]);
        }
        let ch = *self.text.get(self.pos)?;
        self.pos += 1;
        if ch == '\n' {
            if let Some(line) = self.line.as_mut() {
                *line += 1;
            }
        }
        Some(ch)
    }

    fn has_remaining(&self) -> bool {
        self.pushback_len > 0 || self.pos < self.text.len()
    }

    fn unread(&mut self, ch: char) {
        debug_assert!(self.pushback_len < 2, "pushback depth exceeded");
        self.pushback[self.pushback_len] = ch;
        self.pushback_len += 1;
    }
}

/// Character source with multi-level pushback and transparent sub-streams.
pub struct Reader {
    frames: Vec<StreamFrame>,
    source: Box<dyn StreamSource>,
    pushes: u32,
}

impl Reader {
    /// Reader over an in-memory string. External resolution is disabled.
    pub fn from_str(text: &str) -> Self {
        Reader {
            frames: vec![StreamFrame::new(text, Some(1), String::new(), String::new())],
            source: Box::new(NoSource),
            pushes: 0,
        }
    }

    /// Reader over raw bytes, sniffing BOM and encoding declaration.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = encoding::decode_document(bytes)
            .map_err(|detail| XmlError::Io { detail, system_id: String::new(), line: 1 })?;
        Ok(Reader {
            frames: vec![StreamFrame::new(&text, Some(1), String::new(), String::new())],
            source: Box::new(NoSource),
            pushes: 0,
        })
    }

    /// Reader over a file. The path becomes the system ID, so relative
    /// external references (DTDs, entities) resolve next to the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let system_id = path.to_string_lossy().into_owned();
        let bytes = fs::read(path).map_err(|e| XmlError::Io {
            detail: e.to_string(),
            system_id: system_id.clone(),
            line: 1,
        })?;
        let text = encoding::decode_document(&bytes).map_err(|detail| XmlError::Io {
            detail,
            system_id: system_id.clone(),
            line: 1,
        })?;
        Ok(Reader {
            frames: vec![StreamFrame::new(&text, Some(1), system_id, String::new())],
            source: Box::new(FileSource),
            pushes: 0,
        })
    }

    /// Replaces the external stream resolver.
    pub fn set_source(&mut self, source: Box<dyn StreamSource>) {
        self.source = source;
    }

    /// Reads the next character, falling through exhausted frames. The
    /// outermost frame is never popped; exhausting it is end-of-input.
    pub fn read(&mut self) -> Result<char> {
        loop {
            let top = self
                .frames
                .last_mut()
                .expect("stream stack never empties below the outermost frame");
            if let Some(ch) = top.next() {
                return Ok(ch);
            }
            if self.frames.len() == 1 {
                return Err(self.eof_error());
            }
            self.frames.pop();
        }
    }

    /// Pushes a character back onto the current frame. At most two
    /// characters may be pending at once, and callers must not unread after
    /// a frame has been popped by exhaustion.
    pub fn unread(&mut self, ch: char) {
        self.frames
            .last_mut()
            .expect("stream stack never empties below the outermost frame")
            .unread(ch);
    }

    /// True when every frame is exhausted. Pops dead frames as a side
    /// effect so `stream_level` reflects the live stack.
    pub fn at_eof(&mut self) -> bool {
        loop {
            if self.frames.last().map_or(true, |f| f.has_remaining()) {
                return false;
            }
            if self.frames.len() == 1 {
                return true;
            }
            self.frames.pop();
        }
    }

    /// Pushes a new in-memory stream frame. Internal-entity frames carry no
    /// line counter and inherit the referencing stream's IDs.
    pub fn start_new_stream(&mut self, text: &str, is_internal_entity: bool) -> Result<()> {
        self.check_push_limit()?;
        let (system_id, public_id) = {
            let top = self.current();
            (top.system_id.clone(), top.public_id.clone())
        };
        let line = if is_internal_entity { None } else { Some(1) };
        self.frames
            .push(StreamFrame::new(text, line, system_id, public_id));
        Ok(())
    }

    /// Opens an external stream via the [`StreamSource`], decoding it and
    /// pushing a line-counted frame. The system ID is resolved relative to
    /// the referencing stream's system ID.
    pub fn open_external(&mut self, public_id: &str, system_id: &str) -> Result<()> {
        self.check_push_limit()?;
        let resolved = resolve_system_id(&self.current().system_id, system_id);
        log::debug!("opening external stream {resolved}");
        let bytes = self.source.open(public_id, &resolved).map_err(|e| XmlError::Io {
            detail: e.to_string(),
            system_id: resolved.clone(),
            line: 1,
        })?;
        let text = encoding::decode_document(&bytes).map_err(|detail| XmlError::Io {
            detail,
            system_id: resolved.clone(),
            line: 1,
        })?;
        self.frames.push(StreamFrame::new(
            &text,
            Some(1),
            resolved,
            public_id.to_string(),
        ));
        Ok(())
    }

    /// Line number of the innermost frame with a live counter.
    pub fn line_nr(&self) -> u32 {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.line)
            .unwrap_or(1)
    }

    /// Current stack depth. Callers record this to detect that reads have
    /// fallen back out of the stream they started in.
    pub fn stream_level(&self) -> usize {
        self.frames.len()
    }

    /// System ID of the current stream.
    pub fn system_id(&self) -> &str {
        &self.current().system_id
    }

    /// Public ID of the current stream.
    pub fn public_id(&self) -> &str {
        &self.current().public_id
    }

    pub fn set_system_id(&mut self, system_id: &str) {
        self.current_mut().system_id = system_id.to_string();
    }

    pub fn set_public_id(&mut self, public_id: &str) {
        self.current_mut().public_id = public_id.to_string();
    }

    /// An `UnexpectedEof` error at the current position.
    pub fn eof_error(&self) -> XmlError {
        XmlError::UnexpectedEof {
            system_id: self.current().system_id.clone(),
            line: self.line_nr(),
        }
    }

    fn current(&self) -> &StreamFrame {
        self.frames
            .last()
            .expect("stream stack never empties below the outermost frame")
    }

    fn current_mut(&mut self) -> &mut StreamFrame {
        self.frames
            .last_mut()
            .expect("stream stack never empties below the outermost frame")
    }

    fn check_push_limit(&mut self) -> Result<()> {
        self.pushes += 1;
        if self.pushes > MAX_STREAM_PUSHES {
            return Err(XmlError::InvalidInput {
                detail: "entity expansion limit exceeded".to_string(),
                system_id: self.current().system_id.clone(),
                line: self.line_nr(),
            });
        }
        Ok(())
    }
}

/// Resolves `system_id` relative to the stream that referenced it. Absolute
/// paths and URL-shaped IDs pass through untouched.
fn resolve_system_id(base: &str, system_id: &str) -> String {
    if system_id.starts_with('/') || system_id.contains("://") || base.is_empty() {
        return system_id.to_string();
    }
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], system_id),
        None => system_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_unread() {
        let mut r = Reader::from_str("ab");
        assert_eq!(r.read().unwrap(), 'a');
        r.unread('a');
        assert_eq!(r.read().unwrap(), 'a');
        assert_eq!(r.read().unwrap(), 'b');
        assert!(r.read().is_err());
    }

    #[test]
    fn pushback_depth_two() {
        let mut r = Reader::from_str("c");
        r.unread('b');
        r.unread('a');
        assert_eq!(r.read().unwrap(), 'a');
        assert_eq!(r.read().unwrap(), 'b');
        assert_eq!(r.read().unwrap(), 'c');
    }

    #[test]
    fn line_counting() {
        let mut r = Reader::from_str("a\nb\nc");
        assert_eq!(r.line_nr(), 1);
        while r.read().map(|c| c != 'c').unwrap_or(false) {}
        assert_eq!(r.line_nr(), 3);
    }

    #[test]
    fn unread_does_not_double_count_lines() {
        let mut r = Reader::from_str("\nx");
        assert_eq!(r.read().unwrap(), '\n');
        assert_eq!(r.line_nr(), 2);
        r.unread('\n');
        assert_eq!(r.read().unwrap(), '\n');
        assert_eq!(r.line_nr(), 2);
    }

    #[test]
    fn internal_entity_keeps_outer_line_number() {
        let mut r = Reader::from_str("\n\nrest");
        r.read().unwrap();
        r.read().unwrap();
        assert_eq!(r.line_nr(), 3);
        r.start_new_stream("one\ntwo", true).unwrap();
        r.read().unwrap();
        assert_eq!(r.line_nr(), 3);
    }

    #[test]
    fn counted_stream_has_own_lines() {
        let mut r = Reader::from_str("rest");
        r.start_new_stream("a\nb", false).unwrap();
        r.read().unwrap();
        r.read().unwrap();
        assert_eq!(r.line_nr(), 2);
    }

    #[test]
    fn frames_fall_through_on_exhaustion() {
        let mut r = Reader::from_str("outer");
        r.start_new_stream("in", true).unwrap();
        let collected: String = (0..7).map(|_| r.read().unwrap()).collect();
        assert_eq!(collected, "inouter");
        assert!(r.at_eof());
    }

    #[test]
    fn stream_level_tracks_stack() {
        let mut r = Reader::from_str("x");
        assert_eq!(r.stream_level(), 1);
        r.start_new_stream("y", true).unwrap();
        assert_eq!(r.stream_level(), 2);
        r.read().unwrap();
        assert!(!r.at_eof());
        assert_eq!(r.stream_level(), 1);
    }

    #[test]
    fn expansion_limit_is_enforced() {
        let mut r = Reader::from_str("x");
        let mut failed = false;
        for _ in 0..=MAX_STREAM_PUSHES {
            if r.start_new_stream("", true).is_err() {
                failed = true;
                break;
            }
        }
        assert!(failed);
    }

    #[test]
    fn resolve_relative_ids() {
        assert_eq!(resolve_system_id("a/b/doc.xml", "ent.xml"), "a/b/ent.xml");
        assert_eq!(resolve_system_id("doc.xml", "ent.xml"), "ent.xml");
        assert_eq!(resolve_system_id("a/doc.xml", "/abs.xml"), "/abs.xml");
        assert_eq!(
            resolve_system_id("a/doc.xml", "http://x/y.dtd"),
            "http://x/y.dtd"
        );
        assert_eq!(resolve_system_id("", "ent.xml"), "ent.xml");
    }

    #[test]
    fn no_source_refuses_external() {
        let mut r = Reader::from_str("x");
        assert!(r.open_external("", "other.xml").is_err());
    }
}
