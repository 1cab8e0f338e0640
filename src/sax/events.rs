//! SAX Event Types
//!
//! Owned structural events as emitted by the parser, in document order.

/// One structural parsing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Start of an element.
    StartElement {
        name: String,
        prefix: Option<String>,
        namespace: Option<String>,
        line: u32,
    },

    /// One attribute of the element currently opening.
    Attribute {
        name: String,
        prefix: Option<String>,
        namespace: Option<String>,
        value: String,
    },

    /// All attributes of the opening element have been seen.
    AttributesEnd { name: String },

    /// End of an element.
    EndElement { name: String },

    /// Text content with entities already expanded.
    PcData { text: String, line: u32 },

    /// Processing instruction (never the XML declaration).
    ProcessingInstruction { target: String, data: String },
}

impl XmlEvent {
    /// Check if this is a start element event
    #[inline]
    pub fn is_start_element(&self) -> bool {
        matches!(self, XmlEvent::StartElement { .. })
    }

    /// Check if this is an end element event
    #[inline]
    pub fn is_end_element(&self) -> bool {
        matches!(self, XmlEvent::EndElement { .. })
    }

    /// Check if this is a text event
    #[inline]
    pub fn is_pcdata(&self) -> bool {
        matches!(self, XmlEvent::PcData { .. })
    }

    /// Element name if this is a start or end element event.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            XmlEvent::StartElement { name, .. } => Some(name),
            XmlEvent::EndElement { name } => Some(name),
            _ => None,
        }
    }
}
