//! SAX Collector
//!
//! A [`Builder`] that records the event sequence of a parse. Used by tests
//! and by consumers that want SAX-style access without a tree.

use super::events::XmlEvent;
use super::{BuildError, Builder};

/// Collector that gathers structural events during a parse. The result
/// becomes available once the root element has closed.
pub struct EventCollector {
    events: Vec<XmlEvent>,
    depth: usize,
    complete: bool,
}

impl EventCollector {
    pub fn new() -> Self {
        EventCollector {
            events: Vec::with_capacity(64),
            depth: 0,
            complete: false,
        }
    }

    /// Events collected so far.
    pub fn events(&self) -> &[XmlEvent] {
        &self.events
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for EventCollector {
    type Output = Vec<XmlEvent>;

    fn start_building(&mut self, _system_id: &str, _line_nr: u32) -> Result<(), BuildError> {
        self.events.clear();
        self.depth = 0;
        self.complete = false;
        Ok(())
    }

    fn start_element(
        &mut self,
        name: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
        _system_id: &str,
        line_nr: u32,
    ) -> Result<(), BuildError> {
        self.depth += 1;
        self.events.push(XmlEvent::StartElement {
            name: name.to_string(),
            prefix: prefix.map(str::to_string),
            namespace: ns_uri.map(str::to_string),
            line: line_nr,
        });
        Ok(())
    }

    fn add_attribute(
        &mut self,
        key: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
        value: &str,
        _attr_type: &str,
    ) -> Result<(), BuildError> {
        self.events.push(XmlEvent::Attribute {
            name: key.to_string(),
            prefix: prefix.map(str::to_string),
            namespace: ns_uri.map(str::to_string),
            value: value.to_string(),
        });
        Ok(())
    }

    fn element_attributes_processed(
        &mut self,
        name: &str,
        _prefix: Option<&str>,
        _ns_uri: Option<&str>,
    ) -> Result<(), BuildError> {
        self.events.push(XmlEvent::AttributesEnd {
            name: name.to_string(),
        });
        Ok(())
    }

    fn end_element(
        &mut self,
        name: &str,
        _prefix: Option<&str>,
        _ns_uri: Option<&str>,
    ) -> Result<(), BuildError> {
        self.events.push(XmlEvent::EndElement {
            name: name.to_string(),
        });
        self.depth -= 1;
        if self.depth == 0 {
            self.complete = true;
        }
        Ok(())
    }

    fn add_pcdata(
        &mut self,
        content: &str,
        _system_id: &str,
        line_nr: u32,
    ) -> Result<(), BuildError> {
        self.events.push(XmlEvent::PcData {
            text: content.to_string(),
            line: line_nr,
        });
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<(), BuildError> {
        self.events.push(XmlEvent::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
        Ok(())
    }

    fn take_result(&mut self) -> Option<Self::Output> {
        if self.complete {
            self.complete = false;
            Some(std::mem::take(&mut self.events))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_only_after_root_closes() {
        let mut c = EventCollector::new();
        c.start_building("", 1).unwrap();
        c.start_element("root", None, None, "", 1).unwrap();
        assert!(c.take_result().is_none());
        c.start_element("child", None, None, "", 1).unwrap();
        c.end_element("child", None, None).unwrap();
        assert!(c.take_result().is_none());
        c.end_element("root", None, None).unwrap();
        let events = c.take_result().unwrap();
        assert_eq!(events.len(), 4);
        assert!(events[0].is_start_element());
        assert!(events[3].is_end_element());
    }
}
