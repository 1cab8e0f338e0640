//! Tree builder
//!
//! The standard [`Builder`] implementation: assembles parser events into an
//! [`Element`] tree and yields the root once its close tag has been seen.

use super::node::{Attribute, Element};
use crate::sax::{BuildError, Builder};

/// Builds an element tree from parser events.
pub struct TreeBuilder {
    stack: Vec<Element>,
    result: Option<Element>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder {
            stack: Vec::with_capacity(16),
            result: None,
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for TreeBuilder {
    type Output = Element;

    fn start_building(&mut self, _system_id: &str, _line_nr: u32) -> Result<(), BuildError> {
        self.stack.clear();
        self.result = None;
        Ok(())
    }

    fn start_element(
        &mut self,
        name: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
        system_id: &str,
        line_nr: u32,
    ) -> Result<(), BuildError> {
        self.stack
            .push(Element::with_position(name, prefix, ns_uri, system_id, line_nr));
        Ok(())
    }

    fn add_attribute(
        &mut self,
        key: &str,
        prefix: Option<&str>,
        ns_uri: Option<&str>,
        value: &str,
        attr_type: &str,
    ) -> Result<(), BuildError> {
        let current = self
            .stack
            .last_mut()
            .ok_or("attribute outside any element")?;
        current.push_attribute(Attribute {
            name: key.to_string(),
            prefix: prefix.map(str::to_string),
            namespace: ns_uri.map(str::to_string),
            value: value.to_string(),
            attr_type: attr_type.to_string(),
        });
        Ok(())
    }

    fn element_attributes_processed(
        &mut self,
        _name: &str,
        _prefix: Option<&str>,
        _ns_uri: Option<&str>,
    ) -> Result<(), BuildError> {
        Ok(())
    }

    fn end_element(
        &mut self,
        _name: &str,
        _prefix: Option<&str>,
        _ns_uri: Option<&str>,
    ) -> Result<(), BuildError> {
        let finished = self.stack.pop().ok_or("close tag without open element")?;
        match self.stack.last_mut() {
            Some(parent) => parent.add_child(finished),
            None => self.result = Some(finished),
        }
        Ok(())
    }

    fn add_pcdata(
        &mut self,
        content: &str,
        _system_id: &str,
        _line_nr: u32,
    ) -> Result<(), BuildError> {
        let current = self.stack.last_mut().ok_or("text outside any element")?;
        current.append_content(content);
        Ok(())
    }

    fn processing_instruction(&mut self, _target: &str, _data: &str) -> Result<(), BuildError> {
        // Processing instructions carry no tree structure.
        Ok(())
    }

    fn take_result(&mut self) -> Option<Element> {
        self.result.take()
    }
}
