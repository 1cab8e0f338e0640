//! Element tree
//!
//! The default output of a parse: a mutable node with ordered attributes,
//! child elements, accumulated PCDATA content, and the source position it
//! came from. Nothing is shared between nodes.

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Local name (after the prefix).
    pub name: String,
    /// Namespace prefix, if any.
    pub prefix: Option<String>,
    /// Resolved namespace URI, if any.
    pub namespace: Option<String>,
    /// Attribute value, entities expanded.
    pub value: String,
    /// Attribute type as reported by the parser (always CDATA here).
    pub attr_type: String,
}

impl Attribute {
    /// Full name including the prefix.
    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// One element of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    prefix: Option<String>,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<Element>,
    content: String,
    system_id: String,
    line: u32,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            prefix: None,
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
            content: String::new(),
            system_id: String::new(),
            line: 0,
        }
    }

    pub(crate) fn with_position(
        name: &str,
        prefix: Option<&str>,
        namespace: Option<&str>,
        system_id: &str,
        line: u32,
    ) -> Self {
        Element {
            name: name.to_string(),
            prefix: prefix.map(str::to_string),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
            content: String::new(),
            system_id: system_id.to_string(),
            line,
        }
    }

    /// Local name, without the prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Resolved namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Full name including the prefix.
    pub fn full_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Accumulated PCDATA content.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub(crate) fn append_content(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Sets the text content, replacing what was there.
    pub fn set_content(&mut self, text: &str) {
        self.content.clear();
        self.content.push_str(text);
    }

    /// System ID of the stream this element came from.
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Line the open tag was on.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Attributes in document order (defaults after explicit ones).
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Value of the attribute with the given local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value of the attribute with the given local name and namespace URI.
    pub fn attribute_ns(&self, name: &str, namespace: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    /// Adds an attribute.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.push_attribute(Attribute {
            name: name.to_string(),
            prefix: None,
            namespace: None,
            value: value.to_string(),
            attr_type: "CDATA".to_string(),
        });
    }

    pub(crate) fn push_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Mutable child elements.
    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Adds a child element.
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }
}
