//! Entity and set templates.

use std::rc::Rc;

use mosaic_core::Node;

use crate::error::{TemplateError, TemplateKind, TemplateResult};

/// A reusable blueprint for one entity: its property and component nodes in
/// document order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDefinition {
    /// Template name.
    pub name: String,
    /// `<property>` nodes.
    pub properties: Vec<Rc<Node>>,
    /// `<component>` nodes.
    pub components: Vec<Rc<Node>>,
}

impl EntityDefinition {
    /// An empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Build a definition from an `entity` node without inheritance.
    /// Children other than `property` and `component` are ignored.
    pub fn from_node(node: &Node) -> TemplateResult<Self> {
        let name = node.name().ok_or_else(|| TemplateError::MissingName {
            kind: TemplateKind::Entity,
            span: node.span(),
        })?;
        let mut def = Self::new(name);
        for child in node.children() {
            if child.is("property") {
                def.properties.push(Rc::clone(child));
            } else if child.is("component") {
                def.components.push(Rc::clone(child));
            } else {
                log::debug!("entity {name}: ignoring <{}>", child.tag());
            }
        }
        Ok(def)
    }

    /// Render back to an `entity` node: properties first, then components.
    pub fn to_node(&self) -> Node {
        let mut node = Node::new("entity").with_attr("name", self.name.as_str());
        for child in self.properties.iter().chain(&self.components) {
            node.push_child(Rc::clone(child));
        }
        node
    }

    /// Names of the property nodes, in order. Unnamed nodes are skipped.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().filter_map(|p| p.name())
    }

    /// Component names in order, defaulting to the `type` attribute.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .filter_map(|c| c.name().or_else(|| c.attr("type")))
    }
}

/// A reusable group of entity references. References are kept verbatim and
/// resolved when the set is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDefinition {
    /// Template name.
    pub name: String,
    /// `<entity>` references, each with a `base`.
    pub entities: Vec<Rc<Node>>,
}

impl SetDefinition {
    /// An empty set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    /// Build a definition from a `set` node without inheritance.
    pub fn from_node(node: &Node) -> TemplateResult<Self> {
        let name = node.name().ok_or_else(|| TemplateError::MissingName {
            kind: TemplateKind::Set,
            span: node.span(),
        })?;
        let mut def = Self::new(name);
        for child in node.children() {
            if child.is("entity") {
                def.entities.push(Rc::clone(child));
            } else {
                log::warn!("set {name}: ignoring <{}>, sets only hold entity references", child.tag());
            }
        }
        Ok(def)
    }

    /// Render back to a `set` node.
    pub fn to_node(&self) -> Node {
        let mut node = Node::new("set").with_attr("name", self.name.as_str());
        for child in &self.entities {
            node.push_child(Rc::clone(child));
        }
        node
    }

    /// `base` attribute of every reference, in order.
    pub fn references(&self) -> impl Iterator<Item = Option<&str>> {
        self.entities.iter().map(|e| e.attr("base"))
    }
}
