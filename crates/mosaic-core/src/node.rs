use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Source span as a byte range.
pub type Span = Range<usize>;

/// One element of a definition document.
///
/// Nodes are plain values. Children are `Rc`-shared, so cloning a node is
/// shallow and untouched subtrees stay shared between a template and every
/// definition zipped from it. Mutating a shared child goes through
/// [`Rc::make_mut`], which copies it first.
///
/// Equality compares tag, attributes, children and text. The source span is
/// ignored so that parsed and hand-built trees compare equal.
#[derive(Debug, Clone, Default)]
pub struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Rc<Node>>,
    text: Option<String>,
    span: Span,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.attributes == other.attributes
            && self.children == other.children
            && self.text == other.text
    }
}

impl Node {
    /// Create an empty element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder form of [`Node::set_attr`].
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`Node::push_child`].
    pub fn with_child(mut self, child: Node) -> Self {
        self.push_child(child);
        self
    }

    /// Set the text payload.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach the source span this node was parsed from.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Tag name as written.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Case-insensitive tag comparison. Structural tags (`entity`,
    /// `component`, ...) are matched this way; `zip` replacement of untagged
    /// children compares tags exactly.
    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Look up an attribute by exact name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present.
    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    /// Shorthand for the `name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.attr("name")
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(idx).1)
    }

    /// Builder form of [`Node::remove_attr`].
    pub fn without_attr(mut self, key: &str) -> Self {
        self.remove_attr(key);
        self
    }

    /// Child nodes in document order.
    pub fn children(&self) -> &[Rc<Node>] {
        &self.children
    }

    /// Mutable access to the child list. Individual children are shared;
    /// use [`Rc::make_mut`] to edit one.
    pub fn children_mut(&mut self) -> &mut Vec<Rc<Node>> {
        &mut self.children
    }

    /// First child whose tag matches case-insensitively.
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().map(Rc::as_ref).find(|c| c.is(tag))
    }

    /// Append a child.
    pub fn push_child(&mut self, child: impl Into<Rc<Node>>) {
        self.children.push(child.into());
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replace the text content.
    pub fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Byte range in the source document. Empty for built nodes.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    /// The value carried by this node: its own trimmed text, or failing that
    /// the payload of its first child (`<property><Vector3>1 2 3</Vector3></property>`).
    pub fn payload(&self) -> Option<&str> {
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(text),
            _ => self.children.first().and_then(|c| c.payload()),
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{indent}<{}", self.tag)?;
        for (k, v) in &self.attributes {
            write!(f, " {k}=\"{}\"", escape(v))?;
        }

        let text = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
        match (text, self.children.is_empty()) {
            (None, true) => writeln!(f, "/>"),
            (Some(text), true) => writeln!(f, ">{}</{}>", escape(text), self.tag),
            (text, false) => {
                writeln!(f, ">")?;
                if let Some(text) = text {
                    writeln!(f, "{indent}  {}", escape(text))?;
                }
                for child in &self.children {
                    child.write_indented(f, depth + 1)?;
                }
                writeln!(f, "{indent}</{}>", self.tag)
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound() -> Node {
        Node::new("component")
            .with_attr("type", "Sound")
            .with_child(Node::new("bark").with_attr("file", "a.wav"))
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut node = Node::new("entity").with_attr("name", "Cam").with_attr("base", "X");
        node.set_attr("name", "CamA");
        let attrs: Vec<_> = node.attributes().collect();
        assert_eq!(attrs, vec![("name", "CamA"), ("base", "X")]);
    }

    #[test]
    fn remove_attr_returns_old_value() {
        let mut node = Node::new("property").with_attr("mod", "add");
        assert_eq!(node.remove_attr("mod").as_deref(), Some("add"));
        assert!(!node.has_attr("mod"));
        assert_eq!(node.remove_attr("mod"), None);
    }

    #[test]
    fn tag_match_is_case_insensitive() {
        let node = Node::new("Component");
        assert!(node.is("component"));
        assert!(node.is("COMPONENT"));
        assert!(!node.is("property"));
    }

    #[test]
    fn equality_ignores_span() {
        let a = sound().with_span(3..40);
        let b = sound();
        assert_eq!(a, b);
    }

    #[test]
    fn payload_falls_back_to_first_child() {
        let own = Node::new("property").with_text("  42 ");
        assert_eq!(own.payload(), Some("42"));

        let nested = Node::new("property").with_child(Node::new("Vector3").with_text("1 2 3"));
        assert_eq!(nested.payload(), Some("1 2 3"));

        assert_eq!(Node::new("property").payload(), None);
    }

    #[test]
    fn clone_shares_children_until_written() {
        let original = sound();
        let mut copy = original.clone();
        assert!(Rc::ptr_eq(&original.children()[0], &copy.children()[0]));

        Rc::make_mut(&mut copy.children_mut()[0]).set_attr("file", "b.wav");
        assert_eq!(original.children()[0].attr("file"), Some("a.wav"));
        assert_eq!(copy.children()[0].attr("file"), Some("b.wav"));
    }

    #[test]
    fn display_renders_markup() {
        let node = sound().with_child(Node::new("volume").with_text("0.5"));
        let rendered = node.to_string();
        assert_eq!(
            rendered,
            "<component type=\"Sound\">\n  <bark file=\"a.wav\"/>\n  <volume>0.5</volume>\n</component>\n"
        );
    }

    #[test]
    fn display_escapes_attribute_values() {
        let node = Node::new("text").with_attr("value", "a<b & \"c\"");
        assert_eq!(
            node.to_string(),
            "<text value=\"a&lt;b &amp; &quot;c&quot;\"/>\n"
        );
    }
}
