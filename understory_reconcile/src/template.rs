// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Templates: static structure with holes for dynamic values.
//!
//! A [`Template`] is built once per source shape and shared. Its holes are
//! discovered by a single preorder walk, so hole `n` always receives value
//! `n` of a [`TemplateResult`]. Instantiating a template creates detached
//! host nodes and one [`Part`] per hole.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::host::{HostTree, NodeId};
use crate::part::Part;
use crate::value::Value;

/// Namespace in which template elements are created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TemplateMode {
    /// HTML elements.
    #[default]
    Html,
    /// SVG elements.
    Svg,
    /// MathML elements.
    MathMl,
}

/// Static string segments of a template source.
///
/// Identity, not content, decides cache hits: two content-equal arrays that
/// live at different addresses are different sources and produce different
/// [`Template`]s.
#[derive(Clone)]
pub enum TemplateStrings {
    /// Segments with static storage, keyed by address and length.
    Static(&'static [&'static str]),
    /// Segments produced at runtime, keyed by allocation.
    Expanded(Rc<[Rc<str>]>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum StringsKey {
    Static(usize, usize),
    Expanded(usize),
}

impl TemplateStrings {
    /// Number of segments; one more than the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Static(s) => s.len(),
            Self::Expanded(s) => s.len(),
        }
    }

    /// Returns `true` if there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns segment `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        match self {
            Self::Static(s) => s.get(index).copied(),
            Self::Expanded(s) => s.get(index).map(|s| &**s),
        }
    }

    /// Iterates the segments.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Returns `true` if both refer to the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    pub(crate) fn key(&self) -> StringsKey {
        match self {
            Self::Static(s) => StringsKey::Static(s.as_ptr().addr(), s.len()),
            Self::Expanded(s) => StringsKey::Expanded(Rc::as_ptr(s).cast::<()>().addr()),
        }
    }
}

impl From<&'static [&'static str]> for TemplateStrings {
    fn from(value: &'static [&'static str]) -> Self {
        Self::Static(value)
    }
}

impl fmt::Debug for TemplateStrings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// An attribute slot of a [`TemplateNode::Element`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateAttribute {
    /// A fixed attribute.
    Static {
        /// Attribute name.
        name: Cow<'static, str>,
        /// Attribute value.
        value: Cow<'static, str>,
    },
    /// A hole bound as an attribute.
    Attribute(Cow<'static, str>),
    /// A hole bound as a property.
    Property(Cow<'static, str>),
    /// A hole bound as an event listener.
    Event(Cow<'static, str>),
    /// A hole bound to the element as a whole.
    Spread,
}

/// One node of a template's static structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateNode {
    /// An element.
    Element {
        /// Tag name.
        tag: Cow<'static, str>,
        /// Static attributes and attribute holes, in order.
        attributes: Vec<TemplateAttribute>,
        /// Child nodes.
        children: Vec<TemplateNode>,
    },
    /// Static text.
    Text(Cow<'static, str>),
    /// A static comment.
    Comment(Cow<'static, str>),
    /// A hole at a child position.
    ChildHole,
    /// A hole bound to the content of a text node.
    TextHole,
}

impl TemplateNode {
    /// Creates an element with no attributes or children.
    pub fn element(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a text node.
    pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
        Self::Text(text.into())
    }

    fn with_attribute(mut self, attribute: TemplateAttribute) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            attributes.push(attribute);
        }
        self
    }

    /// Adds a static attribute. Ignored on non-elements.
    #[must_use]
    pub fn attr(
        self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.with_attribute(TemplateAttribute::Static {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Adds an attribute hole.
    #[must_use]
    pub fn attribute_hole(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.with_attribute(TemplateAttribute::Attribute(name.into()))
    }

    /// Adds a property hole.
    #[must_use]
    pub fn property_hole(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.with_attribute(TemplateAttribute::Property(name.into()))
    }

    /// Adds an event hole.
    #[must_use]
    pub fn event_hole(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.with_attribute(TemplateAttribute::Event(name.into()))
    }

    /// Adds a spread hole.
    #[must_use]
    pub fn spread_hole(self) -> Self {
        self.with_attribute(TemplateAttribute::Spread)
    }

    /// Appends a child. Ignored on non-elements.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }
}

/// Kind of a template hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HoleKind {
    /// Bound as an attribute.
    Attribute,
    /// Bound as a property.
    Property,
    /// Bound as an event listener.
    Event,
    /// Bound to the element as a whole.
    Element,
    /// Bound at a child position.
    ChildNode,
    /// Bound to the content of a text node.
    Text,
}

/// A hole discovered in a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hole {
    /// What the hole binds to.
    pub kind: HoleKind,
    /// Preorder index of the node the hole belongs to.
    pub index: usize,
    /// Attribute, property or event name.
    pub name: Option<Rc<str>>,
}

/// Shared static structure of a template.
#[derive(Debug)]
pub struct Template {
    roots: Vec<TemplateNode>,
    holes: Vec<Hole>,
    mode: TemplateMode,
    node_count: usize,
    /// For each root, the hole that uses it as a child anchor.
    root_holes: Vec<Option<usize>>,
}

impl Template {
    /// Builds a template, recording its holes in document order.
    #[must_use]
    pub fn new(roots: Vec<TemplateNode>, mode: TemplateMode) -> Self {
        let mut holes = Vec::new();
        let mut index = 0;
        let mut root_indices = Vec::with_capacity(roots.len());
        for root in &roots {
            root_indices.push(index);
            collect_holes(root, &mut index, &mut holes);
        }
        let root_holes = root_indices
            .iter()
            .map(|i| {
                holes
                    .iter()
                    .position(|h| h.kind == HoleKind::ChildNode && h.index == *i)
            })
            .collect();
        Self {
            roots,
            holes,
            mode,
            node_count: index,
            root_holes,
        }
    }

    /// Builds a template from string segments alone.
    ///
    /// Every non-empty segment becomes a text node and every gap between two
    /// segments becomes a child hole. This is what
    /// [`Backend::parse_template`](crate::Backend::parse_template) uses when
    /// the host does not parse markup.
    #[must_use]
    pub fn from_segments(strings: &TemplateStrings, mode: TemplateMode) -> Self {
        let mut roots = Vec::new();
        let last = strings.len().saturating_sub(1);
        for (i, segment) in strings.iter().enumerate() {
            if !segment.is_empty() {
                roots.push(TemplateNode::Text(Cow::Owned(String::from(segment))));
            }
            if i < last {
                roots.push(TemplateNode::ChildHole);
            }
        }
        Self::new(roots, mode)
    }

    /// The holes in document order.
    #[must_use]
    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    /// The top-level nodes.
    #[must_use]
    pub fn roots(&self) -> &[TemplateNode] {
        &self.roots
    }

    /// The element namespace.
    #[must_use]
    pub fn mode(&self) -> TemplateMode {
        self.mode
    }

    pub(crate) fn root_hole(&self, root: usize) -> Option<usize> {
        self.root_holes.get(root).copied().flatten()
    }

    /// Creates detached host nodes for this template.
    ///
    /// Returns the root nodes and one part per hole, in hole order.
    pub fn instantiate(&self, host: &dyn HostTree) -> (Vec<NodeId>, Vec<Part>) {
        let mut nodes = Vec::with_capacity(self.node_count);
        let roots = self
            .roots
            .iter()
            .map(|root| create_node(root, self.mode, host, &mut nodes))
            .collect();
        let parts = self
            .holes
            .iter()
            .map(|hole| {
                let node = nodes[hole.index];
                let name = || hole.name.clone().unwrap_or_else(|| Rc::from(""));
                match hole.kind {
                    HoleKind::Attribute => Part::Attribute { node, name: name() },
                    HoleKind::Property => Part::Property { node, name: name() },
                    HoleKind::Event => Part::Event { node, name: name() },
                    HoleKind::Element => Part::Element { node },
                    HoleKind::ChildNode => Part::ChildNode { anchor: node },
                    HoleKind::Text => Part::Text { node },
                }
            })
            .collect();
        (roots, parts)
    }
}

fn collect_holes(node: &TemplateNode, index: &mut usize, holes: &mut Vec<Hole>) {
    let own = *index;
    *index += 1;
    match node {
        TemplateNode::Element {
            attributes,
            children,
            ..
        } => {
            for attribute in attributes {
                let (kind, name) = match attribute {
                    TemplateAttribute::Static { .. } => continue,
                    TemplateAttribute::Attribute(n) => (HoleKind::Attribute, Some(n)),
                    TemplateAttribute::Property(n) => (HoleKind::Property, Some(n)),
                    TemplateAttribute::Event(n) => (HoleKind::Event, Some(n)),
                    TemplateAttribute::Spread => (HoleKind::Element, None),
                };
                holes.push(Hole {
                    kind,
                    index: own,
                    name: name.map(|n| Rc::from(&**n)),
                });
            }
            for child in children {
                collect_holes(child, index, holes);
            }
        }
        TemplateNode::ChildHole => holes.push(Hole {
            kind: HoleKind::ChildNode,
            index: own,
            name: None,
        }),
        TemplateNode::TextHole => holes.push(Hole {
            kind: HoleKind::Text,
            index: own,
            name: None,
        }),
        TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
    }
}

fn create_node(
    node: &TemplateNode,
    mode: TemplateMode,
    host: &dyn HostTree,
    nodes: &mut Vec<NodeId>,
) -> NodeId {
    match node {
        TemplateNode::Element {
            tag,
            attributes,
            children,
        } => {
            let id = host.create_element(tag, mode);
            nodes.push(id);
            for attribute in attributes {
                if let TemplateAttribute::Static { name, value } = attribute {
                    host.set_attribute(id, name, Some(&**value));
                }
            }
            for child in children {
                let child = create_node(child, mode, host, nodes);
                host.append_child(id, child);
            }
            id
        }
        TemplateNode::Text(text) => {
            let id = host.create_text(text);
            nodes.push(id);
            id
        }
        TemplateNode::Comment(text) => {
            let id = host.create_comment(text);
            nodes.push(id);
            id
        }
        TemplateNode::ChildHole => {
            let id = host.create_comment("");
            nodes.push(id);
            id
        }
        TemplateNode::TextHole => {
            let id = host.create_text("");
            nodes.push(id);
            id
        }
    }
}

/// Where a [`TemplateResult`] gets its template from.
#[derive(Clone, Debug)]
pub enum TemplateSource {
    /// An already built template.
    Template(Rc<Template>),
    /// String segments resolved through the runtime's template cache.
    Lazy {
        /// The segments.
        strings: TemplateStrings,
        /// The element namespace.
        mode: TemplateMode,
    },
}

/// A template paired with the values for its holes.
#[derive(Clone, Debug)]
pub struct TemplateResult {
    source: TemplateSource,
    values: Vec<Value>,
}

impl TemplateResult {
    /// Pairs a built template with values.
    pub fn new(template: Rc<Template>, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            source: TemplateSource::Template(template),
            values: values.into_iter().collect(),
        }
    }

    /// Pairs string segments with values; the template is resolved at bind time.
    pub fn lazy(
        strings: impl Into<TemplateStrings>,
        mode: TemplateMode,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        Self {
            source: TemplateSource::Lazy {
                strings: strings.into(),
                mode,
            },
            values: values.into_iter().collect(),
        }
    }

    /// Shorthand for an HTML template from static segments.
    pub fn html(strings: &'static [&'static str], values: impl IntoIterator<Item = Value>) -> Self {
        Self::lazy(strings, TemplateMode::Html, values)
    }

    /// The template source.
    #[must_use]
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// The hole values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// An argument to [`Runtime::expand_literals`](crate::Runtime::expand_literals).
#[derive(Clone, Debug)]
pub enum TemplateArg {
    /// A dynamic value that stays a hole.
    Value(Value),
    /// Text spliced into the static segments, such as a dynamic tag name.
    Literal(Rc<str>),
}

impl TemplateArg {
    /// Creates a literal argument.
    pub fn literal(text: impl Into<Rc<str>>) -> Self {
        Self::Literal(text.into())
    }
}

impl From<Value> for TemplateArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Joins literal arguments into the neighbouring segments.
pub(crate) fn splice_segments(strings: &TemplateStrings, args: &[TemplateArg]) -> Vec<Rc<str>> {
    let mut segments = Vec::with_capacity(strings.len());
    let mut current = String::from(strings.get(0).unwrap_or_default());
    for (i, arg) in args.iter().enumerate() {
        let next = strings.get(i + 1).unwrap_or_default();
        match arg {
            TemplateArg::Literal(text) => {
                current.push_str(text);
                current.push_str(next);
            }
            TemplateArg::Value(_) => {
                segments.push(Rc::from(core::mem::take(&mut current)));
                current.push_str(next);
            }
        }
    }
    segments.push(Rc::from(current));
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use alloc::vec;

    fn card() -> Template {
        Template::new(
            vec![
                TemplateNode::element("div")
                    .attr("class", "card")
                    .attribute_hole("title")
                    .event_hole("click")
                    .child(TemplateNode::text("Hello "))
                    .child(TemplateNode::ChildHole)
                    .child(TemplateNode::element("input").property_hole("value").spread_hole()),
            ],
            TemplateMode::Html,
        )
    }

    #[test]
    fn holes_follow_document_order() {
        let template = card();
        let kinds: Vec<_> = template.holes().iter().map(|h| (h.kind, h.index)).collect();
        assert_eq!(
            kinds,
            [
                (HoleKind::Attribute, 0),
                (HoleKind::Event, 0),
                (HoleKind::ChildNode, 2),
                (HoleKind::Property, 3),
                (HoleKind::Element, 3),
            ]
        );
        assert_eq!(template.holes()[0].name.as_deref(), Some("title"));
        assert_eq!(template.holes()[4].name, None);
    }

    #[test]
    fn instantiate_creates_parts_per_hole() {
        let host = MemoryHost::new();
        let template = card();
        let (roots, parts) = template.instantiate(&host);
        assert_eq!(roots.len(), 1);
        assert_eq!(parts.len(), 5);
        assert_eq!(host.outer_html(roots[0]), "<div class=\"card\">Hello <input></input></div>");
        match &parts[2] {
            Part::ChildNode { anchor } => assert_eq!(host.parent(*anchor), Some(roots[0])),
            other => panic!("unexpected part {other:?}"),
        }
        assert_eq!(parts[0].name(), Some("title"));
    }

    #[test]
    fn segments_become_text_and_child_holes() {
        static STRINGS: &[&str] = &["<", "", ">"];
        let template = Template::from_segments(&TemplateStrings::Static(STRINGS), TemplateMode::Html);
        assert_eq!(template.holes().len(), 2);
        assert_eq!(template.roots().len(), 4);
        assert_eq!(template.root_hole(1), Some(0));
        assert_eq!(template.root_hole(0), None);
    }

    #[test]
    fn static_strings_identity_is_by_address() {
        static A: &[&str] = &["x", "y"];
        static B: &[&str] = &["x", "y", "z"];
        let a = TemplateStrings::Static(A);
        assert!(a.ptr_eq(&TemplateStrings::Static(A)));
        assert!(!a.ptr_eq(&TemplateStrings::Static(B)));

        let expanded: Rc<[Rc<str>]> = Rc::from(vec![Rc::from("x"), Rc::from("y")]);
        let copy: Rc<[Rc<str>]> = Rc::from(vec![Rc::from("x"), Rc::from("y")]);
        let e = TemplateStrings::Expanded(expanded.clone());
        assert!(e.ptr_eq(&TemplateStrings::Expanded(expanded)));
        assert!(!e.ptr_eq(&TemplateStrings::Expanded(copy)));
    }

    #[test]
    fn literals_are_spliced_into_segments() {
        static STRINGS: &[&str] = &["<", " class=", ">", "</", ">"];
        let args = [
            TemplateArg::literal("h1"),
            TemplateArg::from(Value::from("title")),
            TemplateArg::from(Value::from(1)),
            TemplateArg::literal("h1"),
        ];
        let segments = splice_segments(&TemplateStrings::Static(STRINGS), &args);
        let segments: Vec<&str> = segments.iter().map(|s| &**s).collect();
        assert_eq!(segments, ["<h1 class=", ">", "</h1>"]);
    }
}
