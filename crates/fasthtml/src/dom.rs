//! An arena-allocated document tree.
//!
//! Nodes live in a single `Vec` owned by the [`Document`] and refer to
//! each other through [`NodeId`] indices. Detached nodes stay in the
//! arena; the tree structure is whatever the parent/children links say
//! it is. Node 0 is always the document node.

use std::fmt::Write as _;

use crate::quirks_mode::QuirksMode;
use crate::tag_name::TagName;

/// Index of a node within its [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const DOCUMENT: NodeId = NodeId(0);

    #[cfg(test)]
    pub(crate) fn from_index(index: u32) -> Self {
        NodeId(index)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    MathMl,
    Svg,
}

/// A parsed attribute. `value` is `None` for boolean attributes
/// written without a value, e.g. the `disabled` in `<input disabled>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: Box<[u8]>,
    pub value: Option<Box<[u8]>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: TagName,
    pub namespace: Namespace,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctypeData {
    pub name: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    Doctype(DoctypeData),
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// The output of a parse: a tree of elements, text, comments, and at
/// most one DOCTYPE, rooted at a document node.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    quirks_mode: QuirksMode,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            quirks_mode: QuirksMode::default(),
        }
    }

    /// The document node at the root of the tree.
    pub fn root(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    pub fn quirks_mode(&self) -> QuirksMode {
        self.quirks_mode
    }

    pub(crate) fn set_quirks_mode(&mut self, mode: QuirksMode) {
        self.quirks_mode = mode;
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    pub(crate) fn create_element(
        &mut self,
        tag: TagName,
        namespace: Namespace,
        attributes: Vec<Attribute>,
    ) -> NodeId {
        self.alloc(NodeKind::Element(ElementData {
            tag,
            namespace,
            attributes,
        }))
    }

    pub(crate) fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(NodeKind::Comment(text))
    }

    pub(crate) fn create_doctype(&mut self, doctype: DoctypeData) -> NodeId {
        self.alloc(NodeKind::Doctype(doctype))
    }

    /// Checks that `candidate` is not `node` or one of its ancestors.
    /// Inserting under a descendant would sever the node from the tree
    /// and leave a cycle, so insertion refuses to do it.
    fn is_inclusive_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(at) = cursor {
            if at == candidate {
                return true;
            }
            cursor = self.nodes[at.index()].parent;
        }
        false
    }

    /// Appends `child` as the last child of `parent`, detaching it
    /// from any previous parent first.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            !self.is_inclusive_ancestor(child, parent),
            "cannot append a node under its own descendant"
        );
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Inserts `child` into `parent` immediately before `reference`,
    /// which must be a child of `parent`.
    pub(crate) fn insert_before(&mut self, parent: NodeId, reference: NodeId, child: NodeId) {
        debug_assert!(
            !self.is_inclusive_ancestor(child, parent),
            "cannot insert a node under its own descendant"
        );
        self.detach(child);
        let at = self.nodes[parent.index()]
            .children
            .iter()
            .position(|&c| c == reference);
        match at {
            Some(at) => {
                self.nodes[child.index()].parent = Some(parent);
                self.nodes[parent.index()].children.insert(at, child);
            }
            None => self.append_child(parent, child),
        }
    }

    /// Unlinks a node from its parent. The node and its descendants
    /// remain in the arena and keep their own structure.
    pub(crate) fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != node);
        }
    }

    /// Moves every child of `from` to the end of `to`'s child list,
    /// preserving order.
    pub(crate) fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.index()].children);
        for &child in &children {
            self.nodes[child.index()].parent = Some(to);
        }
        self.nodes[to.index()].children.extend(children);
    }

    /// Inserts text at the given location, merging it into the
    /// adjacent text node when one is already there. Adjacent text
    /// nodes never survive in the finished tree regardless of how the
    /// input was chunked.
    pub(crate) fn insert_text(&mut self, parent: NodeId, before: Option<NodeId>, text: &str) {
        if text.is_empty() {
            return;
        }

        let siblings = &self.nodes[parent.index()].children;
        let neighbor_at = match before {
            Some(reference) => siblings.iter().position(|&c| c == reference),
            None => None,
        };
        let prior = match neighbor_at {
            Some(0) => None,
            Some(at) => Some(siblings[at - 1]),
            None => siblings.last().copied(),
        };

        if let Some(prior) = prior {
            if let NodeKind::Text(existing) = &mut self.nodes[prior.index()].kind {
                existing.push_str(text);
                return;
            }
        }

        let node = self.alloc(NodeKind::Text(text.to_string()));
        match before {
            Some(reference) => self.insert_before(parent, reference, node),
            None => self.append_child(parent, node),
        }
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.index()].kind
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.index()].children
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes[node.index()].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.index()].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&TagName> {
        self.element(node).map(|data| &data.tag)
    }

    /// Looks up an attribute value by its case-insensitive name.
    /// Returns `Some(None)` for boolean attributes.
    pub fn attribute(&self, node: NodeId, name: &[u8]) -> Option<Option<&[u8]>> {
        self.element(node)?
            .attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_deref())
    }

    /// The concatenated text of the node's text-node descendants, in
    /// tree order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        for at in self.descendants(node) {
            if let NodeKind::Text(text) = self.kind(at) {
                out.push_str(text);
            }
        }
        out
    }

    /// Iterates the node's descendants in tree (pre-)order, not
    /// including the node itself.
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        let mut stack = Vec::new();
        stack.extend(self.nodes[node.index()].children.iter().rev().copied());
        Descendants {
            document: self,
            stack,
        }
    }

    /// Serializes the tree in the html5lib-tests format: one node per
    /// line, each prefixed with `| ` and indented two spaces per depth.
    pub fn tree_representation(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_tree_line(&mut out, child, 0);
        }
        out
    }

    fn write_tree_line(&self, out: &mut String, node: NodeId, depth: usize) {
        let pad = "  ".repeat(depth);
        match self.kind(node) {
            NodeKind::Document => {}
            NodeKind::Element(data) => {
                let name = match data.namespace {
                    Namespace::Html => data.tag.to_string(),
                    Namespace::Svg => format!("svg {}", svg_tag_name(&data.tag.to_string())),
                    Namespace::MathMl => format!("math {}", data.tag),
                };
                let _ = writeln!(out, "| {pad}<{name}>");

                let mut attributes: Vec<&Attribute> = data.attributes.iter().collect();
                attributes.sort_by(|a, b| a.name.cmp(&b.name));
                for attribute in attributes {
                    let name = String::from_utf8_lossy(&attribute.name);
                    let value = attribute
                        .value
                        .as_deref()
                        .map(|v| String::from_utf8_lossy(v).into_owned())
                        .unwrap_or_default();
                    let _ = writeln!(out, "| {pad}  {name}=\"{value}\"");
                }
            }
            NodeKind::Text(text) => {
                let _ = writeln!(out, "| {pad}\"{text}\"");
            }
            NodeKind::Comment(text) => {
                let _ = writeln!(out, "| {pad}<!-- {text} -->");
            }
            NodeKind::Doctype(doctype) => {
                let name = doctype.name.as_deref().unwrap_or("");
                match (&doctype.public_id, &doctype.system_id) {
                    (None, None) => {
                        let _ = writeln!(out, "| {pad}<!DOCTYPE {name}>");
                    }
                    (public_id, system_id) => {
                        let _ = writeln!(
                            out,
                            "| {pad}<!DOCTYPE {name} \"{}\" \"{}\">",
                            public_id.as_deref().unwrap_or(""),
                            system_id.as_deref().unwrap_or("")
                        );
                    }
                }
            }
        }

        for &child in self.children(node) {
            self.write_tree_line(out, child, depth + 1);
        }
    }
}

/// The SVG element names which are case-normalized during parsing but
/// rendered back in camelCase.
///
/// @see https://html.spec.whatwg.org/#parsing-main-inforeign
const SVG_CAMEL_CASE_NAMES: &[(&str, &str)] = &[
    ("altglyph", "altGlyph"),
    ("altglyphdef", "altGlyphDef"),
    ("altglyphitem", "altGlyphItem"),
    ("animatecolor", "animateColor"),
    ("animatemotion", "animateMotion"),
    ("animatetransform", "animateTransform"),
    ("clippath", "clipPath"),
    ("feblend", "feBlend"),
    ("fecolormatrix", "feColorMatrix"),
    ("fecomponenttransfer", "feComponentTransfer"),
    ("fecomposite", "feComposite"),
    ("feconvolvematrix", "feConvolveMatrix"),
    ("fediffuselighting", "feDiffuseLighting"),
    ("fedisplacementmap", "feDisplacementMap"),
    ("fedistantlight", "feDistantLight"),
    ("fedropshadow", "feDropShadow"),
    ("feflood", "feFlood"),
    ("fefunca", "feFuncA"),
    ("fefuncb", "feFuncB"),
    ("fefuncg", "feFuncG"),
    ("fefuncr", "feFuncR"),
    ("fegaussianblur", "feGaussianBlur"),
    ("feimage", "feImage"),
    ("femerge", "feMerge"),
    ("femergenode", "feMergeNode"),
    ("femorphology", "feMorphology"),
    ("feoffset", "feOffset"),
    ("fepointlight", "fePointLight"),
    ("fespecularlighting", "feSpecularLighting"),
    ("fespotlight", "feSpotLight"),
    ("fetile", "feTile"),
    ("feturbulence", "feTurbulence"),
    ("foreignobject", "foreignObject"),
    ("glyphref", "glyphRef"),
    ("lineargradient", "linearGradient"),
    ("radialgradient", "radialGradient"),
    ("textpath", "textPath"),
];

fn svg_tag_name(lowercase: &str) -> &str {
    SVG_CAMEL_CASE_NAMES
        .iter()
        .find(|(folded, _)| *folded == lowercase)
        .map(|(_, camel_case)| *camel_case)
        .unwrap_or(lowercase)
}

pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.document.children(next).iter().rev().copied());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn div(doc: &mut Document) -> NodeId {
        doc.create_element(TagName::DIV, Namespace::Html, vec![])
    }

    #[test]
    fn append_and_detach_maintain_links() {
        let mut doc = Document::new();
        let a = div(&mut doc);
        let b = div(&mut doc);
        doc.append_child(doc.root(), a);
        doc.append_child(a, b);

        assert_eq!(doc.parent(b), Some(a));
        assert_eq!(doc.children(a), &[b]);

        doc.detach(b);
        assert_eq!(doc.parent(b), None);
        assert!(doc.children(a).is_empty());
    }

    #[test]
    fn insert_before_places_node_among_siblings() {
        let mut doc = Document::new();
        let parent = div(&mut doc);
        let first = div(&mut doc);
        let second = div(&mut doc);
        doc.append_child(doc.root(), parent);
        doc.append_child(parent, second);
        doc.insert_before(parent, second, first);

        assert_eq!(doc.children(parent), &[first, second]);
    }

    #[test]
    fn adjacent_text_coalesces() {
        let mut doc = Document::new();
        let parent = div(&mut doc);
        doc.append_child(doc.root(), parent);

        doc.insert_text(parent, None, "Hello, ");
        doc.insert_text(parent, None, "World");
        doc.insert_text(parent, None, "");

        assert_eq!(doc.children(parent).len(), 1);
        assert_eq!(doc.text_content(parent), "Hello, World");
    }

    #[test]
    fn move_children_preserves_order() {
        let mut doc = Document::new();
        let from = div(&mut doc);
        let to = div(&mut doc);
        let a = div(&mut doc);
        let b = div(&mut doc);
        doc.append_child(from, a);
        doc.append_child(from, b);

        doc.move_children(from, to);
        assert!(doc.children(from).is_empty());
        assert_eq!(doc.children(to), &[a, b]);
        assert_eq!(doc.parent(a), Some(to));
    }

    #[test]
    fn descendants_walk_in_tree_order() {
        let mut doc = Document::new();
        let a = div(&mut doc);
        let b = div(&mut doc);
        let c = div(&mut doc);
        doc.append_child(doc.root(), a);
        doc.append_child(a, b);
        doc.append_child(a, c);

        let order: Vec<NodeId> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn tree_representation_format() {
        let mut doc = Document::new();
        let html = doc.create_element(TagName::HTML, Namespace::Html, vec![]);
        let body = doc.create_element(TagName::BODY, Namespace::Html, vec![]);
        let p = doc.create_element(
            TagName::P,
            Namespace::Html,
            vec![Attribute {
                name: b"class".as_slice().into(),
                value: Some(b"intro".as_slice().into()),
            }],
        );
        doc.append_child(doc.root(), html);
        doc.append_child(html, body);
        doc.append_child(body, p);
        doc.insert_text(p, None, "Hi");

        assert_eq!(
            doc.tree_representation(),
            "| <html>\n|   <body>\n|     <p>\n|       class=\"intro\"\n|       \"Hi\"\n"
        );
    }
}
