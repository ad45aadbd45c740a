use crate::dom::{Namespace, NodeId};
use crate::tag_name::TagName;

/// Where a foreign element meets HTML parsing rules again.
///
/// @see https://html.spec.whatwg.org/#mathml-text-integration-point
/// @see https://html.spec.whatwg.org/#html-integration-point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntegrationPoint {
    MathMl,
    Html,
}

/// An entry on the stack of open elements: the arena node the element
/// created, along with the identity needed for scope checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenElement {
    pub node: NodeId,
    pub tag: TagName,
    pub namespace: Namespace,
    pub integration_point: Option<IntegrationPoint>,
}

const ELEMENT_IN_SCOPE_TERMINATION_LIST: [(TagName, Namespace); 18] = [
    (TagName::APPLET, Namespace::Html),
    (TagName::CAPTION, Namespace::Html),
    (TagName::HTML, Namespace::Html),
    (TagName::TABLE, Namespace::Html),
    (TagName::TD, Namespace::Html),
    (TagName::TH, Namespace::Html),
    (TagName::MARQUEE, Namespace::Html),
    (TagName::OBJECT, Namespace::Html),
    (TagName::TEMPLATE, Namespace::Html),
    // MathML
    (TagName::MI, Namespace::MathMl),
    (TagName::MO, Namespace::MathMl),
    (TagName::MN, Namespace::MathMl),
    (TagName::MS, Namespace::MathMl),
    (TagName::MTEXT, Namespace::MathMl),
    (TagName::ANNOTATION_XML, Namespace::MathMl),
    // SVG
    (TagName::FOREIGNOBJECT, Namespace::Svg),
    (TagName::DESC, Namespace::Svg),
    (TagName::TITLE, Namespace::Svg),
];

/// The stack of open elements.
///
/// > Initially, the stack of open elements is empty. The stack grows
/// > downwards; the topmost node on the stack is the first one added
/// > to the stack, and the bottommost node of the stack is the most
/// > recently added node in the stack (notwithstanding when the stack
/// > is manipulated in a random access fashion as part of the handling
/// > for misnested tags).
///
/// @see https://html.spec.whatwg.org/#stack-of-open-elements
pub(crate) struct StackOfOpenElements {
    stack: Vec<OpenElement>,
}

impl StackOfOpenElements {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, element: OpenElement) {
        self.stack.push(element);
    }

    pub fn pop(&mut self) -> Option<OpenElement> {
        self.stack.pop()
    }

    pub fn current_node(&self) -> Option<&OpenElement> {
        self.stack.last()
    }

    pub fn count(&self) -> usize {
        self.stack.len()
    }

    /// The element at the given position counting from the top of the
    /// stack, where position 0 is the first element added.
    pub fn at(&self, index: usize) -> Option<&OpenElement> {
        self.stack.get(index)
    }

    pub fn replace_at(&mut self, index: usize, element: OpenElement) {
        self.stack[index] = element;
    }

    pub fn insert_at(&mut self, index: usize, element: OpenElement) {
        self.stack.insert(index, element);
    }

    pub fn remove_at(&mut self, index: usize) -> OpenElement {
        self.stack.remove(index)
    }

    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.stack.iter().position(|entry| entry.node == node)
    }

    pub fn contains(&self, tag_name: &TagName) -> bool {
        self.stack
            .iter()
            .any(|entry| Namespace::Html == entry.namespace && entry.tag == *tag_name)
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.stack.iter().any(|entry| entry.node == node)
    }

    /// Indicates if the current node is an HTML element of the given name.
    pub fn current_node_is(&self, tag_name: &TagName) -> bool {
        self.stack
            .last()
            .map(|entry| Namespace::Html == entry.namespace && entry.tag == *tag_name)
            .unwrap_or(false)
    }

    /// Steps through the stack of open elements, starting with the top
    /// element (added first) and walking downwards to the one added last.
    pub fn walk_down(&self) -> impl Iterator<Item = &OpenElement> {
        self.stack.iter()
    }

    /// Steps through the stack of open elements, starting with the bottom
    /// element (added last) and walking upwards to the one added first.
    pub fn walk_up(&self) -> impl Iterator<Item = &OpenElement> {
        self.stack.iter().rev()
    }

    fn has_element_in_specific_scope(
        &self,
        tag_name: &TagName,
        termination_list: &[(TagName, Namespace)],
    ) -> bool {
        for entry in self.walk_up() {
            if Namespace::Html == entry.namespace && entry.tag == *tag_name {
                return true;
            }

            if termination_list
                .iter()
                .any(|(tag, namespace)| *tag == entry.tag && *namespace == entry.namespace)
            {
                return false;
            }
        }
        false
    }

    /// Returns whether a particular element is in scope.
    ///
    /// > The stack of open elements is said to have a particular element in
    /// > scope when it has that element in the specific scope consisting of
    /// > the following element types:
    /// >
    /// >   - applet, caption, html, table, td, th, marquee, object, template
    /// >   - MathML mi, mo, mn, ms, mtext, annotation-xml
    /// >   - SVG foreignObject, desc, title
    ///
    /// @see https://html.spec.whatwg.org/#has-an-element-in-scope
    pub fn has_element_in_scope(&self, tag_name: &TagName) -> bool {
        self.has_element_in_specific_scope(tag_name, &ELEMENT_IN_SCOPE_TERMINATION_LIST)
    }

    /// Like [`Self::has_element_in_scope`], but for one specific node
    /// rather than any element of a given name. Misnesting repair needs
    /// this because the same name may appear on the stack repeatedly.
    pub fn has_node_in_scope(&self, node: NodeId) -> bool {
        for entry in self.walk_up() {
            if entry.node == node {
                return true;
            }

            if ELEMENT_IN_SCOPE_TERMINATION_LIST
                .iter()
                .any(|(tag, namespace)| *tag == entry.tag && *namespace == entry.namespace)
            {
                return false;
            }
        }
        false
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-list-item-scope
    pub fn has_element_in_list_item_scope(&self, tag_name: &TagName) -> bool {
        let mut termination_list = ELEMENT_IN_SCOPE_TERMINATION_LIST.to_vec();
        termination_list.push((TagName::OL, Namespace::Html));
        termination_list.push((TagName::UL, Namespace::Html));
        self.has_element_in_specific_scope(tag_name, &termination_list)
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-button-scope
    pub fn has_element_in_button_scope(&self, tag_name: &TagName) -> bool {
        let mut termination_list = ELEMENT_IN_SCOPE_TERMINATION_LIST.to_vec();
        termination_list.push((TagName::BUTTON, Namespace::Html));
        self.has_element_in_specific_scope(tag_name, &termination_list)
    }

    /// Returns whether a P is in BUTTON scope.
    pub fn has_p_in_button_scope(&self) -> bool {
        self.has_element_in_button_scope(&TagName::P)
    }

    /// Returns whether a particular element is in table scope.
    ///
    /// > The stack of open elements is said to have a particular element
    /// > in table scope when it has that element in the specific scope
    /// > consisting of the following element types:
    /// >
    /// >   - html in the HTML namespace
    /// >   - table in the HTML namespace
    /// >   - template in the HTML namespace
    ///
    /// @see https://html.spec.whatwg.org/#has-an-element-in-table-scope
    pub fn has_element_in_table_scope(&self, tag_name: &TagName) -> bool {
        self.has_element_in_specific_scope(
            tag_name,
            &[
                (TagName::HTML, Namespace::Html),
                (TagName::TABLE, Namespace::Html),
                (TagName::TEMPLATE, Namespace::Html),
            ],
        )
    }

    /// Returns whether a particular element is in select scope.
    ///
    /// > The stack of open elements is said to have a particular element
    /// > in select scope when it has that element in the specific scope
    /// > consisting of all element types except the following:
    /// >
    /// >   - optgroup in the HTML namespace
    /// >   - option in the HTML namespace
    ///
    /// @see https://html.spec.whatwg.org/#has-an-element-in-select-scope
    pub fn has_element_in_select_scope(&self, tag_name: &TagName) -> bool {
        for entry in self.walk_up() {
            if Namespace::Html == entry.namespace && entry.tag == *tag_name {
                return true;
            }

            if Namespace::Html != entry.namespace
                || !matches!(entry.tag, TagName::OPTGROUP | TagName::OPTION)
            {
                return false;
            }
        }
        false
    }

    pub fn has_any_h1_to_h6_element_in_scope(&self) -> bool {
        for entry in self.walk_up() {
            if Namespace::Html == entry.namespace && entry.tag.is_heading() {
                return true;
            }

            if ELEMENT_IN_SCOPE_TERMINATION_LIST
                .iter()
                .any(|(tag, namespace)| *tag == entry.tag && *namespace == entry.namespace)
            {
                return false;
            }
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn html(tag: TagName, node: u32) -> OpenElement {
        OpenElement {
            node: NodeId::from_index(node),
            tag,
            namespace: Namespace::Html,
            integration_point: None,
        }
    }

    #[test]
    fn test_scope_stops_at_termination_list() {
        let mut stack = StackOfOpenElements::new();
        stack.push(html(TagName::HTML, 1));
        stack.push(html(TagName::BODY, 2));
        stack.push(html(TagName::P, 3));
        stack.push(html(TagName::TABLE, 4));
        stack.push(html(TagName::TR, 5));

        assert!(stack.has_element_in_scope(&TagName::TABLE));
        assert!(!stack.has_element_in_scope(&TagName::P));
        assert!(!stack.has_element_in_table_scope(&TagName::P));
    }

    #[test]
    fn test_button_scope() {
        let mut stack = StackOfOpenElements::new();
        stack.push(html(TagName::HTML, 1));
        stack.push(html(TagName::BODY, 2));
        stack.push(html(TagName::P, 3));
        stack.push(html(TagName::BUTTON, 4));

        assert!(stack.has_element_in_scope(&TagName::P));
        assert!(!stack.has_p_in_button_scope());
    }

    #[test]
    fn test_select_scope_sees_only_option_chains() {
        let mut stack = StackOfOpenElements::new();
        stack.push(html(TagName::HTML, 1));
        stack.push(html(TagName::SELECT, 2));
        stack.push(html(TagName::OPTGROUP, 3));
        stack.push(html(TagName::OPTION, 4));

        assert!(stack.has_element_in_select_scope(&TagName::SELECT));

        stack.push(html(TagName::DIV, 5));
        assert!(!stack.has_element_in_select_scope(&TagName::SELECT));
    }
}
