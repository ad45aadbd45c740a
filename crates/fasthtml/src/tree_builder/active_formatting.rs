use crate::dom::{Attribute, NodeId};
use crate::tag_name::TagName;

/// An entry in the list of active formatting elements.
///
/// Element entries remember the tag name and attributes of the token
/// which created them, so that further elements can be created for
/// that token if reconstruction or the adoption agency requires it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FormattingEntry {
    Marker,
    Element {
        node: NodeId,
        tag: TagName,
        attributes: Vec<Attribute>,
    },
}

impl FormattingEntry {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            FormattingEntry::Element { node, .. } => Some(*node),
            FormattingEntry::Marker => None,
        }
    }
}

/// The list of active formatting elements.
///
/// > Initially, the list of active formatting elements is empty.
/// > It is used to handle mis-nested formatting element tags.
/// >
/// > The list contains elements in the formatting category, and markers.
/// > The markers are inserted when entering applet, object, marquee,
/// > template, td, th, and caption elements, and are used to prevent
/// > formatting from "leaking" into applet, object, marquee, template,
/// > td, th, and caption elements.
///
/// @see https://html.spec.whatwg.org/#list-of-active-formatting-elements
pub(crate) struct ActiveFormattingElements {
    entries: Vec<FormattingEntry>,
}

impl ActiveFormattingElements {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn at(&self, index: usize) -> Option<&FormattingEntry> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&FormattingEntry> {
        self.entries.last()
    }

    /// Inserts a "marker" at the end of the list of active formatting elements.
    ///
    /// @see https://html.spec.whatwg.org/#concept-parser-marker
    pub fn insert_marker(&mut self) {
        self.entries.push(FormattingEntry::Marker);
    }

    /// Pushes an element onto the list of active formatting elements,
    /// enforcing the "Noah's Ark clause."
    ///
    /// > If there are already three elements in the list of active
    /// > formatting elements after the last marker, if any, or anywhere
    /// > in the list if there are no markers, that have the same tag
    /// > name, namespace, and attributes as element, then remove the
    /// > earliest such element from the list of active formatting
    /// > elements.
    ///
    /// @see https://html.spec.whatwg.org/#push-onto-the-list-of-active-formatting-elements
    pub fn push(&mut self, node: NodeId, tag: TagName, attributes: Vec<Attribute>) {
        let mut matching = Vec::new();
        for (index, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => break,
                FormattingEntry::Element {
                    tag: entry_tag,
                    attributes: entry_attributes,
                    ..
                } if *entry_tag == tag && *entry_attributes == attributes => {
                    matching.push(index);
                }
                FormattingEntry::Element { .. } => {}
            }
        }
        if matching.len() >= 3 {
            // `matching` is in reverse order; the last item is the earliest.
            self.entries.remove(matching[matching.len() - 1]);
        }

        self.entries.push(FormattingEntry::Element {
            node,
            tag,
            attributes,
        });
    }

    pub fn insert_at(&mut self, index: usize, entry: FormattingEntry) {
        self.entries.insert(index, entry);
    }

    pub fn replace_at(&mut self, index: usize, entry: FormattingEntry) {
        self.entries[index] = entry;
    }

    pub fn remove_at(&mut self, index: usize) -> FormattingEntry {
        self.entries.remove(index)
    }

    /// Clears the list of active formatting elements up to the last marker.
    ///
    /// > When the steps below require the UA to clear the list of active
    /// > formatting elements up to the last marker, the UA must perform
    /// > the following steps:
    /// >
    /// > 1. Let entry be the last (most recently added) entry in the list
    /// >    of active formatting elements.
    /// > 2. Remove entry from the list of active formatting elements.
    /// > 3. If entry was a marker, then stop the algorithm at this point.
    /// >    The list has been cleared up to the last marker.
    /// > 4. Go to step 1.
    ///
    /// @see https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker
    pub fn clear_up_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if FormattingEntry::Marker == entry {
                break;
            }
        }
    }

    /// Finds the most recent element entry with the given tag name which
    /// appears after the last marker, returning its index.
    pub fn find_after_last_marker(&self, tag: &TagName) -> Option<usize> {
        for (index, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => return None,
                FormattingEntry::Element { tag: entry_tag, .. } if entry_tag == tag => {
                    return Some(index);
                }
                FormattingEntry::Element { .. } => {}
            }
        }
        None
    }

    pub fn index_of_node(&self, node: NodeId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.node() == Some(node))
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.index_of_node(node).is_some()
    }

    pub fn remove_node(&mut self, node: NodeId) -> bool {
        match self.index_of_node(node) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<Attribute> {
        pairs
            .iter()
            .map(|(name, value)| Attribute {
                name: name.as_bytes().into(),
                value: Some(value.as_bytes().into()),
            })
            .collect()
    }

    #[test]
    fn test_noahs_ark_removes_earliest_of_four() {
        let mut list = ActiveFormattingElements::new();
        for index in 0..4 {
            list.push(
                NodeId::from_index(index + 1),
                TagName::B,
                attrs(&[("class", "x")]),
            );
        }

        assert_eq!(list.count(), 3);
        // The earliest entry was dropped.
        assert!(!list.contains_node(NodeId::from_index(1)));
        assert!(list.contains_node(NodeId::from_index(4)));
    }

    #[test]
    fn test_noahs_ark_distinguishes_attributes() {
        let mut list = ActiveFormattingElements::new();
        for index in 0..3 {
            list.push(NodeId::from_index(index + 1), TagName::B, attrs(&[]));
        }
        list.push(
            NodeId::from_index(10),
            TagName::B,
            attrs(&[("class", "different")]),
        );

        assert_eq!(list.count(), 4);
    }

    #[test]
    fn test_marker_bounds_noahs_ark_and_clearing() {
        let mut list = ActiveFormattingElements::new();
        for index in 0..3 {
            list.push(NodeId::from_index(index + 1), TagName::EM, attrs(&[]));
        }
        list.insert_marker();
        for index in 0..3 {
            list.push(NodeId::from_index(index + 10), TagName::EM, attrs(&[]));
        }

        // Entries before the marker don't count toward the limit.
        assert_eq!(list.count(), 7);

        list.clear_up_to_last_marker();
        assert_eq!(list.count(), 3);
        assert!(list.contains_node(NodeId::from_index(1)));
    }

    #[test]
    fn test_find_after_last_marker_stops_at_marker() {
        let mut list = ActiveFormattingElements::new();
        list.push(NodeId::from_index(1), TagName::A, attrs(&[]));
        list.insert_marker();
        list.push(NodeId::from_index(2), TagName::B, attrs(&[]));

        assert_eq!(list.find_after_last_marker(&TagName::B), Some(2));
        assert_eq!(list.find_after_last_marker(&TagName::A), None);
    }
}
