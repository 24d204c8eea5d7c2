use regex::Regex;

use super::graph::Node;

/// Escape sequences DOT uses for line breaks inside labels
const LINE_BREAK_MARKERS: [&str; 2] = ["\\l", "\\n"];

type Rule = fn(&NameResolver, &Node) -> Option<String>;

/// Turns graph nodes into canonical function names.
///
/// Rules are tried in order and the first one that yields a non-empty name wins:
/// markup label text, plain label text, identifier-shaped part of the node id,
/// and finally the node id unchanged.
pub struct NameResolver {
    /// First text enclosed by an open/close tag pair
    markup_regex: Regex,

    /// Identifier-shaped substring of a node id
    identifier_regex: Regex,
}

impl NameResolver {
    const RULES: [Rule; 4] = [
        NameResolver::markup_label,
        NameResolver::plain_label,
        NameResolver::identifier_token,
        NameResolver::raw_identifier,
    ];

    pub fn new() -> Self {
        Self {
            markup_regex: Regex::new(r"<[^>]*>([^<]+)</[^>]*>").expect("Invalid markup regex"),
            identifier_regex: Regex::new(r"[a-zA-Z_][a-zA-Z0-9_]*")
                .expect("Invalid identifier regex"),
        }
    }

    /// Canonical name for a node; never fails
    pub fn resolve(&self, node: &Node) -> String {
        Self::RULES
            .iter()
            .find_map(|rule| rule(self, node).filter(|name| !name.is_empty()))
            .unwrap_or_else(|| node.identifier.clone())
    }

    /// Label cut at the leftmost line-break marker, if anything usable remains
    fn single_line_label(node: &Node) -> Option<&str> {
        let label = node.raw_label.as_deref()?;
        let cut = LINE_BREAK_MARKERS
            .iter()
            .filter_map(|marker| label.find(marker))
            .min()
            .unwrap_or(label.len());
        let candidate = &label[..cut];

        if candidate.trim().is_empty() {
            None
        } else {
            Some(candidate)
        }
    }

    fn markup_label(&self, node: &Node) -> Option<String> {
        let candidate = Self::single_line_label(node)?;
        if !(candidate.contains('<') && candidate.contains('>')) {
            return None;
        }
        self.markup_regex
            .captures(candidate)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn plain_label(&self, node: &Node) -> Option<String> {
        Self::single_line_label(node).map(str::to_string)
    }

    fn identifier_token(&self, node: &Node) -> Option<String> {
        self.identifier_regex
            .find(&node.identifier)
            .map(|m| m.as_str().to_string())
    }

    fn raw_identifier(&self, node: &Node) -> Option<String> {
        Some(node.identifier.clone())
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(node: Node) -> String {
        NameResolver::new().resolve(&node)
    }

    #[test]
    fn test_label_is_cut_at_line_break() {
        assert_eq!(resolve(Node::with_label("Node1", r"foo\lbar")), "foo");
        assert_eq!(resolve(Node::with_label("Node1", r"foo\nbar")), "foo");
        assert_eq!(
            resolve(Node::with_label("Node1", r"external_signal_handler\l_adv_mode")),
            "external_signal_handler"
        );
    }

    #[test]
    fn test_leftmost_marker_wins() {
        assert_eq!(resolve(Node::with_label("n", r"a\nb\lc")), "a");
        assert_eq!(resolve(Node::with_label("n", r"a\lb\nc")), "a");
    }

    #[test]
    fn test_markup_label_uses_inner_text() {
        assert_eq!(resolve(Node::with_label("n", "<tag>inner</tag>")), "inner");
        assert_eq!(resolve(Node::with_label("n", "<<b>run</b>>")), "run");
        assert_eq!(
            resolve(Node::with_label("n", r#"<font color="red">handler</font>\lmore"#)),
            "handler"
        );
    }

    #[test]
    fn test_markup_without_tag_pair_keeps_label() {
        assert_eq!(
            resolve(Node::with_label("n", "std::vector<int>")),
            "std::vector<int>"
        );
    }

    #[test]
    fn test_unlabeled_node_uses_identifier_token() {
        assert_eq!(resolve(Node::new("Node42_helper")), "Node42_helper");
        assert_eq!(resolve(Node::new("42:entry-point")), "entry");
    }

    #[test]
    fn test_blank_label_falls_through_to_identifier() {
        assert_eq!(resolve(Node::with_label("Node7", "")), "Node7");
        assert_eq!(resolve(Node::with_label("Node7", r"\lrest")), "Node7");
    }

    #[test]
    fn test_identifier_without_word_is_returned_raw() {
        assert_eq!(resolve(Node::new("123-456")), "123-456");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = NameResolver::new();
        let node = Node::with_label("Node3", r"<i>io</i>\lread");
        assert_eq!(resolver.resolve(&node), resolver.resolve(&node));
    }
}
