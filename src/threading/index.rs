//! Conversation reconstruction
//!
//! Turns a flat, denormalized message list into a [`ThreadIndex`]: every
//! message keyed by id, reply chains linked parent → child, thread children
//! grouped under their thread starter, and the root messages that start each
//! rendered subtree.
//!
//! ## Root Classification
//!
//! - no `reply_to_id` and no `thread_id` → root
//! - `reply_to_id` that does not resolve inside the set → root (demoted)
//! - `reply_to_id` that resolves → reply child of that message
//! - `thread_id` only → reachable solely through its thread starter
//!
//! Construction never recurses, so self-replies and reply cycles cannot loop.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use super::node::{Node, ThreadIndex};
use crate::models::Message;

/// Build the reply/thread index for one rendering request.
///
/// Duplicate ids collapse into one node: the last occurrence supplies the
/// message data, the first occurrence fixes its position.
pub fn build_index(messages: &[Message]) -> ThreadIndex<'_> {
    let mut nodes: HashMap<&str, Node<'_>> = HashMap::with_capacity(messages.len());
    let mut order: Vec<&str> = Vec::with_capacity(messages.len());

    // Pass 1: index every message
    for message in messages {
        match nodes.entry(message.id.as_str()) {
            Entry::Occupied(mut existing) => existing.get_mut().message = message,
            Entry::Vacant(slot) => {
                order.push(message.id.as_str());
                slot.insert(Node::new(message));
            }
        }
    }

    let mut thread_children: HashMap<&str, Vec<&str>> = HashMap::new();
    for &id in &order {
        if let Some(thread_id) = nodes[id].message.thread_ref() {
            thread_children.entry(thread_id).or_default().push(id);
        }
    }

    // Pass 2: link replies and collect roots
    let mut roots = Vec::new();
    let mut parents: HashMap<&str, &str> = HashMap::new();

    for &id in &order {
        let message = nodes[id].message;
        match message.reply_ref() {
            Some(parent_id) => match nodes.get_mut(parent_id) {
                Some(parent) => {
                    parent.replies.push(id);
                    parents.insert(id, parent_id);
                }
                None => roots.push(id),
            },
            None if message.thread_ref().is_none() => roots.push(id),
            None => {}
        }
    }

    for (id, indent) in resolve_indents(&order, &parents) {
        if let Some(node) = nodes.get_mut(id) {
            node.indent = indent;
        }
    }

    ThreadIndex {
        nodes,
        thread_children,
        roots,
        order,
    }
}

/// Compute each message's depth as its parent's depth plus one.
///
/// Walks up the parent chain from every unresolved message until it reaches
/// a message without a parent, a message whose depth is already known, or a
/// message already on the current chain. In the last case the chain is a
/// reply cycle and the message that closes it is anchored at depth 0.
///
/// ## Example
///
/// ```text
/// A ← B ← C        A = 0, B = 1, C = 2 (independent of input order)
/// X ← Y ← X        walk from X: [X, Y], Y's parent X is on the chain → Y = 0, X = 1
/// ```
fn resolve_indents<'a>(
    order: &[&'a str],
    parents: &HashMap<&'a str, &'a str>,
) -> HashMap<&'a str, usize> {
    let mut resolved: HashMap<&'a str, usize> = HashMap::with_capacity(order.len());

    for &start in order {
        if resolved.contains_key(start) {
            continue;
        }

        let mut chain: Vec<&'a str> = Vec::new();
        let mut on_chain: HashSet<&'a str> = HashSet::new();
        let mut current = start;

        let mut depth = loop {
            if let Some(&known) = resolved.get(current) {
                break known + 1;
            }
            if !on_chain.insert(current) {
                break 0;
            }
            chain.push(current);
            match parents.get(current) {
                Some(&parent) => current = parent,
                None => break 0,
            }
        };

        for &id in chain.iter().rev() {
            resolved.insert(id, depth);
            depth += 1;
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_message(id: &str, reply_to: Option<&str>, thread: Option<&str>) -> Message {
        let base = Utc.with_ymd_and_hms(2025, 4, 3, 12, 0, 0).unwrap();
        let offset = id.bytes().map(i64::from).sum::<i64>();
        let mut message = Message::new(id, base + Duration::seconds(offset));
        message.content = format!("message {id}");
        message.reply_to_id = reply_to.map(str::to_string);
        message.thread_id = thread.map(str::to_string);
        message
    }

    #[test]
    fn test_plain_messages_are_roots() {
        let messages = vec![
            create_test_message("A", None, None),
            create_test_message("B", None, None),
        ];
        let index = build_index(&messages);

        assert_eq!(index.roots(), &["A", "B"]);
        assert_eq!(index.node("A").unwrap().indent, 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_reply_chain_links_and_indents() {
        // A ← B ← C
        let messages = vec![
            create_test_message("A", None, None),
            create_test_message("B", Some("A"), None),
            create_test_message("C", Some("B"), None),
        ];
        let index = build_index(&messages);

        assert_eq!(index.roots(), &["A"]);
        assert_eq!(index.node("A").unwrap().replies, vec!["B"]);
        assert_eq!(index.node("B").unwrap().replies, vec!["C"]);
        assert_eq!(index.node("A").unwrap().indent, 0);
        assert_eq!(index.node("B").unwrap().indent, 1);
        assert_eq!(index.node("C").unwrap().indent, 2);
    }

    #[test]
    fn test_indent_independent_of_input_order() {
        let messages = vec![
            create_test_message("C", Some("B"), None),
            create_test_message("B", Some("A"), None),
            create_test_message("A", None, None),
        ];
        let index = build_index(&messages);

        assert_eq!(index.node("A").unwrap().indent, 0);
        assert_eq!(index.node("B").unwrap().indent, 1);
        assert_eq!(index.node("C").unwrap().indent, 2);
    }

    #[test]
    fn test_dangling_reply_becomes_root() {
        let messages = vec![
            create_test_message("A", None, None),
            create_test_message("B", Some("missing"), None),
        ];
        let index = build_index(&messages);

        assert_eq!(index.roots(), &["A", "B"]);
        assert_eq!(index.node("B").unwrap().indent, 0);
    }

    #[test]
    fn test_dangling_reply_inside_thread_is_still_root() {
        let messages = vec![create_test_message("B", Some("missing"), Some("T"))];
        let index = build_index(&messages);

        assert_eq!(index.roots(), &["B"]);
        assert_eq!(index.thread_children("T"), Some(&["B"][..]));
    }

    #[test]
    fn test_thread_only_message_is_not_root() {
        let messages = vec![
            create_test_message("T", None, None),
            create_test_message("X", None, Some("T")),
            create_test_message("Y", None, Some("T")),
        ];
        let index = build_index(&messages);

        assert_eq!(index.roots(), &["T"]);
        assert_eq!(index.thread_children("T"), Some(&["X", "Y"][..]));
        assert!(index.thread_children("X").is_none());
    }

    #[test]
    fn test_reply_and_thread_child_recorded_together() {
        let messages = vec![
            create_test_message("T", None, None),
            create_test_message("R", Some("T"), Some("T")),
        ];
        let index = build_index(&messages);

        assert_eq!(index.node("T").unwrap().replies, vec!["R"]);
        assert_eq!(index.thread_children("T"), Some(&["R"][..]));
        assert_eq!(index.roots(), &["T"]);
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let messages = vec![
            create_test_message("A", Some("B"), None),
            create_test_message("B", Some("A"), None),
        ];
        let index = build_index(&messages);

        assert!(index.roots().is_empty());
        assert_eq!(index.node("A").unwrap().replies, vec!["B"]);
        assert_eq!(index.node("B").unwrap().replies, vec!["A"]);
        assert_eq!(index.node("B").unwrap().indent, 0);
        assert_eq!(index.node("A").unwrap().indent, 1);
    }

    #[test]
    fn test_self_reply_terminates() {
        let messages = vec![create_test_message("A", Some("A"), None)];
        let index = build_index(&messages);

        assert!(index.roots().is_empty());
        assert_eq!(index.node("A").unwrap().replies, vec!["A"]);
        assert_eq!(index.node("A").unwrap().indent, 0);
    }

    #[test]
    fn test_duplicate_ids_collapse_to_last_data() {
        let mut first = create_test_message("A", None, None);
        first.content = "first".to_string();
        let mut second = create_test_message("A", None, None);
        second.content = "second".to_string();
        let messages = vec![first, create_test_message("B", Some("A"), None), second];

        let index = build_index(&messages);

        assert_eq!(index.len(), 2);
        assert_eq!(index.ids(), &["A", "B"]);
        assert_eq!(index.roots(), &["A"]);
        assert_eq!(index.node("A").unwrap().message.content, "second");
        assert_eq!(index.node("A").unwrap().replies, vec!["B"]);
    }

    #[test]
    fn test_empty_strings_are_absent_references() {
        let mut message = create_test_message("A", None, None);
        message.reply_to_id = Some(String::new());
        message.thread_id = Some(String::new());
        let messages = vec![message];

        let index = build_index(&messages);

        assert_eq!(index.roots(), &["A"]);
        assert!(index.thread_children("").is_none());
    }

    #[test]
    fn test_empty_input() {
        let index = build_index(&[]);
        assert!(index.is_empty());
        assert!(index.roots().is_empty());
    }
}
