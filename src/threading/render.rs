//! Transcript rendering
//!
//! Produces the plain-text transcript consumed by API clients, the summarizer
//! and the email digest. Two strategies share one per-message line format:
//!
//! ```text
//! [2025-04-03 12:00:00] alice: hello
//!   [Embed]
//!     Title: Release notes
//!     URL: https://example.com/notes
//!   [Attachment: https://cdn.example.com/log.txt]
//! ```
//!
//! Every line of a message (including its annotations) is prefixed by two
//! spaces per indent level.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::node::ThreadIndex;
use crate::models::Message;

/// Placeholder used when a message has no author name.
pub const UNKNOWN_AUTHOR: &str = "Unknown User";

/// Canonical timestamp layout for every transcript line (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INDENT_UNIT: &str = "  ";

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Format one message and its annotations at the given depth.
///
/// The result has no trailing newline.
pub fn format_message(message: &Message, indent: usize) -> String {
    let prefix = INDENT_UNIT.repeat(indent);
    let username = message
        .author_username
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR);

    let mut output = format!(
        "{prefix}[{}] {}: {}",
        format_timestamp(&message.created_at),
        username,
        message.content
    );

    for embed in &message.embeds {
        output.push('\n');
        output.push_str(&prefix);
        output.push_str("  [Embed]");
        let fields = [
            ("Title", &embed.title),
            ("Description", &embed.description),
            ("URL", &embed.url),
        ];
        for (label, value) in fields {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                output.push_str(&format!("\n{prefix}    {label}: {value}"));
            }
        }
    }

    for attachment in &message.attachments {
        output.push_str(&format!("\n{prefix}  [Attachment: {}]", attachment.url));
    }

    output
}

fn push_message(output: &mut String, message: &Message, indent: usize) {
    output.push_str(&format_message(message, indent));
    output.push('\n');
}

/// Render messages linearly, in the order supplied, without indentation.
pub fn render_flat(messages: &[Message]) -> String {
    let mut output = String::new();
    for message in messages {
        push_message(&mut output, message, 0);
    }
    output
}

enum Step<'a> {
    /// Emit a node, then its reply subtrees, then its thread children
    Expand(&'a str),
    /// Emit the thread children of a thread starter one level below it
    ThreadChildren(&'a str),
}

/// Render every root subtree of the index.
///
/// Within one root the visited set suppresses repeats (and breaks cycles);
/// a fresh set is started for each root, so a message reachable from two
/// different roots is rendered under both.
///
/// Thread children are rendered one level below their starter without
/// descending into their own replies.
///
/// ## Algorithm
///
/// Iterative depth-first walk with an explicit stack, so reply chains of any
/// length render without growing the call stack. Pushing `ThreadChildren`
/// before the replies (in reverse) reproduces the pre-order
/// node → replies → thread children sequence.
pub fn render_threaded(index: &ThreadIndex<'_>) -> String {
    let mut output = String::new();

    for &root_id in index.roots() {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![Step::Expand(root_id)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Expand(id) => {
                    if !visited.insert(id) {
                        continue;
                    }
                    let Some(node) = index.node(id) else {
                        continue;
                    };

                    push_message(&mut output, node.message, node.indent);

                    stack.push(Step::ThreadChildren(id));
                    for &reply_id in node.replies.iter().rev() {
                        stack.push(Step::Expand(reply_id));
                    }
                }
                Step::ThreadChildren(starter_id) => {
                    let (Some(starter), Some(children)) =
                        (index.node(starter_id), index.thread_children(starter_id))
                    else {
                        continue;
                    };

                    for &child_id in children {
                        if !visited.insert(child_id) {
                            continue;
                        }
                        if let Some(child) = index.node(child_id) {
                            push_message(&mut output, child.message, starter.indent + 1);
                        }
                    }
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, Embed};
    use crate::threading::build_index;
    use chrono::{Duration, TimeZone};

    fn create_test_message(
        id: &str,
        author: &str,
        minute: i64,
        reply_to: Option<&str>,
        thread: Option<&str>,
    ) -> Message {
        let base = Utc.with_ymd_and_hms(2025, 4, 3, 12, 0, 0).unwrap();
        let mut message = Message::new(id, base + Duration::minutes(minute));
        message.author_username = Some(author.to_string());
        message.content = format!("msg {id}");
        message.reply_to_id = reply_to.map(str::to_string);
        message.thread_id = thread.map(str::to_string);
        message
    }

    fn rendered_ids(output: &str) -> Vec<String> {
        output
            .lines()
            .filter_map(|line| line.split("msg ").nth(1))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_format_plain_message() {
        let message = create_test_message("1", "alice", 0, None, None);
        assert_eq!(
            format_message(&message, 0),
            "[2025-04-03 12:00:00] alice: msg 1"
        );
    }

    #[test]
    fn test_format_defaults_for_missing_fields() {
        let mut message = create_test_message("1", "alice", 0, None, None);
        message.author_username = None;
        message.content = String::new();

        assert_eq!(
            format_message(&message, 0),
            "[2025-04-03 12:00:00] Unknown User: "
        );
    }

    #[test]
    fn test_format_annotations_follow_indent() {
        let mut message = create_test_message("1", "bob", 5, None, None);
        message.embeds.push(Embed {
            kind: "rich".to_string(),
            title: Some("Release".to_string()),
            description: None,
            url: Some("https://example.com/r".to_string()),
        });
        message.attachments.push(Attachment {
            id: None,
            url: "https://cdn.example.com/a.png".to_string(),
            name: Some("a.png".to_string()),
            size: Some(42),
        });

        let expected = [
            "    [2025-04-03 12:05:00] bob: msg 1",
            "      [Embed]",
            "        Title: Release",
            "        URL: https://example.com/r",
            "      [Attachment: https://cdn.example.com/a.png]",
        ]
        .join("\n");
        assert_eq!(format_message(&message, 2), expected);
    }

    #[test]
    fn test_embed_without_fields_renders_marker_only() {
        let mut message = create_test_message("1", "bob", 0, None, None);
        message.embeds.push(Embed {
            kind: "image".to_string(),
            title: None,
            description: Some(String::new()),
            url: None,
        });

        assert_eq!(
            format_message(&message, 0),
            "[2025-04-03 12:00:00] bob: msg 1\n  [Embed]"
        );
    }

    #[test]
    fn test_flat_keeps_input_order_without_indent() {
        let messages = vec![
            create_test_message("2", "bob", 1, Some("1"), None),
            create_test_message("1", "alice", 0, None, None),
        ];
        let output = render_flat(&messages);

        assert_eq!(
            output,
            "[2025-04-03 12:01:00] bob: msg 2\n[2025-04-03 12:00:00] alice: msg 1\n"
        );
        assert_eq!(render_flat(&messages), output);
    }

    #[test]
    fn test_flat_empty() {
        assert_eq!(render_flat(&[]), "");
    }

    #[test]
    fn test_threaded_reply_chain_nesting() {
        let messages = vec![
            create_test_message("A", "alice", 0, None, None),
            create_test_message("B", "bob", 1, Some("A"), None),
            create_test_message("C", "carol", 2, Some("B"), None),
        ];
        let index = build_index(&messages);
        let output = render_threaded(&index);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[2025-04-03 12:00:00] alice"));
        assert!(lines[1].starts_with("  [2025-04-03 12:01:00] bob"));
        assert!(lines[2].starts_with("    [2025-04-03 12:02:00] carol"));
    }

    #[test]
    fn test_threaded_siblings_keep_linkage_order() {
        let messages = vec![
            create_test_message("A", "alice", 0, None, None),
            create_test_message("B", "bob", 1, Some("A"), None),
            create_test_message("C", "carol", 2, Some("A"), None),
            create_test_message("D", "dave", 3, Some("B"), None),
            create_test_message("E", "erin", 4, None, None),
        ];
        let index = build_index(&messages);

        assert_eq!(rendered_ids(&render_threaded(&index)), ["A", "B", "D", "C", "E"]);
    }

    #[test]
    fn test_thread_children_follow_replies() {
        let messages = vec![
            create_test_message("T", "alice", 0, None, None),
            create_test_message("X", "bob", 1, None, Some("T")),
            create_test_message("R", "carol", 2, Some("T"), None),
            create_test_message("Y", "dave", 3, None, Some("T")),
        ];
        let index = build_index(&messages);
        let output = render_threaded(&index);

        assert_eq!(rendered_ids(&output), ["T", "R", "X", "Y"]);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[2].starts_with("  [2025-04-03 12:01:00] bob"));
        assert!(lines[3].starts_with("  [2025-04-03 12:03:00] dave"));
    }

    #[test]
    fn test_thread_children_indent_below_nested_starter() {
        let messages = vec![
            create_test_message("A", "alice", 0, None, None),
            create_test_message("T", "bob", 1, Some("A"), None),
            create_test_message("X", "carol", 2, None, Some("T")),
        ];
        let index = build_index(&messages);
        let output = render_threaded(&index);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("    [2025-04-03 12:02:00] carol"));
    }

    #[test]
    fn test_reply_and_thread_child_rendered_once_per_root() {
        let messages = vec![
            create_test_message("T", "alice", 0, None, None),
            create_test_message("R", "bob", 1, Some("T"), Some("T")),
        ];
        let index = build_index(&messages);

        assert_eq!(rendered_ids(&render_threaded(&index)), ["T", "R"]);
    }

    #[test]
    fn test_thread_child_reply_elsewhere_in_same_root_rendered_once() {
        // X is a thread child of T and replies to S; T and S share root A.
        let messages = vec![
            create_test_message("A", "alice", 0, None, None),
            create_test_message("T", "bob", 1, Some("A"), None),
            create_test_message("S", "carol", 2, Some("A"), None),
            create_test_message("X", "dave", 3, Some("S"), Some("T")),
        ];
        let index = build_index(&messages);

        assert_eq!(rendered_ids(&render_threaded(&index)), ["A", "T", "X", "S"]);
    }

    #[test]
    fn test_visited_set_resets_between_roots() {
        // M replies to R1 and sits in R2's thread: rendered under both roots.
        let messages = vec![
            create_test_message("R1", "alice", 0, None, None),
            create_test_message("R2", "bob", 1, None, None),
            create_test_message("M", "carol", 2, Some("R1"), Some("R2")),
        ];
        let index = build_index(&messages);

        assert_eq!(rendered_ids(&render_threaded(&index)), ["R1", "M", "R2", "M"]);
    }

    #[test]
    fn test_thread_child_replies_are_not_descended() {
        let messages = vec![
            create_test_message("T", "alice", 0, None, None),
            create_test_message("X", "bob", 1, None, Some("T")),
            create_test_message("Z", "carol", 2, Some("X"), None),
        ];
        let index = build_index(&messages);

        assert_eq!(rendered_ids(&render_threaded(&index)), ["T", "X"]);
    }

    #[test]
    fn test_cycle_terminates_and_dangling_root_renders() {
        let messages = vec![
            create_test_message("A", "alice", 0, Some("B"), None),
            create_test_message("B", "bob", 1, Some("A"), None),
            create_test_message("C", "carol", 2, Some("gone"), None),
        ];
        let index = build_index(&messages);

        assert_eq!(rendered_ids(&render_threaded(&index)), ["C"]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut messages = vec![create_test_message("0", "alice", 0, None, None)];
        for i in 1..5_000 {
            let parent = (i - 1).to_string();
            messages.push(create_test_message(
                &i.to_string(),
                "bob",
                i as i64,
                Some(&parent),
                None,
            ));
        }
        let index = build_index(&messages);
        let output = render_threaded(&index);

        assert_eq!(output.lines().count(), 5_000);
        let last = output.lines().last().unwrap();
        assert_eq!(last.len() - last.trim_start().len(), 2 * 4_999);
    }
}
