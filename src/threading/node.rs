//! Node data structures for conversation reconstruction
//!
//! A node wraps one archived message with the linkage discovered while
//! building the index: the ids of the messages replying to it and the depth
//! at which it renders.

use std::collections::HashMap;

use crate::models::Message;

/// One message inside a [`ThreadIndex`].
///
/// Nodes borrow their message from the caller's slice; an index never outlives
/// the request that built it.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    /// The wrapped message
    pub message: &'a Message,

    /// Ids of messages whose `reply_to_id` resolves to this node, in linkage order
    pub replies: Vec<&'a str>,

    /// Rendering depth (0 for roots)
    pub indent: usize,
}

impl<'a> Node<'a> {
    pub fn new(message: &'a Message) -> Self {
        Node {
            message,
            replies: Vec::new(),
            indent: 0,
        }
    }
}

/// Result of reconstructing a flat message set.
///
/// Holds the id → node table, the thread-starter → thread-children table and
/// the root ids in the order they were discovered.
#[derive(Debug, Default)]
pub struct ThreadIndex<'a> {
    pub(super) nodes: HashMap<&'a str, Node<'a>>,
    pub(super) thread_children: HashMap<&'a str, Vec<&'a str>>,
    pub(super) roots: Vec<&'a str>,
    pub(super) order: Vec<&'a str>,
}

impl<'a> ThreadIndex<'a> {
    pub fn node(&self, id: &str) -> Option<&Node<'a>> {
        self.nodes.get(id)
    }

    /// Messages carrying `thread_id == starter_id`, in input order.
    pub fn thread_children(&self, starter_id: &str) -> Option<&[&'a str]> {
        self.thread_children.get(starter_id).map(Vec::as_slice)
    }

    pub fn roots(&self) -> &[&'a str] {
        &self.roots
    }

    /// Distinct message ids in first-seen input order.
    pub fn ids(&self) -> &[&'a str] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
