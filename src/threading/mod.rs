//! Conversation threading module
//!
//! Reconstructs the reply/thread structure of a flat set of chat messages and
//! renders it as a readable text transcript. The transcript is what API
//! clients download, what the narrative summarizer reads, and what the email
//! digest is built from.
//!
//! ## Threading Model
//!
//! Two independent relations link messages:
//!
//! 1. **Reply chains** (`reply_to_id`): nested, each reply renders one level
//!    below the message it answers
//! 2. **Threads** (`thread_id`): a flat grouping under the thread starter,
//!    rendered one level below the starter
//!
//! Everything here is pure and synchronous: an index is built per call from
//! the supplied messages and dropped once the transcript is produced.
//!
//! ## Module Structure
//!
//! - `node`: Index data structures
//! - `index`: Two-pass reconstruction and depth resolution
//! - `render`: Line format plus flat and threaded renderers
//! - `format`: Output format and strategy dispatch

pub mod format;
pub mod index;
pub mod node;
pub mod render;

// Re-export main types and functions
pub use format::{
    FLAT_RENDER_THRESHOLD, FormattedMessages, OutputFormat, format_messages, render_transcript,
    render_transcript_with_threshold,
};
pub use index::build_index;
pub use node::{Node, ThreadIndex};
pub use render::{format_message, format_timestamp, render_flat, render_threaded};
