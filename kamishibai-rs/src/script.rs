//! A parsed script and its playback cursor.
//!
//! The tag sequence is fixed at parse time and shared between forks behind
//! an `Arc`; only the cursor is per-instance. A cache can therefore hand the
//! same parse to any number of independent playbacks.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{LabelNotFoundError, ParseError};
use crate::parser::parse_script;
use crate::tag::{Tag, LABEL_TAG};

/// An ordered tag sequence plus a cursor.
///
/// Invariant: `0 <= cursor <= len()`; [`Script::get_next_tag`] returns `None`
/// exactly when the cursor has reached the end.
#[derive(Debug)]
pub struct Script {
    tags: Arc<[Tag]>,
    /// Label body → tag index, first occurrence wins. Built once at
    /// construction and shared by forks.
    labels: Arc<HashMap<String, usize>>,
    cursor: usize,
}

impl Script {
    /// Parse script text eagerly into a playable script.
    pub fn new(src: &str) -> Result<Self, ParseError> {
        Ok(Self::from_tags(parse_script(src)?))
    }

    fn from_tags(tags: Vec<Tag>) -> Self {
        let mut labels = HashMap::new();
        for (index, tag) in tags.iter().enumerate() {
            if tag.name == LABEL_TAG {
                labels.entry(tag.body().to_owned()).or_insert(index);
            }
        }
        Script {
            tags: tags.into(),
            labels: Arc::new(labels),
            cursor: 0,
        }
    }

    /// The tag under the cursor, advancing past it; `None` once exhausted.
    pub fn get_next_tag(&mut self) -> Option<&Tag> {
        let tag = self.tags.get(self.cursor)?;
        self.cursor += 1;
        Some(tag)
    }

    /// Position the cursor immediately after the named label.
    pub fn jump_to_label(&mut self, name: &str) -> Result<(), LabelNotFoundError> {
        match self.labels.get(name) {
            Some(&index) => {
                self.cursor = index + 1;
                Ok(())
            }
            None => Err(LabelNotFoundError::new(name)),
        }
    }

    /// Independent playback of the same parse: shares the tag sequence
    /// (read-only), cursor reset to zero. Deliberately not `Clone` — a copy
    /// that rewinds would violate that trait's contract.
    pub fn fork(&self) -> Script {
        Script {
            tags: Arc::clone(&self.tags),
            labels: Arc::clone(&self.labels),
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
