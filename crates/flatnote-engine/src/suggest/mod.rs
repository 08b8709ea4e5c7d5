//! Suggestion triggers: `@` for mentions and `/` for block commands.
//!
//! A trigger is live while the caret sits after a trigger character with no
//! whitespace in between. The text between them is the query used to filter
//! candidates.

pub mod commands;

pub use commands::{COMMANDS, CommandAction, CommandGroup, CommandItem, filter_commands, find_command};

use std::ops::Range;

use crate::models::{Block, BlockId};
use crate::text::char_slice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Mention,
    Command,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSettings {
    pub mention_trigger: char,
    pub command_trigger: char,
    pub max_mention_results: usize,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            mention_trigger: '@',
            command_trigger: '/',
            max_mention_results: 5,
        }
    }
}

impl TriggerSettings {
    fn kind_of(&self, c: char) -> Option<TriggerKind> {
        if c == self.mention_trigger {
            Some(TriggerKind::Mention)
        } else if c == self.command_trigger {
            Some(TriggerKind::Command)
        } else {
            None
        }
    }
}

/// A live trigger in one block
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub kind: TriggerKind,
    pub block: BlockId,
    /// Character offset of the trigger character
    pub start: usize,
    /// Text typed after the trigger, up to the caret
    pub query: String,
}

impl Trigger {
    /// Range covering the trigger character and the query
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + 1 + self.query.chars().count()
    }
}

/// Host-supplied mention candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionTarget {
    pub id: String,
    pub title: String,
}

impl MentionTarget {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Find the live trigger behind `caret`, if any.
///
/// Scans backward from the caret. Whitespace or running into a mention span
/// ends the scan with no trigger, and the trigger character itself must sit
/// at the block start or right after whitespace. Code blocks never trigger.
pub fn detect_trigger(block: &Block, caret: usize, settings: &TriggerSettings) -> Option<Trigger> {
    if !block.block_type.supports_mentions() {
        return None;
    }
    let chars: Vec<char> = block.content.chars().collect();
    if caret > chars.len() {
        return None;
    }

    for idx in (0..caret).rev() {
        if block.valid_mentions().any(|m| m.range().contains(&idx)) {
            return None;
        }
        let c = chars[idx];
        if c.is_whitespace() {
            return None;
        }
        if let Some(kind) = settings.kind_of(c) {
            let prefix_ok = idx == 0 || chars[idx - 1].is_whitespace();
            if !prefix_ok {
                return None;
            }
            let query = char_slice(&block.content, &(idx + 1..caret))?.to_string();
            return Some(Trigger {
                kind,
                block: block.id.clone(),
                start: idx,
                query,
            });
        }
    }
    None
}

/// Targets whose title contains `query`, case-insensitively, at most `limit`.
pub fn filter_targets<'a>(
    targets: &'a [MentionTarget],
    query: &str,
    limit: usize,
) -> Vec<&'a MentionTarget> {
    let query = query.to_lowercase();
    targets
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&query))
        .take(limit)
        .collect()
}
