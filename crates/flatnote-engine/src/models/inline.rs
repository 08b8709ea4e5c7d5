//! Inline formatting stored next to a block's content.
//!
//! Marks, links and emoji are ranges over the block content, in the same
//! half-open character offsets as mentions. They follow their text through
//! edits, merges and splits; see [`Annotation`].

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::Mention;
use crate::text::{char_len, char_slice};

/// A range annotation over block content
pub trait Annotation: Clone {
    fn range(&self) -> Range<usize>;

    fn set_range(&mut self, range: Range<usize>);

    /// Whether text typed at the annotation's end joins it. True for
    /// formatting marks, false for everything atomic or clickable.
    fn grows_at_end(&self) -> bool {
        false
    }

    /// Non-empty and inside `content`
    fn is_valid_in(&self, content: &str) -> bool {
        let range = self.range();
        range.start < range.end && range.end <= char_len(content)
    }

    /// Same annotation moved right by `delta` characters
    fn shifted(&self, delta: usize) -> Self {
        let range = self.range();
        let mut moved = self.clone();
        moved.set_range(range.start + delta..range.end + delta);
        moved
    }
}

impl Annotation for Mention {
    fn range(&self) -> Range<usize> {
        Mention::range(self)
    }

    fn set_range(&mut self, range: Range<usize>) {
        self.start = range.start;
        self.end = range.end;
    }

    fn is_valid_in(&self, content: &str) -> bool {
        Mention::is_valid_in(self, content)
    }
}

/// Text formatting kinds. The derive order is the order marks are emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Superscript,
    Subscript,
    Highlight,
    Color,
}

impl MarkKind {
    pub const ALL: [MarkKind; 9] = [
        MarkKind::Bold,
        MarkKind::Italic,
        MarkKind::Underline,
        MarkKind::Strike,
        MarkKind::Code,
        MarkKind::Superscript,
        MarkKind::Subscript,
        MarkKind::Highlight,
        MarkKind::Color,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
            MarkKind::Underline => "underline",
            MarkKind::Strike => "strike",
            MarkKind::Code => "code",
            MarkKind::Superscript => "superscript",
            MarkKind::Subscript => "subscript",
            MarkKind::Highlight => "highlight",
            MarkKind::Color => "color",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        MarkKind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for MarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colours carried by `color` and `highlight` marks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl MarkAttrs {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.background_color.is_none()
    }
}

/// Formatting over `content[start..end]`. Marks of different kinds may
/// overlap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "MarkAttrs::is_empty")]
    pub attrs: MarkAttrs,
}

impl Mark {
    pub fn new(kind: MarkKind, range: Range<usize>) -> Self {
        Self {
            kind,
            start: range.start,
            end: range.end,
            attrs: MarkAttrs::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: MarkAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Same kind and attributes
    pub fn same_style(&self, other: &Mark) -> bool {
        self.kind == other.kind && self.attrs == other.attrs
    }
}

impl Annotation for Mark {
    fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn set_range(&mut self, range: Range<usize>) {
        self.start = range.start;
        self.end = range.end;
    }

    fn grows_at_end(&self) -> bool {
        true
    }
}

/// Hyperlink over `content[start..end]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            href: href.into(),
            start: range.start,
            end: range.end,
            title: None,
        }
    }

    pub fn same_target(&self, other: &Link) -> bool {
        self.href == other.href && self.title == other.title
    }
}

impl Annotation for Link {
    fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn set_range(&mut self, range: Range<usize>) {
        self.start = range.start;
        self.end = range.end;
    }
}

/// Emoji node flattened into content. `text` is what it contributes to the
/// content; `attrs` are kept verbatim so custom emoji survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineEmoji {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl InlineEmoji {
    /// Emoji at `start` whose content is its display text
    pub fn new(attrs: Map<String, Value>, start: usize) -> Self {
        let text = emoji_display_text(&attrs);
        Self {
            start,
            end: start + char_len(&text),
            attrs,
            text: Some(text),
        }
    }
}

impl Annotation for InlineEmoji {
    fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn set_range(&mut self, range: Range<usize>) {
        self.start = range.start;
        self.end = range.end;
    }

    fn is_valid_in(&self, content: &str) -> bool {
        let range = self.range();
        match (&self.text, char_slice(content, &range)) {
            (Some(text), slice) => slice == Some(text.as_str()),
            (None, Some(slice)) => !slice.is_empty(),
            (None, None) => false,
        }
    }
}

/// Text an emoji node stands for: the glyph when known, else a shortcode.
pub fn emoji_display_text(attrs: &Map<String, Value>) -> String {
    let non_empty = |key: &str| {
        attrs
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let first_shortcode = || {
        attrs
            .get("shortcodes")
            .and_then(Value::as_array)
            .and_then(|codes| codes.first())
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    non_empty("emoji")
        .or_else(|| non_empty("unicode"))
        .or_else(first_shortcode)
        .or_else(|| non_empty("shortcode"))
        .or_else(|| non_empty("name").map(|name| format!(":{name}:")))
        .unwrap_or_else(|| ":emoji:".to_string())
}

/// Horizontal alignment of a paragraph, heading or quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

/// Drop invalid annotations and sort the rest by position. Returns how many
/// were dropped.
pub(crate) fn retain_valid<A: Annotation>(items: &mut Vec<A>, content: &str) -> usize {
    let before = items.len();
    items.retain(|a| a.is_valid_in(content));
    items.sort_by_key(|a| (a.range().start, a.range().end));
    before - items.len()
}

/// Fold touching or overlapping ranges that `same` considers equal into one.
pub(crate) fn coalesce<A: Annotation>(items: &mut Vec<A>, same: impl Fn(&A, &A) -> bool) {
    let mut out: Vec<A> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        let range = item.range();
        let joined = out
            .iter_mut()
            .rev()
            .find(|prev| same(prev, &item) && prev.range().end >= range.start);
        match joined {
            Some(prev) => {
                let start = prev.range().start;
                let end = prev.range().end.max(range.end);
                prev.set_range(start..end);
            }
            None => out.push(item),
        }
    }
    *items = out;
}
