//! Annotation offset engine.
//!
//! Moves mentions, emoji, marks and links between the two representations:
//! character ranges over a flat content string, and leaves interleaved in a
//! tree. Both directions are pure folds with an explicit accumulator.

use std::ops::Range;

use crate::models::{Annotation, InlineEmoji, Link, Mark, Mention};
use crate::text::{char_len, char_slice};
use crate::tree::{TextMark, TreeNode};

/// One piece of a partitioned content string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    /// Plain text between ranges
    Gap(&'a str),
    /// Text covered by `ranges[index]`
    Range { index: usize, text: &'a str },
}

/// Partition `content` at the given character ranges.
///
/// Spans alternate between gap text and range text and together cover the
/// whole string. Ranges are taken in ascending `start` order; a range that is
/// empty, out of bounds, or overlaps an earlier accepted range is treated as
/// gap text. Empty gaps are omitted.
pub fn split_by_ranges<'a>(content: &'a str, ranges: &[Range<usize>]) -> Vec<Span<'a>> {
    let len = char_len(content);
    let mut order: Vec<usize> = (0..ranges.len()).collect();
    order.sort_by_key(|&i| (ranges[i].start, ranges[i].end));

    let mut spans = Vec::new();
    let mut cursor = 0;
    for index in order {
        let range = &ranges[index];
        if range.start >= range.end || range.end > len || range.start < cursor {
            log::debug!("skipping range {range:?} while splitting content of length {len}");
            continue;
        }
        if let Some(gap) = char_slice(content, &(cursor..range.start)).filter(|g| !g.is_empty()) {
            spans.push(Span::Gap(gap));
        }
        if let Some(text) = char_slice(content, range) {
            spans.push(Span::Range { index, text });
        }
        cursor = range.end;
    }
    if let Some(tail) = char_slice(content, &(cursor..len)).filter(|t| !t.is_empty()) {
        spans.push(Span::Gap(tail));
    }
    spans
}

/// Inline tree leaves for a split: gaps become text leaves and ranges
/// become mention leaves carrying `mentions[index]`.
pub fn inline_nodes(spans: &[Span<'_>], mentions: &[Mention]) -> Vec<TreeNode> {
    spans
        .iter()
        .map(|span| match span {
            Span::Gap(text) => TreeNode::text(*text),
            Span::Range { index, text } => match mentions.get(*index) {
                Some(m) => TreeNode::mention(&m.target_id, &m.label),
                None => TreeNode::text(*text),
            },
        })
        .collect()
}

/// Inline leaves for formatted content.
///
/// `mentions` and `emojis` become atomic leaves; they should already be
/// valid and non-overlapping, anything else is exported as text. Text
/// between them is split wherever the set of covering marks and links
/// changes.
pub fn annotated_nodes(
    content: &str,
    mentions: &[Mention],
    emojis: &[InlineEmoji],
    marks: &[Mark],
    links: &[Link],
) -> Vec<TreeNode> {
    let ranges: Vec<Range<usize>> = mentions
        .iter()
        .map(Mention::range)
        .chain(emojis.iter().map(Annotation::range))
        .collect();

    let mut nodes = Vec::new();
    let mut offset = 0;
    for span in split_by_ranges(content, &ranges) {
        match span {
            Span::Gap(text) => {
                nodes.extend(styled_text_nodes(text, offset, marks, links));
                offset += char_len(text);
            }
            Span::Range { index, text } => {
                let emoji = index.checked_sub(mentions.len()).and_then(|i| emojis.get(i));
                nodes.push(match (mentions.get(index), emoji) {
                    (Some(m), _) => TreeNode::mention(&m.target_id, &m.label),
                    (None, Some(e)) => TreeNode::Emoji {
                        attrs: e.attrs.clone(),
                    },
                    (None, None) => TreeNode::text(text),
                });
                offset += char_len(text);
            }
        }
    }
    nodes
}

/// Text leaves for `text`, which starts at character `offset` of the block
/// content. Adjacent pieces with the same marks share one leaf.
pub fn styled_text_nodes(text: &str, offset: usize, marks: &[Mark], links: &[Link]) -> Vec<TreeNode> {
    let end = offset + char_len(text);
    let mut cuts = vec![offset, end];
    for range in marks
        .iter()
        .map(Annotation::range)
        .chain(links.iter().map(Annotation::range))
    {
        cuts.extend([range.start, range.end].into_iter().filter(|&c| c > offset && c < end));
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut nodes: Vec<TreeNode> = Vec::new();
    for pair in cuts.windows(2) {
        let segment = pair[0]..pair[1];
        let Some(piece) = char_slice(text, &(segment.start - offset..segment.end - offset)) else {
            continue;
        };
        if piece.is_empty() {
            continue;
        }
        let active = covering_marks(&segment, marks, links);
        match nodes.last_mut() {
            Some(TreeNode::Text { text, marks }) if *marks == active => text.push_str(piece),
            _ => nodes.push(TreeNode::styled(piece, active)),
        }
    }
    nodes
}

/// The link first, then one mark per kind in [`crate::models::MarkKind`]
/// order
fn covering_marks(segment: &Range<usize>, marks: &[Mark], links: &[Link]) -> Vec<TextMark> {
    let covers = |r: Range<usize>| r.start <= segment.start && segment.end <= r.end;

    let link = links.iter().find(|l| covers(l.range())).map(|l| TextMark::Link {
        href: l.href.clone(),
        title: l.title.clone(),
    });
    let mut formats: Vec<&Mark> = marks.iter().filter(|m| covers(m.range())).collect();
    formats.sort_by_key(|m| m.kind);
    formats.dedup_by_key(|m| m.kind);

    link.into_iter()
        .chain(formats.into_iter().map(|m| TextMark::Format {
            kind: m.kind,
            attrs: m.attrs.clone(),
        }))
        .collect()
}

/// Text and annotations reconstructed from inline nodes. Neighbouring leaves
/// with the same mark give touching ranges; [`crate::models::Block`]
/// normalisation joins them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatInline {
    pub text: String,
    pub mentions: Vec<Mention>,
    pub marks: Vec<Mark>,
    pub links: Vec<Link>,
    pub emojis: Vec<InlineEmoji>,
    /// Running character counter, always `char_len(&text)`
    chars: usize,
}

impl FlatInline {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
        self.chars += char_len(s);
    }

    fn push_node(&mut self, node: &TreeNode) {
        match node {
            TreeNode::Text { text, marks } => {
                let start = self.chars;
                self.push_str(text);
                if start < self.chars {
                    self.record_marks(marks, start..self.chars);
                }
            }
            TreeNode::Mention { id, label } => {
                self.mentions.push(Mention::new(id.clone(), label.clone(), self.chars));
                self.push_str(label);
            }
            TreeNode::Emoji { attrs } => {
                let emoji = InlineEmoji::new(attrs.clone(), self.chars);
                self.push_str(emoji.text.as_deref().unwrap_or_default());
                self.emojis.push(emoji);
            }
            TreeNode::HardBreak => self.push_str("\n"),
            TreeNode::Other {
                text: Some(text),
                content,
                ..
            } if content.is_empty() => self.push_str(text),
            _ => {
                let nested = flatten_inline(node.children());
                self.append(nested);
            }
        }
    }

    fn record_marks(&mut self, marks: &[TextMark], range: Range<usize>) {
        for mark in marks {
            match mark {
                TextMark::Link { href, title } => self.links.push(Link {
                    href: href.clone(),
                    start: range.start,
                    end: range.end,
                    title: title.clone(),
                }),
                TextMark::Format { kind, attrs } => {
                    self.marks.push(Mark::new(*kind, range.clone()).with_attrs(attrs.clone()))
                }
            }
        }
    }

    /// Append a nested result, shifting its ranges by the counter value at
    /// the point the nested walk began.
    fn append(&mut self, nested: FlatInline) {
        let base = self.chars;
        self.mentions
            .extend(nested.mentions.into_iter().map(|m| m.shifted(base)));
        self.marks
            .extend(nested.marks.iter().map(|m| m.shifted(base)));
        self.links
            .extend(nested.links.iter().map(|l| l.shifted(base)));
        self.emojis
            .extend(nested.emojis.iter().map(|e| e.shifted(base)));
        self.text.push_str(&nested.text);
        self.chars += nested.chars;
    }
}

/// Depth-first text of `nodes` with every mention leaf recorded at its
/// offset in that text.
pub fn flatten_inline(nodes: &[TreeNode]) -> FlatInline {
    nodes.iter().fold(FlatInline::default(), |mut acc, node| {
        acc.push_node(node);
        acc
    })
}

/// Mentions of `nodes`, offsets relative to their concatenated text.
pub fn accumulate_offsets(nodes: &[TreeNode]) -> Vec<Mention> {
    flatten_inline(nodes).mentions
}
