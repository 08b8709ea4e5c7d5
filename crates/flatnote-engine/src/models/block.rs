use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::inline::{self, InlineEmoji, Link, Mark, TextAlign};
use crate::models::table::{self, TablePayload};
use crate::text::{char_len, char_slice};

/// Closed set of block kinds.
///
/// Serialized with the persisted kebab-case tags (`"bullet-list"`, `"h2"`, ...).
/// Deserializing an unknown tag yields [`BlockType::Text`] so that old or
/// foreign data always loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Text,
    H1,
    H2,
    H3,
    BulletList,
    NumberedList,
    Todo,
    Quote,
    Code,
    Divider,
    Table,
    Image,
    Video,
    Audio,
    Asset,
}

/// List container a list-ish block type groups into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
    Task,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown block type: {0}")]
pub struct UnknownBlockType(pub String);

impl BlockType {
    pub const ALL: [BlockType; 15] = [
        BlockType::Text,
        BlockType::H1,
        BlockType::H2,
        BlockType::H3,
        BlockType::BulletList,
        BlockType::NumberedList,
        BlockType::Todo,
        BlockType::Quote,
        BlockType::Code,
        BlockType::Divider,
        BlockType::Table,
        BlockType::Image,
        BlockType::Video,
        BlockType::Audio,
        BlockType::Asset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::H1 => "h1",
            BlockType::H2 => "h2",
            BlockType::H3 => "h3",
            BlockType::BulletList => "bullet-list",
            BlockType::NumberedList => "numbered-list",
            BlockType::Todo => "todo",
            BlockType::Quote => "quote",
            BlockType::Code => "code",
            BlockType::Divider => "divider",
            BlockType::Table => "table",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Audio => "audio",
            BlockType::Asset => "asset",
        }
    }

    /// Heading level read from the type suffix (`h2` -> 2)
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockType::H1 => Some(1),
            BlockType::H2 => Some(2),
            BlockType::H3 => Some(3),
            _ => None,
        }
    }

    /// Heading type for a tree heading level. Levels past 3 clamp to `h3`.
    pub fn from_heading_level(level: u8) -> Self {
        match level {
            0 | 1 => BlockType::H1,
            2 => BlockType::H2,
            _ => BlockType::H3,
        }
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        match self {
            BlockType::BulletList => Some(ListKind::Bullet),
            BlockType::NumberedList => Some(ListKind::Ordered),
            BlockType::Todo => Some(ListKind::Task),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        self.list_kind().is_some()
    }

    /// Whether the block holds user-editable inline text.
    ///
    /// Dividers, tables and media blocks are rendered as opaque regions and
    /// never receive a caret.
    pub fn is_text_bearing(&self) -> bool {
        !matches!(
            self,
            BlockType::Divider
                | BlockType::Table
                | BlockType::Image
                | BlockType::Video
                | BlockType::Audio
                | BlockType::Asset
        )
    }

    /// Whether inline mentions are meaningful on this type. Code content is
    /// verbatim, so mentions there are ignored.
    pub fn supports_mentions(&self) -> bool {
        self.is_text_bearing() && *self != BlockType::Code
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}

impl Serialize for BlockType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(tag.parse().unwrap_or_else(|err: UnknownBlockType| {
            log::warn!("{err}, loading as text");
            BlockType::Text
        }))
    }
}

/// Opaque block identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    /// Fresh random identifier
    pub fn generate() -> Self {
        BlockId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        BlockId(value.to_string())
    }
}

/// Inline reference to another document over `content[start..end]`.
///
/// Offsets are half-open character offsets. A mention is only meaningful
/// while the covered slice equals `label`; see [`Mention::is_valid_in`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub target_id: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl Mention {
    pub fn new(target_id: impl Into<String>, label: impl Into<String>, start: usize) -> Self {
        let label = label.into();
        let end = start + char_len(&label);
        Self {
            target_id: target_id.into(),
            label,
            start,
            end,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The mention invariant: the covered slice of `content` equals the label.
    pub fn is_valid_in(&self, content: &str) -> bool {
        char_slice(content, &self.range()) == Some(self.label.as_str())
    }

    /// Same mention moved right by `delta` characters
    pub fn shifted(&self, delta: usize) -> Self {
        Self {
            start: self.start + delta,
            end: self.end + delta,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Block type that displays this kind of media
    pub fn block_type(&self) -> BlockType {
        match self {
            MediaKind::Image => BlockType::Image,
            MediaKind::Video => BlockType::Video,
            MediaKind::Audio => BlockType::Audio,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            _ => MediaKind::Image,
        }
    }
}

/// Reference to externally stored media
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

/// Flat unit of document content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emojis: Vec<InlineEmoji>,
    #[serde(
        default,
        rename = "textAlign",
        skip_serializing_if = "Option::is_none"
    )]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "table::deserialize_lenient"
    )]
    pub table: Option<TablePayload>,
    /// Code language for `code` blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Block {
    /// Block with a freshly generated id
    pub fn new(block_type: BlockType, content: impl Into<String>) -> Self {
        Self::with_id(BlockId::generate(), block_type, content)
    }

    pub fn with_id(id: impl Into<BlockId>, block_type: BlockType, content: impl Into<String>) -> Self {
        let checked = (block_type == BlockType::Todo).then_some(false);
        Self {
            id: id.into(),
            block_type,
            content: content.into(),
            checked,
            mentions: Vec::new(),
            marks: Vec::new(),
            links: Vec::new(),
            emojis: Vec::new(),
            text_align: None,
            media: None,
            table: None,
            language: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BlockType::Text, content)
    }

    pub fn empty() -> Self {
        Self::text("")
    }

    pub fn with_mentions(mut self, mentions: Vec<Mention>) -> Self {
        self.mentions = mentions;
        self.normalize();
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self.normalize_formatting();
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self.normalize_formatting();
        self
    }

    pub fn with_emojis(mut self, emojis: Vec<InlineEmoji>) -> Self {
        self.emojis = emojis;
        self.normalize_formatting();
        self
    }

    pub fn with_text_align(mut self, align: TextAlign) -> Self {
        self.text_align = Some(align);
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_table(mut self, table: TablePayload) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.media = Some(media);
        self
    }

    /// Content length in characters
    pub fn len(&self) -> usize {
        char_len(&self.content)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Mentions that currently satisfy the slice invariant, in stored order.
    pub fn valid_mentions(&self) -> impl Iterator<Item = &Mention> {
        self.mentions.iter().filter(|m| m.is_valid_in(&self.content))
    }

    /// Drop stale mentions and restore the sorted, non-overlapping order.
    ///
    /// Returns the number of mentions removed. Stale mentions are never
    /// repaired.
    pub fn normalize_mentions(&mut self) -> usize {
        let before = self.mentions.len();
        let content = &self.content;
        self.mentions.retain(|m| {
            let keep = m.is_valid_in(content);
            if !keep {
                log::debug!(
                    "dropping stale mention {:?} at {}..{} in block {}",
                    m.label,
                    m.start,
                    m.end,
                    self.id
                );
            }
            keep
        });
        self.mentions.sort_by_key(|m| (m.start, m.end));

        let mut last_end = 0;
        self.mentions.retain(|m| {
            let keep = m.start >= last_end;
            if keep {
                last_end = m.end;
            }
            keep
        });

        before - self.mentions.len()
    }

    /// Drop marks, links and emoji that no longer fit the content, join
    /// touching ranges of the same style, and drop emoji that overlap a
    /// mention or an earlier emoji. Returns the number removed.
    pub fn normalize_formatting(&mut self) -> usize {
        let mut dropped = inline::retain_valid(&mut self.marks, &self.content)
            + inline::retain_valid(&mut self.links, &self.content)
            + inline::retain_valid(&mut self.emojis, &self.content);
        inline::coalesce(&mut self.marks, Mark::same_style);
        inline::coalesce(&mut self.links, Link::same_target);

        let before = self.emojis.len();
        let mentions = &self.mentions;
        let mut last_end = 0;
        self.emojis.retain(|e| {
            let clear = e.start >= last_end
                && !mentions.iter().any(|m| m.start < e.end && e.start < m.end);
            if clear {
                last_end = e.end;
            }
            clear
        });
        dropped += before - self.emojis.len();
        if dropped > 0 {
            log::debug!("dropped {dropped} stale formatting range(s) in block {}", self.id);
        }
        dropped
    }

    /// [`normalize_mentions`](Self::normalize_mentions) then
    /// [`normalize_formatting`](Self::normalize_formatting)
    pub fn normalize(&mut self) -> usize {
        self.normalize_mentions() + self.normalize_formatting()
    }

    /// Change the block type, keeping `checked` consistent with it.
    pub fn retype(&mut self, block_type: BlockType) {
        self.block_type = block_type;
        self.checked = match block_type {
            BlockType::Todo => Some(self.checked.unwrap_or(false)),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Annotation, MarkKind};
    use rstest::rstest;

    #[rstest]
    #[case(BlockType::Text, "text")]
    #[case(BlockType::H1, "h1")]
    #[case(BlockType::H3, "h3")]
    #[case(BlockType::BulletList, "bullet-list")]
    #[case(BlockType::NumberedList, "numbered-list")]
    #[case(BlockType::Todo, "todo")]
    #[case(BlockType::Asset, "asset")]
    fn test_block_type_tags(#[case] block_type: BlockType, #[case] tag: &str) {
        assert_eq!(block_type.as_str(), tag);
        assert_eq!(tag.parse::<BlockType>(), Ok(block_type));
        assert_eq!(
            serde_json::to_string(&block_type).unwrap(),
            format!("\"{tag}\"")
        );
    }

    #[test]
    fn test_unknown_block_type_loads_as_text() {
        let block: Block =
            serde_json::from_str(r#"{"id":"b1","type":"toggle","content":"hidden"}"#).unwrap();
        assert_eq!(block.block_type, BlockType::Text);
        assert_eq!(block.content, "hidden");
        assert!("toggle".parse::<BlockType>().is_err());
    }

    #[rstest]
    #[case(0, BlockType::H1)]
    #[case(1, BlockType::H1)]
    #[case(2, BlockType::H2)]
    #[case(3, BlockType::H3)]
    #[case(6, BlockType::H3)]
    fn test_heading_level_clamps(#[case] level: u8, #[case] expected: BlockType) {
        assert_eq!(BlockType::from_heading_level(level), expected);
    }

    #[test]
    fn test_mention_validity() {
        let mention = Mention::new("n1", "@Bo", 3);
        assert_eq!(mention.range(), 3..6);
        assert!(mention.is_valid_in("Hi @Bo!"));
        assert!(!mention.is_valid_in("Hi @Bob"));
        assert!(!mention.is_valid_in("Hi"));
    }

    #[test]
    fn test_normalize_drops_stale_and_overlapping_mentions() {
        let mut block = Block::text("@Al and @Bo");
        block.mentions = vec![
            Mention::new("b", "@Bo", 8),
            Mention::new("x", "@Zed", 0),
            Mention::new("a", "@Al", 0),
            Mention::new("a2", "@A", 0),
        ];

        let dropped = block.normalize_mentions();

        assert_eq!(dropped, 2);
        let targets: Vec<_> = block.mentions.iter().map(|m| m.target_id.as_str()).collect();
        assert_eq!(targets, vec!["a2", "b"]);
    }

    #[test]
    fn test_block_serialization_shape() {
        let block = Block::with_id("b1", BlockType::Todo, "Task")
            .with_mentions(vec![])
            .with_checked(true);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "b1", "type": "todo", "content": "Task", "checked": true})
        );
    }

    #[test]
    fn test_mention_serializes_camel_case() {
        let mention = Mention::new("n1", "@Bo", 3);
        let json = serde_json::to_value(&mention).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"targetId": "n1", "label": "@Bo", "start": 3, "end": 6})
        );
    }

    #[test]
    fn test_formatting_serializes_next_to_content() {
        let block = Block::with_id("b1", BlockType::H2, "Big news")
            .with_marks(vec![Mark::new(MarkKind::Bold, 0..3)])
            .with_links(vec![Link::new("https://example.com", 4..8)])
            .with_text_align(TextAlign::Center);

        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            serde_json::json!({
                "id": "b1",
                "type": "h2",
                "content": "Big news",
                "marks": [{"type": "bold", "start": 0, "end": 3}],
                "links": [{"href": "https://example.com", "start": 4, "end": 8}],
                "textAlign": "center"
            })
        );
    }

    #[test]
    fn test_normalize_formatting() {
        let mut block = Block::text("Hi @Bo :)").with_mentions(vec![Mention::new("n", "@Bo", 3)]);
        block.marks = vec![
            Mark::new(MarkKind::Bold, 2..4),
            Mark::new(MarkKind::Bold, 0..2),
            Mark::new(MarkKind::Italic, 5..20),
        ];
        block.emojis = vec![
            InlineEmoji::new(serde_json::Map::new(), 4),
            InlineEmoji {
                start: 7,
                end: 9,
                attrs: serde_json::Map::new(),
                text: Some(":)".to_string()),
            },
        ];

        let dropped = block.normalize_formatting();

        assert_eq!(dropped, 2);
        assert_eq!(block.marks, vec![Mark::new(MarkKind::Bold, 0..4)]);
        assert_eq!(block.emojis.len(), 1);
        assert_eq!(block.emojis[0].range(), 7..9);
    }

    #[test]
    fn test_retype_maintains_checked() {
        let mut block = Block::text("a");
        block.retype(BlockType::Todo);
        assert_eq!(block.checked, Some(false));
        block.checked = Some(true);
        block.retype(BlockType::Todo);
        assert_eq!(block.checked, Some(true));
        block.retype(BlockType::H2);
        assert_eq!(block.checked, None);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(BlockId::generate(), BlockId::generate());
    }
}
