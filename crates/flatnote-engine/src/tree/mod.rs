//! Nested rich-document tree used for interop with the rich-text engine.
//!
//! [`TreeNode`] is the typed form the converters work on. On the wire it is
//! the rich-text engine's JSON content shape,
//! `{"type": ..., "attrs": {...}, "content": [...], "text": ...}`, handled by
//! the private [`RawNode`] mirror. Kinds this crate does not know are kept as
//! [`TreeNode::Other`] so that their text still survives an import.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::models::{MarkAttrs, MarkKind, MediaKind, TextAlign};

mod outline;

pub use outline::format_tree;

/// Label given to a mention leaf that arrives without one
pub const UNKNOWN_MENTION_LABEL: &str = "@unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub enum TreeNode {
    Doc(Vec<TreeNode>),
    Paragraph {
        align: Option<TextAlign>,
        content: Vec<TreeNode>,
    },
    Heading {
        level: u8,
        align: Option<TextAlign>,
        content: Vec<TreeNode>,
    },
    BulletList(Vec<TreeNode>),
    OrderedList(Vec<TreeNode>),
    TaskList(Vec<TreeNode>),
    ListItem(Vec<TreeNode>),
    TaskItem {
        checked: bool,
        content: Vec<TreeNode>,
    },
    Blockquote(Vec<TreeNode>),
    CodeBlock {
        language: Option<String>,
        content: Vec<TreeNode>,
    },
    HorizontalRule,
    Table(Vec<TreeNode>),
    TableRow(Vec<TreeNode>),
    TableCell(Vec<TreeNode>),
    TableHeader(Vec<TreeNode>),
    Text {
        text: String,
        marks: Vec<TextMark>,
    },
    Mention {
        id: String,
        label: String,
    },
    /// Attributes are kept verbatim; see [`crate::models::emoji_display_text`]
    Emoji {
        attrs: Map<String, Value>,
    },
    HardBreak,
    Media {
        kind: MediaKind,
        src: String,
        alt: Option<String>,
        title: Option<String>,
    },
    Asset {
        asset_id: String,
        media_type: String,
        src: String,
        alt: Option<String>,
        title: Option<String>,
    },
    /// Unrecognized node kind, kept so its text content is not lost
    Other {
        kind: String,
        content: Vec<TreeNode>,
        text: Option<String>,
    },
}

/// Mark on a text leaf
#[derive(Debug, Clone, PartialEq)]
pub enum TextMark {
    Link { href: String, title: Option<String> },
    Format { kind: MarkKind, attrs: MarkAttrs },
}

impl TextMark {
    pub fn format(kind: MarkKind) -> Self {
        TextMark::Format {
            kind,
            attrs: MarkAttrs::default(),
        }
    }

    pub fn link(href: impl Into<String>) -> Self {
        TextMark::Link {
            href: href.into(),
            title: None,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            TextMark::Link { .. } => "link",
            TextMark::Format { kind, .. } => kind.as_str(),
        }
    }
}

impl TreeNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::styled(text, Vec::new())
    }

    pub fn styled(text: impl Into<String>, marks: Vec<TextMark>) -> Self {
        TreeNode::Text {
            text: text.into(),
            marks,
        }
    }

    pub fn paragraph(content: Vec<TreeNode>) -> Self {
        TreeNode::Paragraph {
            align: None,
            content,
        }
    }

    pub fn heading(level: u8, content: Vec<TreeNode>) -> Self {
        TreeNode::Heading {
            level,
            align: None,
            content,
        }
    }

    pub fn mention(id: impl Into<String>, label: impl Into<String>) -> Self {
        TreeNode::Mention {
            id: id.into(),
            label: label.into(),
        }
    }

    /// The wire `type` tag of this node
    pub fn kind(&self) -> &str {
        match self {
            TreeNode::Doc(_) => "doc",
            TreeNode::Paragraph { .. } => "paragraph",
            TreeNode::Heading { .. } => "heading",
            TreeNode::BulletList(_) => "bulletList",
            TreeNode::OrderedList(_) => "orderedList",
            TreeNode::TaskList(_) => "taskList",
            TreeNode::ListItem(_) => "listItem",
            TreeNode::TaskItem { .. } => "taskItem",
            TreeNode::Blockquote(_) => "blockquote",
            TreeNode::CodeBlock { .. } => "codeBlock",
            TreeNode::HorizontalRule => "horizontalRule",
            TreeNode::Table(_) => "table",
            TreeNode::TableRow(_) => "tableRow",
            TreeNode::TableCell(_) => "tableCell",
            TreeNode::TableHeader(_) => "tableHeader",
            TreeNode::Text { .. } => "text",
            TreeNode::Mention { .. } => "mention",
            TreeNode::Emoji { .. } => "emoji",
            TreeNode::HardBreak => "hardBreak",
            TreeNode::Media { kind, .. } => kind.as_str(),
            TreeNode::Asset { .. } => "asset",
            TreeNode::Other { kind, .. } => kind,
        }
    }

    /// Child nodes; leaves return an empty slice.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Doc(c)
            | TreeNode::BulletList(c)
            | TreeNode::OrderedList(c)
            | TreeNode::TaskList(c)
            | TreeNode::ListItem(c)
            | TreeNode::Blockquote(c)
            | TreeNode::Table(c)
            | TreeNode::TableRow(c)
            | TreeNode::TableCell(c)
            | TreeNode::TableHeader(c)
            | TreeNode::Paragraph { content: c, .. }
            | TreeNode::Heading { content: c, .. }
            | TreeNode::TaskItem { content: c, .. }
            | TreeNode::CodeBlock { content: c, .. }
            | TreeNode::Other { content: c, .. } => c,
            TreeNode::HorizontalRule
            | TreeNode::Text { .. }
            | TreeNode::Mention { .. }
            | TreeNode::Emoji { .. }
            | TreeNode::HardBreak
            | TreeNode::Media { .. }
            | TreeNode::Asset { .. } => &[],
        }
    }

    /// Parse a node from JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Wire mirror of [`TreeNode`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Vec<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marks: Option<Vec<RawMark>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawMark {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attrs: Option<Map<String, Value>>,
}

impl RawMark {
    fn attr_opt(&self, key: &str) -> Option<String> {
        self.attrs
            .as_ref()?
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// `None` for mark kinds this crate does not model
    fn into_text_mark(self) -> Option<TextMark> {
        if self.kind == "link" {
            return Some(TextMark::Link {
                href: self.attr_opt("href").unwrap_or_default(),
                title: self.attr_opt("title"),
            });
        }
        let Some(kind) = MarkKind::parse(&self.kind) else {
            log::debug!("ignoring unsupported mark {:?}", self.kind);
            return None;
        };
        Some(TextMark::Format {
            kind,
            attrs: MarkAttrs {
                color: self.attr_opt("color"),
                background_color: self.attr_opt("backgroundColor"),
            },
        })
    }
}

impl From<TextMark> for RawMark {
    fn from(mark: TextMark) -> Self {
        let kind = mark.kind().to_string();
        let attrs = match mark {
            TextMark::Link { href, title } => {
                let mut map = Map::new();
                map.insert("href".to_string(), Value::String(href));
                if let Some(title) = title {
                    map.insert("title".to_string(), Value::String(title));
                }
                Some(map)
            }
            TextMark::Format { attrs, .. } if attrs.is_empty() => None,
            TextMark::Format { attrs, .. } => match serde_json::to_value(attrs) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
        };
        RawMark { kind, attrs }
    }
}

impl RawNode {
    fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.as_ref()?.get(key)
    }

    fn attr_str(&self, key: &str) -> Option<String> {
        self.attr(key).and_then(Value::as_str).map(str::to_string)
    }

    fn attr_string_or_empty(&self, key: &str) -> String {
        self.attr_str(key).unwrap_or_default()
    }

    /// Non-empty string attribute
    fn attr_opt(&self, key: &str) -> Option<String> {
        self.attr_str(key).filter(|s| !s.is_empty())
    }

    /// `textAlign`, or the older `align` spelling
    fn align(&self) -> Option<TextAlign> {
        self.attr_opt("textAlign")
            .or_else(|| self.attr_opt("align"))
            .and_then(|s| TextAlign::parse(&s))
    }

    fn children(&mut self) -> Vec<TreeNode> {
        self.content
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(TreeNode::from)
            .collect()
    }
}

fn heading_level(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(n)) => n.as_u64().map_or(1, |n| n.min(u8::MAX as u64) as u8),
        Some(Value::String(s)) => s.parse().unwrap_or(1),
        _ => 1,
    }
}

impl From<RawNode> for TreeNode {
    fn from(mut raw: RawNode) -> Self {
        match raw.kind.as_str() {
            "doc" => TreeNode::Doc(raw.children()),
            "paragraph" => TreeNode::Paragraph {
                align: raw.align(),
                content: raw.children(),
            },
            "heading" => TreeNode::Heading {
                level: heading_level(raw.attr("level")),
                align: raw.align(),
                content: raw.children(),
            },
            "bulletList" => TreeNode::BulletList(raw.children()),
            "orderedList" => TreeNode::OrderedList(raw.children()),
            "taskList" => TreeNode::TaskList(raw.children()),
            "listItem" => TreeNode::ListItem(raw.children()),
            "taskItem" => TreeNode::TaskItem {
                checked: raw.attr("checked").and_then(Value::as_bool).unwrap_or(false),
                content: raw.children(),
            },
            "blockquote" => TreeNode::Blockquote(raw.children()),
            "codeBlock" => TreeNode::CodeBlock {
                language: raw.attr_opt("language"),
                content: raw.children(),
            },
            "horizontalRule" => TreeNode::HorizontalRule,
            "table" => TreeNode::Table(raw.children()),
            "tableRow" => TreeNode::TableRow(raw.children()),
            "tableCell" => TreeNode::TableCell(raw.children()),
            "tableHeader" => TreeNode::TableHeader(raw.children()),
            "text" => TreeNode::Text {
                text: raw.text.take().unwrap_or_default(),
                marks: raw
                    .marks
                    .take()
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(RawMark::into_text_mark)
                    .collect(),
            },
            "mention" => TreeNode::Mention {
                id: raw.attr_string_or_empty("id"),
                label: raw
                    .attr_opt("label")
                    .unwrap_or_else(|| UNKNOWN_MENTION_LABEL.to_string()),
            },
            "emoji" => TreeNode::Emoji {
                attrs: raw.attrs.take().unwrap_or_default(),
            },
            "hardBreak" => TreeNode::HardBreak,
            "image" | "video" | "audio" => TreeNode::Media {
                kind: MediaKind::parse(&raw.kind),
                src: raw.attr_string_or_empty("src"),
                alt: raw.attr_opt("alt"),
                title: raw.attr_opt("title"),
            },
            "asset" => TreeNode::Asset {
                asset_id: raw.attr_string_or_empty("assetId"),
                media_type: raw.attr_opt("type").unwrap_or_else(|| "image".to_string()),
                src: raw.attr_string_or_empty("src"),
                alt: raw.attr_opt("alt"),
                title: raw.attr_opt("title"),
            },
            _ => TreeNode::Other {
                content: raw.children(),
                text: raw.text.take(),
                kind: raw.kind,
            },
        }
    }
}

fn attrs(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn container(kind: &str, content: Vec<TreeNode>) -> RawNode {
    RawNode {
        kind: kind.to_string(),
        content: Some(content.into_iter().map(RawNode::from).collect()),
        ..RawNode::default()
    }
}

impl From<TreeNode> for RawNode {
    fn from(node: TreeNode) -> Self {
        let kind = node.kind().to_string();
        match node {
            TreeNode::Doc(c)
            | TreeNode::BulletList(c)
            | TreeNode::OrderedList(c)
            | TreeNode::TaskList(c)
            | TreeNode::ListItem(c)
            | TreeNode::Blockquote(c)
            | TreeNode::Table(c)
            | TreeNode::TableRow(c)
            | TreeNode::TableCell(c)
            | TreeNode::TableHeader(c) => container(&kind, c),
            TreeNode::Paragraph { align, content } => RawNode {
                attrs: align.and_then(|a| attrs(json!({ "textAlign": a.as_str() }))),
                ..container(&kind, content)
            },
            TreeNode::Heading {
                level,
                align,
                content,
            } => {
                let mut map = Map::new();
                map.insert("level".to_string(), json!(level));
                if let Some(align) = align {
                    map.insert("textAlign".to_string(), json!(align.as_str()));
                }
                RawNode {
                    attrs: Some(map),
                    ..container(&kind, content)
                }
            }
            TreeNode::TaskItem { checked, content } => RawNode {
                attrs: attrs(json!({ "checked": checked })),
                ..container(&kind, content)
            },
            TreeNode::CodeBlock { language, content } => RawNode {
                attrs: attrs(json!({ "language": language })),
                ..container(&kind, content)
            },
            TreeNode::Text { text, marks } => RawNode {
                kind,
                text: Some(text),
                marks: (!marks.is_empty())
                    .then(|| marks.into_iter().map(RawMark::from).collect()),
                ..RawNode::default()
            },
            TreeNode::Emoji { attrs } => RawNode {
                kind,
                attrs: Some(attrs),
                ..RawNode::default()
            },
            TreeNode::Mention { id, label } => RawNode {
                kind,
                attrs: attrs(json!({ "id": id, "label": label })),
                ..RawNode::default()
            },
            TreeNode::HorizontalRule | TreeNode::HardBreak => RawNode {
                kind,
                ..RawNode::default()
            },
            TreeNode::Media {
                src, alt, title, ..
            } => RawNode {
                kind,
                attrs: attrs(json!({
                    "src": src,
                    "alt": alt.unwrap_or_default(),
                    "title": title.unwrap_or_default(),
                })),
                ..RawNode::default()
            },
            TreeNode::Asset {
                asset_id,
                media_type,
                src,
                alt,
                title,
            } => RawNode {
                kind,
                attrs: attrs(json!({
                    "assetId": asset_id,
                    "type": media_type,
                    "src": src,
                    "alt": alt.unwrap_or_default(),
                    "title": title.unwrap_or_default(),
                })),
                ..RawNode::default()
            },
            TreeNode::Other { content, text, .. } => RawNode {
                kind,
                content: (!content.is_empty())
                    .then(|| content.into_iter().map(RawNode::from).collect()),
                text,
                ..RawNode::default()
            },
        }
    }
}
