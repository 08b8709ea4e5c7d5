use std::sync::OnceLock;

use regex::Regex;

use crate::convert::ConvertOptions;
use crate::convert::offsets::annotated_nodes;
use crate::models::{Annotation, Block, BlockType, InlineEmoji, ListKind, MediaKind, Mention, TablePayload};
use crate::tree::TreeNode;

/// Build the rich-document tree for a block sequence.
///
/// Consecutive blocks of the same list type share one list container. No
/// block is ever dropped, and an empty sequence yields a document holding a
/// single empty paragraph.
pub fn blocks_to_tree(blocks: &[Block], options: &ConvertOptions) -> TreeNode {
    let mut content = Vec::with_capacity(blocks.len());
    let mut i = 0;

    while i < blocks.len() {
        let block = &blocks[i];

        if let Some(kind) = block.block_type.list_kind() {
            let run = blocks[i..]
                .iter()
                .take_while(|b| b.block_type == block.block_type)
                .count();
            let items = blocks[i..i + run].iter().map(list_item).collect();
            content.push(match kind {
                ListKind::Bullet => TreeNode::BulletList(items),
                ListKind::Ordered => TreeNode::OrderedList(items),
                ListKind::Task => TreeNode::TaskList(items),
            });
            i += run;
            continue;
        }

        content.push(block_node(block, options));
        i += 1;
    }

    if content.is_empty() {
        content.push(TreeNode::paragraph(Vec::new()));
    }
    TreeNode::Doc(content)
}

fn list_item(block: &Block) -> TreeNode {
    let paragraph = TreeNode::paragraph(inline_content(block));
    match block.block_type {
        BlockType::Todo => TreeNode::TaskItem {
            checked: block.checked.unwrap_or(false),
            content: vec![paragraph],
        },
        _ => TreeNode::ListItem(vec![paragraph]),
    }
}

fn block_node(block: &Block, options: &ConvertOptions) -> TreeNode {
    match block.block_type {
        BlockType::Text => TreeNode::Paragraph {
            align: block.text_align,
            content: inline_content(block),
        },
        BlockType::BulletList => TreeNode::BulletList(vec![list_item(block)]),
        BlockType::NumberedList => TreeNode::OrderedList(vec![list_item(block)]),
        BlockType::Todo => TreeNode::TaskList(vec![list_item(block)]),
        BlockType::H1 | BlockType::H2 | BlockType::H3 => TreeNode::Heading {
            level: block.block_type.heading_level().unwrap_or(1),
            align: block.text_align,
            content: inline_content(block),
        },
        BlockType::Quote => TreeNode::Blockquote(vec![TreeNode::Paragraph {
            align: block.text_align,
            content: inline_content(block),
        }]),
        BlockType::Code => TreeNode::CodeBlock {
            language: block
                .language
                .clone()
                .or_else(|| fence_language(&block.content)),
            content: text_leaf(&block.content),
        },
        BlockType::Divider => TreeNode::HorizontalRule,
        BlockType::Table => {
            let payload = match &block.table {
                Some(payload) => payload.clone(),
                None => TablePayload::from_stored(&block.content, options.legacy_cell_delimiter),
            };
            table_node(&payload)
        }
        BlockType::Image | BlockType::Video | BlockType::Audio => {
            let media = block.media.clone().unwrap_or_default();
            let kind = match block.block_type {
                BlockType::Video => MediaKind::Video,
                BlockType::Audio => MediaKind::Audio,
                _ => MediaKind::Image,
            };
            TreeNode::Media {
                kind,
                src: media.src,
                alt: media.alt.filter(|a| !a.is_empty()),
                title: Some(block.content.clone()).filter(|t| !t.is_empty()),
            }
        }
        BlockType::Asset => {
            let media = block.media.clone().unwrap_or_default();
            TreeNode::Asset {
                asset_id: media
                    .asset_id
                    .or_else(|| asset_id_from_content(&block.content))
                    .unwrap_or_default(),
                media_type: media.kind.as_str().to_string(),
                src: media.src,
                alt: media.alt.filter(|a| !a.is_empty()),
                title: media.caption.filter(|c| !c.is_empty()),
            }
        }
    }
}

/// Inline leaves for a block's content.
///
/// Only mentions that satisfy the slice invariant participate; stale ones
/// are logged and their range is emitted as plain text. Emoji without
/// attributes stay text. Code content is always a single verbatim leaf.
fn inline_content(block: &Block) -> Vec<TreeNode> {
    if !block.block_type.supports_mentions() {
        return text_leaf(&block.content);
    }

    let valid: Vec<Mention> = block
        .mentions
        .iter()
        .filter(|m| {
            let valid = m.is_valid_in(&block.content);
            if !valid {
                log::debug!(
                    "block {}: mention {:?} at {}..{} is stale, exporting as text",
                    block.id,
                    m.label,
                    m.start,
                    m.end
                );
            }
            valid
        })
        .cloned()
        .collect();
    let emojis: Vec<InlineEmoji> = block
        .emojis
        .iter()
        .filter(|e| !e.attrs.is_empty() && e.is_valid_in(&block.content))
        .cloned()
        .collect();

    annotated_nodes(&block.content, &valid, &emojis, &block.marks, &block.links)
}

fn text_leaf(content: &str) -> Vec<TreeNode> {
    if content.is_empty() {
        Vec::new()
    } else {
        vec![TreeNode::text(content)]
    }
}

fn table_node(payload: &TablePayload) -> TreeNode {
    let rows = payload
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let cells = row
                .cells
                .iter()
                .map(|cell| {
                    let paragraph = vec![TreeNode::paragraph(text_leaf(cell))];
                    if payload.is_header_row(row_idx) {
                        TreeNode::TableHeader(paragraph)
                    } else {
                        TreeNode::TableCell(paragraph)
                    }
                })
                .collect();
            TreeNode::TableRow(cells)
        })
        .collect();
    TreeNode::Table(rows)
}

/// Language named by a leading code fence, e.g. ```` ```rust ````
fn fence_language(content: &str) -> Option<String> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"^```(\w+)").expect("Invalid fence regex"));
    fence
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn asset_id_from_content(content: &str) -> Option<String> {
    content
        .strip_prefix("{{asset:")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::to_string)
}
