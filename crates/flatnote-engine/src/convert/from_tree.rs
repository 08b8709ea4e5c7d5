use crate::convert::ConvertOptions;
use crate::convert::offsets::{FlatInline, flatten_inline};
use crate::models::{Block, BlockType, MediaKind, MediaRef, TablePayload, TableRow, TextAlign};
use crate::tree::TreeNode;

/// Flatten a rich-document tree into blocks.
///
/// Always returns at least one block: an absent tree, or one that produces
/// nothing, yields a single empty text block.
pub fn tree_to_blocks(tree: Option<&TreeNode>, options: &ConvertOptions) -> Vec<Block> {
    let mut blocks = Vec::new();
    if let Some(tree) = tree {
        convert_node(tree, &mut blocks, options);
    }
    if blocks.is_empty() {
        blocks.push(Block::empty());
    }
    blocks
}

fn convert_node(node: &TreeNode, out: &mut Vec<Block>, options: &ConvertOptions) {
    match node {
        TreeNode::Doc(children) => {
            for child in children {
                convert_node(child, out, options);
            }
        }
        TreeNode::Paragraph { align, content } => {
            out.push(aligned(inline_block(BlockType::Text, content), *align))
        }
        TreeNode::Heading {
            level,
            align,
            content,
        } => out.push(aligned(
            inline_block(BlockType::from_heading_level(*level), content),
            *align,
        )),
        TreeNode::BulletList(items) => list(items, BlockType::BulletList, out, options),
        TreeNode::OrderedList(items) => list(items, BlockType::NumberedList, out, options),
        TreeNode::TaskList(items) => list(items, BlockType::Todo, out, options),
        TreeNode::ListItem(content) => {
            list_item(content, BlockType::BulletList, None, out, options)
        }
        TreeNode::TaskItem { checked, content } => {
            list_item(content, BlockType::Todo, Some(*checked), out, options)
        }
        TreeNode::Blockquote(children) => {
            if children.is_empty() {
                out.push(Block::new(BlockType::Quote, ""));
            }
            for child in children {
                match child {
                    TreeNode::Paragraph { align, content } => {
                        out.push(aligned(inline_block(BlockType::Quote, content), *align))
                    }
                    other => convert_node(other, out, options),
                }
            }
        }
        TreeNode::CodeBlock { language, content } => {
            let text = flatten_inline(content).text;
            if language.as_deref() == Some("table") {
                let payload = TablePayload::parse_legacy(&text, options.legacy_cell_delimiter);
                out.push(Block::new(BlockType::Table, "").with_table(payload));
            } else {
                let mut block = Block::new(BlockType::Code, text);
                block.language = language.clone();
                out.push(block);
            }
        }
        TreeNode::HorizontalRule => out.push(Block::new(BlockType::Divider, "")),
        TreeNode::Table(rows) => {
            out.push(Block::new(BlockType::Table, "").with_table(table_payload(rows)))
        }
        TreeNode::Media {
            kind,
            src,
            alt,
            title,
        } => {
            let block_type = kind.block_type();
            let title = title.clone().unwrap_or_default();
            out.push(Block::new(block_type, title.clone()).with_media(MediaRef {
                kind: *kind,
                src: src.clone(),
                alt: alt.clone(),
                caption: Some(title).filter(|t| !t.is_empty()),
                asset_id: None,
            }));
        }
        TreeNode::Asset {
            asset_id,
            media_type,
            src,
            alt,
            title,
        } => {
            let asset_id = Some(asset_id.clone()).filter(|id| !id.is_empty());
            let (content, src) = match &asset_id {
                Some(id) if src.is_empty() => (asset_content(id), format!("/assets/{id}")),
                Some(id) => (asset_content(id), src.clone()),
                None => (String::new(), src.clone()),
            };
            out.push(Block::new(BlockType::Asset, content).with_media(MediaRef {
                kind: MediaKind::parse(media_type),
                src,
                alt: alt.clone(),
                caption: title.clone(),
                asset_id,
            }));
        }
        TreeNode::Text { .. }
        | TreeNode::Mention { .. }
        | TreeNode::Emoji { .. }
        | TreeNode::HardBreak
        | TreeNode::TableRow(_)
        | TreeNode::TableCell(_)
        | TreeNode::TableHeader(_)
        | TreeNode::Other { .. } => {
            let flat = flatten_inline(std::slice::from_ref(node));
            if !flat.is_empty() {
                out.push(flat_block(BlockType::Text, flat));
            } else {
                log::debug!("skipping empty {} node", node.kind());
            }
        }
    }
}

fn asset_content(asset_id: &str) -> String {
    format!("{{{{asset:{asset_id}}}}}")
}

fn list(items: &[TreeNode], block_type: BlockType, out: &mut Vec<Block>, options: &ConvertOptions) {
    for item in items {
        match item {
            TreeNode::ListItem(content) => list_item(content, block_type, None, out, options),
            TreeNode::TaskItem { checked, content } => {
                list_item(content, block_type, Some(*checked), out, options)
            }
            other => convert_node(other, out, options),
        }
    }
}

/// One block for the item's first paragraph, then any remaining children
/// (nested lists, quotes, ...) as following sibling blocks.
fn list_item(
    content: &[TreeNode],
    block_type: BlockType,
    checked: Option<bool>,
    out: &mut Vec<Block>,
    options: &ConvertOptions,
) {
    let first_paragraph = content
        .iter()
        .position(|n| matches!(n, TreeNode::Paragraph { .. }));

    let mut block = match first_paragraph.map(|idx| &content[idx]) {
        Some(TreeNode::Paragraph { content: inline, .. }) => inline_block(block_type, inline),
        _ => Block::new(block_type, ""),
    };
    if block_type == BlockType::Todo {
        block.checked = Some(checked.unwrap_or(false));
    }
    out.push(block);

    for (idx, child) in content.iter().enumerate() {
        if Some(idx) != first_paragraph {
            convert_node(child, out, options);
        }
    }
}

fn inline_block(block_type: BlockType, inline: &[TreeNode]) -> Block {
    flat_block(block_type, flatten_inline(inline))
}

fn flat_block(block_type: BlockType, flat: FlatInline) -> Block {
    let mut block = Block::new(block_type, flat.text);
    block.mentions = flat.mentions;
    block.marks = flat.marks;
    block.links = flat.links;
    block.emojis = flat.emojis;
    block.normalize();
    block
}

fn aligned(mut block: Block, align: Option<TextAlign>) -> Block {
    block.text_align = align;
    block
}

/// Rows and cells are consumed here and never become blocks of their own.
/// Nested cell structure is flattened to its depth-first text.
fn table_payload(rows: &[TreeNode]) -> TablePayload {
    let mut header_row_index = None;
    let rows = rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| match row {
            TreeNode::TableRow(cells) => {
                if header_row_index.is_none()
                    && cells.iter().any(|c| matches!(c, TreeNode::TableHeader(_)))
                {
                    header_row_index = Some(row_idx);
                }
                TableRow {
                    cells: cells
                        .iter()
                        .filter(|c| matches!(c, TreeNode::TableCell(_) | TreeNode::TableHeader(_)))
                        .map(|c| flatten_inline(c.children()).text)
                        .collect(),
                }
            }
            other => {
                log::warn!("table child {} is not a row, keeping an empty row", other.kind());
                TableRow::default()
            }
        })
        .collect();

    TablePayload {
        rows,
        header_row_index: header_row_index.unwrap_or(0),
    }
}
