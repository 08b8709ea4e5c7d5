//! Block generators shared by the bench binaries. Each binary compiles its
//! own copy of this module and calls only some of them.
#![allow(dead_code)]

use flatnote_engine::models::{Block, BlockType, Link, Mark, MarkKind, Mention, TablePayload};

pub fn generate_blocks(sections: usize) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(sections * 8);
    for section in 0..sections {
        blocks.push(Block::new(BlockType::H2, format!("Section {section}")));
        blocks.push(
            Block::text("Paragraph with a mention of @Ana and some more words after it.")
                .with_mentions(vec![Mention::new("u1", "@Ana", 28)])
                .with_marks(vec![Mark::new(MarkKind::Bold, 0..9)])
                .with_links(vec![Link::new("/words", 47..52)]),
        );
        for i in 0..3 {
            blocks.push(Block::new(BlockType::BulletList, format!("Item {i} of {section}")));
        }
        blocks.push(Block::new(BlockType::Todo, "Follow up").with_checked(section % 2 == 0));
        blocks.push(Block::new(BlockType::Table, "").with_table(TablePayload::empty(3, 3)));
        blocks.push(Block::new(BlockType::Code, "fn example() {\n    let value = 42;\n}"));
    }
    blocks
}

pub fn generate_long_block(words: usize) -> Block {
    let mut content = String::new();
    let mut mentions = Vec::new();
    for i in 0..words {
        if i % 25 == 0 {
            mentions.push(Mention::new(format!("u{i}"), "@Bo", content.chars().count()));
            content.push_str("@Bo ");
        } else {
            content.push_str("lorem ");
        }
    }
    Block::with_id("long", BlockType::Text, content).with_mentions(mentions)
}
