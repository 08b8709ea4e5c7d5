use crate::models::{Block, BlockId};

/// Ordered, never-empty sequence of blocks.
///
/// Every mutation goes through a method here so that the version counter
/// moves with it and the non-empty rule holds: removing the last block
/// leaves a single empty text block behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
    version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    pub fn new(mut blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::empty());
        }
        for block in &mut blocks {
            block.normalize();
        }
        Self { blocks, version: 0 }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Mutate one block in place. Returns `None` when `id` is unknown.
    pub fn update<R>(&mut self, id: &BlockId, f: impl FnOnce(&mut Block) -> R) -> Option<R> {
        let idx = self.index_of(id)?;
        let result = f(&mut self.blocks[idx]);
        self.version += 1;
        Some(result)
    }

    /// Insert `block` at `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, block: Block) {
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
        self.version += 1;
    }

    /// Remove a block and return it together with its former index.
    pub fn remove(&mut self, id: &BlockId) -> Option<(usize, Block)> {
        let idx = self.index_of(id)?;
        let removed = self.blocks.remove(idx);
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty());
        }
        self.version += 1;
        Some((idx, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockType;

    fn doc_with(ids: &[&str]) -> Document {
        Document::new(
            ids.iter()
                .map(|id| Block::with_id(*id, BlockType::Text, *id))
                .collect(),
        )
    }

    #[test]
    fn test_empty_document_has_one_empty_text_block() {
        let doc = Document::default();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.blocks()[0].block_type, BlockType::Text);
        assert!(doc.blocks()[0].is_empty());
    }

    #[test]
    fn test_removing_last_block_keeps_document_non_empty() {
        let mut doc = doc_with(&["a"]);
        let (idx, removed) = doc.remove(&"a".into()).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(removed.content, "a");
        assert_eq!(doc.len(), 1);
        assert_ne!(doc.blocks()[0].id, BlockId::from("a"));
    }

    #[test]
    fn test_version_moves_on_every_mutation() {
        let mut doc = doc_with(&["a", "b"]);
        assert_eq!(doc.version(), 0);
        doc.update(&"a".into(), |b| b.content.push('!'));
        doc.insert(1, Block::text("c"));
        doc.remove(&"b".into());
        assert_eq!(doc.version(), 3);
        assert_eq!(doc.block_at(1).map(|b| b.content.as_str()), Some("c"));
        assert!(doc.update(&"missing".into(), |_| ()).is_none());
        assert_eq!(doc.version(), 3);
    }

    #[test]
    fn test_new_drops_stale_mentions() {
        let block = Block::with_id("a", BlockType::Text, "hello");
        let mut block = block;
        block.mentions = vec![crate::models::Mention::new("n", "@Bo", 0)];
        let doc = Document::new(vec![block]);
        assert!(doc.blocks()[0].mentions.is_empty());
    }
}
