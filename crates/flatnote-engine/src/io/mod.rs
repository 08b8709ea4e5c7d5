use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::DocumentSink;
use crate::models::Block;
use crate::tree::TreeNode;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn read_existing(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(IoError::Io)
}

fn write_creating_parents(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}

fn json_error(path: &Path) -> impl FnOnce(serde_json::Error) -> IoError + '_ {
    move |source| IoError::Json {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a stored block array
pub fn read_blocks(path: &Path) -> Result<Vec<Block>, IoError> {
    let content = read_existing(path)?;
    serde_json::from_str(&content).map_err(json_error(path))
}

/// Write a block array as pretty JSON
pub fn write_blocks(path: &Path, blocks: &[Block]) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(blocks).map_err(json_error(path))?;
    write_creating_parents(path, &json)
}

/// Read a rich-text tree document
pub fn read_tree(path: &Path) -> Result<TreeNode, IoError> {
    let content = read_existing(path)?;
    TreeNode::from_json(&content).map_err(json_error(path))
}

pub fn write_tree(path: &Path, tree: &TreeNode) -> Result<(), IoError> {
    let json = tree.to_json_pretty().map_err(json_error(path))?;
    write_creating_parents(path, &json)
}

/// Saves the editor's blocks to a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSink for JsonFileSink {
    type Error = IoError;

    fn persist(&mut self, blocks: &[Block]) -> Result<(), IoError> {
        log::info!("saving {} blocks to {}", blocks.len(), self.path.display());
        write_blocks(&self.path, blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::Editor;
    use crate::models::{BlockType, Document, Mention};
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/page.json");
        let blocks = vec![
            Block::with_id("a", BlockType::H1, "Title"),
            Block::with_id("b", BlockType::Text, "see @Bo").with_mentions(vec![Mention::new("n", "@Bo", 4)]),
        ];

        write_blocks(&path, &blocks).unwrap();

        assert_eq!(read_blocks(&path).unwrap(), blocks);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = read_blocks(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_bad_json_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").unwrap();

        let err = read_blocks(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_unknown_block_type_reads_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.json");
        std::fs::write(&path, r#"[{"id":"x","type":"callout","content":"hi"}]"#).unwrap();

        let blocks = read_blocks(&path).unwrap();
        assert_eq!(blocks[0].block_type, BlockType::Text);
        assert_eq!(blocks[0].content, "hi");
    }

    #[test]
    fn test_tree_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.tree.json");
        let tree = TreeNode::Doc(vec![TreeNode::paragraph(vec![TreeNode::text("hello")])]);

        write_tree(&path, &tree).unwrap();

        assert_eq!(read_tree(&path).unwrap(), tree);
    }

    #[test]
    fn test_editor_saves_through_file_sink() {
        let dir = TempDir::new().unwrap();
        let mut sink = JsonFileSink::new(dir.path().join("saved.json"));
        let editor = Editor::new(Document::new(vec![Block::with_id("a", BlockType::Text, "x")]));

        editor.save(&mut sink).unwrap();

        let saved = read_blocks(sink.path()).unwrap();
        assert_eq!(saved[0].content, "x");
    }
}
