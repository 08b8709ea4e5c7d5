//! Collaborators the host plugs into the editor.

use crate::models::Block;

/// Receives the block sequence whenever the host asks the editor to save.
pub trait DocumentSink {
    type Error;

    fn persist(&mut self, blocks: &[Block]) -> Result<(), Self::Error>;
}

/// Opens the document a mention points at.
pub trait TargetNavigator {
    fn navigate_to(&mut self, target_id: &str);
}

impl DocumentSink for Vec<Vec<Block>> {
    type Error = std::convert::Infallible;

    fn persist(&mut self, blocks: &[Block]) -> Result<(), Self::Error> {
        self.push(blocks.to_vec());
        Ok(())
    }
}

impl TargetNavigator for Vec<String> {
    fn navigate_to(&mut self, target_id: &str) {
        self.push(target_id.to_string());
    }
}
