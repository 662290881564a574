use crate::domain::{SolverError, SolverResult};

/// Partition of the orbital space into named, independent sub-blocks.
///
/// Immutable once a solver has been constructed around it; every Green's
/// function container derived from it carries one sub-block per name with
/// matrix dimension equal to the index-list length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStructure {
    blocks: Vec<(String, Vec<usize>)>,
}

impl BlockStructure {
    pub fn new(blocks: Vec<(String, Vec<usize>)>) -> SolverResult<Self> {
        if blocks.is_empty() {
            return Err(SolverError::configuration(
                "CONFIG.BLOCK_STRUCTURE",
                "block structure must contain at least one block",
            ));
        }
        for (position, (name, indices)) in blocks.iter().enumerate() {
            if name.is_empty() {
                return Err(SolverError::configuration(
                    "CONFIG.BLOCK_STRUCTURE",
                    format!("block at position {position} has an empty name"),
                ));
            }
            if indices.is_empty() {
                return Err(SolverError::configuration(
                    "CONFIG.BLOCK_STRUCTURE",
                    format!("block '{name}' has an empty orbital index list"),
                ));
            }
            if blocks[..position].iter().any(|(other, _)| other == name) {
                return Err(SolverError::configuration(
                    "CONFIG.BLOCK_STRUCTURE",
                    format!("duplicate block name '{name}'"),
                ));
            }
        }

        Ok(Self { blocks })
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.blocks
            .iter()
            .map(|(name, indices)| (name.as_str(), indices.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|(name, _)| name.as_str())
    }

    pub fn name_at(&self, block_index: usize) -> &str {
        &self.blocks[block_index].0
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.blocks.iter().position(|(other, _)| other == name)
    }

    pub fn block_dim(&self, name: &str) -> Option<usize> {
        self.blocks
            .iter()
            .find(|(other, _)| other == name)
            .map(|(_, indices)| indices.len())
    }

    pub fn dim_at(&self, block_index: usize) -> usize {
        self.blocks[block_index].1.len()
    }
}
