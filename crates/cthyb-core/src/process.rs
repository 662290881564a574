use crate::domain::{SolverError, SolverResult};

const SEED_OFFSET: u64 = 34788;
const SEED_RANK_STRIDE: u64 = 928374;

/// Identity of this process within a fixed-size process group.
///
/// Every rank runs the identical control flow; the context only decides
/// which rank prints diagnostics and how per-rank random seeds are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessContext {
    rank: usize,
    size: usize,
}

impl ProcessContext {
    pub fn new(rank: usize, size: usize) -> SolverResult<Self> {
        if size == 0 {
            return Err(SolverError::configuration(
                "CONFIG.PROCESS_GROUP",
                "process group size must be at least 1",
            ));
        }
        if rank >= size {
            return Err(SolverError::configuration(
                "CONFIG.PROCESS_GROUP",
                format!("rank {rank} out of range for group of size {size}"),
            ));
        }
        Ok(Self { rank, size })
    }

    /// Single-process context; rank 0 of a group of one.
    pub fn serial() -> Self {
        Self { rank: 0, size: 1 }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Only the master rank performs user-visible printing.
    pub fn is_master(&self) -> bool {
        self.rank == 0
    }

    /// Rank-injective seed so that no two ranks sample identically.
    pub fn derived_seed(&self) -> u64 {
        SEED_OFFSET + SEED_RANK_STRIDE * self.rank as u64
    }

    pub fn default_verbosity(&self) -> u32 {
        if self.is_master() { 3 } else { 0 }
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::serial()
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessContext;
    use std::collections::BTreeSet;

    #[test]
    fn serial_context_is_master_with_default_verbosity() {
        let context = ProcessContext::serial();
        assert!(context.is_master());
        assert_eq!(context.size(), 1);
        assert_eq!(context.default_verbosity(), 3);
    }

    #[test]
    fn derived_seeds_are_injective_in_rank() {
        let size = 64;
        let seeds: BTreeSet<u64> = (0..size)
            .map(|rank| {
                ProcessContext::new(rank, size)
                    .expect("context should build")
                    .derived_seed()
            })
            .collect();
        assert_eq!(seeds.len(), size);
    }

    #[test]
    fn non_master_ranks_suppress_output_and_verbosity() {
        let context = ProcessContext::new(3, 8).expect("context should build");
        assert!(!context.is_master());
        assert_eq!(context.default_verbosity(), 0);
    }

    #[test]
    fn out_of_range_ranks_are_rejected() {
        assert!(ProcessContext::new(2, 2).is_err());
        assert!(ProcessContext::new(0, 0).is_err());
    }
}
