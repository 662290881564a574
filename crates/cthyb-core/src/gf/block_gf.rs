use super::{BlockStructure, ImTimeMesh, MatsubaraMesh, TailMoments};
use crate::numerics::DenseComplexMatrix;

fn zero_blocks(structure: &BlockStructure, n_points: usize) -> Vec<Vec<DenseComplexMatrix>> {
    (0..structure.n_blocks())
        .map(|block_index| {
            let dim = structure.dim_at(block_index);
            (0..n_points)
                .map(|_| DenseComplexMatrix::zeros(dim, dim))
                .collect()
        })
        .collect()
}

/// Block Green's function on a uniform imaginary-time mesh.
///
/// `data[block][point]` is the dense matrix over the block's orbital
/// indices; a freshly constructed instance is zero-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGfImTime {
    mesh: ImTimeMesh,
    structure: BlockStructure,
    data: Vec<Vec<DenseComplexMatrix>>,
}

impl BlockGfImTime {
    pub fn new(mesh: ImTimeMesh, structure: BlockStructure) -> Self {
        let data = zero_blocks(&structure, mesh.len());
        Self {
            mesh,
            structure,
            data,
        }
    }

    pub fn mesh(&self) -> &ImTimeMesh {
        &self.mesh
    }

    pub fn structure(&self) -> &BlockStructure {
        &self.structure
    }

    pub fn value(&self, block_index: usize, point: usize) -> &DenseComplexMatrix {
        &self.data[block_index][point]
    }

    pub fn value_mut(&mut self, block_index: usize, point: usize) -> &mut DenseComplexMatrix {
        &mut self.data[block_index][point]
    }

    pub fn block(&self, block_index: usize) -> &[DenseComplexMatrix] {
        &self.data[block_index]
    }
}

/// Block Green's function on a fermionic Matsubara mesh, optionally
/// carrying known high-frequency tail moments as metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGfImFreq {
    mesh: MatsubaraMesh,
    structure: BlockStructure,
    data: Vec<Vec<DenseComplexMatrix>>,
    tail: Option<TailMoments>,
}

impl BlockGfImFreq {
    pub fn new(mesh: MatsubaraMesh, structure: BlockStructure) -> Self {
        let data = zero_blocks(&structure, mesh.len());
        Self {
            mesh,
            structure,
            data,
            tail: None,
        }
    }

    pub fn mesh(&self) -> &MatsubaraMesh {
        &self.mesh
    }

    pub fn structure(&self) -> &BlockStructure {
        &self.structure
    }

    pub fn tail(&self) -> Option<&TailMoments> {
        self.tail.as_ref()
    }

    pub fn set_tail(&mut self, tail: TailMoments) {
        self.tail = Some(tail);
    }

    pub fn clear_tail(&mut self) {
        self.tail = None;
    }

    pub fn value(&self, block_index: usize, point: usize) -> &DenseComplexMatrix {
        &self.data[block_index][point]
    }

    pub fn value_mut(&mut self, block_index: usize, point: usize) -> &mut DenseComplexMatrix {
        &mut self.data[block_index][point]
    }

    pub fn block(&self, block_index: usize) -> &[DenseComplexMatrix] {
        &self.data[block_index]
    }

    /// True when `other` lives on the same mesh with the same block layout.
    pub fn same_layout(&self, other: &Self) -> bool {
        self.mesh == other.mesh && self.structure == other.structure
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().flatten().all(|matrix| {
            (0..matrix.nrows())
                .all(|row| (0..matrix.ncols()).all(|col| matrix[(row, col)].norm_sqr() == 0.0))
        })
    }
}

/// Legendre-coefficient representation of a measured Green's function;
/// raw engine output only, never post-processed here.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGfLegendre {
    n_l: usize,
    structure: BlockStructure,
    data: Vec<Vec<DenseComplexMatrix>>,
}

impl BlockGfLegendre {
    pub fn new(n_l: usize, structure: BlockStructure) -> Self {
        let data = zero_blocks(&structure, n_l);
        Self {
            n_l,
            structure,
            data,
        }
    }

    pub fn n_l(&self) -> usize {
        self.n_l
    }

    pub fn structure(&self) -> &BlockStructure {
        &self.structure
    }

    pub fn coefficient(&self, block_index: usize, order: usize) -> &DenseComplexMatrix {
        &self.data[block_index][order]
    }

    pub fn coefficient_mut(&mut self, block_index: usize, order: usize) -> &mut DenseComplexMatrix {
        &mut self.data[block_index][order]
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockGfImFreq, BlockGfImTime};
    use crate::gf::{BlockStructure, ImTimeMesh, MatsubaraMesh, TailMoments};
    use num_complex::Complex64;

    fn structure() -> BlockStructure {
        BlockStructure::new(vec![
            ("up".to_string(), vec![0]),
            ("down".to_string(), vec![0, 1]),
        ])
        .expect("structure should build")
    }

    #[test]
    fn fresh_containers_are_zero_filled_with_matching_dimensions() {
        let g_tau = BlockGfImTime::new(
            ImTimeMesh::new(10.0, 64).expect("mesh should build"),
            structure(),
        );
        let g_iw = BlockGfImFreq::new(
            MatsubaraMesh::new(10.0, 32).expect("mesh should build"),
            structure(),
        );

        assert_eq!(g_tau.value(0, 0).nrows(), 1);
        assert_eq!(g_tau.value(1, 63).ncols(), 2);
        assert!(g_iw.is_zero());
        assert!(g_iw.tail().is_none());
    }

    #[test]
    fn layout_comparison_tracks_mesh_and_structure() {
        let mesh = MatsubaraMesh::new(10.0, 32).expect("mesh should build");
        let first = BlockGfImFreq::new(mesh, structure());
        let second = BlockGfImFreq::new(mesh, structure());
        let other_mesh = BlockGfImFreq::new(
            MatsubaraMesh::new(10.0, 16).expect("mesh should build"),
            structure(),
        );

        assert!(first.same_layout(&second));
        assert!(!first.same_layout(&other_mesh));
    }

    #[test]
    fn tail_metadata_travels_with_the_container() {
        let mesh = MatsubaraMesh::new(10.0, 32).expect("mesh should build");
        let mut g_iw = BlockGfImFreq::new(mesh, structure());

        g_iw.set_tail(TailMoments::bare_normalized(structure()));
        let tail = g_iw.tail().expect("tail should be present");
        assert_eq!(
            tail.moment(0, 1).expect("order 1 should exist")[(0, 0)],
            Complex64::new(1.0, 0.0)
        );

        g_iw.clear_tail();
        assert!(g_iw.tail().is_none());
    }
}
