use super::{BlockGfImFreq, BlockGfImTime, BlockStructure, ImTimeMesh, MatsubaraMesh, TailMoments};
use crate::domain::{SolverError, SolverResult};
use crate::numerics::DenseComplexMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Serialized matrix as row-major `[re, im]` pairs.
type MatrixValues = Vec<Vec<(f64, f64)>>;

fn matrix_to_values(matrix: &DenseComplexMatrix) -> MatrixValues {
    (0..matrix.nrows())
        .map(|row| {
            (0..matrix.ncols())
                .map(|col| {
                    let value = matrix[(row, col)];
                    (value.re, value.im)
                })
                .collect()
        })
        .collect()
}

fn values_to_matrix(values: &MatrixValues, dim: usize, context: &str) -> SolverResult<DenseComplexMatrix> {
    if values.len() != dim || values.iter().any(|row| row.len() != dim) {
        return Err(SolverError::configuration(
            "CONFIG.SERIALIZED_MATRIX",
            format!("{context}: expected a {dim}x{dim} matrix"),
        ));
    }
    let mut matrix = DenseComplexMatrix::zeros(dim, dim);
    for (row_index, row) in values.iter().enumerate() {
        for (col_index, &(re, im)) in row.iter().enumerate() {
            matrix[(row_index, col_index)] = Complex64::new(re, im);
        }
    }
    Ok(matrix)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureModel {
    pub blocks: Vec<StructureBlockModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureBlockModel {
    pub name: String,
    pub indices: Vec<usize>,
}

impl StructureModel {
    pub fn from_structure(structure: &BlockStructure) -> Self {
        Self {
            blocks: structure
                .iter()
                .map(|(name, indices)| StructureBlockModel {
                    name: name.to_string(),
                    indices: indices.to_vec(),
                })
                .collect(),
        }
    }

    pub fn to_structure(&self) -> SolverResult<BlockStructure> {
        BlockStructure::new(
            self.blocks
                .iter()
                .map(|block| (block.name.clone(), block.indices.clone()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GfBlockModel {
    pub name: String,
    /// Indexed as `[mesh point][row][col]`.
    pub values: Vec<MatrixValues>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailBlockModel {
    pub name: String,
    /// Indexed as `[moment order][row][col]`, starting at order 0.
    pub moments: Vec<MatrixValues>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImFreqGfModel {
    pub beta: f64,
    pub n_iw: usize,
    pub blocks: Vec<GfBlockModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<Vec<TailBlockModel>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImTimeGfModel {
    pub beta: f64,
    pub n_tau: usize,
    pub blocks: Vec<GfBlockModel>,
}

impl ImFreqGfModel {
    pub fn from_gf(gf: &BlockGfImFreq) -> Self {
        let blocks = gf
            .structure()
            .names()
            .enumerate()
            .map(|(block_index, name)| GfBlockModel {
                name: name.to_string(),
                values: gf.block(block_index).iter().map(matrix_to_values).collect(),
            })
            .collect();
        let tail = gf.tail().map(|tail| {
            gf.structure()
                .names()
                .enumerate()
                .map(|(block_index, name)| TailBlockModel {
                    name: name.to_string(),
                    moments: (0..=tail.max_order())
                        .map(|order| {
                            matrix_to_values(
                                tail.moment(block_index, order)
                                    .expect("moment orders are dense"),
                            )
                        })
                        .collect(),
                })
                .collect()
        });

        Self {
            beta: gf.mesh().beta(),
            n_iw: gf.mesh().len(),
            blocks,
            tail,
        }
    }

    pub fn to_gf(&self, structure: &BlockStructure) -> SolverResult<BlockGfImFreq> {
        let mesh = MatsubaraMesh::new(self.beta, self.n_iw)?;
        let mut gf = BlockGfImFreq::new(mesh, structure.clone());

        for (block_index, name) in structure.names().enumerate() {
            let dim = structure.dim_at(block_index);
            let block = self
                .blocks
                .iter()
                .find(|block| block.name == name)
                .ok_or_else(|| {
                    SolverError::configuration(
                        "CONFIG.SERIALIZED_GF",
                        format!("serialized G(iw) is missing block '{name}'"),
                    )
                })?;
            if block.values.len() != self.n_iw {
                return Err(SolverError::configuration(
                    "CONFIG.SERIALIZED_GF",
                    format!(
                        "block '{name}' has {} mesh points, expected {}",
                        block.values.len(),
                        self.n_iw
                    ),
                ));
            }
            for (point, values) in block.values.iter().enumerate() {
                *gf.value_mut(block_index, point) =
                    values_to_matrix(values, dim, &format!("G(iw) block '{name}'"))?;
            }
        }

        if let Some(tail_blocks) = &self.tail {
            gf.set_tail(tail_from_models(structure, tail_blocks)?);
        }
        Ok(gf)
    }
}

impl ImTimeGfModel {
    pub fn from_gf(gf: &BlockGfImTime) -> Self {
        let blocks = gf
            .structure()
            .names()
            .enumerate()
            .map(|(block_index, name)| GfBlockModel {
                name: name.to_string(),
                values: gf.block(block_index).iter().map(matrix_to_values).collect(),
            })
            .collect();
        Self {
            beta: gf.mesh().beta(),
            n_tau: gf.mesh().len(),
            blocks,
        }
    }

    pub fn to_gf(&self, structure: &BlockStructure) -> SolverResult<BlockGfImTime> {
        let mesh = ImTimeMesh::new(self.beta, self.n_tau)?;
        let mut gf = BlockGfImTime::new(mesh, structure.clone());

        for (block_index, name) in structure.names().enumerate() {
            let dim = structure.dim_at(block_index);
            let block = self
                .blocks
                .iter()
                .find(|block| block.name == name)
                .ok_or_else(|| {
                    SolverError::configuration(
                        "CONFIG.SERIALIZED_GF",
                        format!("serialized G(tau) is missing block '{name}'"),
                    )
                })?;
            if block.values.len() != self.n_tau {
                return Err(SolverError::configuration(
                    "CONFIG.SERIALIZED_GF",
                    format!(
                        "block '{name}' has {} mesh points, expected {}",
                        block.values.len(),
                        self.n_tau
                    ),
                ));
            }
            for (point, values) in block.values.iter().enumerate() {
                *gf.value_mut(block_index, point) =
                    values_to_matrix(values, dim, &format!("G(tau) block '{name}'"))?;
            }
        }
        Ok(gf)
    }
}

pub fn tail_from_models(
    structure: &BlockStructure,
    blocks: &[TailBlockModel],
) -> SolverResult<TailMoments> {
    let max_order = blocks
        .first()
        .map(|block| block.moments.len().saturating_sub(1))
        .unwrap_or(0);
    if blocks
        .iter()
        .any(|block| block.moments.len() != max_order + 1)
    {
        return Err(SolverError::configuration(
            "CONFIG.SERIALIZED_TAIL",
            "all tail blocks must carry the same number of moment orders",
        ));
    }

    let mut tail = TailMoments::zero(structure.clone(), max_order);
    for (block_index, name) in structure.names().enumerate() {
        let dim = structure.dim_at(block_index);
        let block = blocks
            .iter()
            .find(|block| block.name == name)
            .ok_or_else(|| {
                SolverError::configuration(
                    "CONFIG.SERIALIZED_TAIL",
                    format!("serialized tail is missing block '{name}'"),
                )
            })?;
        for (order, values) in block.moments.iter().enumerate() {
            let moment = values_to_matrix(values, dim, &format!("tail block '{name}'"))?;
            tail.set_moment(block_index, order, moment)?;
        }
    }
    Ok(tail)
}

#[cfg(test)]
mod tests {
    use super::{ImFreqGfModel, ImTimeGfModel, StructureModel};
    use crate::gf::{BlockGfImFreq, BlockGfImTime, BlockStructure, ImTimeMesh, MatsubaraMesh, TailMoments};
    use num_complex::Complex64;

    fn structure() -> BlockStructure {
        BlockStructure::new(vec![
            ("up".to_string(), vec![0]),
            ("down".to_string(), vec![0, 1]),
        ])
        .expect("structure should build")
    }

    #[test]
    fn structure_model_round_trips_through_json() {
        let model = StructureModel::from_structure(&structure());
        let json = serde_json::to_string(&model).expect("serialization should succeed");
        let parsed: StructureModel =
            serde_json::from_str(&json).expect("deserialization should succeed");

        assert_eq!(parsed.to_structure().expect("structure should build"), structure());
    }

    #[test]
    fn frequency_gf_round_trips_with_tail_metadata() {
        let mesh = MatsubaraMesh::new(5.0, 4).expect("mesh should build");
        let mut gf = BlockGfImFreq::new(mesh, structure());
        gf.value_mut(0, 2)[(0, 0)] = Complex64::new(0.25, -1.5);
        gf.value_mut(1, 0)[(1, 0)] = Complex64::new(-0.5, 0.125);
        gf.set_tail(TailMoments::bare_normalized(structure()));

        let model = ImFreqGfModel::from_gf(&gf);
        let json = serde_json::to_string(&model).expect("serialization should succeed");
        let parsed: ImFreqGfModel =
            serde_json::from_str(&json).expect("deserialization should succeed");
        let rebuilt = parsed.to_gf(&structure()).expect("gf should rebuild");

        assert_eq!(rebuilt, gf);
    }

    #[test]
    fn time_gf_round_trips_exactly() {
        let mesh = ImTimeMesh::new(5.0, 3).expect("mesh should build");
        let mut gf = BlockGfImTime::new(mesh, structure());
        gf.value_mut(1, 2)[(0, 1)] = Complex64::new(-0.75, 0.0);

        let model = ImTimeGfModel::from_gf(&gf);
        let json = serde_json::to_string(&model).expect("serialization should succeed");
        let parsed: ImTimeGfModel =
            serde_json::from_str(&json).expect("deserialization should succeed");

        assert_eq!(parsed.to_gf(&structure()).expect("gf should rebuild"), gf);
    }

    #[test]
    fn missing_blocks_are_rejected() {
        let mesh = MatsubaraMesh::new(5.0, 4).expect("mesh should build");
        let single = BlockStructure::new(vec![("up".to_string(), vec![0])])
            .expect("structure should build");
        let gf = BlockGfImFreq::new(mesh, single);
        let model = ImFreqGfModel::from_gf(&gf);

        let error = model
            .to_gf(&structure())
            .expect_err("missing 'down' block should fail");
        assert_eq!(error.placeholder(), "CONFIG.SERIALIZED_GF");
    }
}
