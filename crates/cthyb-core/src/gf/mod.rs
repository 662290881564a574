pub mod block;
pub mod block_gf;
pub mod mesh;
pub mod serialization;
pub mod tail;

pub use block::BlockStructure;
pub use block_gf::{BlockGfImFreq, BlockGfImTime, BlockGfLegendre};
pub use mesh::{ImTimeMesh, MatsubaraMesh};
pub use tail::TailMoments;
