//! Discrete architecture search space
//!
//! Building blocks (`ops`), candidate representation (`arch`), and the
//! sampling/mutation space itself (`space`).

pub mod arch;
pub mod ops;
pub mod space;

pub use arch::{ArchCandidate, NetworkArchitecture};
pub use ops::{AggregationType, Cell, CellType, Operation, OperationType};
pub use space::{DiscreteSearchSpace, NetworkSearchSpace, SearchSpaceConfig};
