//! Architecture building blocks
//!
//! Operations, cells, and their analytic cost models.

use serde::{Deserialize, Serialize};

/// Types of operations in the search space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    /// Zero operation (severs the edge)
    Zero,
    /// Skip connection (identity)
    Skip,
    /// Fully connected layer
    Dense,
    /// 1D Convolution
    Conv1D,
    /// Max pooling
    MaxPool,
    /// Average pooling
    AvgPool,
    /// Batch normalization
    BatchNorm,
    /// Layer normalization
    LayerNorm,
    /// Dropout
    Dropout,
    /// ReLU activation
    ReLU,
    /// GELU activation
    GELU,
    /// Multi-head attention
    MultiHeadAttention,
    /// Position-wise feed-forward block
    FeedForward,
}

impl OperationType {
    /// Operations suitable for flat feature vectors
    pub fn mlp_ops() -> Vec<Self> {
        vec![
            Self::Zero,
            Self::Skip,
            Self::Dense,
            Self::BatchNorm,
            Self::LayerNorm,
            Self::Dropout,
            Self::ReLU,
            Self::GELU,
        ]
    }

    /// Operations suitable for sequence data
    pub fn sequence_ops() -> Vec<Self> {
        vec![
            Self::Zero,
            Self::Skip,
            Self::Dense,
            Self::Conv1D,
            Self::MaxPool,
            Self::AvgPool,
            Self::LayerNorm,
            Self::MultiHeadAttention,
            Self::FeedForward,
        ]
    }

    /// Whether this operation carries a hidden dimension
    pub fn has_hidden_dim(self) -> bool {
        matches!(
            self,
            Self::Dense | Self::MultiHeadAttention | Self::FeedForward
        )
    }
}

/// A single operation with parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation type
    pub op_type: OperationType,
    /// Hidden dimension (for Dense, attention, feed-forward)
    pub hidden_dim: Option<usize>,
    /// Kernel size (for convolutions)
    pub kernel_size: Option<usize>,
    /// Number of heads (for multi-head attention)
    pub num_heads: Option<usize>,
    /// Dropout rate
    pub dropout_rate: Option<f64>,
}

impl Operation {
    /// Create a new operation
    pub fn new(op_type: OperationType) -> Self {
        Self {
            op_type,
            hidden_dim: None,
            kernel_size: None,
            num_heads: None,
            dropout_rate: None,
        }
    }

    /// Set hidden dimension
    pub fn with_hidden_dim(mut self, dim: usize) -> Self {
        self.hidden_dim = Some(dim);
        self
    }

    /// Set kernel size
    pub fn with_kernel_size(mut self, size: usize) -> Self {
        self.kernel_size = Some(size);
        self
    }

    /// Set number of attention heads
    pub fn with_num_heads(mut self, heads: usize) -> Self {
        self.num_heads = Some(heads);
        self
    }

    /// Set dropout rate
    pub fn with_dropout(mut self, rate: f64) -> Self {
        self.dropout_rate = Some(rate);
        self
    }

    /// Create skip connection
    pub fn skip() -> Self {
        Self::new(OperationType::Skip)
    }

    /// Create dense layer
    pub fn dense(hidden_dim: usize) -> Self {
        Self::new(OperationType::Dense).with_hidden_dim(hidden_dim)
    }

    /// Create attention layer
    pub fn attention(hidden_dim: usize, num_heads: usize) -> Self {
        Self::new(OperationType::MultiHeadAttention)
            .with_hidden_dim(hidden_dim)
            .with_num_heads(num_heads)
    }

    /// Number of trainable parameters contributed by this operation,
    /// given the surrounding hidden width.
    pub fn param_cost(&self, hidden: usize) -> usize {
        let out = self.hidden_dim.unwrap_or(hidden);
        match self.op_type {
            OperationType::Dense => hidden * out + out,
            OperationType::FeedForward => {
                // expand + project, expansion factor 4
                let inner = 4 * out;
                hidden * inner + inner + inner * hidden + hidden
            }
            OperationType::MultiHeadAttention => 4 * hidden * out,
            OperationType::LayerNorm | OperationType::BatchNorm => 2 * hidden,
            OperationType::Conv1D => {
                let kernel = self.kernel_size.unwrap_or(3);
                kernel * hidden * out + out
            }
            _ => 0,
        }
    }

    /// Multiply-accumulate count for one forward pass over `seq_len` positions.
    pub fn flop_cost(&self, hidden: usize, seq_len: usize) -> usize {
        let out = self.hidden_dim.unwrap_or(hidden);
        match self.op_type {
            OperationType::Dense => 2 * seq_len * hidden * out,
            OperationType::FeedForward => 2 * seq_len * hidden * 4 * out * 2,
            OperationType::MultiHeadAttention => {
                // projections plus the n^2 score matrix
                4 * 2 * seq_len * hidden * out + 4 * seq_len * seq_len * hidden
            }
            OperationType::Conv1D => {
                let kernel = self.kernel_size.unwrap_or(3);
                2 * seq_len * kernel * hidden * out
            }
            OperationType::MaxPool | OperationType::AvgPool => seq_len * hidden,
            OperationType::LayerNorm | OperationType::BatchNorm => 4 * seq_len * hidden,
            OperationType::ReLU | OperationType::GELU => seq_len * hidden,
            _ => 0,
        }
    }
}

/// Cell type in the architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    /// Normal cell (preserves dimensions)
    Normal,
    /// Reduction cell (reduces dimensions)
    Reduction,
}

/// How a cell aggregates its node outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationType {
    /// Sum outputs
    Sum,
    /// Concatenate outputs
    Concat,
    /// Average outputs
    Mean,
}

/// A cell: a small DAG of operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell type
    pub cell_type: CellType,
    /// Operations in this cell
    pub operations: Vec<Operation>,
    /// Input indices for each operation
    pub input_indices: Vec<Vec<usize>>,
    /// Output aggregation method
    pub output_aggregation: AggregationType,
}

impl Cell {
    /// Create a new cell
    pub fn new(cell_type: CellType) -> Self {
        Self {
            cell_type,
            operations: Vec::new(),
            input_indices: Vec::new(),
            output_aggregation: AggregationType::Sum,
        }
    }

    /// Add an operation with its input connections
    pub fn add_operation(mut self, op: Operation, inputs: Vec<usize>) -> Self {
        self.operations.push(op);
        self.input_indices.push(inputs);
        self
    }

    /// Set output aggregation
    pub fn with_aggregation(mut self, agg: AggregationType) -> Self {
        self.output_aggregation = agg;
        self
    }

    /// Number of operations
    pub fn num_ops(&self) -> usize {
        self.operations.len()
    }

    /// Summed parameter cost of all operations in the cell
    pub fn param_cost(&self, hidden: usize) -> usize {
        self.operations.iter().map(|op| op.param_cost(hidden)).sum()
    }

    /// Summed FLOP cost of all operations in the cell
    pub fn flop_cost(&self, hidden: usize, seq_len: usize) -> usize {
        self.operations
            .iter()
            .map(|op| op.flop_cost(hidden, seq_len))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_builder() {
        let op = Operation::dense(128).with_dropout(0.2);
        assert_eq!(op.hidden_dim, Some(128));
        assert_eq!(op.dropout_rate, Some(0.2));
    }

    #[test]
    fn test_cell_builder() {
        let cell = Cell::new(CellType::Normal)
            .add_operation(Operation::dense(64), vec![0])
            .add_operation(Operation::skip(), vec![0, 1])
            .with_aggregation(AggregationType::Concat);

        assert_eq!(cell.num_ops(), 2);
        assert_eq!(cell.output_aggregation, AggregationType::Concat);
    }

    #[test]
    fn test_param_cost() {
        let dense = Operation::dense(64);
        assert_eq!(dense.param_cost(32), 32 * 64 + 64);

        let skip = Operation::skip();
        assert_eq!(skip.param_cost(32), 0);

        let norm = Operation::new(OperationType::LayerNorm);
        assert_eq!(norm.param_cost(32), 64);
    }

    #[test]
    fn test_flop_cost_scales_with_seq_len() {
        let attn = Operation::attention(64, 4);
        let short = attn.flop_cost(64, 16);
        let long = attn.flop_cost(64, 64);
        assert!(long > short);
    }

    #[test]
    fn test_cell_cost_is_sum_of_ops() {
        let cell = Cell::new(CellType::Normal)
            .add_operation(Operation::dense(64), vec![0])
            .add_operation(Operation::new(OperationType::LayerNorm), vec![1]);

        let expected = Operation::dense(64).param_cost(64)
            + Operation::new(OperationType::LayerNorm).param_cost(64);
        assert_eq!(cell.param_cost(64), expected);
    }
}
