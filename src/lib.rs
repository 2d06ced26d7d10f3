//! # ConvLSTM (Rust)
//!
//! Convolutional LSTM recurrent layers for spatio-temporal data using the Burn framework.
//!
//! ## Features
//!
//! - **ConvLstmCell**: LSTM cell whose input and recurrent transforms are 2D convolutions
//! - **ConvLstm**: Sequence layer over `[batch, time, channels, height, width]` tensors
//! - **Bidirectional**: Reverse pass with shared weights, concatenated along channels
//! - **Peephole**: Optional cell-to-gate connections
//! - **Normalization**: Optional batch norm on input pre-activations and spatial
//!   layer norm on input and hidden pre-activations
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use convlstm::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let convlstm = ConvLstmConfig::new(ConvLstmCellConfig::new(3, 4, [3, 3]).with_padding([1, 1]))
//!     .with_batch_first(true)
//!     .with_bidirectional(true)
//!     .init::<Backend>(&device)
//!     .unwrap();
//!
//! let input = Tensor::<Backend, 5>::zeros([2, 5, 3, 8, 8], &device);
//! let (output, _, reverse) = convlstm.forward(input, None).unwrap();
//!
//! assert_eq!(output.dims(), [2, 5, 8, 8, 8]);
//! assert!(reverse.is_some());
//! ```
//!
//! ## Cell-level Usage
//!
//! For direct cell access (single timestep processing), see [`cells`].

pub mod cells;
pub mod error;
pub mod norm;
pub mod rnn;

pub mod prelude {
    pub use crate::cells::{ConvLstmCell, ConvLstmCellConfig, ConvLstmGates, ConvLstmState};
    pub use crate::error::{ConvLstmError, Result};
    pub use crate::norm::SpatialLayerNorm;
    pub use crate::rnn::{ConvLstm, ConvLstmConfig, ConvLstmOutput};
}
