//! # ConvLSTM Cell
//!
//! Single-timestep convolutional LSTM cell. The cell processes one timestep at
//! a time and is wrapped by the sequence layer in [`crate::rnn`].
//!
//! ## When to Use the Cell Directly
//!
//! Most users should use [`ConvLstm`](crate::rnn::ConvLstm), which handles
//! layout, state initialization and both directions. Use the cell directly when
//! you need:
//!
//! - Custom sequence processing logic
//! - Access to the gate activations of a step ([`ConvLstmCell::gates`])
//! - Fine-grained control over state management
//!
//! ## Variants
//!
//! | Flag | Effect |
//! |------|--------|
//! | `peephole` | Adds `rnn_conv(c) ⊙ c` to the input, forget and output gates |
//! | `batch_norm` | Batch-normalizes the input convolution before gating |
//! | `layer_norm` | Normalizes input and hidden convolutions over the spatial plane |
//!
//! Layer norm is built for one spatial size (`layer_norm_shape`, 4×4 by
//! default). A state of any other spatial size is rejected with
//! [`ShapeMismatch`](crate::error::ConvLstmError::ShapeMismatch).
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape | Description |
//! |--------|-------|-------------|
//! | `input` | `[batch, input_channels, height, width]` | Input feature map |
//! | `hidden` | `[batch, hidden_channels, out_h, out_w]` | Hidden state |
//! | `cell` | `[batch, hidden_channels, out_h, out_w]` | Cell state |
//!
//! `out_h = (height - kernel_h + 2 * padding_h) / stride_h + 1`, `out_w` likewise.
//!
//! ## Example
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use convlstm::cells::ConvLstmCellConfig;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let cell = ConvLstmCellConfig::new(3, 16, [3, 3])
//!     .with_padding([1, 1])
//!     .init::<Backend>(&device)
//!     .unwrap();
//!
//! let input = Tensor::<Backend, 4>::zeros([2, 3, 32, 32], &device);
//! let state = cell.init_state(2, [32, 32], &device).unwrap();
//!
//! let (hidden, cell_state) = cell.forward(input, state).unwrap();
//! assert_eq!(hidden.dims(), [2, 16, 32, 32]);
//! assert_eq!(cell_state.dims(), [2, 16, 32, 32]);
//! ```

pub mod conv_lstm_cell;

pub use conv_lstm_cell::{ConvLstmCell, ConvLstmCellConfig, ConvLstmGates, ConvLstmState};
