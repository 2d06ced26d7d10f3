//! # ConvLSTM Layer for Sequence Processing
//!
//! This module provides the complete recurrent layer that handles sequence
//! layout, zero-state initialization and bidirectional processing.
//! **This is the primary API most users should use.**
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
//! let cell = ConvLstmCellConfig::new(3, 4, [3, 3]).with_padding([1, 1]);
//! let convlstm = ConvLstm::<Backend>::new(&cell, &device)
//!     .unwrap()
//!     .with_batch_first(true);
//!
//! // [batch=2, seq=5, channels=3, height=8, width=8]
//! let input = Tensor::<Backend, 5>::zeros([2, 5, 3, 8, 8], &device);
//! let (output, (hidden, cell_state), reverse) = convlstm.forward(input, None).unwrap();
//!
//! assert_eq!(output.dims(), [2, 5, 4, 8, 8]);
//! assert_eq!(hidden.dims(), [2, 4, 8, 8]);
//! assert_eq!(cell_state.dims(), [2, 4, 8, 8]);
//! assert!(reverse.is_none());
//! ```
//!
//! ## Tensor Shapes
//!
//! ### Input Tensor (5D)
//!
//! | Format | Shape | Default |
//! |--------|-------|---------|
//! | Sequence-first | `[seq_len, batch, channels, height, width]` | ✓ Yes |
//! | Batch-first | `[batch, seq_len, channels, height, width]` | No |
//!
//! Use `.with_batch_first(true)` to switch to batch-first format.
//!
//! ### Output Tensor
//!
//! | Setting | Shape |
//! |---------|-------|
//! | `return_sequence=true` (default) | `[batch, seq_len, output_channels, out_h, out_w]` |
//! | `return_sequence=false` | `[batch, 1, output_channels, out_h, out_w]` |
//!
//! `output_channels` is `hidden_channels`, or `2 * hidden_channels` when
//! bidirectional (forward channels first, then reverse).
//!
//! ## Bidirectional Processing
//!
//! ```ignore
//! let convlstm = ConvLstm::<Backend>::new(&cell, &device)?
//!     .with_batch_first(true)
//!     .with_bidirectional(true);
//!
//! let (output, forward_state, reverse_state) = convlstm.forward(input, None)?;
//! // output: [batch, seq, 2 * hidden, out_h, out_w]
//! // reverse_state: Some((hidden, cell)) after the reverse pass reached t = 0
//! ```
//!
//! Both directions share the cell's weights.
//!
//! ## No Stateful Processing
//!
//! Every call starts from a zero state. Passing `Some(state)` to
//! [`ConvLstm::forward`] fails with
//! [`UnsupportedFeature`](crate::error::ConvLstmError::UnsupportedFeature).

pub mod conv_lstm;

pub use conv_lstm::{ConvLstm, ConvLstmConfig, ConvLstmOutput};
