//! Convolutional LSTM Layer
//!
//! Full recurrent layer that handles tensor layout, state initialization and
//! bidirectional processing for [`ConvLstmCell`].

use crate::cells::{ConvLstmCell, ConvLstmCellConfig, ConvLstmState};
use crate::error::{self, ConvLstmError};
use burn::config::Config;
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use tracing::{debug, trace};

/// Output of [`ConvLstm::forward`]: the layer output, the final forward state
/// and, for bidirectional layers, the final reverse state.
pub type ConvLstmOutput<B> = (Tensor<B, 5>, ConvLstmState<B>, Option<ConvLstmState<B>>);

/// Configuration for a [`ConvLstm`] layer.
#[derive(Config, Debug)]
pub struct ConvLstmConfig {
    /// Configuration of the underlying cell
    pub cell: ConvLstmCellConfig,
    /// Input is `[batch, seq, ...]` instead of `[seq, batch, ...]`
    #[config(default = false)]
    pub batch_first: bool,
    /// Return every timestep rather than only the last one
    #[config(default = true)]
    pub return_sequence: bool,
    /// Also run the cell over the reversed sequence
    #[config(default = false)]
    pub bidirectional: bool,
}

impl ConvLstmConfig {
    /// Initialize a new [`ConvLstm`] layer on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<ConvLstm<B>> {
        Ok(ConvLstm::new(&self.cell, device)?
            .with_batch_first(self.batch_first)
            .with_return_sequence(self.return_sequence)
            .with_bidirectional(self.bidirectional))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// ConvLSTM layer
///
/// Runs a [`ConvLstmCell`] across the time axis of a 5D input. When
/// bidirectional, the same cell also runs from the last timestep to the first
/// from its own zero state and the two hidden sequences are concatenated along
/// the channel axis.
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct ConvLstm<B: Backend> {
    /// The cell applied at every timestep, in both directions
    cell: ConvLstmCell<B>,
    /// Whether input is batch-first (batch, seq, ...) vs (seq, batch, ...)
    #[module(skip)]
    batch_first: bool,
    /// Whether to return full sequence or just last timestep
    #[module(skip)]
    return_sequence: bool,
    /// Whether to also process the sequence in reverse
    #[module(skip)]
    bidirectional: bool,
}

impl<B: Backend> ConvLstm<B> {
    /// Create a new ConvLSTM layer
    ///
    /// Defaults to sequence-first input, full sequence output and a single
    /// direction.
    ///
    /// # Arguments
    /// * `cell` - Configuration of the cell
    /// * `device` - Device to create the module on
    pub fn new(cell: &ConvLstmCellConfig, device: &B::Device) -> error::Result<Self> {
        Ok(Self {
            cell: cell.init(device)?,
            batch_first: false,
            return_sequence: true,
            bidirectional: false,
        })
    }

    /// Set whether input is batch-first (default: false)
    ///
    /// When true: input shape is [batch, seq, channels, height, width]
    /// When false: input shape is [seq, batch, channels, height, width]
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    /// Set whether to return the full sequence (default: true)
    pub fn with_return_sequence(mut self, return_sequence: bool) -> Self {
        self.return_sequence = return_sequence;
        self
    }

    /// Set whether to also run the sequence in reverse (default: false)
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// The underlying cell
    pub fn cell(&self) -> &ConvLstmCell<B> {
        &self.cell
    }

    /// Get the number of input channels
    pub fn input_channels(&self) -> usize {
        self.cell.input_channels()
    }

    /// Get the number of hidden channels per direction
    pub fn hidden_channels(&self) -> usize {
        self.cell.hidden_channels()
    }

    /// Channels of the layer output: doubled when bidirectional
    pub fn output_channels(&self) -> usize {
        if self.bidirectional {
            2 * self.cell.hidden_channels()
        } else {
            self.cell.hidden_channels()
        }
    }

    /// Whether input is batch-first
    pub fn batch_first(&self) -> bool {
        self.batch_first
    }

    /// Whether every timestep is returned
    pub fn return_sequence(&self) -> bool {
        self.return_sequence
    }

    /// Whether the sequence is also processed in reverse
    pub fn bidirectional(&self) -> bool {
        self.bidirectional
    }

    /// Forward pass through the ConvLSTM layer
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape:
    ///   - [seq, batch, channels, height, width] if batch_first=false
    ///   - [batch, seq, channels, height, width] if batch_first=true
    /// * `state` - Must be `None`; every call starts from a zero state
    ///
    /// # Returns
    /// Tuple of (output, last_state, last_state_reverse) where:
    /// - output: [batch, seq, output_channels, out_h, out_w], or
    ///   [batch, 1, output_channels, out_h, out_w] with return_sequence=false
    /// - last_state: (hidden, cell) after the last forward step
    /// - last_state_reverse: (hidden, cell) after the first timestep of the
    ///   reverse pass, `None` unless bidirectional
    ///
    /// # Errors
    ///
    /// - [`ConvLstmError::UnsupportedFeature`] when `state` is `Some`
    /// - [`ConvLstmError::ShapeMismatch`] for an empty sequence or any shape
    ///   the cell rejects
    pub fn forward(
        &self,
        input: Tensor<B, 5>,
        state: Option<ConvLstmState<B>>,
    ) -> error::Result<ConvLstmOutput<B>> {
        if state.is_some() {
            return Err(ConvLstmError::UnsupportedFeature(
                "initial state for ConvLSTM (stateful processing)",
            ));
        }

        let input = if self.batch_first {
            input
        } else {
            input.swap_dims(0, 1)
        };

        let device = input.device();
        let [batch_size, seq_len, _, height, width] = input.dims();
        if seq_len == 0 {
            return Err(ConvLstmError::shape("sequence length", [1usize], [0usize]));
        }

        debug!(
            batch_size,
            seq_len,
            height,
            width,
            bidirectional = self.bidirectional,
            "ConvLSTM forward"
        );

        let initial = self.cell.init_state(batch_size, [height, width], &device)?;
        let (outputs, last_state) = self.run(&input, Direction::Forward, initial)?;
        let mut output = Tensor::stack(outputs, 1); // [batch, seq, hidden, out_h, out_w]

        let last_state_reverse = if self.bidirectional {
            let initial = self.cell.init_state(batch_size, [height, width], &device)?;
            let (outputs, last_state) = self.run(&input, Direction::Reverse, initial)?;
            output = Tensor::cat(vec![output, Tensor::stack(outputs, 1)], 2);
            Some(last_state)
        } else {
            None
        };

        if !self.return_sequence {
            output = output.narrow(1, seq_len - 1, 1);
        }

        Ok((output, last_state, last_state_reverse))
    }

    /// Thread `state` through every timestep of a batch-first `input` in the
    /// given direction. Outputs come back in increasing time order.
    fn run(
        &self,
        input: &Tensor<B, 5>,
        direction: Direction,
        mut state: ConvLstmState<B>,
    ) -> error::Result<(Vec<Tensor<B, 4>>, ConvLstmState<B>)> {
        let [batch_size, seq_len, channels, height, width] = input.dims();
        let mut outputs: Vec<Tensor<B, 4>> = Vec::with_capacity(seq_len);

        for step in 0..seq_len {
            let t = match direction {
                Direction::Forward => step,
                Direction::Reverse => seq_len - 1 - step,
            };
            trace!(t, ?direction, "ConvLSTM step");

            // input[batch, t, ...] -> [batch, channels, height, width]
            let step_input = input
                .clone()
                .narrow(1, t, 1)
                .reshape([batch_size, channels, height, width]);

            state = self.cell.forward(step_input, state)?;
            outputs.push(state.0.clone());
        }

        if direction == Direction::Reverse {
            outputs.reverse();
        }

        Ok((outputs, state))
    }
}
