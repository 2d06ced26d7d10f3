use crate::error::{self, ConvLstmError};
use crate::norm::{SpatialLayerNorm, DEFAULT_LAYER_NORM_SHAPE};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, Dropout, DropoutConfig, PaddingConfig2d};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use tracing::debug;

/// `(hidden, cell)` state of a ConvLSTM, each `[batch, hidden_channels, height, width]`.
pub type ConvLstmState<B> = (Tensor<B, 4>, Tensor<B, 4>);

/// Configuration for a [`ConvLstmCell`].
///
/// `stride` and `padding` apply to the input convolution only. The recurrent
/// convolution always runs with stride 1 and `kernel_size / 2` padding so the
/// state keeps its spatial size from one step to the next.
#[derive(Config, Debug)]
pub struct ConvLstmCellConfig {
    /// Number of channels of the input feature map
    pub input_channels: usize,
    /// Number of channels of the hidden and cell state
    pub hidden_channels: usize,
    /// Kernel size shared by the input and recurrent convolutions
    pub kernel_size: [usize; 2],
    /// Stride of the input convolution
    #[config(default = "[1, 1]")]
    pub stride: [usize; 2],
    /// Padding of the input convolution
    #[config(default = "[0, 0]")]
    pub padding: [usize; 2],
    /// Dropout rate applied to the input map
    #[config(default = 0.0)]
    pub cnn_dropout: f64,
    /// Dropout rate applied to the hidden and cell state
    #[config(default = 0.0)]
    pub rnn_dropout: f64,
    /// Whether both convolutions carry a bias
    #[config(default = true)]
    pub bias: bool,
    /// Connect the previous cell state to the input, forget and output gates
    #[config(default = false)]
    pub peephole: bool,
    /// Batch-normalize the input pre-activations
    #[config(default = false)]
    pub batch_norm: bool,
    /// Layer-normalize input and hidden pre-activations over the spatial plane
    #[config(default = false)]
    pub layer_norm: bool,
    /// Spatial output size the layer norm is built for
    #[config(default = "DEFAULT_LAYER_NORM_SHAPE")]
    pub layer_norm_shape: [usize; 2],
}

impl ConvLstmCellConfig {
    /// Initialize a new [`ConvLstmCell`] on `device`.
    ///
    /// # Errors
    ///
    /// [`ConvLstmError::Configuration`] when a size is zero, a kernel side is
    /// even (the recurrent convolution could not preserve the state shape) or
    /// a dropout rate lies outside `[0, 1)`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<ConvLstmCell<B>> {
        self.validate()?;

        let conv = Conv2dConfig::new([self.input_channels, self.hidden_channels], self.kernel_size)
            .with_stride(self.stride)
            .with_padding(PaddingConfig2d::Explicit(self.padding[0], self.padding[1]))
            .with_bias(self.bias)
            .init(device);

        let rnn_conv = Conv2dConfig::new([self.hidden_channels, self.hidden_channels], self.kernel_size)
            .with_padding(PaddingConfig2d::Explicit(
                self.kernel_size[0] / 2,
                self.kernel_size[1] / 2,
            ))
            .with_bias(self.bias)
            .init(device);

        let batch_norm = if self.batch_norm {
            Some(BatchNormConfig::new(self.hidden_channels).init(device))
        } else {
            None
        };

        let layer_norm = if self.layer_norm {
            Some(SpatialLayerNorm::new(self.layer_norm_shape))
        } else {
            None
        };

        debug!(
            input_channels = self.input_channels,
            hidden_channels = self.hidden_channels,
            kernel_size = ?self.kernel_size,
            stride = ?self.stride,
            padding = ?self.padding,
            peephole = self.peephole,
            batch_norm = self.batch_norm,
            layer_norm = self.layer_norm,
            "initialized ConvLSTM cell"
        );

        Ok(ConvLstmCell {
            conv,
            rnn_conv,
            cnn_dropout: DropoutConfig::new(self.cnn_dropout).init(),
            rnn_dropout: DropoutConfig::new(self.rnn_dropout).init(),
            batch_norm,
            layer_norm,
            input_channels: self.input_channels,
            hidden_channels: self.hidden_channels,
            kernel_size: self.kernel_size,
            stride: self.stride,
            padding: self.padding,
            peephole: self.peephole,
        })
    }

    fn validate(&self) -> error::Result<()> {
        if self.input_channels == 0 || self.hidden_channels == 0 {
            return Err(ConvLstmError::Configuration(format!(
                "channel counts must be positive (input {}, hidden {})",
                self.input_channels, self.hidden_channels
            )));
        }
        if self.kernel_size.contains(&0) || self.stride.contains(&0) {
            return Err(ConvLstmError::Configuration(format!(
                "kernel size {:?} and stride {:?} must be positive",
                self.kernel_size, self.stride
            )));
        }
        if self.kernel_size.iter().any(|k| k % 2 == 0) {
            return Err(ConvLstmError::Configuration(format!(
                "kernel size {:?} must be odd to keep the state shape fixed",
                self.kernel_size
            )));
        }
        for (name, rate) in [("cnn_dropout", self.cnn_dropout), ("rnn_dropout", self.rnn_dropout)] {
            // Burn's dropout rescales by 1 / (1 - rate)
            if !(0.0..1.0).contains(&rate) {
                return Err(ConvLstmError::Configuration(format!(
                    "{} must be within [0, 1), got {}",
                    name, rate
                )));
            }
        }
        if self.layer_norm && self.layer_norm_shape.contains(&0) {
            return Err(ConvLstmError::Configuration(format!(
                "layer norm shape {:?} must be positive",
                self.layer_norm_shape
            )));
        }
        Ok(())
    }
}

/// Post-activation gates of a single ConvLSTM step.
#[derive(Debug, Clone)]
pub struct ConvLstmGates<B: Backend> {
    /// `i = σ(x_i + h_i [+ c_i ⊙ c])`
    pub input: Tensor<B, 4>,
    /// `f = σ(x_f + h_f [+ c_f ⊙ c])`
    pub forget: Tensor<B, 4>,
    /// `g = tanh(x_c + h_c)`
    pub candidate: Tensor<B, 4>,
    /// `o = σ(x_o + h_o [+ c_o ⊙ c])`
    pub output: Tensor<B, 4>,
}

/// Convolutional LSTM cell
///
/// Processes a single timestep. The dense products of a classic LSTM are
/// replaced by 2D convolutions:
/// - i = σ(conv(x) + rnn_conv(h) [+ rnn_conv(c) ⊙ c])
/// - f = σ(conv(x) + rnn_conv(h) [+ rnn_conv(c) ⊙ c])
/// - g = tanh(conv(x) + rnn_conv(h))
/// - o = σ(conv(x) + rnn_conv(h) [+ rnn_conv(c) ⊙ c])
/// - c' = f ⊙ c + i ⊙ g
/// - h' = o ⊙ tanh(c')
///
/// All four gates read the same `conv` and the same `rnn_conv`; the terms in
/// brackets are only present with peephole connections enabled. With shared
/// weights the input, forget and output pre-activations coincide; the gates
/// differ in their nonlinearity and in how they enter the state update.
///
/// See [`crate::rnn::ConvLstm`] for the sequence layer.
#[derive(Module, Debug)]
pub struct ConvLstmCell<B: Backend> {
    conv: Conv2d<B>,
    rnn_conv: Conv2d<B>,
    cnn_dropout: Dropout,
    rnn_dropout: Dropout,
    batch_norm: Option<BatchNorm<B>>,
    layer_norm: Option<SpatialLayerNorm>,
    #[module(skip)]
    input_channels: usize,
    #[module(skip)]
    hidden_channels: usize,
    #[module(skip)]
    kernel_size: [usize; 2],
    #[module(skip)]
    stride: [usize; 2],
    #[module(skip)]
    padding: [usize; 2],
    #[module(skip)]
    peephole: bool,
}

impl<B: Backend> ConvLstmCell<B> {
    /// Get the number of input channels
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Get the number of hidden channels
    pub fn hidden_channels(&self) -> usize {
        self.hidden_channels
    }

    /// Get the kernel size shared by both convolutions
    pub fn kernel_size(&self) -> [usize; 2] {
        self.kernel_size
    }

    /// Get the stride of the input convolution
    pub fn stride(&self) -> [usize; 2] {
        self.stride
    }

    /// Get the padding of the input convolution
    pub fn padding(&self) -> [usize; 2] {
        self.padding
    }

    /// Whether peephole connections are enabled
    pub fn peephole(&self) -> bool {
        self.peephole
    }

    /// Whether the input pre-activations are batch-normalized
    pub fn batch_norm(&self) -> bool {
        self.batch_norm.is_some()
    }

    /// Whether the pre-activations are layer-normalized
    pub fn layer_norm(&self) -> bool {
        self.layer_norm.is_some()
    }

    /// Spatial size of the state for an input of spatial size `input_size`.
    ///
    /// `out = (in - kernel + 2 * padding) / stride + 1` per axis.
    ///
    /// # Errors
    ///
    /// [`ConvLstmError::ShapeMismatch`] when the padded input is smaller than
    /// the kernel, i.e. the convolution would have no output.
    pub fn output_size(&self, input_size: [usize; 2]) -> error::Result<[usize; 2]> {
        let mut output = [0; 2];
        for axis in 0..2 {
            let span = input_size[axis] + 2 * self.padding[axis];
            if span < self.kernel_size[axis] {
                return Err(ConvLstmError::shape(
                    "padded input smaller than kernel",
                    self.kernel_size,
                    [input_size[0] + 2 * self.padding[0], input_size[1] + 2 * self.padding[1]],
                ));
            }
            output[axis] = (span - self.kernel_size[axis]) / self.stride[axis] + 1;
        }
        Ok(output)
    }

    /// Zero `(hidden, cell)` state for a batch of inputs of spatial size `input_size`
    ///
    /// # Returns
    /// Two zero tensors of shape `[batch_size, hidden_channels, out_h, out_w]`
    /// with the spatial size given by [`Self::output_size`].
    pub fn init_state(
        &self,
        batch_size: usize,
        input_size: [usize; 2],
        device: &B::Device,
    ) -> error::Result<ConvLstmState<B>> {
        let [height, width] = self.output_size(input_size)?;
        let shape = [batch_size, self.hidden_channels, height, width];

        Ok((Tensor::zeros(shape, device), Tensor::zeros(shape, device)))
    }

    /// Perform one timestep
    ///
    /// # Arguments
    /// * `input` - Input map of shape `[batch, input_channels, height, width]`
    /// * `state` - `(hidden, cell)`, each `[batch, hidden_channels, out_h, out_w]`
    ///
    /// # Returns
    /// The next `(hidden, cell)` pair, same shape as `state`.
    ///
    /// # Errors
    ///
    /// [`ConvLstmError::ShapeMismatch`] when the input channels or the state
    /// shape do not match the configuration, or when layer norm is enabled and
    /// the state's spatial size is not the configured layer norm shape.
    pub fn forward(&self, input: Tensor<B, 4>, state: ConvLstmState<B>) -> error::Result<ConvLstmState<B>> {
        let (gates, cell) = self.compute_gates(input, state)?;

        let new_cell = gates.forget * cell + gates.input * gates.candidate;
        let new_hidden = gates.output * new_cell.clone().tanh();

        Ok((new_hidden, new_cell))
    }

    /// Gate activations for one timestep, without the state update.
    pub fn gates(&self, input: Tensor<B, 4>, state: ConvLstmState<B>) -> error::Result<ConvLstmGates<B>> {
        self.compute_gates(input, state).map(|(gates, _)| gates)
    }

    /// Apply the state dropout to `(hidden, cell)`, drawing a separate mask
    /// for each of the two maps.
    pub fn state_dropout(&self, state: ConvLstmState<B>) -> ConvLstmState<B> {
        let (hidden, cell) = state;
        (self.rnn_dropout.forward(hidden), self.rnn_dropout.forward(cell))
    }

    /// Returns the gates together with the dropped-out previous cell state,
    /// which is what the cell update multiplies by the forget gate.
    fn compute_gates(
        &self,
        input: Tensor<B, 4>,
        state: ConvLstmState<B>,
    ) -> error::Result<(ConvLstmGates<B>, Tensor<B, 4>)> {
        let (hidden, cell) = state;
        self.check_shapes(&input, &hidden, &cell)?;

        let x = self.conv.forward(self.cnn_dropout.forward(input));
        let [x_i, x_f, x_c, x_o] = match &self.batch_norm {
            Some(norm) => [x.clone(), x.clone(), x.clone(), x].map(|x| norm.forward(x)),
            None => [x.clone(), x.clone(), x.clone(), x],
        };

        let (h, c) = self.state_dropout((hidden, cell));
        let h = self.rnn_conv.forward(h);
        let h_gates = [h.clone(), h.clone(), h.clone(), h];

        let ([x_i, x_f, x_c, x_o], [h_i, h_f, h_c, h_o]) = match &self.layer_norm {
            Some(norm) => (
                normalize_gates(norm, [x_i, x_f, x_c, x_o])?,
                normalize_gates(norm, h_gates)?,
            ),
            None => ([x_i, x_f, x_c, x_o], h_gates),
        };

        let (mut pre_i, mut pre_f, mut pre_o) = (x_i + h_i, x_f + h_f, x_o + h_o);
        if self.peephole {
            // c_i, c_f and c_o share rnn_conv, so one product serves all three gates
            let peep = self.rnn_conv.forward(c.clone()) * c.clone();
            pre_i = pre_i + peep.clone();
            pre_f = pre_f + peep.clone();
            pre_o = pre_o + peep;
        }

        let gates = ConvLstmGates {
            input: activation::sigmoid(pre_i),
            forget: activation::sigmoid(pre_f),
            candidate: (x_c + h_c).tanh(),
            output: activation::sigmoid(pre_o),
        };

        Ok((gates, c))
    }

    fn check_shapes(
        &self,
        input: &Tensor<B, 4>,
        hidden: &Tensor<B, 4>,
        cell: &Tensor<B, 4>,
    ) -> error::Result<()> {
        let [batch_size, channels, height, width] = input.dims();
        if channels != self.input_channels {
            return Err(ConvLstmError::shape(
                "input channels",
                [self.input_channels],
                [channels],
            ));
        }

        let [out_h, out_w] = self.output_size([height, width])?;
        let expected = [batch_size, self.hidden_channels, out_h, out_w];
        if hidden.dims() != expected {
            return Err(ConvLstmError::shape("hidden state", expected, hidden.dims()));
        }
        if cell.dims() != expected {
            return Err(ConvLstmError::shape("cell state", expected, cell.dims()));
        }
        Ok(())
    }
}

fn normalize_gates<B: Backend>(
    norm: &SpatialLayerNorm,
    gates: [Tensor<B, 4>; 4],
) -> error::Result<[Tensor<B, 4>; 4]> {
    let [i, f, c, o] = gates;
    Ok([norm.forward(i)?, norm.forward(f)?, norm.forward(c)?, norm.forward(o)?])
}
