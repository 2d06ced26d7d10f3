//! Normalization primitives for ConvLSTM gates
//!
//! This module provides normalization not available in Burn's standard library.
//! Burn's `LayerNorm` normalizes the last dimension only and always carries a
//! learned affine transform; the ConvLSTM gates need the statistics taken over
//! the whole spatial plane with no affine parameters at all.

use crate::error::{self, ConvLstmError};
use burn::module::Module;
use burn::tensor::{backend::Backend, Tensor};

/// Default spatial shape expected by [`SpatialLayerNorm`].
pub const DEFAULT_LAYER_NORM_SHAPE: [usize; 2] = [4, 4];

/// Layer normalization over the two spatial dimensions of a feature map.
///
/// For an input of shape `[batch, channels, height, width]` every
/// `(batch, channel)` plane is normalized independently:
///
/// `y = (x - mean) / sqrt(var + eps)`
///
/// where `mean` and the biased `var` are taken over `height × width`.
///
/// The normalized shape is fixed at construction. Feeding a map with any
/// other spatial size is an error rather than a silent reshape.
///
/// # Example
///
/// ```rust
/// use burn::backend::NdArray;
/// use burn::tensor::Tensor;
/// use convlstm::norm::SpatialLayerNorm;
///
/// type Backend = NdArray<f32>;
/// let device = Default::default();
///
/// let norm = SpatialLayerNorm::new([4, 4]);
/// let x = Tensor::<Backend, 4>::ones([2, 3, 4, 4], &device);
/// let y = norm.forward(x).unwrap();
/// assert_eq!(y.dims(), [2, 3, 4, 4]);
/// ```
#[derive(Module, Clone, Debug)]
pub struct SpatialLayerNorm {
    height: usize,
    width: usize,
    epsilon: f64,
}

impl SpatialLayerNorm {
    /// Create a normalizer for maps whose spatial size is exactly `shape`.
    pub fn new(shape: [usize; 2]) -> Self {
        Self {
            height: shape[0],
            width: shape[1],
            epsilon: 1e-5,
        }
    }

    /// Override the variance epsilon (default `1e-5`).
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// The `[height, width]` this normalizer accepts.
    pub fn shape(&self) -> [usize; 2] {
        [self.height, self.width]
    }

    /// Variance epsilon added before the square root.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Normalize every `(batch, channel)` plane of `input`.
    ///
    /// # Errors
    ///
    /// [`ConvLstmError::ShapeMismatch`] when the spatial size of `input`
    /// differs from [`Self::shape`].
    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> error::Result<Tensor<B, 4>> {
        let [_, _, height, width] = input.dims();
        if [height, width] != self.shape() {
            return Err(ConvLstmError::shape(
                "spatial layer norm",
                self.shape(),
                [height, width],
            ));
        }

        // [batch, channels, 1, 1], broadcast back over the plane
        let mean = input.clone().mean_dim(3).mean_dim(2);
        let centered = input.sub(mean);
        let var = centered.clone().powi_scalar(2).mean_dim(3).mean_dim(2);

        Ok(centered.div(var.add_scalar(self.epsilon).sqrt()))
    }
}

impl Default for SpatialLayerNorm {
    fn default() -> Self {
        Self::new(DEFAULT_LAYER_NORM_SHAPE)
    }
}
