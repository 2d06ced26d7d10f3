//! Integration tests for the ConvLSTM cell

use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::tensor::{Distribution, Tensor};
use convlstm::cells::{ConvLstmCell, ConvLstmCellConfig};
use convlstm::error::ConvLstmError;

type Backend = NdArray<f32>;

fn base_config() -> ConvLstmCellConfig {
    ConvLstmCellConfig::new(3, 4, [3, 3]).with_padding([1, 1])
}

fn to_vec(tensor: Tensor<Backend, 4>) -> Vec<f32> {
    tensor.into_data().to_vec::<f32>().unwrap()
}

fn max_abs_diff(a: Tensor<Backend, 4>, b: Tensor<Backend, 4>) -> f32 {
    (a - b).abs().max().into_scalar()
}

/// Same weights as `source`, built from `config`.
fn with_weights_of(config: &ConvLstmCellConfig, source: &ConvLstmCell<Backend>) -> ConvLstmCell<Backend> {
    let device = Default::default();
    config
        .init::<Backend>(&device)
        .unwrap()
        .load_record(source.clone().into_record())
}

#[test]
fn test_init_state_is_zero() {
    let device = Default::default();
    let cell = base_config().init::<Backend>(&device).unwrap();

    for (batch_size, height, width) in [(1, 8, 8), (2, 5, 7), (4, 1, 1)] {
        let (h, c) = cell.init_state(batch_size, [height, width], &device).unwrap();

        assert_eq!(h.dims(), [batch_size, 4, height, width]);
        assert_eq!(c.dims(), [batch_size, 4, height, width]);

        let total: f32 = (h.abs().sum() + c.abs().sum()).into_scalar();
        assert_eq!(total, 0.0);
    }
}

#[test]
fn test_init_state_with_stride() {
    let device = Default::default();
    let cell = ConvLstmCellConfig::new(3, 6, [3, 3])
        .with_stride([2, 2])
        .with_padding([1, 0])
        .init::<Backend>(&device)
        .unwrap();

    // (16 - 3 + 2) / 2 + 1 = 8, (16 - 3 + 0) / 2 + 1 = 7
    let (h, c) = cell.init_state(3, [16, 16], &device).unwrap();
    assert_eq!(h.dims(), [3, 6, 8, 7]);
    assert_eq!(c.dims(), [3, 6, 8, 7]);
}

#[test]
fn test_forward_is_deterministic() {
    let device = Default::default();
    let cell = base_config().init::<Backend>(&device).unwrap();

    let input = Tensor::<Backend, 4>::random([2, 3, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let hidden = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let cell_state = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);

    let (h1, c1) = cell
        .forward(input.clone(), (hidden.clone(), cell_state.clone()))
        .unwrap();
    let (h2, c2) = cell.forward(input, (hidden, cell_state)).unwrap();

    assert_eq!(to_vec(h1), to_vec(h2));
    assert_eq!(to_vec(c1), to_vec(c2));
}

#[test]
fn test_state_evolves_over_steps() {
    let device = Default::default();
    let cell = base_config().init::<Backend>(&device).unwrap();

    let mut state = cell.init_state(1, [6, 6], &device).unwrap();
    for _ in 0..3 {
        let input = Tensor::<Backend, 4>::random([1, 3, 6, 6], Distribution::Uniform(0.0, 1.0), &device);
        state = cell.forward(input, state).unwrap();
    }

    let (h, c) = state;
    assert_eq!(h.dims(), [1, 4, 6, 6]);
    let h_sum: f32 = h.abs().sum().into_scalar();
    let c_sum: f32 = c.abs().sum().into_scalar();
    assert!(h_sum > 0.0 && c_sum > 0.0, "States should have changed after processing sequence");
}

#[test]
fn test_peephole_no_effect_on_zero_cell() {
    let device = Default::default();
    let peephole_config = base_config().with_peephole(true);
    let peephole_cell = peephole_config.init::<Backend>(&device).unwrap();
    let plain_cell = with_weights_of(&base_config(), &peephole_cell);

    assert!(peephole_cell.peephole());
    assert!(!plain_cell.peephole());

    let input = Tensor::<Backend, 4>::random([2, 3, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let hidden = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let zero_cell = Tensor::<Backend, 4>::zeros([2, 4, 8, 8], &device);

    let with_peephole = peephole_cell
        .gates(input.clone(), (hidden.clone(), zero_cell.clone()))
        .unwrap();
    let without = plain_cell.gates(input, (hidden, zero_cell)).unwrap();

    assert!(max_abs_diff(with_peephole.input, without.input) < 1e-7);
    assert!(max_abs_diff(with_peephole.forget, without.forget) < 1e-7);
    assert!(max_abs_diff(with_peephole.output, without.output) < 1e-7);
    assert!(max_abs_diff(with_peephole.candidate, without.candidate) < 1e-7);
}

#[test]
fn test_peephole_changes_gates_on_nonzero_cell() {
    let device = Default::default();
    let peephole_cell = base_config()
        .with_peephole(true)
        .init::<Backend>(&device)
        .unwrap();
    let plain_cell = with_weights_of(&base_config(), &peephole_cell);

    let input = Tensor::<Backend, 4>::random([2, 3, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let hidden = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);
    let cell_state = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Uniform(0.5, 2.0), &device);

    let with_peephole = peephole_cell
        .gates(input.clone(), (hidden.clone(), cell_state.clone()))
        .unwrap();
    let without = plain_cell.gates(input, (hidden, cell_state)).unwrap();

    assert!(max_abs_diff(with_peephole.input, without.input) > 1e-4);
    assert!(max_abs_diff(with_peephole.forget, without.forget) > 1e-4);
    assert!(max_abs_diff(with_peephole.output, without.output) > 1e-4);
    // The candidate never sees the cell state
    assert!(max_abs_diff(with_peephole.candidate, without.candidate) < 1e-7);
}

#[test]
fn test_layer_norm_on_4x4_output() {
    let device = Default::default();
    let cell = base_config()
        .with_layer_norm(true)
        .init::<Backend>(&device)
        .unwrap();
    assert!(cell.layer_norm());

    let input = Tensor::<Backend, 4>::random([2, 3, 4, 4], Distribution::Default, &device);
    let state = cell.init_state(2, [4, 4], &device).unwrap();

    let (h, c) = cell.forward(input, state).unwrap();
    assert_eq!(h.dims(), [2, 4, 4, 4]);
    assert_eq!(c.dims(), [2, 4, 4, 4]);
}

#[test]
fn test_layer_norm_rejects_other_output_sizes() {
    let device = Default::default();
    let cell = base_config()
        .with_layer_norm(true)
        .init::<Backend>(&device)
        .unwrap();

    let input = Tensor::<Backend, 4>::random([2, 3, 8, 8], Distribution::Default, &device);
    let state = cell.init_state(2, [8, 8], &device).unwrap();

    let err = cell.forward(input, state).unwrap_err();
    assert!(matches!(err, ConvLstmError::ShapeMismatch { .. }));
}

#[test]
fn test_layer_norm_custom_shape() {
    let device = Default::default();
    let cell = base_config()
        .with_layer_norm(true)
        .with_layer_norm_shape([8, 8])
        .init::<Backend>(&device)
        .unwrap();

    let input = Tensor::<Backend, 4>::random([1, 3, 8, 8], Distribution::Default, &device);
    let state = cell.init_state(1, [8, 8], &device).unwrap();

    let (h, _) = cell.forward(input, state).unwrap();
    assert_eq!(h.dims(), [1, 4, 8, 8]);
}

#[test]
fn test_wrong_input_channels() {
    let device = Default::default();
    let cell = base_config().init::<Backend>(&device).unwrap();

    let input = Tensor::<Backend, 4>::zeros([2, 5, 8, 8], &device);
    let state = cell.init_state(2, [8, 8], &device).unwrap();

    let err = cell.forward(input, state).unwrap_err();
    assert_eq!(
        err,
        ConvLstmError::ShapeMismatch {
            context: "input channels",
            expected: vec![3],
            actual: vec![5],
        }
    );
}

#[test]
fn test_state_batch_mismatch() {
    let device = Default::default();
    let cell = base_config().init::<Backend>(&device).unwrap();

    let input = Tensor::<Backend, 4>::zeros([2, 3, 8, 8], &device);
    let state = cell.init_state(3, [8, 8], &device).unwrap();

    let err = cell.forward(input, state).unwrap_err();
    assert!(matches!(
        err,
        ConvLstmError::ShapeMismatch { context: "hidden state", .. }
    ));
}

#[test]
fn test_hidden_and_cell_shapes_must_agree() {
    let device = Default::default();
    let cell = base_config().init::<Backend>(&device).unwrap();

    let input = Tensor::<Backend, 4>::zeros([2, 3, 8, 8], &device);
    let hidden = Tensor::<Backend, 4>::zeros([2, 4, 8, 8], &device);
    let cell_state = Tensor::<Backend, 4>::zeros([2, 4, 7, 7], &device);

    let err = cell.forward(input, (hidden, cell_state)).unwrap_err();
    assert!(matches!(
        err,
        ConvLstmError::ShapeMismatch { context: "cell state", .. }
    ));
}

#[test]
fn test_dropout_is_identity_without_autodiff() {
    let device = Default::default();
    let dropout_cell = base_config()
        .with_cnn_dropout(0.5)
        .with_rnn_dropout(0.5)
        .init::<Backend>(&device)
        .unwrap();
    let plain_cell = with_weights_of(&base_config(), &dropout_cell);

    let input = Tensor::<Backend, 4>::random([2, 3, 8, 8], Distribution::Default, &device);
    let hidden = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Default, &device);
    let cell_state = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Default, &device);

    let (h1, c1) = dropout_cell
        .forward(input.clone(), (hidden.clone(), cell_state.clone()))
        .unwrap();
    let (h2, c2) = plain_cell.forward(input, (hidden, cell_state)).unwrap();

    assert_eq!(to_vec(h1), to_vec(h2));
    assert_eq!(to_vec(c1), to_vec(c2));
}

#[test]
fn test_dropout_is_stochastic_with_autodiff() {
    type TrainBackend = Autodiff<NdArray<f32>>;
    let device = Default::default();

    let cell = base_config()
        .with_cnn_dropout(0.5)
        .init::<TrainBackend>(&device)
        .unwrap();

    let input = Tensor::<TrainBackend, 4>::ones([2, 3, 8, 8], &device);
    let state = cell.init_state(2, [8, 8], &device).unwrap();

    let (h1, _) = cell.forward(input.clone(), state.clone()).unwrap();
    let (h2, _) = cell.forward(input, state).unwrap();

    let diff: f32 = (h1 - h2).abs().max().into_scalar();
    assert!(diff > 0.0, "Dropout masks should differ between calls");
}

#[test]
fn test_state_dropout_masks_are_independent() {
    type TrainBackend = Autodiff<NdArray<f32>>;
    let device = Default::default();

    let cell = base_config()
        .with_rnn_dropout(0.5)
        .init::<TrainBackend>(&device)
        .unwrap();

    // Identical hidden and cell maps, so any difference comes from the masks
    let hidden = Tensor::<TrainBackend, 4>::ones([2, 4, 8, 8], &device);
    let cell_state = Tensor::<TrainBackend, 4>::ones([2, 4, 8, 8], &device);

    let (h, c) = cell.state_dropout((hidden, cell_state));

    let h_dropped: f32 = h.clone().equal_elem(0.0).float().sum().into_scalar();
    let c_dropped: f32 = c.clone().equal_elem(0.0).float().sum().into_scalar();
    assert!(h_dropped > 0.0 && c_dropped > 0.0, "Both maps should be masked");

    let diff: f32 = (h - c).abs().max().into_scalar();
    assert!(diff > 0.0, "Hidden and cell masks should be drawn separately");
}

#[test]
fn test_state_dropout_is_identity_without_autodiff() {
    let device = Default::default();
    let cell = base_config()
        .with_rnn_dropout(0.5)
        .init::<Backend>(&device)
        .unwrap();

    let hidden = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Default, &device);
    let cell_state = Tensor::<Backend, 4>::random([2, 4, 8, 8], Distribution::Default, &device);

    let (h, c) = cell.state_dropout((hidden.clone(), cell_state.clone()));

    assert_eq!(to_vec(h), to_vec(hidden));
    assert_eq!(to_vec(c), to_vec(cell_state));
}
