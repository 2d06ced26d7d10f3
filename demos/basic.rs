//! Basic usage example of a ConvLSTM layer
//!
//! This example demonstrates how to create a ConvLSTM and run it over a
//! short video-like sequence, one and two directions.
//!
//! Run with `RUST_LOG=convlstm=debug` to see the layer's tracing output.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use convlstm::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== ConvLSTM Basic Example ===\n");

    // Use the NdArray backend (CPU)
    type Backend = NdArray<f32>;
    let device = Default::default();

    let cell = ConvLstmCellConfig::new(3, 4, [3, 3])
        .with_stride([1, 1])
        .with_padding([1, 1]);

    // Input shape: [batch=2, seq=5, channels=3, height=8, width=8]
    let input = Tensor::<Backend, 5>::random([2, 5, 3, 8, 8], Distribution::Uniform(-1.0, 1.0), &device);

    // Example 1: Single direction, full sequence
    println!("Example 1: Unidirectional");
    let convlstm = ConvLstm::<Backend>::new(&cell, &device)?.with_batch_first(true);
    let (output, (hidden, cell_state), _) = convlstm.forward(input.clone(), None)?;

    println!("  Input shape:  {:?}", input.dims());
    println!("  Output shape: {:?}", output.dims());
    println!("  Hidden shape: {:?}", hidden.dims());
    println!("  Cell shape:   {:?}", cell_state.dims());
    println!();

    // Example 2: Both directions, last timestep only
    println!("Example 2: Bidirectional, last timestep");
    let bidirectional = ConvLstmConfig::new(cell.clone().with_peephole(true))
        .with_batch_first(true)
        .with_bidirectional(true)
        .with_return_sequence(false)
        .init::<Backend>(&device)?;
    let (output, _, reverse) = bidirectional.forward(input.clone(), None)?;

    println!("  Output shape: {:?}", output.dims());
    if let Some((hidden, _)) = reverse {
        println!("  Reverse hidden shape: {:?}", hidden.dims());
    }
    println!();

    // Example 3: Stateful calls are rejected
    println!("Example 3: Explicit initial state");
    let state = convlstm.cell().init_state(2, [8, 8], &device)?;
    match convlstm.forward(input, Some(state)) {
        Err(err) => println!("  Rejected: {}", err),
        Ok(_) => println!("  Unexpectedly accepted"),
    }
    println!();

    println!("=== Examples completed successfully! ===");
    Ok(())
}
