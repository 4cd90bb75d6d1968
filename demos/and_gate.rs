// This example demonstrates fitting a tiny model to the logical AND function,
// using the batched training loop.

use rand::{ SeedableRng, rngs::StdRng };

use scalargrad::{
  Value,
  nn::{ Mlp, Module, Activation },
  optimize::{ Optimizer, SGD },
  metrics::{ mean_squared_error, binary_accuracy },
  data::BatchIterator,
  train::{ Trainer, TrainerConfig },
};

fn main() -> scalargrad::Result<()> {
  let mut rng = StdRng::seed_from_u64(1234);

  // Truth table
  let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
    .iter()
    .map(|row| row.iter().map(|&x| Value::new(x)).collect())
    .collect();
  let targets = [0.0, 0.0, 0.0, 1.0].iter().map(|&y| Value::new(y)).collect();
  let data = BatchIterator::new(inputs, targets)?.batch_size(2)?;

  // A single linear neuron is enough to separate AND
  let model = Mlp::<f64>::new(2, &[1], &[Activation::Linear], &mut rng)?;
  println!("{model} with {} parameters", model.num_parameters());

  let optimizer = Optimizer::new(model.parameters(), 0.1, SGD);
  let config = TrainerConfig::default().epochs(100);
  let mut trainer = Trainer::new(model, optimizer, mean_squared_error, binary_accuracy, config);

  let history = trainer.fit(&data, &mut rng)?;
  for (epoch, (loss, accuracy)) in history.loss.iter().zip(&history.accuracy).enumerate().step_by(10) {
    println!("Epoch {:>3}: loss {loss:.4}, accuracy {:.0}%", epoch + 1, accuracy * 100.0);
  }

  // Save the trained model and load it back
  let model = trainer.into_model();
  let filename = std::env::temp_dir().join("and_gate.model");
  model.save(&filename)?;
  let model = Mlp::<f64>::load(&filename)?;

  for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
    let output = model.forward(&[Value::new(a), Value::new(b)]);
    println!("{a} AND {b} = {:.3}", output[0].data());
  }

  Ok(())
}
