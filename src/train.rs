use rand::Rng;
use serde::{ Serialize, Deserialize };

use crate::{
  error::Result,
  scalar::Real,
  value::Value,
  nn::Module,
  data::BatchIterator,
  optimize::{ Optimizer, Strategy },
};


/// Loss over a batch of targets and predictions.
pub type LossFn<T> = fn(&[Value<T>], &[Value<T>]) -> Result<Value<T>>;

/// Metric over all targets and predictions of an epoch.
pub type MetricFn<T> = fn(&[Value<T>], &[Value<T>]) -> Result<T>;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
  pub epochs: usize,
  /// Report progress at `info` instead of `debug` level.
  pub verbose: bool,
}

impl Default for TrainerConfig {
  fn default() -> Self {
    Self { epochs: 500, verbose: false }
  }
}

impl TrainerConfig {
  pub fn epochs(mut self, epochs: usize) -> Self {
    self.epochs = epochs;
    self
  }

  pub fn verbose(mut self, verbose: bool) -> Self {
    self.verbose = verbose;
    self
  }
}


/// Per epoch training record.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History<T> {
  /// Sum of all batch losses.
  pub loss: Vec<T>,
  pub accuracy: Vec<T>,
}


/// Runs the training loop of a model.
///
/// ```
/// use rand::{ SeedableRng, rngs::StdRng };
/// use scalargrad::{
///   Value,
///   nn::{ Mlp, Module, Activation },
///   optimize::{ Optimizer, SGD },
///   metrics::{ mean_squared_error, binary_accuracy },
///   data::BatchIterator,
///   train::{ Trainer, TrainerConfig },
/// };
///
/// let mut rng = StdRng::seed_from_u64(3);
/// let model = Mlp::<f64>::new(1, &[1], &[Activation::Linear], &mut rng).unwrap();
/// let optimizer = Optimizer::new(model.parameters(), 0.1, SGD);
/// let config = TrainerConfig::default().epochs(10);
/// let mut trainer = Trainer::new(model, optimizer, mean_squared_error, binary_accuracy, config);
///
/// let inputs = vec![vec![Value::new(0.0)], vec![Value::new(1.0)]];
/// let targets = vec![Value::new(0.0), Value::new(1.0)];
/// let data = BatchIterator::new(inputs, targets).unwrap();
///
/// let history = trainer.fit(&data, &mut rng).unwrap();
/// assert_eq!(history.loss.len(), 10);
/// ```

pub struct Trainer<T: Real, M: Module<T>, S: Strategy<T>> {
  model: M,
  optimizer: Optimizer<T, S>,
  loss: LossFn<T>,
  metric: MetricFn<T>,
  pub config: TrainerConfig,
}

impl<T: Real, M: Module<T>, S: Strategy<T>> Trainer<T, M, S> {
  pub fn new(model: M, optimizer: Optimizer<T, S>, loss: LossFn<T>, metric: MetricFn<T>, config: TrainerConfig) -> Self {
    Self { model, optimizer, loss, metric, config }
  }

  pub fn model(&self) -> &M {
    &self.model
  }

  pub fn optimizer(&self) -> &Optimizer<T, S> {
    &self.optimizer
  }

  pub fn into_model(self) -> M {
    self.model
  }

  pub fn fit(&mut self, data: &BatchIterator<T>, rng: &mut impl Rng) -> Result<History<T>> {
    let epochs = self.config.epochs;
    let mut history = History { loss: Vec::with_capacity(epochs), accuracy: Vec::with_capacity(epochs) };

    for epoch in 1..=epochs {
      let mut epoch_loss = T::zero();
      let mut y_true = Vec::with_capacity(data.len());
      let mut y_pred = Vec::with_capacity(data.len());

      for batch in data.batches(rng) {
        self.optimizer.zero_grad();

        let predictions: Vec<_> = batch.inputs
          .iter()
          .flat_map(|input| self.model.forward(input))
          .collect();
        let loss = (self.loss)(batch.targets, &predictions)?;
        epoch_loss += loss.data();

        y_true.extend_from_slice(batch.targets);
        y_pred.extend(predictions);

        self.optimizer.minimize(&loss);
      }

      let accuracy = (self.metric)(&y_true, &y_pred)?;
      history.loss.push(epoch_loss);
      history.accuracy.push(accuracy);

      if self.config.verbose {
        log::info!("Epoch [{epoch}/{epochs}], loss: {epoch_loss:.6}, accuracy: {accuracy:.4}");
      } else {
        log::debug!("Epoch [{epoch}/{epochs}], loss: {epoch_loss:.6}, accuracy: {accuracy:.4}");
      }
    }

    Ok(history)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };
  use crate::{
    nn::{ Mlp, Activation },
    optimize::SGD,
    metrics::{ mean_squared_error, binary_accuracy },
  };

  fn and_gate() -> BatchIterator<f64> {
    let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]
      .iter()
      .map(|row| row.iter().map(|&x| Value::new(x)).collect())
      .collect();
    let targets = [0.0, 0.0, 0.0, 1.0].iter().map(|&y| Value::new(y)).collect();
    BatchIterator::new(inputs, targets).unwrap()
  }

  fn trainer(rng: &mut StdRng, epochs: usize) -> Trainer<f64, Mlp<f64>, SGD> {
    let model = Mlp::new(2, &[1], &[Activation::Linear], rng).unwrap();
    let optimizer = Optimizer::new(model.parameters(), 0.1, SGD);
    let config = TrainerConfig::default().epochs(epochs).verbose(true);
    Trainer::new(model, optimizer, mean_squared_error, binary_accuracy, config)
  }

  #[test]
  fn fits_and_gate() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut trainer = trainer(&mut rng, 200);
    let history = trainer.fit(&and_gate(), &mut rng).unwrap();

    assert_eq!(history.loss.len(), 200);
    assert_eq!(history.accuracy.len(), 200);
    assert!(history.loss[199] < 0.1);
    assert!(history.loss[199] < history.loss[0]);
    assert_eq!(history.accuracy[199], 1.0);
    assert_eq!(trainer.optimizer().current_step(), 201);
    assert!(trainer.model().parameters().iter().all(|p| p.grad() == 0.0));
  }

  #[test]
  fn small_batches_sum_their_losses() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut trainer = trainer(&mut rng, 1);
    let data = and_gate().batch_size(1).unwrap();

    let initial: Vec<f64> = trainer.model().parameters().iter().map(|p| p.data()).collect();
    let history = trainer.fit(&data, &mut rng).unwrap();
    assert_eq!(trainer.optimizer().current_step(), 5);
    assert!(history.loss[0] > 0.0);
    let trained: Vec<f64> = trainer.model().parameters().iter().map(|p| p.data()).collect();
    assert_ne!(initial, trained);
  }

  #[test]
  fn zero_epochs() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut trainer = trainer(&mut rng, 0);
    let history = trainer.fit(&and_gate(), &mut rng).unwrap();
    assert_eq!(history, History::default());
  }

  #[test]
  fn config() {
    let config = TrainerConfig::default();
    assert_eq!(config.epochs, 500);
    assert!(!config.verbose);

    let bytes = postcard::to_allocvec(&config.epochs(20).verbose(true)).unwrap();
    let restored: TrainerConfig = postcard::from_bytes(&bytes).unwrap();
    assert_eq!(restored, TrainerConfig { epochs: 20, verbose: true });
  }
}
