use rand::{ Rng, seq::SliceRandom };

use crate::{
  error::{ Error, Result },
  scalar::Real,
  value::Value,
};


/// Consecutive slice of a dataset.

#[derive(Debug, Clone, Copy)]
pub struct Batch<'a, T: Real> {
  pub inputs: &'a [Vec<Value<T>>],
  pub targets: &'a [Value<T>],
}

impl<'a, T: Real> Batch<'a, T> {
  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }
}


/// Splits a dataset of input vectors and their targets into batches.
///
/// ```
/// use rand::{ SeedableRng, rngs::StdRng };
/// use scalargrad::{ Value, data::BatchIterator };
///
/// let inputs: Vec<Vec<Value<f64>>> = (0..8).map(|i| vec![Value::new(i as f64)]).collect();
/// let targets: Vec<Value<f64>> = (0..8).map(|i| Value::new(i as f64)).collect();
///
/// let data = BatchIterator::new(inputs, targets).unwrap().batch_size(3).unwrap();
/// let mut rng = StdRng::seed_from_u64(0);
/// let mut sizes: Vec<usize> = data.batches(&mut rng).map(|batch| batch.len()).collect();
/// sizes.sort();
/// assert_eq!(sizes, vec![2, 3, 3]);
/// ```

#[derive(Debug, Clone)]
pub struct BatchIterator<T: Real> {
  inputs: Vec<Vec<Value<T>>>,
  targets: Vec<Value<T>>,
  batch_size: usize,
  shuffle: bool,
}

impl<T: Real> BatchIterator<T> {
  pub fn new(inputs: Vec<Vec<Value<T>>>, targets: Vec<Value<T>>) -> Result<Self> {
    if inputs.len() != targets.len() {
      return Err(Error::LengthMismatch { op: "BatchIterator::new", expected: inputs.len(), actual: targets.len() })
    }
    Ok(Self { inputs, targets, batch_size: 32, shuffle: true })
  }

  pub fn batch_size(mut self, batch_size: usize) -> Result<Self> {
    if batch_size == 0 {
      return Err(Error::InvalidBatchSize)
    }
    self.batch_size = batch_size;
    Ok(self)
  }

  /// Whether to visit batches in random order.
  /// Samples within a batch always stay in dataset order.

  pub fn shuffle(mut self, shuffle: bool) -> Self {
    self.shuffle = shuffle;
    self
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  pub fn num_batches(&self) -> usize {
    self.len().div_ceil(self.batch_size)
  }

  pub fn batches<'a>(&'a self, rng: &mut impl Rng) -> impl Iterator<Item = Batch<'a, T>> + 'a {
    let mut starts: Vec<usize> = (0..self.len()).step_by(self.batch_size).collect();
    if self.shuffle {
      starts.shuffle(rng);
    }
    starts.into_iter().map(move |start| {
      let end = start.saturating_add(self.batch_size).min(self.len());
      Batch {
        inputs: &self.inputs[start..end],
        targets: &self.targets[start..end],
      }
    })
  }
}
