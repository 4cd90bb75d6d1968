use std::fs;
use std::path::Path;
use std::str::FromStr;

use itertools::Itertools;
use rand::Rng;
use serde::{ Serialize, Deserialize, de::DeserializeOwned };

use crate::{
  internal::uniform,
  error::{ Error, Result },
  scalar::Real,
  value::Value,
};


/// Non-linearity applied to a neuron's weighted sum.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Activation {
  #[default]
  Linear,
  ReLU,
  Tanh,
  Sigmoid,
}

impl Activation {
  pub fn apply<T: Real>(&self, value: &Value<T>) -> Value<T> {
    match self {
      Self::Linear => value.clone(),
      Self::ReLU => value.relu(),
      Self::Tanh => value.tanh(),
      Self::Sigmoid => value.sigmoid(),
    }
  }
}

impl FromStr for Activation {
  type Err = Error;

  fn from_str(name: &str) -> Result<Self> {
    match name.to_lowercase().as_str() {
      "linear" => Ok(Self::Linear),
      "relu" => Ok(Self::ReLU),
      "tanh" => Ok(Self::Tanh),
      "sigmoid" => Ok(Self::Sigmoid),
      _ => Err(Error::UnsupportedActivation(name.to_string())),
    }
  }
}

impl std::fmt::Display for Activation {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let name = match self {
      Self::Linear => "linear",
      Self::ReLU => "relu",
      Self::Tanh => "tanh",
      Self::Sigmoid => "sigmoid",
    };
    write!(f, "{name}")
  }
}


/// A trainable function of scalar values.

pub trait Module<T: Real> {
  /// All trainable leaf values, in a stable order.
  fn parameters(&self) -> Vec<Value<T>>;

  fn forward(&self, input: &[Value<T>]) -> Vec<Value<T>>;

  fn zero_grad(&self) {
    for param in self.parameters() {
      param.zero_grad();
    }
  }

  fn num_parameters(&self) -> usize {
    self.parameters().len()
  }
}


/// A single neuron computing `activation(w · x + b)`.

#[derive(Debug, Clone)]
pub struct Neuron<T: Real> {
  pub weights: Vec<Value<T>>,
  pub bias: Value<T>,
  pub activation: Activation,
}

impl<T: Real> Neuron<T> {
  /// Weights and bias get drawn uniformly from [-1, 1).

  pub fn new(in_features: usize, activation: Activation, rng: &mut impl Rng) -> Self {
    let mut init = || Value::new(uniform(rng, -T::one(), T::one()));
    let weights = (0..in_features).map(|_| init()).collect();
    let bias = init();
    Self { weights, bias, activation }
  }

  pub fn from_parts(weights: Vec<Value<T>>, bias: Value<T>, activation: Activation) -> Self {
    Self { weights, bias, activation }
  }

  pub fn run(&self, input: &[Value<T>]) -> Value<T> {
    let sum = self.weights
      .iter()
      .zip(input)
      .fold(self.bias.clone(), |acc, (w, x)| acc + w * x);
    self.activation.apply(&sum)
  }
}

impl<T: Real> Module<T> for Neuron<T> {
  fn parameters(&self) -> Vec<Value<T>> {
    self.weights.iter().cloned().chain(std::iter::once(self.bias.clone())).collect()
  }

  fn forward(&self, input: &[Value<T>]) -> Vec<Value<T>> {
    vec![self.run(input)]
  }
}

impl<T: Real> std::fmt::Display for Neuron<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Neuron({}, {})", self.weights.len(), self.activation)
  }
}


/// A fully connected layer of neurons.
///
/// [Layer::new] gives every neuron the same activation, but each
/// neuron's `activation` may be changed individually afterwards.

#[derive(Debug, Clone)]
pub struct Layer<T: Real> {
  pub neurons: Vec<Neuron<T>>,
}

impl<T: Real> Layer<T> {
  pub fn new(in_features: usize, out_features: usize, activation: Activation, rng: &mut impl Rng) -> Self {
    Self {
      neurons: (0..out_features).map(|_| Neuron::new(in_features, activation, rng)).collect(),
    }
  }
}

impl<T: Real> Module<T> for Layer<T> {
  fn parameters(&self) -> Vec<Value<T>> {
    self.neurons.iter().flat_map(|neuron| neuron.parameters()).collect()
  }

  fn forward(&self, input: &[Value<T>]) -> Vec<Value<T>> {
    self.neurons.iter().map(|neuron| neuron.run(input)).collect()
  }
}

impl<T: Real> std::fmt::Display for Layer<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Layer of [{}]", self.neurons.iter().join(", "))
  }
}


/// Multi layer perceptron.
///
/// ```
/// use rand::{ SeedableRng, rngs::StdRng };
/// use scalargrad::{ Value, nn::{ Mlp, Module, Activation } };
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let model = Mlp::<f64>::new(2, &[3, 1], &[Activation::ReLU, Activation::Linear], &mut rng).unwrap();
/// assert_eq!(model.num_parameters(), 2 * 3 + 3 + 3 * 1 + 1);
///
/// let output = model.forward(&[Value::new(1.0), Value::new(-1.0)]);
/// assert_eq!(output.len(), 1);
/// ```

#[derive(Debug, Clone)]
pub struct Mlp<T: Real> {
  pub layers: Vec<Layer<T>>,
}

impl<T: Real> Mlp<T> {
  /// Build one layer per entry in `sizes`, each using the
  /// activation at the same position in `activations`.

  pub fn new(in_features: usize, sizes: &[usize], activations: &[Activation], rng: &mut impl Rng) -> Result<Self> {
    if activations.is_empty() || activations.len() != sizes.len() {
      return Err(Error::ActivationCount { layers: sizes.len(), activations: activations.len() })
    }
    let inputs = std::iter::once(&in_features).chain(sizes);
    let layers = inputs
      .zip(sizes)
      .zip(activations)
      .map(|((&n_in, &n_out), &activation)| Layer::new(n_in, n_out, activation, rng))
      .collect();
    Ok(Self { layers })
  }

  pub fn in_features(&self) -> usize {
    self.layers
      .first()
      .and_then(|layer| layer.neurons.first())
      .map_or(0, |neuron| neuron.weights.len())
  }
}

impl<T: Real> Module<T> for Mlp<T> {
  fn parameters(&self) -> Vec<Value<T>> {
    self.layers.iter().flat_map(|layer| layer.parameters()).collect()
  }

  fn forward(&self, input: &[Value<T>]) -> Vec<Value<T>> {
    self.layers
      .iter()
      .fold(input.to_vec(), |x, layer| layer.forward(&x))
  }
}

impl<T: Real> std::fmt::Display for Mlp<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "MLP of [{}]", self.layers.iter().join(", "))
  }
}


impl<T: Real + Serialize + DeserializeOwned> Mlp<T> {
  /// Serialize all parameters, without any gradients or graph history.

  pub fn to_bytes(&self) -> Result<Vec<u8>> {
    let dump = MlpDump {
      in_features: self.in_features(),
      layers: self.layers.iter().map(|layer| layer.neurons.iter().map(|neuron| NeuronDump {
        activation: neuron.activation,
        weights: neuron.weights.iter().map(|w| w.data()).collect(),
        bias: neuron.bias.data(),
      }).collect()).collect(),
    };
    postcard::to_allocvec(&dump).map_err(|err| Error::Serialization(err.to_string()))
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
    let dump: MlpDump<T> = postcard::from_bytes(bytes).map_err(|err| Error::Serialization(err.to_string()))?;
    let mut width = dump.in_features;
    let mut layers = vec![];
    for layer in dump.layers {
      let mut neurons = vec![];
      for neuron in layer {
        if neuron.weights.len() != width {
          return Err(Error::LengthMismatch { op: "Mlp::from_bytes", expected: width, actual: neuron.weights.len() })
        }
        neurons.push(Neuron::from_parts(
          neuron.weights.into_iter().map(Value::new).collect(),
          Value::new(neuron.bias),
          neuron.activation,
        ));
      }
      width = neurons.len();
      layers.push(Layer { neurons });
    }
    Ok(Self { layers })
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, self.to_bytes()?)?;
    Ok(())
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let bytes = fs::read(path)?;
    Self::from_bytes(&bytes)
  }
}

#[derive(Serialize, Deserialize)]
struct NeuronDump<T> {
  activation: Activation,
  weights: Vec<T>,
  bias: T,
}

#[derive(Serialize, Deserialize)]
struct MlpDump<T> {
  in_features: usize,
  layers: Vec<Vec<NeuronDump<T>>>,
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };

  fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
  }

  fn inputs(values: &[f64]) -> Vec<Value<f64>> {
    values.iter().map(|&v| Value::new(v)).collect()
  }

  #[test]
  fn neuron() {
    let n_features = 3;
    let mut neuron = Neuron::<f64>::new(n_features, Activation::Linear, &mut rng());
    assert_eq!(neuron.num_parameters(), n_features + 1);
    for param in neuron.parameters() {
      assert!(param.data() >= -1.0 && param.data() < 1.0);
    }

    neuron.weights = inputs(&[0.0, 1.0, 2.0]);
    neuron.bias = Value::new(-0.75);

    // 1*0 + (-0.5)*1 + 1.5*2 - 0.75
    assert_eq!(neuron.run(&inputs(&[1.0, -0.5, 1.5])).data(), 1.75);
    assert_eq!(neuron.run(&inputs(&[1.0, -3.0, 1.5])).data(), -0.75);

    neuron.activation = Activation::ReLU;
    assert_eq!(neuron.run(&inputs(&[1.0, -0.5, 1.5])).data(), 1.75);
    assert_eq!(neuron.run(&inputs(&[1.0, -3.0, 1.5])).data(), 0.0);

    neuron.activation = Activation::Tanh;
    assert_eq!(neuron.run(&inputs(&[1.0, -0.5, 1.5])).data().round(), 1.0);
    assert_eq!(neuron.run(&inputs(&[1.0, -3.0, 1.5])).data().round(), -1.0);

    neuron.activation = Activation::Sigmoid;
    assert_eq!(neuron.run(&inputs(&[1.0, -0.5, 1.5])).data().round(), 1.0);
    assert_eq!(neuron.run(&inputs(&[1.0, -3.0, 1.5])).data().round(), 0.0);

    assert_eq!(neuron.to_string(), "Neuron(3, sigmoid)");
  }

  #[test]
  fn neuron_gradients_reach_parameters() {
    let neuron = Neuron::from_parts(inputs(&[2.0, -1.0]), Value::new(0.5), Activation::Linear);
    let x = inputs(&[3.0, 4.0]);
    neuron.run(&x).backward();
    let grads: Vec<f64> = neuron.parameters().iter().map(|p| p.grad()).collect();
    assert_eq!(grads, vec![3.0, 4.0, 1.0]);
    assert_eq!(x[0].grad(), 2.0);
    neuron.zero_grad();
    assert!(neuron.parameters().iter().all(|p| p.grad() == 0.0));
  }

  #[test]
  fn layer() {
    let layer = Layer::<f64>::new(3, 2, Activation::Linear, &mut rng());
    assert_eq!(layer.neurons.len(), 2);
    assert_eq!(layer.num_parameters(), 8);
    assert!(layer.neurons.iter().all(|n| n.activation == Activation::Linear));
    assert_eq!(layer.forward(&inputs(&[1.0, 2.0, 3.0])).len(), 2);
    assert_eq!(layer.to_string(), "Layer of [Neuron(3, linear), Neuron(3, linear)]");

    let layer = Layer::<f64>::new(3, 2, Activation::ReLU, &mut rng());
    assert!(layer.neurons.iter().all(|n| n.activation == Activation::ReLU));
  }

  #[test]
  fn mlp() {
    let model = Mlp::<f64>::new(2, &[3, 1], &[Activation::ReLU, Activation::Linear], &mut rng()).unwrap();
    assert_eq!(model.layers.len(), 2);
    assert_eq!(model.num_parameters(), 13);
    assert_eq!(model.in_features(), 2);
    assert!(model.layers[0].neurons.iter().all(|n| n.activation == Activation::ReLU));
    assert!(model.layers[1].neurons.iter().all(|n| n.activation == Activation::Linear));
    assert_eq!(model.forward(&inputs(&[0.5, -0.5])).len(), 1);
    assert!(model.to_string().starts_with("MLP of [Layer of [Neuron(2, relu)"));
  }

  #[test]
  fn mlp_needs_one_activation_per_layer() {
    let result = Mlp::<f64>::new(2, &[3, 1], &[Activation::ReLU], &mut rng());
    assert!(matches!(result, Err(Error::ActivationCount { layers: 2, activations: 1 })));
    let result = Mlp::<f64>::new(2, &[], &[], &mut rng());
    assert!(matches!(result, Err(Error::ActivationCount { .. })));
  }

  #[test]
  fn same_seed_same_model() {
    let a = Mlp::<f64>::new(2, &[4, 1], &[Activation::Tanh, Activation::Sigmoid], &mut rng()).unwrap();
    let b = Mlp::<f64>::new(2, &[4, 1], &[Activation::Tanh, Activation::Sigmoid], &mut rng()).unwrap();
    let data = |m: &Mlp<f64>| m.parameters().iter().map(|p| p.data()).collect::<Vec<_>>();
    assert_eq!(data(&a), data(&b));
  }

  #[test]
  fn activation_names() {
    assert_eq!("relu".parse::<Activation>().unwrap(), Activation::ReLU);
    assert_eq!("Tanh".parse::<Activation>().unwrap(), Activation::Tanh);
    assert_eq!("linear".parse::<Activation>().unwrap(), Activation::Linear);
    assert_eq!("sigmoid".parse::<Activation>().unwrap().to_string(), "sigmoid");
    match "softmax".parse::<Activation>() {
      Err(Error::UnsupportedActivation(name)) => assert_eq!(name, "softmax"),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn checkpoint_roundtrip() {
    let model = Mlp::<f64>::new(3, &[4, 2], &[Activation::Tanh, Activation::Linear], &mut rng()).unwrap();
    let path = std::env::temp_dir().join(format!("scalargrad-checkpoint-{}.bin", std::process::id()));
    model.save(&path).unwrap();
    let loaded = Mlp::<f64>::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let data = |m: &Mlp<f64>| m.parameters().iter().map(|p| p.data()).collect::<Vec<_>>();
    assert_eq!(data(&model), data(&loaded));
    assert_eq!(model.to_string(), loaded.to_string());

    let x = inputs(&[0.1, 0.2, 0.3]);
    let expected: Vec<f64> = model.forward(&x).iter().map(|v| v.data()).collect();
    let actual: Vec<f64> = loaded.forward(&x).iter().map(|v| v.data()).collect();
    assert_eq!(expected, actual);
  }

  #[test]
  fn checkpoints_keep_mixed_activations() {
    let mut model = Mlp::<f64>::new(2, &[3, 1], &[Activation::Tanh, Activation::Linear], &mut rng()).unwrap();
    model.layers[0].neurons[1].activation = Activation::ReLU;
    model.layers[0].neurons[2].activation = Activation::Sigmoid;

    let loaded = Mlp::<f64>::from_bytes(&model.to_bytes().unwrap()).unwrap();
    let activations: Vec<Activation> = loaded.layers[0].neurons.iter().map(|n| n.activation).collect();
    assert_eq!(activations, vec![Activation::Tanh, Activation::ReLU, Activation::Sigmoid]);

    let x = inputs(&[-0.7, 0.4]);
    assert_eq!(model.forward(&x)[0].data(), loaded.forward(&x)[0].data());
  }

  #[test]
  fn corrupt_checkpoints_fail() {
    assert!(matches!(Mlp::<f64>::from_bytes(&[0xff, 0xff, 0xff]), Err(Error::Serialization(_))));
    let missing = std::env::temp_dir().join("scalargrad-does-not-exist.bin");
    assert!(matches!(Mlp::<f64>::load(&missing), Err(Error::Io(_))));
  }
}
