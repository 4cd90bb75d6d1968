use thiserror::Error;


/// Everything that can go wrong while building, differentiating or
/// training on a computation graph.

#[derive(Error, Debug)]
pub enum Error {
  #[error("Unsupported operand type for {op}: {type_name} cannot be represented as a real number")]
  UnsupportedOperandType {
    op: &'static str,
    type_name: &'static str,
  },

  #[error("Invalid exponent for pow: {exponent} (only finite real constants are supported)")]
  InvalidExponent { exponent: String },

  #[error("Invariant violation: {0}")]
  InvariantViolation(String),

  #[error("Unsupported activation '{0}' (available: linear, relu, tanh, sigmoid)")]
  UnsupportedActivation(String),

  #[error("Expected one activation per layer: got {activations} activations for {layers} layers")]
  ActivationCount { layers: usize, activations: usize },

  #[error("Length mismatch in {op}: expected {expected}, got {actual}")]
  LengthMismatch {
    op: &'static str,
    expected: usize,
    actual: usize,
  },

  #[error("Batch size must be at least one")]
  InvalidBatchSize,

  #[error("Invalid hyperparameter {name} = {value}")]
  InvalidHyperparameter { name: &'static str, value: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error("Serialization failed: {0}")]
  Serialization(String),
}


pub type Result<T> = std::result::Result<T, Error>;
