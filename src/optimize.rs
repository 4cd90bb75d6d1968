use std::collections::HashMap;

use serde::{ Serialize, Deserialize };

use crate::{
  error::{ Error, Result },
  scalar::Real,
  value::Value,
};


/// An optimization strategy to be used with [Optimizer].

pub trait Strategy<R: Real> {
  /// Change to apply to `param`'s data, given its current gradient.
  fn update(&mut self, param: &Value<R>, rate: R, step: usize) -> R;
}


/// Generic optimizer that allows for several optimization [strategies](Strategy) to be used.
///
/// ```
/// use scalargrad::{ Value, optimize::{ Optimizer, SGD } };
///
/// let x = Value::new(0.0f64);
/// let mut optimizer = Optimizer::new(vec![x.clone()], 0.1, SGD);
///
/// for _ in 0..100 {
///   let loss = (&x - 3.0).sqr();
///   optimizer.minimize(&loss);
/// }
/// assert!((x.data() - 3.0).abs() < 1e-6);
/// ```

#[derive(Debug)]
pub struct Optimizer<R: Real, S: Strategy<R>> {
  parameters: Vec<Value<R>>,
  strategy: S,
  pub learning_rate: R,
  step: usize,
}

impl<R: Real, S: Strategy<R>> Optimizer<R, S> {
  pub fn new(parameters: Vec<Value<R>>, learning_rate: R, strategy: S) -> Self {
    Self { parameters, strategy, learning_rate, step: 1 }
  }

  pub fn parameters(&self) -> &[Value<R>] {
    &self.parameters
  }

  pub fn strategy(&self) -> &S {
    &self.strategy
  }

  /// Number of the next step, starting at one.

  pub fn current_step(&self) -> usize {
    self.step
  }

  /// Update all parameters from their current gradients.

  pub fn step(&mut self) {
    for param in &self.parameters {
      let change = self.strategy.update(param, self.learning_rate, self.step);
      param.set_data(param.data() + change);
    }
    log::debug!("Optimizer step {} updated {} parameters", self.step, self.parameters.len());
    self.step += 1;
  }

  pub fn zero_grad(&self) {
    for param in &self.parameters {
      param.zero_grad();
    }
  }

  /// Back-propagate, take a step and reset all gradients in the loss graph.

  pub fn minimize(&mut self, loss: &Value<R>) {
    loss.backward();
    self.step();
    loss.reset();
  }
}


fn check<R: Real>(name: &'static str, value: R, valid: bool) -> Result<()> {
  if valid {
    Ok(())
  } else {
    Err(Error::InvalidHyperparameter { name, value: value.to_string() })
  }
}

fn check_momentum<R: Real>(momentum: R) -> Result<()> {
  check("momentum", momentum, momentum >= R::zero())
}

fn check_beta<R: Real>(name: &'static str, beta: R) -> Result<()> {
  check(name, beta, beta >= R::zero() && beta < R::one())
}


/// Stochastic Gradient Descent strategy

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SGD;

impl<R: Real> Strategy<R> for SGD {
  fn update(&mut self, param: &Value<R>, rate: R, _step: usize) -> R {
    -rate * param.grad()
  }
}


/// Stochastic Gradient Descent with momentum

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Momentum<R: Real> {
  pub momentum: R,
  #[serde(skip)]
  v: HashMap<usize, R>,
}

impl<R: Real> Momentum<R> {
  pub fn new(momentum: R) -> Result<Self> {
    check_momentum(momentum)?;
    Ok(Self { momentum, v: HashMap::new() })
  }
}

impl<R: Real> Default for Momentum<R> {
  fn default() -> Self {
    Self { momentum: R::from(0.9).unwrap(), v: HashMap::new() }
  }
}

impl<R: Real> Strategy<R> for Momentum<R> {
  fn update(&mut self, param: &Value<R>, rate: R, _step: usize) -> R {
    let v = self.v.entry(param.id()).or_insert_with(R::zero);
    *v = *v * self.momentum - param.grad() * rate;
    *v
  }
}


/// Stochastic Gradient Descent with Nesterov momentum

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nesterov<R: Real> {
  pub momentum: R,
  #[serde(skip)]
  v: HashMap<usize, R>,
}

impl<R: Real> Nesterov<R> {
  pub fn new(momentum: R) -> Result<Self> {
    check_momentum(momentum)?;
    Ok(Self { momentum, v: HashMap::new() })
  }
}

impl<R: Real> Default for Nesterov<R> {
  fn default() -> Self {
    Self { momentum: R::from(0.9).unwrap(), v: HashMap::new() }
  }
}

impl<R: Real> Strategy<R> for Nesterov<R> {
  fn update(&mut self, param: &Value<R>, rate: R, _step: usize) -> R {
    let v = self.v.entry(param.id()).or_insert_with(R::zero);
    let v_prev = *v;
    *v = *v * self.momentum - param.grad() * rate;
    v_prev * -self.momentum + *v * (R::one() + self.momentum)
  }
}


/// Adaptive Movement Estimation strategy (ADAM)

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam<R: Real> {
  pub beta1: R,
  pub beta2: R,
  pub epsilon: R,
  #[serde(skip)]
  m: HashMap<usize, R>,
  #[serde(skip)]
  v: HashMap<usize, R>,
}

impl<R: Real> Adam<R> {
  pub fn new(beta1: R, beta2: R, epsilon: R) -> Result<Self> {
    check_beta("beta1", beta1)?;
    check_beta("beta2", beta2)?;
    check("epsilon", epsilon, epsilon > R::zero())?;
    Ok(Self { beta1, beta2, epsilon, m: HashMap::new(), v: HashMap::new() })
  }
}

impl<R: Real> Default for Adam<R> {
  fn default() -> Self {
    Self {
      beta1: R::from(0.9).unwrap(),
      beta2: R::from(0.999).unwrap(),
      epsilon: R::from(1e-8).unwrap(),
      m: HashMap::new(),
      v: HashMap::new(),
    }
  }
}

impl<R: Real> Strategy<R> for Adam<R> {
  fn update(&mut self, param: &Value<R>, rate: R, step: usize) -> R {
    let id = param.id();
    let grad = param.grad();
    let m = self.m.entry(id).or_insert_with(R::zero);
    let v = self.v.entry(id).or_insert_with(R::zero);
    *m = *m * self.beta1 + grad        * (R::one() - self.beta1);
    *v = *v * self.beta2 + grad * grad * (R::one() - self.beta2);
    let step = step as i32;
    let mt = *m / (R::one() - self.beta1.powi(step));
    let vt = *v / (R::one() - self.beta2.powi(step));
    -rate * mt / (vt.sqrt() + self.epsilon)
  }
}
