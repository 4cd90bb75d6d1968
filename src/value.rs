use std::cell::{ Cell, RefCell };
use std::collections::HashMap;
use std::rc::Rc;

use num_traits::ToPrimitive;

mod mops;
mod graph;

pub use mops::{ UnaryOp, BinaryOp };
pub use graph::{ Graph, Dot, RankDir };

use crate::{
  internal::{ make_id, topological_sort },
  error::{ Error, Result },
  scalar::Real,
};


/// Operation that produced a [Value], together with any
/// constants needed to derive it.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op<T: Real> {
  Unary(UnaryOp<T>),
  Binary(BinaryOp),
}

impl<T: Real> std::fmt::Display for Op<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::Unary(op) => write!(f, "{op}"),
      Self::Binary(op) => write!(f, "{op}"),
    }
  }
}


/// Node in a computation graph, containing a [Value]'s data and gradient,
/// as well as the operation used to create it.

struct Node<T: Real> {
  id: usize,
  data: Cell<T>,
  grad: Cell<T>,
  op: Option<Op<T>>,
  previous: Vec<Rc<Self>>,
  label: RefCell<String>,
}

impl<T: Real> Node<T> {
  fn accumulate(&self, change: T) {
    self.grad.set(self.grad.get() + change);
  }

  // Hand each operand its share of `grad`

  fn propagate(&self, grad: T, mut accumulate: impl FnMut(&Rc<Self>, T)) {
    let Some(op) = &self.op else { return };
    match op {
      Op::Unary(op) => {
        let lhs = &self.previous[0];
        accumulate(lhs, op.derive(lhs.data.get(), self.data.get(), grad));
      },
      Op::Binary(op) => {
        let lhs = &self.previous[0];
        let rhs = &self.previous[1];
        let (change_lhs, change_rhs) = op.derive(lhs.data.get(), rhs.data.get(), grad);
        accumulate(lhs, change_lhs);
        accumulate(rhs, change_rhs);
      },
    }
  }
}

// Unlink operands on an explicit stack, so dropping a long chain never recurses

impl<T: Real> Drop for Node<T> {
  fn drop(&mut self) {
    let mut stack = std::mem::take(&mut self.previous);
    while let Some(node) = stack.pop() {
      if let Ok(mut node) = Rc::try_unwrap(node) {
        stack.append(&mut node.previous);
      }
    }
  }
}


/// Values track the operations used to create them and allow
/// for computing their gradient with respect to every value involved.
///
/// A `Value` is a cheap handle. Cloning it yields another handle to the
/// same node, so reusing a value in an expression (`&x * &x`) records
/// a single shared operand rather than a copy.
///
/// ```
/// use scalargrad::Value;
///
/// let x = Value::new(2.0f64);
/// let y = x.pow(2).unwrap() + 3.0f64 * &x - 1.0;
/// y.backward();
///
/// assert_eq!(y.data(), 9.0);
/// assert_eq!(x.grad(), 7.0);
/// ```

#[derive(Clone)]
pub struct Value<T: Real> {
  node: Rc<Node<T>>,
}

impl<T: Real> From<T> for Value<T> {
  fn from(data: T) -> Self {
    Self::new(data)
  }
}

impl<T: Real> Value<T> {
  /// Create a leaf value, such as an input or a model parameter.

  pub fn new(data: T) -> Self {
    Self::operation(None, data, vec![])
  }

  /// Lift any primitive numeric constant into a leaf value.
  ///
  /// Fails if the constant cannot be represented in `T`.

  pub fn constant<C: ToPrimitive>(value: C) -> Result<Self> {
    Self::lift("constant", value)
  }

  pub(crate) fn lift<C: ToPrimitive>(op: &'static str, value: C) -> Result<Self> {
    T::from(value)
      .map(Self::new)
      .ok_or(Error::UnsupportedOperandType { op, type_name: std::any::type_name::<C>() })
  }

  fn operation(op: Option<Op<T>>, data: T, previous: Vec<Rc<Node<T>>>) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        data: Cell::new(data),
        grad: Cell::new(T::zero()),
        op,
        previous,
        label: RefCell::new(String::new()),
      }),
    }
  }

  pub fn unary_op(&self, op: UnaryOp<T>) -> Self {
    let data = op.run(self.data());
    Self::operation(Some(Op::Unary(op)), data, vec![self.node.clone()])
  }

  pub fn binary_op(&self, op: BinaryOp, rhs: &Self) -> Self {
    let data = op.run(self.data(), rhs.data());
    Self::operation(Some(Op::Binary(op)), data, vec![self.node.clone(), rhs.node.clone()])
  }

  pub fn id(&self) -> usize {
    self.node.id
  }

  pub fn data(&self) -> T {
    self.node.data.get()
  }

  /// Overwrite this value's data in place.
  ///
  /// Meant for optimizers updating parameters between training steps.
  /// Nodes derived from this one keep the data they were computed with.

  pub fn set_data(&self, data: T) {
    self.node.data.set(data);
  }

  pub fn grad(&self) -> T {
    self.node.grad.get()
  }

  pub fn set_grad(&self, grad: T) {
    self.node.grad.set(grad);
  }

  pub fn zero_grad(&self) {
    self.set_grad(T::zero());
  }

  pub fn op(&self) -> Option<Op<T>> {
    self.node.op
  }

  pub fn is_leaf(&self) -> bool {
    self.node.op.is_none()
  }

  /// Operands this value was computed from, in operand order.

  pub fn previous(&self) -> Vec<Self> {
    self.node.previous.iter().map(|node| Self { node: node.clone() }).collect()
  }

  pub fn label(&self) -> String {
    self.node.label.borrow().clone()
  }

  pub fn set_label(&self, label: &str) {
    *self.node.label.borrow_mut() = label.to_string();
  }

  pub fn with_label(self, label: &str) -> Self {
    self.set_label(label);
    self
  }

  /// Whether both handles point at the same node.

  pub fn ptr_eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.node, &other.node)
  }

  /// Compute gradients across this Value's entire graph.
  ///
  /// Gradients get added to whatever the nodes already hold, so
  /// call [reset](Self::reset) or [zero_grad](Self::zero_grad) first
  /// if you want fresh ones.

  pub fn backward(&self) {
    if let Err(err) = self.try_backward() { panic!("{err}") }
  }

  /// Like [backward](Self::backward), returning graph corruption as an error.

  pub fn try_backward(&self) -> Result<()> {
    let history = self.try_history()?;
    let index: HashMap<usize, usize> = history
      .iter()
      .enumerate()
      .map(|(i, node)| (node.id, i))
      .collect();

    // Gradients of this pass only; the root comes last
    let mut grads = vec![T::zero(); history.len()];
    if let Some(root) = grads.last_mut() {
      *root = T::one();
    }
    for (i, node) in history.iter().enumerate().rev() {
      let grad = grads[i];
      node.propagate(grad, |prev, change| grads[index[&prev.id]] += change);
    }

    for (node, grad) in history.iter().zip(grads) {
      node.accumulate(grad);
    }

    log::trace!("Back-propagated through {} nodes from #{}", history.len(), self.id());
    Ok(())
  }

  /// All values in this Value's graph, each after all of its operands.
  /// The value itself comes last.

  pub fn topological_order(&self) -> Result<Vec<Self>> {
    Ok(self.try_history()?
      .into_iter()
      .map(|node| Self { node })
      .collect())
  }

  /// List all leaf values in this Value's graph.

  pub fn inputs(&self) -> Vec<Self> {
    self.history()
      .into_iter()
      .filter(|node| node.op.is_none())
      .map(|node| Self { node })
      .collect()
  }

  /// Set gradients to zero for this Value's entire graph.

  pub fn reset(&self) {
    for node in self.history() {
      node.grad.set(T::zero());
    }
  }

  fn history(&self) -> Vec<Rc<Node<T>>> {
    self.try_history().unwrap_or_else(|err| panic!("{err}"))
  }

  fn try_history(&self) -> Result<Vec<Rc<Node<T>>>> {
    topological_sort(&self.node, |node| node.id, |node| node.previous.clone())
  }

  /// Compute a function's gradient with respect to every input
  /// numerically and compare it to the automatically derived solution.
  ///
  /// Returns the largest absolute difference between both.

  pub fn check_gradients<F>(inputs: &[T], function: F) -> T
  where
    F: Fn(&[Self]) -> Self
  {
    let eps = T::epsilon().cbrt();
    let two = T::one() + T::one();
    // Compute gradient using auto diff
    let vars: Vec<Self> = inputs.iter().map(|&x| Self::new(x)).collect();
    function(&vars).backward();
    // Compute gradient numerically for every input
    let shifted = |i: usize, offset: T| {
      let vars: Vec<Self> = inputs
        .iter()
        .enumerate()
        .map(|(j, &x)| Self::new(if i == j { x + offset } else { x }))
        .collect();
      function(&vars).data()
    };
    vars.iter()
      .enumerate()
      .map(|(i, var)| {
        let numeric = (shifted(i, eps) - shifted(i, -eps)) / (two * eps);
        (var.grad() - numeric).abs()
      })
      .fold(T::zero(), T::max)
  }
}

impl<T: Real> std::fmt::Display for Value<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let label = self.node.label.borrow();
    if label.is_empty() {
      write!(f, "Value(data={}, grad={})", self.data(), self.grad())
    } else {
      write!(f, "Value(data={}, grad={}, label={label})", self.data(), self.grad())
    }
  }
}

impl<T: Real> std::fmt::Debug for Value<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.debug_struct("Value")
      .field("id", &self.id())
      .field("data", &self.data())
      .field("grad", &self.grad())
      .field("op", &self.node.op)
      .field("label", &*self.node.label.borrow())
      .finish()
  }
}
