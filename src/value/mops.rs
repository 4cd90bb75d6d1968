use num_traits::ToPrimitive;

use crate::{
  error::{ Error, Result },
  scalar::Real,
  value::Value,
};


/// Operation over two values that can also compute its derivative.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Mul,
}

impl BinaryOp {
  pub fn run<T: Real>(&self, lhs: T, rhs: T) -> T {
    match self {
      Self::Add => lhs + rhs,
      Self::Mul => lhs * rhs,
    }
  }

  pub fn derive<T: Real>(&self, lhs: T, rhs: T, grad: T) -> (T, T) {
    match self {
      Self::Add => (grad, grad),
      Self::Mul => (rhs * grad, lhs * grad),
    }
  }
}

impl std::fmt::Display for BinaryOp {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::Add => write!(f, "+"),
      Self::Mul => write!(f, "*"),
    }
  }
}


/// Operation over a single value that can also compute its derivative.
///
/// Derivatives get expressed through the operand's data or, where that is
/// cheaper, the operation's own result.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp<T: Real> {
  Pow(T),
  Exp,
  Tanh,
  ReLU,
  Sigmoid,
}

impl<T: Real> UnaryOp<T> {
  pub fn run(&self, lhs: T) -> T {
    let one = T::one();
    match *self {
      Self::Pow(exponent) => lhs.powf(exponent),
      Self::Exp => lhs.exp(),
      // (e^2x - 1) / (e^2x + 1), flipped to e^-2x for positive inputs to avoid overflow
      Self::Tanh => if lhs > T::zero() {
        let e = (-(lhs + lhs)).exp();
        (one - e) / (one + e)
      } else {
        let e = (lhs + lhs).exp();
        (e - one) / (e + one)
      },
      Self::ReLU => if lhs > T::zero() { lhs } else { T::zero() },
      Self::Sigmoid => if lhs >= T::zero() {
        one / (one + (-lhs).exp())
      } else {
        let e = lhs.exp();
        e / (one + e)
      },
    }
  }

  pub fn derive(&self, lhs: T, out: T, grad: T) -> T {
    let one = T::one();
    match *self {
      Self::Pow(exponent) => exponent * lhs.powf(exponent - one) * grad,
      Self::Exp => out * grad,
      Self::Tanh => (one - out * out) * grad,
      Self::ReLU => if out > T::zero() { grad } else { T::zero() },
      Self::Sigmoid => out * (one - out) * grad,
    }
  }
}

impl<T: Real> std::fmt::Display for UnaryOp<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::Pow(exponent) => write!(f, "pow{exponent}"),
      Self::Exp => write!(f, "exp"),
      Self::Tanh => write!(f, "tanh"),
      Self::ReLU => write!(f, "relu"),
      Self::Sigmoid => write!(f, "sigmoid"),
    }
  }
}


impl<T: Real> Value<T> {
  /// Raise this value to a constant power.
  ///
  /// Only finite constants that are representable in `T` are accepted;
  /// anything else is rejected right away instead of poisoning
  /// the backward pass later on.

  pub fn pow<E: ToPrimitive + Copy + std::fmt::Debug>(&self, exponent: E) -> Result<Self> {
    match T::from(exponent) {
      Some(exp) if exp.is_finite() => Ok(self.unary_op(UnaryOp::Pow(exp))),
      _ => Err(Error::InvalidExponent { exponent: format!("{exponent:?}") }),
    }
  }

  pub fn sqr(&self) -> Self {
    self.unary_op(UnaryOp::Pow(T::one() + T::one()))
  }

  pub fn exp(&self) -> Self {
    self.unary_op(UnaryOp::Exp)
  }

  pub fn tanh(&self) -> Self {
    self.unary_op(UnaryOp::Tanh)
  }

  pub fn relu(&self) -> Self {
    self.unary_op(UnaryOp::ReLU)
  }

  pub fn sigmoid(&self) -> Self {
    self.unary_op(UnaryOp::Sigmoid)
  }
}


impl<'b, T: Real> std::ops::Add<&'b Value<T>> for &Value<T> {
  type Output = Value<T>;

  fn add(self, rhs: &'b Value<T>) -> Value<T> {
    self.binary_op(BinaryOp::Add, rhs)
  }
}

impl<'b, T: Real> std::ops::Sub<&'b Value<T>> for &Value<T> {
  type Output = Value<T>;

  fn sub(self, rhs: &'b Value<T>) -> Value<T> {
    self + &(-rhs)
  }
}

impl<'b, T: Real> std::ops::Mul<&'b Value<T>> for &Value<T> {
  type Output = Value<T>;

  fn mul(self, rhs: &'b Value<T>) -> Value<T> {
    self.binary_op(BinaryOp::Mul, rhs)
  }
}

impl<'b, T: Real> std::ops::Div<&'b Value<T>> for &Value<T> {
  type Output = Value<T>;

  fn div(self, rhs: &'b Value<T>) -> Value<T> {
    self * &rhs.unary_op(UnaryOp::Pow(-T::one()))
  }
}

impl<T: Real> std::ops::Neg for &Value<T> {
  type Output = Value<T>;

  fn neg(self) -> Self::Output {
    self * -T::one()
  }
}

impl<T: Real> std::ops::Neg for Value<T> {
  type Output = Value<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}

// All other operand combinations go through the reference forms,
// lifting bare constants into leaf values first.

macro_rules! add_operator {
  (@constant $op:ident, $meth:ident, $symbol:tt, $t:ty) => {
    impl std::ops::$op<&Value<$t>> for $t { // T * &value
      type Output = Value<$t>;

      fn $meth(self, rhs: &Value<$t>) -> Value<$t> {
        &Value::new(self) $symbol rhs
      }
    }

    impl std::ops::$op<Value<$t>> for $t { // T * value
      type Output = Value<$t>;

      fn $meth(self, rhs: Value<$t>) -> Value<$t> {
        &Value::new(self) $symbol &rhs
      }
    }
  };

  ($op:ident, $meth:ident, $symbol:tt) => {
    impl<T: Real> std::ops::$op for Value<T> { // value * other
      type Output = Value<T>;

      fn $meth(self, rhs: Self) -> Value<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<Value<T>> for &Value<T> { // &value * other
      type Output = Value<T>;

      fn $meth(self, rhs: Value<T>) -> Value<T> {
        self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<&Value<T>> for Value<T> { // value * &other
      type Output = Value<T>;

      fn $meth(self, rhs: &Value<T>) -> Value<T> {
        &self $symbol rhs
      }
    }

    impl<T: Real> std::ops::$op<T> for &Value<T> { // &value * T
      type Output = Value<T>;

      fn $meth(self, rhs: T) -> Value<T> {
        self $symbol &Value::new(rhs)
      }
    }

    impl<T: Real> std::ops::$op<T> for Value<T> { // value * T
      type Output = Value<T>;

      fn $meth(self, rhs: T) -> Value<T> {
        &self $symbol &Value::new(rhs)
      }
    }

    add_operator!(@constant $op, $meth, $symbol, f32);
    add_operator!(@constant $op, $meth, $symbol, f64);
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);

macro_rules! assign_operator {
  ($op:ident, $meth:ident, $base:ident, $symbol:tt) => {
    // Rebinds to a fresh node, the previous one stays in the graph
    impl<T: Real, R> std::ops::$op<R> for Value<T>
    where
      for<'a> &'a Value<T>: std::ops::$base<R, Output = Value<T>>,
    {
      fn $meth(&mut self, rhs: R) {
        *self = &*self $symbol rhs;
      }
    }
  };
}

assign_operator!(AddAssign, add_assign, Add, +);
assign_operator!(SubAssign, sub_assign, Sub, -);
assign_operator!(MulAssign, mul_assign, Mul, *);
assign_operator!(DivAssign, div_assign, Div, /);
