use crate::{
  error::{ Error, Result },
  scalar::Real,
  value::Value,
};


fn check_lengths<T: Real>(op: &'static str, y_true: &[Value<T>], y_pred: &[Value<T>]) -> Result<()> {
  if y_true.len() != y_pred.len() {
    return Err(Error::LengthMismatch { op, expected: y_true.len(), actual: y_pred.len() })
  }
  Ok(())
}


/// Mean of the squared differences, as a differentiable value.
///
/// Empty inputs give a loss of zero.

pub fn mean_squared_error<T: Real>(y_true: &[Value<T>], y_pred: &[Value<T>]) -> Result<Value<T>> {
  check_lengths("mean_squared_error", y_true, y_pred)?;
  let sum = y_true
    .iter()
    .zip(y_pred)
    .fold(Value::new(T::zero()), |acc, (t, p)| acc + (t - p).sqr());
  let n = Value::<T>::lift("mean_squared_error", y_true.len().max(1))?;
  Ok(sum / n)
}


/// Fraction of predictions that round to their target.

pub fn binary_accuracy<T: Real>(y_true: &[Value<T>], y_pred: &[Value<T>]) -> Result<T> {
  check_lengths("binary_accuracy", y_true, y_pred)?;
  if y_true.is_empty() {
    return Ok(T::zero())
  }
  let correct = y_true
    .iter()
    .zip(y_pred)
    .filter(|(t, p)| t.data() == p.data().round())
    .count();
  let ratio = T::from(correct).zip(T::from(y_true.len())).map(|(correct, total)| correct / total);
  ratio.ok_or(Error::UnsupportedOperandType { op: "binary_accuracy", type_name: "usize" })
}
