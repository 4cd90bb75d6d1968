use rand::distributions::uniform::SampleUniform;
use num_traits::{ Float, NumAssignOps };


/// All floating point types a [Value](crate::Value) may hold.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits, which in practice means
/// `f32` and `f64`.

pub trait Real: Float + NumAssignOps + SampleUniform + Default + std::fmt::Debug + std::fmt::Display + 'static {}
impl<T: Float + NumAssignOps + SampleUniform + Default + std::fmt::Debug + std::fmt::Display + 'static> Real for T {}


#[cfg(test)]
mod tests {
  use super::*;

  fn accepts<T: Real>(value: T) -> T {
    value + T::one()
  }

  #[test]
  fn floats_are_real() {
    assert_eq!(accepts(1.0f32), 2.0);
    assert_eq!(accepts(1.0f64), 2.0);
  }
}
