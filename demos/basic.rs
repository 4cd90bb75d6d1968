// This example demonstrates building an expression from scalar values,
// computing its gradients and nudging the inputs to decrease it.

use scalargrad::Value;

fn main() {
  // Define some leaf values
  let x = Value::new(2.0f64).with_label("x");
  let w = Value::new(-0.5f64).with_label("w");
  let b = Value::new(0.1f64).with_label("b");

  // Do some computation
  let z = ((&x * &w + &b).tanh() - 0.5).sqr();

  // Compute gradients
  z.backward();

  println!("z = {}", z.data());
  println!("Gradient of z with respect to w: {}", w.grad());
  println!("Gradient of z with respect to b: {}", b.grad());

  // Nudge w and b in order to minimize z
  for param in [&w, &b] {
    param.set_data(param.data() - param.grad() * 0.1);
  }
  z.reset();

  let z = ((&x * &w + &b).tanh() - 0.5).sqr();
  println!("z after one step = {}", z.data());
}
