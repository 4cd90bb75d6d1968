// This example demonstrates rendering a computation graph with Graphviz.
//
// Pipe its output into `dot -Tsvg > graph.svg` to get a picture.

use scalargrad::{ Value, Graph, RankDir };

fn main() -> scalargrad::Result<()> {
  // A single neuron
  let x1 = Value::new(2.0f64).with_label("x1");
  let x2 = Value::new(0.0f64).with_label("x2");
  let w1 = Value::new(-3.0f64).with_label("w1");
  let w2 = Value::new(1.0f64).with_label("w2");
  let b = Value::new(6.881_373_587_019_543f64).with_label("b");

  let n = (&x1 * &w1 + &x2 * &w2 + &b).with_label("n");
  let o = n.tanh().with_label("o");

  // Gradients show up in the rendering as well
  o.backward();

  let graph = Graph::trace(&o)?;
  println!("{}", graph.dot(RankDir::LR));

  Ok(())
}
