//! Reverse-mode automatic differentiation over scalar values.
//! Tiny. Few dependencies. CPU only.
//!
//! # Features
//!
//! - **Eager graphs** — Every operation computes its result right away
//! while recording how it was derived. Calling [Value::backward] on the final
//! result propagates gradients to every value involved.
//!
//! - **Shared subexpressions** — Values are cheap handles to graph nodes, so
//! reusing one (`&x * &x`) refers to the very same node and gradients from
//! all paths add up correctly.
//!
//! - **Generic inner types** — Graphs can be built over `f32` or `f64`, or
//! anything else satisfying [scalar::Real].
//!
//! - **Neural networks** — Neurons, dense layers and multi layer perceptrons
//! built from plain values, including binary checkpoints.
//!
//! - **Optimization** — Includes SGD, Momentum, Nesterov and ADAM, together
//! with a simple batched training loop.
//!
//! - **Visualization** — Computation graphs can be rendered with Graphviz.
//!
//! # Examples
//!
//! Differentiating an expression:
//! ```
//! use scalargrad::Value;
//!
//! let a = Value::new(-4.0f64);
//! let b = Value::new(2.0f64);
//! let c = &a * &b + b.pow(3).unwrap();
//! let d = (&c + 1.0).relu() * &a;
//! d.backward();
//!
//! assert_eq!(d.data(), -4.0);
//! assert_eq!(a.grad(), -7.0);
//! assert_eq!(b.grad(), -32.0);
//! ```
//!
//! Minimizing a function with a standard optimizer:
//! ```
//! use scalargrad::{ Value, optimize::{ Optimizer, Adam } };
//!
//! let x = Value::new(3.0f64);
//! let y = Value::new(-2.0f64);
//! let mut optimizer = Optimizer::new(vec![x.clone(), y.clone()], 0.1, Adam::default());
//!
//! for _ in 0..500 {
//!   let loss = (&x - 1.0).sqr() + (&y * 2.0).tanh().sqr();
//!   optimizer.minimize(&loss);
//! }
//! assert!((x.data() - 1.0).abs() < 1e-2);
//! ```
//!
//! ## More examples
//! Check the `/demos` folder for more example code.
//!
//! # Logging
//!
//! Progress gets reported through the [log] facade. Install any logger
//! in your application to see it.

mod internal;
mod value;

pub mod error;
pub mod scalar;
pub mod nn;
pub mod optimize;
pub mod metrics;
pub mod data;
pub mod train;

pub use error::{ Error, Result };
pub use value::{ Value, Op, UnaryOp, BinaryOp, Graph, Dot, RankDir };
pub use nn::{ Module, Neuron, Layer, Mlp, Activation };
