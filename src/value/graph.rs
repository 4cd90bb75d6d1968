use itertools::Itertools;
use serde::{ Serialize, Deserialize };

use crate::{
  error::Result,
  scalar::Real,
  value::Value,
};


/// Layout direction of a rendered graph.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankDir {
  /// Left to right
  #[default]
  LR,
  /// Top to bottom
  TB,
}

impl std::fmt::Display for RankDir {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::LR => write!(f, "LR"),
      Self::TB => write!(f, "TB"),
    }
  }
}


/// Read-only snapshot of the computation graph behind a [Value],
/// used for inspecting and rendering it.
///
/// Tracing never touches any data or gradient, so a graph may be traced
/// before or after back-propagation to see either state.

#[derive(Debug, Clone)]
pub struct Graph<T: Real> {
  /// Every value reachable from the root, operands first.
  pub nodes: Vec<Value<T>>,
  /// Unique `(operand, result)` pairs.
  pub edges: Vec<(Value<T>, Value<T>)>,
}

impl<T: Real> Graph<T> {
  pub fn trace(root: &Value<T>) -> Result<Self> {
    let nodes = root.topological_order()?;
    let edges: Vec<_> = nodes
      .iter()
      .flat_map(|node| node.previous().into_iter().map(move |prev| (prev, node.clone())))
      .unique_by(|(prev, node)| (prev.id(), node.id()))
      .collect();
    log::debug!("Traced {} nodes and {} edges from #{}", nodes.len(), edges.len(), root.id());
    Ok(Self { nodes, edges })
  }

  pub fn dot(&self, rankdir: RankDir) -> Dot<'_, T> {
    Dot { graph: self, rankdir }
  }

  /// Render as a Graphviz digraph.

  pub fn to_dot(&self, rankdir: RankDir) -> String {
    self.dot(rankdir).to_string()
  }
}


/// [Display](std::fmt::Display)able Graphviz rendering of a [Graph].
///
/// Every value becomes a record showing its label, data and gradient.
/// Values created by an operation get an additional node for that operation,
/// which their operands point to.

pub struct Dot<'a, T: Real> {
  graph: &'a Graph<T>,
  rankdir: RankDir,
}

impl<'a, T: Real> std::fmt::Display for Dot<'a, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    writeln!(f, "digraph {{")?;
    writeln!(f, "  rankdir={};", self.rankdir)?;

    for node in &self.graph.nodes {
      let id = node.id();
      let name = match (node.label(), node.op()) {
        (label, _) if !label.is_empty() => label,
        (_, Some(op)) => format!("{op}_res"),
        (_, None) => String::new(),
      };
      writeln!(
        f,
        "  \"{id}\" [label=\"{} | data: {:.4} | grad: {:.4}\", shape=record];",
        escape(&name), node.data(), node.grad(),
      )?;
      if let Some(op) = node.op() {
        writeln!(f, "  \"{id}_op\" [label=\"{}\"];", escape(&op.to_string()))?;
        writeln!(f, "  \"{id}_op\" -> \"{id}\";")?;
      }
    }

    // Operands feed into the operation node of their result
    for (prev, node) in &self.graph.edges {
      writeln!(f, "  \"{}\" -> \"{}_op\";", prev.id(), node.id())?;
    }

    writeln!(f, "}}")
  }
}

// Characters with a meaning inside quoted record labels

fn escape(text: &str) -> String {
  text.chars()
    .map(|c| match c {
      '"' | '{' | '}' | '|' | '<' | '>' | '\\' => format!("\\{c}"),
      c => c.to_string(),
    })
    .join("")
}
