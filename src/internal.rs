use std::collections::HashMap;
use std::sync::atomic::{ AtomicUsize, Ordering };

use rand::Rng;

use crate::{
  error::{ Error, Result },
  scalar::Real,
};


pub fn make_id() -> usize {
  static LAST_ID: AtomicUsize = AtomicUsize::new(0);
  LAST_ID.fetch_add(1, Ordering::Relaxed)
}


// Uniform sample from [low, high)

pub fn uniform<T: Real>(rng: &mut impl Rng, low: T, high: T) -> T {
  rng.gen_range(low, high)
}


#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
  InProgress,
  Done,
}


/// Depth-first post-order over the graph spanned by `previous`,
/// starting from `root`. Every node appears exactly once and after all of
/// its predecessors. Nodes are identified by `key`.
///
/// Runs on an explicit stack, so arbitrarily long chains are fine.
/// Reaching a node that is still being expanded means the graph has a cycle,
/// which is reported as [Error::InvariantViolation].

pub fn topological_sort<N, K, P, I>(root: &N, key: K, previous: P) -> Result<Vec<N>>
where
  N: Clone,
  K: Fn(&N) -> usize,
  P: Fn(&N) -> I,
  I: IntoIterator<Item = N>,
  I::IntoIter: DoubleEndedIterator,
{
  let mut order = vec![];
  let mut marks: HashMap<usize, Mark> = HashMap::new();
  let mut stack = vec![(root.clone(), false)];

  while let Some((node, expanded)) = stack.pop() {
    let id = key(&node);
    if expanded {
      marks.insert(id, Mark::Done);
      order.push(node);
      continue;
    }
    match marks.get(&id) {
      Some(Mark::Done) => continue,
      Some(Mark::InProgress) => return Err(cycle(id)),
      None => {},
    }
    marks.insert(id, Mark::InProgress);
    stack.push((node.clone(), true));
    // Reversed so the first predecessor gets visited first
    for prev in previous(&node).into_iter().rev() {
      match marks.get(&key(&prev)) {
        Some(Mark::InProgress) => return Err(cycle(key(&prev))),
        Some(Mark::Done) => {},
        None => stack.push((prev, false)),
      }
    }
  }

  Ok(order)
}

fn cycle(id: usize) -> Error {
  Error::InvariantViolation(format!("computation graph contains a cycle through node #{id}"))
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };

  fn sort(edges: &[Vec<usize>], root: usize) -> Result<Vec<usize>> {
    topological_sort(&root, |&n| n, |&n| edges[n].clone())
  }

  fn position(order: &[usize], node: usize) -> usize {
    order.iter().position(|&n| n == node).unwrap()
  }

  #[test]
  fn ids_are_unique() {
    let a = make_id();
    let b = make_id();
    assert_ne!(a, b);
  }

  #[test]
  fn diamond() {
    // 3 depends on 1 and 2, which both depend on 0
    let edges = vec![vec![], vec![0], vec![0], vec![1, 2]];
    let order = sort(&edges, 3).unwrap();
    assert_eq!(order, vec![0, 1, 2, 3]);
  }

  #[test]
  fn operands_precede_consumers() {
    let edges = vec![vec![], vec![0, 0], vec![1, 0], vec![2, 1], vec![3, 3, 2], vec![]];
    let order = sort(&edges, 4).unwrap();
    assert_eq!(order.len(), 5);
    for (node, prev) in edges.iter().enumerate().take(5) {
      for &p in prev {
        assert!(position(&order, p) < position(&order, node));
      }
    }
    assert!(!order.contains(&5));
  }

  #[test]
  fn long_chain() {
    let edges: Vec<Vec<usize>> = (0..100_000).map(|n| if n == 0 { vec![] } else { vec![n - 1] }).collect();
    let order = sort(&edges, 99_999).unwrap();
    assert_eq!(order.len(), 100_000);
    assert_eq!(order[0], 0);
  }

  #[test]
  fn cycles_are_invariant_violations() {
    let edges = vec![vec![2], vec![0], vec![1]];
    let result = sort(&edges, 2);
    assert!(matches!(result, Err(Error::InvariantViolation(_))));

    let self_loop = vec![vec![0]];
    assert!(matches!(sort(&self_loop, 0), Err(Error::InvariantViolation(_))));
  }

  #[test]
  fn uniform_stays_in_range() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
      let x: f64 = uniform(&mut rng, -1.0, 1.0);
      assert!(x >= -1.0 && x < 1.0);
    }
  }
}
