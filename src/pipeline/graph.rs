//! Target selection and stage ordering
//!
//! The selection is the set of requested targets plus their transitive
//! prerequisites. Ordering edges (`runs_before`) only apply between stages that
//! are both selected; they never pull a stage into the run.

use super::stage::Stage;
use crate::core::error::{ReleaseError, ReleaseResult};
use petgraph::algo;
use petgraph::graphmap::DiGraphMap;
use std::collections::BTreeSet;

/// Stages to run for `targets`, in execution order
pub fn execution_plan(targets: &[Stage]) -> ReleaseResult<Vec<Stage>> {
  let selected = selection(targets);

  // Nodes are added in canonical order so the sort is stable across runs
  let mut graph = DiGraphMap::<Stage, ()>::new();
  for stage in Stage::ALL.into_iter().filter(|s| selected.contains(s)) {
    graph.add_node(stage);
  }

  for &stage in &selected {
    let def = stage.definition();
    for &dep in def.depends_on {
      graph.add_edge(dep, stage, ());
    }
    for &later in def.runs_before.iter().filter(|s| selected.contains(s)) {
      graph.add_edge(stage, later, ());
    }
  }

  algo::toposort(&graph, None)
    .map_err(|cycle| ReleaseError::message(format!("Stage graph has a cycle through {}", cycle.node_id())))
}

/// Targets plus everything they transitively depend on
pub fn selection(targets: &[Stage]) -> BTreeSet<Stage> {
  let mut selected = BTreeSet::new();
  let mut stack: Vec<Stage> = targets.to_vec();

  while let Some(stage) = stack.pop() {
    if selected.insert(stage) {
      stack.extend(stage.definition().depends_on.iter().copied());
    }
  }

  selected
}
