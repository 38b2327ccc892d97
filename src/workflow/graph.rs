// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! Dependency graph of a compiled run
//!
//! The engine orders tasks by `runAfter` and, implicitly, by result
//! references such as `$(tasks.driver-a.results.context-name)` in params.
//! [`RunGraph`] rebuilds that combined ordering so a compiled run can be
//! checked and rendered.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::WorkflowRun;

fn result_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\(tasks\.([a-z0-9-]+)\.results\.").expect("result reference pattern is valid")
    })
}

/// Names of the tasks whose results a parameter value references
pub fn referenced_tasks(value: &str) -> Vec<&str> {
    result_reference()
        .captures_iter(value)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Combined ordering graph of a compiled run
#[derive(Debug)]
pub struct RunGraph {
    graph: DiGraph<String, EdgeKind>,
    nodes: BTreeMap<String, NodeIndex>,
    unresolved: Vec<(String, String)>,
}

/// Why one task runs after another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Declared in `runAfter`
    RunAfter,
    /// Implied by a result reference in a param
    Result,
}

impl RunGraph {
    /// Build the graph of a compiled run
    pub fn from_run(run: &WorkflowRun) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = BTreeMap::new();
        let mut unresolved = Vec::new();

        for task in run.root_dag() {
            let node = graph.add_node(task.name.clone());
            nodes.insert(task.name.clone(), node);
        }

        for task in run.root_dag() {
            let target = nodes[&task.name];

            for predecessor in &task.run_after {
                match nodes.get(predecessor) {
                    Some(source) => {
                        graph.update_edge(*source, target, EdgeKind::RunAfter);
                    }
                    None => unresolved.push((task.name.clone(), predecessor.clone())),
                }
            }

            for param in &task.params {
                for value in param.value.strings() {
                    for referenced in referenced_tasks(value) {
                        match nodes.get(referenced) {
                            Some(source) => {
                                if graph.find_edge(*source, target).is_none() {
                                    graph.add_edge(*source, target, EdgeKind::Result);
                                }
                            }
                            None => unresolved.push((task.name.clone(), referenced.to_string())),
                        }
                    }
                }
            }
        }

        Self {
            graph,
            nodes,
            unresolved,
        }
    }

    /// Whether the combined ordering is free of cycles
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// References to tasks the run does not contain, as (task, missing) pairs
    pub fn unresolved(&self) -> &[(String, String)] {
        &self.unresolved
    }

    /// Tasks with no predecessor
    pub fn roots(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|(_, node)| {
                self.graph
                    .neighbors_directed(**node, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether `after` is ordered directly after `before`
    pub fn has_edge(&self, before: &str, after: &str) -> bool {
        match (self.nodes.get(before), self.nodes.get(after)) {
            (Some(b), Some(a)) => self.graph.find_edge(*b, *a).is_some(),
            _ => false,
        }
    }

    /// Generate DOT diagram of the run
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph run {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for edge in self.graph.edge_references() {
            let style = match edge.weight() {
                EdgeKind::RunAfter => "",
                EdgeKind::Result => " [style=dashed]",
            };
            out.push_str(&format!(
                "    \"{}\" -> \"{}\"{};\n",
                self.graph[edge.source()],
                self.graph[edge.target()],
                style
            ));
        }

        out.push_str("}\n");
        out
    }

    /// Generate Mermaid diagram of the run
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for edge in self.graph.edge_references() {
            let arrow = match edge.weight() {
                EdgeKind::RunAfter => "-->",
                EdgeKind::Result => "-.->",
            };
            out.push_str(&format!(
                "    {} {} {}\n",
                self.graph[edge.source()],
                arrow,
                self.graph[edge.target()]
            ));
        }

        out
    }
}
