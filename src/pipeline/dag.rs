// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

//! DAG (Directed Acyclic Graph) builder for task dependencies
//!
//! Builds and validates the dependency graph of one scope, ensuring
//! every dependency resolves to a sibling and detecting cycles.

use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::errors::{CompileError, CompileResult};
use crate::pipeline::{ScopePath, TaskSpec};

/// Builder for the task dependency DAG of one scope
#[derive(Debug)]
pub struct DagBuilder {
    graph: DiGraph<usize, ()>,
    name_to_index: BTreeMap<String, NodeIndex>,
    index_to_name: HashMap<NodeIndex, String>,
}

impl DagBuilder {
    /// Create an empty DAG builder
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_index: BTreeMap::new(),
            index_to_name: HashMap::new(),
        }
    }

    /// Build the DAG of one scope
    ///
    /// Edges point from a dependency to its dependent. Sibling names are
    /// expected to be unique already; the validator checks that first.
    pub fn build(tasks: &[TaskSpec], scope: &ScopePath) -> CompileResult<Self> {
        let mut builder = Self::new();

        for (idx, task) in tasks.iter().enumerate() {
            let node = builder.graph.add_node(idx);
            builder.name_to_index.insert(task.name.clone(), node);
            builder.index_to_name.insert(node, task.name.clone());
        }

        for task in tasks {
            let task_node = builder.name_to_index[&task.name];

            for dep_name in &task.dependencies {
                let dep_node = builder.name_to_index.get(dep_name).ok_or_else(|| {
                    CompileError::UnknownDependency {
                        task: scope.qualify(&task.name),
                        dependency: dep_name.clone(),
                    }
                })?;

                builder.graph.add_edge(*dep_node, task_node, ());
            }
        }

        builder.validate_acyclic(scope)?;

        Ok(builder)
    }

    /// Validate that the graph is acyclic
    fn validate_acyclic(&self, scope: &ScopePath) -> CompileResult<()> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(CompileError::CyclicDependency {
                scope: scope.to_string(),
                tasks: self.find_cycle(cycle.node_id()),
            }),
        }
    }

    /// Find one closed cycle through the strongly connected component of `start`
    ///
    /// The returned path begins and ends with the same task.
    fn find_cycle(&self, start: NodeIndex) -> Vec<String> {
        let component: HashSet<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .map(|scc| scc.into_iter().collect())
            .unwrap_or_default();

        // Anchor on the first declared member so the report is stable
        let anchor = component
            .iter()
            .copied()
            .min_by_key(|n| self.graph[*n])
            .unwrap_or(start);

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([anchor]);
        let mut closing = None;

        while let Some(node) = queue.pop_front() {
            let mut successors: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .filter(|n| component.contains(n))
                .collect();
            successors.sort_by_key(|n| self.graph[*n]);

            for next in successors {
                if next == anchor {
                    closing = Some(node);
                    break;
                }
                if !parent.contains_key(&next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }

            if closing.is_some() {
                break;
            }
        }

        let mut path = vec![self.index_to_name[&anchor].clone()];
        let mut cursor = closing;
        let mut reversed = Vec::new();
        while let Some(node) = cursor {
            if node == anchor {
                break;
            }
            reversed.push(self.index_to_name[&node].clone());
            cursor = parent.get(&node).copied();
        }
        path.extend(reversed.into_iter().rev());
        path.push(self.index_to_name[&anchor].clone());

        path
    }

    /// Get topologically sorted task indices
    pub fn topological_order(&self) -> Vec<usize> {
        // The graph was checked for cycles when it was built
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .unwrap_or_default()
    }

    /// Get dependencies for a task (tasks that must run before it)
    pub fn dependencies(&self, task_name: &str) -> Option<Vec<String>> {
        let node = self.name_to_index.get(task_name)?;
        let mut deps: Vec<String> = self
            .graph
            .neighbors_directed(*node, Direction::Incoming)
            .map(|n| self.index_to_name[&n].clone())
            .collect();
        deps.sort();
        Some(deps)
    }

    /// Check if task A depends (directly or transitively) on task B
    pub fn depends_on(&self, task_a: &str, task_b: &str) -> bool {
        let Some(node_a) = self.name_to_index.get(task_a) else {
            return false;
        };
        let Some(node_b) = self.name_to_index.get(task_b) else {
            return false;
        };

        node_a != node_b && has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    /// Generate Mermaid diagram of the DAG
    ///
    /// Nodes get positional ids; task names only appear as quoted labels.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for (name, node) in &self.name_to_index {
            out.push_str(&format!(
                "    t{}[\"{}\"]\n",
                self.graph[*node],
                name.replace('"', "#quot;")
            ));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    t{} --> t{}\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for edge in self.graph.edge_references() {
            let from_name = &self.index_to_name[&edge.source()];
            let to_name = &self.index_to_name[&edge.target()];
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                dot_escape(from_name),
                dot_escape(to_name)
            ));
        }

        // Isolated nodes (no edges)
        for (name, node) in &self.name_to_index {
            if self.graph.neighbors_undirected(*node).next().is_none() {
                out.push_str(&format!("    \"{}\";\n", dot_escape(name)));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self, tasks: &[TaskSpec]) -> String {
        let mut out = String::new();

        for (i, idx) in self.topological_order().iter().enumerate() {
            let task = &tasks[*idx];
            let deps = self.dependencies(&task.name).unwrap_or_default();
            let kind = if task.is_composite() {
                "dag"
            } else {
                task.component_ref.as_str()
            };

            out.push_str(&format!("{}. {} ({})", i + 1, task.name, kind));

            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        out
    }
}

fn dot_escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Default for DagBuilder {
    fn default() -> Self {
        Self::new()
    }
}
