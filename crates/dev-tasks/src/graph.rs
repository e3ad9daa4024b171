//! Target graph construction and lookup

use std::collections::{BTreeMap, HashMap};

use dev_core::TargetSet;
use tracing::{debug, instrument};

use crate::target::TargetSpec;

/// A node in the target graph
#[derive(Debug, Clone)]
pub struct TargetNode {
    /// The resolved target
    pub spec: TargetSpec,
    /// Dependency references, in declaration order
    pub dependencies: Vec<String>,
    /// Targets that reference this one
    pub dependents: Vec<String>,
}

/// Targets as nodes, dependency references as edges.
///
/// Edges may point at undefined targets and may form cycles; both are
/// reported by [`missing_dependencies`](Self::missing_dependencies) and
/// [`find_cycles`](Self::find_cycles) but only fail once a run reaches them.
#[derive(Debug, Clone, Default)]
pub struct TargetGraph {
    nodes: BTreeMap<String, TargetNode>,
}

impl TargetGraph {
    /// Build the graph from a loaded target set
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub fn from_set(targets: &TargetSet) -> Self {
        let mut nodes: BTreeMap<String, TargetNode> = targets
            .iter()
            .map(|(name, config)| {
                let spec = TargetSpec::from_config(name, config);
                let node = TargetNode {
                    dependencies: spec.dependencies.clone(),
                    dependents: Vec::new(),
                    spec,
                };
                (name.to_string(), node)
            })
            .collect();

        let edges: Vec<(String, String)> = nodes
            .values()
            .flat_map(|node| {
                node.dependencies
                    .iter()
                    .map(|dep| (node.spec.name.clone(), dep.clone()))
            })
            .collect();

        for (from, to) in edges {
            if let Some(dep_node) = nodes.get_mut(&to) {
                if !dep_node.dependents.contains(&from) {
                    dep_node.dependents.push(from);
                }
            }
        }

        debug!(node_count = nodes.len(), "target graph built");
        Self { nodes }
    }

    /// Look up a target by name
    pub fn resolve(&self, name: &str) -> Result<&TargetSpec, GraphError> {
        self.nodes
            .get(name)
            .map(|node| &node.spec)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no targets
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `(target, dependency)` pairs whose dependency is not defined
    pub fn missing_dependencies(&self) -> Vec<(String, String)> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.dependencies
                    .iter()
                    .filter(|dep| !self.nodes.contains_key(*dep))
                    .map(|dep| (node.spec.name.clone(), dep.clone()))
            })
            .collect()
    }

    /// Every dependency cycle, each as a path that starts and ends on the same
    /// target (`["a", "b", "a"]`).
    ///
    /// Diagnostic only: the executor does not refuse cyclic graphs.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            graph: &'a TargetGraph,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
            cycles: &mut Vec<Vec<String>>,
        ) {
            marks.insert(name, Mark::Visiting);
            stack.push(name);

            if let Some(node) = graph.nodes.get(name) {
                for dep in &node.dependencies {
                    match marks.get(dep.as_str()) {
                        Some(Mark::Visiting) => {
                            let start = stack.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                            let mut cycle: Vec<String> =
                                stack[start..].iter().map(|n| n.to_string()).collect();
                            cycle.push(dep.clone());
                            cycles.push(cycle);
                        }
                        Some(Mark::Done) => {}
                        None => {
                            if graph.nodes.contains_key(dep) {
                                visit(graph, dep, marks, stack, cycles);
                            }
                        }
                    }
                }
            }

            stack.pop();
            marks.insert(name, Mark::Done);
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut cycles = Vec::new();

        for name in self.nodes.keys() {
            if !marks.contains_key(name.as_str()) {
                visit(self, name, &mut marks, &mut stack, &mut cycles);
            }
        }

        cycles
    }

    /// Human-readable listing of targets, what they run after and what
    /// needs them
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for node in self.nodes.values() {
            let spec = &node.spec;
            out.push_str("  ");
            out.push_str(&spec.name);
            if spec.cache_enabled {
                out.push_str(" [cached]");
            }
            if !node.dependencies.is_empty() {
                out.push_str(&format!(" (after: {})", node.dependencies.join(", ")));
            }
            if !node.dependents.is_empty() {
                out.push_str(&format!(" (needed by: {})", node.dependents.join(", ")));
            }
            out.push('\n');
        }
        out
    }
}

/// Target lookup errors
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// No target with this name
    #[error("Invalid target: {0}")]
    NotFound(String),

    /// A dependency names a target that does not exist
    #[error("Invalid target: {dependency} (dependency of {target})")]
    UnknownDependency { target: String, dependency: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use dev_core::TargetConfig;

    fn create_set() -> TargetSet {
        TargetSet::new()
            .with_target(
                "generate",
                TargetConfig::new().with_command("go generate ./..."),
            )
            .with_target(
                "build",
                TargetConfig::new()
                    .with_command("go build ./...")
                    .with_dependency("generate")
                    .with_source("src/*.go")
                    .with_cache(true),
            )
            .with_target(
                "test",
                TargetConfig::new()
                    .with_command("go test ./...")
                    .with_dependency("generate")
                    .with_dependency("build"),
            )
    }

    #[test]
    fn test_resolve_assigns_name() {
        let graph = TargetGraph::from_set(&create_set());
        let spec = graph.resolve("build").unwrap();
        assert_eq!(spec.name, "build");
        assert!(spec.cache_enabled);
        assert_eq!(spec.sources, vec!["src/*.go"]);
    }

    #[test]
    fn test_resolve_unknown() {
        let graph = TargetGraph::from_set(&create_set());
        let err = graph.resolve("nope").unwrap_err();
        assert!(matches!(err, GraphError::NotFound(ref name) if name == "nope"));
        assert_eq!(err.to_string(), "Invalid target: nope");
    }

    #[test]
    fn test_size() {
        let graph = TargetGraph::from_set(&create_set());
        assert_eq!(graph.len(), 3);
        assert!(!graph.is_empty());
        assert!(TargetGraph::from_set(&TargetSet::new()).is_empty());
    }

    #[test]
    fn test_missing_dependencies() {
        let set = create_set().with_target("lint", TargetConfig::new().with_dependency("fmt"));
        let graph = TargetGraph::from_set(&set);
        assert_eq!(
            graph.missing_dependencies(),
            vec![("lint".to_string(), "fmt".to_string())]
        );
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let graph = TargetGraph::from_set(&create_set());
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn test_find_cycles() {
        let set = TargetSet::new()
            .with_target("a", TargetConfig::new().with_dependency("b"))
            .with_target("b", TargetConfig::new().with_dependency("a"))
            .with_target("c", TargetConfig::new().with_dependency("c"));
        let graph = TargetGraph::from_set(&set);

        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 2);
        assert!(cycles.contains(&vec!["a".to_string(), "b".to_string(), "a".to_string()]));
        assert!(cycles.contains(&vec!["c".to_string(), "c".to_string()]));
    }

    #[test]
    fn test_describe() {
        let graph = TargetGraph::from_set(&create_set());
        let listing = graph.describe();
        let expected = [
            "  build [cached] (after: generate) (needed by: test)",
            "  generate (needed by: build, test)",
            "  test (after: generate, build)",
        ];
        assert_eq!(listing, format!("{}\n", expected.join("\n")));
    }

    #[test]
    fn test_dependents_are_not_duplicated() {
        let set = TargetSet::new()
            .with_target("gen", TargetConfig::new())
            .with_target(
                "app",
                TargetConfig::new()
                    .with_dependency("gen")
                    .with_dependency("gen"),
            );
        let listing = TargetGraph::from_set(&set).describe();
        assert!(listing.contains("  gen (needed by: app)\n"));
        assert!(listing.contains("  app (after: gen, gen)\n"));
    }
}
