use crate::{
    ExecutionError, FlowError, LinkError, NodeId, OperationError, OperationPlugin, Outputs,
    ReducedOperation, Value,
};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Directed edge from a named output to a named input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub source_output: String,
    pub destination: NodeId,
    pub destination_input: String,
}

/// A graph of operations wired output-to-input.
///
/// Operations keep their registration order; it breaks ties everywhere an
/// order is otherwise free (auto-connect source choice, execution order of
/// independent nodes, order of terminal results).
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    pub name: String,
    operations: Vec<OperationPlugin>,
    links: Vec<Link>,
    terminals: HashSet<NodeId>,
    pub(crate) last_results: HashMap<NodeId, Outputs>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register an operation. Identity, not equality, decides duplicates:
    /// a clone of a registered operation is rejected, an equal but separately
    /// constructed one is accepted.
    pub fn add_operation(&mut self, operation: OperationPlugin) -> Result<NodeId, LinkError> {
        let id = operation.id();
        if self.contains(id) {
            return Err(LinkError::DuplicateOperation(id));
        }
        tracing::debug!("Adding operation \"{}\" ({})", operation.name(), id);
        self.operations.push(operation);
        Ok(id)
    }

    /// Drop an operation together with every link touching it.
    pub fn remove_operation(&mut self, id: NodeId) -> Option<OperationPlugin> {
        let index = self.operations.iter().position(|op| op.id() == id)?;
        self.links
            .retain(|link| link.source != id && link.destination != id);
        self.terminals.remove(&id);
        self.last_results.remove(&id);
        Some(self.operations.remove(index))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.operations.iter().any(|op| op.id() == id)
    }

    pub fn operation(&self, id: NodeId) -> Option<&OperationPlugin> {
        self.operations.iter().find(|op| op.id() == id)
    }

    pub fn operation_mut(&mut self, id: NodeId) -> Option<&mut OperationPlugin> {
        self.operations.iter_mut().find(|op| op.id() == id)
    }

    /// First registered operation with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<&OperationPlugin> {
        self.operations.iter().find(|op| op.name() == name)
    }

    pub fn operations(&self) -> &[OperationPlugin] {
        &self.operations
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn links_into(&self, destination: NodeId) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .filter(move |link| link.destination == destination)
    }

    pub fn links_from(&self, source: NodeId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |link| link.source == source)
    }

    pub(crate) fn incoming(&self, destination: NodeId, input: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|link| link.destination == destination && link.destination_input == input)
    }

    /// Link `source_output` of `source` into `destination_input` of
    /// `destination`. An input accepts one link; a second is rejected.
    pub fn add_link(
        &mut self,
        source: NodeId,
        destination: NodeId,
        source_output: impl Into<String>,
        destination_input: impl Into<String>,
    ) -> Result<(), LinkError> {
        let source_output = source_output.into();
        let destination_input = destination_input.into();

        let source_op = self.operation(source).ok_or(LinkError::NodeNotFound(source))?;
        let destination_op = self
            .operation(destination)
            .ok_or(LinkError::NodeNotFound(destination))?;

        if !source_op.has_output(&source_output) {
            return Err(LinkError::UnknownOutput {
                operation: source_op.name().to_string(),
                output: source_output,
            });
        }
        if !destination_op.has_input(&destination_input) {
            return Err(LinkError::UnknownInput {
                operation: destination_op.name().to_string(),
                input: destination_input,
            });
        }
        if self.incoming(destination, &destination_input).is_some() {
            return Err(LinkError::InputAlreadyLinked {
                operation: destination_op.name().to_string(),
                input: destination_input,
            });
        }

        tracing::debug!(
            "Linking {}.{} -> {}.{}",
            source_op.name(),
            source_output,
            destination_op.name(),
            destination_input
        );
        self.links.push(Link {
            source,
            source_output,
            destination,
            destination_input,
        });
        Ok(())
    }

    pub fn remove_link(&mut self, destination: NodeId, destination_input: &str) -> Option<Link> {
        let index = self.links.iter().position(|link| {
            link.destination == destination && link.destination_input == destination_input
        })?;
        Some(self.links.remove(index))
    }

    pub fn clear_links(&mut self) {
        self.links.clear();
    }

    /// Link every unlinked input to a same-named output of another operation.
    ///
    /// Destinations are visited in registration order. When several
    /// operations offer a matching output, the first registered one wins.
    /// Returns the number of links created.
    pub fn auto_connect_all(&mut self) -> usize {
        let mut created = Vec::new();

        for destination in &self.operations {
            for input in destination.input_names() {
                if self.incoming(destination.id(), input).is_some() {
                    continue;
                }
                let source = self
                    .operations
                    .iter()
                    .filter(|source| source.id() != destination.id())
                    .find(|source| source.has_output(input));

                if let Some(source) = source {
                    tracing::debug!(
                        "Auto-connecting {}.{} -> {}.{}",
                        source.name(),
                        input,
                        destination.name(),
                        input
                    );
                    created.push(Link {
                        source: source.id(),
                        source_output: input.clone(),
                        destination: destination.id(),
                        destination_input: input.clone(),
                    });
                }
            }
        }

        let count = created.len();
        self.links.extend(created);
        tracing::info!("Auto-connect created {} link(s) in \"{}\"", count, self.name);
        count
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<(), LinkError> {
        self.operation_mut(id)
            .ok_or(LinkError::NodeNotFound(id))?
            .set_disabled(disabled);
        Ok(())
    }

    /// Force an operation's outputs into the final results even when it
    /// feeds other operations.
    pub fn set_terminal(&mut self, id: NodeId, terminal: bool) -> Result<(), LinkError> {
        if !self.contains(id) {
            return Err(LinkError::NodeNotFound(id));
        }
        if terminal {
            self.terminals.insert(id);
        } else {
            self.terminals.remove(&id);
        }
        Ok(())
    }

    pub fn set_filled_value(
        &mut self,
        id: NodeId,
        input: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), FlowError> {
        self.operation_mut(id)
            .ok_or(LinkError::NodeNotFound(id))?
            .set_filled_value(input, value)?;
        Ok(())
    }

    fn is_enabled(&self, id: NodeId) -> bool {
        self.operation(id).map_or(false, |op| !op.is_disabled())
    }

    /// Enabled operations that are explicitly terminal or feed no enabled
    /// operation, in registration order.
    pub fn terminal_nodes(&self) -> Vec<NodeId> {
        self.operations
            .iter()
            .filter(|op| !op.is_disabled())
            .filter(|op| {
                self.terminals.contains(&op.id())
                    || !self
                        .links_from(op.id())
                        .any(|link| self.is_enabled(link.destination))
            })
            .map(OperationPlugin::id)
            .collect()
    }

    fn build_graph(&self) -> DiGraph<NodeId, ()> {
        let mut graph = DiGraph::new();
        let mut node_to_index = HashMap::new();

        for operation in &self.operations {
            let idx = graph.add_node(operation.id());
            node_to_index.insert(operation.id(), idx);
        }
        for link in &self.links {
            if let (Some(from), Some(to)) = (
                node_to_index.get(&link.source),
                node_to_index.get(&link.destination),
            ) {
                graph.add_edge(*from, *to, ());
            }
        }
        graph
    }

    /// Check that the links form a DAG. Disabled operations count: a cycle
    /// through a disabled operation is still a cycle.
    pub fn validate(&self) -> Result<(), ExecutionError> {
        let graph = self.build_graph();
        if toposort(&graph, None).is_ok() {
            return Ok(());
        }

        let mut members: Vec<NodeIndex> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .flatten()
            .collect();
        members.sort();

        let nodes = members
            .into_iter()
            .filter_map(|idx| self.operation(graph[idx]))
            .map(|op| op.name().to_string())
            .collect();
        Err(ExecutionError::Cycle { nodes })
    }

    /// The order a one-at-a-time executor runs enabled operations in.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, ExecutionError> {
        self.validate()?;

        let mut completed = HashSet::new();
        let mut order = Vec::new();
        while let Some(next) = self.ready_nodes(&completed).into_iter().next() {
            completed.insert(next);
            order.push(next);
        }
        Ok(order)
    }

    /// Enabled operations not in `done` whose enabled producers are all in
    /// `done`, in registration order.
    pub(crate) fn ready_nodes(&self, done: &HashSet<NodeId>) -> Vec<NodeId> {
        self.operations
            .iter()
            .filter(|op| !op.is_disabled() && !done.contains(&op.id()))
            .filter(|op| {
                self.links_into(op.id())
                    .filter(|link| self.is_enabled(link.source))
                    .all(|link| done.contains(&link.source))
            })
            .map(OperationPlugin::id)
            .collect()
    }

    /// Outputs of every operation that completed during the last run,
    /// including a run that failed part way.
    pub fn last_results(&self) -> &HashMap<NodeId, Outputs> {
        &self.last_results
    }

    /// Describe the wiring in a serialisable form.
    pub fn to_spec(&self) -> Result<WorkflowSpec, OperationError> {
        let index: HashMap<NodeId, usize> = self
            .operations
            .iter()
            .enumerate()
            .map(|(i, op)| (op.id(), i))
            .collect();

        let nodes = self
            .operations
            .iter()
            .map(|op| {
                Ok(NodeEntry {
                    operation: op.reduce()?,
                    disabled: op.is_disabled(),
                    terminal: self.terminals.contains(&op.id()),
                })
            })
            .collect::<Result<Vec<_>, OperationError>>()?;

        let links = self
            .links
            .iter()
            .map(|link| LinkSpec {
                source: index[&link.source],
                source_output: link.source_output.clone(),
                destination: index[&link.destination],
                destination_input: link.destination_input.clone(),
            })
            .collect();

        Ok(WorkflowSpec {
            name: self.name.clone(),
            nodes,
            links,
        })
    }

    /// Rebuild a workflow from `spec`, resolving each reduced operation with
    /// `restore`.
    pub fn from_spec<F>(spec: WorkflowSpec, mut restore: F) -> Result<Self, FlowError>
    where
        F: FnMut(ReducedOperation) -> Result<OperationPlugin, OperationError>,
    {
        let mut workflow = Workflow::new(spec.name);
        let mut ids = Vec::with_capacity(spec.nodes.len());

        for entry in spec.nodes {
            let mut operation = restore(entry.operation)?;
            operation.set_disabled(entry.disabled);
            let id = workflow.add_operation(operation)?;
            if entry.terminal {
                workflow.set_terminal(id, true)?;
            }
            ids.push(id);
        }

        for link in spec.links {
            let len = ids.len();
            let source = *ids.get(link.source).ok_or(LinkError::InvalidIndex {
                index: link.source,
                len,
            })?;
            let destination = *ids.get(link.destination).ok_or(LinkError::InvalidIndex {
                index: link.destination,
                len,
            })?;
            workflow.add_link(source, destination, link.source_output, link.destination_input)?;
        }

        Ok(workflow)
    }
}

/// Serialisable wiring of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub operation: ReducedOperation,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub terminal: bool,
}

/// A link between nodes addressed by their position in `WorkflowSpec::nodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub source: usize,
    pub source_output: String,
    pub destination: usize,
    pub destination_input: String,
}
