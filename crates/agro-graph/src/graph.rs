//! The built supply-chain graph.
//!
//! Edges are stored grouped by origin node (CSR layout, like the road
//! network) so a node's outgoing edges are one contiguous slice.  Within a
//! node, edges keep the order the builder created them in.

use std::collections::HashMap;

use crate::model::{Edge, Node, NodeRole};
use crate::{GraphError, GraphResult};

/// Immutable node/edge collection.
#[derive(Clone, Debug)]
pub struct SupplyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    /// Sorted by origin node index.
    edges: Vec<Edge>,
    /// Outgoing edges of node `i` are `edges[out_start[i] .. out_start[i+1]]`.
    out_start: Vec<usize>,
}

impl SupplyGraph {
    /// Assemble a graph, checking that node ids are unique and every edge
    /// endpoint exists.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> GraphResult<Self> {
        let index = index_nodes(&nodes)?;

        let mut keyed = Vec::with_capacity(edges.len());
        for edge in edges {
            let origin = *index
                .get(&edge.origin)
                .ok_or_else(|| GraphError::NodeNotFound(edge.origin.clone()))?;
            if !index.contains_key(&edge.destination) {
                return Err(GraphError::NodeNotFound(edge.destination.clone()));
            }
            keyed.push((origin, edge));
        }
        // Stable: per-node creation order survives.
        keyed.sort_by_key(|(origin, _)| *origin);

        let mut out_start = vec![0usize; nodes.len() + 1];
        for (origin, _) in &keyed {
            out_start[origin + 1] += 1;
        }
        for i in 1..out_start.len() {
            out_start[i] += out_start[i - 1];
        }

        let edges = keyed.into_iter().map(|(_, e)| e).collect();
        Ok(Self { nodes, index, edges, out_start })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> GraphResult<&Node> {
        self.index
            .get(id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// Outgoing edges of `id`, in creation order.
    pub fn outgoing(&self, id: &str) -> GraphResult<&[Edge]> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok(&self.edges[self.out_start[i]..self.out_start[i + 1]])
    }

    /// Nodes with `role`, in input order.
    pub fn nodes_with_role(&self, role: NodeRole) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(move |n| n.role() == role)
    }

    /// Number of edges whose route touched the road network.
    pub fn real_route_count(&self) -> usize {
        self.edges.iter().filter(|e| e.real_route).count()
    }
}

pub(crate) fn index_nodes(nodes: &[Node]) -> GraphResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if index.insert(node.id.clone(), i).is_some() {
            return Err(GraphError::DuplicateNode(node.id.clone()));
        }
    }
    Ok(index)
}
