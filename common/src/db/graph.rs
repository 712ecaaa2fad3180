use crate::db::cost::Cost;
use crate::db::indices::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("edge {edge:?} has invalid cost {cost} (must be finite and non-negative)")]
    InvalidCost { edge: EdgeId, cost: String },
    #[error("edge {edge:?} references node {node} outside [0, {num_nodes})")]
    EdgeOutOfRange {
        edge: EdgeId,
        node: usize,
        num_nodes: usize,
    },
    #[error("terminal pair {pair:?} references node {node} outside [0, {num_nodes})")]
    PairOutOfRange {
        pair: PairId,
        node: usize,
        num_nodes: usize,
    },
    #[error("total edge cost overflows the cost type at edge {edge:?}")]
    CostOverflow { edge: EdgeId },
    #[error("grid of {cells} cells exceeds the 32-bit node space")]
    GridTooLarge { cells: usize },
    #[error("grid coordinate {0} is outside the routing grid")]
    CoordOutOfRange(String),
    #[error("terminal at {0} sits on an obstacle")]
    TerminalOnObstacle(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge<C> {
    pub u: NodeId,
    pub v: NodeId,
    pub cost: C,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerminalPair {
    pub s: NodeId,
    pub t: NodeId,
}

impl TerminalPair {
    pub fn is_trivial(&self) -> bool {
        self.s == self.t
    }
}

/// Immutable routing-resource graph with the terminal pairs to connect.
///
/// Edge ids follow insertion order and double as the deterministic
/// tie-break key for the engine.
#[derive(Clone, Debug)]
pub struct SteinerGraph<C> {
    num_nodes: usize,
    edges: Vec<Edge<C>>,
    pairs: Vec<TerminalPair>,
    adj_offsets: Vec<usize>,
    adj: Vec<(NodeId, EdgeId)>,
}

impl<C: Cost> SteinerGraph<C> {
    pub fn new(
        num_nodes: usize,
        edges: impl IntoIterator<Item = (usize, usize, C)>,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GraphError> {
        let mut builder = GraphBuilder::new(num_nodes);
        for (u, v, cost) in edges {
            builder.add_edge(u, v, cost);
        }
        for (s, t) in pairs {
            builder.add_pair(s, t);
        }
        builder.build()
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge<C>] {
        &self.edges
    }

    #[inline(always)]
    pub fn edge(&self, id: EdgeId) -> &Edge<C> {
        &self.edges[id.index()]
    }

    pub fn pairs(&self) -> &[TerminalPair] {
        &self.pairs
    }

    #[inline(always)]
    pub fn pair(&self, id: PairId) -> TerminalPair {
        self.pairs[id.index()]
    }

    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, EdgeId)> + '_ {
        let start = self.adj_offsets[node.index()];
        let end = self.adj_offsets[node.index() + 1];
        self.adj[start..end].iter().copied()
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adj_offsets[node.index() + 1] - self.adj_offsets[node.index()]
    }

    pub fn is_terminal(&self, node: NodeId) -> bool {
        self.pairs.iter().any(|p| p.s == node || p.t == node)
    }
}

#[derive(Debug)]
pub struct GraphBuilder<C> {
    num_nodes: usize,
    edges: Vec<(usize, usize, C)>,
    pairs: Vec<(usize, usize)>,
}

impl<C: Cost> GraphBuilder<C> {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            edges: Vec::new(),
            pairs: Vec::new(),
        }
    }

    pub fn add_edge(&mut self, u: usize, v: usize, cost: C) -> EdgeId {
        let id = EdgeId::new(self.edges.len());
        self.edges.push((u, v, cost));
        id
    }

    pub fn add_pair(&mut self, s: usize, t: usize) -> PairId {
        let id = PairId::new(self.pairs.len());
        self.pairs.push((s, t));
        id
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn build(self) -> Result<SteinerGraph<C>, GraphError> {
        let n = self.num_nodes;

        let mut edges = Vec::with_capacity(self.edges.len());
        // Every forest sums a subset of the edges.
        let mut total = C::zero();
        for (i, &(u, v, cost)) in self.edges.iter().enumerate() {
            let edge = EdgeId::new(i);
            if !cost.is_valid() {
                return Err(GraphError::InvalidCost {
                    edge,
                    cost: format!("{:?}", cost),
                });
            }
            total = total
                .checked_add(cost)
                .ok_or(GraphError::CostOverflow { edge })?;
            for node in [u, v] {
                if node >= n {
                    return Err(GraphError::EdgeOutOfRange {
                        edge,
                        node,
                        num_nodes: n,
                    });
                }
            }
            edges.push(Edge {
                u: NodeId::new(u),
                v: NodeId::new(v),
                cost,
            });
        }

        let mut pairs = Vec::with_capacity(self.pairs.len());
        for (i, &(s, t)) in self.pairs.iter().enumerate() {
            for node in [s, t] {
                if node >= n {
                    return Err(GraphError::PairOutOfRange {
                        pair: PairId::new(i),
                        node,
                        num_nodes: n,
                    });
                }
            }
            pairs.push(TerminalPair {
                s: NodeId::new(s),
                t: NodeId::new(t),
            });
        }

        let (adj_offsets, adj) = build_adjacency(n, &edges);

        Ok(SteinerGraph {
            num_nodes: n,
            edges,
            pairs,
            adj_offsets,
            adj,
        })
    }
}

// Counting sort into a flat list; neighbours of a node stay in edge order.
fn build_adjacency<C>(num_nodes: usize, edges: &[Edge<C>]) -> (Vec<usize>, Vec<(NodeId, EdgeId)>) {
    let mut offsets = vec![0usize; num_nodes + 1];
    for e in edges {
        offsets[e.u.index() + 1] += 1;
        if e.v != e.u {
            offsets[e.v.index() + 1] += 1;
        }
    }
    for i in 0..num_nodes {
        offsets[i + 1] += offsets[i];
    }

    let mut cursor = offsets.clone();
    let mut adj = vec![(NodeId(0), EdgeId(0)); offsets[num_nodes]];
    for (i, e) in edges.iter().enumerate() {
        let id = EdgeId::new(i);
        adj[cursor[e.u.index()]] = (e.v, id);
        cursor[e.u.index()] += 1;
        if e.v != e.u {
            adj[cursor[e.v.index()]] = (e.u, id);
            cursor[e.v.index()] += 1;
        }
    }

    (offsets, adj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_adjacency_in_edge_order() {
        let g = SteinerGraph::new(3, [(0, 1, 2u32), (1, 2, 3), (0, 2, 7)], [(0, 2)]).unwrap();
        assert_eq!(g.num_edges(), 3);
        let n0: Vec<_> = g.neighbors(NodeId(0)).collect();
        assert_eq!(n0, vec![(NodeId(1), EdgeId(0)), (NodeId(2), EdgeId(2))]);
        assert_eq!(g.degree(NodeId(1)), 2);
        assert!(g.is_terminal(NodeId(2)));
        assert!(!g.is_terminal(NodeId(1)));
    }

    #[test]
    fn self_loop_listed_once() {
        let g = SteinerGraph::new(2, [(1, 1, 1i64)], Vec::<(usize, usize)>::new()).unwrap();
        assert_eq!(g.degree(NodeId(1)), 1);
        assert_eq!(g.degree(NodeId(0)), 0);
    }

    #[test]
    fn rejects_negative_cost() {
        let err = SteinerGraph::new(2, [(0, 1, -1i32)], [(0, 1)]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidCost { edge: EdgeId(0), .. }));
    }

    #[test]
    fn rejects_nan_cost() {
        let err = SteinerGraph::new(2, [(0, 1, f64::NAN)], [(0, 1)]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidCost { .. }));
    }

    #[test]
    fn rejects_total_cost_overflow() {
        let err = SteinerGraph::new(3, [(0, 1, u64::MAX), (1, 2, 1)], [(0, 2)]).unwrap_err();
        assert_eq!(err, GraphError::CostOverflow { edge: EdgeId(1) });

        let ok = SteinerGraph::new(2, [(0, 1, u64::MAX)], [(0, 1)]);
        assert!(ok.is_ok());
    }

    #[test]
    fn rejects_out_of_range_references() {
        let err = SteinerGraph::new(2, [(0, 2, 1u32)], [(0, 1)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::EdgeOutOfRange {
                edge: EdgeId(0),
                node: 2,
                num_nodes: 2
            }
        );

        let err = SteinerGraph::new(2, [(0, 1, 1u32)], [(0, 1), (5, 0)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::PairOutOfRange {
                pair: PairId(1),
                node: 5,
                num_nodes: 2
            }
        );
    }
}
