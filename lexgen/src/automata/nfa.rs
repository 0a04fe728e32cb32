//! NFA arena: node/edge construction, compaction and epsilon closure.
//!
//! Nodes are addressed by dense index so fragments can point at siblings and
//! closures can add back-edges without shared ownership. Parsing may leave
//! nodes that no path from the start reaches; `compact` drops them and
//! renumbers the rest in depth-first order so that the start node is 0.

use super::{Edge, EdgeKind, Nfa, NfaFragment, NfaNode, NodeId, RuneClass};

impl Nfa {
    /// Create an empty arena. `start` is fixed later by the parser.
    pub fn new() -> Self {
        Nfa { nodes: Vec::new(), start: 0 }
    }

    /// Add a new non-accepting node and return its ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(NfaNode::default());
        id
    }

    /// Add an edge from `from` to `to`.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) {
        self.nodes[from as usize].edges.push(Edge { kind, target: to });
    }

    /// Add an epsilon edge from `from` to `to`.
    pub fn add_epsilon(&mut self, from: NodeId, to: NodeId) {
        self.add_edge(from, to, EdgeKind::Epsilon);
    }

    /// A two-node fragment joined by one consuming edge.
    pub fn single_edge(&mut self, kind: EdgeKind) -> NfaFragment {
        let start = self.add_node();
        let end = self.add_node();
        self.add_edge(start, end, kind);
        NfaFragment { start, end }
    }

    /// A fragment that matches only the empty string.
    pub fn empty(&mut self) -> NfaFragment {
        let node = self.add_node();
        NfaFragment { start: node, end: node }
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Keep only the nodes reachable from `start`, renumbered in depth-first
    /// visiting order (so `start` becomes node 0).
    pub fn compact(&self, start: NodeId) -> Nfa {
        let mut new_index: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut order: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = vec![start];

        while let Some(node) = stack.pop() {
            if new_index[node as usize].is_some() {
                continue;
            }
            new_index[node as usize] = Some(order.len() as NodeId);
            order.push(node);
            // Reverse so that the first edge is visited first.
            for edge in self.nodes[node as usize].edges.iter().rev() {
                if new_index[edge.target as usize].is_none() {
                    stack.push(edge.target);
                }
            }
        }

        let nodes = order
            .iter()
            .map(|&old| {
                let node = &self.nodes[old as usize];
                NfaNode {
                    edges: node
                        .edges
                        .iter()
                        .map(|edge| Edge {
                            kind: edge.kind.clone(),
                            target: new_index[edge.target as usize]
                                .expect("edge target reachable from its source"),
                        })
                        .collect(),
                    accept: node.accept,
                }
            })
            .collect();

        Nfa { nodes, start: 0 }
    }

    /// Every code point the rule mentions explicitly: literal runes and class
    /// intervals. Wildcard edges mention nothing.
    pub fn mentioned_intervals(&self) -> Vec<(u32, u32)> {
        let mut intervals = Vec::new();
        for node in &self.nodes {
            for edge in &node.edges {
                match &edge.kind {
                    EdgeKind::Rune(r) => intervals.push((*r as u32, *r as u32)),
                    EdgeKind::Class(RuneClass { ranges, .. }) => {
                        intervals.extend(ranges.iter().map(|&(lo, hi)| (lo as u32, hi as u32)));
                    },
                    EdgeKind::Epsilon | EdgeKind::Wild => {},
                }
            }
        }
        intervals
    }

    /// Reference matcher: simulate the NFA directly over `input`.
    ///
    /// Used to cross-check determinization; scanning never calls it.
    pub fn matches(&self, input: &str) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let mut current = epsilon_closure(self, &[self.start]);
        for c in input.chars() {
            let code = c as u32;
            let stepped: Vec<NodeId> = current
                .iter()
                .flat_map(|&n| self.nodes[n as usize].edges.iter())
                .filter(|edge| edge.kind.matches(code))
                .map(|edge| edge.target)
                .collect();
            if stepped.is_empty() {
                return false;
            }
            current = epsilon_closure(self, &stepped);
        }
        current.iter().any(|&n| self.nodes[n as usize].accept)
    }
}

/// Compute the epsilon-closure of a set of NFA nodes.
///
/// Returns the sorted, deduplicated set of nodes reachable from `nodes`
/// through epsilon edges only (including `nodes` themselves).
pub fn epsilon_closure(nfa: &Nfa, nodes: &[NodeId]) -> Vec<NodeId> {
    let mut closure: Vec<NodeId> = Vec::with_capacity(nodes.len() * 2);
    let mut stack: Vec<NodeId> = Vec::with_capacity(nodes.len());
    let mut visited = vec![false; nfa.nodes.len()];

    for &n in nodes {
        if !visited[n as usize] {
            visited[n as usize] = true;
            closure.push(n);
            stack.push(n);
        }
    }

    while let Some(node) = stack.pop() {
        for edge in &nfa.nodes[node as usize].edges {
            if edge.kind == EdgeKind::Epsilon && !visited[edge.target as usize] {
                visited[edge.target as usize] = true;
                closure.push(edge.target);
                stack.push(edge.target);
            }
        }
    }

    closure.sort_unstable();
    closure
}
