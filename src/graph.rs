//! Thresholded co-occurrence graph and its derived visual attributes.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::cooccurrence::PairCounts;

/// Weighted undirected word graph. Node weight is the lemma, edge weight the
/// number of sentences the two lemmas share.
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    graph: UnGraph<String, u32>,
    index: HashMap<String, NodeIndex>,
}

/// One edge of the network, as exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub weight: u32,
}

/// Sizes and widths handed to the renderer.
///
/// `node_sizes[i]` belongs to the i-th node of [`CooccurrenceGraph::nodes`],
/// `edge_widths[j]` to the j-th edge of [`CooccurrenceGraph::edges`].
#[derive(Debug, Clone, PartialEq)]
pub struct VisualAttributes {
    pub node_sizes: Vec<f64>,
    pub edge_widths: Vec<f64>,
}

/// Build the network from pair counts, keeping pairs seen in at least
/// `min_cooccurrence` sentences.
///
/// Returns `None` when no pair reaches the threshold.
///
/// # Example
/// ```
/// use cooccurrence_network::{TokenSet, build_graph, count_pairs};
/// let ab: TokenSet = ["a", "b"].iter().map(|s| s.to_string()).collect();
/// let counts = count_pairs(&[ab.clone(), ab.clone(), ab]);
/// let graph = build_graph(&counts, 3).unwrap();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.weight("b", "a"), Some(3));
/// assert!(build_graph(&counts, 4).is_none());
/// ```
pub fn build_graph(counts: &PairCounts, min_cooccurrence: u32) -> Option<CooccurrenceGraph> {
    let mut graph = CooccurrenceGraph::default();
    for (pair, count) in counts.iter() {
        if count >= min_cooccurrence {
            graph.add_edge(&pair.first, &pair.second, count);
        }
    }
    if graph.is_empty() { None } else { Some(graph) }
}

impl CooccurrenceGraph {
    pub(crate) fn node(&mut self, lemma: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(lemma) {
            return idx;
        }
        let idx = self.graph.add_node(lemma.to_string());
        self.index.insert(lemma.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, a: &str, b: &str, weight: u32) {
        if a == b {
            return;
        }
        let (ia, ib) = (self.node(a), self.node(b));
        self.graph.update_edge(ia, ib, weight);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, lemma: &str) -> bool {
        self.index.contains_key(lemma)
    }

    /// Edge weight between two words, in either order.
    pub fn weight(&self, a: &str, b: &str) -> Option<u32> {
        let (ia, ib) = (*self.index.get(a)?, *self.index.get(b)?);
        self.graph
            .find_edge(ia, ib)
            .and_then(|e| self.graph.edge_weight(e).copied())
    }

    /// Sum of the weights of all edges touching `lemma`.
    pub fn weighted_degree(&self, lemma: &str) -> Option<u32> {
        self.index.get(lemma).map(|&idx| self.degree_of(idx))
    }

    fn degree_of(&self, idx: NodeIndex) -> u32 {
        self.graph.edges(idx).map(|e| *e.weight()).sum()
    }

    /// Lemmas in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(|i| self.graph[i].as_str())
    }

    /// Edges in insertion order as `(source, target, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, u32)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
                *e.weight(),
            )
        })
    }

    /// Edge endpoints as node positions in [`Self::nodes`] order.
    pub fn edge_endpoints(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
    }

    pub fn edge_records(&self) -> Vec<EdgeRecord> {
        self.edges()
            .map(|(source, target, weight)| EdgeRecord {
                source: source.to_string(),
                target: target.to_string(),
                weight,
            })
            .collect()
    }

    /// Node size = weighted degree * `node_scale`, edge width = weight * `edge_scale`.
    pub fn visual_attributes(&self, node_scale: f64, edge_scale: f64) -> VisualAttributes {
        VisualAttributes {
            node_sizes: self
                .graph
                .node_indices()
                .map(|i| f64::from(self.degree_of(i)) * node_scale)
                .collect(),
            edge_widths: self
                .graph
                .edge_references()
                .map(|e| f64::from(*e.weight()) * edge_scale)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cooccurrence::{TokenSet, count_pairs};

    fn set(words: &[&str]) -> TokenSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn sample_counts() -> PairCounts {
        count_pairs(&[
            set(&["a", "b", "c"]),
            set(&["a", "b"]),
            set(&["a", "b", "d"]),
            set(&["c", "d"]),
            set(&["c", "d"]),
        ])
    }

    #[test]
    fn test_single_sentence_threshold_one() {
        let counts = count_pairs(&[set(&["a", "b", "c"])]);
        let graph = build_graph(&counts, 1).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.edges().all(|(_, _, w)| w == 1));
    }

    #[test]
    fn test_threshold_filters_edges_and_nodes() {
        let counts = sample_counts();
        // a-b: 3, c-d: 2, everything else 1
        let graph = build_graph(&counts, 2).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.weight("a", "b"), Some(3));
        assert_eq!(graph.weight("d", "c"), Some(2));
        assert_eq!(graph.weight("a", "c"), None);

        let graph = build_graph(&counts, 3).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert!(!graph.contains("c"));
        assert!(!graph.contains("d"));

        assert!(build_graph(&counts, 4).is_none());
    }

    #[test]
    fn test_raising_threshold_never_adds_nodes_or_edges() {
        let counts = sample_counts();
        let mut previous: Option<CooccurrenceGraph> = build_graph(&counts, 1);
        for threshold in 2..=5 {
            let current = build_graph(&counts, threshold);
            if let Some(cur) = &current {
                let prev = previous.as_ref().expect("lower threshold graph exists");
                assert!(cur.node_count() <= prev.node_count());
                assert!(cur.edge_count() <= prev.edge_count());
                assert!(cur.nodes().all(|n| prev.contains(n)));
                assert!(cur.edges().all(|(a, b, w)| prev.weight(a, b) == Some(w)));
            }
            previous = current;
        }
    }

    #[test]
    fn test_weighted_degree_and_visual_attributes() {
        let graph = build_graph(&sample_counts(), 1).unwrap();
        // a: a-b 3 + a-c 1 + a-d 1
        assert_eq!(graph.weighted_degree("a"), Some(5));
        assert_eq!(graph.weighted_degree("zzz"), None);

        let attrs = graph.visual_attributes(100.0, 0.5);
        assert_eq!(attrs.node_sizes.len(), graph.node_count());
        assert_eq!(attrs.edge_widths.len(), graph.edge_count());
        for (lemma, size) in graph.nodes().zip(&attrs.node_sizes) {
            let expected = f64::from(graph.weighted_degree(lemma).unwrap()) * 100.0;
            assert_eq!(*size, expected);
        }
        for ((_, _, w), width) in graph.edges().zip(&attrs.edge_widths) {
            assert_eq!(*width, f64::from(w) * 0.5);
        }
    }

    #[test]
    fn test_edge_records_and_endpoints_align() {
        let graph = build_graph(&sample_counts(), 2).unwrap();
        let nodes: Vec<&str> = graph.nodes().collect();
        let records = graph.edge_records();
        for (record, (s, t)) in records.iter().zip(graph.edge_endpoints()) {
            assert_eq!(record.source, nodes[s]);
            assert_eq!(record.target, nodes[t]);
        }
        assert_eq!(
            records[0],
            EdgeRecord {
                source: "a".into(),
                target: "b".into(),
                weight: 3
            }
        );
    }
}
