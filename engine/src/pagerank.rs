//! PageRank over the corpus link graph, by fixed-count power iteration.

use std::collections::HashMap;

/// URL -> outbound link targets, as recorded in the corpus. Targets may name
/// URLs that are not themselves keys; those edges are dropped.
pub type LinkGraph = HashMap<String, Vec<String>>;

/// URL -> rank. Over a non-empty graph the values form a probability
/// distribution: non-negative, summing to 1 up to float error.
pub type PageRankScores = HashMap<String, f64>;

#[derive(Debug, Clone, Copy)]
pub struct PageRankConfig {
    pub iterations: u32,
    pub damping: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self { iterations: 20, damping: 0.85 }
    }
}

/// Run power iteration over `graph` and return the final scores.
///
/// Every key of the graph is a node. Ranks start uniform; each round a node
/// sends `damping * rank / out_degree` to each distinct target and everyone
/// receives the `(1 - damping) / n` teleport share. Nodes without usable
/// out-edges spread their damped rank across all nodes, so no mass leaks.
pub fn compute(graph: &LinkGraph, config: &PageRankConfig) -> PageRankScores {
    let urls: Vec<&String> = graph.keys().collect();
    let n = urls.len();
    if n == 0 {
        return PageRankScores::new();
    }

    let index_of: HashMap<&str, usize> =
        urls.iter().enumerate().map(|(i, url)| (url.as_str(), i)).collect();

    // Duplicate links collapse to one edge; links to URLs outside the graph
    // are dropped here rather than treated as dangling weight.
    let out_edges: Vec<Vec<usize>> = urls
        .iter()
        .map(|url| {
            let mut targets: Vec<usize> = graph[url.as_str()]
                .iter()
                .filter_map(|target| index_of.get(target.as_str()).copied())
                .collect();
            targets.sort_unstable();
            targets.dedup();
            targets
        })
        .collect();

    let n_f = n as f64;
    let base = (1.0 - config.damping) / n_f;
    let mut scores = vec![1.0 / n_f; n];

    for iteration in 0..config.iterations {
        let mut next = vec![base; n];
        let mut dangling_mass = 0.0;

        for (u, targets) in out_edges.iter().enumerate() {
            if targets.is_empty() {
                dangling_mass += scores[u];
                continue;
            }
            let share = config.damping * scores[u] / targets.len() as f64;
            for &v in targets {
                next[v] += share;
            }
        }

        // Dangling rank teleports uniformly, keeping the total at 1.
        let teleport = config.damping * dangling_mass / n_f;
        for score in &mut next {
            *score += teleport;
        }

        scores = next;
        if (iteration + 1) % 5 == 0 {
            tracing::debug!(iteration = iteration + 1, "pagerank iteration complete");
        }
    }

    tracing::debug!(nodes = n, iterations = config.iterations, "pagerank complete");
    urls.into_iter().cloned().zip(scores).collect()
}
