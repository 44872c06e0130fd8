//! Preferential-attachment network topology.

use std::collections::VecDeque;

use crate::error::ModelError;
use crate::rng::Rng64;
use crate::ActorId;

/// Undirected organization network, one adjacency list per actor.
#[derive(Debug, Clone)]
pub struct Topology {
    adjacency: Vec<Vec<ActorId>>,
}

impl Topology {
    /// Barabási–Albert growth: `num_new_edges` seed nodes, then each new
    /// node attaches to that many distinct existing nodes sampled from a
    /// degree-weighted endpoint pool. The result is connected.
    pub fn preferential_attachment(
        num_nodes: usize,
        num_new_edges: usize,
        rng: &mut Rng64,
    ) -> Result<Self, ModelError> {
        if num_nodes < 1 {
            return Err(ModelError::InvalidParameter(format!(
                "num_nodes must be at least 1, got {num_nodes}"
            )));
        }
        if num_new_edges < 1 || num_new_edges >= num_nodes {
            return Err(ModelError::InvalidParameter(format!(
                "num_new_edges must satisfy 1 <= m < num_nodes, got m={num_new_edges} n={num_nodes}"
            )));
        }

        let mut adjacency = vec![Vec::new(); num_nodes];
        // Every edge contributes both endpoints, so drawing uniformly from
        // the pool is degree-proportional attachment.
        let mut endpoint_pool: Vec<ActorId> = Vec::new();
        let mut targets: Vec<ActorId> = (0..num_new_edges).collect();

        for source in num_new_edges..num_nodes {
            for &target in &targets {
                adjacency[source].push(target);
                adjacency[target].push(source);
                endpoint_pool.push(source);
                endpoint_pool.push(target);
            }
            if source + 1 < num_nodes {
                targets = distinct_endpoints(&endpoint_pool, num_new_edges, rng);
            }
        }

        Ok(Self { adjacency })
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn neighbors(&self, id: ActorId) -> &[ActorId] {
        &self.adjacency[id]
    }

    /// BFS hop count between two nodes; `None` when unreachable.
    pub fn shortest_path_len(&self, from: ActorId, to: ActorId) -> Option<u64> {
        if from == to {
            return Some(0);
        }

        let mut distance = vec![None::<u64>; self.adjacency.len()];
        let mut queue = VecDeque::new();
        distance[from] = Some(0);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            let hops = distance[current]?;
            for &neighbor in &self.adjacency[current] {
                if distance[neighbor].is_some() {
                    continue;
                }
                if neighbor == to {
                    return Some(hops + 1);
                }
                distance[neighbor] = Some(hops + 1);
                queue.push_back(neighbor);
            }
        }

        None
    }
}

/// Sample `count` distinct node ids from the (duplicate-heavy) endpoint pool.
fn distinct_endpoints(pool: &[ActorId], count: usize, rng: &mut Rng64) -> Vec<ActorId> {
    let mut picked: Vec<ActorId> = Vec::with_capacity(count);
    while picked.len() < count {
        let candidate = pool[rng.index(pool.len())];
        if !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_parameters() {
        let mut rng = Rng64::new(1);
        assert!(matches!(
            Topology::preferential_attachment(0, 1, &mut rng),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            Topology::preferential_attachment(5, 5, &mut rng),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            Topology::preferential_attachment(5, 0, &mut rng),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn network_is_connected() {
        let mut rng = Rng64::new(99);
        let topology = Topology::preferential_attachment(30, 2, &mut rng).expect("valid");
        for node in 0..topology.len() {
            assert!(
                topology.shortest_path_len(0, node).is_some(),
                "node {node} unreachable"
            );
        }
    }

    #[test]
    fn attached_nodes_have_at_least_m_neighbors() {
        let mut rng = Rng64::new(5);
        let topology = Topology::preferential_attachment(25, 3, &mut rng).expect("valid");
        for node in 3..topology.len() {
            assert!(topology.neighbors(node).len() >= 3);
        }
    }

    #[test]
    fn same_seed_builds_same_network() {
        let mut rng_a = Rng64::new(1234);
        let mut rng_b = Rng64::new(1234);
        let a = Topology::preferential_attachment(20, 2, &mut rng_a).expect("valid");
        let b = Topology::preferential_attachment(20, 2, &mut rng_b).expect("valid");
        for node in 0..a.len() {
            assert_eq!(a.neighbors(node), b.neighbors(node));
        }
    }

    #[test]
    fn edges_are_undirected() {
        let mut rng = Rng64::new(8);
        let topology = Topology::preferential_attachment(15, 2, &mut rng).expect("valid");
        for node in 0..topology.len() {
            for &neighbor in topology.neighbors(node) {
                assert!(topology.neighbors(neighbor).contains(&node));
            }
        }
    }

    #[test]
    fn shortest_path_to_self_is_zero() {
        let mut rng = Rng64::new(8);
        let topology = Topology::preferential_attachment(6, 1, &mut rng).expect("valid");
        assert_eq!(topology.shortest_path_len(3, 3), Some(0));
    }
}
