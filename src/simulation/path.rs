//! Cyclic waypoint path shared by all vehicles

use glam::Vec3;

use super::error::{SimError, SimResult};

/// An ordered, closed loop of points. The successor of the last node is the
/// first one. Immutable once built.
#[derive(Debug, Clone)]
pub struct WaypointPath {
    nodes: Vec<Vec3>,
}

impl WaypointPath {
    /// Build a path, rejecting loops with fewer than two nodes
    pub fn new(nodes: Vec<Vec3>) -> SimResult<Self> {
        if nodes.len() < 2 {
            return Err(SimError::PathTooShort { len: nodes.len() });
        }
        Ok(Self { nodes })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: construction guarantees at least two nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Vec3] {
        &self.nodes
    }

    /// Node position, with the index wrapped onto the loop
    pub fn node(&self, index: usize) -> Vec3 {
        self.nodes[index % self.nodes.len()]
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.nodes.len()
    }

    /// Predecessor on the loop; the predecessor of node 0 is the last node
    pub fn previous_index(&self, index: usize) -> usize {
        if index == 0 {
            self.nodes.len() - 1
        } else {
            index - 1
        }
    }

    pub fn closest_index(&self, position: Vec3) -> usize {
        let mut closest = 0;
        let mut closest_distance = f32::INFINITY;
        for (i, node) in self.nodes.iter().enumerate() {
            let distance = node.distance_squared(position);
            if distance < closest_distance {
                closest_distance = distance;
                closest = i;
            }
        }
        closest
    }

    /// The node after the one closest to `position`, which is where a vehicle
    /// dropped onto the loop should head first
    pub fn target_after_closest(&self, position: Vec3) -> usize {
        self.next_index(self.closest_index(position))
    }
}
