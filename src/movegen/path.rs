//! Shortest-step pathfinding over the province graph.
//!
//! Breadth-first search by hop count. Ties between equally short routes go
//! to the neighbor declared first in the adjacency data.

use std::collections::{HashSet, VecDeque};

use crate::board::{ProvinceGraph, ProvinceId};

/// Returns the first province to enter on a shortest route from `start` to
/// `target`, never passing through a province in `blocked`.
///
/// `start` is always treated as visited. Every blocked province is
/// impassable, the target included, so an occupied target has no route.
/// Returns `start` when `start == target` and `None` when no route exists.
pub fn next_step(
    graph: &ProvinceGraph,
    start: &str,
    target: &str,
    blocked: &HashSet<ProvinceId>,
) -> Option<ProvinceId> {
    if start == target {
        return Some(ProvinceId::from(start));
    }

    let mut visited: HashSet<&str> = blocked.iter().map(ProvinceId::as_str).collect();
    visited.insert(start);

    // Each entry carries the first step taken from `start` to reach it.
    let mut queue: VecDeque<(&str, Option<&ProvinceId>)> = VecDeque::new();
    queue.push_back((start, None));

    while let Some((current, first)) = queue.pop_front() {
        for neighbor in graph.adjacency(current) {
            if !visited.insert(neighbor.as_str()) {
                continue;
            }
            let step = first.unwrap_or(neighbor);
            if neighbor == target {
                return Some(step.clone());
            }
            queue.push_back((neighbor.as_str(), Some(step)));
        }
    }

    None
}

/// Hop count of the route `next_step` would follow, if one exists.
pub fn distance(
    graph: &ProvinceGraph,
    start: &str,
    target: &str,
    blocked: &HashSet<ProvinceId>,
) -> Option<usize> {
    if start == target {
        return Some(0);
    }

    let mut visited: HashSet<&str> = blocked.iter().map(ProvinceId::as_str).collect();
    visited.insert(start);
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    queue.push_back((start, 0));

    while let Some((current, hops)) = queue.pop_front() {
        for neighbor in graph.adjacency(current) {
            if !visited.insert(neighbor.as_str()) {
                continue;
            }
            if neighbor == target {
                return Some(hops + 1);
            }
            queue.push_back((neighbor.as_str(), hops + 1));
        }
    }

    None
}
