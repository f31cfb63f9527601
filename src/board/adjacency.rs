//! Province graph: the static map and its adjacency edges.
//!
//! The graph is loaded once from JSON reference data (a province list and an
//! adjacency object keyed by province id) and never mutated afterwards.
//! Neighbor lists keep the order declared in the data file; pathfinding
//! tie-breaks depend on it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::province::{Province, ProvinceId};

/// Province list shipped with the crate.
pub const BUNDLED_PROVINCES: &str = include_str!("../../data/provinces.json");

/// Adjacency table shipped with the crate.
pub const BUNDLED_ADJACENCY: &str = include_str!("../../data/adjacency.json");

/// Errors that can occur while loading map reference data.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to read map file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid province list: {0}")]
    InvalidProvinces(#[source] serde_json::Error),

    #[error("invalid adjacency table: {0}")]
    InvalidAdjacency(#[source] serde_json::Error),

    #[error("duplicate province '{0}'")]
    DuplicateProvince(String),

    #[error("adjacency entry for unknown province '{0}'")]
    UnknownSource(String),

    #[error("province '{from}' lists unknown neighbor '{to}'")]
    UnknownNeighbor { from: String, to: String },
}

/// The immutable map: provinces in declared order plus their neighbor lists.
#[derive(Debug, Clone, Default)]
pub struct ProvinceGraph {
    provinces: Vec<Province>,
    index: HashMap<ProvinceId, usize>,
    neighbors: HashMap<ProvinceId, Vec<ProvinceId>>,
}

impl ProvinceGraph {
    /// Builds a graph from already-parsed parts, validating every edge.
    pub fn new(
        provinces: Vec<Province>,
        adjacency: HashMap<ProvinceId, Vec<ProvinceId>>,
    ) -> Result<Self, MapError> {
        let mut index = HashMap::with_capacity(provinces.len());
        let mut provinces = provinces;
        for (i, p) in provinces.iter_mut().enumerate() {
            if p.name.is_empty() {
                p.name = p.id.to_string();
            }
            if index.insert(p.id.clone(), i).is_some() {
                return Err(MapError::DuplicateProvince(p.id.to_string()));
            }
        }

        for (from, tos) in &adjacency {
            if !index.contains_key(from) {
                return Err(MapError::UnknownSource(from.to_string()));
            }
            if let Some(to) = tos.iter().find(|t| !index.contains_key(*t)) {
                return Err(MapError::UnknownNeighbor {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }

        Ok(ProvinceGraph {
            provinces,
            index,
            neighbors: adjacency,
        })
    }

    /// Parses a province list (`[{id, type, name}]`) and an adjacency object
    /// (`{id: [neighbor, ...]}`).
    pub fn from_json(provinces_json: &str, adjacency_json: &str) -> Result<Self, MapError> {
        let provinces: Vec<Province> =
            serde_json::from_str(provinces_json).map_err(MapError::InvalidProvinces)?;
        let adjacency: HashMap<ProvinceId, Vec<ProvinceId>> =
            serde_json::from_str(adjacency_json).map_err(MapError::InvalidAdjacency)?;
        Self::new(provinces, adjacency)
    }

    /// Reads both reference files from disk.
    pub fn load(provinces_path: &Path, adjacency_path: &Path) -> Result<Self, MapError> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| MapError::Io {
                path: path.display().to_string(),
                source,
            })
        };
        Self::from_json(&read(provinces_path)?, &read(adjacency_path)?)
    }

    /// The map shipped in `data/`.
    pub fn bundled() -> Result<Self, MapError> {
        Self::from_json(BUNDLED_PROVINCES, BUNDLED_ADJACENCY)
    }

    /// Neighbors of `id` in declared order; empty for unknown ids.
    pub fn adjacency(&self, id: &str) -> &[ProvinceId] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every province in declared order.
    pub fn all_provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn province(&self, id: &str) -> Option<&Province> {
        self.index.get(id).map(|&i| &self.provinces[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_adjacent(&self, from: &str, to: &str) -> bool {
        self.adjacency(from).iter().any(|p| p == to)
    }

    pub fn len(&self) -> usize {
        self.provinces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::province::ProvinceType;
    use super::*;

    fn line_graph() -> ProvinceGraph {
        ProvinceGraph::from_json(
            r#"[{"id":"a"},{"id":"b","type":"city"},{"id":"c"}]"#,
            r#"{"a":["b"],"b":["a","c"],"c":["b"]}"#,
        )
        .unwrap()
    }

    #[test]
    fn adjacency_keeps_declared_order() {
        let g = line_graph();
        assert_eq!(g.adjacency("b"), &[ProvinceId::from("a"), ProvinceId::from("c")]);
    }

    #[test]
    fn unknown_id_has_no_neighbors() {
        let g = line_graph();
        assert!(g.adjacency("zzz").is_empty());
        assert!(g.province("zzz").is_none());
    }

    #[test]
    fn names_default_to_ids() {
        let g = line_graph();
        assert_eq!(g.province("a").unwrap().name, "a");
        assert_eq!(g.province("b").unwrap().province_type, ProvinceType::City);
    }

    #[test]
    fn rejects_unknown_neighbor() {
        let err = ProvinceGraph::from_json(r#"[{"id":"a"}]"#, r#"{"a":["b"]}"#).unwrap_err();
        assert!(matches!(err, MapError::UnknownNeighbor { .. }));
    }

    #[test]
    fn rejects_duplicate_province() {
        let err =
            ProvinceGraph::from_json(r#"[{"id":"a"},{"id":"a"}]"#, r#"{}"#).unwrap_err();
        assert!(matches!(err, MapError::DuplicateProvince(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = ProvinceGraph::from_json("not json", "{}").unwrap_err();
        assert!(matches!(err, MapError::InvalidProvinces(_)));
    }

    #[test]
    fn bundled_map_loads() {
        let g = ProvinceGraph::bundled().unwrap();
        assert_eq!(g.len(), 15);
        assert!(g.is_adjacent("harbor", "millbrook"));
        assert!(!g.is_adjacent("harbor", "emberlake"));
    }

    #[test]
    fn bundled_map_is_symmetric() {
        let g = ProvinceGraph::bundled().unwrap();
        for p in g.all_provinces() {
            for n in g.adjacency(p.id.as_str()) {
                assert!(
                    g.is_adjacent(n.as_str(), p.id.as_str()),
                    "missing reverse edge {} -> {}",
                    n,
                    p.id
                );
            }
        }
    }

    #[test]
    fn bundled_map_has_no_self_edges() {
        let g = ProvinceGraph::bundled().unwrap();
        for p in g.all_provinces() {
            assert!(!g.is_adjacent(p.id.as_str(), p.id.as_str()));
        }
    }
}
