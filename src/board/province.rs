//! Province identifiers, terrain types and the derived controller view.
//!
//! Provinces are immutable reference data. Who controls a province is not
//! stored here: it is derived from the owning turn's controlled set (see
//! [`Turn::controller_of`](super::turn::Turn::controller_of)).

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::unit::Faction;

/// String key identifying a province on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvinceId(String);

impl ProvinceId {
    pub fn new(id: impl Into<String>) -> Self {
        ProvinceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProvinceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ProvinceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProvinceId {
    fn from(s: &str) -> Self {
        ProvinceId(s.to_string())
    }
}

impl From<String> for ProvinceId {
    fn from(s: String) -> Self {
        ProvinceId(s)
    }
}

impl PartialEq<str> for ProvinceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProvinceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Classifies a province by what it offers the side holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvinceType {
    #[default]
    Plain,
    /// Recruiting here yields infantry instead of armor.
    Barracks,
    /// Capturing a city pays the capture bonus.
    City,
}

impl ProvinceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProvinceType::Plain => "plain",
            ProvinceType::Barracks => "barracks",
            ProvinceType::City => "city",
        }
    }
}

/// A province as loaded from the reference map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub province_type: ProvinceType,
}

impl Province {
    pub fn new(id: impl Into<String>, province_type: ProvinceType) -> Self {
        let id = id.into();
        Province {
            name: id.clone(),
            id: ProvinceId(id),
            province_type,
        }
    }

    pub fn is_city(&self) -> bool {
        self.province_type == ProvinceType::City
    }
}

/// A province paired with its controller for one turn, as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvinceStatus {
    pub id: ProvinceId,
    pub name: String,
    #[serde(rename = "type")]
    pub province_type: ProvinceType,
    pub controller: Faction,
}
