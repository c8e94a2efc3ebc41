use serde::{Deserialize, Serialize};

use crate::value::{EntityTag, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Number,
    Direction,
    Entity,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Direction => "direction",
            Self::Entity => "entity",
        }
    }
}

/// Population selector for for-each enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Rival,
    Plant,
    Shark,
    Slime,
    Terrain,
    Any,
}

impl EntityKind {
    pub fn matches(self, tag: EntityTag) -> bool {
        match self {
            Self::Player => tag == EntityTag::Player,
            Self::Rival => tag == EntityTag::Rival,
            Self::Plant => tag == EntityTag::Plant,
            Self::Shark => tag == EntityTag::Shark,
            Self::Slime => tag == EntityTag::Slime,
            Self::Terrain => tag == EntityTag::Tile,
            Self::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainFeature {
    Air,
    Solid,
    Water,
    Magma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclaration {
    pub name: String,
    pub ty: ValueType,
    pub initial: Option<Value>,
}

impl VarDeclaration {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            initial: None,
        }
    }

    pub fn with_initial(name: impl Into<String>, ty: ValueType, initial: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            initial: Some(initial),
        }
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn kind_matching_covers_populations_and_wildcard() {
        assert!(EntityKind::Plant.matches(EntityTag::Plant));
        assert!(!EntityKind::Plant.matches(EntityTag::Shark));
        assert!(EntityKind::Terrain.matches(EntityTag::Tile));
        for tag in [
            EntityTag::Player,
            EntityTag::Rival,
            EntityTag::Plant,
            EntityTag::Shark,
            EntityTag::Slime,
            EntityTag::Tile,
        ] {
            assert!(EntityKind::Any.matches(tag));
        }
    }
}
