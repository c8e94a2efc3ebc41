use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Classification carried by every entity reference. Kind tests compare
/// these tags directly instead of inspecting the entity behind the
/// reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTag {
    Player,
    Rival,
    Plant,
    Shark,
    Slime,
    Tile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u32,
    pub tag: EntityTag,
}

impl EntityRef {
    pub fn new(id: u32, tag: EntityTag) -> Self {
        Self { id, tag }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Direction(Direction),
    /// Entity reference; `None` is the script-level null.
    Entity(Option<EntityRef>),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Number(_) => ValueType::Number,
            Self::Direction(_) => ValueType::Direction,
            Self::Entity(_) => ValueType::Entity,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_direction(&self) -> Option<Direction> {
        match self {
            Self::Direction(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<Option<EntityRef>> {
        match self {
            Self::Entity(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Number(value) => write!(f, "{}", value),
            Self::Direction(Direction::Up) => write!(f, "up"),
            Self::Direction(Direction::Down) => write!(f, "down"),
            Self::Direction(Direction::Left) => write!(f, "left"),
            Self::Direction(Direction::Right) => write!(f, "right"),
            Self::Entity(None) => write!(f, "null"),
            Self::Entity(Some(entity)) => write!(f, "{:?}#{}", entity.tag, entity.id),
        }
    }
}

pub fn default_value_for(ty: ValueType) -> Value {
    match ty {
        ValueType::Bool => Value::Bool(false),
        ValueType::Number => Value::Number(0.0),
        ValueType::Direction => Value::Direction(Direction::Left),
        ValueType::Entity => Value::Entity(None),
    }
}
