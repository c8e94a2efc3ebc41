use serde::Serialize;

use crate::error::ScriptError;
use crate::types::{TerrainFeature, ValueType};
use crate::value::{Direction, EntityTag, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityProp {
    X,
    Y,
    Width,
    Height,
    HitPoints,
}

/// An immutable expression tree. The static type is fixed at construction
/// and never rechecked during evaluation; the only way to build an `Expr`
/// is through the validating constructors below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    ty: ValueType,
    kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Constant(Value),
    ActingEntity,
    Variable(String),
    Arithmetic {
        op: ArithmeticOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Sqrt(Box<Expr>),
    Random(Box<Expr>),
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Comparison {
        op: ComparisonOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Property {
        prop: EntityProp,
        target: Box<Expr>,
    },
    IsKind {
        tag: EntityTag,
        target: Box<Expr>,
    },
    TerrainIs {
        feature: TerrainFeature,
        target: Box<Expr>,
    },
    IsPassable(Box<Expr>),
    IsMoving {
        target: Box<Expr>,
        direction: Box<Expr>,
    },
    IsJumping(Box<Expr>),
    IsDucking(Box<Expr>),
    IsDead(Box<Expr>),
    TileAt {
        x: Box<Expr>,
        y: Box<Expr>,
    },
    SearchEntity {
        direction: Box<Expr>,
    },
}

fn expect_operand(op: &str, expr: Expr, expected: ValueType) -> Result<Box<Expr>, ScriptError> {
    if expr.ty == expected {
        Ok(Box::new(expr))
    } else {
        Err(ScriptError::new(
            "TYPE_OPERAND_MISMATCH",
            format!(
                "Operand of \"{}\" must be {}, found {}.",
                op,
                expected.name(),
                expr.ty.name()
            ),
        ))
    }
}

impl Expr {
    pub fn ty(&self) -> ValueType {
        self.ty
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn constant(value: Value) -> Self {
        Self {
            ty: value.value_type(),
            kind: ExprKind::Constant(value),
        }
    }

    pub fn number(value: f64) -> Self {
        Self::constant(Value::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::constant(Value::Bool(value))
    }

    pub fn direction(value: Direction) -> Self {
        Self::constant(Value::Direction(value))
    }

    pub fn null() -> Self {
        Self::constant(Value::Entity(None))
    }

    /// The entity the script is acting for.
    pub fn acting_entity() -> Self {
        Self {
            ty: ValueType::Entity,
            kind: ExprKind::ActingEntity,
        }
    }

    /// Read of a declared variable; `ty` is the declared type and is
    /// verified against the live binding at evaluation time.
    pub fn variable(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            ty,
            kind: ExprKind::Variable(name.into()),
        }
    }

    pub fn arithmetic(op: ArithmeticOp, lhs: Expr, rhs: Expr) -> Result<Self, ScriptError> {
        let lhs = expect_operand("arithmetic", lhs, ValueType::Number)?;
        let rhs = expect_operand("arithmetic", rhs, ValueType::Number)?;
        Ok(Self {
            ty: ValueType::Number,
            kind: ExprKind::Arithmetic { op, lhs, rhs },
        })
    }

    pub fn sqrt(operand: Expr) -> Result<Self, ScriptError> {
        let operand = expect_operand("sqrt", operand, ValueType::Number)?;
        Ok(Self {
            ty: ValueType::Number,
            kind: ExprKind::Sqrt(operand),
        })
    }

    /// Uniform number in `[0, bound)`, drawn from the script's seeded RNG.
    pub fn random(bound: Expr) -> Result<Self, ScriptError> {
        let bound = expect_operand("random", bound, ValueType::Number)?;
        Ok(Self {
            ty: ValueType::Number,
            kind: ExprKind::Random(bound),
        })
    }

    pub fn logical(op: LogicalOp, lhs: Expr, rhs: Expr) -> Result<Self, ScriptError> {
        let lhs = expect_operand("logical", lhs, ValueType::Bool)?;
        let rhs = expect_operand("logical", rhs, ValueType::Bool)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::Logical { op, lhs, rhs },
        })
    }

    pub fn not(operand: Expr) -> Result<Self, ScriptError> {
        let operand = expect_operand("not", operand, ValueType::Bool)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::Not(operand),
        })
    }

    /// Ordering comparisons require numbers on both sides; equality
    /// comparisons require both sides to share one type.
    pub fn comparison(op: ComparisonOp, lhs: Expr, rhs: Expr) -> Result<Self, ScriptError> {
        let (lhs, rhs) = match op {
            ComparisonOp::Eq | ComparisonOp::Ne => {
                if lhs.ty != rhs.ty {
                    return Err(ScriptError::new(
                        "TYPE_OPERAND_MISMATCH",
                        format!(
                            "Equality operands must share a type, found {} and {}.",
                            lhs.ty.name(),
                            rhs.ty.name()
                        ),
                    ));
                }
                (Box::new(lhs), Box::new(rhs))
            }
            _ => (
                expect_operand("comparison", lhs, ValueType::Number)?,
                expect_operand("comparison", rhs, ValueType::Number)?,
            ),
        };
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::Comparison { op, lhs, rhs },
        })
    }

    pub fn property(prop: EntityProp, target: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("property", target, ValueType::Entity)?;
        Ok(Self {
            ty: ValueType::Number,
            kind: ExprKind::Property { prop, target },
        })
    }

    pub fn is_kind(tag: EntityTag, target: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("is-kind", target, ValueType::Entity)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::IsKind { tag, target },
        })
    }

    pub fn terrain_is(feature: TerrainFeature, target: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("terrain-is", target, ValueType::Entity)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::TerrainIs { feature, target },
        })
    }

    pub fn is_passable(target: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("is-passable", target, ValueType::Entity)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::IsPassable(target),
        })
    }

    pub fn is_moving(target: Expr, direction: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("is-moving", target, ValueType::Entity)?;
        let direction = expect_operand("is-moving", direction, ValueType::Direction)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::IsMoving { target, direction },
        })
    }

    pub fn is_jumping(target: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("is-jumping", target, ValueType::Entity)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::IsJumping(target),
        })
    }

    pub fn is_ducking(target: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("is-ducking", target, ValueType::Entity)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::IsDucking(target),
        })
    }

    pub fn is_dead(target: Expr) -> Result<Self, ScriptError> {
        let target = expect_operand("is-dead", target, ValueType::Entity)?;
        Ok(Self {
            ty: ValueType::Bool,
            kind: ExprKind::IsDead(target),
        })
    }

    pub fn tile_at(x: Expr, y: Expr) -> Result<Self, ScriptError> {
        let x = expect_operand("tile-at", x, ValueType::Number)?;
        let y = expect_operand("tile-at", y, ValueType::Number)?;
        Ok(Self {
            ty: ValueType::Entity,
            kind: ExprKind::TileAt { x, y },
        })
    }

    /// Nearest entity from the acting entity in the given direction; a
    /// miss evaluates to null.
    pub fn search_entity(direction: Expr) -> Result<Self, ScriptError> {
        let direction = expect_operand("search", direction, ValueType::Direction)?;
        Ok(Self {
            ty: ValueType::Entity,
            kind: ExprKind::SearchEntity { direction },
        })
    }
}
