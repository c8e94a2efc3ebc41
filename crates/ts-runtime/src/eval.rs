use std::cell::Cell;
use std::cmp::Ordering;

use ts_core::{
    ArithmeticOp, ComparisonOp, EntityProp, EntityRef, Expr, ExprKind, LogicalOp, ScriptError,
    Value,
};

use crate::env::Environment;
use crate::rng::next_random_unit;
use crate::world::World;

/// Per-call bundle handed through evaluation and execution: the acting
/// entity, the script's environment, the world collaborator, the RNG
/// state, and the current time slice. Never persisted across calls.
pub(crate) struct ExecContext<'a> {
    pub actor: EntityRef,
    pub env: &'a mut Environment,
    pub world: &'a mut dyn World,
    pub rng: &'a Cell<u32>,
    pub slice: f64,
    /// Whether the tick budget still covers one full slice.
    pub slice_available: bool,
    pub slice_used: bool,
    /// Set when a time-absorbing statement needed a slice the budget
    /// could not cover; the call ends and resumes next tick.
    pub blocked: bool,
}

fn invariant_error(expected: &str, found: &Value) -> ScriptError {
    ScriptError::new(
        "EVAL_TYPE_INVARIANT",
        format!(
            "Expression typing promised {}, found {}.",
            expected,
            found.type_name()
        ),
    )
}

fn unknown_entity(entity: EntityRef) -> ScriptError {
    ScriptError::new(
        "EVAL_UNKNOWN_ENTITY",
        format!("Entity {:?}#{} is not known to the world.", entity.tag, entity.id),
    )
}

pub(crate) fn eval_number(expr: &Expr, ctx: &ExecContext) -> Result<f64, ScriptError> {
    let value = evaluate(expr, ctx)?;
    value
        .as_number()
        .ok_or_else(|| invariant_error("number", &value))
}

pub(crate) fn eval_bool(expr: &Expr, ctx: &ExecContext) -> Result<bool, ScriptError> {
    let value = evaluate(expr, ctx)?;
    value.as_bool().ok_or_else(|| invariant_error("bool", &value))
}

pub(crate) fn eval_direction(
    expr: &Expr,
    ctx: &ExecContext,
) -> Result<ts_core::Direction, ScriptError> {
    let value = evaluate(expr, ctx)?;
    value
        .as_direction()
        .ok_or_else(|| invariant_error("direction", &value))
}

/// Evaluates an entity-valued expression and dereferences it: an absent
/// entity is a fatal script error, never silently false.
pub(crate) fn eval_entity(expr: &Expr, ctx: &ExecContext) -> Result<EntityRef, ScriptError> {
    let value = evaluate(expr, ctx)?;
    let entity = value
        .as_entity()
        .ok_or_else(|| invariant_error("entity", &value))?;
    entity.ok_or_else(|| {
        ScriptError::new("EVAL_NULL_ENTITY", "Cannot dereference a null entity.")
    })
}

fn values_equal(lhs: Value, rhs: Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => l.total_cmp(&r) == Ordering::Equal,
        _ => lhs == rhs,
    }
}

/// Pure, read-only tree evaluation. Children evaluate left-to-right
/// before the parent operator applies; logical operators do not
/// short-circuit.
pub(crate) fn evaluate(expr: &Expr, ctx: &ExecContext) -> Result<Value, ScriptError> {
    match expr.kind() {
        ExprKind::Constant(value) => Ok(*value),
        ExprKind::ActingEntity => Ok(Value::Entity(Some(ctx.actor))),
        ExprKind::Variable(name) => {
            let value = ctx.env.read(name)?;
            if value.value_type() != expr.ty() {
                return Err(ScriptError::new(
                    "EVAL_VAR_TYPE",
                    format!(
                        "Variable \"{}\" was read as {} but holds {}.",
                        name,
                        expr.ty().name(),
                        value.type_name()
                    ),
                ));
            }
            Ok(value)
        }
        ExprKind::Arithmetic { op, lhs, rhs } => {
            let lhs = eval_number(lhs, ctx)?;
            let rhs = eval_number(rhs, ctx)?;
            let result = match op {
                ArithmeticOp::Add => lhs + rhs,
                ArithmeticOp::Sub => lhs - rhs,
                ArithmeticOp::Mul => lhs * rhs,
                ArithmeticOp::Div => lhs / rhs,
            };
            Ok(Value::Number(result))
        }
        ExprKind::Sqrt(operand) => Ok(Value::Number(eval_number(operand, ctx)?.sqrt())),
        ExprKind::Random(bound) => {
            let bound = eval_number(bound, ctx)?;
            let mut state = ctx.rng.get();
            let unit = next_random_unit(&mut state);
            ctx.rng.set(state);
            Ok(Value::Number(unit * bound))
        }
        ExprKind::Logical { op, lhs, rhs } => {
            let lhs = eval_bool(lhs, ctx)?;
            let rhs = eval_bool(rhs, ctx)?;
            let result = match op {
                LogicalOp::And => lhs && rhs,
                LogicalOp::Or => lhs || rhs,
            };
            Ok(Value::Bool(result))
        }
        ExprKind::Not(operand) => Ok(Value::Bool(!eval_bool(operand, ctx)?)),
        ExprKind::Comparison { op, lhs, rhs } => match op {
            ComparisonOp::Eq | ComparisonOp::Ne => {
                let lhs = evaluate(lhs, ctx)?;
                let rhs = evaluate(rhs, ctx)?;
                let equal = values_equal(lhs, rhs);
                Ok(Value::Bool(if *op == ComparisonOp::Eq {
                    equal
                } else {
                    !equal
                }))
            }
            _ => {
                let lhs = eval_number(lhs, ctx)?;
                let rhs = eval_number(rhs, ctx)?;
                let ordering = lhs.total_cmp(&rhs);
                let result = match op {
                    ComparisonOp::Lt => ordering == Ordering::Less,
                    ComparisonOp::Le => ordering != Ordering::Greater,
                    ComparisonOp::Gt => ordering == Ordering::Greater,
                    ComparisonOp::Ge => ordering != Ordering::Less,
                    ComparisonOp::Eq | ComparisonOp::Ne => unreachable!(),
                };
                Ok(Value::Bool(result))
            }
        },
        ExprKind::Property { prop, target } => {
            let entity = eval_entity(target, ctx)?;
            let value = match prop {
                EntityProp::X => ctx.world.position(entity).map(|(x, _)| x),
                EntityProp::Y => ctx.world.position(entity).map(|(_, y)| y),
                EntityProp::Width => ctx.world.size(entity).map(|(w, _)| w),
                EntityProp::Height => ctx.world.size(entity).map(|(_, h)| h),
                EntityProp::HitPoints => ctx.world.hit_points(entity),
            };
            value
                .map(Value::Number)
                .ok_or_else(|| unknown_entity(entity))
        }
        ExprKind::IsKind { tag, target } => {
            let entity = eval_entity(target, ctx)?;
            Ok(Value::Bool(entity.tag == *tag))
        }
        ExprKind::TerrainIs { feature, target } => {
            let entity = eval_entity(target, ctx)?;
            let found = ctx
                .world
                .terrain_feature(entity)
                .ok_or_else(|| unknown_entity(entity))?;
            Ok(Value::Bool(found == *feature))
        }
        ExprKind::IsPassable(target) => {
            let entity = eval_entity(target, ctx)?;
            ctx.world
                .is_passable(entity)
                .map(Value::Bool)
                .ok_or_else(|| unknown_entity(entity))
        }
        ExprKind::IsMoving { target, direction } => {
            let entity = eval_entity(target, ctx)?;
            let direction = eval_direction(direction, ctx)?;
            ctx.world
                .is_moving(entity, direction)
                .map(Value::Bool)
                .ok_or_else(|| unknown_entity(entity))
        }
        ExprKind::IsJumping(target) => {
            let entity = eval_entity(target, ctx)?;
            ctx.world
                .is_jumping(entity)
                .map(Value::Bool)
                .ok_or_else(|| unknown_entity(entity))
        }
        ExprKind::IsDucking(target) => {
            let entity = eval_entity(target, ctx)?;
            ctx.world
                .is_ducking(entity)
                .map(Value::Bool)
                .ok_or_else(|| unknown_entity(entity))
        }
        ExprKind::IsDead(target) => {
            let entity = eval_entity(target, ctx)?;
            ctx.world
                .is_dead(entity)
                .map(Value::Bool)
                .ok_or_else(|| unknown_entity(entity))
        }
        ExprKind::TileAt { x, y } => {
            let x = eval_number(x, ctx)?;
            let y = eval_number(y, ctx)?;
            let tile = ctx.world.tile_at(x, y).ok_or_else(|| {
                ScriptError::new(
                    "EVAL_TILE_OUT_OF_BOUNDS",
                    format!("No tile at pixel ({}, {}).", x, y),
                )
            })?;
            Ok(Value::Entity(Some(tile)))
        }
        ExprKind::SearchEntity { direction } => {
            let direction = eval_direction(direction, ctx)?;
            Ok(Value::Entity(ctx.world.search(ctx.actor, direction)))
        }
    }
}
