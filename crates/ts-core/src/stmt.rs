use serde::Serialize;

use crate::error::ScriptError;
use crate::expr::Expr;
use crate::types::{EntityKind, SortDirection, ValueType};

/// Index of a statement node inside its `StmtTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StmtId(u32);

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOp {
    StartMove(Expr),
    StopMove(Expr),
    StartJump,
    StopJump,
    StartDuck,
    StopDuck,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Sequence {
        children: Vec<StmtId>,
    },
    If {
        guard: Expr,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    While {
        guard: Expr,
        body: StmtId,
    },
    ForEach {
        variable: String,
        kind: EntityKind,
        filter: Option<Expr>,
        sort_key: Option<Expr>,
        sort_direction: SortDirection,
        body: StmtId,
    },
    Wait {
        duration: Expr,
    },
    Skip,
    Break,
    Assign {
        name: String,
        value: Expr,
    },
    Action(ActionOp),
    Print(Expr),
}

fn expect_expr(context: &str, expr: Expr, expected: ValueType) -> Result<Expr, ScriptError> {
    if expr.ty() == expected {
        Ok(expr)
    } else {
        Err(ScriptError::new(
            "TYPE_OPERAND_MISMATCH",
            format!(
                "{} must be {}, found {}.",
                context,
                expected.name(),
                expr.ty().name()
            ),
        ))
    }
}

/// Arena of immutable statement nodes. The tree shape is fixed once built;
/// per-invocation execution state lives outside the arena, addressed by
/// `StmtId`, so one tree can back many script instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StmtTree {
    nodes: Vec<Stmt>,
}

impl StmtTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: StmtId) -> Option<&Stmt> {
        self.nodes.get(id.index())
    }

    fn alloc(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.nodes.len() as u32);
        self.nodes.push(stmt);
        id
    }

    pub fn sequence(&mut self, children: Vec<StmtId>) -> StmtId {
        self.alloc(Stmt::Sequence { children })
    }

    pub fn if_else(
        &mut self,
        guard: Expr,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    ) -> Result<StmtId, ScriptError> {
        let guard = expect_expr("Conditional guard", guard, ValueType::Bool)?;
        Ok(self.alloc(Stmt::If {
            guard,
            then_branch,
            else_branch,
        }))
    }

    pub fn while_loop(&mut self, guard: Expr, body: StmtId) -> Result<StmtId, ScriptError> {
        let guard = expect_expr("While guard", guard, ValueType::Bool)?;
        Ok(self.alloc(Stmt::While { guard, body }))
    }

    pub fn for_each(
        &mut self,
        variable: impl Into<String>,
        kind: EntityKind,
        filter: Option<Expr>,
        sort_key: Option<Expr>,
        sort_direction: SortDirection,
        body: StmtId,
    ) -> Result<StmtId, ScriptError> {
        let filter = filter
            .map(|expr| expect_expr("For-each filter", expr, ValueType::Bool))
            .transpose()?;
        let sort_key = sort_key
            .map(|expr| expect_expr("For-each sort key", expr, ValueType::Number))
            .transpose()?;
        Ok(self.alloc(Stmt::ForEach {
            variable: variable.into(),
            kind,
            filter,
            sort_key,
            sort_direction,
            body,
        }))
    }

    pub fn wait(&mut self, duration: Expr) -> Result<StmtId, ScriptError> {
        let duration = expect_expr("Wait duration", duration, ValueType::Number)?;
        Ok(self.alloc(Stmt::Wait { duration }))
    }

    pub fn skip(&mut self) -> StmtId {
        self.alloc(Stmt::Skip)
    }

    pub fn break_stmt(&mut self) -> StmtId {
        self.alloc(Stmt::Break)
    }

    pub fn assign(&mut self, name: impl Into<String>, value: Expr) -> StmtId {
        self.alloc(Stmt::Assign {
            name: name.into(),
            value,
        })
    }

    pub fn start_move(&mut self, direction: Expr) -> Result<StmtId, ScriptError> {
        let direction = expect_expr("Move direction", direction, ValueType::Direction)?;
        Ok(self.alloc(Stmt::Action(ActionOp::StartMove(direction))))
    }

    pub fn stop_move(&mut self, direction: Expr) -> Result<StmtId, ScriptError> {
        let direction = expect_expr("Move direction", direction, ValueType::Direction)?;
        Ok(self.alloc(Stmt::Action(ActionOp::StopMove(direction))))
    }

    pub fn start_jump(&mut self) -> StmtId {
        self.alloc(Stmt::Action(ActionOp::StartJump))
    }

    pub fn stop_jump(&mut self) -> StmtId {
        self.alloc(Stmt::Action(ActionOp::StopJump))
    }

    pub fn start_duck(&mut self) -> StmtId {
        self.alloc(Stmt::Action(ActionOp::StartDuck))
    }

    pub fn stop_duck(&mut self) -> StmtId {
        self.alloc(Stmt::Action(ActionOp::StopDuck))
    }

    pub fn print(&mut self, value: Expr) -> StmtId {
        self.alloc(Stmt::Print(value))
    }
}

#[cfg(test)]
mod stmt_tests {
    use super::*;
    use crate::value::Direction;

    #[test]
    fn guards_and_durations_are_type_checked_at_build_time() {
        let mut tree = StmtTree::new();
        let body = tree.skip();

        let error = tree
            .while_loop(Expr::number(1.0), body)
            .expect_err("number guard should fail");
        assert_eq!(error.code, "TYPE_OPERAND_MISMATCH");

        let error = tree
            .wait(Expr::boolean(true))
            .expect_err("bool duration should fail");
        assert_eq!(error.code, "TYPE_OPERAND_MISMATCH");

        let error = tree
            .if_else(Expr::direction(Direction::Up), body, None)
            .expect_err("direction guard should fail");
        assert_eq!(error.code, "TYPE_OPERAND_MISMATCH");
    }

    #[test]
    fn for_each_checks_filter_and_sort_key_types() {
        let mut tree = StmtTree::new();
        let body = tree.start_jump();

        let error = tree
            .for_each(
                "obj",
                EntityKind::Plant,
                Some(Expr::number(0.0)),
                None,
                SortDirection::Ascending,
                body,
            )
            .expect_err("number filter should fail");
        assert_eq!(error.code, "TYPE_OPERAND_MISMATCH");

        let error = tree
            .for_each(
                "obj",
                EntityKind::Plant,
                None,
                Some(Expr::boolean(true)),
                SortDirection::Descending,
                body,
            )
            .expect_err("bool sort key should fail");
        assert_eq!(error.code, "TYPE_OPERAND_MISMATCH");
    }

    #[test]
    fn move_actions_require_direction_arguments() {
        let mut tree = StmtTree::new();
        let error = tree
            .start_move(Expr::number(2.0))
            .expect_err("number direction should fail");
        assert_eq!(error.code, "TYPE_OPERAND_MISMATCH");
        tree.start_move(Expr::direction(Direction::Right))
            .expect("direction argument should build");
    }

    #[test]
    fn trees_serialize_for_embedder_inspection() {
        let mut tree = StmtTree::new();
        let wait = tree.wait(Expr::number(0.5)).expect("wait should build");
        let root = tree.sequence(vec![wait]);
        let encoded = serde_json::to_value(&tree).expect("serialize");
        assert_eq!(encoded["nodes"][0]["wait"]["duration"]["ty"], "number");
        assert_eq!(encoded["nodes"][root.index()]["sequence"]["children"][0], 0);
    }

    #[test]
    fn ids_index_into_the_arena_in_allocation_order() {
        let mut tree = StmtTree::new();
        let first = tree.skip();
        let second = tree.break_stmt();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(tree.len(), 2);
        assert!(matches!(tree.get(second), Some(Stmt::Break)));
    }
}
