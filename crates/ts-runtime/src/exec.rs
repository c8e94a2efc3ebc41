use std::collections::VecDeque;

use ts_core::{
    ActionOp, EntityRef, Expr, ScriptError, SortDirection, Stmt, StmtId, StmtTree, Value,
};

use crate::eval::{eval_bool, eval_direction, eval_number, evaluate, ExecContext};

/// Outcome of one bounded unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// More work remains for the current pass.
    Yield,
    /// The pass completed; the node restored its state slot to default.
    Done,
    /// A `break` is unwinding towards the nearest enclosing loop.
    Break,
}

/// Mutable per-invocation state for one statement node. Lives in a
/// parallel arena owned by each script instance, so the statement tree
/// itself stays immutable and shareable.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeState {
    pub cursor: usize,
    pub branch: Option<bool>,
    pub in_body: bool,
    pub elapsed: f64,
    pub duration: Option<f64>,
    pub worklist: VecDeque<EntityRef>,
}

const WAIT_EPSILON: f64 = 1e-9;

fn bad_node(id: StmtId) -> ScriptError {
    ScriptError::new(
        "EXEC_BAD_NODE",
        format!("Statement id {} is not part of this tree.", id.index()),
    )
}

pub(crate) struct Executor<'a> {
    pub tree: &'a StmtTree,
    pub states: &'a mut [NodeState],
}

impl Executor<'_> {
    fn reset(&mut self, id: StmtId) {
        self.states[id.index()] = NodeState::default();
    }

    /// Advances the node by at most one bounded unit of work. Only wait
    /// and skip absorb the context's time slice; everything else is free.
    pub(crate) fn step(&mut self, id: StmtId, ctx: &mut ExecContext) -> Result<Step, ScriptError> {
        let tree = self.tree;
        let stmt = tree.get(id).ok_or_else(|| bad_node(id))?;
        match stmt {
            Stmt::Sequence { children } => self.step_sequence(id, children, ctx),
            Stmt::If {
                guard,
                then_branch,
                else_branch,
            } => self.step_if(id, guard, *then_branch, *else_branch, ctx),
            Stmt::While { guard, body } => self.step_while(id, guard, *body, ctx),
            Stmt::ForEach {
                variable,
                kind,
                filter,
                sort_key,
                sort_direction,
                body,
            } => {
                if self.states[id.index()].in_body {
                    self.step_for_each_body(id, *body, ctx)
                } else {
                    self.activate_for_each(
                        id,
                        variable,
                        *kind,
                        filter.as_ref(),
                        sort_key.as_ref(),
                        *sort_direction,
                        ctx,
                    )
                }
            }
            Stmt::Wait { duration } => self.step_wait(id, duration, ctx),
            Stmt::Skip => {
                if self.states[id.index()].in_body {
                    self.reset(id);
                    Ok(Step::Done)
                } else if !ctx.slice_available {
                    ctx.blocked = true;
                    Ok(Step::Yield)
                } else {
                    self.states[id.index()].in_body = true;
                    ctx.slice_used = true;
                    Ok(Step::Yield)
                }
            }
            Stmt::Break => Ok(Step::Break),
            Stmt::Assign { name, value } => {
                let value = evaluate(value, ctx)?;
                ctx.env.assign(name, value)?;
                Ok(Step::Done)
            }
            Stmt::Action(op) => {
                self.run_action(op, ctx)?;
                Ok(Step::Done)
            }
            Stmt::Print(value) => {
                let value = evaluate(value, ctx)?;
                tracing::info!(target: "tickscript", "{}", value);
                Ok(Step::Done)
            }
        }
    }

    fn step_sequence(
        &mut self,
        id: StmtId,
        children: &[StmtId],
        ctx: &mut ExecContext,
    ) -> Result<Step, ScriptError> {
        let cursor = self.states[id.index()].cursor;
        let Some(child) = children.get(cursor) else {
            self.reset(id);
            return Ok(Step::Done);
        };
        match self.step(*child, ctx)? {
            Step::Yield => Ok(Step::Yield),
            Step::Break => {
                self.reset(id);
                Ok(Step::Break)
            }
            Step::Done => {
                let state = &mut self.states[id.index()];
                state.cursor += 1;
                if state.cursor == children.len() {
                    self.reset(id);
                    Ok(Step::Done)
                } else {
                    Ok(Step::Yield)
                }
            }
        }
    }

    fn step_if(
        &mut self,
        id: StmtId,
        guard: &Expr,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
        ctx: &mut ExecContext,
    ) -> Result<Step, ScriptError> {
        let chosen = match self.states[id.index()].branch {
            Some(chosen) => chosen,
            None => {
                // The branch choice is frozen for the rest of the pass.
                let chosen = eval_bool(guard, ctx)?;
                if !chosen && else_branch.is_none() {
                    self.reset(id);
                    return Ok(Step::Done);
                }
                self.states[id.index()].branch = Some(chosen);
                return Ok(Step::Yield);
            }
        };
        let target = if chosen {
            Some(then_branch)
        } else {
            else_branch
        };
        let Some(target) = target else {
            self.reset(id);
            return Ok(Step::Done);
        };
        match self.step(target, ctx)? {
            Step::Yield => Ok(Step::Yield),
            Step::Break => {
                self.reset(id);
                Ok(Step::Break)
            }
            Step::Done => {
                self.reset(id);
                Ok(Step::Done)
            }
        }
    }

    fn step_while(
        &mut self,
        id: StmtId,
        guard: &Expr,
        body: StmtId,
        ctx: &mut ExecContext,
    ) -> Result<Step, ScriptError> {
        if !self.states[id.index()].in_body {
            if !eval_bool(guard, ctx)? {
                self.reset(id);
                return Ok(Step::Done);
            }
            self.states[id.index()].in_body = true;
        }
        match self.step(body, ctx)? {
            Step::Yield => Ok(Step::Yield),
            Step::Done => {
                // Body pass finished; the guard is re-evaluated on the
                // next call.
                self.states[id.index()].in_body = false;
                Ok(Step::Yield)
            }
            Step::Break => {
                self.reset(id);
                Ok(Step::Done)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn activate_for_each(
        &mut self,
        id: StmtId,
        variable: &str,
        kind: ts_core::EntityKind,
        filter: Option<&Expr>,
        sort_key: Option<&Expr>,
        sort_direction: SortDirection,
        ctx: &mut ExecContext,
    ) -> Result<Step, ScriptError> {
        // The worklist is rebuilt from the live population on every
        // activation, never carried over from an earlier one.
        let candidates = ctx.world.enumerate(kind);
        if candidates.is_empty() {
            self.reset(id);
            return Ok(Step::Done);
        }

        ctx.env.push_loop(variable, Value::Entity(None));
        let worklist = build_worklist(candidates, filter, sort_key, sort_direction, ctx);
        let worklist = match worklist {
            Ok(worklist) => worklist,
            Err(error) => {
                ctx.env.pop_loop();
                return Err(error);
            }
        };

        let Some(head) = worklist.front().copied() else {
            ctx.env.pop_loop();
            self.reset(id);
            return Ok(Step::Done);
        };
        ctx.env.bind_top(Value::Entity(Some(head)));
        let state = &mut self.states[id.index()];
        state.worklist = worklist;
        state.in_body = true;
        Ok(Step::Yield)
    }

    fn step_for_each_body(
        &mut self,
        id: StmtId,
        body: StmtId,
        ctx: &mut ExecContext,
    ) -> Result<Step, ScriptError> {
        match self.step(body, ctx)? {
            Step::Yield => Ok(Step::Yield),
            Step::Done => {
                let state = &mut self.states[id.index()];
                state.worklist.pop_front();
                match state.worklist.front().copied() {
                    Some(next) => {
                        ctx.env.bind_top(Value::Entity(Some(next)));
                        Ok(Step::Yield)
                    }
                    None => {
                        ctx.env.pop_loop();
                        self.reset(id);
                        Ok(Step::Done)
                    }
                }
            }
            Step::Break => {
                ctx.env.pop_loop();
                self.reset(id);
                Ok(Step::Done)
            }
        }
    }

    fn step_wait(
        &mut self,
        id: StmtId,
        duration: &Expr,
        ctx: &mut ExecContext,
    ) -> Result<Step, ScriptError> {
        // The duration is captured once when the wait is entered; later
        // changes to its operands do not move the deadline.
        let target = match self.states[id.index()].duration {
            Some(target) => target,
            None => {
                let target = eval_number(duration, ctx)?;
                self.states[id.index()].duration = Some(target);
                target
            }
        };
        if self.states[id.index()].elapsed + WAIT_EPSILON >= target {
            self.reset(id);
            return Ok(Step::Done);
        }
        if !ctx.slice_available {
            ctx.blocked = true;
            return Ok(Step::Yield);
        }
        self.states[id.index()].elapsed += ctx.slice;
        ctx.slice_used = true;
        Ok(Step::Yield)
    }

    fn run_action(&mut self, op: &ActionOp, ctx: &mut ExecContext) -> Result<(), ScriptError> {
        match op {
            ActionOp::StartMove(direction) => {
                let direction = eval_direction(direction, ctx)?;
                ctx.world.start_move(ctx.actor, direction);
            }
            ActionOp::StopMove(direction) => {
                let direction = eval_direction(direction, ctx)?;
                ctx.world.stop_move(ctx.actor, direction);
            }
            ActionOp::StartJump => ctx.world.start_jump(ctx.actor),
            ActionOp::StopJump => ctx.world.stop_jump(ctx.actor),
            ActionOp::StartDuck => ctx.world.start_duck(ctx.actor),
            ActionOp::StopDuck => ctx.world.stop_duck(ctx.actor),
        }
        Ok(())
    }
}

/// Filters and orders one activation's candidates with the loop variable
/// bound to each candidate in turn. Ties keep enumeration order (the sort
/// is stable).
fn build_worklist(
    candidates: Vec<EntityRef>,
    filter: Option<&Expr>,
    sort_key: Option<&Expr>,
    sort_direction: SortDirection,
    ctx: &mut ExecContext,
) -> Result<VecDeque<EntityRef>, ScriptError> {
    let mut survivors = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let keep = match filter {
            Some(filter) => {
                ctx.env.bind_top(Value::Entity(Some(candidate)));
                eval_bool(filter, ctx)?
            }
            None => true,
        };
        if keep {
            survivors.push(candidate);
        }
    }

    if let Some(sort_key) = sort_key {
        let mut keyed = Vec::with_capacity(survivors.len());
        for candidate in survivors {
            ctx.env.bind_top(Value::Entity(Some(candidate)));
            keyed.push((eval_number(sort_key, ctx)?, candidate));
        }
        match sort_direction {
            SortDirection::Ascending => keyed.sort_by(|a, b| a.0.total_cmp(&b.0)),
            SortDirection::Descending => keyed.sort_by(|a, b| b.0.total_cmp(&a.0)),
        }
        return Ok(keyed.into_iter().map(|(_, candidate)| candidate).collect());
    }

    Ok(survivors.into_iter().collect())
}
