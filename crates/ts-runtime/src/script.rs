use std::cell::Cell;
use std::sync::Arc;

use ts_core::{EntityRef, ScriptError, StmtId, StmtTree, Value, VarDeclaration};

use crate::env::Environment;
use crate::eval::ExecContext;
use crate::exec::{Executor, NodeState, Step};
use crate::wellformed::check_well_formed;
use crate::world::World;

/// Fixed quantum used to step a script without exceeding one tick's
/// budget.
pub const TIME_SLICE: f64 = 0.001;

/// Bound on consecutive steps that absorb no slice time. A script that
/// trips this never waits and would otherwise spin inside one tick.
const MAX_FREE_STEPS: usize = 10_000;

const BUDGET_EPSILON: f64 = 1e-12;

/// One script instance bound to one acting entity. The statement tree is
/// shared and immutable; all mutable execution state (node states,
/// environment, RNG) is owned here, so several instances can run the same
/// tree concurrently without copies.
#[derive(Debug)]
pub struct Script {
    tree: Arc<StmtTree>,
    root: StmtId,
    env: Environment,
    states: Vec<NodeState>,
    rng: Cell<u32>,
    actor: Option<EntityRef>,
    pass_used_slice: bool,
}

impl Script {
    /// Validates the tree (well-formedness) and the declarations; an
    /// ill-formed tree never yields a `Script`.
    pub fn new(
        tree: Arc<StmtTree>,
        root: StmtId,
        declarations: &[VarDeclaration],
    ) -> Result<Self, ScriptError> {
        check_well_formed(&tree, root)?;
        let env = Environment::new(declarations)?;
        let states = vec![NodeState::default(); tree.len()];
        Ok(Self {
            tree,
            root,
            env,
            states,
            rng: Cell::new(1),
            actor: None,
            pass_used_slice: false,
        })
    }

    /// Associates the script with its acting entity. Must happen before
    /// the first `execute`.
    pub fn bind(&mut self, actor: EntityRef) {
        self.actor = Some(actor);
    }

    pub fn actor(&self) -> Option<EntityRef> {
        self.actor
    }

    pub fn set_random_seed(&mut self, seed: u32) {
        self.rng.set(seed);
    }

    /// Current value of a declared global, for embedder inspection.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.global_value(name)
    }

    /// Advances the script by `dt` seconds of simulated time, one slice
    /// per root step. Only wait/skip absorb slice time; control steps run
    /// for any valid `dt`, including sub-slice timesteps, and the call
    /// suspends when a wait/skip needs a slice the remaining budget
    /// cannot cover. When the root completes with budget left it restarts
    /// from the top; a pass that completed without ever absorbing time
    /// ends the call instead, so a wait-free script runs once per tick
    /// rather than spinning. A runtime error aborts this call only.
    pub fn execute(&mut self, world: &mut dyn World, dt: f64) -> Result<(), ScriptError> {
        let actor = self.actor.ok_or_else(|| {
            ScriptError::new("EXEC_UNBOUND", "Script has no bound acting entity.")
        })?;
        if !dt.is_finite() || dt < 0.0 {
            return Err(ScriptError::new(
                "EXEC_BAD_TIMESTEP",
                format!("Timestep must be finite and non-negative, got {}.", dt),
            ));
        }

        let mut budget = dt;
        let mut free_steps = 0usize;
        loop {
            let mut executor = Executor {
                tree: self.tree.as_ref(),
                states: &mut self.states,
            };
            let mut ctx = ExecContext {
                actor,
                env: &mut self.env,
                world: &mut *world,
                rng: &self.rng,
                slice: TIME_SLICE,
                slice_available: budget + BUDGET_EPSILON >= TIME_SLICE,
                slice_used: false,
                blocked: false,
            };
            let step = match executor.step(self.root, &mut ctx) {
                Ok(step) => step,
                Err(error) => {
                    tracing::debug!(
                        target: "tickscript",
                        code = %error.code,
                        "script invocation aborted"
                    );
                    return Err(error);
                }
            };
            if ctx.slice_used {
                budget -= TIME_SLICE;
                free_steps = 0;
                self.pass_used_slice = true;
            } else if ctx.blocked {
                // The next tick's budget resumes the starved wait/skip.
                return Ok(());
            } else {
                free_steps += 1;
                if free_steps >= MAX_FREE_STEPS {
                    return Err(ScriptError::new(
                        "EXEC_STEP_LIMIT",
                        format!("Execution exceeded {} steps without waiting.", MAX_FREE_STEPS),
                    ));
                }
            }
            match step {
                Step::Yield => {}
                Step::Done => {
                    if !self.pass_used_slice {
                        return Ok(());
                    }
                    self.pass_used_slice = false;
                }
                Step::Break => {
                    return Err(ScriptError::new(
                        "EXEC_BREAK_ESCAPED",
                        "Break reached the script root.",
                    ));
                }
            }
        }
    }
}
