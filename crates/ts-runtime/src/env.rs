use std::collections::BTreeMap;

use ts_core::{default_value_for, ScriptError, Value, ValueType, VarDeclaration};

#[derive(Debug, Clone)]
struct Binding {
    ty: ValueType,
    value: Value,
}

#[derive(Debug, Clone)]
struct LoopBinding {
    name: String,
    value: Value,
}

/// Two-tier name store: globals created once per script instance, plus a
/// stack of loop bindings (one per active for-each activation) that shadow
/// same-named globals. Reads and assignments target the innermost match.
#[derive(Debug, Clone)]
pub struct Environment {
    globals: BTreeMap<String, Binding>,
    loops: Vec<LoopBinding>,
}

impl Environment {
    pub fn new(declarations: &[VarDeclaration]) -> Result<Self, ScriptError> {
        let mut globals = BTreeMap::new();
        for decl in declarations {
            if globals.contains_key(&decl.name) {
                return Err(ScriptError::new(
                    "ENV_VAR_DUPLICATE",
                    format!("Variable \"{}\" is declared twice.", decl.name),
                ));
            }
            let value = match decl.initial {
                Some(value) => {
                    if value.value_type() != decl.ty {
                        return Err(ScriptError::new(
                            "TYPE_INITIAL_VALUE",
                            format!(
                                "Initial value of \"{}\" must be {}, found {}.",
                                decl.name,
                                decl.ty.name(),
                                value.type_name()
                            ),
                        ));
                    }
                    value
                }
                None => default_value_for(decl.ty),
            };
            globals.insert(
                decl.name.clone(),
                Binding {
                    ty: decl.ty,
                    value,
                },
            );
        }
        Ok(Self {
            globals,
            loops: Vec::new(),
        })
    }

    pub fn read(&self, name: &str) -> Result<Value, ScriptError> {
        for binding in self.loops.iter().rev() {
            if binding.name == name {
                return Ok(binding.value);
            }
        }
        self.globals
            .get(name)
            .map(|binding| binding.value)
            .ok_or_else(|| {
                ScriptError::new(
                    "EVAL_VAR_UNDECLARED",
                    format!("Variable \"{}\" is not declared.", name),
                )
            })
    }

    /// Assigns to the innermost binding with the given name. A binding's
    /// type is fixed for its lifetime; loop bindings are entity-typed.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), ScriptError> {
        for binding in self.loops.iter_mut().rev() {
            if binding.name == name {
                if value.value_type() != ValueType::Entity {
                    return Err(ScriptError::new(
                        "EXEC_ASSIGN_TYPE",
                        format!(
                            "Loop variable \"{}\" holds an entity, found {}.",
                            name,
                            value.type_name()
                        ),
                    ));
                }
                binding.value = value;
                return Ok(());
            }
        }
        let Some(binding) = self.globals.get_mut(name) else {
            return Err(ScriptError::new(
                "EXEC_ASSIGN_UNDECLARED",
                format!("Variable \"{}\" is not declared.", name),
            ));
        };
        if value.value_type() != binding.ty {
            return Err(ScriptError::new(
                "EXEC_ASSIGN_TYPE",
                format!(
                    "Variable \"{}\" is {}, found {}.",
                    name,
                    binding.ty.name(),
                    value.type_name()
                ),
            ));
        }
        binding.value = value;
        Ok(())
    }

    pub(crate) fn push_loop(&mut self, name: &str, value: Value) {
        self.loops.push(LoopBinding {
            name: name.to_string(),
            value,
        });
    }

    pub(crate) fn bind_top(&mut self, value: Value) {
        if let Some(binding) = self.loops.last_mut() {
            binding.value = value;
        }
    }

    pub(crate) fn pop_loop(&mut self) {
        self.loops.pop();
    }

    pub(crate) fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    pub(crate) fn global_value(&self, name: &str) -> Option<Value> {
        self.globals.get(name).map(|binding| binding.value)
    }
}
