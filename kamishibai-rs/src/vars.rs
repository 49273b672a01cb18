//! Variable scopes bound into expression evaluation.
//!
//! Four scopes, split by lifetime: `temp` lives until the host clears it,
//! `session` belongs to the running game (save-game state), `system`
//! outlives individual games (player settings), and macro parameters exist
//! only while the host has a macro invocation in flight. The scopes are
//! plain data — the conductor never touches them; only script-authored
//! expressions do, through the evaluator.

use std::collections::BTreeMap;

use crate::tag::Value;

/// Which variable scope a name resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Temp,
    Session,
    System,
    Param,
}

impl Scope {
    /// Map a scope keyword, as written in expressions, to a scope.
    pub fn from_keyword(word: &str) -> Option<Scope> {
        match word {
            "tmp" => Some(Scope::Temp),
            "session" => Some(Scope::Session),
            "system" => Some(Scope::System),
            "param" => Some(Scope::Param),
            _ => None,
        }
    }
}

/// The variable context handed to the evaluator on every call.
#[derive(Debug, Default)]
pub struct VarScopes {
    temp: BTreeMap<String, Value>,
    session: BTreeMap<String, Value>,
    system: BTreeMap<String, Value>,
    macro_params: Option<BTreeMap<String, Value>>,
}

impl VarScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the scope accepts reads/writes right now. Only the macro
    /// parameter scope can be unbound.
    pub fn is_bound(&self, scope: Scope) -> bool {
        match scope {
            Scope::Param => self.macro_params.is_some(),
            _ => true,
        }
    }

    /// Look up a variable. `None` for an unset name or an unbound scope.
    pub fn get(&self, scope: Scope, name: &str) -> Option<&Value> {
        match scope {
            Scope::Temp => self.temp.get(name),
            Scope::Session => self.session.get(name),
            Scope::System => self.system.get(name),
            Scope::Param => self.macro_params.as_ref()?.get(name),
        }
    }

    /// Set a variable. Returns false if the scope is unbound.
    pub fn set(&mut self, scope: Scope, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let map = match scope {
            Scope::Temp => &mut self.temp,
            Scope::Session => &mut self.session,
            Scope::System => &mut self.system,
            Scope::Param => match self.macro_params.as_mut() {
                Some(m) => m,
                None => return false,
            },
        };
        map.insert(name.into(), value.into());
        true
    }

    /// Remove a variable; returns whether it existed.
    pub fn unset(&mut self, scope: Scope, name: &str) -> bool {
        let map = match scope {
            Scope::Temp => &mut self.temp,
            Scope::Session => &mut self.session,
            Scope::System => &mut self.system,
            Scope::Param => match self.macro_params.as_mut() {
                Some(m) => m,
                None => return false,
            },
        };
        map.remove(name).is_some()
    }

    /// The full contents of a scope. `None` when the scope is unbound.
    pub fn scope_map(&self, scope: Scope) -> Option<&BTreeMap<String, Value>> {
        match scope {
            Scope::Temp => Some(&self.temp),
            Scope::Session => Some(&self.session),
            Scope::System => Some(&self.system),
            Scope::Param => self.macro_params.as_ref(),
        }
    }

    /// Swap in a whole scope at once (external evaluators sync scopes this
    /// way). Returns false if the scope is unbound.
    pub fn replace_scope(&mut self, scope: Scope, entries: BTreeMap<String, Value>) -> bool {
        match scope {
            Scope::Temp => self.temp = entries,
            Scope::Session => self.session = entries,
            Scope::System => self.system = entries,
            Scope::Param => {
                if self.macro_params.is_none() {
                    return false;
                }
                self.macro_params = Some(entries);
            }
        }
        true
    }

    /// Bind macro parameters for the duration of a macro invocation,
    /// replacing any previous binding.
    pub fn set_macro_params(&mut self, params: BTreeMap<String, Value>) {
        self.macro_params = Some(params);
    }

    /// Drop the macro parameter binding.
    pub fn clear_macro_params(&mut self) {
        self.macro_params = None;
    }

    /// The current macro parameter frame, if one is bound.
    pub fn macro_params(&self) -> Option<&BTreeMap<String, Value>> {
        self.macro_params.as_ref()
    }

    /// Wipe the temporary scope (the host does this between runs).
    pub fn clear_temp(&mut self) {
        self.temp.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
