//! Optional Lua 5.4 evaluator via the `mlua` crate.
//!
//! Enabled with the `lua` Cargo feature:
//! ```text
//! cargo build --features lua
//! cargo test  --features lua
//! ```
//!
//! Scripts that outgrow the built-in expression language can run their
//! embedded code and entity values through a real interpreter instead. The
//! variable scopes are exposed as Lua global tables around every evaluation:
//!
//! | Lua global | scope                                   |
//! |------------|-----------------------------------------|
//! | `tmp`      | temporary                               |
//! | `session`  | save-game state                         |
//! | `system`   | cross-game settings                     |
//! | `param`    | macro parameters (`nil` while unbound)  |
//!
//! After the chunk runs, scalar entries (string, number, boolean) of those
//! tables are read back into the scopes; functions, nested tables, and other
//! non-scalars are dropped. A scope global reassigned to a non-table is left
//! out of the read-back entirely.

#[cfg(feature = "lua")]
pub use lua_impl::LuaEvaluator;

#[cfg(feature = "lua")]
mod lua_impl {
    use std::collections::BTreeMap;

    use mlua::prelude::*;

    use crate::error::EvalError;
    use crate::resource::Evaluator;
    use crate::tag::Value;
    use crate::vars::{Scope, VarScopes};

    const SCOPE_GLOBALS: [(Scope, &str); 3] = [
        (Scope::Temp, "tmp"),
        (Scope::Session, "session"),
        (Scope::System, "system"),
    ];

    /// A Lua interpreter behind the [`Evaluator`] seam.
    ///
    /// Each evaluation is expression-or-chunk: `tmp.n + 1` returns its value,
    /// `tmp.n = tmp.n + 1` runs as a statement and yields the empty string.
    pub struct LuaEvaluator {
        lua: Lua,
    }

    impl LuaEvaluator {
        pub fn new() -> Self {
            LuaEvaluator { lua: Lua::new() }
        }

        /// Install the scope tables as globals.
        fn publish(&self, vars: &VarScopes) -> LuaResult<()> {
            let globals = self.lua.globals();
            for (scope, name) in SCOPE_GLOBALS {
                if let Some(map) = vars.scope_map(scope) {
                    globals.set(name, self.table_from(map)?)?;
                }
            }
            match vars.scope_map(Scope::Param) {
                Some(map) => globals.set("param", self.table_from(map)?)?,
                None => globals.set("param", LuaValue::Nil)?,
            }
            Ok(())
        }

        /// Read the scope tables back after a chunk ran.
        fn collect(&self, vars: &mut VarScopes) -> LuaResult<()> {
            let globals = self.lua.globals();
            for (scope, name) in SCOPE_GLOBALS {
                if let Ok(table) = globals.get::<LuaTable>(name) {
                    vars.replace_scope(scope, map_from(table)?);
                }
            }
            if vars.is_bound(Scope::Param) {
                if let Ok(table) = globals.get::<LuaTable>("param") {
                    vars.replace_scope(Scope::Param, map_from(table)?);
                }
            }
            Ok(())
        }

        fn table_from(&self, map: &BTreeMap<String, Value>) -> LuaResult<LuaTable> {
            let table = self.lua.create_table()?;
            for (key, value) in map {
                match value {
                    Value::Str(s) => table.set(key.as_str(), s.as_str())?,
                    Value::Num(x) => table.set(key.as_str(), *x)?,
                    Value::Bool(b) => table.set(key.as_str(), *b)?,
                }
            }
            Ok(table)
        }
    }

    impl Default for LuaEvaluator {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Evaluator for LuaEvaluator {
        fn evaluate(&mut self, expr: &str, vars: &mut VarScopes) -> Result<Value, EvalError> {
            self.publish(vars)
                .map_err(|e| EvalError::new(expr, e.to_string()))?;
            let result = self
                .lua
                .load(expr)
                .eval::<LuaValue>()
                .map_err(|e| EvalError::new(expr, e.to_string()))?;
            self.collect(vars)
                .map_err(|e| EvalError::new(expr, e.to_string()))?;

            match result {
                LuaValue::Nil => Ok(Value::Str(String::new())),
                other => scalar(&other).ok_or_else(|| {
                    EvalError::new(
                        expr,
                        format!("unsupported result type: {}", other.type_name()),
                    )
                }),
            }
        }
    }

    fn map_from(table: LuaTable) -> LuaResult<BTreeMap<String, Value>> {
        let mut map = BTreeMap::new();
        for pair in table.pairs::<LuaValue, LuaValue>() {
            let (key, value) = pair?;
            let LuaValue::String(key) = key else { continue };
            if let Some(v) = scalar(&value) {
                map.insert(key.to_str()?.to_owned(), v);
            }
        }
        Ok(map)
    }

    fn scalar(value: &LuaValue) -> Option<Value> {
        match value {
            LuaValue::Boolean(b) => Some(Value::Bool(*b)),
            LuaValue::Integer(i) => Some(Value::Num(*i as f64)),
            LuaValue::Number(x) => Some(Value::Num(*x)),
            LuaValue::String(s) => s.to_str().ok().map(|s| Value::Str(s.to_owned())),
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
