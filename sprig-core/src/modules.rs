// sprig-core - Bundled source modules
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Source modules compiled into the crate.
//!
//! `core` holds the everyday macros (`defn`, `when`, `cond`, `->` and so
//! on) and is loaded into every environment the embedding layer creates.
//! `test` adds assertion helpers and is loaded on request.

use sprig_parser::read_all;

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::eval_top_level;

/// The always-loaded module.
pub const CORE_MODULE: &str = "core";

/// Embedded module sources by name.
const MODULES: &[(&str, &str)] = &[
    (CORE_MODULE, include_str!("../modules/core.sprig")),
    ("test", include_str!("../modules/test.sprig")),
];

/// Names of every bundled module.
pub fn module_names() -> impl Iterator<Item = &'static str> {
    MODULES.iter().map(|(name, _)| *name)
}

/// Source text of a bundled module.
pub fn module_source(name: &str) -> Option<&'static str> {
    MODULES
        .iter()
        .find(|(module, _)| *module == name)
        .map(|(_, source)| *source)
}

/// Read and evaluate a bundled module in `env`.
pub fn load_module(name: &str, env: &Env, ctx: &mut Context) -> Result<()> {
    let source =
        module_source(name).ok_or_else(|| Error::eval(format!("Unknown module: {name}")))?;
    let forms = read_all(source, &format!("{name}.sprig"))?;
    for form in &forms {
        eval_top_level(form, env, ctx)?;
    }
    tracing::debug!(module = name, forms = forms.len(), "module loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sprig_parser::{Symbol, Value, read};

    use super::*;
    use crate::builtins::register_builtins;
    use crate::config::Config;
    use crate::env::Globals;
    use crate::eval::eval;

    fn setup() -> (Env, Context) {
        let globals = Arc::new(Globals::new(Config::default()));
        register_builtins(&globals);
        (Env::new(Arc::clone(&globals)), Context::new(globals))
    }

    fn run(src: &str, env: &Env, ctx: &mut Context) -> Value {
        eval(&read(src, "test").unwrap(), env, ctx).unwrap()
    }

    #[test]
    fn test_every_module_reads() {
        for name in module_names() {
            let source = module_source(name).unwrap();
            assert!(read_all(source, name).is_ok(), "module {name} should read");
        }
    }

    #[test]
    fn test_core_macros() {
        let (env, mut ctx) = setup();
        load_module(CORE_MODULE, &env, &mut ctx).unwrap();
        assert!(ctx.globals().get_var(&Symbol::new("defn")).is_some());
        run("(defn add2 \"Adds two.\" [x] (+ x 2))", &env, &mut ctx);
        assert_eq!(run("(add2 1)", &env, &mut ctx), Value::Long(3));
        assert_eq!(
            run("(cond false 1 (= 1 2) 2 :else 3)", &env, &mut ctx),
            Value::Long(3)
        );
        assert_eq!(run("(and 1 nil 2)", &env, &mut ctx), Value::Nil);
        assert_eq!(run("(or nil false 7)", &env, &mut ctx), Value::Long(7));
        assert_eq!(run("(-> 1 inc (- 10))", &env, &mut ctx), Value::Long(-8));
        assert_eq!(run("(->> 1 inc (- 10))", &env, &mut ctx), Value::Long(8));
        assert_eq!(
            run("(if-let [x (get {:a 1} :a)] (inc x) :none)", &env, &mut ctx),
            Value::Long(2)
        );
        assert_eq!(
            run("(let [a (atom 0)] (dotimes [i 5] (swap! a + i)) @a)", &env, &mut ctx),
            Value::Long(10)
        );
    }

    #[test]
    fn test_unknown_module() {
        let (env, mut ctx) = setup();
        assert!(load_module("nope", &env, &mut ctx).is_err());
    }

    #[test]
    fn test_module_assertions() {
        let (env, mut ctx) = setup();
        load_module(CORE_MODULE, &env, &mut ctx).unwrap();
        load_module("test", &env, &mut ctx).unwrap();
        assert_eq!(run("(assert= 2 (+ 1 1))", &env, &mut ctx), Value::Boolean(true));
        assert_eq!(
            run("(assert-throws :arity-error (inc 1 2))", &env, &mut ctx),
            Value::Boolean(true)
        );
        let failed = eval(&read("(assert= 3 (+ 1 1))", "test").unwrap(), &env, &mut ctx);
        assert!(failed.unwrap_err().to_string().contains("Expected 3, got 2"));
    }
}
