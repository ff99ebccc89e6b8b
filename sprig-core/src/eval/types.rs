// sprig-core - Custom type definitions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! `deftype` (records), `deftype-of` (a wrapped base type) and `deftype-or`
//! (a choice between literal values).
//!
//! Each form defines a constructor `->name` and a predicate `name?` in the
//! current namespace and returns the type keyword:
//!
//! ```text
//! (deftype :point [x y])            (->point 1 2)   => #point{:x 1, :y 2}
//! (deftype-of :port :long)          (->port 8080)
//! (deftype-or :color :red :green)   (->color :red)
//! ```

use sprig_parser::{CustomValue, Keyword, Symbol, Value};

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::eval::special_forms::qualify;
use crate::eval::{Step, make_native_fn};
use crate::var::Var;

fn type_name(form: &str, args: &[Value]) -> Result<Keyword> {
    match args.first() {
        Some(Value::Keyword(kw)) => Ok(kw.clone()),
        Some(Value::Symbol(sym, _)) => Ok(Keyword::new(sym.name())),
        _ => Err(Error::syntax(form, "requires a type name keyword")),
    }
}

fn is_instance(value: &Value, name: &Keyword) -> bool {
    matches!(value, Value::Custom(c) if c.type_name == *name)
}

/// Install `->name` and `name?`.
fn define(
    ctx: &Context,
    env: &Env,
    name: &Keyword,
    constructor: sprig_parser::Function,
) -> Result<Step> {
    let ns = ctx.namespace();
    let ctor_name = qualify(&Symbol::new(&format!("->{}", name.name())), ns);
    env.def_global(Var::new(ctor_name, Value::Function(constructor)))?;

    let pred_type = name.clone();
    let predicate = make_native_fn(&format!("{}?", name.name()), move |_, args| {
        if args.len() != 1 {
            return Err(Error::arity_named(format!("{}?", pred_type.name()), 1, args.len()));
        }
        Ok(Value::Boolean(is_instance(&args[0], &pred_type)))
    });
    let pred_name = qualify(&Symbol::new(&format!("{}?", name.name())), ns);
    env.def_global(Var::new(pred_name, Value::Function(predicate)))?;

    tracing::debug!(name = %name, "type defined");
    Ok(Step::Done(Value::Keyword(name.clone())))
}

/// (deftype :name [field ...])
pub(crate) fn eval_deftype(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let name = type_name("deftype", args)?;
    let Some(Value::Vector(fields, _)) = args.get(1) else {
        return Err(Error::syntax("deftype", "requires a field vector"));
    };
    let fields = fields
        .iter()
        .map(|field| match field {
            Value::Symbol(sym, _) => Ok(Keyword::new(sym.name())),
            Value::Keyword(kw) => Ok(kw.clone()),
            other => Err(Error::syntax("deftype", format!("invalid field {other}"))),
        })
        .collect::<Result<Vec<_>>>()?;

    let ctor_type = name.clone();
    let constructor = make_native_fn(&format!("->{}", name.name()), move |_, args| {
        if args.len() != fields.len() {
            return Err(Error::arity_named(
                format!("->{}", ctor_type.name()),
                fields.len(),
                args.len(),
            ));
        }
        let values = fields.iter().cloned().zip(args.iter().cloned()).collect();
        Ok(Value::custom(CustomValue::record(ctor_type.clone(), values)))
    });
    define(ctx, env, &name, constructor)
}

/// (deftype-of :name :base-type)
pub(crate) fn eval_deftype_of(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let name = type_name("deftype-of", args)?;
    let Some(Value::Keyword(base)) = args.get(1) else {
        return Err(Error::syntax("deftype-of", "requires a base type keyword"));
    };
    let base = base.name().to_string();
    let ctor_type = name.clone();
    let constructor = make_native_fn(&format!("->{}", name.name()), move |_, args| {
        if args.len() != 1 {
            return Err(Error::arity_named(format!("->{}", ctor_type.name()), 1, args.len()));
        }
        if args[0].type_name() != base {
            return Err(Error::type_mismatch_in(
                format!("->{}: expected {base}", ctor_type.name()),
                "base type",
                args[0].type_name(),
            ));
        }
        Ok(Value::custom(CustomValue::wrapped(ctor_type.clone(), args[0].clone())))
    });
    define(ctx, env, &name, constructor)
}

/// (deftype-or :name alternative ...)
pub(crate) fn eval_deftype_or(args: &[Value], env: &Env, ctx: &mut Context) -> Result<Step> {
    let name = type_name("deftype-or", args)?;
    if args.len() < 2 {
        return Err(Error::syntax("deftype-or", "requires at least one alternative"));
    }
    let choices = args[1..].to_vec();
    let ctor_type = name.clone();
    let constructor = make_native_fn(&format!("->{}", name.name()), move |_, args| {
        if args.len() != 1 {
            return Err(Error::arity_named(format!("->{}", ctor_type.name()), 1, args.len()));
        }
        if !choices.contains(&args[0]) {
            return Err(Error::eval(format!(
                "{} is not one of the alternatives of {}",
                args[0], ctor_type
            )));
        }
        Ok(Value::custom(CustomValue::wrapped(ctor_type.clone(), args[0].clone())))
    });
    define(ctx, env, &name, constructor)
}
