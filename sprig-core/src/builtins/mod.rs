// sprig-core - Built-in functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Built-in functions for Sprig.

mod arithmetic;
pub(crate) mod collections;
mod comparison;
mod exceptions;
mod higher_order;
mod io;
mod metadata;
mod predicates;
mod refs;
mod strings;
mod type_checks;

use sprig_parser::{Symbol, Value};

use crate::context::Context;
use crate::env::Globals;
use crate::error::Result;
use crate::eval::{make_native_fn, make_plain_fn};
use crate::var::Var;

use arithmetic::{
    builtin_abs, builtin_add, builtin_dec, builtin_decimal, builtin_div, builtin_double,
    builtin_even_p, builtin_inc, builtin_long, builtin_max, builtin_min, builtin_mod,
    builtin_mul, builtin_neg_p, builtin_odd_p, builtin_pos_p, builtin_quot, builtin_rem,
    builtin_sub, builtin_zero_p,
};
use collections::{
    builtin_assoc, builtin_butlast, builtin_concat, builtin_conj, builtin_cons,
    builtin_contains_p, builtin_count, builtin_disj, builtin_dissoc, builtin_distinct,
    builtin_drop, builtin_empty, builtin_empty_p, builtin_first, builtin_frequencies,
    builtin_get, builtin_get_in, builtin_hash_map, builtin_hash_set, builtin_into,
    builtin_keys, builtin_last, builtin_list, builtin_merge, builtin_next, builtin_nth,
    builtin_ordered_map, builtin_range, builtin_rest, builtin_reverse, builtin_second,
    builtin_seq, builtin_set, builtin_sorted_map, builtin_sorted_set, builtin_take,
    builtin_vals, builtin_vec, builtin_vector, builtin_zipmap,
};
use comparison::{
    builtin_compare, builtin_eq, builtin_ge, builtin_gt, builtin_identical_p, builtin_le,
    builtin_lt, builtin_not_eq, builtin_num_eq,
};
use exceptions::{
    builtin_ex_data, builtin_ex_info, builtin_ex_kind, builtin_ex_message, builtin_ex_trace,
};
use higher_order::{
    builtin_apply, builtin_assoc_in, builtin_comp, builtin_complement, builtin_constantly,
    builtin_drop_while, builtin_every_p, builtin_filter, builtin_group_by, builtin_identity,
    builtin_juxt, builtin_keep, builtin_map, builtin_mapcat, builtin_mapv, builtin_partial,
    builtin_reduce, builtin_reduce_kv, builtin_remove, builtin_run, builtin_some,
    builtin_sort, builtin_sort_by, builtin_take_while, builtin_update, builtin_update_in,
};
use io::{
    builtin_pr_str, builtin_print, builtin_println, builtin_prn, builtin_read_string,
    builtin_str,
};
use metadata::{builtin_meta, builtin_vary_meta, builtin_with_meta};
use predicates::{
    builtin_atom_p, builtin_boolean, builtin_boolean_p, builtin_bytes_p, builtin_char_p,
    builtin_coll_p, builtin_decimal_p, builtin_double_p, builtin_false_p, builtin_fn_p,
    builtin_host_p, builtin_integer_p, builtin_keyword_p, builtin_list_p, builtin_macro_p,
    builtin_map_p, builtin_nil_p, builtin_not, builtin_number_p, builtin_seqable_p,
    builtin_sequential_p, builtin_set_p, builtin_some_p, builtin_sorted_p, builtin_string_p,
    builtin_symbol_p, builtin_true_p, builtin_vector_p, builtin_volatile_p,
};
use refs::{
    builtin_atom, builtin_compare_and_set, builtin_deref, builtin_future_call,
    builtin_future_done_p, builtin_future_p, builtin_reset, builtin_swap,
    builtin_thread_local, builtin_volatile, builtin_vreset, builtin_vswap,
};
use strings::{
    builtin_blank_p, builtin_ends_with_p, builtin_gensym, builtin_includes_p, builtin_join,
    builtin_keyword, builtin_lower_case, builtin_name, builtin_namespace, builtin_replace,
    builtin_split, builtin_starts_with_p, builtin_subs, builtin_symbol, builtin_trim,
    builtin_upper_case,
};
use type_checks::{
    builtin_bound_p, builtin_call_stack, builtin_eval_depth, builtin_hash, builtin_instance_p,
    builtin_type, builtin_var_names,
};

/// Register all built-in functions in the given global table.
pub fn register_builtins(globals: &Globals) {
    // Arithmetic
    globals.define_plain("+", builtin_add);
    globals.define_plain("-", builtin_sub);
    globals.define_plain("*", builtin_mul);
    globals.define_plain("/", builtin_div);
    globals.define_plain("quot", builtin_quot);
    globals.define_plain("rem", builtin_rem);
    globals.define_plain("mod", builtin_mod);
    globals.define_plain("inc", builtin_inc);
    globals.define_plain("dec", builtin_dec);
    globals.define_plain("max", builtin_max);
    globals.define_plain("min", builtin_min);
    globals.define_plain("abs", builtin_abs);
    globals.define_plain("long", builtin_long);
    globals.define_plain("double", builtin_double);
    globals.define_plain("decimal", builtin_decimal);

    // Numeric predicates
    globals.define_plain("even?", builtin_even_p);
    globals.define_plain("odd?", builtin_odd_p);
    globals.define_plain("pos?", builtin_pos_p);
    globals.define_plain("neg?", builtin_neg_p);
    globals.define_plain("zero?", builtin_zero_p);

    // Comparison
    globals.define_plain("=", builtin_eq);
    globals.define_plain("not=", builtin_not_eq);
    globals.define_plain("==", builtin_num_eq);
    globals.define_plain("<", builtin_lt);
    globals.define_plain(">", builtin_gt);
    globals.define_plain("<=", builtin_le);
    globals.define_plain(">=", builtin_ge);
    globals.define_plain("compare", builtin_compare);
    globals.define_plain("identical?", builtin_identical_p);

    // Type predicates
    globals.define_plain("nil?", builtin_nil_p);
    globals.define_plain("some?", builtin_some_p);
    globals.define_plain("boolean?", builtin_boolean_p);
    globals.define_plain("true?", builtin_true_p);
    globals.define_plain("false?", builtin_false_p);
    globals.define_plain("number?", builtin_number_p);
    globals.define_plain("integer?", builtin_integer_p);
    globals.define_plain("double?", builtin_double_p);
    globals.define_plain("decimal?", builtin_decimal_p);
    globals.define_plain("string?", builtin_string_p);
    globals.define_plain("char?", builtin_char_p);
    globals.define_plain("symbol?", builtin_symbol_p);
    globals.define_plain("keyword?", builtin_keyword_p);
    globals.define_plain("bytes?", builtin_bytes_p);
    globals.define_plain("list?", builtin_list_p);
    globals.define_plain("vector?", builtin_vector_p);
    globals.define_plain("map?", builtin_map_p);
    globals.define_plain("set?", builtin_set_p);
    globals.define_plain("coll?", builtin_coll_p);
    globals.define_plain("sequential?", builtin_sequential_p);
    globals.define_plain("seqable?", builtin_seqable_p);
    globals.define_plain("sorted?", builtin_sorted_p);
    globals.define_plain("fn?", builtin_fn_p);
    globals.define_plain("macro?", builtin_macro_p);
    globals.define_plain("atom?", builtin_atom_p);
    globals.define_plain("volatile?", builtin_volatile_p);
    globals.define_plain("host?", builtin_host_p);

    // Logic
    globals.define_plain("not", builtin_not);
    globals.define_plain("boolean", builtin_boolean);

    // Collection constructors
    globals.define_plain("list", builtin_list);
    globals.define_plain("vector", builtin_vector);
    globals.define_plain("hash-map", builtin_hash_map);
    globals.define_plain("ordered-map", builtin_ordered_map);
    globals.define_plain("sorted-map", builtin_sorted_map);
    globals.define_plain("hash-set", builtin_hash_set);
    globals.define_plain("sorted-set", builtin_sorted_set);
    globals.define_plain("vec", builtin_vec);
    globals.define_plain("set", builtin_set);
    globals.define_plain("range", builtin_range);
    globals.define_plain("zipmap", builtin_zipmap);

    // Collection access and update
    globals.define_plain("get", builtin_get);
    globals.define_plain("get-in", builtin_get_in);
    globals.define_plain("contains?", builtin_contains_p);
    globals.define_plain("count", builtin_count);
    globals.define_plain("empty?", builtin_empty_p);
    globals.define_plain("empty", builtin_empty);
    globals.define_plain("keys", builtin_keys);
    globals.define_plain("vals", builtin_vals);
    globals.define_plain("assoc", builtin_assoc);
    globals.define_plain("assoc-in", builtin_assoc_in);
    globals.define_plain("dissoc", builtin_dissoc);
    globals.define_plain("conj", builtin_conj);
    globals.define_plain("disj", builtin_disj);
    globals.define_plain("into", builtin_into);
    globals.define_plain("merge", builtin_merge);
    globals.define_plain("frequencies", builtin_frequencies);

    // Sequences
    globals.define_plain("first", builtin_first);
    globals.define_plain("second", builtin_second);
    globals.define_plain("last", builtin_last);
    globals.define_plain("rest", builtin_rest);
    globals.define_plain("next", builtin_next);
    globals.define_plain("butlast", builtin_butlast);
    globals.define_plain("nth", builtin_nth);
    globals.define_plain("seq", builtin_seq);
    globals.define_plain("cons", builtin_cons);
    globals.define_plain("concat", builtin_concat);
    globals.define_plain("reverse", builtin_reverse);
    globals.define_plain("take", builtin_take);
    globals.define_plain("drop", builtin_drop);
    globals.define_plain("distinct", builtin_distinct);

    // Higher-order functions
    globals.define_native("apply", builtin_apply);
    globals.define_native("map", builtin_map);
    globals.define_native("mapv", builtin_mapv);
    globals.define_native("mapcat", builtin_mapcat);
    globals.define_native("filter", builtin_filter);
    globals.define_native("remove", builtin_remove);
    globals.define_native("keep", builtin_keep);
    globals.define_native("take-while", builtin_take_while);
    globals.define_native("drop-while", builtin_drop_while);
    globals.define_native("reduce", builtin_reduce);
    globals.define_native("reduce-kv", builtin_reduce_kv);
    globals.define_native("every?", builtin_every_p);
    globals.define_native("some", builtin_some);
    globals.define_native("run!", builtin_run);
    globals.define_native("group-by", builtin_group_by);
    globals.define_native("sort", builtin_sort);
    globals.define_native("sort-by", builtin_sort_by);
    globals.define_native("update", builtin_update);
    globals.define_native("update-in", builtin_update_in);
    globals.define_plain("identity", builtin_identity);
    globals.define_plain("partial", builtin_partial);
    globals.define_plain("comp", builtin_comp);
    globals.define_plain("complement", builtin_complement);
    globals.define_plain("constantly", builtin_constantly);
    globals.define_plain("juxt", builtin_juxt);

    // Strings, symbols and keywords
    globals.define_plain("str", builtin_str);
    globals.define_plain("name", builtin_name);
    globals.define_plain("namespace", builtin_namespace);
    globals.define_plain("symbol", builtin_symbol);
    globals.define_plain("keyword", builtin_keyword);
    globals.define_plain("gensym", builtin_gensym);
    globals.define_plain("subs", builtin_subs);
    globals.define_plain("upper-case", builtin_upper_case);
    globals.define_plain("lower-case", builtin_lower_case);
    globals.define_plain("trim", builtin_trim);
    globals.define_plain("blank?", builtin_blank_p);
    globals.define_plain("split", builtin_split);
    globals.define_plain("join", builtin_join);
    globals.define_plain("starts-with?", builtin_starts_with_p);
    globals.define_plain("ends-with?", builtin_ends_with_p);
    globals.define_plain("includes?", builtin_includes_p);
    globals.define_plain("replace", builtin_replace);

    // Reference cells and futures
    globals.define_plain("atom", builtin_atom);
    globals.define_plain("reset!", builtin_reset);
    globals.define_native("swap!", builtin_swap);
    globals.define_plain("compare-and-set!", builtin_compare_and_set);
    globals.define_plain("volatile!", builtin_volatile);
    globals.define_plain("vreset!", builtin_vreset);
    globals.define_native("vswap!", builtin_vswap);
    globals.define_plain("thread-local", builtin_thread_local);
    globals.define_native("future-call", builtin_future_call);
    globals.define_plain("future-done?", builtin_future_done_p);
    globals.define_plain("future?", builtin_future_p);
    globals.define_plain("deref", builtin_deref);

    // Metadata
    globals.define_plain("meta", builtin_meta);
    globals.define_plain("with-meta", builtin_with_meta);
    globals.define_native("vary-meta", builtin_vary_meta);

    // Exceptions
    globals.define_plain("ex-info", builtin_ex_info);
    globals.define_plain("ex-message", builtin_ex_message);
    globals.define_plain("ex-data", builtin_ex_data);
    globals.define_plain("ex-kind", builtin_ex_kind);
    globals.define_plain("ex-trace", builtin_ex_trace);

    // Printing and reading
    globals.define_plain("pr-str", builtin_pr_str);
    globals.define_plain("prn", builtin_prn);
    globals.define_plain("print", builtin_print);
    globals.define_plain("println", builtin_println);
    globals.define_plain("read-string", builtin_read_string);

    // Types and introspection
    globals.define_plain("type", builtin_type);
    globals.define_plain("instance?", builtin_instance_p);
    globals.define_plain("hash", builtin_hash);
    globals.define_native("eval-depth", builtin_eval_depth);
    globals.define_native("call-stack", builtin_call_stack);
    globals.define_native("bound?", builtin_bound_p);
    globals.define_native("var-names", builtin_var_names);

    // Run mode, rebindable for tests
    let mode = Value::keyword(globals.config().run_mode.name());
    globals.install(Var::build(Symbol::new("*run-mode*"), mode, true, true, None));

    tracing::debug!(vars = globals.var_count(), "builtins registered");
}

/// Helper trait to define native functions more easily.
trait GlobalsExt {
    fn define_plain(&self, name: &'static str, func: fn(&[Value]) -> Result<Value>);
    fn define_native(&self, name: &'static str, func: fn(&mut Context, &[Value]) -> Result<Value>);
    fn install(&self, var: Var);
}

impl GlobalsExt for Globals {
    fn define_plain(&self, name: &'static str, func: fn(&[Value]) -> Result<Value>) {
        let native = make_plain_fn(name, func);
        self.install(Var::new(Symbol::new(name), native.into_value()));
    }

    fn define_native(&self, name: &'static str, func: fn(&mut Context, &[Value]) -> Result<Value>) {
        let native = make_native_fn(name, func);
        self.install(Var::new(Symbol::new(name), native.into_value()));
    }

    fn install(&self, var: Var) {
        let name = var.name().clone();
        if let Err(err) = self.def_global(var) {
            tracing::warn!(name = %name, error = %err, "builtin not installed");
        }
    }
}
