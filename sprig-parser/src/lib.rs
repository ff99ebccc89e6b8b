// sprig-parser - Reader and value model for the Sprig language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # sprig-parser
//!
//! Tokenizer, reader and printer for Sprig source, together with the value
//! model every other crate builds on: interned symbols and keywords,
//! persistent collections, functions as data and reference cells.

pub mod cells;
pub mod collections;
pub mod compare;
pub mod custom;
pub mod error;
pub mod function;
mod intern;
pub mod keyword;
pub mod meta;
pub mod printer;
pub mod reader;
pub mod symbol;
pub mod tokenizer;
pub mod value;
pub mod vector;

pub use bigdecimal::BigDecimal;
pub use cells::{Atom, ThreadLocal, Volatile};
pub use collections::{MapKind, OrderedMap, PMap, PSet, SetKind};
pub use compare::{compare_numeric, type_rank};
pub use custom::{CustomBody, CustomValue, HostObject};
pub use error::{ReadError, ReadErrorKind};
pub use function::{Arity, FnBody, Function, NativeFn, UserFn};
pub use im;
pub use keyword::Keyword;
pub use meta::{Meta, SourcePos};
pub use printer::{print, print_plain};
pub use reader::{PartialRead, parse_number, read, read_all, read_tolerant};
pub use symbol::Symbol;
pub use tokenizer::{Token, TokenKind, Tokenizer, tokenize, tokenize_tolerant};
pub use value::{MetaRef, Value};
pub use vector::{PVector, TINY_CAPACITY};
