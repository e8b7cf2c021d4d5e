//! Symbol values bound by the symbol table (the scope stack itself lives
//! in `cminorc::symtab`, alongside the analyzer that drives it).

use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::span::Span;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Func,
    Var,
    Const,
}

/// A unique, stable handle for a symbol, independent of its `Type`'s
/// structural identity. The code generator keys its "lowered value" side
/// table (function/global/alloca) by this id instead of storing an
/// `inkwell` value directly on `Symbol`, which would otherwise force this
/// crate to depend on LLVM bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

impl SymbolId {
    fn fresh() -> Self {
        SymbolId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub ty: Type,
    pub name: String,
    pub kind: SymbolKind,
    pub def_site: Span,
    pub defined: Cell<bool>,
}

impl Symbol {
    pub fn new(ty: Type, name: impl Into<String>, kind: SymbolKind, def_site: Span) -> Self {
        Symbol {
            id: SymbolId::fresh(),
            ty,
            name: name.into(),
            kind,
            def_site,
            defined: Cell::new(true),
        }
    }

    pub fn prototype(ty: Type, name: impl Into<String>, kind: SymbolKind, def_site: Span) -> Self {
        let sym = Symbol::new(ty, name, kind, def_site);
        sym.defined.set(false);
        sym
    }
}
