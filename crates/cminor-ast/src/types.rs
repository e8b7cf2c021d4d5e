//! The type model: a closed set of structurally-equal value types.
//!
//! `Compound` and `Enum` are reference-counted because a pointer to a
//! struct can be formed before the struct's body is known (the
//! self-referential-member case); `CompoundType::members` starts `None`
//! and is filled in place once the declaration is fully resolved.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicKind {
    Void,
    Int,
    Float,
    Char,
    Bool,
    NullPtr,
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BasicKind::Void => "void",
            BasicKind::Int => "int",
            BasicKind::Float => "float",
            BasicKind::Char => "char",
            BasicKind::Bool => "bool",
            BasicKind::NullPtr => "nullptr",
        };
        f.write_str(s)
    }
}

/// An ordered name→type mapping, used both for struct/union members and
/// (elsewhere) enumerator values.
pub type Members = IndexMap<String, Type>;

#[derive(Debug)]
pub struct CompoundType {
    pub name: String,
    pub is_union: bool,
    pub members: RefCell<Option<Members>>,
}

#[derive(Debug)]
pub struct EnumType {
    pub name: String,
    pub enumerators: IndexMap<String, i32>,
}

#[derive(Debug, Clone)]
pub enum Type {
    Basic(BasicKind),
    Pointer(Box<Type>),
    /// `size` is `None` until an initializer or explicit size fixes it.
    Array(Box<Type>, Option<u32>),
    Function(Box<Type>, Vec<Type>),
    Compound(Rc<CompoundType>),
    Enum(Rc<EnumType>),
}

pub const VOID: Type = Type::Basic(BasicKind::Void);
pub const INT: Type = Type::Basic(BasicKind::Int);
pub const FLOAT: Type = Type::Basic(BasicKind::Float);
pub const CHAR: Type = Type::Basic(BasicKind::Char);
pub const BOOL: Type = Type::Basic(BasicKind::Bool);
pub const NULLPTR: Type = Type::Basic(BasicKind::NullPtr);

impl Type {
    pub fn pointer_to(elem: Type) -> Type {
        Type::Pointer(Box::new(elem))
    }

    pub fn array_of(elem: Type, size: Option<u32>) -> Type {
        Type::Array(Box::new(elem), size)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Type::Basic(BasicKind::Int | BasicKind::Float | BasicKind::Char | BasicKind::Bool)
        )
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_, _))
    }

    /// The pointee/element type of a pointer or array, else `None`.
    pub fn elem(&self) -> Option<&Type> {
        match self {
            Type::Pointer(t) | Type::Array(t, _) => Some(t),
            _ => None,
        }
    }
}

/// Structural equality: array equality ignores `size`; compound/enum
/// equality compares only `name` (and, for compounds, `is_union`).
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Basic(a), Type::Basic(b)) => a == b,
            (Type::Pointer(a), Type::Pointer(b)) => a == b,
            (Type::Array(a, _), Type::Array(b, _)) => a == b,
            (Type::Function(ra, pa), Type::Function(rb, pb)) => ra == rb && pa == pb,
            (Type::Compound(a), Type::Compound(b)) => a.name == b.name && a.is_union == b.is_union,
            (Type::Enum(a), Type::Enum(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(b) => write!(f, "{b}"),
            Type::Pointer(t) => write!(f, "{t}*"),
            Type::Array(t, size) => {
                write!(f, "{t}[")?;
                if let Some(n) = size {
                    write!(f, "{n}")?;
                }
                write!(f, "]")
            }
            Type::Function(ret, params) => {
                let params = params.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "{ret}({params})")
            }
            Type::Compound(c) => f.write_str(&c.name),
            Type::Enum(e) => f.write_str(&e.name),
        }
    }
}
