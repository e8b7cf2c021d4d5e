//! `Type` → LLVM type lowering, and struct/union layout.
//!
//! Every pointer (`T*`, `nullptr`, the implicit pointer a function or
//! array decays to) lowers to the same opaque `ptr`, so a struct with a
//! self-referential pointer member never needs its pointee's body to be
//! known yet — `Type::Pointer` never recurses into `lower_type` at all.

use inkwell::types::{BasicType, BasicTypeEnum, FunctionType, StructType};
use inkwell::AddressSpace;

use cminor_ast::types::{BasicKind, CompoundType, Type};

use super::Codegen;

impl<'ctx> Codegen<'ctx> {
    pub(super) fn lower_type(&self, ty: &Type) -> BasicTypeEnum<'ctx> {
        match ty {
            Type::Basic(BasicKind::Void) => unreachable!("void has no value representation"),
            Type::Basic(BasicKind::Int) => self.context.i32_type().into(),
            Type::Basic(BasicKind::Float) => self.context.f32_type().into(),
            Type::Basic(BasicKind::Char) => self.context.i8_type().into(),
            Type::Basic(BasicKind::Bool) => self.context.bool_type().into(),
            Type::Basic(BasicKind::NullPtr) => self.context.ptr_type(AddressSpace::default()).into(),
            Type::Pointer(_) => self.context.ptr_type(AddressSpace::default()).into(),
            Type::Array(elem, size) => self.lower_type(elem).array_type(size.unwrap_or(0)).into(),
            Type::Function(..) => unreachable!("function types are lowered via lower_fn_type"),
            Type::Compound(c) => self.lower_compound(c).into(),
            Type::Enum(_) => self.context.i32_type().into(),
        }
    }

    pub(super) fn lower_fn_type(&self, ret: &Type, params: &[Type], is_var_arg: bool) -> FunctionType<'ctx> {
        let param_types: Vec<_> = params.iter().map(|p| self.lower_type(p).into()).collect();
        if *ret == cminor_ast::types::VOID {
            self.context.void_type().fn_type(&param_types, is_var_arg)
        } else {
            self.lower_type(ret).fn_type(&param_types, is_var_arg)
        }
    }

    /// Struct types are identified (named) and cached by tag name so that
    /// every use of `struct Point` shares one `StructType`, and so a
    /// member whose own type is the enclosing struct's pointer never
    /// triggers re-entrant lowering.
    fn lower_compound(&self, c: &CompoundType) -> StructType<'ctx> {
        if let Some(existing) = self.structs.borrow().get(&c.name) {
            return *existing;
        }
        let struct_ty = self.context.opaque_struct_type(&c.name);
        self.structs.borrow_mut().insert(c.name.clone(), struct_ty);

        let members = c.members.borrow();
        let members = members.as_ref().expect("compound type reached lowering with members unresolved");
        if c.is_union {
            // A union lowers to a single-field struct sized for its
            // largest member; loads/stores at a member-access site use
            // that member's own lowered type (see `expr::gen_address`'s
            // `MemberAccess` arm), so the placeholder field's declared
            // type only has to be big enough, never "correct".
            let largest = members.values().max_by_key(|m| abi_size(m)).expect("union has no members");
            struct_ty.set_body(&[self.lower_type(largest)], false);
        } else {
            let field_types: Vec<BasicTypeEnum> = members.values().map(|m| self.lower_type(m)).collect();
            struct_ty.set_body(&field_types, false);
        }
        struct_ty
    }
}

/// A deliberately simplified ABI-size estimate (no alignment or padding)
/// used only to pick which member a union's single field should be sized
/// after; it never otherwise influences the emitted IR.
fn abi_size(ty: &Type) -> u32 {
    match ty {
        Type::Basic(BasicKind::Void) => 0,
        Type::Basic(BasicKind::Int | BasicKind::Float) => 4,
        Type::Basic(BasicKind::Char | BasicKind::Bool) => 1,
        Type::Basic(BasicKind::NullPtr) | Type::Pointer(_) => 8,
        Type::Array(elem, size) => abi_size(elem) * size.unwrap_or(0),
        Type::Function(..) => 8,
        Type::Compound(c) => {
            let members = c.members.borrow();
            match members.as_ref() {
                Some(m) if c.is_union => m.values().map(abi_size).max().unwrap_or(0),
                Some(m) => m.values().map(abi_size).sum(),
                None => 0,
            }
        }
        Type::Enum(_) => 4,
    }
}
