//! Statement and control-flow lowering.
//!
//! Every loop pushes its `(break, continue)` target pair onto
//! [`Codegen::loop_stack`] before lowering its body and pops it on the way
//! out, so `break`/`continue` need only look at the top of the stack
//! regardless of nesting depth; a `for`'s `continue` target is its `post`
//! block (not `cond` directly) so the post-expression still runs before
//! the condition is re-checked.

use cminor_ast::ast::*;
use cminor_ast::span::Node;
use cminor_ast::types;

use super::Codegen;

impl<'ctx> Codegen<'ctx> {
    pub(super) fn gen_block(&self, b: &Block) {
        for item in &b.items {
            self.gen_block_item(item);
        }
    }

    fn gen_block_item(&self, item: &Node<BlockItem>) {
        match &item.node {
            BlockItem::Decl(d) => self.gen_declaration(d),
            BlockItem::Stmt(s) => self.gen_stmt(s),
        }
    }

    fn gen_declaration(&self, d: &Declaration) {
        match d {
            Declaration::Func(fd) => {
                for decl in &fd.decls {
                    self.ensure_function(decl);
                }
            }
            Declaration::Var(vd) => self.variable_declaration(vd),
            Declaration::Arr(ad) => self.array_declaration(ad),
            // Struct/union/enum members and enumerator values are only
            // ever needed lazily (see `external_decl`); nothing to emit
            // for a nested definition either.
            Declaration::Compound(_) | Declaration::Enum(_) => {}
        }
    }

    fn has_terminator(&self) -> bool {
        self.builder
            .get_insert_block()
            .expect("builder has no insertion point")
            .get_terminator()
            .is_some()
    }

    fn gen_stmt(&self, s: &Stmt) {
        match s {
            Stmt::Block(b) => self.gen_block(b),
            Stmt::If(i) => self.gen_if(i),
            Stmt::While(w) => self.gen_while(w),
            Stmt::For(f) => self.gen_for(f),
            Stmt::Return(r) => self.gen_return(r),
            Stmt::Break => {
                let (end, _) = *self.loop_stack.borrow().last().expect("'break' outside a loop survived analysis");
                self.builder.build_unconditional_branch(end).unwrap();
            }
            Stmt::Continue => {
                let (_, cont) = *self.loop_stack.borrow().last().expect("'continue' outside a loop survived analysis");
                self.builder.build_unconditional_branch(cont).unwrap();
            }
            Stmt::Empty => {}
            Stmt::Expr(e) => {
                self.gen_expr_list(&e.expr);
            }
        }
    }

    fn gen_if(&self, i: &IfStmt) {
        let function = self.current_function.get().expect("'if' lowered outside a function");
        let cond = self.gen_condition(&i.cond);

        let then_bb = self.context.append_basic_block(function, "if.then");
        let else_bb = self.context.append_basic_block(function, "if.else");
        let end_bb = self.context.append_basic_block(function, "if.end");
        let has_else = i.or_else.is_some();
        self.builder
            .build_conditional_branch(cond, then_bb, if has_else { else_bb } else { end_bb })
            .unwrap();

        self.builder.position_at_end(then_bb);
        self.gen_stmt(&i.then.node);
        if !self.has_terminator() {
            self.builder.build_unconditional_branch(end_bb).unwrap();
        }

        if let Some(or_else) = &i.or_else {
            self.builder.position_at_end(else_bb);
            self.gen_stmt(&or_else.node);
            if !self.has_terminator() {
                self.builder.build_unconditional_branch(end_bb).unwrap();
            }
        } else {
            else_bb.remove_from_function().ok();
        }

        self.builder.position_at_end(end_bb);
    }

    fn gen_while(&self, w: &WhileStmt) {
        let function = self.current_function.get().expect("'while' lowered outside a function");
        let cond_bb = self.context.append_basic_block(function, "while.cond");
        let body_bb = self.context.append_basic_block(function, "while.body");
        let end_bb = self.context.append_basic_block(function, "while.end");

        self.builder.build_unconditional_branch(cond_bb).unwrap();

        self.builder.position_at_end(cond_bb);
        let cond = self.gen_condition(&w.cond);
        self.builder.build_conditional_branch(cond, body_bb, end_bb).unwrap();

        self.builder.position_at_end(body_bb);
        self.loop_stack.borrow_mut().push((end_bb, cond_bb));
        self.gen_stmt(&w.body.node);
        self.loop_stack.borrow_mut().pop();
        if !self.has_terminator() {
            self.builder.build_unconditional_branch(cond_bb).unwrap();
        }

        self.builder.position_at_end(end_bb);
    }

    fn gen_for(&self, f: &ForStmt) {
        let function = self.current_function.get().expect("'for' lowered outside a function");
        if let Some(init) = &f.init {
            match &init.node {
                ForInit::Decl(d) => self.gen_declaration(d),
                ForInit::Expr(e) => {
                    self.gen_expr_list_bare(e);
                }
            }
        }

        let cond_bb = self.context.append_basic_block(function, "for.cond");
        let body_bb = self.context.append_basic_block(function, "for.body");
        let post_bb = self.context.append_basic_block(function, "for.post");
        let end_bb = self.context.append_basic_block(function, "for.end");

        self.builder.build_unconditional_branch(cond_bb).unwrap();

        self.builder.position_at_end(cond_bb);
        match &f.cond {
            Some(cond) => {
                let v = self.gen_condition(cond);
                self.builder.build_conditional_branch(v, body_bb, end_bb).unwrap();
            }
            // A missing condition is always true.
            None => {
                self.builder.build_unconditional_branch(body_bb).unwrap();
            }
        }

        self.builder.position_at_end(body_bb);
        self.loop_stack.borrow_mut().push((end_bb, post_bb));
        self.gen_stmt(&f.body.node);
        self.loop_stack.borrow_mut().pop();
        if !self.has_terminator() {
            self.builder.build_unconditional_branch(post_bb).unwrap();
        }

        self.builder.position_at_end(post_bb);
        if let Some(post) = &f.post {
            self.gen_expr_list(post);
        }
        self.builder.build_unconditional_branch(cond_bb).unwrap();

        self.builder.position_at_end(end_bb);
    }

    fn gen_return(&self, r: &ReturnStmt) {
        match &r.expr {
            Some(e) => {
                let ret_ty = self.current_return_type.borrow().clone().expect("return lowered outside a function");
                let v = self.gen_expr_list(e).expect("return expression produced no value");
                let ety = e.node.ctype.borrow().clone().expect("return expression missing resolved type at lowering");
                let casted = self.gen_cast(v, &ety, &ret_ty);
                self.builder.build_return(Some(&casted)).unwrap();
            }
            None => {
                debug_assert_eq!(
                    self.current_return_type.borrow().as_ref(),
                    Some(&types::VOID),
                    "bare 'return' in a non-void function survived analysis"
                );
                self.builder.build_return(None).unwrap();
            }
        }
    }
}
