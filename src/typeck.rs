use crate::ast::{Expr, Function, NodeId, Program, Stmt, Type};
use codespan::{FileId, Span};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::cell::RefCell;
use std::collections::HashMap;

/// Semantic pass over a parsed program. Resolves variable and function
/// references, infers undeclared function return types to fixpoint, and
/// records the type of every expression node in a side-table keyed by
/// [`NodeId`]. The AST itself is never mutated; the emitter reads types
/// back from here.
pub struct Resolver<'a> {
    program: &'a Program,
    file_id: FileId,
    fn_types: HashMap<String, Type>,
    globals: RefCell<HashMap<String, Type>>,
    expr_types: HashMap<NodeId, Type>,
}

impl<'a> Resolver<'a> {
    pub fn new(program: &'a Program, file_id: FileId) -> Self {
        Self {
            program,
            file_id,
            fn_types: HashMap::new(),
            globals: RefCell::new(HashMap::new()),
            expr_types: HashMap::new(),
        }
    }

    pub fn resolve(&mut self) -> Result<(), Diagnostic<FileId>> {
        let program = self.program;

        // Declared return types first. On duplicate definitions the first
        // one wins, matching call resolution.
        for function in &program.functions {
            self.fn_types
                .entry(function.name.clone())
                .or_insert_with(|| function.return_type.clone());
        }

        for stmt in &program.stmts {
            if let Stmt::VarDecl { name, ty, .. } = stmt {
                self.globals
                    .borrow_mut()
                    .entry(name.clone())
                    .or_insert_with(|| ty.clone());
            }
        }

        self.infer_return_types();

        for (index, function) in program.functions.iter().enumerate() {
            if program.functions[..index]
                .iter()
                .any(|f| f.name == function.name)
            {
                continue;
            }
            for stmt in &function.body {
                self.check_stmt(stmt, Some(function))?;
            }
        }
        for stmt in &program.stmts {
            self.check_stmt(stmt, None)?;
        }

        Ok(())
    }

    /// Runs the body search for every function without a declared return
    /// type until no table entry changes, so calls into functions that
    /// settle on a later round still resolve.
    fn infer_return_types(&mut self) {
        let program = self.program;
        loop {
            let mut changed = false;
            for (index, function) in program.functions.iter().enumerate() {
                if program.functions[..index]
                    .iter()
                    .any(|f| f.name == function.name)
                {
                    continue;
                }
                if self.fn_types.get(&function.name) != Some(&Type::Void) {
                    continue;
                }
                if let Some(ty) = self.find_return_type(&function.body, Some(function)) {
                    if ty != Type::Void {
                        self.fn_types.insert(function.name.clone(), ty);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Structural search for the return type of a statement list. The
    /// first conclusive statement in body order wins: a `return` yields
    /// its explicit annotation or its expression's type; an `if` counts
    /// only when both branches agree on a non-void type.
    fn find_return_type(&self, stmts: &[Stmt], ctx: Option<&Function>) -> Option<Type> {
        for stmt in stmts {
            match stmt {
                Stmt::Return { cast, value, .. } => {
                    if let Some(ty) = cast {
                        return Some(ty.clone());
                    }
                    return self.infer_expr(value, ctx);
                }
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    let then_ty = self.find_return_type(then_branch, ctx);
                    let else_ty = else_branch
                        .as_deref()
                        .and_then(|block| self.find_return_type(block, ctx));
                    if let (Some(t), Some(e)) = (&then_ty, &else_ty) {
                        if t == e && *t != Type::Void {
                            return then_ty;
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Best-effort expression typing used during return-type inference.
    /// Unresolvable pieces yield `None` instead of an error; the checking
    /// pass reports them later.
    fn infer_expr(&self, expr: &Expr, ctx: Option<&Function>) -> Option<Type> {
        match expr {
            Expr::Int(_, _) => Some(Type::Int),
            Expr::Float(_, _) => Some(Type::Float),
            Expr::Str(_, _) => Some(Type::String),
            Expr::Bool(_, _) => Some(Type::Bool),
            Expr::Var(name, _) => self.lookup_variable_type(name, ctx),
            Expr::Call(name, _, _) => {
                self.function(name)?;
                Some(self.return_type(name))
            }
            Expr::BinOp(left, op, right, _) => {
                if op.is_arithmetic() {
                    let left_ty = self.infer_expr(left, ctx)?;
                    let right_ty = self.infer_expr(right, ctx)?;
                    if left_ty == Type::Float || right_ty == Type::Float {
                        Some(Type::Float)
                    } else if left_ty == Type::Int && right_ty == Type::Int {
                        Some(Type::Int)
                    } else {
                        None
                    }
                } else {
                    Some(Type::Bool)
                }
            }
            Expr::Not(_, _) => Some(Type::Bool),
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt, ctx: Option<&Function>) -> Result<(), Diagnostic<FileId>> {
        match stmt {
            Stmt::VarDecl { init, .. } => {
                if let Some(init) = init {
                    self.check_expr(init, ctx)?;
                }
                Ok(())
            }
            Stmt::Assign { name, value, span } => {
                if self.lookup_variable_type(name, ctx).is_none() {
                    return self.error(&format!("Variable '{}' not declared", name), *span);
                }
                self.check_expr(value, ctx)?;
                Ok(())
            }
            Stmt::Say(expr, _) => {
                self.check_expr(expr, ctx)?;
                Ok(())
            }
            Stmt::Hear { name, span } => {
                if self.lookup_variable_type(name, ctx).is_none() {
                    return self.error(&format!("Variable '{}' not declared", name), *span);
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_expr(cond, ctx)?;
                for stmt in then_branch {
                    self.check_stmt(stmt, ctx)?;
                }
                if let Some(block) = else_branch {
                    for stmt in block {
                        self.check_stmt(stmt, ctx)?;
                    }
                }
                Ok(())
            }
            Stmt::Return { value, .. } => {
                self.check_expr(value, ctx)?;
                Ok(())
            }
            Stmt::ExprStmt(expr) => {
                self.check_expr(expr, ctx)?;
                Ok(())
            }
        }
    }

    /// Full expression typing. Every visited node lands in the side-table,
    /// and unresolved references are fatal here.
    fn check_expr(&mut self, expr: &Expr, ctx: Option<&Function>) -> Result<Type, Diagnostic<FileId>> {
        let ty = match expr {
            Expr::Int(_, _) => Type::Int,
            Expr::Float(_, _) => Type::Float,
            Expr::Str(_, _) => Type::String,
            Expr::Bool(_, _) => Type::Bool,
            Expr::Var(name, info) => match self.lookup_variable_type(name, ctx) {
                Some(ty) => ty,
                None => {
                    return self.error(&format!("Variable '{}' not declared", name), info.span);
                }
            },
            Expr::Call(name, args, info) => {
                for arg in args {
                    self.check_expr(arg, ctx)?;
                }
                if self.function(name).is_none() {
                    return self.error(&format!("Function '{}' not defined", name), info.span);
                }
                self.return_type(name)
            }
            Expr::BinOp(left, op, right, info) => {
                let left_ty = self.check_expr(left, ctx)?;
                let right_ty = self.check_expr(right, ctx)?;
                if op.is_arithmetic() {
                    if left_ty == Type::Float || right_ty == Type::Float {
                        Type::Float
                    } else if left_ty == Type::Int && right_ty == Type::Int {
                        Type::Int
                    } else {
                        return self.error(
                            &format!(
                                "Incompatible operand types for arithmetic: {} and {}",
                                left_ty, right_ty
                            ),
                            info.span,
                        );
                    }
                } else {
                    Type::Bool
                }
            }
            Expr::Not(operand, _) => {
                self.check_expr(operand, ctx)?;
                Type::Bool
            }
        };

        self.expr_types.insert(expr.id(), ty.clone());
        Ok(ty)
    }

    /// Scope resolution order: current function parameters, then the
    /// global symbol cache, then a scan of the raw global declarations
    /// that registers into the cache on first hit.
    pub fn lookup_variable_type(&self, name: &str, ctx: Option<&Function>) -> Option<Type> {
        if let Some(function) = ctx {
            if let Some(param) = function.params.iter().find(|p| p.name == name) {
                return Some(param.ty.clone());
            }
        }

        if let Some(ty) = self.globals.borrow().get(name) {
            return Some(ty.clone());
        }

        for stmt in &self.program.stmts {
            if let Stmt::VarDecl { name: decl_name, ty, .. } = stmt {
                if decl_name == name {
                    self.globals
                        .borrow_mut()
                        .insert(decl_name.clone(), ty.clone());
                    return Some(ty.clone());
                }
            }
        }

        None
    }

    /// First-match lookup over the function table.
    pub fn function(&self, name: &str) -> Option<&'a Function> {
        self.program.functions.iter().find(|f| f.name == name)
    }

    /// Resolved return type of a function, after inference. `text` never
    /// shows up here: the type model folds it into string at parse time.
    pub fn return_type(&self, name: &str) -> Type {
        self.fn_types.get(name).cloned().unwrap_or(Type::Void)
    }

    /// Side-table lookup for an expression node visited by `resolve`.
    pub fn type_of(&self, id: NodeId) -> Type {
        self.expr_types.get(&id).cloned().unwrap_or(Type::Unknown)
    }

    fn error<T>(&self, message: &str, span: Span) -> Result<T, Diagnostic<FileId>> {
        Err(Diagnostic::error()
            .with_message(message)
            .with_labels(vec![Label::primary(self.file_id, span)]))
    }
}
