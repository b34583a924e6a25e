use super::CompileError;
use crate::ast::{Expr, Function, Program, Stmt, Type};
use crate::typeck::Resolver;
use codespan::FileId;
use std::path::Path;

/// Serializes a resolved program to a C translation unit, in a fixed
/// order: preamble, prototypes, zero-initialized globals, function
/// bodies, then a synthesized `main` that runs every global statement in
/// source order and frees the string globals at the end.
pub struct CBackend<'a> {
    resolver: &'a Resolver<'a>,
    file_id: FileId,
    header: String,
    body: String,
}

impl<'a> CBackend<'a> {
    pub fn new(resolver: &'a Resolver<'a>, file_id: FileId) -> Self {
        Self {
            resolver,
            file_id,
            header: String::new(),
            body: String::new(),
        }
    }

    pub fn compile(&mut self, program: &Program, output_path: &Path) -> Result<(), CompileError> {
        let code = self.generate(program)?;
        std::fs::write(output_path, code)?;
        Ok(())
    }

    pub fn generate(&mut self, program: &Program) -> Result<String, CompileError> {
        self.header.clear();
        self.body.clear();

        self.emit_preamble();
        self.emit_prototypes(program);
        self.emit_globals(program);

        for function in &program.functions {
            self.emit_function(function)?;
        }
        self.emit_main(program)?;

        Ok(format!("{}{}", self.header, self.body))
    }

    fn emit_preamble(&mut self) {
        self.header.push_str("/* Generated by the Sauce compiler */\n");
        // strdup needs the POSIX feature flag under -std=c11.
        self.header.push_str("#ifndef _POSIX_C_SOURCE\n");
        self.header.push_str("#define _POSIX_C_SOURCE 200809L\n");
        self.header.push_str("#endif\n");
        self.header.push_str("#include <stdio.h>\n");
        self.header.push_str("#include <stdlib.h>\n");
        self.header.push_str("#include <string.h>\n\n");
    }

    fn emit_prototypes(&mut self, program: &Program) {
        for function in &program.functions {
            let params = function
                .params
                .iter()
                .map(|p| c_type(&p.ty))
                .collect::<Vec<_>>()
                .join(", ");
            self.header.push_str(&format!(
                "{} {}({});\n",
                c_type(&self.resolver.return_type(&function.name)),
                c_name(&function.name),
                params
            ));
        }
        if !program.functions.is_empty() {
            self.header.push('\n');
        }
    }

    /// Globals are declared zero/NULL-initialized; their actual
    /// initializer values run inside `main`, in source order.
    fn emit_globals(&mut self, program: &Program) {
        let mut any = false;
        for stmt in &program.stmts {
            if let Stmt::VarDecl { name, ty, .. } = stmt {
                self.header.push_str(&format!(
                    "{} {} = {};\n",
                    c_type(ty),
                    c_name(name),
                    zero_value(ty)
                ));
                any = true;
            }
        }
        if any {
            self.header.push('\n');
        }
    }

    fn emit_function(&mut self, function: &Function) -> Result<(), CompileError> {
        let return_type = self.resolver.return_type(&function.name);
        let params = function
            .params
            .iter()
            .map(|p| format!("{} {}", c_type(&p.ty), c_name(&p.name)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = String::new();
        out.push_str(&format!(
            "{} {}({}) {{\n",
            c_type(&return_type),
            c_name(&function.name),
            params
        ));

        for stmt in &function.body {
            self.emit_stmt(stmt, Some(function), 1, &mut out)?;
        }

        // The body is not proven to reach a return on every path, so a
        // non-void function that does not literally end in one gets a
        // zero-valued fallback.
        let ends_in_return = matches!(function.body.last(), Some(Stmt::Return { .. }));
        if return_type != Type::Void && !ends_in_return {
            out.push_str(&format!("    return {};\n", zero_value(&return_type)));
        }

        out.push_str("}\n\n");
        self.body.push_str(&out);
        Ok(())
    }

    fn emit_main(&mut self, program: &Program) -> Result<(), CompileError> {
        let mut out = String::new();
        out.push_str("int main(void) {\n");

        for stmt in &program.stmts {
            match stmt {
                Stmt::VarDecl { name, ty, init, .. } => {
                    if let Some(init) = init {
                        let value = self.emit_expr(init, None);
                        self.emit_assignment(name, ty, &value, 1, &mut out);
                    }
                }
                _ => self.emit_stmt(stmt, None, 1, &mut out)?,
            }
        }

        for stmt in &program.stmts {
            if let Stmt::VarDecl { name, ty: Type::String, .. } = stmt {
                let name = c_name(name);
                out.push_str(&format!("    if ({} != NULL) free({});\n", name, name));
            }
        }

        out.push_str("    return 0;\n");
        out.push_str("}\n");
        self.body.push_str(&out);
        Ok(())
    }

    fn emit_stmt(
        &self,
        stmt: &Stmt,
        ctx: Option<&Function>,
        indent: usize,
        out: &mut String,
    ) -> Result<(), CompileError> {
        let pad = "    ".repeat(indent);
        match stmt {
            Stmt::VarDecl { name, ty, init, .. } => {
                let name = c_name(name);
                match init {
                    Some(init) => {
                        let value = self.emit_expr(init, ctx);
                        if *ty == Type::String {
                            // A fresh binding owns a duplicated buffer
                            // from its first assignment.
                            out.push_str(&format!(
                                "{}{} {} = strdup({});\n",
                                pad,
                                c_type(ty),
                                name,
                                value
                            ));
                        } else {
                            out.push_str(&format!(
                                "{}{} {} = {};\n",
                                pad,
                                c_type(ty),
                                name,
                                value
                            ));
                        }
                    }
                    None => {
                        out.push_str(&format!(
                            "{}{} {} = {};\n",
                            pad,
                            c_type(ty),
                            name,
                            zero_value(ty)
                        ));
                    }
                }
                Ok(())
            }
            Stmt::Assign { name, value, span } => {
                let ty = self
                    .resolver
                    .lookup_variable_type(name, ctx)
                    .ok_or_else(|| CompileError::CodegenError {
                        message: format!("Unknown type for variable '{}'", name),
                        span: Some(*span),
                        file_id: self.file_id,
                    })?;
                let value = self.emit_expr(value, ctx);
                self.emit_assignment(name, &ty, &value, indent, out);
                Ok(())
            }
            Stmt::Say(expr, _) => {
                let value = self.emit_expr(expr, ctx);
                match self.resolver.type_of(expr.id()) {
                    Type::Int => out.push_str(&format!("{}printf(\"%d\\n\", {});\n", pad, value)),
                    Type::Float => out.push_str(&format!("{}printf(\"%f\\n\", {});\n", pad, value)),
                    Type::String => {
                        out.push_str(&format!("{}printf(\"%s\\n\", {});\n", pad, value))
                    }
                    Type::Bool => out.push_str(&format!(
                        "{}printf(\"%s\\n\", ({}) ? \"true\" : \"false\");\n",
                        pad, value
                    )),
                    _ => out.push_str(&format!("{}printf(\"UNKNOWN_TYPE\\n\");\n", pad)),
                }
                Ok(())
            }
            Stmt::Hear { name, span } => {
                let ty = self
                    .resolver
                    .lookup_variable_type(name, ctx)
                    .ok_or_else(|| CompileError::CodegenError {
                        message: format!("Unknown type for variable '{}'", name),
                        span: Some(*span),
                        file_id: self.file_id,
                    })?;
                self.emit_hear(&c_name(name), &ty, &pad, out);
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.emit_expr(cond, ctx);
                out.push_str(&format!("{}if ({}) {{\n", pad, cond));
                for stmt in then_branch {
                    self.emit_stmt(stmt, ctx, indent + 1, out)?;
                }
                if let Some(block) = else_branch {
                    out.push_str(&format!("{}}} else {{\n", pad));
                    for stmt in block {
                        self.emit_stmt(stmt, ctx, indent + 1, out)?;
                    }
                }
                out.push_str(&format!("{}}}\n", pad));
                Ok(())
            }
            Stmt::Return { cast, value, .. } => {
                let value = self.emit_expr(value, ctx);
                match cast {
                    Some(ty) => {
                        out.push_str(&format!("{}return ({}){};\n", pad, c_type(ty), value))
                    }
                    None => out.push_str(&format!("{}return {};\n", pad, value)),
                }
                Ok(())
            }
            Stmt::ExprStmt(expr) => {
                let value = self.emit_expr(expr, ctx);
                out.push_str(&format!("{}{};\n", pad, value));
                Ok(())
            }
        }
    }

    /// Assignment to an already-declared variable. String targets free
    /// their previous buffer and own a fresh duplicate of the new value.
    fn emit_assignment(&self, name: &str, ty: &Type, value: &str, indent: usize, out: &mut String) {
        let pad = "    ".repeat(indent);
        let name = c_name(name);
        if *ty == Type::String {
            out.push_str(&format!("{}if ({} != NULL) free({});\n", pad, name, name));
            out.push_str(&format!("{}{} = strdup({});\n", pad, name, value));
        } else {
            out.push_str(&format!("{}{} = {};\n", pad, name, value));
        }
    }

    fn emit_hear(&self, name: &str, ty: &Type, pad: &str, out: &mut String) {
        out.push_str(&format!("{}printf(\"\\n> \");\n", pad));
        match ty {
            Type::Int | Type::Bool => {
                out.push_str(&format!("{}if (scanf(\"%d\", &{}) != 1) {{ }}\n", pad, name));
                self.emit_line_flush(pad, out);
            }
            Type::Float => {
                out.push_str(&format!("{}if (scanf(\"%lf\", &{}) != 1) {{ }}\n", pad, name));
                self.emit_line_flush(pad, out);
            }
            Type::String => {
                // Skip whitespace a previous numeric read may have left
                // buffered, then take the rest of the line.
                out.push_str(&format!("{}{{\n", pad));
                out.push_str(&format!("{}    int _c = getchar();\n", pad));
                out.push_str(&format!(
                    "{}    while (_c == ' ' || _c == '\\t' || _c == '\\n') _c = getchar();\n",
                    pad
                ));
                out.push_str(&format!("{}    if (_c != EOF) ungetc(_c, stdin);\n", pad));
                out.push_str(&format!("{}    char _buf[1024];\n", pad));
                out.push_str(&format!(
                    "{}    if (!fgets(_buf, sizeof(_buf), stdin)) _buf[0] = '\\0';\n",
                    pad
                ));
                out.push_str(&format!(
                    "{}    _buf[strcspn(_buf, \"\\n\")] = '\\0';\n",
                    pad
                ));
                out.push_str(&format!(
                    "{}    if ({} != NULL) free({});\n",
                    pad, name, name
                ));
                out.push_str(&format!("{}    {} = strdup(_buf);\n", pad, name));
                out.push_str(&format!("{}}}\n", pad));
            }
            _ => {}
        }
    }

    /// Discard the remainder of the input line after a numeric scan.
    fn emit_line_flush(&self, pad: &str, out: &mut String) {
        out.push_str(&format!(
            "{}{{ int _c = getchar(); while (_c != '\\n' && _c != EOF) _c = getchar(); }}\n",
            pad
        ));
    }

    fn emit_expr(&self, expr: &Expr, ctx: Option<&Function>) -> String {
        match expr {
            Expr::Int(value, _) => value.to_string(),
            Expr::Float(value, _) => format!("{:?}", value),
            Expr::Str(value, _) => format!("\"{}\"", value),
            Expr::Bool(value, _) => (if *value { "1" } else { "0" }).to_string(),
            Expr::Var(name, _) => c_name(name),
            Expr::Call(name, args, _) => {
                let args = args
                    .iter()
                    .map(|arg| self.emit_expr(arg, ctx))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({})", c_name(name), args)
            }
            Expr::BinOp(left, op, right, _) => {
                format!(
                    "({} {} {})",
                    self.emit_expr(left, ctx),
                    op,
                    self.emit_expr(right, ctx)
                )
            }
            Expr::Not(operand, _) => format!("(!{})", self.emit_expr(operand, ctx)),
        }
    }
}

fn c_type(ty: &Type) -> &'static str {
    match ty {
        Type::Int => "int",
        Type::Float => "double",
        Type::String => "char*",
        Type::Bool => "int",
        _ => "void",
    }
}

fn zero_value(ty: &Type) -> &'static str {
    match ty {
        Type::Float => "0.0",
        Type::String => "NULL",
        _ => "0",
    }
}

/// User symbols named `main` are renamed so they cannot collide with the
/// synthesized entry point.
fn c_name(name: &str) -> String {
    if name == "main" {
        "sauce_main".to_string()
    } else {
        name.to_string()
    }
}
