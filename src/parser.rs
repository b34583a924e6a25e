use super::{ast, lexer::{Lexer, Token}};
use codespan::{FileId, Files, Span};
use codespan_reporting::diagnostic::Diagnostic;

pub struct Parser<'a> {
    tokens: Vec<(Token, Span)>,
    current: usize,
    #[allow(dead_code)]
    files: &'a Files<String>,
    file_id: FileId,
    next_id: u32,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Result<Self, Diagnostic<FileId>> {
        Ok(Self {
            tokens: lexer.tokens()?,
            current: 0,
            files: lexer.files,
            file_id: lexer.file_id,
            next_id: 0,
        })
    }

    pub fn parse(&mut self) -> Result<ast::Program, Diagnostic<FileId>> {
        let mut program = ast::Program {
            functions: Vec::new(),
            stmts: Vec::new(),
        };

        self.skip_newlines();
        while !self.is_at_end() {
            if self.check(Token::KwFn) {
                program.functions.push(self.parse_function()?);
            } else {
                program.stmts.push(self.parse_stmt()?);
            }
            self.skip_newlines();
        }

        Ok(program)
    }

    fn parse_function(&mut self) -> Result<ast::Function, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwFn, "Expected 'fn'")?;
        let (name, _) = self.consume_ident()?;

        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(Token::RParen) {
            loop {
                let (param_name, param_span) = self.consume_ident()?;
                self.expect(Token::LBracket)?;
                let ty = self.parse_type()?;
                self.expect(Token::RBracket)?;
                params.push(ast::Param {
                    name: param_name,
                    ty,
                    span: param_span,
                });

                if self.check(Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        // Optional bracketed return type; absent means inferred.
        let return_type = if self.check(Token::LBracket) {
            self.advance();
            let ty = self.parse_type()?;
            self.expect(Token::RBracket)?;
            ty
        } else {
            ast::Type::Void
        };

        let body = self.parse_block()?;
        self.expect_terminator()?;

        Ok(ast::Function {
            name,
            params,
            return_type,
            body,
            span: start_span,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<ast::Stmt>, Diagnostic<FileId>> {
        self.expect(Token::LBrace)?;
        self.skip_newlines();

        let mut stmts = Vec::new();
        while !self.check(Token::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        self.expect(Token::RBrace)?;

        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        match self.peek_token() {
            Token::KwIf => self.parse_if(),
            Token::KwReturn => self.parse_return(),
            Token::KwSay => self.parse_say(),
            Token::KwHear => self.parse_hear(),
            Token::KwFn => self.error("Function definitions are only allowed at the top level", self.peek_span()),
            Token::Ident(_) => self.parse_ident_stmt(),
            _ => self.error("Expected statement", self.peek_span()),
        }
    }

    /// A statement opening with an identifier is a declaration (`x[int]`),
    /// an assignment (`x = ...`) or a bare call (`x(...)`). Anything else
    /// after the name is a parse error.
    fn parse_ident_stmt(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let (name, name_span) = self.consume_ident()?;

        match self.peek_token() {
            Token::LBracket => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(Token::RBracket)?;

                let init = if self.check(Token::Eq) {
                    self.advance();
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                self.expect_terminator()?;

                Ok(ast::Stmt::VarDecl {
                    name,
                    ty,
                    init,
                    span: name_span,
                })
            }
            Token::Eq => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect_terminator()?;

                Ok(ast::Stmt::Assign {
                    name,
                    value,
                    span: name_span,
                })
            }
            Token::LParen => {
                let args = self.parse_call_args()?;
                let call = ast::Expr::Call(name, args, self.expr_info(name_span));
                self.expect_terminator()?;

                Ok(ast::Stmt::ExprStmt(call))
            }
            _ => self.error(
                &format!("Expected '[', '=' or '(' after '{}'", name),
                self.peek_span(),
            ),
        }
    }

    fn parse_say(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwSay, "Expected 'say'")?;
        self.expect(Token::LParen)?;
        let expr = self.parse_expr()?;
        self.expect(Token::RParen)?;
        self.expect_terminator()?;

        Ok(ast::Stmt::Say(expr, start_span))
    }

    fn parse_hear(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwHear, "Expected 'hear'")?;
        self.expect(Token::LParen)?;
        let (name, _) = self.consume_ident()?;
        self.expect(Token::RParen)?;
        self.expect_terminator()?;

        Ok(ast::Stmt::Hear {
            name,
            span: start_span,
        })
    }

    fn parse_return(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwReturn, "Expected 'return'")?;

        // `return[type] expr` forces a cast in the generated code and
        // pins the inferred return type.
        let cast = if self.check(Token::LBracket) {
            self.advance();
            let ty = self.parse_type()?;
            self.expect(Token::RBracket)?;
            Some(ty)
        } else {
            None
        };

        let value = self.parse_expr()?;
        self.expect_terminator()?;

        Ok(ast::Stmt::Return {
            cast,
            value,
            span: start_span,
        })
    }

    fn parse_if(&mut self) -> Result<ast::Stmt, Diagnostic<FileId>> {
        let start_span = self.consume(Token::KwIf, "Expected 'if'")?;
        self.expect(Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen)?;

        let then_branch = self.parse_block()?;

        // `else` may open on the same line as the closing brace or on
        // the next one.
        let checkpoint = self.current;
        self.skip_newlines();
        let else_branch = if self.check(Token::KwElse) {
            self.advance();
            if self.check(Token::KwIf) {
                Some(vec![self.parse_if()?])
            } else {
                let block = self.parse_block()?;
                self.expect_terminator()?;
                Some(block)
            }
        } else {
            self.current = checkpoint;
            self.expect_terminator()?;
            None
        };

        Ok(ast::Stmt::If {
            cond,
            then_branch,
            else_branch,
            span: start_span,
        })
    }

    fn parse_type(&mut self) -> Result<ast::Type, Diagnostic<FileId>> {
        let next = self.advance().map(|(t, s)| (t.clone(), *s));

        match next {
            Some((Token::TyInt, _)) => Ok(ast::Type::Int),
            Some((Token::TyFloat, _)) => Ok(ast::Type::Float),
            Some((Token::TyText, _)) | Some((Token::TyString, _)) => Ok(ast::Type::String),
            Some((Token::TyBoolean, _)) | Some((Token::TyBool, _)) => Ok(ast::Type::Bool),
            Some((_, span)) => self.error("Expected type name", span),
            None => self.error("Expected type name", Span::new(0, 0)),
        }
    }

    // --- Expressions ---
    //
    // One level per precedence tier, lowest binding first. Comparison
    // deliberately does not loop: `a < b < c` is rejected.

    fn parse_expr(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        self.parse_logic()
    }

    fn parse_logic(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.peek_token() {
                Token::KwAnd => ast::BinOp::And,
                Token::KwOr => ast::BinOp::Or,
                _ => break,
            };
            let op_span = self.peek_span();
            self.advance();
            let right = self.parse_comparison()?;
            left = ast::Expr::BinOp(
                Box::new(left),
                op,
                Box::new(right),
                self.expr_info(op_span),
            );
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let left = self.parse_additive()?;

        let op = match self.peek_token() {
            Token::Gt => ast::BinOp::Gt,
            Token::Lt => ast::BinOp::Lt,
            Token::GtEq => ast::BinOp::GtEq,
            Token::LtEq => ast::BinOp::LtEq,
            Token::EqEq => ast::BinOp::Eq,
            Token::NotEq => ast::BinOp::NotEq,
            _ => return Ok(left),
        };
        let op_span = self.peek_span();
        self.advance();
        let right = self.parse_additive()?;

        Ok(ast::Expr::BinOp(
            Box::new(left),
            op,
            Box::new(right),
            self.expr_info(op_span),
        ))
    }

    fn parse_additive(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek_token() {
                Token::Plus => ast::BinOp::Add,
                Token::Minus => ast::BinOp::Sub,
                _ => break,
            };
            let op_span = self.peek_span();
            self.advance();
            let right = self.parse_term()?;
            left = ast::Expr::BinOp(
                Box::new(left),
                op,
                Box::new(right),
                self.expr_info(op_span),
            );
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek_token() {
                Token::Star => ast::BinOp::Mul,
                Token::Slash => ast::BinOp::Div,
                _ => break,
            };
            let op_span = self.peek_span();
            self.advance();
            let right = self.parse_unary()?;
            left = ast::Expr::BinOp(
                Box::new(left),
                op,
                Box::new(right),
                self.expr_info(op_span),
            );
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        if self.check(Token::KwNot) {
            let op_span = self.peek_span();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(ast::Expr::Not(Box::new(operand), self.expr_info(op_span)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<ast::Expr, Diagnostic<FileId>> {
        let next = self.advance().map(|(t, s)| (t.clone(), *s));

        match next {
            Some((Token::Int(value), span)) => Ok(ast::Expr::Int(value, self.expr_info(span))),
            Some((Token::Float(value), span)) => Ok(ast::Expr::Float(value, self.expr_info(span))),
            Some((Token::Str(value), span)) => Ok(ast::Expr::Str(value, self.expr_info(span))),
            Some((Token::KwTrue, span)) => Ok(ast::Expr::Bool(true, self.expr_info(span))),
            Some((Token::KwFalse, span)) => Ok(ast::Expr::Bool(false, self.expr_info(span))),
            Some((Token::Ident(name), span)) => {
                if self.check(Token::LParen) {
                    let args = self.parse_call_args()?;
                    Ok(ast::Expr::Call(name, args, self.expr_info(span)))
                } else {
                    Ok(ast::Expr::Var(name, self.expr_info(span)))
                }
            }
            Some((Token::LParen, _)) => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some((_, span)) => self.error("Expected expression", span),
            None => self.error("Expected expression", Span::new(0, 0)),
        }
    }

    fn parse_call_args(&mut self) -> Result<Vec<ast::Expr>, Diagnostic<FileId>> {
        self.expect(Token::LParen)?;

        let mut args = Vec::new();
        if !self.check(Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.check(Token::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        Ok(args)
    }

    // --- Token plumbing ---

    fn expr_info(&mut self, span: Span) -> ast::ExprInfo {
        let id = ast::NodeId(self.next_id);
        self.next_id += 1;
        ast::ExprInfo { id, span }
    }

    /// Every statement ends at a newline, a closing brace or the end of
    /// input. The brace is left for the block parser to consume.
    fn expect_terminator(&mut self) -> Result<(), Diagnostic<FileId>> {
        if self.check(Token::Newline) {
            self.skip_newlines();
            Ok(())
        } else if self.check(Token::RBrace) || self.is_at_end() {
            Ok(())
        } else {
            self.error("Expected end of statement", self.peek_span())
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(Token::Newline) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        matches!(self.peek(), Some((t, _)) if *t == token)
    }

    fn advance(&mut self) -> Option<&(Token, Span)> {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn previous(&self) -> Option<&(Token, Span)> {
        if self.current > 0 {
            self.tokens.get(self.current - 1)
        } else {
            None
        }
    }

    fn peek(&self) -> Option<&(Token, Span)> {
        self.tokens.get(self.current)
    }

    fn peek_token(&self) -> Token {
        self.peek().map(|(t, _)| t.clone()).unwrap_or(Token::Error)
    }

    fn peek_span(&self) -> Span {
        self.peek().map(|(_, s)| *s).unwrap_or(Span::new(0, 0))
    }

    fn expect(&mut self, token: Token) -> Result<Span, Diagnostic<FileId>> {
        if self.check(token.clone()) {
            let span = self.peek_span();
            self.advance();
            Ok(span)
        } else {
            self.error(&format!("Expected {:?}", token), self.peek_span())
        }
    }

    fn consume(&mut self, expected: Token, err_msg: &str) -> Result<Span, Diagnostic<FileId>> {
        if self.check(expected) {
            let span = self.peek_span();
            self.advance();
            Ok(span)
        } else {
            self.error(err_msg, self.peek_span())
        }
    }

    fn consume_ident(&mut self) -> Result<(String, Span), Diagnostic<FileId>> {
        let token = self.advance().cloned();
        match token.as_ref() {
            Some((Token::Ident(name), span)) => Ok((name.clone(), *span)),
            Some((_, span)) => self.error("Expected identifier", *span),
            None => self.error("Expected identifier", Span::new(0, 0)),
        }
    }

    fn error<T>(&self, message: &str, span: Span) -> Result<T, Diagnostic<FileId>> {
        Err(Diagnostic::error()
            .with_message(message)
            .with_labels(vec![codespan_reporting::diagnostic::Label::primary(self.file_id, span)]))
    }
}
