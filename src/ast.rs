use codespan::Span;
use std::fmt;

/// Stable identity of an expression node, assigned by the parser.
/// The resolver keys its type side-table on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
    Void,
    Unknown,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Bool => write!(f, "boolean"),
            Type::Void => write!(f, "void"),
            Type::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<Function>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Vec<Stmt>,
    #[allow(dead_code)]
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    #[allow(dead_code)]
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl {
        name: String,
        ty: Type,
        init: Option<Expr>,
        span: Span,
    },
    Assign {
        name: String,
        value: Expr,
        span: Span,
    },
    Say(Expr, Span),
    Hear {
        name: String,
        span: Span,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    Return {
        cast: Option<Type>,
        value: Expr,
        span: Span,
    },
    ExprStmt(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl { span, .. } => *span,
            Stmt::Assign { span, .. } => *span,
            Stmt::Say(_, span) => *span,
            Stmt::Hear { span, .. } => *span,
            Stmt::If { span, .. } => *span,
            Stmt::Return { span, .. } => *span,
            Stmt::ExprStmt(expr) => expr.span(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExprInfo {
    pub id: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Int(i64, ExprInfo),
    Float(f64, ExprInfo),
    Str(String, ExprInfo),
    Bool(bool, ExprInfo),
    Var(String, ExprInfo),
    Call(String, Vec<Expr>, ExprInfo),
    BinOp(Box<Expr>, BinOp, Box<Expr>, ExprInfo),
    Not(Box<Expr>, ExprInfo),
}

impl Expr {
    pub fn info(&self) -> ExprInfo {
        match self {
            Expr::Int(_, info) => *info,
            Expr::Float(_, info) => *info,
            Expr::Str(_, info) => *info,
            Expr::Bool(_, info) => *info,
            Expr::Var(_, info) => *info,
            Expr::Call(_, _, info) => *info,
            Expr::BinOp(_, _, _, info) => *info,
            Expr::Not(_, info) => *info,
        }
    }

    pub fn id(&self) -> NodeId {
        self.info().id
    }

    pub fn span(&self) -> Span {
        self.info().span
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
            BinOp::GtEq => ">=",
            BinOp::LtEq => "<=",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{}", op)
    }
}
