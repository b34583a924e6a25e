use codespan::{FileId, Files, Span};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    #[token("fn")]
    KwFn,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("return")]
    KwReturn,
    #[token("say")]
    KwSay,
    #[token("hear")]
    KwHear,
    #[token("and")]
    KwAnd,
    #[token("or")]
    KwOr,
    #[token("not")]
    KwNot,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,

    #[token("int")]
    TyInt,
    #[token("float")]
    TyFloat,
    #[token("text")]
    TyText,
    #[token("string")]
    TyString,
    #[token("boolean")]
    TyBoolean,
    #[token("bool")]
    TyBool,

    // Quotes are stripped here; the emitter re-adds them exactly once.
    #[regex(r#""[^"\n]*""#, |lex| lex.slice()[1..lex.slice().len()-1].to_string())]
    Str(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token(">=")]
    GtEq,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    #[token("\n")]
    Newline,

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse().ok())]
    Float(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse().ok())]
    Int(i64),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[ \t\r\f]+", logos::skip)]
    Whitespace,

    Error,
}

pub struct Lexer<'a> {
    pub(crate) files: &'a Files<String>,
    pub(crate) file_id: FileId,
}

impl<'a> Lexer<'a> {
    pub fn new(files: &'a Files<String>, file_id: FileId) -> Self {
        Self { files, file_id }
    }

    /// Tokenizes the whole source. The first unrecognized piece of input
    /// aborts the scan with a diagnostic pointing at it.
    pub fn tokens(&self) -> Result<Vec<(Token, Span)>, Diagnostic<FileId>> {
        let source = self.files.source(self.file_id);
        let mut tokens = Vec::new();

        for (token, range) in Token::lexer(source).spanned() {
            let span = Span::new(range.start as u32, range.end as u32);
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => return Err(self.classify_error(&source[range], span)),
            }
        }

        Ok(tokens)
    }

    fn classify_error(&self, slice: &str, span: Span) -> Diagnostic<FileId> {
        let message = match slice.chars().next() {
            Some('"') => "Unterminated string literal".to_string(),
            Some('&') => "Invalid operator '&'. Use the keyword 'and'".to_string(),
            Some('|') => "Invalid operator '|'. Use the keyword 'or'".to_string(),
            Some('!') => "Invalid character '!' (only '!=' is supported)".to_string(),
            Some(c) => format!("Invalid character '{}'", c),
            None => "Invalid input".to_string(),
        };

        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![Label::primary(self.file_id, span)])
    }
}
