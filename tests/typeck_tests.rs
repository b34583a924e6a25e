use codespan::{FileId, Files};
use sauce::ast::{Program, Stmt, Type};
use sauce::lexer::Lexer;
use sauce::parser::Parser;
use sauce::typeck::Resolver;

fn parse(source: &str) -> (Program, FileId) {
    let mut files = Files::new();
    let file_id = files.add("test", source.to_string());
    let lexer = Lexer::new(&files, file_id);
    let mut parser = Parser::new(lexer).unwrap();
    (parser.parse().unwrap(), file_id)
}

fn resolve_error(source: &str) -> String {
    let (program, file_id) = parse(source);
    let mut resolver = Resolver::new(&program, file_id);
    resolver.resolve().unwrap_err().message
}

/// Type recorded for the initializer of the first global declaration.
fn init_type(source: &str) -> Type {
    let (program, file_id) = parse(source);
    let mut resolver = Resolver::new(&program, file_id);
    resolver.resolve().unwrap();

    match &program.stmts[0] {
        Stmt::VarDecl { init: Some(init), .. } => resolver.type_of(init.id()),
        other => panic!("expected declaration with initializer, got {:?}", other),
    }
}

fn resolved_return_type(source: &str, name: &str) -> Type {
    let (program, file_id) = parse(source);
    let mut resolver = Resolver::new(&program, file_id);
    resolver.resolve().unwrap();
    resolver.return_type(name)
}

#[test]
fn test_int_arithmetic_stays_int() {
    assert_eq!(init_type("x[int] = 1 + 2\n"), Type::Int);
}

#[test]
fn test_float_operand_promotes() {
    assert_eq!(init_type("x[float] = 1 + 2.5\n"), Type::Float);
    assert_eq!(init_type("x[float] = 2.5 * 2\n"), Type::Float);
}

#[test]
fn test_string_arithmetic_is_an_error() {
    assert!(resolve_error("x[int] = \"a\" + 1\n").contains("Incompatible"));
}

#[test]
fn test_bool_arithmetic_is_an_error() {
    assert!(resolve_error("x[int] = true + 1\n").contains("Incompatible"));
}

#[test]
fn test_comparison_yields_bool() {
    assert_eq!(init_type("b[boolean] = 1 < 2\n"), Type::Bool);
    assert_eq!(init_type("b[boolean] = 1.5 == 1.5\n"), Type::Bool);
}

#[test]
fn test_logical_operators_yield_bool() {
    assert_eq!(init_type("b[boolean] = true and false\n"), Type::Bool);
    assert_eq!(init_type("b[boolean] = not true\n"), Type::Bool);
}

#[test]
fn test_undeclared_variable() {
    assert!(resolve_error("say(y)\n").contains("'y' not declared"));
}

#[test]
fn test_assignment_to_undeclared_variable() {
    assert!(resolve_error("y = 1\n").contains("'y' not declared"));
}

#[test]
fn test_hear_into_undeclared_variable() {
    assert!(resolve_error("hear(y)\n").contains("'y' not declared"));
}

#[test]
fn test_undefined_function_call() {
    assert!(resolve_error("foo()\n").contains("'foo' not defined"));
}

#[test]
fn test_return_type_inferred_from_literal() {
    let source = "fn f() {\n    return 3.5\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Float);
}

#[test]
fn test_return_type_from_agreeing_if_branches() {
    let source = "fn f() {\n    if (1 > 2) {\n        return 1\n    } else {\n        return 2\n    }\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Int);
}

#[test]
fn test_disagreeing_if_branches_stay_void() {
    let source = "fn f() {\n    if (1 > 2) {\n        return 1\n    } else {\n        return 2.5\n    }\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Void);
}

#[test]
fn test_inference_through_call_chain() {
    let source = "fn a() {\n    return b()\n}\nfn b() {\n    return 7\n}\n";
    assert_eq!(resolved_return_type(source, "a"), Type::Int);
    assert_eq!(resolved_return_type(source, "b"), Type::Int);
}

#[test]
fn test_declared_text_resolves_to_string() {
    let source = "fn f() [text] {\n    return \"x\"\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::String);
}

#[test]
fn test_explicit_return_annotation_pins_inference() {
    let source = "fn f() {\n    return[int] 2.5\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Int);
}

#[test]
fn test_parameter_scope() {
    let source = "fn f(x[float]) {\n    return x\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Float);
}

#[test]
fn test_global_scope_visible_inside_functions() {
    let source = "g[float] = 1.5\nfn f() {\n    return g\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Float);
}

#[test]
fn test_parameter_shadows_global() {
    let source = "x[float] = 1.5\nfn f(x[int]) {\n    return x\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Int);
}

#[test]
fn test_call_expression_takes_callee_type() {
    let source = "fn f() [int] {\n    return 1\n}\nx[int] = f() + 1\n";
    assert_eq!(init_type(source), Type::Int);
}

#[test]
fn test_duplicate_function_first_match_wins() {
    let source = "fn f() [int] {\n    return 1\n}\nfn f() [float] {\n    return 1.5\n}\n";
    assert_eq!(resolved_return_type(source, "f"), Type::Int);
}
