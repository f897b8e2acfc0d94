//! Input validation and degradation policy: malformed CFGs are rejected
//! up front, while in-language protocol violations and unsupported
//! constructs degrade the result and keep the analysis running.

mod common;

use absint_core::{
    AnalysisError, Analyzer, DiagnosticKind, Expr, FunctionBuilder, GlobalDecl, Place, Program,
    ResourceDecl, Statement, Verdict,
};
use common::{eq, loc};
use pretty_assertions::assert_eq;

#[test]
fn test_dangling_edge_is_rejected() {
    let main = FunctionBuilder::new("main").goto(7).build();
    let mut p = Program::new();
    p.add_function(main);

    let err = Analyzer::with_defaults().analyze(&p).unwrap_err();
    assert!(matches!(err, AnalysisError::MissingBlock { block: 7, .. }));
}

#[test]
fn test_undeclared_resource_is_rejected() {
    let main = FunctionBuilder::new("main")
        .acquire("m", loc(1))
        .ret(None, loc(2))
        .build();
    let mut p = Program::new();
    p.add_function(main);

    let err = Analyzer::with_defaults().analyze(&p).unwrap_err();
    match err {
        AnalysisError::UndeclaredResource(name) => assert_eq!(name, "m"),
        other => panic!("expected UndeclaredResource, got {other}"),
    }
}

#[test]
fn test_program_without_entry_is_rejected() {
    let helper = FunctionBuilder::new("helper").ret(None, loc(1)).build();
    let mut p = Program::new();
    p.add_function(helper);

    let err = Analyzer::with_defaults().analyze(&p).unwrap_err();
    assert!(matches!(err, AnalysisError::FunctionNotFound(_)));
}

#[test]
fn test_unsupported_construct_degrades_and_continues() {
    let main = FunctionBuilder::new("main")
        .assign(Place::global("g"), Expr::constant(1), loc(1))
        .stmt(Statement::Unsupported {
            what: "inline asm".to_string(),
            loc: loc(2),
        })
        .assert_(eq(Expr::global("g"), Expr::constant(1)), loc(3))
        .ret(None, loc(4))
        .build();
    let mut p = Program::new();
    p.add_global(GlobalDecl::scalar("g", 0));
    p.add_function(main);

    let report = Analyzer::with_defaults().analyze(&p).unwrap();
    // Everything the construct may have touched is forgotten
    assert_eq!(report.verdict_at("test.c", 3), Some(Verdict::Unknown));
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnsupportedConstruct && d.loc.line == 2));
}

#[test]
fn test_lock_protocol_violations_are_diagnosed() {
    let main = FunctionBuilder::new("main")
        .acquire("m", loc(1))
        .acquire("m", loc(2))
        .release("m", loc(3))
        .release("m", loc(4))
        .ret(None, loc(5))
        .build();
    let mut p = Program::new();
    p.add_resource(ResourceDecl::new("m"));
    p.add_function(main);

    let report = Analyzer::with_defaults().analyze(&p).unwrap();
    let violations: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::LockProtocolViolation)
        .collect();
    assert_eq!(violations.len(), 2);
    assert!(violations.iter().any(|d| d.loc.line == 2));
    assert!(violations.iter().any(|d| d.loc.line == 4));
}
