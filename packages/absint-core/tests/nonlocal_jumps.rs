//! Non-local control flow: save points, jump payloads, unreachable
//! continuations after never-returning callees, and dangling jumps.

mod common;

use absint_core::{
    Analyzer, DiagnosticKind, Expr, FunctionBuilder, GlobalDecl, Place, Program, Statement,
    Verdict,
};
use common::{call, eq, ge, loc, ne};
use pretty_assertions::assert_eq;

fn save_point(env: &str, dest: Place, line: u32) -> Statement {
    Statement::SavePoint {
        env: env.to_string(),
        dest,
        loc: loc(line),
    }
}

fn jump(env: &str, payload: Expr, line: u32) -> Statement {
    Statement::Jump {
        env: env.to_string(),
        payload,
        loc: loc(line),
    }
}

/// main saves, then calls fun which jumps back with payload 2; the
/// resumed path sees the side effects performed before the jump
fn resume_program() -> Program {
    let fun = FunctionBuilder::new("fun")
        .stmt(jump("env", Expr::constant(2), 20))
        .build();
    let main = FunctionBuilder::new("main")
        .stmt(save_point("env", Place::var("val"), 10))
        .branch(ne(Expr::var("val"), Expr::constant(0)), 1, 2, loc(11))
        .block(1)
        .assert_(eq(Expr::global("g"), Expr::constant(2)), loc(12))
        .assert_(ge(Expr::var("val"), Expr::constant(1)), loc(13))
        .assert_(eq(Expr::global("g"), Expr::constant(8)), loc(14))
        .ret(None, loc(15))
        .block(2)
        .assign(Place::global("g"), Expr::constant(2), loc(16))
        .stmt(call(None, "fun", vec![], 17))
        .assert_(eq(Expr::constant(1), Expr::constant(1)), loc(18))
        .ret(None, loc(19))
        .build();

    let mut p = Program::new();
    p.add_global(GlobalDecl::scalar("g", 0));
    p.add_function(fun);
    p.add_function(main);
    p
}

#[test]
fn test_resumption_carries_payload_and_side_effects() {
    let report = Analyzer::with_defaults().analyze(&resume_program()).unwrap();
    // g was written before the jump, so the resumed path sees 2
    assert_eq!(report.verdict_at("test.c", 12), Some(Verdict::Proven));
    assert_eq!(report.verdict_at("test.c", 13), Some(Verdict::Proven));
    assert_eq!(report.verdict_at("test.c", 14), Some(Verdict::Disproven));
}

#[test]
fn test_code_after_never_returning_call_is_unreachable() {
    let report = Analyzer::with_defaults().analyze(&resume_program()).unwrap();
    // fun only exits through the jump: the assertion after the call
    // site is never executed
    assert_eq!(report.verdict_at("test.c", 18), None);
}

/// A zero payload resumes as one, matching the save-point contract that
/// the first arrival is the only zero
fn zero_payload_program() -> Program {
    let main = FunctionBuilder::new("main")
        .stmt(save_point("env", Place::var("val"), 10))
        .branch(ne(Expr::var("val"), Expr::constant(0)), 1, 2, loc(11))
        .block(1)
        .assert_(eq(Expr::var("val"), Expr::constant(1)), loc(12))
        .ret(None, loc(13))
        .block(2)
        .stmt(jump("env", Expr::constant(0), 14))
        .build();

    let mut p = Program::new();
    p.add_function(main);
    p
}

#[test]
fn test_zero_payload_coerced_to_one() {
    let report = Analyzer::with_defaults()
        .analyze(&zero_payload_program())
        .unwrap();
    assert_eq!(report.verdict_at("test.c", 12), Some(Verdict::Proven));
}

/// The continuation joins the first arrival with the resumed state, so
/// a global rewritten before the jump cannot stay pinned there
fn continuation_join_program() -> Program {
    let fun = FunctionBuilder::new("fun")
        .stmt(jump("env", Expr::constant(2), 20))
        .build();
    let main = FunctionBuilder::new("main")
        .stmt(save_point("env", Place::var("val"), 10))
        .assert_(eq(Expr::global("g"), Expr::constant(0)), loc(11))
        .branch(ne(Expr::var("val"), Expr::constant(0)), 1, 2, loc(12))
        .block(1)
        .ret(None, loc(13))
        .block(2)
        .assign(Place::global("g"), Expr::constant(2), loc(14))
        .stmt(call(None, "fun", vec![], 15))
        .ret(None, loc(16))
        .build();

    let mut p = Program::new();
    p.add_global(GlobalDecl::scalar("g", 0));
    p.add_function(fun);
    p.add_function(main);
    p
}

#[test]
fn test_resumed_global_write_weakens_continuation() {
    let report = Analyzer::with_defaults()
        .analyze(&continuation_join_program())
        .unwrap();
    // g is 0 on first arrival and 2 on resumption
    assert_eq!(report.verdict_at("test.c", 11), Some(Verdict::Unknown));
}

/// A jump with no live matching save point goes nowhere
fn dangling_jump_program() -> Program {
    let main = FunctionBuilder::new("main")
        .stmt(jump("nowhere", Expr::constant(1), 5))
        .build();

    let mut p = Program::new();
    p.add_function(main);
    p
}

#[test]
fn test_dangling_jump_is_diagnosed() {
    let report = Analyzer::with_defaults()
        .analyze(&dangling_jump_program())
        .unwrap();
    assert!(report.assertions.is_empty());
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::DanglingJump && d.loc.line == 5));
}
