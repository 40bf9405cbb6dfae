//! End-to-end tests for unwindify.
//!
//! These tests run the whole pipeline: guard → split → transform → serialize.

use unwindify::ir::{PointerStyle, Segment};
use unwindify::parser::split_module;
use unwindify::{rewrite, Outcome, RewriteOptions, RewriteStats};

const RUSTC_MODULE: &str = include_str!("data/rustc_module.ll");
const OPAQUE_MODULE: &str = include_str!("data/opaque_module.ll");

const TYPED_PERSONALITY: &str = "personality i32 (i32, i32, i64, \
    %\"unwind::libunwind::_Unwind_Exception\"*, \
    %\"unwind::libunwind::_Unwind_Context\"*)* @rust_eh_personality";

/// Helper to rewrite a module that is expected to be fresh.
fn rewritten(ll: &str, options: &RewriteOptions) -> (String, RewriteStats) {
    match rewrite(ll, options) {
        Outcome::Rewritten { text, stats } => (text, stats),
        Outcome::AlreadyProcessed => panic!("module unexpectedly marked as processed"),
    }
}

fn function_lines<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
    let start = text
        .lines()
        .position(|l| l.starts_with("define ") && l.contains(name))
        .unwrap_or_else(|| panic!("no function {name}"));
    text.lines()
        .skip(start)
        .take_while(|l| *l != "}")
        .chain(std::iter::once("}"))
        .collect()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn minimal_function_default_epilogue() {
    let ll = "define void @f() {\n  ret void\n}\n";
    let (text, stats) = rewritten(ll, &RewriteOptions::default());

    let expected = format!(
        "define void @f() {TYPED_PERSONALITY} {{\n\
         \x20 invoke void @\"llvm.donothing\"() to label %lsda.ret1 unwind label %cleanup\n\
         lsda.ret1:\n\
         \x20 ret void\n\
         cleanup:\n\
         \x20 %lsda.exn = landingpad {{ i8*, i32 }} cleanup\n\
         \x20 resume {{ i8*, i32 }} %lsda.exn\n\
         }}\n\
         \ndeclare void @\"llvm.donothing\"()"
    );
    assert_eq!(text, expected);
    assert_eq!(
        stats,
        RewriteStats {
            functions: 1,
            personalities_attached: 1,
            returns_instrumented: 1,
            landing_pads_added: 1,
        }
    );
}

#[test]
fn minimal_function_custom_epilogue() {
    let ll = "define void @f() {\n  ret void\n}\n";
    let options = RewriteOptions {
        epilogue: "my_epilogue".parse().unwrap(),
        ..Default::default()
    };
    let (text, _) = rewritten(ll, &options);

    assert!(text
        .contains("  invoke void @\"my_epilogue\"() to label %lsda.ret1 unwind label %cleanup\n"));
    assert!(text.ends_with("\ndeclare void @\"my_epilogue\"()"));
    assert!(!text.contains("llvm.donothing"));
}

#[test]
fn existing_personality_header_is_byte_identical() {
    let (text, stats) = rewritten(RUSTC_MODULE, &RewriteOptions::default());
    let original_header = RUSTC_MODULE
        .lines()
        .find(|l| l.contains("@_ZN4demo9with_drop"))
        .unwrap();

    let lines = function_lines(&text, "@_ZN4demo9with_drop");
    assert_eq!(lines[0], original_header);
    // Return instrumented, cleanup reused.
    assert_eq!(
        lines[6],
        "  invoke void @\"llvm.donothing\"() to label %lsda.ret6 unwind label %cleanup"
    );
    assert_eq!(lines[7], "lsda.ret6:");
    assert_eq!(lines[8], "  ret void");
    assert_eq!(lines.iter().filter(|l| l.starts_with("cleanup:")).count(), 1);
    assert_eq!(stats.functions, 3);
    assert_eq!(stats.personalities_attached, 2);
    assert_eq!(stats.landing_pads_added, 2);
}

#[test]
fn already_processed_module_is_left_alone() {
    let ll = "define void @f() {\n  ret void\n}\n\ndeclare void @\"llvm.donothing\"()";
    assert_eq!(rewrite(ll, &RewriteOptions::default()), Outcome::AlreadyProcessed);
}

// ── Properties ───────────────────────────────────────────────────────────────

#[test]
fn second_run_is_short_circuited() {
    let options = RewriteOptions::default();
    let (first, _) = rewritten(RUSTC_MODULE, &options);
    assert_eq!(rewrite(&first, &options), Outcome::AlreadyProcessed);
}

#[test]
fn different_epilogue_processes_again() {
    let (first, _) = rewritten(OPAQUE_MODULE, &RewriteOptions::default());
    let other = RewriteOptions {
        epilogue: "other_epilogue".parse().unwrap(),
        ..Default::default()
    };
    let (second, stats) = rewritten(&first, &other);
    assert!(second.contains("\ndeclare void @\"llvm.donothing\"()"));
    assert!(second.ends_with("\ndeclare void @\"other_epilogue\"()"));
    // Personalities and cleanup pads from the first run are reused.
    assert_eq!(stats.personalities_attached, 0);
    assert_eq!(stats.landing_pads_added, 0);
    assert_eq!(stats.returns_instrumented, 1);
}

#[test]
fn debug_attachment_precedes_personality() {
    let (text, _) = rewritten(RUSTC_MODULE, &RewriteOptions::default());
    let header = function_lines(&text, "@_ZN4demo6square")[0];
    assert_eq!(
        header,
        format!(
            "define internal i32 @_ZN4demo6square17h0a1b2c3d4e5f6a7bE(i32 %x) unnamed_addr #0 \
             !dbg !10 {TYPED_PERSONALITY} {{"
        )
    );
    assert_eq!(header.matches(" personality ").count(), 1);
}

#[test]
fn every_return_is_wrapped() {
    let (text, _) = rewritten(RUSTC_MODULE, &RewriteOptions::default());
    let lines = function_lines(&text, "@_ZN4demo5clamp");

    let mut labels = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.trim_start().starts_with("ret ") {
            let invoke = lines[idx - 2];
            let label = lines[idx - 1].trim_end_matches(':');
            assert_eq!(
                invoke,
                format!(
                    "  invoke void @\"llvm.donothing\"() to label %{label} unwind label %cleanup"
                )
            );
            labels.push(label.to_string());
        }
    }
    assert_eq!(labels, vec!["lsda.ret6", "lsda.ret11"]);
}

#[test]
fn landing_pad_sits_before_closing_brace() {
    let (text, _) = rewritten(RUSTC_MODULE, &RewriteOptions::default());
    let lines = function_lines(&text, "@_ZN4demo5clamp");
    let n = lines.len();
    assert_eq!(
        &lines[n - 4..],
        &[
            "cleanup:",
            "  %lsda.exn = landingpad { i8*, i32 } cleanup",
            "  resume { i8*, i32 } %lsda.exn",
            "}",
        ]
    );
}

#[test]
fn opaque_text_is_preserved() {
    let (text, _) = rewritten(RUSTC_MODULE, &RewriteOptions::default());
    let opaque: Vec<String> = split_module(RUSTC_MODULE)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Opaque(raw) => Some(raw),
            Segment::Function(_) => None,
        })
        .collect();
    for raw in &opaque {
        assert!(text.contains(raw.as_str()), "lost opaque text {raw:?}");
    }
    assert!(text.starts_with("; ModuleID = 'demo.7rcbfp3g-cgu.0'\n"));
    assert!(text.ends_with(
        "!0 = !{i32 7, !\"PIC Level\", i32 2}\n\ndeclare void @\"llvm.donothing\"()"
    ));
    assert_eq!(text.matches("\ndeclare void @\"llvm.donothing\"()").count(), 1);
}

#[test]
fn opaque_pointer_module() {
    let options = RewriteOptions {
        pointers: PointerStyle::Opaque,
        ..Default::default()
    };
    let (text, stats) = rewritten(OPAQUE_MODULE, &options);

    let first = function_lines(&text, "@first");
    assert_eq!(
        first[0],
        "define noundef ptr @first(ptr noundef %v) unnamed_addr #0 personality ptr @rust_eh_personality {"
    );
    assert!(first.contains(&"  %lsda.exn = landingpad { ptr, i32 } cleanup"));
    assert!(first.contains(&"  resume { ptr, i32 } %lsda.exn"));

    // A function that never returns still gets a personality and a landing pad.
    let spin = function_lines(&text, "@spin");
    assert!(spin[0].contains("personality ptr @rust_eh_personality"));
    assert!(!spin.iter().any(|l| l.contains("invoke")));
    assert!(spin.contains(&"cleanup:"));

    assert_eq!(stats.functions, 2);
    assert_eq!(stats.returns_instrumented, 1);
}

#[test]
fn module_without_functions_only_gains_declaration() {
    let ll = "; ModuleID = 'empty'\ndeclare void @g()\n";
    let (text, stats) = rewritten(ll, &RewriteOptions::default());
    assert_eq!(text, format!("{ll}\ndeclare void @\"llvm.donothing\"()"));
    assert_eq!(stats, RewriteStats::default());
}
