use crate::diag::{CancelFlag, DiagnosticBag, SuppressionContext};
use sable_common::diagnostics::{DiagnosticCategory, diagnostic_codes as dc};
use sable_common::span::Span;

#[test]
fn report_renders_template_arguments() {
    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    bag.report(&ctx, dc::NAME_NOT_IN_CONTEXT, Span::new(4, 3), &["foo"]);

    let rendered = bag.rendered();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].code, 103);
    assert_eq!(rendered[0].category, DiagnosticCategory::Error);
    assert_eq!(
        rendered[0].message_text,
        "The name 'foo' does not exist in the current context"
    );
}

#[test]
fn drain_sorts_by_span_then_insertion_order() {
    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    bag.report(&ctx, dc::UNREACHABLE_CODE, Span::new(50, 5), &[]);
    bag.report(&ctx, dc::NAME_NOT_IN_CONTEXT, Span::new(10, 3), &["a"]);
    bag.report(&ctx, dc::UNUSED_VARIABLE, Span::new(10, 3), &["a"]);

    let all = bag.drain_all();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].code, dc::NAME_NOT_IN_CONTEXT);
    assert_eq!(all[1].code, dc::UNUSED_VARIABLE);
    assert_eq!(all[2].code, dc::UNREACHABLE_CODE);
}

#[test]
fn duplicate_code_and_span_reported_once() {
    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    let span = Span::new(7, 2);
    bag.report(&ctx, dc::NAME_NOT_IN_CONTEXT, span, &["x"]);
    bag.report(&ctx, dc::NAME_NOT_IN_CONTEXT, span, &["x"]);

    assert_eq!(bag.drain_all().len(), 1);
}

#[test]
fn suppression_drops_warnings_but_never_errors() {
    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::suppressing([dc::UNUSED_VARIABLE, dc::NAME_NOT_IN_CONTEXT]);
    bag.report(&ctx, dc::UNUSED_VARIABLE, Span::new(0, 1), &["x"]);
    bag.report(&ctx, dc::NAME_NOT_IN_CONTEXT, Span::new(0, 1), &["x"]);

    let all = bag.drain_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].code, dc::NAME_NOT_IN_CONTEXT);
}

#[test]
fn suppression_with_adds_one_code() {
    let base = SuppressionContext::empty();
    let narrowed = base.with(dc::UNREACHABLE_CODE);
    assert!(!base.is_suppressed(dc::UNREACHABLE_CODE));
    assert!(narrowed.is_suppressed(dc::UNREACHABLE_CODE));
}

#[test]
fn hidden_diagnostics_excluded_from_rendering() {
    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    bag.report(&ctx, dc::UNNECESSARY_IMPORT, Span::new(0, 10), &[]);
    bag.report(&ctx, dc::UNUSED_VARIABLE, Span::new(20, 1), &["y"]);

    assert_eq!(bag.drain_all().len(), 2);
    let rendered = bag.rendered();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].code, dc::UNUSED_VARIABLE);
}

#[test]
fn absorb_preserves_absorbed_order_after_own_entries() {
    let first = DiagnosticBag::new();
    let second = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    let span = Span::new(5, 1);
    first.report(&ctx, dc::NAME_NOT_IN_CONTEXT, span, &["a"]);
    second.report(&ctx, dc::UNUSED_VARIABLE, span, &["b"]);
    second.report(&ctx, dc::UNREACHABLE_CODE, span, &[]);

    first.absorb(second);
    let all = first.drain_all();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].code, dc::NAME_NOT_IN_CONTEXT);
    assert_eq!(all[1].code, dc::UNUSED_VARIABLE);
    assert_eq!(all[2].code, dc::UNREACHABLE_CODE);
}

#[test]
fn has_errors_distinguishes_categories() {
    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    bag.report(&ctx, dc::UNUSED_VARIABLE, Span::new(0, 1), &["x"]);
    assert!(!bag.has_errors());
    bag.report(&ctx, dc::NAME_NOT_IN_CONTEXT, Span::new(0, 1), &["x"]);
    assert!(bag.has_errors());
}

#[test]
fn related_information_is_carried() {
    let bag = DiagnosticBag::new();
    let ctx = SuppressionContext::empty();
    bag.report_with_related(
        &ctx,
        dc::AMBIGUOUS_CALL,
        Span::new(0, 4),
        &["A.f(int)", "A.f(long)"],
        &[(Span::new(100, 10), "candidate declared here".to_string())],
    );

    let all = bag.drain_all();
    assert_eq!(all[0].related_information.len(), 1);
    assert_eq!(all[0].related_information[0].span, Span::new(100, 10));
}

#[test]
fn cancel_flag_latches() {
    let flag = CancelFlag::new();
    assert!(!flag.is_cancelled());
    flag.cancel();
    assert!(flag.is_cancelled());
}
