use mapl_ir::Span;
use pretty_assertions::assert_eq;

use super::*;
use crate::{undeclared_variable, Diagnostic, ErrorCode};

#[test]
fn test_flush_sorts_by_position() {
    let mut queue = DiagnosticQueue::new();
    queue.add(undeclared_variable(Span::on_line(7, 3, 4), "c"));
    queue.add(undeclared_variable(Span::on_line(2, 9, 10), "b"));
    queue.add(undeclared_variable(Span::on_line(2, 1, 2), "a"));

    let messages: Vec<_> = queue.flush().into_iter().map(|d| d.message).collect();
    assert_eq!(
        messages,
        vec![
            "undeclared variable `a`",
            "undeclared variable `b`",
            "undeclared variable `c`",
        ]
    );
    assert!(queue.is_empty());
    assert!(!queue.has_errors());
}

#[test]
fn test_duplicates_dropped() {
    let mut queue = DiagnosticQueue::new();
    assert!(queue.add(undeclared_variable(Span::on_line(1, 1, 2), "x")));
    assert!(!queue.add(undeclared_variable(Span::on_line(1, 1, 2), "x")));
    assert!(queue.add(undeclared_variable(Span::on_line(3, 1, 2), "x")));
    assert_eq!(queue.error_count(), 2);
}

#[test]
fn test_unlimited_keeps_duplicates() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig::unlimited());
    for _ in 0..100 {
        assert!(queue.add(undeclared_variable(Span::on_line(1, 1, 2), "x")));
    }
    assert_eq!(queue.flush().len(), 100);
}

#[test]
fn test_error_limit() {
    let mut queue = DiagnosticQueue::with_config(DiagnosticConfig {
        error_limit: 2,
        deduplicate: false,
    });
    assert!(queue.add(undeclared_variable(Span::on_line(1, 1, 2), "a")));
    assert!(queue.add(undeclared_variable(Span::on_line(2, 1, 2), "b")));
    assert!(queue.limit_reached());
    assert!(!queue.add(undeclared_variable(Span::on_line(3, 1, 2), "c")));
    assert_eq!(queue.peek().count(), 2);
}

#[test]
fn test_warnings_do_not_count_as_errors() {
    let mut queue = DiagnosticQueue::new();
    queue.add(Diagnostic::warning(ErrorCode::E1002).with_message("heads up"));
    assert!(!queue.has_errors());
    assert!(!queue.is_empty());
}
