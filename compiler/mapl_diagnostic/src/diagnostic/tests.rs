use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_diagnostic_builder() {
    let diag = Diagnostic::error(ErrorCode::E1001)
        .with_message("test error")
        .with_label(Span::on_line(3, 1, 4), "here")
        .with_note("some context")
        .with_suggestion("try this");

    assert_eq!(diag.code, ErrorCode::E1001);
    assert_eq!(diag.message, "test error");
    assert!(diag.is_error());
    assert_eq!(diag.labels.len(), 1);
    assert!(diag.labels[0].is_primary);
    assert_eq!(diag.notes.len(), 1);
    assert_eq!(diag.suggestions.len(), 1);
}

#[test]
fn test_warning_is_not_error() {
    let diag = Diagnostic::warning(ErrorCode::E1002).with_message("meh");
    assert!(!diag.is_error());
    assert_eq!(diag.primary_span(), None);
}

#[test]
fn test_undeclared_variable() {
    let diag = undeclared_variable(Span::on_line(2, 5, 7), "foo");

    assert_eq!(diag.code, ErrorCode::E1001);
    assert!(diag.message.contains("`foo`"));
    assert_eq!(diag.primary_span(), Some(Span::on_line(2, 5, 7)));
}

#[test]
fn test_var_field_conflict_points_at_later_write() {
    let later = Span::on_line(5, 1, 10);
    let earlier = Span::on_line(2, 1, 10);
    let diag = var_field_conflict(later, earlier, "name", true);

    assert_eq!(diag.code, ErrorCode::E1002);
    assert_eq!(diag.primary_span(), Some(later));
    assert_eq!(diag.labels[1].span, earlier);
    assert!(!diag.labels[1].is_primary);
    assert_eq!(diag.message, "variable `name` has the same name as a field");
}

#[test]
fn test_display_format() {
    let diag = too_many_arguments(Span::on_line(1, 2, 9), "ternary", 3, 4);
    let text = diag.to_string();

    assert!(text.starts_with("error [E2001]: `ternary` takes 3 argument(s) but 4 were supplied"));
    assert!(text.contains("--> 1:2..1:9: expected at most 3"));
}
