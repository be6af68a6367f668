use super::*;

#[test]
fn test_round_trips_through_str() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(*code));
    }
}

#[test]
fn test_parse_is_case_insensitive() {
    assert_eq!("e1002".parse::<ErrorCode>(), Ok(ErrorCode::E1002));
    assert_eq!("E9999".parse::<ErrorCode>(), Err(()));
}

#[test]
fn test_ranges_are_disjoint() {
    for code in ErrorCode::ALL {
        assert_ne!(code.is_scope_error(), code.is_signature_error(), "{code}");
    }
}
