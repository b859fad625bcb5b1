// Unit tests for the error boundary

use crate::dispatch::guarded;

/// **VALUE**: Verifies the boundary passes successes through and absorbs failures.
///
/// **BUG THIS CATCHES**: Would catch a boundary that propagates or panics on error, which
/// would take down the server loop with one bad command.
#[test]
fn given_work_when_guarded_then_ok_is_some_and_err_is_none() {
    let ok = guarded("ok work", || Ok::<_, String>(7));
    let failed = guarded("failing work", || Err::<u32, _>("boom".to_string()));

    assert_eq!(ok, Some(7));
    assert_eq!(failed, None);
}

/// **VALUE**: Verifies nested options flatten so a probe miss and a probe failure look the same.
#[test]
fn given_guarded_option_when_flattened_then_miss_and_failure_are_none() {
    let miss = guarded("miss", || Ok::<Option<u8>, String>(None)).flatten();
    let failure = guarded("failure", || Err::<Option<u8>, _>("x".to_string())).flatten();
    let hit = guarded("hit", || Ok::<_, String>(Some(1u8))).flatten();

    assert_eq!(miss, None);
    assert_eq!(failure, None);
    assert_eq!(hit, Some(1));
}
