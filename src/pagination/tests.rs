//! Tests for the pagination module

use super::*;
use serde_json::json;

#[test]
fn test_first_page_advances_to_two() {
    let body = json!({"ok": true, "paging": {"last_page": 3}});
    assert_eq!(Pagination::LastPage.next_token(None, &body), Some(2));
}

#[test]
fn test_token_sequence_terminates_at_last_page() {
    // last_page = 3: tokens observed by the server are None, 2, 3 and a
    // fourth page is never requested.
    let body = json!({"paging": {"last_page": 3}});
    let paginator = Pagination::LastPage;

    let mut token = None;
    let mut requested = vec![token];
    while let Some(next) = paginator.next_token(token, &body) {
        token = Some(next);
        requested.push(token);
    }

    assert_eq!(requested, vec![None, Some(2), Some(3)]);
}

#[test]
fn test_single_page_result_stops_immediately() {
    let body = json!({"paging": {"last_page": 1}});
    assert_eq!(Pagination::LastPage.next_token(None, &body), None);
}

#[test]
fn test_missing_paging_stops() {
    let body = json!({"ok": true, "responses": []});
    assert_eq!(Pagination::LastPage.next_token(None, &body), None);
}

#[test]
fn test_unpaginated_mode_never_continues() {
    let body = json!({"paging": {"last_page": 99}});
    assert_eq!(Pagination::None.next_token(None, &body), None);
    assert_eq!(Pagination::None.next_token(Some(1), &body), None);
}
