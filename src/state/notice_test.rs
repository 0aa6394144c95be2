use super::*;

#[test]
fn push_assigns_monotonic_ids() {
    let mut s = NoticeState::default();
    let a = s.push(NoticeLevel::Warn, "first");
    let b = s.push(NoticeLevel::Info, "second");
    assert!(b > a);
    assert_eq!(s.notices.len(), 2);
}

#[test]
fn dismiss_removes_only_the_matching_notice() {
    let mut s = NoticeState::default();
    let a = s.push(NoticeLevel::Warn, "same text");
    let b = s.push(NoticeLevel::Warn, "same text");
    s.dismiss(a);
    assert_eq!(s.notices.len(), 1);
    assert_eq!(s.notices[0].id, b);
}

#[test]
fn dismiss_of_unknown_id_is_a_no_op() {
    let mut s = NoticeState::default();
    s.push(NoticeLevel::Info, "hello");
    s.dismiss(999);
    assert_eq!(s.notices.len(), 1);
}
