use super::*;

fn entry(user_id: &str, seen: i64) -> PresenceEntry {
    PresenceEntry { user_id: user_id.to_owned(), email: format!("{user_id}@uwaterloo.ca"), last_seen_ms: seen }
}

#[test]
fn replace_all_counts_unique_users() {
    let mut tracker = PresenceTracker::new();
    tracker.replace_all([entry("a", 1), entry("a", 2), entry("b", 1)]);
    assert_eq!(tracker.count(), 2);
}

#[test]
fn replace_all_keeps_latest_seen_for_duplicates() {
    let mut tracker = PresenceTracker::new();
    tracker.replace_all([entry("a", 9), entry("a", 3)]);
    assert_eq!(tracker.list()[0].last_seen_ms, 9);
}

#[test]
fn replace_all_discards_previous_members() {
    let mut tracker = PresenceTracker::new();
    tracker.mark_online(entry("old", 1));
    tracker.replace_all([entry("new", 2)]);
    assert!(!tracker.contains("old"));
    assert!(tracker.contains("new"));
}

#[test]
fn mark_online_reports_new_users_only() {
    let mut tracker = PresenceTracker::new();
    assert!(tracker.mark_online(entry("a", 1)));
    assert!(!tracker.mark_online(entry("a", 5)));
    assert_eq!(tracker.count(), 1);
    assert_eq!(tracker.list()[0].last_seen_ms, 5);
}

#[test]
fn mark_online_never_moves_last_seen_backwards() {
    let mut tracker = PresenceTracker::new();
    tracker.mark_online(entry("a", 10));
    tracker.mark_online(entry("a", 4));
    assert_eq!(tracker.list()[0].last_seen_ms, 10);
}

#[test]
fn mark_offline_removes_known_user() {
    let mut tracker = PresenceTracker::new();
    tracker.mark_online(entry("a", 1));
    assert!(tracker.mark_offline("a"));
    assert!(!tracker.mark_offline("a"));
    assert_eq!(tracker.count(), 0);
}

#[test]
fn list_is_sorted_by_user_id() {
    let mut tracker = PresenceTracker::new();
    tracker.replace_all([entry("c", 1), entry("a", 1), entry("b", 1)]);
    let ids: Vec<String> = tracker.list().into_iter().map(|e| e.user_id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn clear_empties_the_set() {
    let mut tracker = PresenceTracker::new();
    tracker.replace_all([entry("a", 1), entry("b", 1)]);
    tracker.clear();
    assert_eq!(tracker.count(), 0);
    assert!(tracker.list().is_empty());
}

#[test]
fn payload_conversion_maps_seen_at() {
    let payload = frames::PresencePayload { user_id: "u".into(), email: "u@x".into(), seen_at: 42 };
    let entry = PresenceEntry::from(payload.clone());
    assert_eq!(entry.last_seen_ms, 42);
    assert_eq!(frames::PresencePayload::from(&entry), payload);
}
