//! Integration tests for the notification event normalizer
//!
//! These tests build notifications the way the D-Bus `Notify` handler does
//! and check the identities and event kinds the engine will see.

use cosmic_headsup_util::{
    EventError, EventKind, Notification, NotificationIdentity, RawEvent, normalize,
    normalize_snapshot,
};
use std::collections::HashMap;

#[cfg(feature = "zbus_notifications")]
fn notify(app_name: &str, id: u32, hints: HashMap<&str, zbus::zvariant::Value<'_>>) -> Notification {
    Notification::new(
        app_name,
        id,
        "mail-unread",
        "New mail",
        "You have 3 unread messages",
        vec!["default", "Open", "archive", "Archive"],
        hints,
        -1,
    )
}

#[cfg(feature = "zbus_notifications")]
#[test]
fn test_replacement_keeps_identity() {
    // Notify with replaces_id reuses the id, so posted and changed events
    // for the same sender must normalize to the same identity.
    let posted = normalize(RawEvent::Posted(notify("Geary", 10, HashMap::new()))).unwrap();
    let mut replacement = notify("Geary", 10, HashMap::new());
    replacement.summary = "Newer mail".to_string();
    let changed = normalize(RawEvent::Changed(replacement)).unwrap();

    assert_eq!(posted.kind, EventKind::Posted);
    assert_eq!(changed.kind, EventKind::Changed);
    assert_eq!(posted.identity, changed.identity);
    assert_ne!(posted.payload, changed.payload);
}

#[cfg(feature = "zbus_notifications")]
#[test]
fn test_stack_tag_becomes_identity_tag() {
    let mut hints: HashMap<&str, zbus::zvariant::Value> = HashMap::new();
    hints.insert(
        "x-canonical-private-synchronous",
        zbus::zvariant::Value::Str("brightness".into()),
    );

    let event = normalize(RawEvent::Posted(notify("gsd-media-keys", 3, hints))).unwrap();
    assert_eq!(
        event.identity,
        NotificationIdentity::new("gsd-media-keys", 3, Some("brightness".to_string()))
    );
}

#[cfg(feature = "zbus_notifications")]
#[test]
fn test_actions_are_paired() {
    let n = notify("Geary", 1, HashMap::new());
    assert_eq!(n.actions.len(), 2);
    assert!(n.default_action().is_some());
}

#[cfg(feature = "zbus_notifications")]
#[test]
fn test_resident_hint_blocks_dismiss() {
    let mut hints: HashMap<&str, zbus::zvariant::Value> = HashMap::new();
    hints.insert("resident", zbus::zvariant::Value::Bool(true));

    let n = notify("Rhythmbox", 2, hints);
    assert!(!n.dismissible());
}

#[test]
fn test_removed_without_handle_is_dropped() {
    let result = normalize(RawEvent::Removed {
        id: 41,
        notification: None,
    });
    assert!(matches!(result, Err(EventError::UnknownNotification(41))));
}

#[cfg(feature = "zbus_notifications")]
#[test]
fn test_snapshot_becomes_posted_events() {
    let snapshot = vec![
        notify("Geary", 1, HashMap::new()),
        notify("Slack", 2, HashMap::new()),
        notify("Geary", 3, HashMap::new()),
    ];

    let events = normalize_snapshot(snapshot);
    let ids: Vec<u32> = events.iter().map(|e| e.identity.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(events.iter().all(|e| e.kind == EventKind::Posted));
}
