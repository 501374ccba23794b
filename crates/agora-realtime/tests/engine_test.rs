//! End-to-end tests driving the engine through the event bus, the same
//! way a transport would.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use agora_core::config::realtime::RealtimeConfig;
use agora_core::types::id::{ActorId, RoomId};
use agora_entity::presence::PresenceStatus;
use agora_realtime::effects::device::NoopFeedback;
use agora_realtime::engine::RealtimeEngine;
use agora_realtime::message::topics;

fn engine() -> RealtimeEngine {
    RealtimeEngine::new(RealtimeConfig::default(), Arc::new(NoopFeedback)).unwrap()
}

fn small_queue_engine(max_visible: usize) -> RealtimeEngine {
    let config = RealtimeConfig {
        max_visible_notifications: max_visible,
        ..Default::default()
    };
    RealtimeEngine::new(config, Arc::new(NoopFeedback)).unwrap()
}

/// Counts events published on one topic.
fn count_topic(engine: &RealtimeEngine, topic: &str) -> Arc<AtomicU32> {
    let counter = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&counter);
    engine
        .bus
        .on::<serde_json::Value, _, _>(topic, "test-counter", move |_| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();
    counter
}

async fn join(engine: &RealtimeEngine, room: &str, actor: ActorId, status: &str, seen: &str) {
    engine
        .bus
        .publish(
            topics::USER_JOIN,
            json!({
                "room_id": room,
                "actor_id": actor,
                "record": {"status": status, "last_seen": seen},
            }),
        )
        .await;
}

#[tokio::test(start_paused = true)]
async fn typing_rearm_fires_exactly_one_expiry() {
    let engine = engine();
    let expiries = count_topic(&engine, topics::TYPING_EXPIRED);
    let room: RoomId = "thread:1".into();
    let actor = ActorId::new();

    let typing_start = json!({
        "room_id": "thread:1",
        "actor_id": actor,
        "actor_name": "Ada",
    });

    engine.bus.publish(topics::TYPING_START, typing_start.clone()).await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    engine.bus.publish(topics::TYPING_START, typing_start).await;

    // t=6s: past the first deadline, inside the renewed one.
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(engine.typing.typing_in(&room), vec![actor]);
    assert_eq!(expiries.load(Ordering::SeqCst), 0);

    // t=8s: renewed deadline passed; exactly one expiry.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(engine.typing.typing_in(&room).is_empty());
    assert_eq!(expiries.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn typing_stop_cancels_pending_expiry() {
    let engine = engine();
    let expiries = count_topic(&engine, topics::TYPING_EXPIRED);
    let actor = ActorId::new();

    let payload = json!({
        "room_id": "thread:1",
        "actor_id": actor,
        "actor_name": "Ada",
    });
    engine.bus.publish(topics::TYPING_START, payload.clone()).await;
    engine.bus.publish(topics::TYPING_STOP, payload).await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(expiries.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn join_and_update_merge_fields() {
    let engine = engine();
    let room: RoomId = "thread:1".into();
    let actor = ActorId::new();

    join(&engine, "thread:1", actor, "online", "2026-01-01T00:00:00Z").await;
    engine
        .bus
        .publish(
            topics::PRESENCE_UPDATE,
            json!({
                "room_id": "thread:1",
                "actor_id": actor,
                "patch": {"device": "mobile"},
            }),
        )
        .await;

    let view = engine.presence.view(&room);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].status, PresenceStatus::Online);
    assert_eq!(
        view[0].device,
        agora_entity::presence::DeviceKind::Mobile
    );
    // The update carried no last_seen; the join's value survives.
    assert_eq!(
        view[0].last_seen.to_rfc3339(),
        "2026-01-01T00:00:00+00:00"
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_join_changes_nothing() {
    let engine = engine();
    let room: RoomId = "thread:1".into();

    engine
        .bus
        .publish(topics::USER_JOIN, json!({"room_id": "thread:1"}))
        .await;

    assert!(engine.presence.view(&room).is_empty());
    assert_eq!(engine.metrics.snapshot().events_malformed, 1);
}

#[tokio::test(start_paused = true)]
async fn explicit_leave_is_immediate_and_total() {
    let engine = engine();
    let room: RoomId = "thread:1".into();
    let actor = ActorId::new();

    join(&engine, "thread:1", actor, "online", "2026-01-01T00:00:00Z").await;
    engine
        .bus
        .publish(
            topics::TYPING_START,
            json!({"room_id": "thread:1", "actor_id": actor, "actor_name": "Ada"}),
        )
        .await;

    engine
        .bus
        .publish(
            topics::USER_LEAVE,
            json!({"room_id": "thread:1", "actor_id": actor}),
        )
        .await;

    assert!(engine.presence.view(&room).is_empty());
    assert!(engine.typing.typing_in(&room).is_empty());

    // The cancelled typing timer must not fire later.
    let expiries = count_topic(&engine, topics::TYPING_EXPIRED);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(expiries.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn notifications_keep_insertion_order() {
    let engine = engine();

    for (priority, id) in [("low", 1u32), ("urgent", 2), ("medium", 3)] {
        engine
            .bus
            .publish(
                topics::NOTIFICATION_NEW,
                json!({
                    "id": Uuid::from_u128(id as u128),
                    "category": "reply",
                    "priority": priority,
                    "title": format!("n{id}"),
                    "body": "…",
                }),
            )
            .await;
    }

    let visible = engine.notifications.visible(10);
    let titles: Vec<&str> = visible.iter().map(|n| n.title.as_str()).collect();
    // Insertion order; priority does not reorder.
    assert_eq!(titles, vec!["n1", "n2", "n3"]);
}

#[tokio::test(start_paused = true)]
async fn auto_hide_follows_priority_and_explicit_remove_wins() {
    let engine = engine();
    let hidden = count_topic(&engine, topics::NOTIFICATION_HIDDEN);

    let keep = Uuid::from_u128(1);
    let drop_early = Uuid::from_u128(2);
    for id in [keep, drop_early] {
        engine
            .bus
            .publish(
                topics::NOTIFICATION_NEW,
                json!({
                    "id": id,
                    "category": "reply",
                    "priority": "medium",
                    "title": "t",
                    "body": "b",
                }),
            )
            .await;
    }

    // Explicit removal before the 5s deadline.
    engine.notifications.remove(drop_early.into());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(engine.notifications.is_empty());
    // Only the surviving entry produced a hidden event.
    assert_eq!(hidden.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn capacity_pressure_spares_urgent() {
    let engine = small_queue_engine(1); // retention = 2

    engine
        .bus
        .publish(
            topics::NOTIFICATION_NEW,
            json!({
                "id": Uuid::from_u128(99),
                "category": "alert",
                "priority": "urgent",
                "title": "urgent",
                "body": "b",
                "persistent": true,
            }),
        )
        .await;

    for id in 1..=4u32 {
        engine
            .bus
            .publish(
                topics::NOTIFICATION_NEW,
                json!({
                    "id": Uuid::from_u128(id as u128),
                    "category": "reply",
                    "priority": "low",
                    "title": format!("low{id}"),
                    "body": "b",
                }),
            )
            .await;
    }

    let titles: Vec<String> = engine
        .notifications
        .visible(10)
        .iter()
        .map(|n| n.title.clone())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"urgent".to_string()));
    assert!(titles.contains(&"low4".to_string()));
}

#[tokio::test(start_paused = true)]
async fn read_and_clear_flow_through_the_bus() {
    let engine = engine();
    let id = Uuid::from_u128(7);

    engine
        .bus
        .publish(
            topics::NOTIFICATION_NEW,
            json!({
                "id": id,
                "category": "mention",
                "priority": "urgent",
                "title": "t",
                "body": "b",
            }),
        )
        .await;
    assert_eq!(engine.notifications.unread_count(), 1);

    engine
        .bus
        .publish(topics::NOTIFICATION_READ, json!({"notification_id": id}))
        .await;
    assert_eq!(engine.notifications.unread_count(), 0);
    assert_eq!(engine.notifications.len(), 1);

    // Marking an absent id is a silent no-op.
    engine
        .bus
        .publish(
            topics::NOTIFICATION_READ,
            json!({"notification_id": Uuid::from_u128(1234)}),
        )
        .await;

    engine.bus.publish(topics::NOTIFICATION_CLEAR, json!({})).await;
    assert!(engine.notifications.is_empty());
}

#[tokio::test(start_paused = true)]
async fn reconnect_within_grace_keeps_presence_untouched() {
    let engine = engine();
    let room: RoomId = "thread:1".into();
    let actor = ActorId::new();
    join(&engine, "thread:1", actor, "online", "2026-01-01T00:00:00Z").await;

    engine.bus.publish(topics::CONNECTION_LOST, json!({})).await;
    assert!(!engine.monitor.is_connected());

    // Reconnect at 5s, half-way through the 10s grace window.
    tokio::time::sleep(Duration::from_secs(5)).await;
    engine.bus.publish(topics::CONNECTION_RESTORED, json!({})).await;
    assert!(engine.monitor.is_connected());

    tokio::time::sleep(Duration::from_secs(30)).await;
    let view = engine.presence.view(&room);
    assert_eq!(view[0].status, PresenceStatus::Online);
    assert_eq!(
        view[0].last_seen.to_rfc3339(),
        "2026-01-01T00:00:00+00:00"
    );
}

#[tokio::test(start_paused = true)]
async fn silence_past_grace_demotes_online_to_offline() {
    let engine = engine();
    let sweeps = count_topic(&engine, topics::PRESENCE_OFFLINE_SWEEP);
    let room: RoomId = "thread:1".into();
    let (online, busy) = (ActorId::new(), ActorId::new());
    join(&engine, "thread:1", online, "online", "2026-01-01T00:00:00Z").await;
    join(&engine, "thread:1", busy, "busy", "2026-01-01T00:00:00Z").await;

    engine.bus.publish(topics::CONNECTION_LOST, json!({})).await;
    tokio::time::sleep(Duration::from_secs(11)).await;

    let view = engine.presence.view(&room);
    let status_of = |id| view.iter().find(|r| r.actor_id == id).unwrap().status;
    assert_eq!(status_of(online), PresenceStatus::Offline);
    assert_eq!(status_of(busy), PresenceStatus::Busy);
    assert_eq!(sweeps.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_methods_drive_the_lifecycle_events() {
    let engine = engine();
    let room: RoomId = "thread:1".into();
    let actor = ActorId::new();
    join(&engine, "thread:1", actor, "online", "2026-01-01T00:00:00Z").await;

    engine.monitor.transport_down().await;
    assert!(!engine.monitor.is_connected());

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(
        engine.presence.view(&room)[0].status,
        PresenceStatus::Offline
    );

    engine.monitor.transport_up().await;
    assert!(engine.monitor.is_connected());
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_outstanding_timers() {
    let engine = engine();
    let expiries = count_topic(&engine, topics::TYPING_EXPIRED);

    engine
        .bus
        .publish(
            topics::TYPING_START,
            json!({
                "room_id": "thread:1",
                "actor_id": ActorId::new(),
                "actor_name": "Ada",
            }),
        )
        .await;

    engine.shutdown();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(expiries.load(Ordering::SeqCst), 0);
}
