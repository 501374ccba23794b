//! Top-level real-time engine that ties together all subsystems.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{info, warn};

use agora_core::config::realtime::RealtimeConfig;
use agora_core::result::AppResult;
use agora_entity::notification::Notification;
use agora_entity::presence::ActivityKind;

use crate::activity::tracker::ActivityTracker;
use crate::activity::typing::TypingTracker;
use crate::bus::{EventBus, SubscriptionToken};
use crate::effects::device::FeedbackDevice;
use crate::effects::dispatcher::EffectsDispatcher;
use crate::message::topics;
use crate::message::types::{
    JoinPayload, LeavePayload, PresenceUpdatePayload, ReadPayload, TypingPayload,
};
use crate::metrics::EngineMetrics;
use crate::monitor::monitor::ConnectionMonitor;
use crate::monitor::probe::{LatencyProbe, run_probe_loop};
use crate::notify::queue::{EnqueueOutcome, NotificationQueue};
use crate::presence::store::PresenceStore;
use crate::scheduler::Scheduler;

/// Timer key for the disconnect grace period.
const GRACE_TIMER_KEY: &str = "presence:grace";

/// Central engine that coordinates presence, typing, notifications, and
/// delivery side effects over one event bus.
///
/// Construction wires every catalog topic to its owning component; the
/// embedding host then feeds transport events into [`RealtimeEngine::bus`]
/// and reads projections (`view`, `visible`, typing summaries) from the
/// components. [`RealtimeEngine::start`] spawns the background loops;
/// [`RealtimeEngine::shutdown`] tears everything down, cancelling all
/// timers and subscriptions.
pub struct RealtimeEngine {
    /// Event bus; the single entry point for all mutations.
    pub bus: Arc<EventBus>,
    /// Keyed timer scheduler shared by all components.
    pub scheduler: Arc<Scheduler>,
    /// Connection monitor.
    pub monitor: Arc<ConnectionMonitor>,
    /// Presence store.
    pub presence: Arc<PresenceStore>,
    /// Activity tracker.
    pub activity: Arc<ActivityTracker>,
    /// Typing tracker.
    pub typing: Arc<TypingTracker>,
    /// Notification queue.
    pub notifications: Arc<NotificationQueue>,
    /// Side-effect dispatcher.
    pub effects: Arc<EffectsDispatcher>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Engine configuration.
    config: RealtimeConfig,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
    /// Subscriptions held for teardown.
    tokens: Mutex<Vec<SubscriptionToken>>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new engine with all subsystems wired to the bus.
    pub fn new(config: RealtimeConfig, device: Arc<dyn FeedbackDevice>) -> AppResult<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(EngineMetrics::new());
        let bus = Arc::new(EventBus::new(Arc::clone(&metrics)));
        let scheduler = Arc::new(Scheduler::new());
        let monitor = Arc::new(ConnectionMonitor::new(Arc::clone(&bus)));
        let presence = Arc::new(PresenceStore::new(config.presence_retention()));
        let activity = Arc::new(ActivityTracker::new(config.activity_window()));
        let typing = TypingTracker::new(
            Arc::clone(&scheduler),
            Arc::clone(&bus),
            Arc::clone(&metrics),
            config.typing_ttl(),
        );
        let notifications = NotificationQueue::new(
            Arc::clone(&scheduler),
            Arc::clone(&bus),
            Arc::clone(&metrics),
            config.max_visible_notifications,
        );
        let effects = Arc::new(EffectsDispatcher::new(
            device,
            Arc::clone(&monitor),
            config.effects.clone(),
            Arc::clone(&metrics),
        ));

        let engine = Self {
            bus,
            scheduler,
            monitor,
            presence,
            activity,
            typing,
            notifications,
            effects,
            metrics,
            config,
            shutdown_tx,
            tokens: Mutex::new(Vec::new()),
        };
        engine.wire_handlers()?;

        info!("realtime engine initialized");
        Ok(engine)
    }

    /// Spawns the background loops: latency probing, activity sweeping,
    /// and stale-presence eviction.
    pub fn start(&self, probe: Arc<dyn LatencyProbe>) {
        tokio::spawn(run_probe_loop(
            Arc::clone(&self.monitor),
            probe,
            self.config.latency_probe_interval(),
            self.shutdown_tx.subscribe(),
        ));

        let activity = Arc::clone(&self.activity);
        let interval = self.config.activity_sweep_interval();
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = ticker.tick() => {
                        activity.sweep(Utc::now());
                    }
                }
            }
        });

        let presence = Arc::clone(&self.presence);
        let metrics = Arc::clone(&self.metrics);
        let interval = self.config.presence_sweep_interval();
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = ticker.tick() => {
                        let evicted = presence.evict_stale_all(Utc::now());
                        metrics
                            .presence_evicted
                            .fetch_add(evicted as u64, std::sync::atomic::Ordering::Relaxed);
                    }
                }
            }
        });
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Tears the engine down: stops background loops, cancels every
    /// outstanding timer, and unsubscribes all handlers.
    pub fn shutdown(&self) {
        info!("shutting down realtime engine");

        let _ = self.shutdown_tx.send(());
        self.scheduler.cancel_all();

        let tokens = {
            let mut tokens = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *tokens)
        };
        for token in &tokens {
            self.bus.unsubscribe(token);
        }

        info!("realtime engine shut down");
    }

    fn wire_handlers(&self) -> AppResult<()> {
        let mut tokens = Vec::new();

        // Presence.
        {
            let presence = Arc::clone(&self.presence);
            let metrics = Arc::clone(&self.metrics);
            tokens.push(self.bus.on::<JoinPayload, _, _>(
                topics::USER_JOIN,
                "presence-store",
                move |p| {
                    let presence = Arc::clone(&presence);
                    let metrics = Arc::clone(&metrics);
                    async move {
                        presence.apply_join(&p.room_id, p.actor_id, p.record);
                        EngineMetrics::inc(&metrics.presence_joins);
                    }
                },
            )?);
        }
        {
            let presence = Arc::clone(&self.presence);
            let typing = Arc::clone(&self.typing);
            let activity = Arc::clone(&self.activity);
            let metrics = Arc::clone(&self.metrics);
            tokens.push(self.bus.on::<LeavePayload, _, _>(
                topics::USER_LEAVE,
                "presence-store",
                move |p| {
                    let presence = Arc::clone(&presence);
                    let typing = Arc::clone(&typing);
                    let activity = Arc::clone(&activity);
                    let metrics = Arc::clone(&metrics);
                    async move {
                        // Explicit leave tears down everything ephemeral
                        // the actor had in the room, timers included.
                        presence.apply_leave(&p.room_id, p.actor_id);
                        typing.stop(&p.room_id, p.actor_id);
                        activity.remove_actor(&p.room_id, p.actor_id);
                        EngineMetrics::inc(&metrics.presence_leaves);
                    }
                },
            )?);
        }
        {
            let presence = Arc::clone(&self.presence);
            tokens.push(self.bus.on::<PresenceUpdatePayload, _, _>(
                topics::PRESENCE_UPDATE,
                "presence-store",
                move |p| {
                    let presence = Arc::clone(&presence);
                    async move {
                        presence.apply_update(&p.room_id, p.actor_id, p.patch);
                    }
                },
            )?);
        }

        // Typing.
        {
            let typing = Arc::clone(&self.typing);
            let activity = Arc::clone(&self.activity);
            tokens.push(self.bus.on::<TypingPayload, _, _>(
                topics::TYPING_START,
                "typing-tracker",
                move |p| {
                    let typing = Arc::clone(&typing);
                    let activity = Arc::clone(&activity);
                    async move {
                        typing.mark(&p.room_id, p.actor_id, &p.actor_name);
                        activity.mark(&p.room_id, p.actor_id, ActivityKind::Typing, None);
                    }
                },
            )?);
        }
        {
            let typing = Arc::clone(&self.typing);
            tokens.push(self.bus.on::<TypingPayload, _, _>(
                topics::TYPING_STOP,
                "typing-tracker",
                move |p| {
                    let typing = Arc::clone(&typing);
                    async move {
                        typing.stop(&p.room_id, p.actor_id);
                    }
                },
            )?);
        }

        // Notifications.
        {
            let notifications = Arc::clone(&self.notifications);
            let effects = Arc::clone(&self.effects);
            tokens.push(self.bus.on::<Notification, _, _>(
                topics::NOTIFICATION_NEW,
                "notification-queue",
                move |n| {
                    let notifications = Arc::clone(&notifications);
                    let effects = Arc::clone(&effects);
                    async move {
                        match notifications.enqueue(n.clone()) {
                            Ok(EnqueueOutcome::Inserted) => effects.on_enqueued(&n).await,
                            Ok(EnqueueOutcome::Deduplicated) => {}
                            Err(e) => {
                                warn!(id = %n.id, error = %e, "notification rejected");
                            }
                        }
                    }
                },
            )?);
        }
        {
            let notifications = Arc::clone(&self.notifications);
            tokens.push(self.bus.on::<ReadPayload, _, _>(
                topics::NOTIFICATION_READ,
                "notification-queue",
                move |p| {
                    let notifications = Arc::clone(&notifications);
                    async move {
                        notifications.mark_read(p.notification_id);
                    }
                },
            )?);
        }
        {
            let notifications = Arc::clone(&self.notifications);
            tokens.push(self.bus.on::<serde_json::Value, _, _>(
                topics::NOTIFICATION_CLEAR,
                "notification-queue",
                move |_| {
                    let notifications = Arc::clone(&notifications);
                    async move {
                        notifications.clear_all();
                    }
                },
            )?);
        }

        // Connection lifecycle. The monitor handler runs before the grace
        // handler on both topics, so consumers observing state see the
        // transition applied first.
        {
            let monitor = Arc::clone(&self.monitor);
            tokens.push(self.bus.on::<serde_json::Value, _, _>(
                topics::CONNECTION_LOST,
                "connection-monitor",
                move |_| {
                    let monitor = Arc::clone(&monitor);
                    async move {
                        monitor.apply_lost();
                    }
                },
            )?);
        }
        {
            let scheduler = Arc::clone(&self.scheduler);
            let presence = Arc::clone(&self.presence);
            let bus = Arc::clone(&self.bus);
            let grace = self.config.presence_grace();
            tokens.push(self.bus.on::<serde_json::Value, _, _>(
                topics::CONNECTION_LOST,
                "presence-grace",
                move |_| {
                    let scheduler = Arc::clone(&scheduler);
                    let presence = Arc::clone(&presence);
                    let bus = Arc::clone(&bus);
                    async move {
                        let presence = Arc::clone(&presence);
                        let bus = Arc::clone(&bus);
                        scheduler.schedule(GRACE_TIMER_KEY, grace, async move {
                            presence.demote_online();
                            bus.publish(topics::PRESENCE_OFFLINE_SWEEP, serde_json::json!({}))
                                .await;
                        });
                    }
                },
            )?);
        }
        {
            let monitor = Arc::clone(&self.monitor);
            tokens.push(self.bus.on::<serde_json::Value, _, _>(
                topics::CONNECTION_RESTORED,
                "connection-monitor",
                move |_| {
                    let monitor = Arc::clone(&monitor);
                    async move {
                        monitor.apply_restored();
                    }
                },
            )?);
        }
        {
            let scheduler = Arc::clone(&self.scheduler);
            tokens.push(self.bus.on::<serde_json::Value, _, _>(
                topics::CONNECTION_RESTORED,
                "presence-grace",
                move |_| {
                    let scheduler = Arc::clone(&scheduler);
                    async move {
                        // Reconnecting inside the window leaves every
                        // presence record exactly as it was.
                        scheduler.cancel(GRACE_TIMER_KEY);
                    }
                },
            )?);
        }

        let mut held = self.tokens.lock().unwrap_or_else(|e| e.into_inner());
        held.extend(tokens);
        Ok(())
    }
}
