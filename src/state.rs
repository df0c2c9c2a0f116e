use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::fanout::FanoutJob;
use crate::models::device_token::DeviceToken;
use crate::models::notification::{Notification, NotificationType};
use crate::models::order::Order;
use crate::models::partner::DeliveryPartner;
use crate::models::recipient::Recipient;
use crate::models::restaurant::RestaurantLocation;
use crate::observability::metrics::Metrics;
use crate::push::client::PushClient;
use crate::realtime::RoomEnvelope;

pub struct AppState {
    pub orders: DashMap<u64, Order>,
    pub partners: DashMap<u64, DeliveryPartner>,
    pub restaurant_locations: DashMap<u64, RestaurantLocation>,
    pub device_tokens: DashMap<String, DeviceToken>,
    pub notifications: DashMap<Uuid, Notification>,
    next_order_id: AtomicU64,
    next_partner_id: AtomicU64,
    pub fanout_tx: mpsc::Sender<FanoutJob>,
    pub room_events_tx: broadcast::Sender<RoomEnvelope>,
    pub push: Arc<dyn PushClient>,
    pub geofence_radius_km: f64,
    pub push_retry_attempts: u32,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: &Config,
        push: Arc<dyn PushClient>,
    ) -> (Self, mpsc::Receiver<FanoutJob>) {
        let (fanout_tx, fanout_rx) = mpsc::channel(config.fanout_queue_size);
        let (room_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                orders: DashMap::new(),
                partners: DashMap::new(),
                restaurant_locations: DashMap::new(),
                device_tokens: DashMap::new(),
                notifications: DashMap::new(),
                next_order_id: AtomicU64::new(0),
                next_partner_id: AtomicU64::new(0),
                fanout_tx,
                room_events_tx,
                push,
                geofence_radius_km: config.geofence_radius_km,
                push_retry_attempts: config.push_retry_attempts,
                metrics: Metrics::new(),
            },
            fanout_rx,
        )
    }

    pub fn next_order_id(&self) -> u64 {
        self.next_order_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_partner_id(&self) -> u64 {
        self.next_partner_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Bounded fanout submission: never blocks the transition caller. A full
    /// queue drops the job with a log entry; the committed transition stands.
    pub fn submit_fanout(&self, job: FanoutJob) {
        match self.fanout_tx.try_send(job) {
            Ok(()) => {
                self.metrics.fanout_jobs_in_queue.inc();
            }
            Err(err) => {
                tracing::error!(error = %err, "fanout queue full; dropping job");
                self.metrics
                    .fanout_total
                    .with_label_values(&["dropped"])
                    .inc();
            }
        }
    }

    /// Appends the durable notification record for one recipient.
    pub fn persist_notification(
        &self,
        recipient: Recipient,
        title: String,
        message: String,
        notification_type: NotificationType,
        order_id: u64,
        status: &str,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient,
            title,
            message,
            notification_type,
            order_id,
            status: status.to_string(),
            created_at: Utc::now(),
        };

        self.notifications
            .insert(notification.id, notification.clone());
        self.metrics.notifications_persisted_total.inc();

        notification
    }

    pub fn active_tokens_for(&self, recipient: Recipient) -> Vec<String> {
        self.device_tokens
            .iter()
            .filter(|entry| entry.is_active && entry.recipient == recipient)
            .map(|entry| entry.token.clone())
            .collect()
    }
}
