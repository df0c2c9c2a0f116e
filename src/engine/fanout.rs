//! Notification fanout engine. Transition handlers enqueue a job after the
//! state commit and return immediately; this worker owns every downstream
//! effect: durable notification rows, push delivery, the dispatch round to
//! nearby partners, the admin topic, and realtime room broadcasts. Nothing
//! in here can fail the transition that triggered it: every error is logged
//! and absorbed, and one recipient's failure never blocks another.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::engine::{copy, matcher};
use crate::models::notification::NotificationType;
use crate::models::order::Order;
use crate::models::recipient::Recipient;
use crate::push;
use crate::push::client::{PushData, PushMessage};
use crate::realtime;
use crate::state::AppState;

pub const ADMIN_TOPIC: &str = "admin_updates";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutEvent {
    NewOrder,
    StatusChanged,
    Released,
}

/// Snapshot of one committed transition, queued for fanout.
#[derive(Debug, Clone)]
pub struct FanoutJob {
    pub order: Order,
    pub event: FanoutEvent,
    /// Wire label of the status the order just moved into.
    pub status: String,
}

impl FanoutJob {
    pub fn new_order(order: Order) -> Self {
        Self {
            order,
            event: FanoutEvent::NewOrder,
            status: "new".to_string(),
        }
    }

    pub fn status_changed(order: Order, status: &str) -> Self {
        Self {
            order,
            event: FanoutEvent::StatusChanged,
            status: status.to_string(),
        }
    }

    pub fn released(order: Order) -> Self {
        Self {
            order,
            event: FanoutEvent::Released,
            status: "released".to_string(),
        }
    }
}

pub async fn run_fanout_engine(state: Arc<AppState>, mut fanout_rx: mpsc::Receiver<FanoutJob>) {
    info!("fanout engine started");

    while let Some(job) = fanout_rx.recv().await {
        state.metrics.fanout_jobs_in_queue.dec();

        let start = Instant::now();
        let failures = process_job(&state, &job).await;
        let outcome = if failures == 0 { "success" } else { "partial" };

        state
            .metrics
            .fanout_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        state
            .metrics
            .fanout_total
            .with_label_values(&[outcome])
            .inc();

        if failures > 0 {
            warn!(
                order_id = job.order.id,
                status = %job.status,
                failures,
                "fanout completed with undelivered recipients"
            );
        }
    }

    warn!("fanout engine stopped: queue channel closed");
}

/// Runs every fanout step for one job. Returns the number of failed
/// deliveries (for metrics and logging only).
async fn process_job(state: &AppState, job: &FanoutJob) -> usize {
    let order = &job.order;
    let status = job.status.as_str();
    let mut failures = 0;

    // Durable rows first: one per non-null recipient, committed before any
    // push attempt so delivery failures can never lose the record.
    let mut pushes: Vec<(Recipient, PushMessage)> = Vec::new();

    let update_type = if job.event == FanoutEvent::Released {
        NotificationType::OrderReleased
    } else {
        NotificationType::OrderUpdate
    };

    let (title, message) = copy::customer_copy(order.id, status);
    let customer = Recipient::Customer(order.customer_id);
    state.persist_notification(
        customer,
        title.clone(),
        message.clone(),
        update_type,
        order.id,
        status,
    );
    pushes.push((
        customer,
        PushMessage::order_event(title, message, update_type, order.id, status),
    ));

    let (owner_title, owner_message, owner_type) = copy::owner_copy(order.id, status);
    let owner_type = if job.event == FanoutEvent::Released {
        NotificationType::OrderReleased
    } else {
        owner_type
    };
    let owner = Recipient::Owner(order.owner_id);
    state.persist_notification(
        owner,
        owner_title.clone(),
        owner_message.clone(),
        owner_type,
        order.id,
        status,
    );
    pushes.push((
        owner,
        PushMessage::order_event(owner_title, owner_message, owner_type, order.id, status),
    ));

    if let Some(partner_id) = order.delivery_partner_id {
        let (title, message) = copy::customer_copy(order.id, status);
        let partner = Recipient::Partner(partner_id);
        state.persist_notification(
            partner,
            title.clone(),
            message.clone(),
            update_type,
            order.id,
            status,
        );
        pushes.push((
            partner,
            PushMessage::order_event(title, message, update_type, order.id, status),
        ));
    }

    // Push to every recipient concurrently; outcomes are independent.
    let results = join_all(
        pushes
            .iter()
            .map(|(recipient, message)| push::send_to_recipient(state, *recipient, message)),
    )
    .await;
    failures += results.iter().filter(|result| result.is_err()).count();

    // Dispatch round: tell nearby online partners about an unclaimed order.
    if order.status.is_dispatchable() && order.delivery_partner_id.is_none() {
        failures += dispatch_round(state, order, status).await;
    }

    // Admin topic broadcast, independent of per-recipient outcomes.
    let admin_message = PushMessage {
        title: format!("Order #{}: {}", order.id, status),
        body: format!("Order {} has moved to {}", order.id, status),
        data: PushData {
            notification_type: "admin_order_refresh".to_string(),
            order_id: order.id.to_string(),
            status: status.to_string(),
            click_action: "FLUTTER_NOTIFICATION_CLICK".to_string(),
        },
    };
    if let Err(err) = state.push.send_to_topic(ADMIN_TOPIC, &admin_message).await {
        warn!(order_id = order.id, error = %err, "admin topic broadcast failed");
        failures += 1;
    }

    // Realtime rooms.
    realtime::emit_order_update(state, order, job.event == FanoutEvent::NewOrder);
    if order.status.is_dispatchable() && order.delivery_partner_id.is_none() {
        realtime::emit_new_available_order(state, order);
    }

    failures
}

async fn dispatch_round(state: &AppState, order: &Order, status: &str) -> usize {
    let restaurant_location = state
        .restaurant_locations
        .get(&order.restaurant_id)
        .and_then(|entry| entry.location);

    let partners: Vec<_> = state
        .partners
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    let matched = matcher::eligible_partners(
        restaurant_location.as_ref(),
        &partners,
        state.geofence_radius_km,
    );

    if matched.is_empty() {
        return 0;
    }

    let (title, message) = copy::available_order_copy(order.id);
    let mut pushes = Vec::with_capacity(matched.len());
    for partner in &matched {
        let recipient = Recipient::Partner(partner.id);
        state.persist_notification(
            recipient,
            title.clone(),
            message.clone(),
            NotificationType::NewAvailableOrder,
            order.id,
            status,
        );
        pushes.push((
            recipient,
            PushMessage::order_event(
                title.clone(),
                message.clone(),
                NotificationType::NewAvailableOrder,
                order.id,
                status,
            ),
        ));
    }

    let results = join_all(
        pushes
            .iter()
            .map(|(recipient, message)| push::send_to_recipient(state, *recipient, message)),
    )
    .await;

    results.iter().filter(|result| result.is_err()).count()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::{FanoutJob, process_job};
    use crate::config::Config;
    use crate::engine::transition::{claim_order, place_order};
    use crate::models::device_token::DeviceToken;
    use crate::models::notification::NotificationType;
    use crate::models::order::OrderStatus;
    use crate::models::partner::{DeliveryPartner, GeoPoint};
    use crate::models::recipient::Recipient;
    use crate::models::restaurant::RestaurantLocation;
    use crate::push::client::mock::RecordingPushClient;
    use crate::realtime;
    use crate::state::AppState;

    fn setup(push: RecordingPushClient) -> (AppState, Arc<RecordingPushClient>) {
        let push = Arc::new(push);
        let (state, _rx) = AppState::new(&Config::default(), push.clone());
        (state, push)
    }

    fn add_partner(state: &AppState, id: u64, location: Option<GeoPoint>) {
        state.partners.insert(
            id,
            DeliveryPartner {
                id,
                name: format!("partner-{id}"),
                is_online: true,
                is_active: true,
                location,
                rating: 4.0,
                updated_at: Utc::now(),
            },
        );
    }

    fn add_token(state: &AppState, token: &str, recipient: Recipient) {
        state.device_tokens.insert(
            token.to_string(),
            DeviceToken {
                token: token.to_string(),
                recipient,
                is_active: true,
                registered_at: Utc::now(),
            },
        );
    }

    fn rows_for(state: &AppState, recipient: Recipient) -> usize {
        state
            .notifications
            .iter()
            .filter(|entry| entry.recipient == recipient)
            .count()
    }

    #[tokio::test]
    async fn persists_one_row_per_recipient() {
        let (state, _push) = setup(RecordingPushClient::default());
        let order = place_order(&state, 10, 20, 30);

        process_job(&state, &FanoutJob::new_order(order)).await;

        assert_eq!(rows_for(&state, Recipient::Customer(30)), 1);
        assert_eq!(rows_for(&state, Recipient::Owner(20)), 1);
        assert_eq!(state.notifications.len(), 2);
    }

    #[tokio::test]
    async fn bound_partner_gets_its_own_row() {
        let (state, _push) = setup(RecordingPushClient::default());
        add_partner(&state, 7, None);
        let order = place_order(&state, 10, 20, 30);
        state.orders.get_mut(&order.id).unwrap().status = OrderStatus::Ready;
        let order = claim_order(&state, 7, order.id).unwrap();

        process_job(&state, &FanoutJob::status_changed(order, "assigned")).await;

        assert_eq!(rows_for(&state, Recipient::Partner(7)), 1);
        // assigned order: no dispatch round, exactly three rows
        assert_eq!(state.notifications.len(), 3);
    }

    #[tokio::test]
    async fn dispatch_round_notifies_only_matched_partners() {
        let (state, _push) = setup(RecordingPushClient::default());
        state.restaurant_locations.insert(
            10,
            RestaurantLocation {
                restaurant_id: 10,
                location: Some(GeoPoint {
                    lat: 12.97,
                    lng: 77.59,
                }),
            },
        );
        add_partner(&state, 1, Some(GeoPoint { lat: 12.98, lng: 77.60 }));
        add_partner(&state, 2, Some(GeoPoint { lat: 13.20, lng: 77.90 }));

        let order = place_order(&state, 10, 20, 30);
        state.orders.get_mut(&order.id).unwrap().status = OrderStatus::Ready;
        let order = state.orders.get(&order.id).unwrap().clone();

        process_job(&state, &FanoutJob::status_changed(order, "ready")).await;

        assert_eq!(rows_for(&state, Recipient::Partner(1)), 1);
        assert_eq!(rows_for(&state, Recipient::Partner(2)), 0);

        let row = state
            .notifications
            .iter()
            .find(|entry| entry.recipient == Recipient::Partner(1))
            .unwrap()
            .clone();
        assert_eq!(row.notification_type, NotificationType::NewAvailableOrder);
        assert!(row.title.contains(&format!("#{}", row.order_id)));
    }

    #[tokio::test]
    async fn push_transport_failure_never_loses_the_rows() {
        let push = RecordingPushClient {
            fail_transport: true,
            ..RecordingPushClient::default()
        };
        let (state, _push) = setup(push);
        add_token(&state, "customer-token", Recipient::Customer(30));
        add_token(&state, "owner-token", Recipient::Owner(20));

        let order = place_order(&state, 10, 20, 30);
        let failures = process_job(&state, &FanoutJob::new_order(order)).await;

        assert!(failures > 0);
        assert_eq!(state.notifications.len(), 2);
    }

    #[tokio::test]
    async fn every_job_broadcasts_the_admin_topic() {
        let (state, push) = setup(RecordingPushClient::default());
        let order = place_order(&state, 10, 20, 30);

        process_job(&state, &FanoutJob::status_changed(order, "accepted")).await;

        let topics = push.topic_sends.lock().unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].0, super::ADMIN_TOPIC);
        assert!(topics[0].1.title.contains("accepted"));
    }

    #[tokio::test]
    async fn realtime_rooms_receive_the_update() {
        let (state, _push) = setup(RecordingPushClient::default());
        let mut events = state.room_events_tx.subscribe();

        let order = place_order(&state, 10, 20, 30);
        state.orders.get_mut(&order.id).unwrap().status = OrderStatus::Ready;
        let order = state.orders.get(&order.id).unwrap().clone();

        process_job(&state, &FanoutJob::status_changed(order, "ready")).await;

        let mut rooms = Vec::new();
        while let Ok(envelope) = events.try_recv() {
            rooms.push(envelope.room);
        }

        assert!(rooms.contains(&realtime::restaurant_room(10)));
        assert!(rooms.contains(&realtime::customer_room(30)));
        assert!(rooms.contains(&realtime::GLOBAL_ADMIN_ROOM.to_string()));
        assert!(rooms.contains(&realtime::AVAILABLE_PARTNERS_ROOM.to_string()));
    }
}
