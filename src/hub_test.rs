use super::*;
use crate::message::ServerMessage;
use tokio::time::{Duration, timeout};

async fn recv_one(rx: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("message receive timed out")
        .expect("channel closed")
}

async fn assert_silent(rx: &mut mpsc::Receiver<ServerMessage>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected channel to remain empty"
    );
}

fn body() -> serde_json::Value {
    serde_json::json!({"k": "v"})
}

#[tokio::test]
async fn publish_reaches_only_subscribed_sessions() {
    let hub = WsHub::new();
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);

    let a = hub.connect(Uuid::new_v4(), tx_a);
    let _b = hub.connect(Uuid::new_v4(), tx_b);
    hub.subscribe(a, "/topic/location/nearby");

    hub.publish("/topic/location/nearby", &body());

    let msg = recv_one(&mut rx_a).await;
    assert_eq!(msg.destination, "/topic/location/nearby");
    assert_eq!(msg.body, body());
    assert_silent(&mut rx_b).await;
}

#[tokio::test]
async fn publish_to_user_ignores_subscriptions_and_hits_all_devices() {
    let hub = WsHub::new();
    let user = Uuid::new_v4();
    let (tx_1, mut rx_1) = mpsc::channel(8);
    let (tx_2, mut rx_2) = mpsc::channel(8);
    let (tx_other, mut rx_other) = mpsc::channel(8);

    hub.connect(user, tx_1);
    hub.connect(user, tx_2);
    hub.connect(Uuid::new_v4(), tx_other);

    hub.publish_to_user(user, "/queue/location/initial", &body());

    assert_eq!(recv_one(&mut rx_1).await.destination, "/queue/location/initial");
    assert_eq!(recv_one(&mut rx_2).await.destination, "/queue/location/initial");
    assert_silent(&mut rx_other).await;
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let hub = WsHub::new();
    let (tx, mut rx) = mpsc::channel(8);
    let session = hub.connect(Uuid::new_v4(), tx);

    hub.subscribe(session, "/topic/chat/1");
    hub.unsubscribe(session, "/topic/chat/1");
    hub.publish("/topic/chat/1", &body());

    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn disconnect_removes_session_from_all_indices() {
    let hub = WsHub::new();
    let user = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(8);
    let session = hub.connect(user, tx);
    hub.subscribe(session, "/topic/location/nearby");
    assert_eq!(hub.session_count(), 1);

    hub.disconnect(session);

    assert_eq!(hub.session_count(), 0);
    hub.publish("/topic/location/nearby", &body());
    hub.publish_to_user(user, "/queue/location/initial", &body());
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn publish_with_no_subscribers_is_noop() {
    let hub = WsHub::new();
    hub.publish("/topic/never/subscribed", &body());
    hub.publish_to_user(Uuid::new_v4(), "/queue/location/nearby", &body());
}

#[tokio::test]
async fn full_channel_is_skipped_without_blocking_fanout() {
    let hub = WsHub::new();
    let (tx_full, _rx_full) = mpsc::channel(1);
    let (tx_ok, mut rx_ok) = mpsc::channel(8);

    let full = hub.connect(Uuid::new_v4(), tx_full);
    let ok = hub.connect(Uuid::new_v4(), tx_ok);
    hub.subscribe(full, "/topic/location/nearby");
    hub.subscribe(ok, "/topic/location/nearby");

    // Saturate the slow session's queue.
    hub.publish("/topic/location/nearby", &body());
    // Second round overflows the slow session; the healthy one still gets it.
    hub.publish("/topic/location/nearby", &body());

    let first = recv_one(&mut rx_ok).await;
    let second = recv_one(&mut rx_ok).await;
    assert_eq!(first.destination, "/topic/location/nearby");
    assert_eq!(second.destination, "/topic/location/nearby");
}
