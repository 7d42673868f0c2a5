use super::*;

fn inbound(content: &str) -> InboundMessage {
    InboundMessage::new("cli", "user", "c1", content)
}

fn outbound(content: &str) -> OutboundMessage {
    OutboundMessage {
        channel: "cli".into(),
        chat_id: "c1".into(),
        content: content.into(),
    }
}

#[tokio::test]
async fn publish_inbound_delivers_in_fifo_order() {
    let mut bus = MessageBus::new(10, 10);
    let mut rx = bus.take_inbound_rx().unwrap();

    bus.publish_inbound(inbound("one")).await.unwrap();
    bus.publish_inbound(inbound("two")).await.unwrap();

    assert_eq!(rx.recv().await.unwrap().content, "one");
    assert_eq!(rx.recv().await.unwrap().content, "two");
}

#[tokio::test]
async fn take_inbound_rx_twice_returns_none() {
    let mut bus = MessageBus::new(10, 10);
    assert!(bus.take_inbound_rx().is_some());
    assert!(bus.take_inbound_rx().is_none());
}

#[tokio::test]
async fn try_publish_outbound_reports_full_queue() {
    let bus = MessageBus::new(10, 1);

    bus.try_publish_outbound(outbound("first")).unwrap();
    let err = bus.try_publish_outbound(outbound("second")).unwrap_err();
    assert_eq!(err.to_string(), "outbound channel full");
}

#[tokio::test]
async fn try_publish_inbound_reports_full_queue() {
    let bus = MessageBus::new(1, 10);

    bus.try_publish_inbound(inbound("tick")).unwrap();
    let err = bus.try_publish_inbound(inbound("tick")).unwrap_err();
    assert_eq!(err.to_string(), "inbound queue full");
}

#[tokio::test]
async fn outbound_drains_after_full() {
    let mut bus = MessageBus::new(10, 1);
    let mut rx = bus.take_outbound_rx().unwrap();

    bus.try_publish_outbound(outbound("first")).unwrap();
    assert!(bus.try_publish_outbound(outbound("second")).is_err());

    assert_eq!(rx.recv().await.unwrap().content, "first");
    // Capacity freed — publish succeeds again
    bus.try_publish_outbound(outbound("third")).unwrap();
}
