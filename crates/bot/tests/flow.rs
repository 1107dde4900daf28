//! Interactive sessions, short links and the JSON-lines bridge.

use async_trait::async_trait;
use lastmile_bot::report::{CHOICE_PROMPT, CODE_PROMPT};
use lastmile_bot::{
    memory_ports, AccessPolicy, Dispatcher, FeasibilityService, InMemoryOrders, InboundMessage, JsonLinesInbound,
    JsonLinesOutbound, MemoryPorts, OutboundMessage, SessionState, TechnologyEntry,
};
use lastmile_core::config::AccessConfig;
use lastmile_geo::{haversine_distance, Coordinate, DistanceMetric, FacilityRecord, FacilitySet, MetricError, Technology};
use lastmile_routing::{LinkResolver, RoutingResult, ShortLinkExpander};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const CHAT: &str = "-4767087972";

fn service() -> FeasibilityService {
    let towers = FacilitySet::new(
        Technology::Wireless,
        vec![FacilityRecord::new(Coordinate::new(12.3480, 67.8900))],
    );
    FeasibilityService::builder()
        .technology(TechnologyEntry::geodesic(towers, 500.0))
        .build()
}

struct FixedRedirect {
    target: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LinkResolver for FixedRedirect {
    async fn resolve(&self, _url: &str) -> RoutingResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.target.to_string())
    }
}

#[tokio::test]
async fn interactive_new_check_and_order_status() {
    let mut ports = memory_ports(8);
    let orders = InMemoryOrders::new().with("ORD-4821", "Installation scheduled for Friday");
    let dispatcher = Dispatcher::builder(service(), Arc::new(ports.outbound.clone()))
        .interactive(true)
        .orders(Arc::new(orders))
        .build();

    dispatcher.handle(InboundMessage::location(CHAT, 12.345, 67.89)).await;
    assert_eq!(ports.outbox.recv().await.unwrap().text, CHOICE_PROMPT);
    assert!(matches!(dispatcher.session_state(CHAT), SessionState::AwaitingChoice { .. }));

    dispatcher.handle(InboundMessage::text(CHAT, "2")).await;
    assert_eq!(ports.outbox.recv().await.unwrap().text, CODE_PROMPT);
    assert_eq!(dispatcher.session_state(CHAT), SessionState::AwaitingFollowupCode);

    dispatcher.handle(InboundMessage::text(CHAT, "ord-4821")).await;
    assert_eq!(
        ports.outbox.recv().await.unwrap().text,
        "Order ord-4821: Installation scheduled for Friday"
    );
    assert_eq!(dispatcher.session_state(CHAT), SessionState::AwaitingLocation);

    dispatcher.handle(InboundMessage::text(CHAT, "12.345,67.89")).await;
    assert_eq!(ports.outbox.recv().await.unwrap().text, CHOICE_PROMPT);
    dispatcher.handle(InboundMessage::text(CHAT, "1")).await;
    let result = ports.outbox.recv().await.unwrap();
    assert!(result.text.contains("Wireless: Feasible"), "{}", result.text);

    // Unrelated text after the result gets no reply
    dispatcher.handle(InboundMessage::text(CHAT, "thanks")).await;
    assert!(ports.outbox.try_recv().is_err());
}

#[tokio::test]
async fn acknowledgement_precedes_result() {
    let mut ports = memory_ports(8);
    let dispatcher = Dispatcher::builder(service(), Arc::new(ports.outbound.clone()))
        .acknowledge(true)
        .build();

    dispatcher.handle(InboundMessage::location(CHAT, 12.345, 67.89)).await;

    let ack = ports.outbox.recv().await.unwrap();
    assert_eq!(ack.text, "Processing request... Lat: 12.345, Lon: 67.89. Please wait...");
    let result = ports.outbox.recv().await.unwrap();
    assert!(result.text.contains("Wireless"));
}

#[tokio::test]
async fn short_link_is_expanded_once() {
    let mut ports = memory_ports(8);
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver: Box<dyn LinkResolver> = Box::new(FixedRedirect {
        target: "https://www.google.com/maps/place/Site/@12.345,67.89,17z/data=x",
        calls: Arc::clone(&calls),
    });
    let dispatcher = Dispatcher::builder(service(), Arc::new(ports.outbound.clone()))
        .links(ShortLinkExpander::new(resolver))
        .build();

    for _ in 0..2 {
        dispatcher
            .handle(InboundMessage::text(CHAT, "see https://maps.app.goo.gl/q1w2e3r4"))
            .await;
        let reply = ports.outbox.recv().await.unwrap();
        assert!(reply.text.starts_with("Location: 12.345, 67.89"), "{}", reply.text);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_caller_gets_configured_reply() {
    let mut ports = memory_ports(8);
    let access = AccessPolicy::from_config(&AccessConfig {
        allow_list: vec!["-1002341717383".into()],
        detailed: Vec::new(),
        reject_message: Some("You can't access this bot. Contact the owner.".into()),
    });
    let dispatcher = Dispatcher::builder(service(), Arc::new(ports.outbound.clone()))
        .access(access)
        .build();

    dispatcher.handle(InboundMessage::location(CHAT, 12.345, 67.89)).await;

    let reply = ports.outbox.recv().await.unwrap();
    assert_eq!(reply, OutboundMessage::new(CHAT, "You can't access this bot. Contact the owner."));
}

#[tokio::test]
async fn run_drains_channel_ports() {
    let ports = memory_ports(8);
    let dispatcher = Dispatcher::builder(service(), Arc::new(ports.outbound.clone())).build();
    let mut outbox = ports.outbox;

    for chat in ["a", "b", "c"] {
        ports.inbox.send(InboundMessage::location(chat, 12.345, 67.89)).await.unwrap();
    }
    ports.inbox.send(InboundMessage::text("d", "hello")).await.unwrap();
    drop(ports.inbox);

    assert_eq!(dispatcher.run(ports.inbound).await, 4);

    let mut chats = Vec::new();
    while let Ok(reply) = outbox.try_recv() {
        chats.push(reply.chat_id);
    }
    chats.sort();
    assert_eq!(chats, vec!["a", "b", "c"]);
}

/// Slow routing for points north of 50 degrees, instant elsewhere.
struct SlowInTheNorth;

#[async_trait]
impl DistanceMetric for SlowInTheNorth {
    fn name(&self) -> &'static str {
        "slow-in-the-north"
    }

    async fn distance_km(&self, from: &Coordinate, to: &Coordinate) -> Result<f64, MetricError> {
        if from.latitude > 50.0 {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        Ok(haversine_distance(from, to))
    }
}

#[tokio::test]
async fn slow_chat_does_not_hold_up_others() {
    let towers = FacilitySet::new(
        Technology::Wireless,
        vec![FacilityRecord::new(Coordinate::new(12.3480, 67.8900))],
    );
    let service = FeasibilityService::builder()
        .technology(TechnologyEntry::new(towers, 500.0, Arc::new(SlowInTheNorth)))
        .timeout(Duration::from_secs(10))
        .build();
    let MemoryPorts {
        inbox,
        inbound,
        outbound,
        mut outbox,
    } = memory_ports(8);
    let dispatcher = Dispatcher::builder(service, Arc::new(outbound)).build();
    let running = tokio::spawn(async move { dispatcher.run(inbound).await });

    inbox.send(InboundMessage::location("slow", 60.0, 10.0)).await.unwrap();
    inbox.send(InboundMessage::location("fast", 12.345, 67.89)).await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), outbox.recv())
        .await
        .expect("fast chat answered while the slow one was still resolving")
        .unwrap();
    assert_eq!(first.chat_id, "fast");

    let second = outbox.recv().await.unwrap();
    assert_eq!(second.chat_id, "slow");

    drop(inbox);
    assert_eq!(running.await.unwrap(), 2);
}

#[tokio::test]
async fn json_lines_bridge_round_trip() {
    let input = concat!(
        r#"{"chat_id":"-100","type":"location","latitude":12.345,"longitude":67.89}"#,
        "\n",
        "garbage\n",
        r#"{"chat_id":"-200","type":"text","text":"not a location"}"#,
        "\n",
        r#"{"chat_id":"-300","type":"text","text":"12.3450,67.8900"}"#,
        "\n",
    );
    let (writer, reader) = tokio::io::duplex(64 * 1024);
    let dispatcher = Dispatcher::builder(service(), Arc::new(JsonLinesOutbound::new(writer))).build();

    let received = dispatcher
        .run(JsonLinesInbound::new(BufReader::new(input.as_bytes())))
        .await;
    assert_eq!(received, 3);

    let mut lines = BufReader::new(reader).lines();
    let mut replies = Vec::new();
    for _ in 0..2 {
        let line = lines.next_line().await.unwrap().unwrap();
        let reply: OutboundMessage = serde_json::from_str(&line).unwrap();
        replies.push(reply.chat_id);
    }
    replies.sort();
    assert_eq!(replies, vec!["-100", "-300"]);
}
