use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};

use super::*;
use crate::component::{Component, ComponentRef, HookCx, Props, RenderCx, State};
use crate::config::RuntimeConfig;
use crate::element::{AttrValue, Element, create_elem};
use crate::{attrs, children};

type Log = Arc<Mutex<Vec<String>>>;

async fn recv(conn: &mut ConnectionHandle) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(2), conn.recv())
        .await
        .expect("timed out waiting for a server message")
        .expect("connection closed")
}

async fn recv_update(conn: &mut ConnectionHandle) -> (String, String) {
    match recv(conn).await {
        ServerMessage::Update { component_id, html } => (component_id, html),
        other => panic!("expected update, got {other:?}"),
    }
}

/// Wait for the actor to drain its queue, then assert nothing was sent.
async fn assert_quiet(conn: &mut ConnectionHandle) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(conn.try_recv(), None);
}

async fn connect(conn: &mut ConnectionHandle, roots: &[&str]) {
    conn.send(&ClientMessage::connect(roots.iter().copied()));
    assert_eq!(recv(conn).await, ServerMessage::Connected);
}

fn attr_values(html: &str, name: &str) -> Vec<String> {
    let needle = format!("{name}=\"");
    html.match_indices(&needle)
        .map(|(at, _)| {
            let start = at + needle.len();
            let end = start + html[start..].find('"').unwrap_or(0);
            html[start..end].to_string()
        })
        .collect()
}

fn clicks(html: &str) -> Vec<String> {
    attr_values(html, "data-onclick")
}

fn number(state: &State, key: &str) -> i64 {
    state.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn increment(key: &'static str) -> impl Fn(&EventCx) + Send + Sync + 'static {
    move |cx| {
        cx.update_state(move |s| {
            let mut partial = State::new();
            partial.insert(key.to_string(), json!(number(s, key) + 1));
            Value::Object(partial)
        })
    }
}

// -----------------------------------------------------------------------------
// fixtures
// -----------------------------------------------------------------------------

struct Greeting;

impl Component for Greeting {
    fn initial_state(&self, _props: &Props) -> Value {
        json!({ "text": "hi" })
    }

    fn render(&self, cx: &RenderCx<'_>) -> Element {
        let text = cx.get("text").and_then(Value::as_str).unwrap_or_default();
        Element::tag("p")
            .on("click", cx.handler(|cx| cx.set_state(json!({ "text": "hello" }))))
            .on(
                "input",
                cx.handler(|cx| {
                    if let Some(value) = cx.payload().get("value").cloned() {
                        cx.set_state(json!({ "text": value }));
                    }
                }),
            )
            .child(text.to_string())
    }
}

struct Counter;

impl Component for Counter {
    fn initial_state(&self, props: &Props) -> Value {
        let start = props.get("start").and_then(AttrValue::as_f64).unwrap_or(0.0) as i64;
        json!({ "count": start })
    }

    fn render(&self, cx: &RenderCx<'_>) -> Element {
        create_elem(
            "div",
            None,
            children![
                Element::tag("button").on("click", cx.handler(increment("count"))).child("+"),
                create_elem("b", None, number(cx.state(), "count")),
            ],
        )
    }
}

struct Clicker;

impl Component for Clicker {
    fn render(&self, cx: &RenderCx<'_>) -> Element {
        create_elem(
            "div",
            None,
            children![
                Element::tag("button").on("click", cx.handler(increment("clicks"))).child("more"),
                create_elem("span", None, format!("clicks: {}", number(cx.state(), "clicks"))),
                create_elem(ComponentRef::new(Counter), attrs! { "start" => 100 }, ()),
            ],
        )
    }
}

struct Tracker {
    log: Log,
}

impl Component for Tracker {
    fn render(&self, cx: &RenderCx<'_>) -> Element {
        Element::tag("div")
            .on("click", cx.handler(increment("n")))
            .child(number(cx.state(), "n"))
    }

    fn component_did_mount(&self, _cx: &HookCx<'_>) {
        self.log.lock().push("mount".into());
    }

    fn component_will_unmount(&self, _cx: &HookCx<'_>) {
        self.log.lock().push("unmount".into());
    }
}

struct PropsProbe {
    log: Log,
}

impl Component for PropsProbe {
    fn render(&self, cx: &RenderCx<'_>) -> Element {
        create_elem("i", None, cx.props().get("count").map(AttrValue::to_attr_text))
    }

    fn component_will_receive_props(&self, next: &Props, _cx: &HookCx<'_>) {
        self.log.lock().push(next.to_json().to_string());
    }
}

struct PropsParent {
    log: Log,
}

impl Component for PropsParent {
    fn render(&self, cx: &RenderCx<'_>) -> Element {
        let probe = Element::component(PropsProbe {
            log: Arc::clone(&self.log),
        })
        .attr("count", number(cx.state(), "count"));
        Element::tag("div")
            .on("click", cx.handler(increment("count")))
            .child(probe)
    }
}

// -----------------------------------------------------------------------------
// protocol flow
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_event_updates_owning_root() {
    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Greeting)).unwrap();
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    conn.send(&ClientMessage::event(&clicks(&html)[0]));
    let (id, html) = recv_update(&mut conn).await;
    assert_eq!(id, root);
    assert!(html.contains(">hello</p>"));
}

#[tokio::test]
async fn test_nested_counter_updates_only_child() {
    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Clicker)).unwrap();
    let ids = attr_values(&html, "data-component-id");
    assert_eq!(ids.len(), 2);
    let tokens = clicks(&html);
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    conn.send(&ClientMessage::event(&tokens[1]));
    let (id, html) = recv_update(&mut conn).await;
    assert_eq!(id, ids[1]);
    assert!(html.contains("<b>101</b>"));

    conn.send(&ClientMessage::event(&tokens[0]));
    let (id, html) = recv_update(&mut conn).await;
    assert_eq!(id, root);
    assert!(html.contains("clicks: 1"));
    assert!(html.contains("<b>101</b>"));
    assert_quiet(&mut conn).await;
}

#[tokio::test]
async fn test_event_payload_reaches_handler() {
    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Greeting)).unwrap();
    let token = attr_values(&html, "data-oninput").remove(0);
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    conn.send_text(json!({ "type": "event", "eventID": token, "value": "typed" }).to_string());
    let (_, html) = recv_update(&mut conn).await;
    assert!(html.contains(">typed</p>"));
}

#[tokio::test]
async fn test_events_before_connect_are_ignored() {
    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Greeting)).unwrap();
    let mut conn = runtime.open_connection();

    conn.send(&ClientMessage::event(&clicks(&html)[0]));
    connect(&mut conn, &[&root]).await;
    assert_quiet(&mut conn).await;
}

#[tokio::test]
async fn test_stale_token_is_dropped() {
    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Counter)).unwrap();
    let stale = clicks(&html).remove(0);
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    conn.send(&ClientMessage::event(&stale));
    let (_, html) = recv_update(&mut conn).await;
    assert!(html.contains("<b>1</b>"));
    let fresh = clicks(&html).remove(0);

    conn.send(&ClientMessage::event(&stale));
    conn.send(&ClientMessage::event(&fresh));
    let (_, html) = recv_update(&mut conn).await;
    assert!(html.contains("<b>2</b>"));
    assert_quiet(&mut conn).await;
}

#[tokio::test]
async fn test_malformed_messages_are_discarded() {
    let runtime = Runtime::default();
    let (root, _) = runtime.render_root(&Element::component(Greeting)).unwrap();
    let mut conn = runtime.open_connection();

    conn.send_text("not json");
    conn.send_text(r#"{"type":"bogus"}"#);
    conn.send_text(r#"{"type":"event"}"#);
    connect(&mut conn, &[&root]).await;
}

#[tokio::test]
async fn test_unknown_roots_are_skipped() {
    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Greeting)).unwrap();
    let mut conn = runtime.open_connection();
    connect(&mut conn, &["nope", &root]).await;

    conn.send(&ClientMessage::event(&clicks(&html)[0]));
    let (id, _) = recv_update(&mut conn).await;
    assert_eq!(id, root);
}

#[tokio::test]
async fn test_state_set_outside_events_is_pushed() {
    let runtime = Runtime::default();
    let (root, _) = runtime.render_root(&Element::component(Greeting)).unwrap();
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    runtime.handle(&root).unwrap().set_state(json!({ "text": "pushed" }));
    let (id, html) = recv_update(&mut conn).await;
    assert_eq!(id, root);
    assert!(html.contains(">pushed</p>"));
}

// -----------------------------------------------------------------------------
// handlers
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_async_handler_update_is_flushed() {
    struct Slow;
    impl Component for Slow {
        fn render(&self, cx: &RenderCx<'_>) -> Element {
            let done = cx.get("done").and_then(Value::as_bool).unwrap_or(false);
            Element::tag("p")
                .on(
                    "click",
                    cx.handler_future(|cx| async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        cx.set_state(json!({ "done": true }));
                    }),
                )
                .child(if done { "done" } else { "waiting" })
        }
    }

    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Slow)).unwrap();
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    conn.send(&ClientMessage::event(&clicks(&html)[0]));
    let (_, html) = recv_update(&mut conn).await;
    assert!(html.contains(">done</p>"));
}

#[tokio::test]
async fn test_panicking_handler_keeps_connection() {
    struct Fussy;
    impl Component for Fussy {
        fn render(&self, cx: &RenderCx<'_>) -> Element {
            create_elem(
                "div",
                None,
                children![
                    Element::tag("button").on("click", cx.handler(|_| panic!("handler broke"))),
                    Element::tag("button")
                        .on("click", cx.handler(increment("n")))
                        .child(number(cx.state(), "n")),
                ],
            )
        }
    }

    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Fussy)).unwrap();
    let tokens = clicks(&html);
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    conn.send(&ClientMessage::event(&tokens[0]));
    conn.send(&ClientMessage::event(&tokens[1]));
    let (id, html) = recv_update(&mut conn).await;
    assert_eq!(id, root);
    assert!(html.contains(">1</button>"));
}

#[tokio::test]
async fn test_will_receive_props_gets_attributes_and_children() {
    let log = Log::default();
    let runtime = Runtime::default();
    let element = Element::component(PropsParent {
        log: Arc::clone(&log),
    });
    let (root, html) = runtime.render_root(&element).unwrap();
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;
    assert!(log.lock().is_empty());

    conn.send(&ClientMessage::event(&clicks(&html)[0]));
    let (_, html) = recv_update(&mut conn).await;
    assert!(html.contains(">1</i>"));

    let received: Value = serde_json::from_str(&log.lock()[0]).unwrap();
    assert_eq!(received, json!({ "count": 1, "children": [] }));
}

// -----------------------------------------------------------------------------
// lifecycle
// -----------------------------------------------------------------------------

#[tokio::test]
async fn test_did_mount_fires_before_connected() {
    let log = Log::default();
    let runtime = Runtime::default();
    let element = Element::component(Tracker {
        log: Arc::clone(&log),
    });
    let (root, _) = runtime.render_root(&element).unwrap();
    assert!(log.lock().is_empty());

    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;
    assert_eq!(*log.lock(), vec!["mount"]);
}

#[tokio::test]
async fn test_close_unmounts_after_grace() {
    let log = Log::default();
    let runtime = Runtime::new(RuntimeConfig {
        unmount_grace_ms: 10,
        ..RuntimeConfig::default()
    });
    let element = Element::component(Tracker {
        log: Arc::clone(&log),
    });
    let (root, _) = runtime.render_root(&element).unwrap();
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&root]).await;

    conn.close();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!runtime.has_root(&root));
    assert_eq!(*log.lock(), vec!["mount", "unmount"]);
}

#[tokio::test]
async fn test_reconnect_within_grace_keeps_root() {
    let log = Log::default();
    let runtime = Runtime::new(RuntimeConfig {
        unmount_grace_ms: 200,
        ..RuntimeConfig::default()
    });
    let element = Element::component(Tracker {
        log: Arc::clone(&log),
    });
    let (root, html) = runtime.render_root(&element).unwrap();

    let mut first = runtime.open_connection();
    connect(&mut first, &[&root]).await;
    first.close();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut second = runtime.open_connection();
    connect(&mut second, &[&root]).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(runtime.has_root(&root));
    assert_eq!(*log.lock(), vec!["mount"]);

    second.send(&ClientMessage::event(&clicks(&html)[0]));
    let (id, _) = recv_update(&mut second).await;
    assert_eq!(id, root);
}

#[tokio::test]
async fn test_new_connection_takes_over_root() {
    let runtime = Runtime::default();
    let (root, _) = runtime.render_root(&Element::component(Greeting)).unwrap();

    let mut first = runtime.open_connection();
    connect(&mut first, &[&root]).await;
    let mut second = runtime.open_connection();
    connect(&mut second, &[&root]).await;

    runtime.handle(&root).unwrap().set_state(json!({ "text": "moved" }));
    let (_, html) = recv_update(&mut second).await;
    assert!(html.contains("moved"));
    assert_quiet(&mut first).await;
}

#[tokio::test]
async fn test_earlier_connection_keeps_root_after_takeover_closes() {
    let runtime = Runtime::default();
    let (root, html) = runtime.render_root(&Element::component(Greeting)).unwrap();

    let mut first = runtime.open_connection();
    connect(&mut first, &[&root]).await;
    let mut second = runtime.open_connection();
    connect(&mut second, &[&root]).await;

    second.close();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(runtime.has_root(&root));

    first.send(&ClientMessage::event(&clicks(&html)[0]));
    let (id, html) = recv_update(&mut first).await;
    assert_eq!(id, root);
    assert!(html.contains(">hello</p>"));

    runtime.handle(&root).unwrap().set_state(json!({ "text": "back" }));
    let (_, html) = recv_update(&mut first).await;
    assert!(html.contains(">back</p>"));
}

// -----------------------------------------------------------------------------
// ordering
// -----------------------------------------------------------------------------

/// Writes its label into state and a shared log, optionally after a delay.
struct Stamp {
    label: &'static str,
    delay_ms: u64,
    log: Log,
}

impl Component for Stamp {
    fn render(&self, cx: &RenderCx<'_>) -> Element {
        let (label, log) = (self.label, Arc::clone(&self.log));
        let handler = if self.delay_ms == 0 {
            cx.handler(move |cx| {
                log.lock().push(label.into());
                cx.set_state(json!({ "text": label }));
            })
        } else {
            let delay = Duration::from_millis(self.delay_ms);
            cx.handler_future(move |cx| {
                let log = Arc::clone(&log);
                async move {
                    tokio::time::sleep(delay).await;
                    log.lock().push(label.into());
                    cx.set_state(json!({ "text": label }));
                }
            })
        };
        let text = cx.get("text").and_then(Value::as_str).unwrap_or("idle");
        Element::tag("p").on("click", handler).child(text.to_string())
    }
}

#[tokio::test]
async fn test_events_wait_behind_async_handler() {
    let log = Log::default();
    let runtime = Runtime::default();
    let stamp = |label, delay_ms| {
        Element::component(Stamp {
            label,
            delay_ms,
            log: Arc::clone(&log),
        })
    };
    let (slow_root, slow_html) = runtime.render_root(&stamp("slow", 50)).unwrap();
    let (fast_root, fast_html) = runtime.render_root(&stamp("fast", 0)).unwrap();
    let mut conn = runtime.open_connection();
    connect(&mut conn, &[&slow_root, &fast_root]).await;

    conn.send(&ClientMessage::event(&clicks(&slow_html)[0]));
    conn.send(&ClientMessage::event(&clicks(&fast_html)[0]));

    let (id, html) = recv_update(&mut conn).await;
    assert_eq!(id, slow_root);
    assert!(html.contains(">slow</p>"));
    let (id, html) = recv_update(&mut conn).await;
    assert_eq!(id, fast_root);
    assert!(html.contains(">fast</p>"));
    assert_eq!(*log.lock(), vec!["slow", "fast"]);
    assert_quiet(&mut conn).await;
}
