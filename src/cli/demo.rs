//! Demo application served by `purview serve`.
//!
//! ```text
//! App
//!  ├── Counter(label = "first", start = 0)
//!  ├── Counter(label = "second", start = 10)
//!  ├── button: reset all      (bumps `generation`, counters reset)
//!  └── select: theme
//! ```

use std::time::Duration;

use serde_json::{Value, json};

use crate::component::{Component, HookCx, Props, RenderCx, State};
use crate::element::{AttrValue, Element};

/// Demo root element.
pub fn app() -> Element {
    Element::component(App)
}

/// Page-level component holding the shared reset generation and the theme.
pub struct App;

impl Component for App {
    fn initial_state(&self, _props: &Props) -> Value {
        json!({ "generation": 0, "theme": "light" })
    }

    fn render(&self, cx: &RenderCx<'_>) -> Element {
        let generation = cx.get("generation").and_then(Value::as_u64).unwrap_or(0);
        let theme = cx
            .get("theme")
            .and_then(Value::as_str)
            .unwrap_or("light")
            .to_string();

        let reset = cx.handler(|cx| {
            cx.update_state(|state| json!({ "generation": read_u64(state, "generation") + 1 }))
        });
        let pick_theme = cx.handler(|cx| {
            if let Some(theme) = cx.payload().get("value").and_then(Value::as_str) {
                cx.set_state(json!({ "theme": theme }));
            }
        });

        let option = |value: &str| {
            Element::tag("option")
                .attr("value", value)
                .attr("selected", theme == value)
                .child(value)
        };

        Element::tag("main")
            .attr("class", format!("theme-{theme}"))
            .children([
                Element::tag("h1").child("purview"),
                counter("first", 0, generation),
                counter("second", 10, generation),
                Element::tag("button").on("click", reset).child("reset all"),
                Element::tag("select")
                    .on("change", pick_theme)
                    .children([option("light"), option("dark")]),
            ])
    }
}

fn counter(label: &str, start: i64, generation: u64) -> Element {
    Element::component(Counter)
        .attr("label", label)
        .attr("start", start)
        .attr("generation", generation)
}

/// Counter with immediate and delayed increments. A new `generation` prop
/// resets the count to `start`.
pub struct Counter;

impl Counter {
    fn start(props: &Props) -> i64 {
        props.get("start").and_then(AttrValue::as_f64).unwrap_or(0.0) as i64
    }

    fn generation(props: &Props) -> Option<f64> {
        props.get("generation").and_then(AttrValue::as_f64)
    }
}

impl Component for Counter {
    fn initial_state(&self, props: &Props) -> Value {
        json!({ "count": Self::start(props) })
    }

    fn render(&self, cx: &RenderCx<'_>) -> Element {
        let count = cx.get("count").and_then(Value::as_i64).unwrap_or(0);
        let label = cx
            .props()
            .get("label")
            .and_then(AttrValue::as_str)
            .unwrap_or("counter")
            .to_string();

        let step = |delta: i64| {
            cx.handler(move |cx| {
                cx.update_state(move |state| json!({ "count": read_i64(state, "count") + delta }))
            })
        };
        let later = cx.handler_future(|cx| async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            cx.update_state(|state| json!({ "count": read_i64(state, "count") + 1 }));
        });

        Element::tag("div").attr("class", "counter").children([
            Element::tag("span").attr("class", "label").child(label),
            Element::tag("button").on("click", step(-1)).child("-"),
            Element::tag("output").child(count),
            Element::tag("button").on("click", step(1)).child("+"),
            Element::tag("button").on("click", later).child("+ later"),
        ])
    }

    fn component_did_mount(&self, cx: &HookCx<'_>) {
        crate::debug!("demo"; "counter {} mounted", cx.id());
    }

    fn component_will_unmount(&self, cx: &HookCx<'_>) {
        crate::debug!("demo"; "counter {} unmounted", cx.id());
    }

    fn component_will_receive_props(&self, next: &Props, cx: &HookCx<'_>) {
        if Self::generation(next) != Self::generation(cx.props()) {
            cx.set_state(json!({ "count": Self::start(next) }));
        }
    }
}

fn read_u64(state: &State, key: &str) -> u64 {
    state.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn read_i64(state: &State, key: &str) -> i64 {
    state.get(key).and_then(Value::as_i64).unwrap_or(0)
}
