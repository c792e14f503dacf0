// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic record-graph usage example.
//!
//! Demonstrates:
//! 1. Registering in-memory adapters with a sync order
//! 2. Loading records (one instance per identifier)
//! 3. Change tracking against snapshots
//! 4. Rebasing local edits onto a fresh copy from storage
//! 5. Ordered sync, including a deletion
//! 6. Displaying metrics
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=record_graph=debug cargo run --example basic_usage
//! ```

use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use record_graph::{
    assign, shared, to_value, Deletable, Graph, GraphState, Identifiable, InjectOptions, MemoryAdapter, Record,
    Representable, Snapshots, Tracked, Value, ValueError,
};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Serialize)]
struct Person {
    id: Option<u64>,
    name: String,
    rating: i64,
    #[serde(skip)]
    state: GraphState,
}

impl Identifiable for Person {
    type Id = u64;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl Representable for Person {
    fn to_value(&self) -> Result<Value, ValueError> {
        to_value(self)
    }

    fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
        assign(&mut self.id, value.get("id"))?;
        assign(&mut self.name, value.get("name"))?;
        assign(&mut self.rating, value.get("rating"))
    }
}

impl Tracked for Person {
    fn graph_state(&self) -> &GraphState {
        &self.state
    }

    fn graph_state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }
}

impl Record for Person {
    const KIND: &'static str = "person";
}

#[derive(Debug, Default, Serialize)]
struct Car {
    id: Option<String>,
    model: String,
    owner: Option<u64>,
    #[serde(skip)]
    state: GraphState,
}

impl Identifiable for Car {
    type Id = String;

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Representable for Car {
    fn to_value(&self) -> Result<Value, ValueError> {
        to_value(self)
    }

    fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
        assign(&mut self.id, value.get("id"))?;
        assign(&mut self.model, value.get("model"))?;
        assign(&mut self.owner, value.get("owner"))
    }
}

impl Tracked for Car {
    fn graph_state(&self) -> &GraphState {
        &self.state
    }

    fn graph_state_mut(&mut self) -> &mut GraphState {
        &mut self.state
    }
}

impl Record for Car {
    const KIND: &'static str = "car";
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("record_graph=info")))
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           record-graph: Basic Usage Example                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Adapters and sync order
    // ─────────────────────────────────────────────────────────────────────────
    println!("📦 Registering adapters (people sync before cars)...");

    let people = Arc::new(MemoryAdapter::<Person>::new());
    let cars = Arc::new(MemoryAdapter::<Car>::new());
    people.insert_raw(1, Value::from(json!({"id": 1, "name": "Dave", "rating": 0})));
    people.insert_raw(2, Value::from(json!({"id": 2, "name": "Sue", "rating": 4})));
    cars.insert_raw("escort".into(), Value::from(json!({"id": "escort", "model": "Escort", "owner": 1})));

    let mut graph = Graph::builder()
        .sync_order(["person", "car"])
        .register::<Person>(people.clone())
        .register::<Car>(cars.clone())
        .build();
    println!("   └─ Sync order: {:?}", graph.sync_order());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Identity map
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔍 Loading Dave twice...");
    let dave = graph.find::<Person>(&1)?.ok_or("Dave missing from storage")?;
    let again = graph.find::<Person>(&1)?.ok_or("Dave missing from storage")?;
    println!("   └─ Same instance: {}", Arc::ptr_eq(&dave, &again));
    println!("   └─ Storage lookups: {}", people.lookup_count());

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Change tracking
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Rating Dave...");
    dave.write().rating = 9;
    println!("   └─ needs_sync: {}", dave.read().needs_sync());
    if let Some(changes) = dave.read().diff_from_snapshot()? {
        println!("   └─ Changes: {changes}");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Rebase
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔀 Someone renamed Dave in storage; reloading with rebase...");
    people.insert_raw(1, Value::from(json!({"id": 1, "name": "David", "rating": 0})));
    let fresh = graph.find_many::<Person>("name", &Value::from("David"))?;
    let guard = dave.read();
    println!(
        "   └─ Resident: name={}, rating={} (same instance: {})",
        guard.name,
        guard.rating,
        fresh.iter().any(|p| Arc::ptr_eq(p, &dave))
    );
    drop(guard);

    graph.find::<Person>(&2)?;
    let sue = graph.inject_with(
        shared(Person {
            id: Some(2),
            name: "Susan".into(),
            rating: 4,
            ..Person::default()
        }),
        InjectOptions::keep_existing(),
    )?;
    println!("   └─ keep_existing keeps the resident Sue: name={}", sue.read().name);

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Sync
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n💾 Selling the Escort and syncing...");
    let escort = graph.find::<Car>(&"escort".to_string())?.ok_or("Escort missing from storage")?;
    escort.write().mark_deleted();

    let report = graph.sync()?;
    println!("   └─ {report}");
    println!("   └─ Escort resident: {}", graph.contains::<Car>(&"escort".to_string()));
    if let Some(row) = people.row(&1) {
        println!("   └─ Stored Dave: {row}");
    }
    println!("   └─ needs_sync: {}", graph.needs_sync());

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics:");
    dump_metrics(&snapshotter);

    graph.clear();
    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

/// Dump all captured metrics, sorted by name
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut counters = vec![];
    let mut gauges = vec![];
    let mut histograms = vec![];

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels.join(","))
        };
        let name = key.name().to_string();

        match value {
            DebugValue::Counter(v) => counters.push((name, label_str, v)),
            DebugValue::Gauge(v) => gauges.push((name, label_str, v.into_inner())),
            DebugValue::Histogram(samples) => {
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, label_str, samples.len(), sum));
            }
        }
    }

    counters.sort();
    gauges.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    if !counters.is_empty() {
        println!("   ┌─ Counters (cumulative)");
        for (name, labels, value) in &counters {
            println!("   │  └─ {name}{labels} = {value}");
        }
    }
    if !gauges.is_empty() {
        println!("   ├─ Gauges (current value)");
        for (name, labels, value) in &gauges {
            println!("   │  └─ {name}{labels} = {value:.0}");
        }
    }
    if !histograms.is_empty() {
        println!("   └─ Histograms (distributions)");
        for (name, labels, count, sum) in &histograms {
            println!("   │  └─ {name}{labels} count={count} sum={sum:.6}");
        }
    }
    if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
}
