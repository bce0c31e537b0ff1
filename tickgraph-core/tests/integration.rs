//! Integration Tests for the Tick Engine
//!
//! These tests wire real modules into a network and check that plans, ticks
//! and the standard node library work together correctly.

use std::time::Duration;

use tickgraph_core::engine::run_until;
use tickgraph_core::nodes::{Compare, Comparison, Constant, Delay, GateKind, LogicGate, Not, Probe, ProbeHandle, Relay, Splitter};
use tickgraph_core::{EngineConfig, EngineError, ExecContext, Module, ModuleId, Network, PortLayout, Scheduler, Signal};

fn layout(compact: &str) -> PortLayout {
    PortLayout::parse(compact).unwrap()
}

fn scheduler() -> Scheduler {
    Scheduler::new(EngineConfig::default().with_seed(42)).unwrap()
}

fn probe(network: &mut Network) -> (ModuleId, ProbeHandle) {
    let (probe, handle) = Probe::new();
    (network.add(probe, layout("I...")), handle)
}

fn in_unit_range(signal: Signal) -> bool {
    (0.0..1.0).contains(&signal.value())
}

/// Test that a straight chain is ordered producer first.
#[test]
fn linear_chain_runs_in_order() {
    let mut network = Network::new();
    let a = network.add(Constant::new(0.8), layout(".O.."));
    let b = network.add(Relay, layout("IO.."));
    let (c, readings) = probe(&mut network);
    network.connect(a, 1, b, 0).unwrap();
    network.connect(b, 1, c, 0).unwrap();

    let mut scheduler = scheduler();
    let report = scheduler.tick(&mut network);

    let plan = scheduler.plan();
    assert_eq!(plan.order, vec![a, b, c]);
    assert!(plan.broken.is_empty());
    assert!(plan.sinks.contains(&c));
    assert!(report.is_clean());
    assert_eq!(report.executed, 3);
    assert_eq!(readings.last(0), Some(Signal::new(0.8)));
}

/// Test that a module fed by two branches runs once, after both.
#[test]
fn diamond_executes_join_once() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout("OO.."));
    let left = network.add(Relay, layout("IO.."));
    let right = network.add(Relay, layout("IO.."));
    let join = network.add(LogicGate::new(GateKind::And), layout("IIO."));
    let (out, readings) = probe(&mut network);
    network.connect(a, 0, left, 0).unwrap();
    network.connect(a, 1, right, 0).unwrap();
    network.connect(left, 1, join, 0).unwrap();
    network.connect(right, 1, join, 1).unwrap();
    network.connect(join, 2, out, 0).unwrap();

    let mut scheduler = scheduler();
    let report = scheduler.tick(&mut network);
    let plan = scheduler.plan();

    assert_eq!(plan.order.iter().filter(|&&id| id == join).count(), 1);
    let at = plan.position(join).unwrap();
    assert!(plan.position(left).unwrap() < at);
    assert!(plan.position(right).unwrap() < at);
    assert!(plan.position(out).unwrap() > at);
    assert!(report.is_clean());
    assert_eq!(readings.last(0), Some(Signal::HIGH));
}

/// Test that a module wired to itself is scheduled once and runs degraded.
#[test]
fn self_cycle_runs_degraded() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let x = network.add(LogicGate::new(GateKind::Or), layout("IIO."));
    network.connect(a, 1, x, 0).unwrap();
    network.connect(x, 2, x, 1).unwrap();

    let mut scheduler = scheduler();
    let report = scheduler.tick(&mut network);
    let plan = scheduler.plan();

    assert_eq!(plan.order.iter().filter(|&&id| id == x).count(), 1);
    assert!(plan.is_broken(x));
    assert!(!plan.is_broken(a));
    assert_eq!(report.degraded, 1);
    assert!(report.failures.is_empty());
}

/// Test that an unwired input flags the module but keeps it scheduled.
#[test]
fn unwired_input_runs_degraded() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let gate = network.add(LogicGate::new(GateKind::And), layout("IIO."));
    let (out, readings) = probe(&mut network);
    network.connect(a, 1, gate, 0).unwrap();
    network.connect(gate, 2, out, 0).unwrap();

    let mut scheduler = scheduler();
    let report = scheduler.tick(&mut network);
    let plan = scheduler.plan();

    assert!(plan.is_broken(gate));
    assert!(plan.contains(gate));
    assert!(plan.position(gate).unwrap() < plan.position(out).unwrap());
    assert_eq!(report.degraded, 1);
    assert!(in_unit_range(readings.last(0).unwrap()));
}

/// Test that degraded execution feeds every declared output.
#[test]
fn garbage_execution_fills_all_outputs() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    // Two declared inputs, one wired.
    let relay = network.add(Relay, layout("IIOO"));
    let (p1, h1) = probe(&mut network);
    let (p2, h2) = probe(&mut network);
    network.connect(a, 1, relay, 0).unwrap();
    network.connect(relay, 2, p1, 0).unwrap();
    network.connect(relay, 3, p2, 0).unwrap();

    let mut scheduler = scheduler();
    scheduler.tick(&mut network);

    assert!(scheduler.plan().is_broken(relay));
    assert!(in_unit_range(h1.last(0).unwrap()));
    assert!(in_unit_range(h2.last(0).unwrap()));
}

/// Test that a degraded comparator still emits a clean boolean.
#[test]
fn degraded_compare_pads_missing_inputs() {
    let mut network = Network::new();
    let a = network.add(Constant::new(0.3), layout(".O.."));
    let cmp = network.add(Compare::new(Comparison::Greater), layout("IIO."));
    let (out, readings) = probe(&mut network);
    network.connect(a, 1, cmp, 0).unwrap();
    network.connect(cmp, 2, out, 0).unwrap();

    let mut scheduler = scheduler();
    for _ in 0..5 {
        let report = scheduler.tick(&mut network);
        assert!(report.failures.is_empty());
        let value = readings.last(0).unwrap();
        assert!(value == Signal::HIGH || value == Signal::LOW);
    }
}

/// Test that boolean conversion round-trips through a signal.
#[test]
fn signal_bool_round_trip() {
    assert!(bool::from(Signal::from(true)));
    assert!(!bool::from(Signal::from(false)));
    assert!(Signal::new(0.51).is_high());
    assert!(!Signal::new(0.5).is_high());
}

/// Test that elapsed time turns into whole ticks with the remainder carried.
#[test]
fn ticks_follow_elapsed_time() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let (out, _readings) = probe(&mut network);
    network.connect(a, 1, out, 0).unwrap();

    let mut scheduler = scheduler();
    let reports = scheduler.advance(&mut network, Duration::from_millis(350));
    assert_eq!(reports.len(), 3);
    assert_eq!(scheduler.clock().carry(), Duration::from_millis(50));

    let reports = scheduler.advance(&mut network, Duration::from_millis(50));
    assert_eq!(reports.len(), 1);
    assert_eq!(scheduler.tick_count(), 4);
}

/// Test that inputs from one tick never leak into the next.
#[test]
fn inputs_are_cleared_every_tick() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let (out, readings) = probe(&mut network);
    network.connect(a, 1, out, 0).unwrap();

    let mut scheduler = scheduler();
    for _ in 0..3 {
        scheduler.tick(&mut network);
        assert_eq!(network.input(out).map(<[Signal]>::len), Some(1));
        assert_eq!(readings.snapshot().last.len(), 1);
    }
    assert_eq!(readings.samples(), 3);
}

/// Test that a delay line shifts values by whole ticks.
#[test]
fn delay_propagates_across_ticks() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let delay = network.add(Delay::new(2), layout("IO.."));
    let not = network.add(Not::default(), layout("IO.."));
    let (out, readings) = probe(&mut network);
    network.connect(a, 1, delay, 0).unwrap();
    network.connect(delay, 1, not, 0).unwrap();
    network.connect(not, 1, out, 0).unwrap();

    let mut scheduler = scheduler();
    let seen: Vec<Signal> = (0..4)
        .map(|_| {
            scheduler.tick(&mut network);
            readings.last(0).unwrap()
        })
        .collect();
    assert_eq!(seen, vec![Signal::HIGH, Signal::HIGH, Signal::LOW, Signal::LOW]);
}

/// Test that edits between ticks are picked up at the next boundary.
#[test]
fn rebuild_follows_network_edits() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let split = network.add(Splitter::new(0.5), layout("IOO."));
    let (p1, h1) = probe(&mut network);
    network.connect(a, 1, split, 0).unwrap();
    network.connect(split, 1, p1, 0).unwrap();

    let mut scheduler = scheduler();
    assert!(!h1.is_live());
    scheduler.tick(&mut network);
    assert!(h1.is_live());
    assert_eq!(h1.last(0), Some(Signal::new(0.5)));

    let (p2, h2) = probe(&mut network);
    network.connect(split, 2, p2, 0).unwrap();
    assert!(scheduler.rebuild_pending(&network));
    scheduler.tick(&mut network);
    assert!(scheduler.plan().contains(p2));
    assert_eq!(h2.last(0), Some(Signal::new(0.5)));

    network.remove(split);
    scheduler.tick(&mut network);
    let plan = scheduler.plan();
    assert_eq!(plan.order, vec![a]);
    assert!(!plan.contains(p1));
}

/// Test that connecting an occupied port is rejected.
#[test]
fn occupied_port_is_rejected() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let b = network.add(Relay, layout("IO.."));
    let c = network.add(Relay, layout("IO.."));
    network.connect(a, 1, b, 0).unwrap();

    let err = network.connect(a, 1, c, 0).unwrap_err();
    assert!(matches!(err, EngineError::PortOccupied { module, port: 1 } if module == a));
}

/// Test that the plan serializes with raw module ids.
#[test]
fn plan_serializes_to_json() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let (out, _readings) = probe(&mut network);
    network.connect(a, 1, out, 0).unwrap();

    let mut scheduler = scheduler();
    scheduler.rebuild(&mut network);
    let json: serde_json::Value = serde_json::from_str(&scheduler.plan().to_json().unwrap()).unwrap();

    assert_eq!(json["order"], serde_json::json!([a.raw(), out.raw()]));
    assert_eq!(json["sinks"], serde_json::json!([out.raw()]));
    assert_eq!(json["broken"], serde_json::json!([]));
}

/// Module that pushes fewer values than it has outputs.
struct ShortPush;

impl Module for ShortPush {
    fn kind(&self) -> &'static str {
        "short-push"
    }

    fn execute(&mut self, ctx: &mut ExecContext<'_>) -> tickgraph_core::Result<()> {
        ctx.push(&[Signal::HIGH])
    }

    fn is_execution_source(&self) -> bool {
        true
    }
}

/// Test that contract violations are reported without stopping the tick.
#[test]
fn push_count_mismatch_is_reported() {
    let mut network = Network::new();
    let bad = network.add(ShortPush, layout("OO.."));
    let (p1, h1) = probe(&mut network);
    let (p2, _h2) = probe(&mut network);
    network.connect(bad, 0, p1, 0).unwrap();
    network.connect(bad, 1, p2, 0).unwrap();

    let mut scheduler = scheduler();
    let report = scheduler.tick(&mut network);

    assert_eq!(report.executed, 3);
    assert!(report
        .failures
        .iter()
        .any(|f| f.module == bad && matches!(f.error, EngineError::OutputCountMismatch { expected: 2, got: 1, .. })));
    // Downstream still runs, just without input.
    assert_eq!(h1.samples(), 1);
    assert_eq!(h1.last(0), None);
}

/// Test that the async driver ticks in simulated time.
#[tokio::test(start_paused = true)]
async fn driver_runs_until_shutdown() {
    let mut network = Network::new();
    let a = network.add(Constant::new(1.0), layout(".O.."));
    let (out, readings) = probe(&mut network);
    network.connect(a, 1, out, 0).unwrap();

    let mut scheduler = scheduler();
    let ticks = run_until(&mut scheduler, &mut network, tokio::time::sleep(Duration::from_millis(505))).await;

    assert!((4..=5).contains(&ticks), "ticks = {ticks}");
    assert_eq!(readings.samples(), ticks);
}
