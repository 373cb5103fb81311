use super::*;
use crate::events::EventBus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const STEP: Duration = Duration::from_millis(10);

fn create_test_timing() -> DebounceTiming {
    DebounceTiming {
        debounce: Duration::from_millis(20),
        long_press: Duration::from_millis(600),
        stuck_line: Duration::from_secs(5),
    }
}

/// Poll a scripted debouncer once per 10ms step until the script is exhausted
fn run_script(segments: &[(LineMask, usize)]) -> (Vec<InputEvent>, Vec<LineFault>) {
    let total: usize = segments.iter().map(|(_, count)| count).sum();
    let mut debouncer = InputDebouncer::new(
        Box::new(ScriptedLines::from_segments(segments)),
        create_test_timing(),
    );

    let start = Instant::now();
    let mut events = Vec::new();
    let mut faults = Vec::new();
    for i in 0..total {
        let now = start + STEP * i as u32;
        events.extend(debouncer.poll_at(now).unwrap());
        faults.extend(debouncer.drain_faults());
    }
    (events, faults)
}

fn kinds(events: &[InputEvent]) -> Vec<(Direction, InputKind)> {
    events.iter().map(|e| (e.direction, e.kind)).collect()
}

#[test]
fn test_bounce_shorter_than_window_is_ignored() {
    // Asserted for two samples (about 15ms of contact) then released
    let (events, faults) = run_script(&[
        (LineMask::only(Direction::Up), 2),
        (LineMask::NONE, 10),
    ]);

    assert!(events.is_empty());
    assert!(faults.is_empty());
}

#[test]
fn test_long_hold_emits_long_press_without_press() {
    let (events, _) = run_script(&[
        (LineMask::only(Direction::Center), 71),
        (LineMask::NONE, 5),
    ]);

    assert_eq!(
        kinds(&events),
        vec![
            (Direction::Center, InputKind::LongPress),
            (Direction::Center, InputKind::Release),
        ]
    );
}

#[test]
fn test_short_press_emits_press_then_release() {
    let (events, _) = run_script(&[
        (LineMask::only(Direction::Left), 10),
        (LineMask::NONE, 5),
    ]);

    assert_eq!(
        kinds(&events),
        vec![
            (Direction::Left, InputKind::Press),
            (Direction::Left, InputKind::Release),
        ]
    );
    assert!(events[0].timestamp <= events[1].timestamp);
}

#[test]
fn test_release_bounce_does_not_double_fire() {
    let (events, _) = run_script(&[
        (LineMask::only(Direction::Right), 10),
        (LineMask::NONE, 1),
        (LineMask::only(Direction::Right), 3),
        (LineMask::NONE, 5),
    ]);

    assert_eq!(
        kinds(&events),
        vec![
            (Direction::Right, InputKind::Press),
            (Direction::Right, InputKind::Release),
        ]
    );
}

#[test]
fn test_lines_are_independent() {
    let both = LineMask::only(Direction::Up).with(Direction::Down);
    let (events, _) = run_script(&[
        (both, 5),
        (LineMask::only(Direction::Down), 70),
        (LineMask::NONE, 5),
    ]);

    let up: Vec<_> = events
        .iter()
        .filter(|e| e.direction == Direction::Up)
        .map(|e| e.kind)
        .collect();
    let down: Vec<_> = events
        .iter()
        .filter(|e| e.direction == Direction::Down)
        .map(|e| e.kind)
        .collect();

    assert_eq!(up, vec![InputKind::Press, InputKind::Release]);
    assert_eq!(down, vec![InputKind::LongPress, InputKind::Release]);
}

#[test]
fn test_stuck_line_reported_once() {
    let (events, faults) = run_script(&[
        (LineMask::only(Direction::Down), 700),
        (LineMask::NONE, 5),
    ]);

    assert_eq!(
        faults,
        vec![
            LineFault::Stuck(Direction::Down),
            LineFault::Cleared(Direction::Down)
        ]
    );
    assert_eq!(
        kinds(&events),
        vec![
            (Direction::Down, InputKind::LongPress),
            (Direction::Down, InputKind::Release),
        ]
    );
}

#[test]
fn test_other_lines_work_while_one_is_stuck() {
    let down = LineMask::only(Direction::Down);
    let (events, faults) = run_script(&[
        (down, 600),
        (down.with(Direction::Left), 5),
        (down, 95),
        (LineMask::NONE, 5),
    ]);

    assert_eq!(
        faults,
        vec![
            LineFault::Stuck(Direction::Down),
            LineFault::Cleared(Direction::Down)
        ]
    );
    assert_eq!(
        kinds(&events),
        vec![
            (Direction::Down, InputKind::LongPress),
            (Direction::Left, InputKind::Press),
            (Direction::Left, InputKind::Release),
            (Direction::Down, InputKind::Release),
        ]
    );
}

#[test]
fn test_read_error_propagates_and_polling_continues() {
    let mut lines = ScriptedLines::from_segments(&[(LineMask::only(Direction::Up), 5)]);
    lines.fail_next_read("device unplugged");
    let mut debouncer = InputDebouncer::new(Box::new(lines), create_test_timing());

    let now = Instant::now();
    assert!(debouncer.poll_at(now).is_err());
    assert_eq!(debouncer.poll_at(now + STEP).unwrap().count(), 0);
    assert_eq!(debouncer.poll_at(now + STEP * 4).unwrap().count(), 0);
    assert!(debouncer.held().is_asserted(Direction::Up));
}

#[test]
fn test_line_mask_bits() {
    let mask: LineMask = [Direction::Up, Direction::Center].into_iter().collect();
    assert_eq!(mask.bits(), 0b1_0001);
    assert!(mask.is_asserted(Direction::Center));
    assert!(!mask.is_asserted(Direction::Left));
    assert_eq!(LineMask::from_bits(0xff).bits(), 0b1_1111);
}

#[tokio::test]
async fn test_input_task_forwards_events() {
    let timing = DebounceTiming {
        debounce: Duration::from_millis(10),
        long_press: Duration::from_secs(2),
        stuck_line: Duration::from_secs(10),
    };
    let lines = ScriptedLines::from_segments(&[
        (LineMask::NONE, 2),
        (LineMask::only(Direction::Center), 10),
        (LineMask::NONE, 1),
    ]);
    let debouncer = InputDebouncer::new(Box::new(lines), timing);
    let event_bus = Arc::new(EventBus::new(8));

    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let handle = InputTask::new(debouncer, Duration::from_millis(5), event_bus)
        .spawn(tx, cancel.clone());

    let mut received = Vec::new();
    while received.len() < 2 {
        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("input task stalled")
            .expect("channel closed");
        if let InputMessage::Event(event) = message {
            received.push(event.kind);
        }
    }

    assert_eq!(received, vec![InputKind::Press, InputKind::Release]);

    cancel.cancel();
    handle.await.unwrap();
}

#[test]
fn test_idle_backend_opens_without_hardware() {
    let mut config = crate::config::PicamConfig::default().input;
    config.backend = crate::config::InputBackend::ScriptedIdle;

    let mut reader = open_line_reader(&config, Arc::new(EventBus::default())).unwrap();
    assert!(reader.read_lines().unwrap().is_empty());
    assert_eq!(reader.name(), "scripted");
}
