//! Scheduler behaviour driven through the mock timer

use super::config::{DEFAULT_FALLBACK_CHANNEL, DEFAULT_MIN_ARM_TICKS, DEFAULT_PRIMARY_CHANNEL};
use super::*;
use crate::core::traits::{CriticalState, MockState, SharedState};
use crate::platform::mock::MockTimerHardware;
use crate::platform::traits::{CounterWidth, TimerHardware};
use crate::platform::TimerError;

type TestScheduler = Scheduler<MockTimerHardware, RecordingSink<128>, 8>;

fn scheduler(hw: MockTimerHardware) -> TestScheduler {
    Scheduler::with_defaults(hw, RecordingSink::new())
}

/// Let `ticks` of hardware time pass, taking every compare interrupt on the way
fn run_for<K: EventSink, const N: usize>(
    sched: &mut Scheduler<MockTimerHardware, K, N>,
    ticks: u32,
) -> usize {
    let mut remaining = ticks;
    let mut fired = 0;
    while let Some((channel, used)) = sched.hardware_mut().step(remaining) {
        remaining -= used;
        fired += sched.on_compare_match(channel);
    }
    fired
}

/// Like `run_for`, also recording the clock at every interrupt that fired something
fn fire_times<K: EventSink, const N: usize>(
    sched: &mut Scheduler<MockTimerHardware, K, N>,
    ticks: u32,
) -> std::vec::Vec<u64> {
    let mut remaining = ticks;
    let mut times = std::vec::Vec::new();
    while let Some((channel, used)) = sched.hardware_mut().step(remaining) {
        remaining -= used;
        if sched.on_compare_match(channel) > 0 {
            times.push(sched.time_us());
        }
    }
    times
}

#[test]
fn test_construction_arms_fallback_only() {
    let sched = scheduler(MockTimerHardware::default());
    let hw = sched.hardware();
    assert_eq!(hw.compare(0), Some(10_000_000));
    assert_eq!(hw.compare(1), None);
    assert!(hw.interrupts_enabled());
    assert_eq!(sched.pending(), 0);
    assert_eq!(sched.capacity(), 8);
}

#[test]
fn test_invalid_config_rejected() {
    let config = TimerConfig::default().with_channels(2, 2);
    let result: crate::platform::Result<TestScheduler> =
        Scheduler::new(MockTimerHardware::default(), RecordingSink::new(), config);
    assert!(matches!(result, Err(TimerError::InvalidParameter)));
}

#[test]
fn test_fallback_shorter_than_min_arm_rejected() {
    // 5 us at 1 MHz leaves a 5 tick fallback, below the 10 tick minimum
    let config = TimerConfig::default().with_fallback_interval_us(5);
    assert!(config.validate().is_ok());
    let result: crate::platform::Result<TestScheduler> =
        Scheduler::new(MockTimerHardware::default(), RecordingSink::new(), config);
    assert!(matches!(result, Err(TimerError::InvalidParameter)));
}

#[test]
fn test_min_arm_beyond_half_16_bit_range_rejected() {
    let config = TimerConfig::default().with_min_arm_ticks(40_000);
    assert!(config.validate().is_ok());
    let hw = MockTimerHardware::new(CounterWidth::Bits16, 1_000_000);
    let result: crate::platform::Result<TestScheduler> =
        Scheduler::new(hw, RecordingSink::new(), config);
    assert!(matches!(result, Err(TimerError::InvalidParameter)));

    // Same distance fits a 32-bit counter
    let result: crate::platform::Result<TestScheduler> =
        Scheduler::new(MockTimerHardware::default(), RecordingSink::new(), config);
    assert!(result.is_ok());
}

#[test]
fn test_min_arm_equal_to_fallback_arms_at_that_distance() {
    let config = TimerConfig::default()
        .with_fallback_interval_us(10)
        .with_min_arm_ticks(10);
    let mut sched: TestScheduler =
        Scheduler::new(MockTimerHardware::default(), RecordingSink::new(), config).unwrap();
    sched.schedule_after(1, 1, 0, EventFlags::empty()).unwrap();
    assert_eq!(sched.hardware().ticks_until(DEFAULT_PRIMARY_CHANNEL), Some(10));
    assert_eq!(sched.hardware().ticks_until(DEFAULT_FALLBACK_CHANNEL), Some(10));

    assert_eq!(run_for(&mut sched, 1_000), 1);
    assert_eq!(sched.sink().fired(), &[(1, 0)]);
}

#[test]
fn test_time_starts_at_construction() {
    let hw = MockTimerHardware::default().with_counter(123_456);
    let mut sched = scheduler(hw);
    assert_eq!(sched.time_us(), 0);
    sched.hardware_mut().advance(2_750);
    assert_eq!(sched.time_us(), 2_750);
    assert_eq!(sched.time(), 2);
}

#[test]
fn test_time_monotonic_across_16_bit_wraps() {
    let mut sched = scheduler(MockTimerHardware::new(CounterWidth::Bits16, 1_000_000));
    sched
        .schedule_every(100, 1, 0, EventFlags::empty())
        .unwrap();

    let times = fire_times(&mut sched, 1_000_000);
    assert_eq!(times.len(), 10);
    assert!(times.windows(2).all(|w| w[0] < w[1]));
    for (k, t) in times.iter().enumerate() {
        assert_eq!(*t, 100_000 * (k as u64 + 1));
    }

    assert_eq!(sched.time_us(), 1_000_000);
    assert_eq!(sched.clock().wraps(), 15);
}

#[test]
fn test_primary_arm_clamped_to_fallback_distance() {
    let mut sched = scheduler(MockTimerHardware::new(CounterWidth::Bits16, 1_000_000));
    sched
        .schedule_after(1_000, 1, 0, EventFlags::empty())
        .unwrap();

    assert_eq!(sched.hardware().ticks_until(1), Some(0x7FFF));
    assert_eq!(sched.hardware().ticks_until(0), Some(0x7FFF));

    assert_eq!(run_for(&mut sched, 999_999), 0);
    assert_eq!(run_for(&mut sched, 1), 1);
    assert_eq!(sched.sink().fired(), &[(1, 0)]);
}

#[test]
fn test_events_fire_in_timestamp_order_ties_by_registration() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(30, 1, 0, EventFlags::empty()).unwrap();
    sched.schedule_after(10, 2, 0, EventFlags::empty()).unwrap();
    sched.schedule_after(20, 3, 0, EventFlags::empty()).unwrap();
    sched.schedule_after(10, 4, 0, EventFlags::empty()).unwrap();
    assert_eq!(sched.next_event_time(), Some(10_000));

    assert_eq!(run_for(&mut sched, 40_000), 4);
    assert_eq!(sched.sink().fired(), &[(2, 0), (4, 0), (3, 0), (1, 0)]);
    assert_eq!(sched.pending(), 0);
    assert_eq!(sched.next_event_time(), None);
}

#[test]
fn test_reused_slot_keeps_registration_order() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(5, 1, 0, EventFlags::empty()).unwrap();
    sched.schedule_after(20, 2, 0, EventFlags::empty()).unwrap();
    run_for(&mut sched, 10_000);

    // Lands in the slot freed by id 1, but registers after id 2
    sched.schedule_after(10, 3, 0, EventFlags::empty()).unwrap();
    run_for(&mut sched, 20_000);
    assert_eq!(sched.sink().fired(), &[(1, 0), (2, 0), (3, 0)]);
}

#[test]
fn test_capacity_exhaustion() {
    let mut sched: Scheduler<_, RecordingSink<8>, 4> =
        Scheduler::with_defaults(MockTimerHardware::default(), RecordingSink::new());
    for i in 0..4 {
        sched
            .schedule_after(10 + i, 1, i as u16, EventFlags::empty())
            .unwrap();
    }
    assert_eq!(
        sched.schedule_after(1, 9, 9, EventFlags::empty()),
        Err(TimerError::NoResources)
    );
    assert_eq!(sched.pending(), 4);
    assert_eq!(sched.stats().rejected_requests, 1);
    assert_eq!(sched.next_event_time(), Some(10_000));

    run_for(&mut sched, 10_000);
    sched.schedule_after(1, 9, 9, EventFlags::empty()).unwrap();
}

#[test]
fn test_cancel_removes_exact_matches_only() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(10, 5, 1, EventFlags::empty()).unwrap();
    sched.schedule_after(20, 5, 2, EventFlags::empty()).unwrap();
    sched.schedule_after(30, 6, 1, EventFlags::empty()).unwrap();
    sched.schedule_every(15, 5, 1, EventFlags::empty()).unwrap();

    sched.cancel(5, 1).unwrap();
    assert_eq!(sched.pending(), 2);
    assert_eq!(sched.next_event_time(), Some(20_000));

    // Nothing to cancel is fine
    sched.cancel(42, 42).unwrap();

    run_for(&mut sched, 100_000);
    assert_eq!(sched.sink().fired(), &[(5, 2), (6, 1)]);
}

#[test]
fn test_cancel_later_event_keeps_primary_arm() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(10, 1, 0, EventFlags::empty()).unwrap();
    sched.schedule_after(20, 2, 0, EventFlags::empty()).unwrap();
    let arms = sched.hardware().arm_count();

    sched.cancel(2, 0).unwrap();
    assert_eq!(sched.hardware().arm_count(), arms);
    assert_eq!(sched.hardware().compare(1), Some(10_000));

    sched.cancel(1, 0).unwrap();
    assert!(sched.hardware().arm_count() > arms);
    assert_eq!(sched.next_event_time(), None);
}

#[test]
fn test_repeating_cadence_without_drift() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched
        .schedule_every(50, 2, 2, EventFlags::empty())
        .unwrap();

    let times = fire_times(&mut sched, 5_000_000);
    assert_eq!(times.len(), 100);
    for (k, t) in times.iter().enumerate() {
        assert_eq!(*t, 50_000 * (k as u64 + 1));
    }
    assert_eq!(sched.sink().len(), 100);
    assert_eq!(sched.next_event_time(), Some(5_050_000));
    assert_eq!(sched.stats().collapsed_occurrences, 0);
}

#[test]
fn test_repeating_cadence_at_32768_hz() {
    let mut sched = scheduler(MockTimerHardware::new(CounterWidth::Bits32, 32_768));
    sched
        .schedule_every(50, 2, 2, EventFlags::empty())
        .unwrap();

    // Five seconds is exactly 163840 ticks
    let times = fire_times(&mut sched, 163_841);
    assert_eq!(times.len(), 100);
    for (k, t) in times.iter().enumerate() {
        let expected = 50_000 * (k as u64 + 1);
        // Never early, at most one tick (~30.5 us) late
        assert!(*t >= expected);
        assert!(*t - expected <= 31, "firing {} at {} us", k, t);
    }
    assert_eq!(sched.next_event_time(), Some(5_050_000));
}

#[test]
fn test_one_shot_zero_delay_fires_on_next_interrupt() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(0, 3, 3, EventFlags::empty()).unwrap();
    assert_eq!(sched.hardware().ticks_until(1), Some(DEFAULT_MIN_ARM_TICKS));
    assert_eq!(run_for(&mut sched, 100), 1);
    assert_eq!(sched.pending(), 0);
}

#[test]
fn test_zero_period_repeating_rejected() {
    let mut sched = scheduler(MockTimerHardware::default());
    assert_eq!(
        sched.schedule_every(0, 1, 1, EventFlags::empty()),
        Err(TimerError::InvalidParameter)
    );
    assert_eq!(
        sched.schedule_every_us(0, 1, 1, EventFlags::empty()),
        Err(TimerError::InvalidParameter)
    );
    assert_eq!(sched.pending(), 0);
    assert_eq!(sched.stats().rejected_requests, 2);
}

#[test]
fn test_late_interrupt_collapses_by_default() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched
        .schedule_every(10, 1, 0, EventFlags::empty())
        .unwrap();

    // Interrupts lost for 55 ms
    sched.hardware_mut().advance(55_000);
    assert_eq!(sched.on_timer_interrupt(false), 1);
    assert_eq!(sched.next_event_time(), Some(60_000));
    assert_eq!(sched.stats().collapsed_occurrences, 4);
}

#[test]
fn test_late_interrupt_replays_when_configured() {
    let config = TimerConfig::default().with_catch_up(CatchUpPolicy::Replay);
    let mut sched: TestScheduler =
        Scheduler::new(MockTimerHardware::default(), RecordingSink::new(), config).unwrap();
    sched
        .schedule_every(10, 1, 0, EventFlags::empty())
        .unwrap();

    sched.hardware_mut().advance(55_000);
    assert_eq!(sched.on_timer_interrupt(false), 5);
    assert_eq!(sched.next_event_time(), Some(60_000));
    assert_eq!(sched.stats().collapsed_occurrences, 0);
}

#[test]
fn test_replay_bounded_then_collapses() {
    let config = TimerConfig::default()
        .with_catch_up(CatchUpPolicy::Replay)
        .with_max_replay_per_event(3);
    let mut sched: TestScheduler =
        Scheduler::new(MockTimerHardware::default(), RecordingSink::new(), config).unwrap();
    sched
        .schedule_every(10, 1, 0, EventFlags::empty())
        .unwrap();

    sched.hardware_mut().advance(55_000);
    assert_eq!(sched.on_timer_interrupt(false), 3);
    assert_eq!(sched.next_event_time(), Some(60_000));
    assert_eq!(sched.stats().collapsed_occurrences, 2);
}

#[test]
fn test_fallback_interrupts_keep_clock_current() {
    let config = TimerConfig::default().with_fallback_interval_us(1_000);
    let mut sched: TestScheduler =
        Scheduler::new(MockTimerHardware::default(), RecordingSink::new(), config).unwrap();

    assert_eq!(run_for(&mut sched, 5_000), 0);
    assert_eq!(sched.stats().fallback_interrupts, 5);
    assert_eq!(sched.stats().primary_interrupts, 0);
    assert_eq!(sched.clock().time_us(), 5_000);
}

#[test]
fn test_fallback_interrupt_fires_due_events() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(1, 1, 0, EventFlags::empty()).unwrap();

    // Primary match lost; the fallback path evaluates the same way
    sched.hardware_mut().advance(2_000);
    assert_eq!(sched.on_compare_match(DEFAULT_FALLBACK_CHANNEL), 1);
    assert_eq!(sched.stats().fallback_interrupts, 1);
    assert_eq!(sched.stats().events_fired, 1);
}

#[test]
fn test_unused_channel_match_ignored() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(1, 1, 0, EventFlags::empty()).unwrap();
    sched.hardware_mut().advance(2_000);

    assert_eq!(sched.on_compare_match(3), 0);
    assert_eq!(sched.stats().total_interrupts(), 0);
    assert_eq!(sched.pending(), 1);

    assert_eq!(sched.on_compare_match(DEFAULT_PRIMARY_CHANNEL), 1);
    assert_eq!(sched.stats().primary_interrupts, 1);
}

#[test]
fn test_interrupts_restored_after_every_operation() {
    let mut sched = scheduler(MockTimerHardware::default());
    let masked = sched.hardware().mask_count();

    sched.schedule_after(1, 1, 0, EventFlags::empty()).unwrap();
    let _ = sched.schedule_every(0, 1, 0, EventFlags::empty());
    sched.cancel(1, 0).unwrap();
    sched.time_us();
    sched.on_timer_interrupt(false);

    assert!(sched.hardware().interrupts_enabled());
    assert!(sched.hardware().mask_count() > masked);
}

#[test]
fn test_wait_us_with_moving_counter() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.hardware_mut().set_auto_advance(7);
    let start = sched.time_us();
    sched.wait_us(1_000);
    assert!(sched.time_us() - start >= 1_000);

    let start = sched.time_us();
    sched.wait_ms(2);
    assert!(sched.time_us() - start >= 2_000);
}

#[test]
fn test_wait_returns_while_suspended() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.hardware_mut().set_auto_advance(5);
    let snapshot = sched.begin_suspend();

    sched.wait_us(1_000);
    sched.wait_ms(1);
    assert_eq!(sched.time_us(), snapshot.time_us);
}

/// Interrupt handler body for a scheduler shared with foreground code
fn service_interrupt<S: SharedState<TestScheduler>>(shared: &S, channel: u8) -> usize {
    shared.with_mut(|sched| sched.on_compare_match(channel))
}

fn drive_shared<S: SharedState<TestScheduler>>(shared: &S) {
    shared
        .with_mut(|sched| sched.schedule_after(5, 1, 0, EventFlags::empty()))
        .unwrap();

    let matched = shared.with_mut(|sched| sched.hardware_mut().step(10_000));
    assert_eq!(matched, Some((DEFAULT_PRIMARY_CHANNEL, 5_000)));
    assert_eq!(service_interrupt(shared, DEFAULT_PRIMARY_CHANNEL), 1);

    assert_eq!(shared.with(|sched| sched.pending()), 0);
    assert_eq!(shared.with(|sched| sched.sink().fired().to_vec()), [(1, 0)]);
}

#[test]
fn test_shared_scheduler_in_mock_state() {
    let shared = MockState::new(scheduler(MockTimerHardware::default()));
    drive_shared(&shared);
}

#[test]
fn test_shared_scheduler_in_critical_state() {
    let shared = CriticalState::new(scheduler(MockTimerHardware::default()));
    drive_shared(&shared);
}

#[test]
fn test_closure_sink() {
    let mut log = std::vec::Vec::new();
    {
        let mut sched: Scheduler<_, _, 4> = Scheduler::with_defaults(
            MockTimerHardware::default(),
            |id: u16, value: u16| log.push((id, value)),
        );
        sched.schedule_after(1, 7, 8, EventFlags::empty()).unwrap();
        run_for(&mut sched, 1_000);
    }
    assert_eq!(log, [(7, 8)]);
}

#[test]
fn test_deep_sleep_one_shot_fires_once_after_resume() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(10, 7, 1, EventFlags::WAKEUP).unwrap();
    run_for(&mut sched, 5_000);

    let snapshot = sched.begin_suspend();
    assert_eq!(snapshot.time_us, 5_000);
    assert!(sched.is_suspended());

    // Counter reset across deep sleep
    sched.hardware_mut().set_counter(0);
    assert_eq!(sched.end_suspend(0, 20_000), 1);
    assert_eq!(sched.time_us(), 25_000);

    assert_eq!(run_for(&mut sched, 100), 1);
    assert_eq!(run_for(&mut sched, 100_000), 0);
    assert_eq!(sched.sink().fired(), &[(7, 1)]);
}

#[test]
fn test_deep_sleep_repeating_keeps_phase() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.hardware_mut().advance(20_000);
    sched
        .schedule_every(30, 4, 0, EventFlags::empty())
        .unwrap();
    assert_eq!(sched.next_event_time(), Some(50_000));
    run_for(&mut sched, 20_000);

    sched.begin_suspend();
    sched.hardware_mut().set_counter(123);
    assert_eq!(sched.end_suspend(123, 40_000), 1);
    assert_eq!(sched.time_us(), 80_000);
    assert_eq!(sched.next_event_time(), Some(80_000));

    assert_eq!(run_for(&mut sched, 10), 1);
    assert_eq!(sched.next_event_time(), Some(110_000));
    assert_eq!(run_for(&mut sched, 30_000), 1);
    assert_eq!(sched.next_event_time(), Some(140_000));
    assert_eq!(sched.stats().suspends, 1);
}

#[test]
fn test_suspended_scheduler_ignores_interrupts_and_freezes_clock() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(1, 1, 0, EventFlags::empty()).unwrap();
    sched.hardware_mut().advance(500);
    let snapshot = sched.begin_suspend();

    sched.hardware_mut().advance(5_000);
    assert_eq!(sched.time_us(), snapshot.time_us);
    assert_eq!(sched.on_timer_interrupt(false), 0);
    assert_eq!(sched.pending(), 1);

    let counter = sched.hardware().counter();
    sched.end_suspend(counter, 0);
    assert_eq!(sched.on_timer_interrupt(false), 0);
    sched.hardware_mut().advance(500);
    assert_eq!(sched.on_timer_interrupt(false), 1);
}

#[test]
fn test_wake_time_only_considers_wake_sources() {
    let mut sched = scheduler(MockTimerHardware::default());
    assert_eq!(sched.next_wake_time(), None);

    sched.schedule_after(100, 1, 0, EventFlags::empty()).unwrap();
    assert_eq!(sched.next_wake_time(), None);

    sched.schedule_after(200, 2, 0, EventFlags::WAKEUP).unwrap();
    sched.schedule_every(300, 3, 0, EventFlags::WAKEUP).unwrap();
    assert_eq!(sched.next_event_time(), Some(100_000));
    assert_eq!(sched.next_wake_time(), Some(200_000));

    sched.cancel(2, 0).unwrap();
    assert_eq!(sched.next_wake_time(), Some(300_000));
}

#[test]
fn test_events_iterator_reflects_pool() {
    let mut sched = scheduler(MockTimerHardware::default());
    sched.schedule_after(1, 1, 0, EventFlags::empty()).unwrap();
    sched.schedule_every(2, 2, 0, EventFlags::WAKEUP).unwrap();

    let repeating: std::vec::Vec<_> = sched
        .events()
        .filter(|e| e.is_repeating())
        .map(|e| (e.id, e.period))
        .collect();
    assert_eq!(repeating, [(2, 2_000)]);
}
