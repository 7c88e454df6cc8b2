//! Integration tests for the per-zone telemetry loggers.

use super::mock_hw::{FakeClock, MockBoard, RAW_DRY, RecordingSink};

use irrigo::app::commands::{AppCommand, LoggerSetting};
use irrigo::app::service::Controller;
use irrigo::config::SystemSettings;
use irrigo::irrigation::CycleState;
use irrigo::telemetry::{DataPoint, LoggerState};

const TICK_MS: u64 = 5;

/// Zone 0 logging every `interval` minutes to channel 42.  Soil reads dry,
/// the reservoir probe reads 105.
fn logging_controller(interval: u16) -> Controller<MockBoard> {
    let mut settings = SystemSettings::default();
    settings.telemetry[0].logger.interval_minutes = interval;
    settings.telemetry[0].channel_id = 42;
    let mut board = MockBoard::new();
    board.analog = [RAW_DRY; 8];
    board.analog[4] = 600;
    Controller::new(board, settings)
}

fn run_for(c: &mut Controller<MockBoard>, clock: &FakeClock, sink: &mut RecordingSink, ms: u64) {
    for _ in 0..ms / TICK_MS {
        c.run(clock, sink);
        clock.advance(TICK_MS);
    }
}

#[test]
fn logs_once_per_interval() {
    let mut c = logging_controller(1);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    run_for(&mut c, &clock, &mut sink, 59_000);
    assert!(sink.points.is_empty(), "first point waits a full interval");

    run_for(&mut c, &clock, &mut sink, 2_000);
    assert_eq!(
        sink.points,
        vec![(
            0,
            DataPoint {
                humidity: 5,
                reservoir: 105,
                pump_total_seconds: 0,
            }
        )]
    );
    assert_eq!(c.logger(0).unwrap().state(), LoggerState::Idle);

    run_for(&mut c, &clock, &mut sink, 60_000);
    assert_eq!(sink.points.len(), 2);
}

#[test]
fn trigger_logs_without_waiting_for_the_interval() {
    let mut c = logging_controller(60);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.handle_command(AppCommand::TriggerLog(Some(0))).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);

    assert_eq!(sink.points.len(), 1);
    assert_eq!(c.logger(0).unwrap().previous_log_ms().map(|t| t > 0), Some(true));
}

#[test]
fn zero_interval_disables_logging() {
    let mut c = logging_controller(0);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_log(None).unwrap();
    run_for(&mut c, &clock, &mut sink, 120_000);

    assert!(sink.points.is_empty());
    assert_eq!(sink.declined, 0);
}

#[test]
fn disabled_zone_does_not_log() {
    let mut c = logging_controller(1);
    c.update_logger(1, LoggerSetting::IntervalMinutes(1)).unwrap();
    c.update_logger(1, LoggerSetting::ChannelId(7)).unwrap();
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    run_for(&mut c, &clock, &mut sink, 90_000);

    assert!(sink.points.iter().all(|(zone, _)| *zone == 0));
    assert_eq!(c.logger(1).unwrap().state(), LoggerState::Idle);
}

#[test]
fn unconfigured_channel_still_advances_the_interval() {
    let mut c = logging_controller(1);
    c.update_logger(0, LoggerSetting::ChannelId(0)).unwrap();
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    run_for(&mut c, &clock, &mut sink, 90_000);

    assert!(sink.points.is_empty());
    assert_eq!(sink.declined, 1);
}

#[test]
fn logger_and_cycle_share_the_soil_probe() {
    let mut c = logging_controller(60);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    c.trigger_log(Some(0)).unwrap();
    run_for(&mut c, &clock, &mut sink, 2_000);

    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
    assert_eq!(sink.points.len(), 1);
    assert_eq!(sink.points[0].1.humidity, 5);
    assert!(c.plant().board().valves_always_one_hot());
}

#[test]
fn pump_total_is_reported() {
    let mut c = logging_controller(60);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 32_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Soaking);

    c.trigger_log(Some(0)).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);

    assert_eq!(sink.points.len(), 1);
    assert_eq!(sink.points[0].1.pump_total_seconds, 30);
}

#[test]
fn mode_change_aborts_a_running_sample() {
    let mut c = logging_controller(60);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_log(Some(0)).unwrap();
    run_for(&mut c, &clock, &mut sink, 50);
    assert_ne!(c.logger(0).unwrap().state(), LoggerState::Idle);

    c.set_mode(irrigo::config::SystemMode::Manual);
    assert_eq!(c.logger(0).unwrap().state(), LoggerState::Idle);
    assert!(c.plant().sensors.iter().all(|s| s.is_idle()));
}
