//! Integration tests for the Controller → zones → register pipeline.
//!
//! Drive the whole super-loop against the mock board with a fake clock and
//! check what ends up latched into the actuator register.

use super::mock_hw::{FakeClock, MemStore, MockBoard, RAW_DRY, RAW_WET, RecordingSink};

use irrigo::app::commands::{AppCommand, ZoneSetting};
use irrigo::app::ports::SettingsStore;
use irrigo::app::service::Controller;
use irrigo::config::{ScheduleTime, SystemMode, SystemSettings, ZoneSettings};
use irrigo::drivers::arbiter::ArbiterState;
use irrigo::error::{Error, ZoneFault};
use irrigo::irrigation::CycleState;
use irrigo::sensors::SensorId;
use irrigo::sensors::moisture::SensorState;

const TICK_MS: u64 = 5;

fn dry_controller(settings: SystemSettings) -> Controller<MockBoard> {
    let mut board = MockBoard::new();
    board.analog = [RAW_DRY; 8];
    Controller::new(board, settings)
}

fn run_for(c: &mut Controller<MockBoard>, clock: &FakeClock, sink: &mut RecordingSink, ms: u64) {
    for _ in 0..ms / TICK_MS {
        c.run(clock, sink);
        clock.advance(TICK_MS);
    }
}

fn board(c: &Controller<MockBoard>) -> &MockBoard {
    c.plant().board()
}

// ── Schedule ─────────────────────────────────────────────────

#[test]
fn schedule_starts_watering_in_auto_mode() {
    let mut c = dry_controller(SystemSettings::default());
    let clock = FakeClock::at(1, 6, 0);
    let mut sink = RecordingSink::new();

    run_for(&mut c, &clock, &mut sink, 1_000);

    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
    assert!(board(&c).pump_on());
    assert_eq!(board(&c).valves(), 0b0001, "only zone 0 is enabled");
    // Disabled zones stay idle.
    for zone in 1..4 {
        assert_eq!(c.zone(zone).unwrap().state(), CycleState::Idle);
    }
}

#[test]
fn schedule_is_ignored_outside_auto_mode() {
    for mode in [SystemMode::Manual, SystemMode::Off] {
        let settings = SystemSettings {
            mode,
            ..SystemSettings::default()
        };
        let mut c = dry_controller(settings);
        let clock = FakeClock::at(1, 8, 0);
        let mut sink = RecordingSink::new();

        run_for(&mut c, &clock, &mut sink, 1_000);

        assert_eq!(c.zone(0).unwrap().state(), CycleState::Idle, "mode {}", mode);
        assert!(!board(&c).pump_on());
    }
}

#[test]
fn schedule_fires_once_per_day() {
    let mut c = dry_controller(SystemSettings::default());
    let clock = FakeClock::at(1, 6, 0);
    let mut sink = RecordingSink::new();

    run_for(&mut c, &clock, &mut sink, 1_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);

    // Abort the cycle while the wall clock still reads 06:00.
    c.reset_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Idle);

    // Same time next day fires again.
    clock.set_wall(2, 6, 0);
    run_for(&mut c, &clock, &mut sink, 1_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
}

// ── Manual requests ──────────────────────────────────────────

#[test]
fn manual_request_waters_in_manual_mode() {
    let settings = SystemSettings {
        mode: SystemMode::Manual,
        ..SystemSettings::default()
    };
    let mut c = dry_controller(settings);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.handle_command(AppCommand::TriggerWatering).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);

    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
}

#[test]
fn manual_request_in_off_mode_is_discarded() {
    let settings = SystemSettings {
        mode: SystemMode::Off,
        ..SystemSettings::default()
    };
    let mut c = dry_controller(settings);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.request_watering();
    run_for(&mut c, &clock, &mut sink, 100);
    c.set_mode(SystemMode::Auto);
    run_for(&mut c, &clock, &mut sink, 1_000);

    assert_eq!(c.zone(0).unwrap().state(), CycleState::Idle);
    assert_eq!(
        c.handle_command(AppCommand::TriggerZone(0)),
        Ok(()),
        "direct trigger works once the mode allows it"
    );
}

#[test]
fn trigger_zone_is_refused_in_off_mode() {
    let settings = SystemSettings {
        mode: SystemMode::Off,
        ..SystemSettings::default()
    };
    let mut c = dry_controller(settings);
    assert_eq!(c.trigger_zone(0), Err(Error::Mode(SystemMode::Off)));
}

// ── Full cycle ───────────────────────────────────────────────

#[test]
fn full_cycle_waters_soaks_and_stops_when_wet() {
    let mut c = dry_controller(SystemSettings::default());
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
    assert_eq!(c.zone(0).unwrap().humidity(), 5);

    // 30 s pump run.
    run_for(&mut c, &clock, &mut sink, 30_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Soaking);
    assert!(!board(&c).pump_on());
    assert_eq!(board(&c).valves(), 0);
    assert_eq!(c.plant().pump.accumulated_seconds(), 30);

    // The water reached the probe while soaking.
    c.plant_mut().board_mut().analog[0] = RAW_WET;
    run_for(&mut c, &clock, &mut sink, 5 * 60_000 + 5_000);

    let zone = c.zone(0).unwrap();
    assert_eq!(zone.state(), CycleState::Idle);
    assert_eq!(zone.iterations(), 1);
    assert_eq!(zone.humidity(), 255);
    assert_eq!(zone.faults(), 0);
    assert!(!board(&c).power, "rail is released once the hold expires");
    assert!(board(&c).valves_always_one_hot());
}

#[test]
fn dry_probe_hits_iteration_cutoff() {
    let mut settings = SystemSettings::default();
    settings.zones[0] = ZoneSettings {
        pump_seconds: 1,
        soak_minutes: 0,
        max_iterations: 3,
        ..ZoneSettings::default()
    };
    let mut c = dry_controller(settings);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 10_000);

    let zone = c.zone(0).unwrap();
    assert_eq!(zone.state(), CycleState::Idle);
    assert_eq!(zone.iterations(), 3);
    assert!(zone.has_fault(ZoneFault::IterationCutoff));
    assert_eq!(c.plant().pump.accumulated_seconds(), 3);

    let status = c.zone_status(0).unwrap().to_string();
    assert!(status.contains("iterations  3"));
    assert!(status.contains("faults  iteration cutoff"), "{}", status);

    // A fresh trigger clears the cutoff.
    c.trigger_zone(0).unwrap();
    assert!(!c.zone(0).unwrap().has_fault(ZoneFault::IterationCutoff));
}

#[test]
fn empty_reservoir_blocks_pumping_until_refilled() {
    let mut settings = SystemSettings::default();
    settings.zones[0].thresh_reservoir = 100;
    let mut c = dry_controller(settings);
    // Reservoir probe on channel 4 reads 5: below the threshold.
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::ReservoirEmpty);
    assert!(c.zone(0).unwrap().has_fault(ZoneFault::ReservoirEmpty));
    assert!(!board(&c).pump_on());

    // Refill, then wait out the re-check delay.
    c.plant_mut().board_mut().analog[4] = RAW_WET;
    run_for(&mut c, &clock, &mut sink, 30 * 60_000 + 1_000);

    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
    assert!(!c.zone(0).unwrap().has_fault(ZoneFault::ReservoirEmpty));
}

#[test]
fn failed_conversions_are_retried_until_the_board_recovers() {
    let mut c = dry_controller(SystemSettings::default());
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();
    c.plant_mut().board_mut().analog_fault = true;

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);

    // Every read failed: no sample counted, front end still held.
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Sense);
    assert_eq!(c.plant().arbiter.state(), ArbiterState::Ready);
    assert_eq!(c.plant().arbiter.channel(), 0);
    assert_eq!(
        c.plant().sensor(SensorId::Soil(0)).state(),
        SensorState::Converting
    );
    assert_eq!(board(&c).reads, 0);
    assert!(!board(&c).pump_on());

    c.plant_mut().board_mut().analog_fault = false;
    run_for(&mut c, &clock, &mut sink, 1_000);

    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
    assert_eq!(c.zone(0).unwrap().humidity(), 5);
    assert_eq!(board(&c).reads, 8);
}

#[test]
fn mode_switch_clears_a_parked_reservoir_fault() {
    let mut settings = SystemSettings::default();
    settings.zones[0].thresh_reservoir = 100;
    let mut c = dry_controller(settings);
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::ReservoirEmpty);

    c.set_mode(SystemMode::Manual);
    assert_eq!(c.zone(0).unwrap().faults(), 0);
    assert!(c.zone_status(0).unwrap().to_string().contains("faults  none"));
}

// ── Mode changes ─────────────────────────────────────────────

#[test]
fn mode_change_aborts_running_zones() {
    let mut c = dry_controller(SystemSettings::default());
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);
    assert!(board(&c).pump_on());

    c.handle_command(AppCommand::SetMode(SystemMode::Manual))
        .unwrap();

    assert_eq!(c.mode(), SystemMode::Manual);
    assert_eq!(c.zone(0).unwrap().state(), CycleState::Idle);
    assert!(!board(&c).pump_on());
    assert_eq!(board(&c).valves(), 0);
    assert!(c.is_settings_dirty());
}

#[test]
fn setting_the_same_mode_is_a_no_op() {
    let mut c = dry_controller(SystemSettings::default());
    let clock = FakeClock::new();
    let mut sink = RecordingSink::new();

    c.trigger_zone(0).unwrap();
    run_for(&mut c, &clock, &mut sink, 1_000);
    c.set_mode(SystemMode::Auto);

    assert_eq!(c.zone(0).unwrap().state(), CycleState::Pumping);
    assert!(!c.is_settings_dirty());
}

#[test]
fn manual_valves_stay_one_hot() {
    let settings = SystemSettings {
        mode: SystemMode::Manual,
        ..SystemSettings::default()
    };
    let mut c = dry_controller(settings);

    c.handle_command(AppCommand::SetValve { zone: 1, open: true })
        .unwrap();
    c.handle_command(AppCommand::SetValve { zone: 3, open: true })
        .unwrap();

    assert_eq!(board(&c).valves(), 0b1000);
    assert_eq!(c.is_valve_open(1), Ok(false));
    assert_eq!(c.is_valve_open(3), Ok(true));
    assert!(board(&c).valves_always_one_hot());
}

// ── Settings persistence ─────────────────────────────────────

#[test]
fn changed_settings_are_saved_once() {
    let mut c = dry_controller(SystemSettings::default());
    let mut store = MemStore::default();

    assert!(!c.sync_settings(&mut store), "nothing changed yet");

    c.handle_command(AppCommand::UpdateZone {
        zone: 2,
        setting: ZoneSetting::PumpSeconds(12),
    })
    .unwrap();
    c.handle_command(AppCommand::UpdateSchedule {
        slot: 2,
        time: ScheduleTime::new(13, 30),
    })
    .unwrap();

    assert!(c.sync_settings(&mut store));
    assert!(!c.sync_settings(&mut store));
    assert_eq!(store.saved.len(), 1);

    let saved = &store.saved[0];
    assert_eq!(saved.zones[2].pump_seconds, 12);
    assert_eq!(saved.schedule[2], ScheduleTime::new(13, 30));

    // A controller built from the saved settings reports the same.
    let restored = Controller::new(MockBoard::new(), store.load().unwrap());
    assert_eq!(restored.settings(), c.settings());
}

#[test]
fn failed_save_is_retried() {
    let mut c = dry_controller(SystemSettings::default());
    let mut store = MemStore {
        fail: true,
        ..MemStore::default()
    };

    c.set_mode(SystemMode::Off);
    assert!(!c.sync_settings(&mut store));
    assert!(c.is_settings_dirty());

    store.fail = false;
    assert!(c.sync_settings(&mut store));
    assert_eq!(store.saved[0].mode, SystemMode::Off);
}

#[test]
fn invalid_schedule_slot_is_rejected() {
    let mut c = dry_controller(SystemSettings::default());
    assert!(c.update_schedule(8, ScheduleTime::new(6, 0)).is_err());
    assert!(c.update_schedule(0, ScheduleTime::new(24, 0)).is_err());
    assert!(c.update_schedule(0, ScheduleTime::new(6, 60)).is_err());
    assert!(!c.is_settings_dirty());
}
