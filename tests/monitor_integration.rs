//! End-to-end monitor runs over simulated peripherals on virtual time.

use std::time::Duration;

use noise_guard::config::{MonitorConfig, AXIS_CENTER};
use noise_guard::hal::{
    AdcFeeder, FifoAdc, RecordingIndicator, SimAxis, SimButton, SyntheticAdc, TextSurface,
};
use noise_guard::{AlertState, NoiseMonitor, Peripherals};
use tokio::task::JoinHandle;

fn peripherals(
    source: Box<dyn noise_guard::hal::SampleSource>,
    indicator: &RecordingIndicator,
) -> Peripherals<TextSurface> {
    Peripherals {
        sample_source: source,
        indicator: Box::new(indicator.clone()),
        lower_button: Box::new(SimButton::new()),
        raise_button: Box::new(SimButton::new()),
        control_axis: Box::new(SimAxis::centered(AXIS_CENTER as u16)),
        render_target: TextSurface::default(),
    }
}

/// Push `code` into the FIFO at 4 codes per millisecond
fn feed_constant(mut feeder: AdcFeeder, code: u16) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            for _ in 0..4 {
                feeder.push(code);
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
}

#[tokio::test(start_paused = true)]
async fn fifo_fed_monitor_tracks_loud_input() {
    let (adc, feeder) = FifoAdc::new(1024);
    let feeder = feed_constant(feeder, 4095);
    let indicator = RecordingIndicator::new();

    let handle = NoiseMonitor::spawn(
        MonitorConfig::default(),
        peripherals(Box::new(adc), &indicator),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(1020)).await;
    let snapshot = handle.shutdown().await;
    feeder.abort();

    assert_eq!(snapshot.noise_level, 3299);
    assert_eq!(snapshot.alert, AlertState::Danger);
    assert_eq!(indicator.last(), Some(AlertState::Danger.indicator()));
    assert!(snapshot.stats.windows_sampled >= 10);
    assert_eq!(snapshot.stats.degraded_captures, 0);
    assert_eq!(snapshot.stats.sampler_overruns, 0);
}

#[tokio::test(start_paused = true)]
async fn held_render_lock_skips_frames_but_not_samples() {
    let indicator = RecordingIndicator::new();
    let handle = NoiseMonitor::spawn(
        MonitorConfig::default(),
        peripherals(Box::new(SyntheticAdc::constant(4095)), &indicator),
    )
    .unwrap();

    // Let the first frame land, then take the display away
    tokio::time::sleep(Duration::from_millis(50)).await;
    let surface = handle.render_lock();
    let guard = surface.lock().await;
    let flushes_before = guard.flushes();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    let during = handle.snapshot();
    assert!(during.stats.skipped_renders >= 2);
    assert!(during.stats.windows_sampled >= 12);
    assert_eq!(during.alert, AlertState::Danger);
    assert_eq!(during.stats.sampler_overruns, 0);
    assert_eq!(guard.flushes(), flushes_before);
    drop(guard);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let after = handle.shutdown().await;
    assert!(after.stats.renders > during.stats.renders);
}

#[tokio::test(start_paused = true)]
async fn thresholds_come_from_config_file() {
    let path = std::env::temp_dir().join(format!(
        "noise_guard_thresholds_{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        r#"{ "thresholds": { "warning": 500, "danger": 1000, "default_gap": 500 } }"#,
    )
    .unwrap();
    let config = MonitorConfig::load_from_file(&path);
    std::fs::remove_file(&path).ok();

    let indicator = RecordingIndicator::new();
    let handle = NoiseMonitor::spawn(
        config,
        peripherals(Box::new(SyntheticAdc::constant(2048)), &indicator),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(550)).await;
    let snapshot = handle.shutdown().await;

    assert_eq!((snapshot.warning, snapshot.danger, snapshot.gap), (500, 1000, 500));
    assert_eq!(snapshot.noise_level, 1650);
    assert_eq!(snapshot.alert, AlertState::Danger);
}

#[tokio::test(start_paused = true)]
async fn mid_band_input_is_warning() {
    // Mid-scale input reduces to 1650
    let mut config = MonitorConfig::default();
    config.thresholds.warning = 1500;
    config.thresholds.danger = 2500;

    let indicator = RecordingIndicator::new();
    let handle = NoiseMonitor::spawn(
        config,
        peripherals(Box::new(SyntheticAdc::polling(|| 2048)), &indicator),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    let snapshot = handle.shutdown().await;

    assert_eq!(snapshot.alert, AlertState::Warning);
    assert_eq!(indicator.last(), Some(AlertState::Warning.indicator()));
    assert!(snapshot.stats.degraded_captures >= 1);
}
