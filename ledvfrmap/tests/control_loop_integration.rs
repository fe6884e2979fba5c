//! Integration tests for the map control loop.
//!
//! These tests drive the complete flow:
//! - INI config → station registry
//! - JSON observation file → observation store
//! - classification + color policy → LED synchronizer → strip
//!
//! Run with: `cargo test --test control_loop_integration`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use ledvfrmap::color::palette;
use ledvfrmap::config::MapConfig;
use ledvfrmap::display::MemoryDriver;
use ledvfrmap::estimator::Classification;
use ledvfrmap::observation::FlightCategory;
use ledvfrmap::orchestrator::MapOrchestrator;
use ledvfrmap::source::JsonFileSource;
use ledvfrmap::station::StationRegistry;

// ============================================================================
// Helper Functions
// ============================================================================

const CONFIG: &str = r#"
[map]
led_count = 5
display_interval_ms = 5
refresh_interval_secs = 1

[station.KHPN]
led = 0
latitude = 41.067
longitude = -73.707
name = Westchester County

[station.KBDR]
led = 1
latitude = 41.163
longitude = -73.126

[station.KLGA]
led = 2
latitude = 40.777
longitude = -73.873

[station.KSWF]
led = 3
latitude = 41.504
longitude = -74.105
neighbors = KBDR, KLGA
"#;

const MORNING: &str = r#"{
    "KHPN": { "flight_category": "VFR" },
    "KBDR": { "ceiling_ft_agl": 4000, "visibility_statute_mi": 6 },
    "KLGA": { "sky_cover": "CLR", "visibility_statute_mi": 8 }
}"#;

const AFTERNOON: &str = r#"{
    "KHPN": { "flight_category": "LIFR" },
    "KBDR": { "ceiling_ft_agl": 4000, "visibility_statute_mi": 6 },
    "KLGA": { "sky_cover": "CLR", "visibility_statute_mi": 8 }
}"#;

struct Fixture {
    _dir: TempDir,
    observations: PathBuf,
    strip: MemoryDriver,
    orchestrator: MapOrchestrator,
}

fn write(path: &Path, content: &str) {
    std::fs::write(path, content).expect("write fixture file");
}

fn fixture(initial: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.ini");
    let observations = dir.path().join("metars.json");
    write(&config_path, CONFIG);
    write(&observations, initial);

    let config = MapConfig::load_from(&config_path).unwrap();
    let strip = MemoryDriver::new(config.effective_led_count());
    let orchestrator = MapOrchestrator::from_map_config(
        &config,
        Arc::new(JsonFileSource::new(&observations)),
        Box::new(strip.clone()),
    )
    .unwrap();

    Fixture {
        _dir: dir,
        observations,
        strip,
        orchestrator,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_file_to_strip() {
    let f = fixture(MORNING);
    f.orchestrator.refresh_now().await.unwrap();
    f.orchestrator.display_now().unwrap();

    assert_eq!(
        f.strip.shown(),
        vec![
            palette::GREEN,
            palette::GREEN,
            palette::GREEN,
            palette::GREEN,
            palette::OFF
        ]
    );

    // KSWF has no report and averages 4000 ft and CLR (5000 ft), 6 and 8 mi
    let kswf = f.orchestrator.status("KSWF").unwrap();
    assert_eq!(kswf.classification, Classification::Estimated(FlightCategory::Vfr));
    let khpn = f.orchestrator.status("KHPN").unwrap();
    assert_eq!(khpn.classification, Classification::Reported(FlightCategory::Vfr));
    assert_eq!(khpn.name, "Westchester County");
}

#[tokio::test]
async fn test_only_changed_leds_are_written() {
    let f = fixture(MORNING);
    f.orchestrator.refresh_now().await.unwrap();
    f.orchestrator.display_now().unwrap();
    assert_eq!(f.strip.write_count(), 4);
    assert_eq!(f.strip.commit_count(), 1);

    write(&f.observations, AFTERNOON);
    f.orchestrator.refresh_now().await.unwrap();
    let report = f.orchestrator.display_now().unwrap();

    assert_eq!(report.written, 1);
    assert_eq!(f.strip.write_count(), 5);
    assert_eq!(f.strip.commit_count(), 2);
    assert_eq!(f.strip.pixel(0), Some(palette::MAGENTA));

    // Nothing changed since
    f.orchestrator.display_now().unwrap();
    assert_eq!(f.strip.commit_count(), 2);
}

#[tokio::test]
async fn test_bad_feed_keeps_last_good_data() {
    let f = fixture(MORNING);
    f.orchestrator.refresh_now().await.unwrap();

    write(&f.observations, "{ truncated");
    assert!(f.orchestrator.refresh_now().await.is_err());

    f.orchestrator.display_now().unwrap();
    assert_eq!(f.strip.pixel(0), Some(palette::GREEN));
    assert_eq!(f.orchestrator.stats().refresh_failures, 1);
}

#[tokio::test]
async fn test_cancellation_stops_loops_and_clears_strip() {
    let f = fixture(MORNING);
    let strip = f.strip.clone();
    let token = f.orchestrator.cancellation_token();
    let run = tokio::spawn(f.orchestrator.run());

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while strip.pixel(3) != Some(palette::GREEN) {
        assert!(tokio::time::Instant::now() < deadline, "map never lit");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("shutdown timed out")
        .expect("run task panicked");
    assert_eq!(strip.shown(), vec![palette::OFF; 5]);
}

#[test]
fn test_registry_build_is_idempotent() {
    let config = MapConfig::parse(CONFIG).unwrap().registry_config();
    let first = StationRegistry::build(&config).unwrap();
    let second = StationRegistry::build(&config).unwrap();

    assert_eq!(first.codes(), second.codes());
    for station in first.stations() {
        let other = second.get(station.code()).unwrap();
        let a: Vec<&str> = first.neighbors(station).map(|s| s.code()).collect();
        let b: Vec<&str> = second.neighbors(other).map(|s| s.code()).collect();
        assert_eq!(a, b);
    }
}
