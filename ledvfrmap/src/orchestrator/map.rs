//! The map orchestrator: refresh loop, display loop and shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::color::{ColorPolicy, StationSample};
use crate::config::MapConfig;
use crate::display::{DisplaySynchronizer, DriverError, FlushReport, LedDriver};
use crate::estimator::classify;
use crate::observation::{Observation, ObservationStore};
use crate::source::{FetchError, ObservationSource};
use crate::station::{RegistryError, Station, StationRegistry};

use super::config::OrchestratorConfig;
use super::types::{MapStats, OrchestratorError, StationStatus};

type Synchronizer = DisplaySynchronizer<Box<dyn LedDriver>>;

/// Default policy plus per-station overrides.
#[derive(Debug)]
struct PolicySet {
    default: Arc<dyn ColorPolicy>,
    overrides: HashMap<String, Arc<dyn ColorPolicy>>,
}

impl PolicySet {
    fn for_station(&self, code: &str) -> &dyn ColorPolicy {
        self.overrides.get(code).unwrap_or(&self.default).as_ref()
    }
}

/// State shared between the orchestrator handle and its tasks.
struct MapState {
    registry: Arc<StationRegistry>,
    store: Arc<ObservationStore>,
    source: Arc<dyn ObservationSource>,
    display: Mutex<Synchronizer>,
    policies: RwLock<PolicySet>,
    config: OrchestratorConfig,
    map_on: AtomicBool,
    blink_phase: AtomicBool,
    stats: Mutex<MapStats>,
}

impl MapState {
    async fn refresh(&self) -> Result<usize, FetchError> {
        let source = Arc::clone(&self.source);
        let station_ids = self.registry.codes();

        let result = match tokio::task::spawn_blocking(move || source.fetch(&station_ids)).await {
            Ok(result) => result,
            Err(e) => Err(FetchError::Unavailable(format!("fetch task failed: {}", e))),
        };

        match result {
            Ok(observations) => {
                let count = observations.len();
                self.store.refresh(observations);
                self.stats.lock().refreshes += 1;
                info!(
                    source = self.source.name(),
                    observations = count,
                    stations = self.registry.len(),
                    "Observations refreshed"
                );
                Ok(count)
            }
            Err(e) => {
                {
                    let mut stats = self.stats.lock();
                    stats.refresh_failures += 1;
                    stats.last_refresh_error = Some(e.to_string());
                    stats.last_refresh_error_at = Some(Utc::now());
                }
                warn!(
                    source = self.source.name(),
                    error = %e,
                    "Observation refresh failed, keeping previous data"
                );
                Err(e)
            }
        }
    }

    fn is_gusting(&self, observation: Option<&Observation>) -> bool {
        match (self.config.gust_alert_kt, observation.and_then(|o| o.wind_gust_kt)) {
            (Some(threshold), Some(gust)) => gust >= threshold,
            _ => false,
        }
    }

    /// Compute every station's LED state and flush once.
    fn render(&self) -> Result<FlushReport, DriverError> {
        let snapshot = self.store.snapshot();
        let policies = self.policies.read();
        let map_on = self.map_on.load(Ordering::Relaxed);
        let blink_dark = self.blink_phase.load(Ordering::Relaxed);

        let mut display = self.display.lock();
        for station in self.registry.stations() {
            let observation = snapshot.get(station.code());
            let classification = classify(station, &self.registry, &*snapshot);
            let sample = StationSample {
                station,
                classification,
                observation,
            };
            let color = policies.for_station(station.code()).color_for(&sample);
            let on = map_on && !(blink_dark && self.is_gusting(observation));

            if let Err(e) = display.update(station.led(), color, on) {
                warn!(station = %station, error = %e, "Skipping LED update");
            }
        }
        let result = display.flush();
        drop(display);

        let mut stats = self.stats.lock();
        stats.display_cycles += 1;
        if result.is_err() {
            stats.flush_failures += 1;
        }
        result
    }

    /// Turn the whole strip off.
    fn clear(&self) -> Result<FlushReport, DriverError> {
        let mut display = self.display.lock();
        display.all_off();
        display.flush()
    }

    fn status(&self, station: &Station) -> StationStatus {
        let snapshot = self.store.snapshot();
        let observation = snapshot.get(station.code());
        let classification = classify(station, &self.registry, &*snapshot);
        let color = self.policies.read().for_station(station.code()).color_for(&StationSample {
            station,
            classification,
            observation,
        });
        let lit = self
            .display
            .lock()
            .desired(station.led())
            .is_some_and(|s| s.on);

        StationStatus {
            code: station.code().to_string(),
            name: station.name().to_string(),
            led: station.led(),
            classification,
            color,
            lit,
            observation: observation.cloned(),
        }
    }
}

/// Runs the map: periodic observation refresh and periodic display.
///
/// The two loops run as independent tokio tasks with their own cadence.
/// They share only the [`ObservationStore`], whose snapshots are swapped as
/// a unit. Both loops stop when the cancellation token fires; shutdown then
/// turns every LED off.
///
/// # Example
///
/// ```ignore
/// let orchestrator = MapOrchestrator::from_map_config(&config, source, driver)?;
/// let token = orchestrator.cancellation_token();
/// ctrlc::set_handler(move || token.cancel())?;
/// orchestrator.run().await;
/// ```
pub struct MapOrchestrator {
    state: Arc<MapState>,
    cancellation: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MapOrchestrator {
    /// Create an orchestrator over a built registry.
    pub fn new(
        registry: StationRegistry,
        source: Arc<dyn ObservationSource>,
        driver: Box<dyn LedDriver>,
        config: OrchestratorConfig,
    ) -> Result<Self, OrchestratorError> {
        let pixels = driver.pixel_count();
        if pixels < registry.led_count() {
            return Err(OrchestratorError::StripTooShort {
                pixels,
                required: registry.led_count(),
            });
        }

        let mut display = DisplaySynchronizer::new(driver);
        if let Some(interval) = config.resync_interval {
            display = display.with_resync_interval(interval);
        }

        let policies = PolicySet {
            default: config.display.policy(),
            overrides: HashMap::new(),
        };

        info!(
            stations = registry.len(),
            leds = registry.led_count(),
            display = %config.display,
            "Map orchestrator created"
        );

        Ok(Self {
            state: Arc::new(MapState {
                registry: Arc::new(registry),
                store: Arc::new(ObservationStore::new()),
                source,
                display: Mutex::new(display),
                policies: RwLock::new(policies),
                config,
                map_on: AtomicBool::new(true),
                blink_phase: AtomicBool::new(false),
                stats: Mutex::new(MapStats::default()),
            }),
            cancellation: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    /// Build the registry from a map configuration and create the
    /// orchestrator.
    pub fn from_map_config(
        config: &MapConfig,
        source: Arc<dyn ObservationSource>,
        driver: Box<dyn LedDriver>,
    ) -> Result<Self, OrchestratorError> {
        let registry = StationRegistry::build(&config.registry_config())?;
        Self::new(registry, source, driver, OrchestratorConfig::from(config))
    }

    /// Spawn the refresh and display loops on the current runtime.
    ///
    /// Calling this twice has no effect.
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }

        let state = Arc::clone(&self.state);
        let cancel = self.cancellation.clone();
        self.tasks.push(tokio::spawn(async move {
            refresh_loop(state, cancel).await;
        }));

        let state = Arc::clone(&self.state);
        let cancel = self.cancellation.clone();
        self.tasks.push(tokio::spawn(async move {
            display_loop(state, cancel).await;
        }));

        info!(
            refresh_interval = ?self.state.config.refresh_interval,
            display_interval = ?self.state.config.display_interval,
            "Map loops started"
        );
    }

    /// Start, wait for cancellation, then shut down.
    pub async fn run(mut self) {
        self.start();
        self.cancellation.cancelled().await;
        self.shutdown().await;
    }

    /// Stop both loops and turn every LED off.
    pub async fn shutdown(mut self) {
        info!("Shutting down map orchestrator");

        // 1. Stop the loops
        self.cancellation.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "Map task ended abnormally");
            }
        }

        // 2. Best-effort all-off
        let state = Arc::clone(&self.state);
        match tokio::task::spawn_blocking(move || state.clear()).await {
            Ok(Ok(report)) => info!(written = report.written, "LEDs cleared"),
            Ok(Err(e)) => warn!(error = %e, "Failed to clear LEDs"),
            Err(e) => warn!(error = %e, "Clear task failed"),
        }

        info!("Map orchestrator shutdown complete");
    }

    /// Token that stops the loops when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Fetch observations once, outside the refresh loop.
    pub async fn refresh_now(&self) -> Result<usize, FetchError> {
        self.state.refresh().await
    }

    /// Run one display cycle, outside the display loop.
    pub fn display_now(&self) -> Result<FlushReport, DriverError> {
        self.state.render()
    }

    /// Turn the map on or off. Colors keep updating while off.
    pub fn set_map_on(&self, on: bool) {
        self.state.map_on.store(on, Ordering::Relaxed);
        self.state.display.lock().set_all_on(on);
        info!(on, "Map power changed");
    }

    /// Whether the map is on.
    pub fn is_map_on(&self) -> bool {
        self.state.map_on.load(Ordering::Relaxed)
    }

    /// Replace the policy used by stations without an override.
    pub fn set_default_policy(&self, policy: Arc<dyn ColorPolicy>) {
        info!(policy = policy.name(), "Default color policy changed");
        self.state.policies.write().default = policy;
    }

    /// Use `policy` for one station.
    pub fn set_policy(
        &self,
        code: &str,
        policy: Arc<dyn ColorPolicy>,
    ) -> Result<(), RegistryError> {
        let station = self.state.registry.get(code)?;
        debug!(station = %station, policy = policy.name(), "Station color policy set");
        self.state
            .policies
            .write()
            .overrides
            .insert(station.code().to_string(), policy);
        Ok(())
    }

    /// Return a station to the default policy.
    pub fn clear_policy(&self, code: &str) {
        self.state.policies.write().overrides.remove(code);
    }

    /// Current view of one station.
    pub fn status(&self, code: &str) -> Result<StationStatus, RegistryError> {
        let station = self.state.registry.get(code)?;
        Ok(self.state.status(station))
    }

    /// Current view of every station, in configuration order.
    pub fn statuses(&self) -> Vec<StationStatus> {
        self.state
            .registry
            .stations()
            .map(|station| self.state.status(station))
            .collect()
    }

    /// When observations were last replaced.
    pub fn last_refresh_time(&self) -> Option<DateTime<Utc>> {
        self.state.store.last_refresh_time()
    }

    /// Loop counters.
    pub fn stats(&self) -> MapStats {
        self.state.stats.lock().clone()
    }

    /// The station registry.
    pub fn registry(&self) -> &Arc<StationRegistry> {
        &self.state.registry
    }

    /// The observation store.
    pub fn store(&self) -> &Arc<ObservationStore> {
        &self.state.store
    }
}

impl Drop for MapOrchestrator {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

async fn refresh_loop(state: Arc<MapState>, cancel: CancellationToken) {
    let interval = state.config.refresh_interval;
    loop {
        // An abandoned fetch finishes on the blocking pool and is discarded.
        // Failures are logged and counted inside refresh.
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Refresh loop cancelled during fetch");
                break;
            }

            _ = state.refresh() => {}
        }

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Refresh loop cancelled");
                break;
            }

            _ = tokio::time::sleep(interval) => {}
        }
    }
}

async fn display_loop(state: Arc<MapState>, cancel: CancellationToken) {
    let interval = state.config.display_interval;
    loop {
        state.blink_phase.fetch_xor(true, Ordering::Relaxed);

        // Drivers may block on the bus
        let cycle_state = Arc::clone(&state);
        match tokio::task::spawn_blocking(move || cycle_state.render()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!(error = %e, "Display cycle failed, retrying next cycle"),
            Err(e) => warn!(error = %e, "Display task failed"),
        }

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("Display loop cancelled");
                break;
            }

            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::color::{palette, GradientPolicy, Rgb};
    use crate::display::MemoryDriver;
    use crate::estimator::Classification;
    use crate::observation::FlightCategory;
    use crate::source::StaticSource;
    use crate::station::{RegistryConfig, StationDescriptor};

    /// Source whose fetch takes `delay`.
    struct SlowSource {
        delay: Duration,
    }

    impl ObservationSource for SlowSource {
        fn fetch(&self, _: &[String]) -> Result<HashMap<String, Observation>, FetchError> {
            std::thread::sleep(self.delay);
            Ok(observations())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    /// Strip whose commit takes `delay`.
    struct SlowDriver {
        strip: MemoryDriver,
        delay: Duration,
    }

    impl LedDriver for SlowDriver {
        fn pixel_count(&self) -> usize {
            self.strip.pixel_count()
        }

        fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), DriverError> {
            self.strip.set_pixel(index, color)
        }

        fn commit(&mut self) -> Result<(), DriverError> {
            std::thread::sleep(self.delay);
            self.strip.commit()
        }
    }

    fn registry() -> StationRegistry {
        StationRegistry::build(&RegistryConfig::new(
            4,
            vec![
                StationDescriptor::new("KHPN", 0, 41.067, -73.707),
                StationDescriptor::new("KBDR", 1, 41.163, -73.126)
                    .with_neighbors(["KHPN", "KLGA"]),
                StationDescriptor::new("KLGA", 2, 40.777, -73.873),
            ],
        ))
        .unwrap()
    }

    fn observations() -> HashMap<String, Observation> {
        HashMap::from([
            (
                "KHPN".to_string(),
                Observation::new()
                    .with_category(FlightCategory::Vfr)
                    .with_temperature(21.0),
            ),
            (
                "KLGA".to_string(),
                Observation::new()
                    .with_ceiling(800.0)
                    .with_visibility(2.0)
                    .with_gust(32.0),
            ),
        ])
    }

    fn orchestrator(config: OrchestratorConfig) -> (StaticSource, MemoryDriver, MapOrchestrator) {
        let source = StaticSource::new(observations());
        let strip = MemoryDriver::new(4);
        let orchestrator = MapOrchestrator::new(
            registry(),
            Arc::new(source.clone()),
            Box::new(strip.clone()),
            config,
        )
        .unwrap();
        (source, strip, orchestrator)
    }

    #[tokio::test]
    async fn test_refresh_then_display() {
        let (_, strip, orchestrator) = orchestrator(OrchestratorConfig::default());
        assert_eq!(orchestrator.refresh_now().await.unwrap(), 2);
        assert!(orchestrator.last_refresh_time().is_some());

        let report = orchestrator.display_now().unwrap();
        assert_eq!(report.written, 3);
        assert!(report.committed);

        // KHPN reported, KLGA own data, KBDR from KLGA only
        assert_eq!(
            strip.shown(),
            vec![palette::GREEN, palette::RED, palette::RED, palette::OFF]
        );
    }

    #[tokio::test]
    async fn test_unchanged_cycle_does_not_commit() {
        let (_, strip, orchestrator) = orchestrator(OrchestratorConfig::default());
        orchestrator.refresh_now().await.unwrap();
        orchestrator.display_now().unwrap();
        orchestrator.display_now().unwrap();

        assert_eq!(strip.commit_count(), 1);
        assert_eq!(orchestrator.stats().display_cycles, 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_data() {
        let (source, _, orchestrator) = orchestrator(OrchestratorConfig::default());
        orchestrator.refresh_now().await.unwrap();
        let refreshed_at = orchestrator.last_refresh_time();

        source.fail("upstream timeout");
        assert!(orchestrator.refresh_now().await.is_err());

        assert_eq!(orchestrator.last_refresh_time(), refreshed_at);
        assert_eq!(orchestrator.store().len(), 2);
        let stats = orchestrator.stats();
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.refresh_failures, 1);
        assert_eq!(
            stats.last_refresh_error.as_deref(),
            Some("Observation feed unavailable: upstream timeout")
        );
    }

    #[tokio::test]
    async fn test_flush_failure_retried_next_cycle() {
        let (_, strip, orchestrator) = orchestrator(OrchestratorConfig::default());
        orchestrator.refresh_now().await.unwrap();

        strip.fail_commits(true);
        assert!(orchestrator.display_now().is_err());
        assert_eq!(orchestrator.stats().flush_failures, 1);

        strip.fail_commits(false);
        let report = orchestrator.display_now().unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(strip.pixel(0), Some(palette::GREEN));
    }

    #[tokio::test]
    async fn test_gust_alert_blinks() {
        let config = OrchestratorConfig::default().with_gust_alert(25.0);
        let (_, strip, orchestrator) = orchestrator(config);
        orchestrator.refresh_now().await.unwrap();

        orchestrator.display_now().unwrap();
        assert_eq!(strip.pixel(2), Some(palette::RED));

        orchestrator.state.blink_phase.store(true, Ordering::Relaxed);
        orchestrator.display_now().unwrap();
        assert_eq!(strip.pixel(2), Some(palette::OFF));
        // Non-gusting stations stay lit
        assert_eq!(strip.pixel(0), Some(palette::GREEN));

        let status = orchestrator.status("KLGA").unwrap();
        assert!(!status.lit);
        assert_eq!(status.color, palette::RED);
    }

    #[tokio::test]
    async fn test_policy_override_and_default() {
        let (_, strip, orchestrator) = orchestrator(OrchestratorConfig::default());
        orchestrator.refresh_now().await.unwrap();

        orchestrator
            .set_policy("KHPN", Arc::new(GradientPolicy::temperature()))
            .unwrap();
        orchestrator.display_now().unwrap();
        let expected = GradientPolicy::temperature().color_for_value(21.0);
        assert_eq!(strip.pixel(0), Some(expected));

        assert_eq!(
            orchestrator.set_policy("KXXX", Arc::new(GradientPolicy::wind())),
            Err(RegistryError::NotFound("KXXX".to_string()))
        );

        orchestrator.clear_policy("KHPN");
        orchestrator.set_default_policy(Arc::new(GradientPolicy::wind()));
        orchestrator.display_now().unwrap();
        // No station reports wind
        assert_eq!(strip.shown(), vec![palette::OFF; 4]);
    }

    #[tokio::test]
    async fn test_status_surface() {
        let (_, _, orchestrator) = orchestrator(OrchestratorConfig::default());
        orchestrator.refresh_now().await.unwrap();
        orchestrator.display_now().unwrap();

        let khpn = orchestrator.status("KHPN").unwrap();
        assert_eq!(khpn.classification, Classification::Reported(FlightCategory::Vfr));
        assert_eq!(khpn.color, palette::GREEN);
        assert!(khpn.lit);
        assert!(khpn.observation.is_some());

        let kbdr = orchestrator.status("KBDR").unwrap();
        assert_eq!(kbdr.classification, Classification::Estimated(FlightCategory::Ifr));
        assert!(kbdr.observation.is_none());

        assert!(orchestrator.status("KXXX").is_err());
        assert_eq!(orchestrator.statuses().len(), 3);
    }

    #[tokio::test]
    async fn test_map_power() {
        let (_, strip, orchestrator) = orchestrator(OrchestratorConfig::default());
        orchestrator.refresh_now().await.unwrap();
        orchestrator.display_now().unwrap();

        orchestrator.set_map_on(false);
        assert!(!orchestrator.is_map_on());
        orchestrator.display_now().unwrap();
        assert_eq!(strip.shown(), vec![palette::OFF; 4]);

        orchestrator.set_map_on(true);
        orchestrator.display_now().unwrap();
        assert_eq!(strip.pixel(0), Some(palette::GREEN));
    }

    #[test]
    fn test_strip_too_short() {
        let result = MapOrchestrator::new(
            registry(),
            Arc::new(StaticSource::default()),
            Box::new(MemoryDriver::new(2)),
            OrchestratorConfig::default(),
        );
        assert!(matches!(
            result,
            Err(OrchestratorError::StripTooShort {
                pixels: 2,
                required: 4
            })
        ));
    }

    #[test]
    fn test_from_map_config_rejects_bad_neighbor() {
        let config = MapConfig {
            stations: vec![
                StationDescriptor::new("KHPN", 0, 41.0, -73.7).with_neighbors(["KNOPE"]),
            ],
            ..MapConfig::default()
        };
        let result = MapOrchestrator::from_map_config(
            &config,
            Arc::new(StaticSource::default()),
            Box::new(MemoryDriver::new(1)),
        );
        assert!(matches!(result, Err(OrchestratorError::Registry(_))));
    }

    #[tokio::test]
    async fn test_loops_run_and_shutdown_clears() {
        let config = OrchestratorConfig::default()
            .with_refresh_interval(Duration::from_millis(20))
            .with_display_interval(Duration::from_millis(5));
        let (_, strip, mut orchestrator) = orchestrator(config);
        orchestrator.start();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while strip.pixel(0) != Some(palette::GREEN) {
            assert!(tokio::time::Instant::now() < deadline, "display never updated");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(orchestrator.stats().refreshes >= 1);

        orchestrator.shutdown().await;
        assert_eq!(strip.shown(), vec![palette::OFF; 4]);
    }

    #[tokio::test]
    async fn test_shutdown_does_not_wait_for_slow_fetch() {
        let strip = MemoryDriver::new(4);
        let config = OrchestratorConfig::default()
            .with_refresh_interval(Duration::from_millis(20))
            .with_display_interval(Duration::from_millis(5));
        let mut orchestrator = MapOrchestrator::new(
            registry(),
            Arc::new(SlowSource {
                delay: Duration::from_secs(1),
            }),
            Box::new(strip.clone()),
            config,
        )
        .unwrap();
        orchestrator.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = std::time::Instant::now();
        orchestrator.shutdown().await;
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_millis(500), "shutdown took {:?}", elapsed);
        assert_eq!(strip.shown(), vec![palette::OFF; 4]);
    }

    #[tokio::test]
    async fn test_slow_driver_does_not_stall_runtime() {
        let strip = MemoryDriver::new(4);
        let driver = SlowDriver {
            strip: strip.clone(),
            delay: Duration::from_millis(500),
        };
        let config = OrchestratorConfig::default().with_display_interval(Duration::from_millis(5));
        let mut orchestrator = MapOrchestrator::new(
            registry(),
            Arc::new(StaticSource::new(observations())),
            Box::new(driver),
            config,
        )
        .unwrap();
        orchestrator.start();

        // The first display cycle commits while this task sleeps
        let started = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let elapsed = started.elapsed();
        assert!(elapsed < Duration::from_millis(250), "runtime stalled for {:?}", elapsed);

        orchestrator.shutdown().await;
        assert_eq!(strip.shown(), vec![palette::OFF; 4]);
        assert!(strip.commit_count() >= 2);
    }
}
