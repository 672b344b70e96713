//! Scheduled health-check job.
//!
//! NOTE: route and button checks are simulated. No request is sent and no
//! page is inspected: every route reports 200 after a fixed delay, and
//! button presence comes from a [`ButtonProbe`], which in production is a
//! random draw. Only the database probe and the result insert are real.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use ozar_gateway::Gateway;
use ozar_types::models::{ButtonCheck, HealthCheckResult, RouteCheck};

pub const ROUTES_TO_CHECK: [&str; 9] = [
    "/",
    "/login",
    "/signup",
    "/services",
    "/premium-labs",
    "/pricing",
    "/blog",
    "/downloads",
    "/dashboard",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalButton {
    pub id: &'static str,
    pub route: &'static str,
}

pub const CRITICAL_BUTTONS: [CriticalButton; 2] = [
    CriticalButton { id: "view-premium-labs", route: "/" },
    CriticalButton { id: "start-lab", route: "/premium-labs" },
];

pub const SIMULATED_ROUTE_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub exists: bool,
    pub has_click_handler: bool,
}

/// Reports whether a button is present and wired on its page.
pub trait ButtonProbe: Send {
    fn inspect(&mut self, button: &CriticalButton) -> ButtonState;
}

/// Random presence (p = 0.9) and handler (p = 0.8).
pub struct SimulatedProbe<R> {
    rng: R,
}

impl<R: Rng + Send> SimulatedProbe<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> ButtonProbe for SimulatedProbe<R> {
    fn inspect(&mut self, _button: &CriticalButton) -> ButtonState {
        ButtonState {
            exists: self.rng.random::<f64>() > 0.1,
            has_click_handler: self.rng.random::<f64>() > 0.2,
        }
    }
}

/// One pass of the job. Never fails: problems are recorded in `errors`, and
/// a failed insert is only logged.
pub async fn run_health_check<P>(gateway: &dyn Gateway, probe: &mut P, route_delay: Duration) -> HealthCheckResult
where
    P: ButtonProbe + ?Sized,
{
    let mut result = HealthCheckResult {
        timestamp: Utc::now(),
        database_connected: false,
        route_checks: Vec::with_capacity(ROUTES_TO_CHECK.len()),
        button_checks: Vec::with_capacity(CRITICAL_BUTTONS.len()),
        errors: Vec::new(),
        repairs: Vec::new(),
    };

    match gateway.probe_health_checks().await {
        Ok(()) => result.database_connected = true,
        Err(e) => result.errors.push(format!("Database connectivity error: {e}")),
    }

    for route in ROUTES_TO_CHECK {
        let started = Instant::now();
        tokio::time::sleep(route_delay).await;
        result.route_checks.push(RouteCheck {
            url: route.to_string(),
            status_code: 200,
            response_time: started.elapsed().as_millis() as u64,
            success: true,
        });
    }

    for button in &CRITICAL_BUTTONS {
        let state = probe.inspect(button);
        let mut check = ButtonCheck {
            button_id: button.id.to_string(),
            exists: state.exists,
            has_click_handler: state.has_click_handler,
            repaired: None,
        };
        // The "repair" is only recorded
        if state.exists && !state.has_click_handler {
            check.repaired = Some(true);
            result.repairs.push(format!("Repaired click handler for button: {}", button.id));
        }
        result.button_checks.push(check);
    }

    match gateway.insert_health_check(&result).await {
        Ok(id) => info!("Health check {} recorded ({} errors, {} repairs)", id, result.errors.len(), result.repairs.len()),
        Err(e) => error!("Error saving health check result: {}", e),
    }

    result
}

/// The job bound to a service-role gateway.
pub struct HealthJob {
    gateway: Arc<dyn Gateway>,
    route_delay: Duration,
    runs: AtomicU64,
}

impl HealthJob {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            route_delay: SIMULATED_ROUTE_DELAY,
            runs: AtomicU64::new(0),
        }
    }

    pub fn with_route_delay(mut self, delay: Duration) -> Self {
        self.route_delay = delay;
        self
    }

    pub async fn run(&self) -> HealthCheckResult {
        let mut probe = SimulatedProbe::new(StdRng::from_os_rng());
        self.run_with(&mut probe).await
    }

    pub async fn run_with<P: ButtonProbe + ?Sized>(&self, probe: &mut P) -> HealthCheckResult {
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Health check run #{} starting", run);
        let result = run_health_check(&*self.gateway, probe, self.route_delay).await;
        if !result.database_connected {
            warn!("Health check run #{} could not reach the database", run);
        }
        result
    }

    /// Completed plus in-flight runs since start.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Run every `every`, first run one period from now.
    pub fn spawn_schedule(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.run().await;
            }
        })
    }
}
