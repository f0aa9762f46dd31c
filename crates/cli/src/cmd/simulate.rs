//! Replay timelines through the rate limiters and the form guard
//!
//! Virtual time by default: the timeline is replayed on a `ManualScheduler`
//! and the report is exact. `--realtime` drives the tokio scheduler and
//! actually waits, so reported times carry scheduling jitter.

use crate::util::{self, GuardStep};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use steady_core::{config, ManualScheduler, Scheduler, TokioScheduler};
use steady_guard::{FormGuard, GuardSnapshot, MemoryForm, UnloadDecision, UnloadEvent};
use steady_ratelimit::{debounce, throttle};
use tracing::debug;

/// Slack added after the last timer when waiting on the real clock
const REALTIME_MARGIN: Duration = Duration::from_millis(20);

#[derive(Debug, Serialize)]
struct RateReport {
    mode: &'static str,
    duration_ms: u64,
    calls: Vec<CallRecord>,
    runs: Vec<RunRecord>,
}

#[derive(Debug, Serialize)]
struct CallRecord {
    call: usize,
    at_ms: u64,
    /// Throttle only: whether the call went through
    #[serde(skip_serializing_if = "Option::is_none")]
    admitted: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
struct RunRecord {
    call: usize,
    at_ms: u64,
}

/// Clock driving a replay
enum Driver {
    Virtual(Arc<ManualScheduler>),
    Realtime(Arc<TokioScheduler>),
}

impl Driver {
    fn new(realtime: bool) -> Result<Self> {
        if realtime {
            let scheduler = TokioScheduler::current().context("Realtime replay needs a runtime")?;
            Ok(Driver::Realtime(Arc::new(scheduler)))
        } else {
            Ok(Driver::Virtual(Arc::new(ManualScheduler::new())))
        }
    }

    fn scheduler(&self) -> Arc<dyn Scheduler> {
        match self {
            Driver::Virtual(s) => s.clone() as Arc<dyn Scheduler>,
            Driver::Realtime(s) => s.clone() as Arc<dyn Scheduler>,
        }
    }

    /// Move to `at` on the replay clock
    async fn advance_to(&self, at: Duration) {
        match self {
            Driver::Virtual(s) => {
                s.advance_to(at);
            }
            Driver::Realtime(s) => {
                let remaining = at.saturating_sub(s.now());
                if !remaining.is_zero() {
                    tokio::time::sleep(remaining).await;
                }
            }
        }
    }

    /// Let every outstanding timer fire
    async fn settle(&self, tail: Duration) {
        match self {
            Driver::Virtual(s) => {
                s.run_until_idle();
            }
            Driver::Realtime(_) => {
                tokio::time::sleep(tail + REALTIME_MARGIN).await;
            }
        }
    }
}

/// Debounce a timeline of calls
pub async fn run_debounce(at_ms: &[u64], wait_ms: Option<u64>, realtime: bool, json: bool) -> Result<()> {
    let timeline = util::parse_timeline(at_ms)?;
    let wait = match wait_ms {
        Some(ms) => Duration::from_millis(ms),
        None => config::load()?.ratelimit.debounce_wait(),
    };

    let driver = Driver::new(realtime)?;
    let scheduler = driver.scheduler();
    let runs = Arc::new(Mutex::new(Vec::new()));

    let clock = Arc::clone(&scheduler);
    let sink = Arc::clone(&runs);
    let debounced = debounce(scheduler, wait, move |call: usize| {
        sink.lock().push(RunRecord {
            call,
            at_ms: util::as_ms(clock.now()),
        });
    })
    .context("Invalid debounce wait")?;

    let mut calls = Vec::with_capacity(timeline.len());
    for (call, at) in timeline.iter().enumerate() {
        driver.advance_to(*at).await;
        debounced.call(call);
        calls.push(CallRecord {
            call,
            at_ms: util::as_ms(*at),
            admitted: None,
        });
    }
    driver.settle(debounced.wait()).await;

    let report = RateReport {
        mode: "debounce",
        duration_ms: util::as_ms(debounced.wait()),
        calls,
        runs: runs.lock().clone(),
    };
    debug!(runs = report.runs.len(), "debounce replay finished");
    print_rate_report(&report, json)
}

/// Throttle a timeline of calls
pub async fn run_throttle(at_ms: &[u64], limit_ms: Option<u64>, realtime: bool, json: bool) -> Result<()> {
    let timeline = util::parse_timeline(at_ms)?;
    let limit = match limit_ms {
        Some(ms) => Duration::from_millis(ms),
        None => config::load()?.ratelimit.throttle_limit(),
    };

    let driver = Driver::new(realtime)?;
    let scheduler = driver.scheduler();
    let runs = Arc::new(Mutex::new(Vec::new()));

    let clock = Arc::clone(&scheduler);
    let sink = Arc::clone(&runs);
    let throttled = throttle(scheduler, limit, move |call: usize| {
        sink.lock().push(RunRecord {
            call,
            at_ms: util::as_ms(clock.now()),
        });
    })
    .context("Invalid throttle limit")?;

    let mut calls = Vec::with_capacity(timeline.len());
    for (call, at) in timeline.iter().enumerate() {
        driver.advance_to(*at).await;
        let admitted = throttled.call(call);
        calls.push(CallRecord {
            call,
            at_ms: util::as_ms(*at),
            admitted: Some(admitted),
        });
    }
    driver.settle(throttled.limit()).await;

    let report = RateReport {
        mode: "throttle",
        duration_ms: util::as_ms(throttled.limit()),
        calls,
        runs: runs.lock().clone(),
    };
    debug!(runs = report.runs.len(), "throttle replay finished");
    print_rate_report(&report, json)
}

fn print_rate_report(report: &RateReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} {}",
        report.mode.bold(),
        format!("({}ms)", report.duration_ms).dimmed()
    );

    for call in &report.calls {
        let ran_at = report.runs.iter().find(|run| run.call == call.call);
        let outcome = match (call.admitted, ran_at) {
            (Some(false), _) => "dropped".red().to_string(),
            (_, Some(run)) => format!("ran at {}ms", run.at_ms).green().to_string(),
            (_, None) => "superseded".yellow().to_string(),
        };
        println!("  #{:<3} {:>6}ms  {}", call.call, call.at_ms, outcome);
    }

    println!(
        "{} {} of {} calls ran",
        "→".cyan(),
        report.runs.len(),
        report.calls.len()
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct GuardReport {
    steps: Vec<StepRecord>,
    final_state: GuardSnapshot,
}

#[derive(Debug, Serialize)]
struct StepRecord {
    step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unload: Option<UnloadDecision>,
}

/// Replay form events against a guard
pub async fn run_guard(steps: &[String], unguarded: &[String], json: bool) -> Result<()> {
    let parsed = steps
        .iter()
        .map(|step| util::parse_guard_step(step))
        .collect::<Result<Vec<_>>>()?;

    let guard_config = config::load()?.guard;
    let mut guard = FormGuard::new(&guard_config).context("Invalid guard configuration")?;

    // Forms appear in first-mention order; all carry the marker unless listed as unguarded.
    let mut forms: BTreeMap<String, MemoryForm> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();
    for step in &parsed {
        if let GuardStep::Input(name) | GuardStep::Submit(name) = step {
            if !forms.contains_key(name) {
                let mut form = MemoryForm::new(name.clone());
                if !unguarded.contains(name) {
                    form = form.with_marker(guard.marker());
                }
                forms.insert(name.clone(), form);
                order.push(name.clone());
            }
        }
    }

    guard.install_marked(order.iter().filter_map(|name| forms.get(name)));

    let mut records = Vec::with_capacity(parsed.len());
    for (raw, step) in steps.iter().zip(&parsed) {
        let unload = match step {
            GuardStep::Input(name) => {
                forms[name].input();
                None
            }
            GuardStep::Submit(name) => {
                forms[name].submit();
                None
            }
            GuardStep::Unload => {
                let mut event = UnloadEvent::new();
                Some(guard.on_unload(&mut event))
            }
        };
        records.push(StepRecord {
            step: raw.trim().to_string(),
            unload,
        });
    }

    let report = GuardReport {
        steps: records,
        final_state: guard.snapshot(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for record in &report.steps {
        match &record.unload {
            None => println!("  {}", record.step),
            Some(UnloadDecision::Proceed) => {
                println!("  {}  {}", record.step, "leave without prompt".green())
            }
            Some(UnloadDecision::Confirm { message, dirty_forms }) => println!(
                "  {}  {} {}",
                record.step,
                format!("confirm: \"{}\"", message).yellow(),
                format!("[{}]", dirty_forms.join(", ")).dimmed()
            ),
        }
    }

    println!("\n{}", "Forms".bold());
    for (name, state) in &report.final_state.forms {
        println!("  {:<20} {:?}", name.cyan(), state);
    }
    for name in unguarded.iter().filter(|name| forms.contains_key(*name)) {
        println!("  {:<20} {}", name.cyan(), "unguarded".dimmed());
    }

    Ok(())
}
