//! Demo Harness (v0.1)
//!
//! Three tab-switch strategies over the same scheduler, plus an input whose
//! expensive display follows a deferred value:
//!
//! - **untransitioned**: every switch is an immediate task; tab two blocks
//! - **transitioned** / **pending**: every switch is a transition; rapid
//!   switches interrupt each other (pending also shows `Loading...`)
//! - **timeout**: every switch is pushed to the next cycle with a fixed delay
//!
//! A background worker answers posted arrays on a later cycle.
//!
//! All components share one virtual clock and one event log. The harness
//! owns the run loop; callers drive it with `advance` / `settle` (or the
//! realtime variants).

mod input;
mod tab;
mod worker;

pub use input::{InputField, InputHandle, ProbeHandle};
pub use tab::{Strategy, Tab, TabState};
pub use worker::{sum_items, Worker};

use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::clock::VirtualClock;
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::event::{Event, EventLog, LogView, LogWriter};
use crate::runtime::{self, Cooperative, RunLoop};
use crate::scenario::Step;
use crate::scheduler::{Commit, Task, TaskContext, TaskFailure, TransitionScheduler};

/// Label of the demo input
pub const INPUT_LABEL: &str = "type here";
/// Separator written after each completed switch
pub const SEPARATOR: &str = "-----";

/// Tab switcher + deferred input wired to one trace
pub struct DemoHarness {
    strategy: Strategy,
    config: HarnessConfig,
    clock: VirtualClock,
    log: EventLog,
    writer: LogWriter,
    run_loop: RunLoop,
    scheduler: TransitionScheduler<TabState>,
    input: InputField,
    input_handle: InputHandle,
    probe: ProbeHandle,
    worker: Worker,
    injected_failure: Option<String>,
}

impl DemoHarness {
    pub fn new(strategy: Strategy, config: HarnessConfig) -> Self {
        let clock = VirtualClock::new();
        let log = EventLog::with_clock(clock.clone(), config.log);
        let writer = log.writer();
        let scheduler = TransitionScheduler::new(TabState::default(), clock.clone(), writer.clone());
        let (input, input_handle) = InputField::mount(
            INPUT_LABEL,
            clock.clone(),
            config.recompute_cost(),
            writer.clone(),
        );
        let probe = ProbeHandle::mount(writer.clone());
        let worker = Worker::mount(clock.clone(), config.worker_latency(), writer.clone());

        info!(%strategy, expensive_tab_ms = config.expensive_tab_ms, "harness mounted");
        Self {
            strategy,
            config,
            run_loop: RunLoop::new(clock.clone()),
            clock,
            log,
            writer,
            scheduler,
            input,
            input_handle,
            probe,
            worker,
            injected_failure: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Controls
    // ═══════════════════════════════════════════════════════════════

    /// Press the button for `tab`
    ///
    /// Returns `Ok(false)` when the button is disabled. An immediate switch
    /// that fails returns the failure; deferred and timeout failures land
    /// in the trace instead.
    #[instrument(skip(self), fields(strategy = %self.strategy))]
    pub fn click(&mut self, tab: Tab) -> Result<bool> {
        if !self.is_enabled(tab) {
            debug!(%tab, "button disabled, click ignored");
            return Ok(false);
        }

        let failure = self.injected_failure.take();
        self.writer.log(format!("Switching to tab {}", tab));
        match self.strategy {
            Strategy::Untransitioned => {
                self.writer.log(format!("Before setTabToShow({})", tab));
                let task = Task::new(format!("switch to tab {}", tab), move |ctx| {
                    check_injected(ctx, failure)?;
                    Ok(Commit::new(move |state: &mut TabState| state.shown = tab))
                })
                .with_cost(self.config.render_cost(tab));
                self.scheduler.submit_immediate(task)?;
                self.writer.log(format!("After setTabToShow({})", tab));
                self.writer.log(format!("Switched to tab {}", tab));
                self.writer.log(SEPARATOR);
            }
            Strategy::Transitioned | Strategy::Pending => {
                let generation = self.scheduler.submit_deferred(self.transition_to(tab, failure));
                debug!(%tab, generation, "switch submitted as transition");
                self.writer.log(format!("Switched to tab {}", tab));
                self.writer.log(SEPARATOR);
            }
            Strategy::Timeout => {
                self.scheduler
                    .schedule_timeout(self.config.timeout_delay(), self.timeout_to(tab, failure));
                self.writer.log(format!("Switched to tab {}", tab));
            }
        }
        Ok(true)
    }

    fn transition_to(&self, tab: Tab, failure: Option<String>) -> Task<TabState> {
        let writer = self.writer.clone();
        Task::new(format!("transition to tab {}", tab), move |ctx| {
            check_injected(ctx, failure)?;
            ctx.log(format!("Transitioning to tab {}", tab));
            let commit = Commit::new(move |state: &mut TabState| state.shown = tab);
            ctx.log(format!("Transitioned to tab {}", tab));
            Ok(commit)
        })
        .with_cost(self.config.render_cost(tab))
        .on_failure(move |failure| {
            writer.log(format!("Failed to switch to tab {}: {}", tab, failure.reason));
        })
    }

    fn timeout_to(&self, tab: Tab, failure: Option<String>) -> Task<TabState> {
        let writer = self.writer.clone();
        Task::new(format!("timeout switch to tab {}", tab), move |ctx| {
            ctx.log(format!("Timeout begins: {}", tab));
            check_injected(ctx, failure)?;
            let commit = Commit::new(move |state: &mut TabState| state.shown = tab);
            ctx.log(format!("Timeout ends: {}", tab));
            ctx.log(SEPARATOR);
            Ok(commit)
        })
        .with_cost(self.config.render_cost(tab))
        .on_failure(move |failure| {
            writer.log(format!("Failed to switch to tab {}: {}", tab, failure.reason));
        })
    }

    /// Whether the button for `tab` accepts clicks
    pub fn is_enabled(&self, tab: Tab) -> bool {
        let shown = self.shown_tab();
        match self.strategy {
            Strategy::Pending if tab.is_expensive() => shown != tab && !self.is_pending(),
            Strategy::Pending => shown != tab || self.is_pending(),
            _ => shown != tab,
        }
    }

    /// Raw change event from the input
    pub fn on_input(&mut self, raw: &str) {
        self.input.on_change(raw);
    }

    /// Type `text` one character at a time
    pub fn type_text(&mut self, text: &str) {
        let mut value = self.input.value();
        for c in text.chars() {
            value.push(c);
            self.input.on_change(&value);
        }
    }

    pub fn focus_input(&self) {
        self.input_handle.focus();
    }

    /// Call the probe child's public method
    pub fn announce(&self) -> u64 {
        self.probe.announce()
    }

    /// The log's clear control
    pub fn clear_log(&self) {
        self.log.view().clear();
    }

    /// Post `items` to the background worker
    pub fn post_to_worker(&mut self, items: Vec<i64>) {
        self.worker.post(items);
    }

    /// Make the next switch's render fail with `reason`
    pub fn fail_next_switch(&mut self, reason: impl Into<String>) {
        self.injected_failure = Some(reason.into());
    }

    // ═══════════════════════════════════════════════════════════════
    // Driving the clock
    // ═══════════════════════════════════════════════════════════════

    /// Run one due job, whichever component it belongs to
    pub fn step(&mut self) -> bool {
        self.run_loop
            .step(&mut [&mut self.scheduler, &mut self.input, &mut self.worker])
    }

    /// Let `by` pass, running everything that comes due
    pub fn advance(&mut self, by: Duration) -> usize {
        self.run_loop
            .advance(by, &mut [&mut self.scheduler, &mut self.input, &mut self.worker])
    }

    /// Run until no component has queued work
    pub fn settle(&mut self) -> usize {
        self.run_loop
            .run_until_idle(&mut [&mut self.scheduler, &mut self.input, &mut self.worker])
    }

    /// `advance` at wall-clock speed
    pub async fn advance_realtime(&mut self, by: Duration) -> usize {
        let sources: &mut [&mut dyn Cooperative] =
            &mut [&mut self.scheduler, &mut self.input, &mut self.worker];
        runtime::pace(&self.run_loop, by, sources).await
    }

    /// `settle` at wall-clock speed
    pub async fn settle_realtime(&mut self) -> usize {
        let sources: &mut [&mut dyn Cooperative] =
            &mut [&mut self.scheduler, &mut self.input, &mut self.worker];
        runtime::pace_until_idle(&self.run_loop, sources).await
    }

    /// Apply one scripted step
    pub fn apply(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Click(tab) => {
                self.click(*tab)?;
            }
            Step::Wait(by) => {
                self.advance(*by);
            }
            Step::Type(text) => self.type_text(text),
            Step::ClearLog => self.clear_log(),
            Step::Announce => {
                self.announce();
            }
            Step::Focus => self.focus_input(),
            Step::Post(items) => self.post_to_worker(items.clone()),
            Step::FailNextSwitch(reason) => self.fail_next_switch(reason.as_str()),
            Step::Settle => {
                self.settle();
            }
        }
        Ok(())
    }

    /// Apply every step, then let outstanding work finish
    pub fn replay(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            self.apply(step)?;
        }
        self.settle();
        Ok(())
    }

    /// `replay` with waits paced in wall-clock time
    pub async fn replay_realtime(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            match step {
                Step::Wait(by) => {
                    self.advance_realtime(*by).await;
                }
                Step::Settle => {
                    self.settle_realtime().await;
                }
                other => self.apply(other)?,
            }
        }
        self.settle_realtime().await;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════
    // Observation
    // ═══════════════════════════════════════════════════════════════

    /// Committed tab
    pub fn shown_tab(&self) -> Tab {
        self.scheduler.state().shown
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Read side of the trace, for displays
    pub fn view(&self) -> LogView {
        self.log.view()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.log.snapshot()
    }

    pub fn scheduler(&self) -> &TransitionScheduler<TabState> {
        &self.scheduler
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_handle(&self) -> &InputHandle {
        &self.input_handle
    }

    pub fn probe(&self) -> &ProbeHandle {
        &self.probe
    }

    pub fn worker(&self) -> &Worker {
        &self.worker
    }

    /// Whether `event` was written by a transition whose commit was dropped
    pub fn is_discarded(&self, event: &Event) -> bool {
        event
            .attribution
            .generation()
            .is_some_and(|g| self.scheduler.is_discarded(g))
    }

    /// Trace without entries from interrupted transitions
    pub fn committed_trace(&self) -> Vec<Event> {
        self.log
            .events()
            .into_iter()
            .filter(|e| !self.is_discarded(e))
            .collect()
    }

    /// Screen lines: buttons, tab body, input display
    pub fn render(&self) -> Vec<String> {
        let buttons: Vec<String> = Tab::ALL
            .into_iter()
            .map(|tab| {
                if self.is_enabled(tab) {
                    format!("[{}]", tab.caption())
                } else {
                    format!("({})", tab.caption())
                }
            })
            .collect();

        let mut lines = vec![buttons.join(" ")];
        if self.strategy == Strategy::Pending && self.is_pending() {
            lines.push("Loading...".to_string());
        } else {
            lines.push(self.shown_tab().content().to_string());
        }
        lines.extend(self.input.render());
        lines
    }
}

/// Fail the running switch if a failure was injected for it
fn check_injected(ctx: &TaskContext, failure: Option<String>) -> std::result::Result<(), TaskFailure> {
    match failure {
        Some(reason) => Err(ctx.fail(reason)),
        None => Ok(()),
    }
}

impl std::fmt::Debug for DemoHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoHarness")
            .field("strategy", &self.strategy)
            .field("now", &self.clock.now())
            .field("scheduler", &self.scheduler)
            .field("input", self.input.deferred())
            .field("worker", &self.worker)
            .field("log", &self.log)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Attribution;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn harness(strategy: Strategy) -> DemoHarness {
        DemoHarness::new(strategy, HarnessConfig::default())
    }

    // ═══════════════════════════════════════════════════════════════
    // Untransitioned
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn untransitioned_switch_blocks_until_rendered() {
        let mut h = harness(Strategy::Untransitioned);
        assert!(h.click(Tab::Two).unwrap());

        assert_eq!(h.shown_tab(), Tab::Two);
        assert_eq!(h.now(), ms(2000));
        assert_eq!(
            h.snapshot(),
            vec![
                "Switching to tab two",
                "Before setTabToShow(two)",
                "After setTabToShow(two)",
                "Switched to tab two",
                "-----",
            ]
        );
        assert!(!h.is_pending());
    }

    #[test]
    fn shown_tab_button_is_disabled() {
        let mut h = harness(Strategy::Untransitioned);
        assert!(!h.is_enabled(Tab::One));
        assert!(!h.click(Tab::One).unwrap());
        assert!(h.snapshot().is_empty());
    }

    // ═══════════════════════════════════════════════════════════════
    // Transitioned
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn transitioned_switch_returns_before_commit() {
        let mut h = harness(Strategy::Transitioned);
        h.click(Tab::Two).unwrap();

        assert_eq!(h.shown_tab(), Tab::One);
        assert!(h.is_pending());
        assert_eq!(h.now(), Duration::ZERO);
        assert_eq!(
            h.snapshot(),
            vec!["Switching to tab two", "Switched to tab two", "-----"]
        );

        h.settle();
        assert_eq!(h.shown_tab(), Tab::Two);
        assert!(!h.is_pending());
        assert_eq!(
            h.snapshot()[3..],
            [
                "Transitioning to tab two",
                "Transitioned to tab two",
                "Committed transition to tab two",
            ]
        );
    }

    #[test]
    fn rapid_switch_discards_expensive_tab() {
        let mut h = harness(Strategy::Transitioned);
        h.click(Tab::Two).unwrap();
        h.advance(ms(10));
        h.click(Tab::Three).unwrap();
        h.settle();

        assert_eq!(h.shown_tab(), Tab::Three);
        assert!(h.scheduler().is_discarded(1));

        let committed: Vec<String> = h
            .committed_trace()
            .iter()
            .map(|e| e.entry.to_string())
            .collect();
        assert!(!committed.iter().any(|e| e.contains("to tab two") && e.starts_with("Transition")));
        assert!(committed.contains(&"Committed transition to tab three".to_string()));
        assert!(!h.snapshot().contains(&"Committed transition to tab two".to_string()));

        // Interrupted work is still visible, just attributed
        let background = h.log().filter_generation(1);
        assert_eq!(background.len(), 2);
        assert!(background
            .iter()
            .all(|e| e.attribution == Attribution::Transition { generation: 1 }));
    }

    #[test]
    fn pending_strategy_shows_loading_and_locks_expensive_button() {
        let mut h = harness(Strategy::Pending);
        h.click(Tab::Three).unwrap();

        assert!(h.render().contains(&"Loading...".to_string()));
        assert!(!h.is_enabled(Tab::Two));
        // Tab one is shown but a switch is pending, so going back is allowed
        assert!(h.is_enabled(Tab::One));

        h.settle();
        assert!(h.render().contains(&"Tab three".to_string()));
        assert!(h.is_enabled(Tab::Two));
        assert!(!h.is_enabled(Tab::Three));
    }

    // ═══════════════════════════════════════════════════════════════
    // Timeout
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn timeout_switch_applies_on_next_cycle() {
        let mut h = harness(Strategy::Timeout);
        h.click(Tab::Three).unwrap();

        assert_eq!(h.shown_tab(), Tab::One);
        assert!(!h.is_pending());
        assert_eq!(h.snapshot(), vec!["Switching to tab three", "Switched to tab three"]);

        h.settle();
        assert_eq!(h.shown_tab(), Tab::Three);
        assert_eq!(
            h.snapshot()[2..],
            ["Timeout begins: three", "Timeout ends: three", "-----"]
        );
    }

    #[test]
    fn timeout_switches_all_apply_in_order() {
        let mut h = harness(Strategy::Timeout);
        h.click(Tab::Two).unwrap();
        h.click(Tab::Three).unwrap();
        h.settle();

        // Nothing is interrupted: the expensive render still blocks
        assert_eq!(h.shown_tab(), Tab::Three);
        assert_eq!(h.now(), ms(2000));
        assert!(h.scheduler().discarded().is_empty());
    }

    // ═══════════════════════════════════════════════════════════════
    // Input, handles, log control
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn typing_commits_deferred_value_once() {
        let mut h = harness(Strategy::Transitioned);
        h.type_text("ab");

        assert_eq!(h.input().value(), "ab");
        assert!(h.render().contains(&"Calculating...".to_string()));

        h.settle();
        assert_eq!(h.input().deferred().commits(), 1);
        assert_eq!(h.snapshot(), vec!["Deferred value: ab"]);
        assert!(h.render().contains(&"Deferred value: ab".to_string()));
    }

    #[test]
    fn transition_and_recompute_interleave_on_one_clock() {
        let config = HarnessConfig {
            expensive_tab_ms: 100,
            recompute_ms: 50,
            ..HarnessConfig::default()
        };
        let mut h = DemoHarness::new(Strategy::Transitioned, config);
        h.click(Tab::Two).unwrap();
        h.type_text("x");
        h.settle();

        let tail: Vec<(u64, String)> = h
            .log()
            .events()
            .into_iter()
            .skip(3)
            .map(|e| (e.timestamp_ms, e.entry.to_string()))
            .collect();
        assert_eq!(
            tail,
            vec![
                (0, "Transitioning to tab two".to_string()),
                (0, "Transitioned to tab two".to_string()),
                (50, "Deferred value: x".to_string()),
                (100, "Committed transition to tab two".to_string()),
            ]
        );
    }

    #[test]
    fn handles_and_clear() {
        let h = harness(Strategy::Untransitioned);
        h.focus_input();
        assert!(h.input_handle().is_focused());
        assert_eq!(h.announce(), 1);
        assert_eq!(h.log().len(), 2);

        h.clear_log();
        assert!(h.log().is_empty());

        // Ids keep counting after clear
        h.announce();
        assert_eq!(h.log().events()[0].id, 2);
    }

    #[test]
    fn replay_settles_outstanding_work() {
        let mut h = harness(Strategy::Transitioned);
        h.replay(&[Step::Click(Tab::Two), Step::Wait(ms(10)), Step::Click(Tab::Three)])
            .unwrap();

        assert!(!h.is_pending());
        assert_eq!(h.shown_tab(), Tab::Three);
    }

    #[test]
    fn worker_reply_lands_on_a_later_cycle() {
        let mut h = harness(Strategy::Transitioned);
        h.post_to_worker(vec![1, 3, 5]);

        assert_eq!(h.snapshot(), vec!["App: Sending message to worker"]);
        assert_eq!(h.worker().in_flight(), 1);

        h.settle();
        assert_eq!(
            h.snapshot(),
            vec![
                "App: Sending message to worker",
                "App: Message received from worker",
                "Webworker: sum of all array items is 9",
            ]
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // Failures
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn failed_transition_is_traced_and_leaves_tab() {
        let mut h = harness(Strategy::Pending);
        h.fail_next_switch("render crashed");
        h.click(Tab::Two).unwrap();
        h.settle();

        assert_eq!(h.shown_tab(), Tab::One);
        assert!(!h.is_pending());
        assert!(h
            .snapshot()
            .contains(&"Failed to switch to tab two: render crashed".to_string()));

        // One-shot: the next switch goes through
        h.click(Tab::Three).unwrap();
        h.settle();
        assert_eq!(h.shown_tab(), Tab::Three);
    }

    #[test]
    fn failed_timeout_switch_is_traced() {
        let mut h = harness(Strategy::Timeout);
        h.fail_next_switch("gone");
        h.click(Tab::Three).unwrap();
        h.settle();

        assert_eq!(h.shown_tab(), Tab::One);
        assert_eq!(
            h.snapshot()[2..],
            ["Timeout begins: three", "Failed to switch to tab three: gone"]
        );
    }

    #[test]
    fn failed_immediate_switch_is_returned() {
        let mut h = harness(Strategy::Untransitioned);
        h.fail_next_switch("boom");
        let err = h.click(Tab::Two).unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert_eq!(h.shown_tab(), Tab::One);
        assert_eq!(h.now(), Duration::ZERO);
        assert!(!h.snapshot().contains(&"After setTabToShow(two)".to_string()));
    }

    // ═══════════════════════════════════════════════════════════════
    // Large durations
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn huge_wait_keeps_exact_time() {
        let mut h = harness(Strategy::Transitioned);
        h.apply(&Step::Wait(ms(20_000_000_000_000))).unwrap();
        assert_eq!(h.now(), Duration::from_secs(20_000_000_000));
    }

    #[test]
    fn huge_render_cost_stamps_commit_exactly() {
        let config = HarnessConfig {
            expensive_tab_ms: 20_000_000_000_000,
            ..HarnessConfig::default()
        };
        let mut h = DemoHarness::new(Strategy::Transitioned, config);
        h.click(Tab::Two).unwrap();
        h.settle();

        let committed = h
            .log()
            .events()
            .into_iter()
            .find(|e| e.entry.starts_with("Committed"))
            .unwrap();
        assert_eq!(committed.timestamp_ms, 20_000_000_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn realtime_replay_reaches_same_state() {
        let config = HarnessConfig {
            expensive_tab_ms: 100,
            ..HarnessConfig::default()
        };
        let mut h = DemoHarness::new(Strategy::Transitioned, config);
        let started = tokio::time::Instant::now();
        h.replay_realtime(&[Step::Click(Tab::Two), Step::Wait(ms(10)), Step::Click(Tab::Three)])
            .await
            .unwrap();

        assert_eq!(h.shown_tab(), Tab::Three);
        assert!(started.elapsed() >= ms(100));
    }
}
