//! The weekly tick, split so condition evaluation can run unlocked.
//!
//! [`GameEngine::begin_week`] and [`GameEngine::finish_week`] mutate the
//! engine. [`PendingChecks::evaluate`] only reads its own snapshot, so a
//! session can release its lock while user-authored conditions run.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::GameEngine;
use crate::error::EngineError;
use game_rules::{Condition, ConditionContext, ConditionEvaluator, DeathInfo, DAYS_PER_WEEK};

/// Everything that happened during one week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekReport {
    pub days_advanced: u32,
    /// Indices of seasons that ended this week.
    pub seasons_ended: Vec<u32>,
    pub death: Option<DeathInfo>,
    pub swept_events: Vec<String>,
    pub fired_node: Option<String>,
    /// The fired ending node, once the story is over.
    pub ending: Option<String>,
    /// Conditions that could not be evaluated, as `"<id>: <error>"`.
    pub condition_errors: Vec<String>,
    pub hook_errors: Vec<String>,
}

/// Conditions to evaluate between the two locked phases.
#[derive(Debug, Clone)]
pub struct PendingChecks {
    /// Life the snapshot was taken in.
    life: u32,
    ctx: Arc<ConditionContext>,
    plot: Vec<(String, Arc<Condition>)>,
    events: Vec<(String, Arc<Condition>)>,
    evaluator: ConditionEvaluator,
}

/// Results of [`PendingChecks::evaluate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckVerdicts {
    /// Life the verdicts were reached in. Verdicts from an earlier life
    /// are dropped.
    pub life: u32,
    /// First plot candidate, by ID, whose condition held.
    pub plot_ready: Option<String>,
    pub events_done: Vec<String>,
    pub errors: Vec<String>,
}

impl PendingChecks {
    fn none(life: u32, evaluator: ConditionEvaluator) -> Self {
        Self {
            life,
            ctx: Arc::new(ConditionContext::default()),
            plot: Vec::new(),
            events: Vec::new(),
            evaluator,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plot.is_empty() && self.events.is_empty()
    }

    /// Runs every pending condition against the snapshot.
    ///
    /// Plot candidates are tried in ID order and evaluation stops at the
    /// first that holds. A failed evaluation counts as "not ready" and is
    /// reported, never fatal.
    pub fn evaluate(&self) -> CheckVerdicts {
        let mut verdicts = CheckVerdicts {
            life: self.life,
            ..CheckVerdicts::default()
        };

        for (id, condition) in &self.plot {
            match self.evaluator.evaluate(condition, &self.ctx) {
                Ok(true) => {
                    verdicts.plot_ready = Some(id.clone());
                    break;
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(node_id = %id, error = %error, "plot condition not ready");
                    verdicts.errors.push(format!("{}: {}", id, error));
                }
            }
        }

        for (id, condition) in &self.events {
            match self.evaluator.evaluate(condition, &self.ctx) {
                Ok(true) => verdicts.events_done.push(id.clone()),
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(event_id = %id, error = %error, "end condition not ready");
                    verdicts.errors.push(format!("{}: {}", id, error));
                }
            }
        }

        verdicts
    }
}

impl GameEngine {
    /// First phase: advance to the next week boundary and prepare checks.
    ///
    /// Days advance one at a time, each followed by event hooks and a death
    /// check; a death ends the week early with nothing left to evaluate.
    /// At the boundary, finished events are swept and season hooks run.
    pub fn begin_week(&mut self) -> Result<(WeekReport, PendingChecks), EngineError> {
        if !self.board.is_alive() {
            return Err(EngineError::PlayerDead);
        }
        let mut report = WeekReport::default();

        let mut week_ended = false;
        while !week_ended && report.days_advanced < DAYS_PER_WEEK {
            let day = self.advance_day();
            report.days_advanced += 1;
            report.hook_errors.extend(day.hook_errors);
            if let Some(ended) = day.boundary.ended_season {
                report.seasons_ended.push(ended);
            }
            if day.death.is_some() {
                report.death = day.death;
                let checks = PendingChecks::none(self.board.life(), self.evaluator);
                return Ok((report, checks));
            }
            week_ended = day.boundary.week_end;
        }

        report.swept_events = self.sweep_finished_events();

        let mut season_hooks = Vec::new();
        if let Some(season) = self.board.current_season_def() {
            season_hooks.push((season.id.clone(), season.on_week_end_calls.clone()));
        }
        for ended in &report.seasons_ended {
            if let Some(season) = self.board.season_def(*ended) {
                season_hooks.push((season.id.clone(), season.on_season_end_calls.clone()));
            }
        }
        for (owner, calls) in season_hooks {
            if calls.is_empty() {
                continue;
            }
            if let Err(message) = self.run_hook(&owner, &calls) {
                report.hook_errors.push(message);
            }
        }

        if let Some(death) = self.check_death() {
            report.death = Some(death);
            return Ok((report, PendingChecks::none(self.board.life(), self.evaluator)));
        }

        let checks = PendingChecks {
            life: self.board.life(),
            ctx: Arc::new(self.board.condition_context()),
            plot: self.dag.activation_candidates(),
            events: self.condition_event_checks(),
            evaluator: self.evaluator,
        };
        Ok((report, checks))
    }

    /// Last phase: apply the verdicts.
    ///
    /// State may have changed since the snapshot, so the chosen plot node
    /// fires only if it is still a candidate, and only events that still
    /// exist are removed. Nothing is applied if the player was resurrected
    /// in between.
    pub fn finish_week(
        &mut self,
        mut report: WeekReport,
        verdicts: CheckVerdicts,
    ) -> Result<WeekReport, EngineError> {
        report.condition_errors.extend(verdicts.errors);
        if !self.board.is_alive() {
            return Ok(report);
        }
        if verdicts.life != self.board.life() {
            tracing::debug!(
                checked_life = verdicts.life,
                life = self.board.life(),
                "dropping verdicts from an earlier life"
            );
            return Ok(report);
        }

        for id in verdicts.events_done {
            if self.board.remove_event(&id).is_some() {
                tracing::debug!(event_id = %id, "condition event finished");
                report.swept_events.push(id);
            }
        }

        if let Some(id) = verdicts.plot_ready {
            if self.dag.is_candidate(&id) {
                let node = self.fire_plot_node(&id)?;
                report.fired_node = Some(node.id);
            } else {
                tracing::debug!(node_id = %id, "plot node no longer a candidate");
            }
        }

        if report.death.is_none() {
            report.death = self.check_death();
        }
        report.ending = self.dag.check_ending().map(|n| n.id.clone());
        Ok(report)
    }

    /// Runs a whole week in one go.
    pub fn advance_week(&mut self) -> Result<WeekReport, EngineError> {
        let (report, checks) = self.begin_week()?;
        let verdicts = checks.evaluate();
        self.finish_week(report, verdicts)
    }
}
