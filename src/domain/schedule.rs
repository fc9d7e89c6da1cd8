//! Rebalance scheduling: a two-state machine (Waiting/Due) driven by the
//! daily clock.
//!
//! State moves by value: `observe` consumes the scheduler and returns the
//! updated one, `submitted` returns it to Waiting after the order goes out.
//! The anchored rule records the calendar month of its first trigger and
//! fires only in that month from then on.

use chrono::{Datelike, NaiveDate};

/// One trading day as seen by the scheduler. `trading_day_of_month` is
/// zero-based from the month's first trading day; `trading_days_left` is
/// zero on the month's last trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDay {
    pub date: NaiveDate,
    pub trading_day_of_month: usize,
    pub trading_days_left: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebalanceRule {
    /// Fire `days_offset` trading days after the month starts; optionally
    /// only in one calendar month (1-12).
    MonthStart {
        days_offset: usize,
        month: Option<u32>,
    },
    /// Fire `days_offset` trading days before the month ends.
    MonthEnd { days_offset: usize },
    /// Fire every trading day; optionally only in one calendar month.
    EveryDay { month: Option<u32> },
    /// Fire on the first trading day of the month matching the anchor; the
    /// anchor is the month of the first day ever observed as a month start.
    AnchoredMonthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Waiting,
    Due,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduler {
    rule: RebalanceRule,
    anchor: Option<u32>,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(rule: RebalanceRule) -> Self {
        Scheduler {
            rule,
            anchor: None,
            state: SchedulerState::Waiting,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn anchor(&self) -> Option<u32> {
        self.anchor
    }

    /// Feed one trading day through the machine.
    #[must_use]
    pub fn observe(self, day: &ClockDay) -> Scheduler {
        let month = day.date.month();
        let (triggered, anchor) = match &self.rule {
            RebalanceRule::MonthStart {
                days_offset,
                month: only,
            } => {
                let on_day = day.trading_day_of_month == *days_offset;
                let in_month = only.is_none_or(|m| m == month);
                (on_day && in_month, self.anchor)
            }
            RebalanceRule::MonthEnd { days_offset } => {
                (day.trading_days_left == *days_offset, self.anchor)
            }
            RebalanceRule::EveryDay { month: only } => {
                (only.is_none_or(|m| m == month), self.anchor)
            }
            RebalanceRule::AnchoredMonthly => {
                if day.trading_day_of_month != 0 {
                    (false, self.anchor)
                } else {
                    match self.anchor {
                        None => (true, Some(month)),
                        Some(a) => (a == month, self.anchor),
                    }
                }
            }
        };

        Scheduler {
            rule: self.rule,
            anchor,
            state: if triggered {
                SchedulerState::Due
            } else {
                SchedulerState::Waiting
            },
        }
    }

    /// Acknowledge submission: Due goes back to Waiting.
    #[must_use]
    pub fn submitted(self) -> Scheduler {
        Scheduler {
            state: SchedulerState::Waiting,
            ..self
        }
    }
}
