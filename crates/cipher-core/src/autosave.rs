//! Autosave coordinator: a trailing-debounce commit state machine.
//!
//! States:
//!
//! - **Idle**: nothing scheduled.
//! - **PendingCommit(deadline)**: an edit arrived while autosave was on; a
//!   commit fires once `deadline` passes with no further edits. Every edit
//!   pushes the deadline to `now + debounce`.
//! - **Committing**: a commit was handed out as a [`CommitTicket`] and has not
//!   been finished yet. No second commit starts until it is.
//!
//! The coordinator never reads a clock. Callers pass `now`, and a timer
//! driver sleeps until [`AutosaveCoordinator::deadline`] before calling
//! [`AutosaveCoordinator::begin_scheduled`].

use chrono::{DateTime, TimeDelta, Utc};

/// Default trailing debounce window (milliseconds).
pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    PendingCommit { deadline: DateTime<Utc> },
    Committing,
}

/// What caused a commit to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitTrigger {
    /// Debounce deadline elapsed.
    Scheduled,
    /// Explicit save request.
    Manual,
    /// Final flush when the session is left.
    Flush,
}

/// Permission to run exactly one commit. Consumed by
/// [`AutosaveCoordinator::finish`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a started commit must be finished"]
pub struct CommitTicket {
    /// Last edit sequence number included in the snapshot being written.
    pub edit_seq: u64,
    pub trigger: CommitTrigger,
}

/// Result of recording an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// A commit is scheduled for `deadline`.
    Armed { deadline: DateTime<Utc> },
    /// Autosave is off; the edit stays in memory until a manual save.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveCoordinator {
    state: AutosaveState,
    enabled: bool,
    debounce: TimeDelta,
    /// Sequence number of the latest applied edit.
    edit_seq: u64,
    /// Highest edit sequence number known to be persisted.
    committed_seq: u64,
    /// Deadline requested by edits that landed while committing.
    rearm: Option<DateTime<Utc>>,
}

impl AutosaveCoordinator {
    pub fn new(debounce: TimeDelta, enabled: bool) -> Self {
        Self {
            state: AutosaveState::Idle,
            enabled,
            debounce,
            edit_seq: 0,
            committed_seq: 0,
            rearm: None,
        }
    }

    pub fn with_debounce_ms(debounce_ms: u64, enabled: bool) -> Self {
        let debounce = i64::try_from(debounce_ms)
            .ok()
            .and_then(TimeDelta::try_milliseconds)
            .unwrap_or(TimeDelta::MAX);
        Self::new(debounce, enabled)
    }

    pub fn state(&self) -> AutosaveState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn debounce(&self) -> TimeDelta {
        self.debounce
    }

    /// True while a commit is in flight (the "Saving..." indicator).
    pub fn is_saving(&self) -> bool {
        self.state == AutosaveState::Committing
    }

    /// True when some applied edit has not been persisted yet.
    pub fn is_dirty(&self) -> bool {
        self.edit_seq > self.committed_seq
    }

    /// Deadline of the scheduled commit, if one is pending.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self.state {
            AutosaveState::PendingCommit { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Record an edit applied to the in-memory record at `now`.
    pub fn record_edit(&mut self, now: DateTime<Utc>) -> EditOutcome {
        self.edit_seq = self.edit_seq.saturating_add(1);
        if !self.enabled {
            return EditOutcome::Deferred;
        }

        // Out-of-range deadlines saturate: the commit is simply never due.
        let deadline = now
            .checked_add_signed(self.debounce)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        match self.state {
            AutosaveState::Idle | AutosaveState::PendingCommit { .. } => {
                self.state = AutosaveState::PendingCommit { deadline };
            }
            // Picked up again once the in-flight commit finishes.
            AutosaveState::Committing => self.rearm = Some(deadline),
        }
        EditOutcome::Armed { deadline }
    }

    /// Start the scheduled commit if its deadline has passed.
    pub fn begin_scheduled(&mut self, now: DateTime<Utc>) -> Option<CommitTicket> {
        match self.state {
            AutosaveState::PendingCommit { deadline } if now >= deadline => {
                Some(self.start(CommitTrigger::Scheduled))
            }
            _ => None,
        }
    }

    /// Start a commit right away, cancelling any scheduled one.
    ///
    /// Returns `None` while another commit is in flight.
    pub fn begin_manual(&mut self) -> Option<CommitTicket> {
        if self.state == AutosaveState::Committing {
            return None;
        }
        Some(self.start(CommitTrigger::Manual))
    }

    /// Start the final commit when leaving a session: only when autosave is
    /// on, something is unsaved and no commit is already running.
    pub fn begin_flush(&mut self) -> Option<CommitTicket> {
        if !self.enabled || !self.is_dirty() || self.state == AutosaveState::Committing {
            return None;
        }
        Some(self.start(CommitTrigger::Flush))
    }

    fn start(&mut self, trigger: CommitTrigger) -> CommitTicket {
        self.state = AutosaveState::Committing;
        CommitTicket {
            edit_seq: self.edit_seq,
            trigger,
        }
    }

    /// Complete a commit. A failed commit leaves its edits dirty and is not
    /// retried.
    pub fn finish(&mut self, ticket: CommitTicket, succeeded: bool) {
        if succeeded {
            self.committed_seq = self.committed_seq.max(ticket.edit_seq);
        }
        self.state = match self.rearm.take() {
            Some(deadline) if self.enabled => AutosaveState::PendingCommit { deadline },
            _ => AutosaveState::Idle,
        };
    }

    /// Turn autosave on or off.
    ///
    /// Turning it off drops the scheduled commit but keeps the edits.
    /// Turning it on schedules nothing; the next edit arms the debounce.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel();
        }
    }

    /// Drop a scheduled commit. An in-flight commit is left to finish.
    pub fn cancel(&mut self) {
        self.rearm = None;
        if matches!(self.state, AutosaveState::PendingCommit { .. }) {
            self.state = AutosaveState::Idle;
        }
    }
}

impl Default for AutosaveCoordinator {
    fn default() -> Self {
        Self::with_debounce_ms(DEFAULT_DEBOUNCE_MS, true)
    }
}
