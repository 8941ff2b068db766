//! The single-item review queue: officers triage pending submissions one at
//! a time with a swipe gesture or the keyboard. This is a plain state
//! machine over a local snapshot; nothing here touches the store. Durability
//! comes from handing the accumulated snapshot to
//! `ReconciliationService::review_submissions` on an explicit save.

use std::time::Duration;

use uuid::Uuid;

use crate::domain::{Submission, SubmissionStatus};

/// Horizontal distance (logical units) a drag must cover before release
/// commits an outcome. Symmetric: positive approves, negative rejects.
pub const COMMIT_THRESHOLD: f64 = 100.0;

/// Fixed length of the settle animation after an outcome locks in. The
/// commit is not applied until this elapses, and cannot be cancelled.
pub const SETTLE_DURATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueueState {
    /// No gesture in progress; the oldest pending submission is presented.
    Idle,
    /// A pointer drag is in progress, tracking its horizontal offset.
    Dragging { offset: f64 },
    /// An outcome is locked in and the settle animation is running. Only
    /// the passage of time moves the machine out of this state.
    Committing { outcome: Outcome, remaining: Duration },
    /// A reject is provisional until the officer confirms or cancels.
    ConfirmingReject,
    /// Nothing left to review. Leaves via `refresh` or undo.
    AllClear,
}

/// Discrete inputs. Keyboard and gesture variants are deliberately routed
/// through the same transitions so the machine cannot diverge by modality.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    DragStart,
    DragMove { dx: f64 },
    DragEnd,
    /// ArrowRight
    KeyApprove,
    /// ArrowLeft
    KeyReject,
    /// Escape
    KeyCancel,
    /// The undo keybinding
    KeyUndo,
    /// Modal confirmation, with an optional rejection reason.
    ConfirmReject { reason: Option<String> },
    CancelReject,
    /// Animation clock.
    Tick(Duration),
}

pub struct ReviewQueue {
    submissions: Vec<Submission>,
    state: QueueState,
    /// The one decision that can still be taken back this session.
    last_decided: Option<Uuid>,
    pending_reason: Option<String>,
}

impl ReviewQueue {
    pub fn new(submissions: Vec<Submission>) -> Self {
        let mut queue = Self {
            submissions,
            state: QueueState::Idle,
            last_decided: None,
            pending_reason: None,
        };
        queue.state = queue.rest_state();
        queue
    }

    pub fn state(&self) -> &QueueState {
        &self.state
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Hand the locally edited snapshot off, e.g. to the save action.
    pub fn into_submissions(self) -> Vec<Submission> {
        self.submissions
    }

    /// The submission currently up for review: oldest pending first.
    pub fn current(&self) -> Option<&Submission> {
        self.submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .min_by_key(|s| s.created_at)
    }

    pub fn pending_count(&self) -> usize {
        self.submissions
            .iter()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .count()
    }

    /// Replace the snapshot after a re-fetch. Outside of an in-flight
    /// commit this also leaves `AllClear` if new pending items arrived.
    pub fn refresh(&mut self, submissions: Vec<Submission>) {
        self.submissions = submissions;
        self.last_decided = None;
        if !matches!(self.state, QueueState::Committing { .. }) {
            self.state = self.rest_state();
        }
    }

    pub fn handle(&mut self, input: Input) {
        match (&self.state, input) {
            // An in-flight commit always finishes; only time moves it.
            (QueueState::Committing { outcome, remaining }, Input::Tick(elapsed)) => {
                let outcome = *outcome;
                let remaining = remaining.saturating_sub(elapsed);
                if remaining.is_zero() {
                    self.settle(outcome);
                } else {
                    self.state = QueueState::Committing { outcome, remaining };
                }
            }
            (QueueState::Committing { .. }, _) => {}

            (QueueState::Idle, Input::DragStart) => {
                if self.current().is_some() {
                    self.state = QueueState::Dragging { offset: 0.0 };
                }
            }
            (QueueState::Idle, Input::KeyApprove) => {
                if self.current().is_some() {
                    self.begin_commit(Outcome::Approve);
                }
            }
            (QueueState::Idle, Input::KeyReject) => {
                if self.current().is_some() {
                    self.state = QueueState::ConfirmingReject;
                }
            }
            (QueueState::Idle, Input::KeyUndo) | (QueueState::AllClear, Input::KeyUndo) => {
                self.undo();
            }

            (QueueState::Dragging { offset }, Input::DragMove { dx }) => {
                let offset = *offset + dx;
                self.state = QueueState::Dragging { offset };
            }
            (QueueState::Dragging { offset }, Input::DragEnd) => {
                let offset = *offset;
                if offset >= COMMIT_THRESHOLD {
                    self.begin_commit(Outcome::Approve);
                } else if offset <= -COMMIT_THRESHOLD {
                    self.state = QueueState::ConfirmingReject;
                } else {
                    // Under the threshold: snap back, nothing happened.
                    self.state = QueueState::Idle;
                }
            }

            (QueueState::ConfirmingReject, Input::ConfirmReject { reason }) => {
                self.pending_reason = reason.filter(|r| !r.is_empty());
                self.begin_commit(Outcome::Reject);
            }
            (QueueState::ConfirmingReject, Input::CancelReject)
            | (QueueState::ConfirmingReject, Input::KeyCancel) => {
                self.state = QueueState::Idle;
            }

            _ => {}
        }
    }

    fn rest_state(&self) -> QueueState {
        if self.current().is_some() {
            QueueState::Idle
        } else {
            QueueState::AllClear
        }
    }

    fn begin_commit(&mut self, outcome: Outcome) {
        self.state = QueueState::Committing {
            outcome,
            remaining: SETTLE_DURATION,
        };
    }

    fn settle(&mut self, outcome: Outcome) {
        let reason = self.pending_reason.take();
        let current_id = self.current().map(|s| s.id);

        if let Some(id) = current_id {
            if let Some(submission) = self.submissions.iter_mut().find(|s| s.id == id) {
                submission.status = match outcome {
                    Outcome::Approve => SubmissionStatus::Approved,
                    Outcome::Reject => SubmissionStatus::Rejected,
                };
                if outcome == Outcome::Reject {
                    if let Some(reason) = reason {
                        submission.officer_notes = Some(reason);
                    }
                }
            }
            self.last_decided = Some(id);
        }

        self.state = self.rest_state();
    }

    /// Revert the single most-recently-decided submission to pending. A
    /// local optimistic revert: only the status field is touched.
    fn undo(&mut self) {
        if let Some(id) = self.last_decided.take() {
            if let Some(submission) = self.submissions.iter_mut().find(|s| s.id == id) {
                submission.status = SubmissionStatus::Pending;
            }
            self.state = self.rest_state();
        }
    }
}
