// libs/scheduling-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentStatus, SchedulingError};

pub struct LifecycleService;

impl LifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed. The stored status is
    /// never touched on failure; callers persist only after this passes.
    pub fn validate_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        debug!(
            "Validating status transition from {} to {}",
            current_status, new_status
        );

        if !self.valid_transitions(current_status).contains(&new_status) {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current_status, new_status
            );
            return Err(SchedulingError::InvalidTransition(current_status));
        }

        Ok(())
    }

    /// All valid next statuses for a given current status. Terminal statuses
    /// (completed, cancelled, no_show) have no outgoing edges.
    pub fn valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::NoShow => vec![],
        }
    }
}

impl Default for LifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use AppointmentStatus::*;

    const ALL: [AppointmentStatus; 6] =
        [Scheduled, Confirmed, InProgress, Completed, Cancelled, NoShow];

    #[test]
    fn defined_edges_are_accepted() {
        let lifecycle = LifecycleService::new();

        for (from, to) in [
            (Scheduled, Confirmed),
            (Scheduled, Cancelled),
            (Scheduled, NoShow),
            (Confirmed, InProgress),
            (Confirmed, Cancelled),
            (Confirmed, NoShow),
            (InProgress, Completed),
            (InProgress, Cancelled),
        ] {
            assert!(
                lifecycle.validate_transition(from, to).is_ok(),
                "{} -> {} should be allowed",
                from,
                to
            );
        }
    }

    #[test]
    fn edges_outside_the_graph_are_rejected() {
        let lifecycle = LifecycleService::new();

        for from in ALL {
            let allowed = lifecycle.valid_transitions(from);
            for to in ALL {
                if !allowed.contains(&to) {
                    assert_matches!(
                        lifecycle.validate_transition(from, to),
                        Err(SchedulingError::InvalidTransition(status)) if status == from,
                        "{} -> {} should be rejected",
                        from,
                        to
                    );
                }
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        let lifecycle = LifecycleService::new();

        for status in [Completed, Cancelled, NoShow] {
            assert!(status.is_terminal());
            assert!(lifecycle.valid_transitions(status).is_empty());
        }
    }
}
