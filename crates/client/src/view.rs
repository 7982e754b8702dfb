//! View-side reconciliation state.
//!
//! Pure state with no tasks or IO: [`crate::sync::SyncHandle`] drives it on
//! intervals, and tests drive it directly. The cached numbers are never
//! authoritative; they only bridge the gap between polls.

use crate::source::ObservedTimer;
use std::collections::HashMap;

/// Whether the owning view is on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// What a renderer must repaint after a tick or reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewUpdate {
    /// Only the countdown number moved.
    Countdown { patient_id: String },
    /// Status or period changed: badges and thresholds need redrawing,
    /// not just the number.
    Redraw { patient_id: String },
    /// The patient disappeared from the server's answer.
    Removed { patient_id: String },
}

/// Cached timer states for one mounted view.
#[derive(Debug, Default)]
pub struct ViewTimers {
    timers: HashMap<String, ObservedTimer>,
    visibility: Visibility,
    reconcile_requested: bool,
}

impl ViewTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn timer(&self, patient_id: &str) -> Option<&ObservedTimer> {
        self.timers.get(patient_id)
    }

    pub fn timers(&self) -> impl Iterator<Item = &ObservedTimer> {
        self.timers.values()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// One second of local countdown.
    ///
    /// Decrements every in-progress entry down to a floor of zero. Purely
    /// visual; the next reconciliation overwrites whatever this produced.
    /// Hidden views skip the whole pass, so a backgrounded tab never
    /// fast-forwards on resume.
    pub fn tick(&mut self) -> Vec<ViewUpdate> {
        if self.visibility == Visibility::Hidden {
            return Vec::new();
        }

        let mut updates = Vec::new();
        for timer in self.timers.values_mut() {
            if timer.in_progress() && timer.remaining_seconds > 0 {
                timer.remaining_seconds -= 1;
                updates.push(ViewUpdate::Countdown {
                    patient_id: timer.patient_id.clone(),
                });
            }
        }
        updates
    }

    /// Overwrites the cache with a fresh server answer.
    ///
    /// Emits `Redraw` where status or period changed (or the patient is
    /// new), `Countdown` where only the numbers moved, and `Removed` for
    /// cached patients the server no longer reports. The server's values
    /// always win, correcting any local tick drift.
    pub fn apply_sync(&mut self, fresh: Vec<ObservedTimer>) -> Vec<ViewUpdate> {
        let mut updates = Vec::new();
        let mut next = HashMap::with_capacity(fresh.len());

        for observed in fresh {
            match self.timers.get(&observed.patient_id) {
                None => updates.push(ViewUpdate::Redraw {
                    patient_id: observed.patient_id.clone(),
                }),
                Some(cached)
                    if cached.status != observed.status || cached.period != observed.period =>
                {
                    updates.push(ViewUpdate::Redraw {
                        patient_id: observed.patient_id.clone(),
                    })
                }
                Some(cached) if *cached != observed => updates.push(ViewUpdate::Countdown {
                    patient_id: observed.patient_id.clone(),
                }),
                Some(_) => {}
            }
            next.insert(observed.patient_id.clone(), observed);
        }

        for patient_id in self.timers.keys() {
            if !next.contains_key(patient_id) {
                updates.push(ViewUpdate::Removed {
                    patient_id: patient_id.clone(),
                });
            }
        }

        self.timers = next;
        updates
    }

    /// Changes visibility. Hiding suspends ticking; becoming visible again
    /// requests an immediate reconciliation.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        if self.visibility == Visibility::Hidden && visibility == Visibility::Visible {
            self.reconcile_requested = true;
        }
        self.visibility = visibility;
    }

    /// Takes the pending reconciliation request, if any.
    pub fn take_reconcile_request(&mut self) -> bool {
        std::mem::take(&mut self.reconcile_requested)
    }
}
