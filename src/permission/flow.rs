use crate::library::{Acquisition, CatalogCache};
use crate::store::{PermissionPrefs, Record, StateStore, StoreError};

use super::gate::{GatePolicy, GateState, PermissionStatus};

/// The next thing the UI has to do for the permission flow.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlowStep {
    /// Access is granted: obtain the catalog off the UI loop.
    Acquire(Acquisition),
    /// Show the in-app explanation; answer with `rationale_answered`.
    ShowRationale,
    /// Issue the native prompt; answer with `prompt_answered`.
    LaunchPrompt,
    /// Offer the settings screen; answer with `settings_dialog_answered`.
    ShowSettingsDialog,
    /// Open the settings screen; call `settings_returned` when it closes.
    LaunchSettings,
    /// The user refused; close the application.
    Terminate,
    /// Nothing to do right now (an acquisition is already running).
    Idle,
}

/// Drives the permission gate across prompts, dialogs and restarts.
///
/// Every (re)entry goes through `evaluate`, which reads the persisted ask
/// count, decides the gate state and returns the step the UI must take.
/// The ask count is bumped exactly when a native prompt is issued and reset
/// when access is granted.
pub struct PermissionFlow {
    policy: GatePolicy,
    prefs: Record<PermissionPrefs>,
    cache: CatalogCache,
    state: GateState,
    acquiring: bool,
    /// A rescan asked for while an acquisition owned the catalog record.
    rescan_pending: bool,
}

impl PermissionFlow {
    pub fn new(policy: GatePolicy, store: &StateStore) -> Self {
        Self {
            policy,
            prefs: store.permission().clone(),
            cache: CatalogCache::new(store),
            state: GateState::Unknown,
            acquiring: false,
            rescan_pending: false,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn ask_count(&self) -> Result<u32, StoreError> {
        Ok(self.prefs.load()?.ask_count)
    }

    pub fn is_acquiring(&self) -> bool {
        self.acquiring
    }

    pub fn rescan_pending(&self) -> bool {
        self.rescan_pending
    }

    /// Run the gate for the current host status.
    pub fn evaluate(&mut self, status: PermissionStatus) -> Result<FlowStep, StoreError> {
        let ask_count = self.prefs.load()?.ask_count;
        let next = self.policy.evaluate(status, ask_count);
        self.enter(next, ask_count);

        match next {
            GateState::Granted => {
                if ask_count != 0 {
                    self.prefs.update(|p| p.ask_count = 0)?;
                }
                if self.acquiring {
                    return Ok(FlowStep::Idle);
                }
                let kind = if self.cache.has_scanned()? {
                    Acquisition::CachedRead
                } else {
                    Acquisition::FullScan
                };
                self.acquiring = true;
                Ok(FlowStep::Acquire(kind))
            }
            GateState::DeniedNeedsRationale => Ok(FlowStep::ShowRationale),
            GateState::DeniedAskable => {
                self.record_prompt()?;
                Ok(FlowStep::LaunchPrompt)
            }
            GateState::DeniedExceeded => Ok(FlowStep::ShowSettingsDialog),
            // The policy never answers `Unknown`.
            GateState::Unknown => Ok(FlowStep::Idle),
        }
    }

    /// The user answered the rationale dialog.
    pub fn rationale_answered(&mut self, accepted: bool) -> Result<FlowStep, StoreError> {
        if !accepted {
            tracing::info!("rationale declined, closing");
            return Ok(FlowStep::Terminate);
        }
        self.record_prompt()?;
        Ok(FlowStep::LaunchPrompt)
    }

    /// The native prompt came back; `status` is what the host reports now.
    pub fn prompt_answered(&mut self, status: PermissionStatus) -> Result<FlowStep, StoreError> {
        tracing::debug!(?status, "native prompt answered");
        self.evaluate(status)
    }

    /// The user answered the settings escalation dialog.
    pub fn settings_dialog_answered(&mut self, accepted: bool) -> FlowStep {
        if accepted {
            FlowStep::LaunchSettings
        } else {
            tracing::info!("settings escalation declined, closing");
            FlowStep::Terminate
        }
    }

    /// Back from the settings screen, whatever happened there.
    pub fn settings_returned(&mut self, status: PermissionStatus) -> Result<FlowStep, StoreError> {
        self.evaluate(status)
    }

    /// The acquisition handed out by the last `Acquire` step has finished
    /// (or was abandoned). Starts a rescan that was waiting on it.
    pub fn acquisition_finished(&mut self, status: PermissionStatus) -> Result<FlowStep, StoreError> {
        self.acquiring = false;
        if std::mem::take(&mut self.rescan_pending) {
            return self.rescan(status);
        }
        Ok(FlowStep::Idle)
    }

    /// Explicit user rescan: forget the scan flag and run the whole flow again.
    ///
    /// The running acquisition writes the catalog record until it lands, so a
    /// rescan asked for meanwhile waits for `acquisition_finished`.
    pub fn request_rescan(&mut self, status: PermissionStatus) -> Result<FlowStep, StoreError> {
        if self.acquiring {
            tracing::info!("rescan deferred until the running acquisition lands");
            self.rescan_pending = true;
            return Ok(FlowStep::Idle);
        }
        self.rescan(status)
    }

    fn rescan(&mut self, status: PermissionStatus) -> Result<FlowStep, StoreError> {
        self.cache.clear_scanned()?;
        self.evaluate(status)
    }

    fn record_prompt(&mut self) -> Result<(), StoreError> {
        let count = self.prefs.update(|p| {
            p.ask_count = p.ask_count.saturating_add(1);
            p.ask_count
        })?;
        tracing::info!(ask_count = count, max_asks = self.policy.max_asks, "native prompt issued");
        Ok(())
    }

    fn enter(&mut self, next: GateState, ask_count: u32) {
        if next != self.state {
            tracing::info!(from = ?self.state, to = ?next, ask_count, "permission gate transition");
        }
        self.state = next;
    }
}
