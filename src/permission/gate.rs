/// Library access as reported by the host right now.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    /// Nothing evaluated yet in this process.
    #[default]
    Unknown,
    Granted,
    /// Ask again directly with the native prompt.
    DeniedAskable,
    /// Explain why access is needed before asking again.
    DeniedNeedsRationale,
    /// Out of native prompts; only the settings screen can grant access.
    DeniedExceeded,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    pub max_asks: u32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self { max_asks: 2 }
    }
}

impl GatePolicy {
    pub fn new(max_asks: u32) -> Self {
        Self { max_asks }
    }

    /// Where the gate stands for `status` after `ask_count` native prompts.
    pub fn evaluate(&self, status: PermissionStatus, ask_count: u32) -> GateState {
        match status {
            PermissionStatus::Granted => GateState::Granted,
            PermissionStatus::Denied if ask_count >= self.max_asks => GateState::DeniedExceeded,
            PermissionStatus::Denied if ask_count == 1 => GateState::DeniedNeedsRationale,
            PermissionStatus::Denied => GateState::DeniedAskable,
        }
    }
}
