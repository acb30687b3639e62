/// Single-slot transaction around provisional edits.
///
/// `begin` captures the pre-edit state only when no transaction is open, so repeated provisional
/// updates inside one gesture keep the original snapshot. `end` closes the slot and hands the
/// snapshot back to the caller, which either restores it (discard) or records it as the "before"
/// side of one history entry (commit).
#[derive(Clone, Debug, PartialEq)]
pub enum PreviewTransaction<T> {
    Idle,
    Pending {
        snapshot: T,
    },
}

impl<T> Default for PreviewTransaction<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T: Clone> PreviewTransaction<T> {
    pub fn new() -> Self {
        Self::Idle
    }

    /// Open the transaction if idle. Returns `true` when this call opened it.
    pub fn begin(&mut self, state: &T) -> bool {
        match self {
            Self::Idle => {
                *self = Self::Pending {
                    snapshot: state.clone(),
                };
                true
            }
            Self::Pending { .. } => false,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn snapshot(&self) -> Option<&T> {
        match self {
            Self::Idle => None,
            Self::Pending { snapshot } => Some(snapshot),
        }
    }

    pub fn end(&mut self) -> Option<T> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Pending { snapshot } => Some(snapshot),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/preview.rs"]
mod tests;
