//! Two-phase arm/commit guard for hierarchy deletion.

use crate::library::types::FolderId;

/// Pending hierarchy deletion.
///
/// The click that asks for a delete and the click that confirms it happen
/// on different frames, so the target is held here in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteConfirmation {
    #[default]
    Idle,
    Armed { target: FolderId },
}

impl DeleteConfirmation {
    /// Arm for `target`, replacing any earlier pending target.
    pub fn arm(&mut self, target: FolderId) {
        *self = DeleteConfirmation::Armed { target };
    }

    pub fn cancel(&mut self) {
        *self = DeleteConfirmation::Idle;
    }

    /// Leave the armed state, yielding the target to delete.
    pub fn take(&mut self) -> Option<FolderId> {
        match std::mem::take(self) {
            DeleteConfirmation::Armed { target } => Some(target),
            DeleteConfirmation::Idle => None,
        }
    }

    pub fn target(&self) -> Option<FolderId> {
        match self {
            DeleteConfirmation::Armed { target } => Some(*target),
            DeleteConfirmation::Idle => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, DeleteConfirmation::Armed { .. })
    }
}
