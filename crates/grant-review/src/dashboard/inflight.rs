use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use crate::review::domain::ApplicationId;

/// A mutation the user can trigger; its control stays disabled while the call is pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReviewAction {
    Approve(ApplicationId),
    Reject(ApplicationId),
    RecordPayment(ApplicationId),
    BulkReject,
    RejectSubmissions,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewAction::Approve(id) => write!(f, "approve {id}"),
            ReviewAction::Reject(id) => write!(f, "reject {id}"),
            ReviewAction::RecordPayment(id) => write!(f, "record payment for {id}"),
            ReviewAction::BulkReject => f.write_str("bulk reject"),
            ReviewAction::RejectSubmissions => f.write_str("reject submissions"),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    actions: Mutex<HashSet<ReviewAction>>,
}

impl InFlight {
    /// Register `action`, or hand it back if the same action is already pending.
    pub(crate) fn acquire(&self, action: ReviewAction) -> Result<InFlightGuard<'_>, ReviewAction> {
        let mut actions = self.actions.lock().expect("in-flight mutex poisoned");
        if !actions.insert(action.clone()) {
            return Err(action);
        }
        Ok(InFlightGuard {
            registry: self,
            action,
        })
    }

    pub(crate) fn contains(&self, action: &ReviewAction) -> bool {
        self.actions
            .lock()
            .expect("in-flight mutex poisoned")
            .contains(action)
    }
}

/// Releases the action when the call settles, including on early return.
pub(crate) struct InFlightGuard<'a> {
    registry: &'a InFlight,
    action: ReviewAction,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut actions) = self.registry.actions.lock() {
            actions.remove(&self.action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_release() {
        let registry = InFlight::default();
        let action = ReviewAction::Approve(ApplicationId("app-01".to_string()));

        let guard = registry.acquire(action.clone()).expect("first acquire");
        assert!(registry.contains(&action));
        assert_eq!(registry.acquire(action.clone()).err(), Some(action.clone()));
        assert!(registry
            .acquire(ReviewAction::Reject(ApplicationId("app-01".to_string())))
            .is_ok());

        drop(guard);
        assert!(!registry.contains(&action));
        assert!(registry.acquire(action).is_ok());
    }
}
