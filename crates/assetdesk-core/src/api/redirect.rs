use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Performs the actual move to the login screen.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// For callers that only look at the returned errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {}
}

/// Fires the navigator at most once per session, no matter how many
/// concurrent calls find the session dead.
pub struct LoginRedirect {
    navigator: Arc<dyn Navigator>,
    fired: AtomicBool,
}

impl LoginRedirect {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            fired: AtomicBool::new(false),
        }
    }

    /// Returns true if this call performed the navigation.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("Session ended, redirecting to login");
            self.navigator.redirect_to_login();
            true
        } else {
            false
        }
    }

    /// Called after a fresh login.
    pub fn rearm(&self) {
        self.fired.store(false, Ordering::Release);
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
