//! Warning classification and dispatch
//!
//! Every recoverable anomaly carries a fixed [`Warning`] kind. A
//! [`WarningHandler`] decides what happens to it: nothing when the kind is
//! ignored, an [`Error::Warning`] when warnings are raised as errors, or a
//! printed message while the print budget lasts.
//!
//! Constructors take a handler explicitly. [`WarningHandler::global`] returns
//! the process-wide default, created on first use; the free functions at the
//! bottom of this module configure it. Configuring the global handler from
//! several threads while others emit warnings gives interleaved, unspecified
//! results: callers serialize configuration changes themselves.

use crate::enums::Warning;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

/// Default number of warnings printed before going quiet
pub const DEFAULT_MAX_WARNINGS: i32 = 100;

/// Warning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningPolicy {
    /// Messages to print: `0` prints nothing, a negative value is unlimited
    #[serde(default = "default_max_warnings")]
    pub max_warnings: i32,

    /// Turn every non-ignored warning into an error
    #[serde(default)]
    pub raise_warnings: bool,

    /// Kinds that are dropped silently
    #[serde(default)]
    pub ignored: BTreeSet<Warning>,
}

fn default_max_warnings() -> i32 {
    DEFAULT_MAX_WARNINGS
}

impl Default for WarningPolicy {
    fn default() -> Self {
        Self {
            max_warnings: default_max_warnings(),
            raise_warnings: false,
            ignored: BTreeSet::new(),
        }
    }
}

impl WarningPolicy {
    pub fn silent() -> Self {
        Self {
            max_warnings: 0,
            ..Default::default()
        }
    }

    pub fn raising() -> Self {
        Self {
            raise_warnings: true,
            ..Default::default()
        }
    }

    pub fn is_ignored(&self, warning: Warning) -> bool {
        self.ignored.contains(&warning)
    }
}

/// What the handler did with a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ignored,
    Printed,
    /// Accepted but over the print budget
    Suppressed,
}

#[derive(Debug, Default)]
struct HandlerState {
    policy: WarningPolicy,
    printed: usize,
    emitted: usize,
}

/// Shareable handle on a warning policy and its print budget
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct WarningHandler {
    inner: Arc<Mutex<HandlerState>>,
}

static GLOBAL: OnceLock<WarningHandler> = OnceLock::new();

impl WarningHandler {
    pub fn new(policy: WarningPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HandlerState {
                policy,
                printed: 0,
                emitted: 0,
            })),
        }
    }

    /// The process-wide default handler
    pub fn global() -> WarningHandler {
        GLOBAL.get_or_init(WarningHandler::default).clone()
    }

    fn state(&self) -> MutexGuard<'_, HandlerState> {
        // A panic while holding the lock leaves plain counters behind; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn policy(&self) -> WarningPolicy {
        self.state().policy.clone()
    }

    pub fn set_policy(&self, policy: WarningPolicy) {
        self.state().policy = policy;
    }

    pub fn set_maximum_warnings(&self, max: i32) {
        self.state().policy.max_warnings = max;
    }

    pub fn set_raise_warnings(&self, raise: bool) {
        self.state().policy.raise_warnings = raise;
    }

    pub fn set_ignored_warning(&self, warning: Warning, ignore: bool) {
        let mut state = self.state();
        if ignore {
            state.policy.ignored.insert(warning);
        } else {
            state.policy.ignored.remove(&warning);
        }
    }

    pub fn set_ignored_warnings(&self, warnings: &[Warning], ignore: bool) {
        for warning in warnings {
            self.set_ignored_warning(*warning, ignore);
        }
    }

    /// Restore the default policy and clear the counters
    pub fn reset(&self) {
        *self.state() = HandlerState::default();
    }

    /// Messages printed so far
    pub fn printed(&self) -> usize {
        self.state().printed
    }

    /// Non-ignored warnings seen so far, printed or not
    pub fn emitted(&self) -> usize {
        self.state().emitted
    }

    /// Route one warning through the policy
    pub fn emit(&self, warning: Warning, message: impl Into<String>) -> Result<Disposition> {
        let mut state = self.state();
        if state.policy.is_ignored(warning) {
            return Ok(Disposition::Ignored);
        }
        let message = message.into();
        if state.policy.raise_warnings {
            return Err(Error::Warning {
                kind: warning,
                message,
            });
        }
        state.emitted += 1;

        let max = state.policy.max_warnings;
        if max < 0 || state.printed < max as usize {
            state.printed += 1;
            tracing::warn!(kind = %warning, "{}", message);
            if max > 0 && state.printed == max as usize {
                tracing::warn!(
                    "Maximum number of warnings ({}) reached; further warnings are not printed",
                    max
                );
            }
            Ok(Disposition::Printed)
        } else {
            Ok(Disposition::Suppressed)
        }
    }
}

/// Set how many warnings the global handler prints (`0` none, negative all)
pub fn set_maximum_warnings(max: i32) {
    WarningHandler::global().set_maximum_warnings(max);
}

/// Make the global handler raise warnings as errors
pub fn set_raise_warnings(raise: bool) {
    WarningHandler::global().set_raise_warnings(raise);
}

/// Ignore (or stop ignoring) one warning kind on the global handler
pub fn set_ignored_warning(warning: Warning, ignore: bool) {
    WarningHandler::global().set_ignored_warning(warning, ignore);
}

/// Ignore (or stop ignoring) several warning kinds on the global handler
pub fn set_ignored_warnings(warnings: &[Warning], ignore: bool) {
    WarningHandler::global().set_ignored_warnings(warnings, ignore);
}

/// Restore the global handler's defaults
pub fn reset_warnings() {
    WarningHandler::global().reset();
}
