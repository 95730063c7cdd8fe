use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{self, HerbsError};

/// Set once Ctrl-C is received. Batch loops poll it between items, so the
/// item in flight always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes Ctrl-C to a new flag instead of terminating the process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let interrupt = Interrupt::new();
        let handle = interrupt.clone();
        ctrlc::set_handler(move || handle.trigger())?;
        Ok(interrupt)
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fails with [`HerbsError::Interrupted`] once Ctrl-C was received, for
    /// multi-step operations to stop after `step`.
    pub fn check(&self, step: &str) -> error::Result<()> {
        if self.is_set() {
            return Err(HerbsError::Interrupted {
                step: step.to_string(),
            });
        }
        Ok(())
    }
}
