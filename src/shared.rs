//! Hot-swappable shared machine.
//!
//! Long-lived services want to match continuously while the pattern is
//! reloaded behind their back. `SharedMachine` holds the current
//! machine in an [`ArcSwap`]: readers take a lock-free snapshot per
//! session, writers publish a replacement atomically. Sessions started
//! before a swap keep running on the machine they were created with.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{CompileError, Flags, Machine, Match};

/// A shared slot holding the current compiled machine.
pub struct SharedMachine {
    inner: ArcSwap<Machine>,
}

impl SharedMachine {
    /// Compile `pattern` and install it as the initial machine.
    pub fn compile(pattern: &str, flags: Flags) -> Result<Self, CompileError> {
        Ok(SharedMachine {
            inner: ArcSwap::new(Machine::compile(pattern, flags)?),
        })
    }

    /// Wrap an already compiled machine.
    pub fn new(machine: Arc<Machine>) -> Self {
        SharedMachine {
            inner: ArcSwap::new(machine),
        }
    }

    /// Snapshot of the current machine.
    pub fn load(&self) -> Arc<Machine> {
        self.inner.load_full()
    }

    /// Start a match session on the current machine.
    pub fn begin(&self) -> Match {
        Match::new(self.inner.load_full())
    }

    /// Atomically replace the machine.
    pub fn store(&self, machine: Arc<Machine>) {
        self.inner.store(machine);
    }

    /// Compile `pattern` and replace the machine on success; on error
    /// the previous machine stays installed.
    pub fn recompile(&self, pattern: &str, flags: Flags) -> Result<(), CompileError> {
        let machine = Machine::compile(pattern, flags)?;
        self.inner.store(machine);
        Ok(())
    }
}
