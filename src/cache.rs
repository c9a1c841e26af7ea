//! Interned compilation results.
//!
//! Compiling the same pattern repeatedly (log scanners, rule engines
//! that instantiate matchers per stream) wastes work; machines are
//! immutable, so one compilation can back any number of sessions. The
//! cache keys on the pattern text plus the caller-settable flags.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{CompileError, Flags, Machine};

/// A cache of compiled machines keyed by `(pattern, flags)`.
///
/// Lookups and inserts take a short lock; the returned machines are
/// shared. Failed compilations are not cached.
#[derive(Default)]
pub struct MachineCache {
    machines: Mutex<FxHashMap<(String, Flags), Arc<Machine>>>,
}

impl MachineCache {
    pub fn new() -> Self {
        MachineCache {
            machines: Mutex::new(FxHashMap::default()),
        }
    }

    /// Return the cached machine for `(pattern, flags)`, compiling and
    /// caching it on first use.
    pub fn get_or_compile(
        &self,
        pattern: &str,
        flags: Flags,
    ) -> Result<Arc<Machine>, CompileError> {
        let mut machines = self.machines.lock();
        if let Some(machine) = machines.get(&(pattern.to_owned(), flags)) {
            return Ok(machine.clone());
        }
        let machine = Machine::compile(pattern, flags)?;
        machines.insert((pattern.to_owned(), flags), machine.clone());
        Ok(machine)
    }

    /// Number of cached machines.
    pub fn len(&self) -> usize {
        self.machines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.lock().is_empty()
    }

    /// Drop every cached machine. Machines already handed out stay
    /// alive through their own reference counts.
    pub fn clear(&self) {
        self.machines.lock().clear();
    }
}
