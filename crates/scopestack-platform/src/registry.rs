//! Process-wide view of installed thread stacks.
//!
//! The arenas themselves stay thread-local; this only records which threads
//! have one and how large it is, for diagnostics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use once_cell::sync::Lazy;

use scopestack_core::{StackError, StackResult};

use crate::Backing;

/// Entry describing one installed thread stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInfo {
    pub thread: ThreadId,
    pub thread_name: Option<String>,
    pub capacity: usize,
    pub backing: Backing,
}

static REGISTRY: Lazy<Mutex<HashMap<ThreadId, StackInfo>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Records a stack for the calling thread.
pub(crate) fn register(capacity: usize, backing: Backing) -> StackResult<StackInfo> {
    let current = thread::current();
    let info = StackInfo {
        thread: current.id(),
        thread_name: current.name().map(str::to_string),
        capacity,
        backing,
    };

    let mut registry = REGISTRY.lock()?;
    if registry.contains_key(&info.thread) {
        return Err(StackError::AlreadyInstalled);
    }
    registry.insert(info.thread, info.clone());
    Ok(info)
}

/// Forgets the calling thread's stack. A poisoned registry is left as is.
pub(crate) fn unregister() {
    if let Ok(mut registry) = REGISTRY.lock() {
        registry.remove(&thread::current().id());
    }
}

/// Lists every thread that currently has a stack installed.
pub fn installed_stacks() -> Vec<StackInfo> {
    REGISTRY
        .lock()
        .map(|registry| registry.values().cloned().collect())
        .unwrap_or_default()
}

/// Checks if `thread` has a stack installed.
pub fn is_installed(thread: ThreadId) -> bool {
    REGISTRY
        .lock()
        .map(|registry| registry.contains_key(&thread))
        .unwrap_or(false)
}

/// Returns the sum of all installed capacities.
pub fn reserved_bytes() -> usize {
    REGISTRY
        .lock()
        .map(|registry| registry.values().map(|info| info.capacity).sum())
        .unwrap_or(0)
}
