//! Stack configuration, with environment overrides.

use std::fmt;
use std::str::FromStr;

use scopestack_core::{DEFAULT_ALIGNMENT, StackError, StackResult, check_alignment};

/// Capacity in bytes (`k`/`m`/`g` suffixes accepted).
pub const ENV_CAPACITY: &str = "SCOPESTACK_CAPACITY";
/// `heap` or `mapped`.
pub const ENV_BACKING: &str = "SCOPESTACK_BACKING";
/// Base alignment of heap backings; must be a power of two.
pub const ENV_ALIGNMENT: &str = "SCOPESTACK_ALIGNMENT";

pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Where a stack's memory comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backing {
    #[default]
    Heap,
    Mapped,
}

impl Backing {
    pub const fn name(&self) -> &'static str {
        match self {
            Backing::Heap => "heap",
            Backing::Mapped => "mapped",
        }
    }
}

impl fmt::Display for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backing {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heap" => Ok(Backing::Heap),
            "mapped" | "mmap" => Ok(Backing::Mapped),
            other => Err(StackError::config(format!("unknown backing `{}`", other))),
        }
    }
}

/// Settings for one thread's stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub capacity: usize,
    pub backing: Backing,
    pub alignment: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            backing: Backing::Heap,
            alignment: DEFAULT_ALIGNMENT,
        }
    }
}

impl StackConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn with_backing(mut self, backing: Backing) -> Self {
        self.backing = backing;
        self
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    /// Reads overrides from `SCOPESTACK_*` environment variables.
    pub fn from_env() -> StackResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Missing keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StackResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CAPACITY) {
            config.capacity = parse_size(&raw).inspect_err(|e| {
                tracing::warn!("Invalid stack config {}={:?}: {}", ENV_CAPACITY, raw, e)
            })?;
        }
        if let Some(raw) = lookup(ENV_BACKING) {
            config.backing = raw.parse().inspect_err(|e| {
                tracing::warn!("Invalid stack config {}={:?}: {}", ENV_BACKING, raw, e)
            })?;
        }
        if let Some(raw) = lookup(ENV_ALIGNMENT) {
            config.alignment = raw
                .trim()
                .parse()
                .map_err(|_| StackError::config(format!("invalid alignment `{}`", raw)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the config can produce a usable stack.
    pub fn validate(&self) -> StackResult<()> {
        if self.capacity == 0 {
            return Err(StackError::InvalidCapacity);
        }
        check_alignment(self.alignment)
    }
}

/// Parses `"4096"`, `"64k"`, `"2M"` or `"1g"` into bytes.
pub fn parse_size(raw: &str) -> StackResult<usize> {
    let s = raw.trim();
    let (digits, shift) = match s.char_indices().last() {
        Some((idx, 'k' | 'K')) => (&s[..idx], 10),
        Some((idx, 'm' | 'M')) => (&s[..idx], 20),
        Some((idx, 'g' | 'G')) => (&s[..idx], 30),
        _ => (s, 0),
    };
    let value: usize = digits
        .trim()
        .parse()
        .map_err(|_| StackError::config(format!("invalid size `{}`", raw)))?;
    value
        .checked_mul(1usize << shift)
        .ok_or_else(|| StackError::config(format!("size `{}` overflows", raw)))
}
