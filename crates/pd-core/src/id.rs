use lasso::{Spur, ThreadedRodeo};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Interner for handle prefixes. Only the prefix is interned, so minting
/// handles on every render leaves the table at one entry per prefix.
static PREFIXES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Next serial number; shared by all prefixes.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Handle of one element node on the live surface.
///
/// Handles are minted every time an element node is built, so a handle
/// taken before a render never aliases an element created after it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    prefix: Spur,
    serial: u64,
}

impl ElementId {
    /// Mint a fresh handle (`el_0`, `el_1`, ...).
    pub fn fresh() -> Self {
        Self::with_prefix("el")
    }

    /// Mint a fresh handle with a custom prefix.
    pub fn with_prefix(prefix: &str) -> Self {
        ElementId {
            prefix: PREFIXES.get_or_intern(prefix),
            serial: COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Look up a handle by its string form (`prefix_N`). Only handles that
    /// could have been minted resolve.
    pub fn lookup(s: &str) -> Option<Self> {
        let (prefix, serial) = s.rsplit_once('_')?;
        if serial.is_empty() || !serial.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let serial: u64 = serial.parse().ok()?;
        if serial >= COUNTER.load(Ordering::Relaxed) {
            return None;
        }
        let prefix = PREFIXES.get(prefix)?;
        Some(ElementId { prefix, serial })
    }

    pub fn prefix(&self) -> &str {
        PREFIXES.resolve(&self.prefix)
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{self}")
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.prefix(), self.serial)
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Page identity: the creation timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl PageId {
    /// Build an id from a millisecond timestamp, bumped past `last` so two
    /// pages created in the same millisecond still get distinct ids.
    pub fn from_clock(now_ms: f64, last: Option<PageId>) -> Self {
        let now = if now_ms.is_finite() && now_ms > 0.0 {
            now_ms as u64
        } else {
            0
        };
        match last {
            Some(PageId(prev)) if prev >= now => PageId(prev + 1),
            _ => PageId(now),
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
