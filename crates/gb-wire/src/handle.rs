use derive_more::{Display, From, Into};

/// Opaque identifier the engine uses to refer back to a registered node.
///
/// Handles are never reused while a session lives. `Handle::NONE` (zero) is the
/// "no successor" / "unknown" sentinel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, From, Into)]
#[display("#{_0}")]
pub struct Handle(u64);

impl Handle {
    pub const NONE: Handle = Handle(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Handles cross the boundary as signed 64-bit integers.
    pub const fn to_wire(self) -> i64 {
        self.0 as i64
    }

    pub const fn from_wire(raw: i64) -> Self {
        Self(raw as u64)
    }
}
