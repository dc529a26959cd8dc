use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Readiness interest of a session.
///
/// The low byte ([`EVENT_MASK`](Self::EVENT_MASK)) carries the event bits
/// handed to the selector. Two flags live alongside them:
///
/// - [`CLOSING`](Self::CLOSING): a close request delivered together with
///   fired events,
/// - [`INVERTED`](Self::INVERTED): the transport last asked for readiness in
///   the opposite direction to finish an operation.
///
/// The same type is used for the fired-event set passed to
/// [`Session::dispatch`](crate::Session::dispatch).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interest(u32);

impl Interest {
    /// No readiness requested.
    pub const NONE: Interest = Interest(0);

    /// Wants to be notified when the transport is readable.
    pub const READABLE: Interest = Interest(0x01);

    /// Wants to be notified when the transport is writable.
    pub const WRITEABLE: Interest = Interest(0x04);

    /// Close request bits.
    pub const CLOSING: Interest = Interest(0x18);

    /// Bits forwarded to the selector.
    pub const EVENT_MASK: Interest = Interest(0xff);

    /// Transport inversion flag, above the event mask.
    pub const INVERTED: Interest = Interest(0x100);

    /// Builds an interest from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Interest(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if any bit of `other` is set in `self`.
    pub const fn intersects(self, other: Interest) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Interest) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_readable(self) -> bool {
        self.intersects(Self::READABLE)
    }

    pub const fn is_writable(self) -> bool {
        self.intersects(Self::WRITEABLE)
    }

    /// Returns `true` if a close request is part of this set.
    pub const fn is_closing(self) -> bool {
        self.intersects(Self::CLOSING)
    }

    /// Returns `true` if the transport inversion flag is set.
    pub const fn is_inverted(self) -> bool {
        self.intersects(Self::INVERTED)
    }

    /// Strips everything but the selector event bits.
    pub const fn events(self) -> Interest {
        Interest(self.0 & Self::EVENT_MASK.0)
    }
}

impl BitOr for Interest {
    type Output = Interest;

    fn bitor(self, rhs: Interest) -> Interest {
        Interest(self.0 | rhs.0)
    }
}

impl BitOrAssign for Interest {
    fn bitor_assign(&mut self, rhs: Interest) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Interest {
    type Output = Interest;

    fn bitand(self, rhs: Interest) -> Interest {
        Interest(self.0 & rhs.0)
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();

        if self.is_readable() {
            names.push("READABLE");
        }
        if self.is_writable() {
            names.push("WRITEABLE");
        }
        if self.is_closing() {
            names.push("CLOSING");
        }
        if self.is_inverted() {
            names.push("INVERTED");
        }

        if names.is_empty() {
            write!(f, "Interest(NONE)")
        } else {
            write!(f, "Interest({})", names.join(" | "))
        }
    }
}

/// Liveness classification returned by
/// [`Session::check_status`](crate::Session::check_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Recently active, or still making progress on queued writes.
    Active,

    /// Nothing happened within the keep-alive window and nothing is queued.
    Idle,

    /// Data has been stuck in the write queue far beyond the keep-alive window.
    Stale,
}
