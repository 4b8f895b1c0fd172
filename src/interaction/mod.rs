use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::Point;
use crate::telemetry::TARGET_REDRAW;

/// Keyboard modifiers held while a pointer or wheel event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
}

/// Pointer event in surface-local pixels, already scaled for device density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub position: Point,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    #[must_use]
    pub const fn at(x: i32, y: i32) -> Self {
        Self {
            position: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Wheel event; a negative `delta_y` means the wheel rolled away from the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub position: Point,
    pub delta_y: f64,
    pub modifiers: Modifiers,
}

impl WheelEvent {
    #[must_use]
    pub const fn new(delta_y: f64) -> Self {
        Self {
            position: Point::ORIGIN,
            delta_y,
            modifiers: Modifiers::NONE,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Payload of an event routed to a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Wheel(WheelEvent),
}

/// Native event a surface may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PointerUp,
    PointerDown,
    PointerMove,
    PointerEnter,
    PointerLeave,
    Wheel,
    Click,
}

impl EventKind {
    const fn bit(self) -> u8 {
        match self {
            Self::PointerUp => 1 << 0,
            Self::PointerDown => 1 << 1,
            Self::PointerMove => 1 << 2,
            Self::PointerEnter => 1 << 3,
            Self::PointerLeave => 1 << 4,
            Self::Wheel => 1 << 5,
            Self::Click => 1 << 6,
        }
    }
}

/// Bitmask of events handled by the drawings of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventCapabilities {
    bits: u8,
}

impl EventCapabilities {
    #[must_use]
    pub const fn none() -> Self {
        Self { bits: 0 }
    }

    #[must_use]
    pub const fn from_event(kind: EventKind) -> Self {
        Self { bits: kind.bit() }
    }

    #[must_use]
    pub const fn with(self, kind: EventKind) -> Self {
        Self {
            bits: self.bits | kind.bit(),
        }
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    #[must_use]
    pub const fn handles(self, kind: EventKind) -> bool {
        (self.bits & kind.bit()) != 0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.bits == 0
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bits
    }
}

/// State of the time-range selector overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectorDrag {
    #[default]
    Idle,
    DraggingLeftHandle,
    DraggingRightHandle,
    /// Grab-and-shift; `reference` is the time under the pointer at the last move.
    DraggingPan { reference: DateTime<Utc> },
}

impl SelectorDrag {
    #[must_use]
    pub const fn is_dragging(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering,
}

/// Non-reentrancy guard around whole-chart paint passes.
///
/// A request arriving while a pass is in flight is dropped, never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderScheduler {
    state: RenderState,
    dropped: u64,
}

impl RenderScheduler {
    #[must_use]
    pub fn state(self) -> RenderState {
        self.state
    }

    /// Number of requests dropped since creation.
    #[must_use]
    pub fn dropped_requests(self) -> u64 {
        self.dropped
    }

    /// Enters `Rendering`. Returns `false`, and counts a dropped request, when
    /// a pass is already in flight.
    pub fn begin(&mut self, operation: &'static str) -> bool {
        match self.state {
            RenderState::Idle => {
                self.state = RenderState::Rendering;
                true
            }
            RenderState::Rendering => {
                self.dropped += 1;
                warn!(
                    target: TARGET_REDRAW,
                    operation, "request dropped: a paint pass is still in progress"
                );
                false
            }
        }
    }

    pub fn end(&mut self) {
        self.state = RenderState::Idle;
    }
}
