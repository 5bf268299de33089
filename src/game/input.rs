//! Player Input
//!
//! Five independent latched signals per player. A key is set on press and
//! cleared on release; there are no chords or combos. Key-binding
//! translation lives outside the simulation and feeds `InputEvent`s in.

use serde::{Serialize, Deserialize};

use crate::game::entity::PlayerId;

/// A logical control key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Key {
    /// Move up
    Up = 0,
    /// Move down
    Down = 1,
    /// Move left
    Left = 2,
    /// Move right
    Right = 3,
    /// Plant a bomb
    Action = 4,
}

impl Key {
    /// All keys in bit order.
    pub const ALL: [Key; 5] = [Key::Up, Key::Down, Key::Left, Key::Right, Key::Action];

    #[inline]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Latched key state for one player.
///
/// Packed bits:
/// - Bit 0: up
/// - Bit 1: down
/// - Bit 2: left
/// - Bit 3: right
/// - Bit 4: action
/// - Bit 5-7: reserved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed key bits
    pub flags: u8,
}

impl InputFrame {
    /// No keys held.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Frame with the given keys held.
    pub fn with_keys(keys: &[Key]) -> Self {
        let mut frame = Self::new();
        for key in keys {
            frame.press(*key);
        }
        frame
    }

    /// Latch a key.
    #[inline]
    pub fn press(&mut self, key: Key) {
        self.flags |= key.bit();
    }

    /// Clear a key.
    #[inline]
    pub fn release(&mut self, key: Key) {
        self.flags &= !key.bit();
    }

    /// Check if a key is held.
    #[inline]
    pub fn is_held(&self, key: Key) -> bool {
        self.flags & key.bit() != 0
    }

    /// True if any movement key is held.
    #[inline]
    pub fn any_movement(&self) -> bool {
        self.flags & 0b0_1111 != 0
    }

    /// Drop reserved bits.
    #[inline]
    pub fn sanitized(self) -> Self {
        Self { flags: self.flags & 0b1_1111 }
    }
}

/// A single press or release delivered to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Player the key belongs to
    pub player: PlayerId,
    /// Which key
    pub key: Key,
    /// True on press, false on release
    pub pressed: bool,
}

impl InputEvent {
    /// Press event.
    pub fn press(player: PlayerId, key: Key) -> Self {
        Self { player, key, pressed: true }
    }

    /// Release event.
    pub fn release(player: PlayerId, key: Key) -> Self {
        Self { player, key, pressed: false }
    }

    /// Apply to a latched frame.
    #[inline]
    pub fn apply(&self, frame: &mut InputFrame) {
        if self.pressed {
            frame.press(self.key);
        } else {
            frame.release(self.key);
        }
    }
}
