//! Keyboard movement input

use glam::Vec2;

/// Direction keys currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PlayerInput {
    /// Update held state from a `KeyboardEvent.key` value.
    /// Returns true if the key is a movement key.
    pub fn set_key(&mut self, key: &str, pressed: bool) -> bool {
        let slot = match key {
            "ArrowUp" | "w" | "W" => &mut self.up,
            "ArrowDown" | "s" | "S" => &mut self.down,
            "ArrowLeft" | "a" | "A" => &mut self.left,
            "ArrowRight" | "d" | "D" => &mut self.right,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn key_down(&mut self, key: &str) -> bool {
        self.set_key(key, true)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.set_key(key, false)
    }

    /// Release every key (window blur)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Unit-length walking direction, or zero when idle.
    /// Screen coordinates: up is -y.
    pub fn normalized_movement(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i32 - neg as i32) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_is_zero() {
        assert_eq!(PlayerInput::default().normalized_movement(), Vec2::ZERO);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let mut input = PlayerInput::default();
        input.key_down("ArrowUp");
        input.key_down("d");
        let m = input.normalized_movement();
        assert!((m.length() - 1.0).abs() < 1e-6);
        assert!(m.x > 0.0 && m.y < 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut input = PlayerInput::default();
        input.key_down("a");
        input.key_down("D");
        assert_eq!(input.normalized_movement(), Vec2::ZERO);

        input.key_up("a");
        assert_eq!(input.normalized_movement(), Vec2::X);
    }

    #[test]
    fn test_unknown_key_ignored() {
        let mut input = PlayerInput::default();
        assert!(!input.key_down("Enter"));
        assert!(input.key_down("S"));
        input.clear();
        assert_eq!(input, PlayerInput::default());
    }
}
