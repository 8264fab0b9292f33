use std::collections::{HashMap, HashSet};

use glam::Vec2;
use maplit::hashmap;
use orom_miniquad::{KeyCode, MouseButton};

/// Actions the simulation reacts to.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Control {
    TurnLeft,
    TurnRight,
    ThrustForward,
    ThrustBackward,
    Fire,
    ResetZoom,
}

/// Read-only (from the simulation's point of view) snapshot of held keys
/// and the cursor position in framebuffer pixels, origin at the top-left.
///
/// A control is active while any key bound to it is down, so releasing one
/// of two aliased keys leaves the control held.
#[derive(Debug, Clone)]
pub struct InputState {
    bindings: HashMap<KeyCode, Control>,
    keys_pressed: HashSet<KeyCode>,
    mouse_fire: bool,
    /// Controls held without a key, e.g. by a script.
    held: HashSet<Control>,
    cursor: Vec2,
}

impl Default for InputState {
    fn default() -> Self {
        Self::with_bindings(default_bindings())
    }
}

pub fn default_bindings() -> HashMap<KeyCode, Control> {
    hashmap! {
        KeyCode::A => Control::TurnLeft,
        KeyCode::D => Control::TurnRight,
        KeyCode::W => Control::ThrustForward,
        KeyCode::S => Control::ThrustBackward,
        KeyCode::Left => Control::TurnLeft,
        KeyCode::Right => Control::TurnRight,
        KeyCode::Up => Control::ThrustForward,
        KeyCode::Down => Control::ThrustBackward,
        KeyCode::Space => Control::Fire,
        KeyCode::Equal => Control::ResetZoom,
    }
}

impl InputState {
    pub fn with_bindings(bindings: HashMap<KeyCode, Control>) -> Self {
        Self {
            bindings,
            keys_pressed: HashSet::new(),
            mouse_fire: false,
            held: HashSet::new(),
            cursor: Vec2::ZERO,
        }
    }

    pub fn is_active(&self, control: Control) -> bool {
        if self.held.contains(&control) || (control == Control::Fire && self.mouse_fire) {
            return true;
        }
        self.keys_pressed
            .iter()
            .any(|key| self.bindings.get(key) == Some(&control))
    }

    pub fn is_thrusting(&self) -> bool {
        self.is_active(Control::ThrustForward) || self.is_active(Control::ThrustBackward)
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Vec2) {
        self.cursor = cursor;
    }

    /// Holds `control` independently of the keyboard and mouse.
    pub fn press(&mut self, control: Control) {
        self.held.insert(control);
    }

    pub fn release(&mut self, control: Control) {
        self.held.remove(&control);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
        self.keys_pressed.clear();
        self.mouse_fire = false;
    }

    /// Returns the control bound to `key_code`, if the key is bound at all.
    pub fn key_down(&mut self, key_code: KeyCode) -> Option<Control> {
        let control = *self.bindings.get(&key_code)?;
        self.keys_pressed.insert(key_code);
        Some(control)
    }

    pub fn key_up(&mut self, key_code: KeyCode) -> Option<Control> {
        let control = *self.bindings.get(&key_code)?;
        self.keys_pressed.remove(&key_code);
        Some(control)
    }

    pub fn mouse_down(&mut self, button: MouseButton) {
        if let MouseButton::Left = button {
            self.mouse_fire = true;
        }
    }

    pub fn mouse_up(&mut self, button: MouseButton) {
        if let MouseButton::Left = button {
            self.mouse_fire = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_keys_toggle_controls() {
        let mut input = InputState::default();
        assert_eq!(input.key_down(KeyCode::W), Some(Control::ThrustForward));
        assert!(input.is_thrusting());
        assert_eq!(input.key_up(KeyCode::W), Some(Control::ThrustForward));
        assert!(!input.is_thrusting());
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut input = InputState::default();
        assert_eq!(input.key_down(KeyCode::Q), None);
        assert!(!input.is_active(Control::Fire));
    }

    #[test]
    fn left_mouse_button_fires() {
        let mut input = InputState::default();
        input.mouse_down(MouseButton::Right);
        assert!(!input.is_active(Control::Fire));
        input.mouse_down(MouseButton::Left);
        assert!(input.is_active(Control::Fire));
        input.mouse_up(MouseButton::Left);
        assert!(!input.is_active(Control::Fire));
    }

    #[test]
    fn aliased_keys_hold_a_control_until_both_are_up() {
        let mut input = InputState::default();
        input.key_down(KeyCode::W);
        input.key_down(KeyCode::Up);
        input.key_up(KeyCode::Up);
        assert!(input.is_active(Control::ThrustForward));
        input.key_up(KeyCode::W);
        assert!(!input.is_active(Control::ThrustForward));
    }

    #[test]
    fn space_and_mouse_fire_independently() {
        let mut input = InputState::default();
        input.mouse_down(MouseButton::Left);
        input.key_down(KeyCode::Space);
        input.key_up(KeyCode::Space);
        assert!(input.is_active(Control::Fire));
        input.mouse_up(MouseButton::Left);
        assert!(!input.is_active(Control::Fire));
    }
}
