use glam::DVec2;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A logical action the camera understands.
///
/// The window layer maps raw keys onto actions; everything downstream only
/// ever asks whether an action is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Ascend,
    Descend,
    /// Multiplies movement speed while held.
    Sprint,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::Ascend,
        Action::Descend,
        Action::Sprint,
    ];
}

/// Query side of the input boundary.
pub trait ActionState {
    /// Whether the action is currently held.
    fn is_active(&self, action: Action) -> bool;

    /// Latest pointer position, if any pointer sample has arrived.
    fn pointer_position(&self) -> Option<DVec2>;
}

/// Held actions plus a pointer position, fed by window events.
///
/// The pointer is virtual: the window layer may feed it absolute cursor
/// coordinates via [`InputState::set_pointer`] or relative motion via
/// [`InputState::move_pointer`].
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
    pointer: Option<DVec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        if self.held.insert(action) {
            tracing::trace!(?action, "action pressed");
        }
    }

    pub fn release(&mut self, action: Action) {
        if self.held.remove(&action) {
            tracing::trace!(?action, "action released");
        }
    }

    pub fn set(&mut self, action: Action, pressed: bool) {
        if pressed {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.pointer = Some(DVec2::new(x, y));
    }

    /// Offset the pointer by a relative motion and return the new position.
    /// The first motion starts from the origin.
    pub fn move_pointer(&mut self, dx: f64, dy: f64) -> DVec2 {
        let next = self.pointer.unwrap_or(DVec2::ZERO) + DVec2::new(dx, dy);
        self.pointer = Some(next);
        next
    }
}

impl ActionState for InputState {
    fn is_active(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    fn pointer_position(&self) -> Option<DVec2> {
        self.pointer
    }
}

/// Maps window-layer keys onto actions. Generic over the key type so this
/// crate never depends on a windowing library.
#[derive(Debug, Clone)]
pub struct KeyBindings<K> {
    map: HashMap<K, Action>,
}

impl<K: Eq + Hash> Default for KeyBindings<K> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> KeyBindings<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `action`, replacing any previous binding for that key.
    pub fn bind(mut self, key: K, action: Action) -> Self {
        self.map.insert(key, action);
        self
    }

    pub fn action_for(&self, key: &K) -> Option<Action> {
        self.map.get(key).copied()
    }

    /// Apply a key transition to `state`. Returns the bound action, if any.
    pub fn apply(&self, state: &mut InputState, key: &K, pressed: bool) -> Option<Action> {
        let action = self.action_for(key)?;
        state.set(action, pressed);
        Some(action)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        assert!(!input.is_active(Action::MoveForward));
        input.press(Action::MoveForward);
        assert!(input.is_active(Action::MoveForward));
        input.release(Action::MoveForward);
        assert!(!input.is_active(Action::MoveForward));
    }

    #[test]
    fn clear_releases_everything() {
        let mut input = InputState::new();
        for action in Action::ALL {
            input.press(action);
        }
        input.clear();
        assert!(Action::ALL.iter().all(|a| !input.is_active(*a)));
    }

    #[test]
    fn pointer_starts_unset() {
        let input = InputState::new();
        assert_eq!(input.pointer_position(), None);
    }

    #[test]
    fn relative_motion_accumulates() {
        let mut input = InputState::new();
        input.move_pointer(3.0, -2.0);
        let p = input.move_pointer(1.0, 1.0);
        assert_eq!(p, DVec2::new(4.0, -1.0));
        assert_eq!(input.pointer_position(), Some(DVec2::new(4.0, -1.0)));
    }

    #[test]
    fn bindings_route_keys() {
        let bindings = KeyBindings::new()
            .bind('w', Action::MoveForward)
            .bind('s', Action::MoveBackward);
        let mut input = InputState::new();

        assert_eq!(bindings.apply(&mut input, &'w', true), Some(Action::MoveForward));
        assert!(input.is_active(Action::MoveForward));
        assert_eq!(bindings.apply(&mut input, &'x', true), None);
        bindings.apply(&mut input, &'w', false);
        assert!(!input.is_active(Action::MoveForward));
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn rebinding_replaces() {
        let bindings = KeyBindings::new()
            .bind(1u8, Action::Ascend)
            .bind(1u8, Action::Descend);
        assert_eq!(bindings.action_for(&1), Some(Action::Descend));
        assert_eq!(bindings.len(), 1);
    }
}
