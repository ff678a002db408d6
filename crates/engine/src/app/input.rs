use crate::app::{ScreenPosition, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    Quit,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::PanUp => 0,
            InputAction::PanDown => 1,
            InputAction::PanLeft => 2,
            InputAction::PanRight => 3,
            InputAction::Quit => 4,
        }
    }
}

/// Edge-triggered presses collected since the previous simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PressedEdges {
    pub(crate) toggle_view_mode: bool,
    pub(crate) toggle_fog_mode: bool,
    pub(crate) toggle_performance: bool,
    pub(crate) confirm: bool,
    pub(crate) cancel: bool,
    pub(crate) pointer_pressed: bool,
    pub(crate) pointer_released: bool,
}

/// Everything a session sees of the input devices for one fixed tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    edges: PressedEdges,
    pointer_down: bool,
    cursor_position_px: Option<ScreenPosition>,
    zoom_delta_steps: i32,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        edges: PressedEdges,
        pointer_down: bool,
        cursor_position_px: Option<ScreenPosition>,
        zoom_delta_steps: i32,
        window_size: (u32, u32),
    ) -> Self {
        Self {
            quit_requested,
            actions,
            edges,
            pointer_down,
            cursor_position_px,
            zoom_delta_steps,
            window_width: window_size.0,
            window_height: window_size.1,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Unit-less pan direction from the held pan keys.
    pub fn pan_axis(&self) -> Vec2 {
        let axis = |neg: InputAction, pos: InputAction| -> f32 {
            match (self.is_down(neg), self.is_down(pos)) {
                (true, false) => -1.0,
                (false, true) => 1.0,
                _ => 0.0,
            }
        };
        Vec2::new(
            axis(InputAction::PanLeft, InputAction::PanRight),
            axis(InputAction::PanUp, InputAction::PanDown),
        )
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<ScreenPosition>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_pointer_pressed(mut self, pressed: bool) -> Self {
        self.edges.pointer_pressed = pressed;
        self
    }

    pub fn with_pointer_released(mut self, released: bool) -> Self {
        self.edges.pointer_released = released;
        self
    }

    pub fn with_pointer_down(mut self, pointer_down: bool) -> Self {
        self.pointer_down = pointer_down;
        self
    }

    pub fn with_toggle_view_mode(mut self, pressed: bool) -> Self {
        self.edges.toggle_view_mode = pressed;
        self
    }

    pub fn with_toggle_fog_mode(mut self, pressed: bool) -> Self {
        self.edges.toggle_fog_mode = pressed;
        self
    }

    pub fn with_toggle_performance(mut self, pressed: bool) -> Self {
        self.edges.toggle_performance = pressed;
        self
    }

    pub fn with_confirm(mut self, pressed: bool) -> Self {
        self.edges.confirm = pressed;
        self
    }

    pub fn with_cancel(mut self, pressed: bool) -> Self {
        self.edges.cancel = pressed;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }

    pub fn cursor_position_px(&self) -> Option<ScreenPosition> {
        self.cursor_position_px
    }

    pub fn pointer_pressed(&self) -> bool {
        self.edges.pointer_pressed
    }

    pub fn pointer_released(&self) -> bool {
        self.edges.pointer_released
    }

    pub fn pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn toggle_view_mode_pressed(&self) -> bool {
        self.edges.toggle_view_mode
    }

    pub fn toggle_fog_mode_pressed(&self) -> bool {
        self.edges.toggle_fog_mode
    }

    pub fn toggle_performance_pressed(&self) -> bool {
        self.edges.toggle_performance
    }

    pub fn confirm_pressed(&self) -> bool {
        self.edges.confirm
    }

    pub fn cancel_pressed(&self) -> bool {
        self.edges.cancel
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_pan_keys_cancel_out() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::PanLeft, true)
            .with_action_down(InputAction::PanRight, true)
            .with_action_down(InputAction::PanDown, true);
        assert_eq!(input.pan_axis(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn builder_sets_only_named_edges() {
        let input = InputSnapshot::empty()
            .with_confirm(true)
            .with_pointer_released(true);
        assert!(input.confirm_pressed());
        assert!(input.pointer_released());
        assert!(!input.cancel_pressed());
        assert!(!input.pointer_pressed());
        assert!(!input.toggle_view_mode_pressed());
    }
}
