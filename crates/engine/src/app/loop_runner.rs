use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::context::TabletopContext;

use super::input::{ActionStates, PressedEdges};
use super::metrics::MetricsAccumulator;
use super::{
    GridStyle, InputAction, InputSnapshot, MetricsHandle, Renderer, ScreenPosition, Session,
    SessionCommand, Vec2, Viewport, DEFAULT_FALLBACK_INTERVAL,
};

pub const SLOW_FRAME_ENV_VAR: &str = "TABLETOP_SLOW_FRAME_MS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Width reserved on the right of the window for host panels.
    pub side_panel_width: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    /// Safety-net visibility pass period.
    pub fallback_recompute_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    pub grid_style: GridStyle,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Tabletop".to_string(),
            window_width: 1280,
            window_height: 720,
            side_panel_width: 0,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            fallback_recompute_interval: DEFAULT_FALLBACK_INTERVAL,
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
            grid_style: GridStyle::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    context: TabletopContext,
    session: Box<dyn Session>,
) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, context, session, metrics_handle)
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut context: TabletopContext,
    mut session: Box<dyn Session>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer =
        Renderer::new(window, config.grid_style).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let timing = LoopTiming::from_config(&config);
    let fixed_dt_seconds = timing.fixed_dt.as_secs_f32();
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let side_panel_width = config.side_panel_width;

    let (initial_width, initial_height) = renderer.size();
    let mut input_collector = InputCollector::new(initial_width, initial_height);
    context = context.with_fallback_interval(timing.fallback_interval);
    context.set_viewport(viewport_for(initial_width, initial_height, side_panel_width));

    info!(
        target_tps = config.target_tps.max(1),
        max_frame_delta_ms = timing.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = timing.max_ticks_per_frame,
        metrics_log_interval_ms = timing.metrics_log_interval.as_millis() as u64,
        fallback_interval_ms = timing.fallback_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %timing.render_cap_label(),
        walls = context.walls().len(),
        lights = context.lights().len(),
        tokens = context.tokens().len(),
        "loop_config"
    );

    let started = Instant::now();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(timing.metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input_collector.mark_quit_requested();
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        input_collector.set_window_size(new_size.width, new_size.height);
                        context.set_viewport(viewport_for(
                            new_size.width,
                            new_size.height,
                            side_panel_width,
                        ));
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        input_collector.set_window_size(size.width, size.height);
                        context.set_viewport(viewport_for(size.width, size.height, side_panel_width));
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input_collector
                            .set_cursor_position_px(position.x as f32, position.y as f32);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        input_collector.clear_cursor_position();
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        input_collector.handle_mouse_input(button, state);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        input_collector.handle_mouse_wheel(delta);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                        if input_collector.quit_requested {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if slow_frame_delay > Duration::ZERO {
                            // Explicit debug perturbation only; this is not the FPS cap.
                            thread::sleep(slow_frame_delay);
                        }

                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let step_plan = timing.plan_ticks(accumulator, raw_frame_dt);
                        for _ in 0..step_plan.ticks_to_run {
                            let input_snapshot = input_collector.snapshot_for_tick();
                            let command =
                                session.update(fixed_dt_seconds, &input_snapshot, &mut context);
                            metrics_accumulator.record_tick();
                            if command == SessionCommand::Quit {
                                info!(reason = "session", "shutdown_requested");
                                window_target.exit();
                                break;
                            }
                        }
                        accumulator = step_plan.remaining_accumulator;

                        if step_plan.dropped_backlog > Duration::ZERO {
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame = timing.max_ticks_per_frame,
                                "sim_clamp_triggered"
                            );
                        }

                        // All edits from this frame's ticks coalesce into one pass.
                        let recompute_started = Instant::now();
                        let report = context.recompute(
                            recompute_started,
                            recompute_started
                                .saturating_duration_since(started)
                                .as_secs_f64(),
                        );
                        if report.ran() {
                            metrics_accumulator.record_recompute(recompute_started.elapsed());
                        }

                        // Single authoritative FPS cap sleep point for render pacing.
                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep = timing.cap_sleep(elapsed_since_last_present);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        let overlay = session.overlay(&context);
                        match renderer.render(&context, &overlay) {
                            Ok(stats) => debug!(
                                main_lines = stats.main_lines,
                                walls = stats.walls_drawn,
                                tokens = stats.tokens_drawn,
                                "frame_composed"
                            ),
                            Err(error) => {
                                warn!(error = %error, "renderer_draw_failed");
                                window_target.exit();
                            }
                        }
                        last_present_instant = Instant::now();
                        let next_title = session.title(&context);
                        if next_title != last_applied_title {
                            if let Some(title) = &next_title {
                                window_for_loop.set_title(title);
                            } else {
                                window_for_loop.set_title(&config.window_title);
                            }
                            last_applied_title = next_title;
                        }
                        metrics_accumulator.record_frame(raw_frame_dt);

                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            metrics_handle.publish(snapshot);
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                frame_time_ms = snapshot.frame_time_ms,
                                recomputes_per_second = snapshot.recomputes_per_second,
                                recompute_time_ms = snapshot.recompute_time_ms,
                                revealed_cells = context.fog().len(),
                                lit_cells = context.lighting().lit_cell_count(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn viewport_for(width: u32, height: u32, side_panel_width: u32) -> Viewport {
    Viewport {
        width,
        height,
        side_panel_width,
    }
}

/// Key that reports a single press edge per physical press.
#[derive(Debug, Default, Clone, Copy)]
struct EdgeKey {
    is_down: bool,
    pressed_edge: bool,
}

impl EdgeKey {
    fn handle(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    toggle_view_mode: EdgeKey,
    toggle_fog_mode: EdgeKey,
    toggle_performance: EdgeKey,
    confirm: EdgeKey,
    cancel: EdgeKey,
    zoom_in: EdgeKey,
    zoom_out: EdgeKey,
    pending_zoom_steps: i32,
    action_states: ActionStates,
    cursor_position_px: Option<ScreenPosition>,
    left_mouse_is_down: bool,
    left_pressed_edge: bool,
    left_released_edge: bool,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        if key_event.repeat && key_event.state == ElementState::Pressed {
            // Held keys keep their down state; edges ignore OS repeat.
            return;
        }
        self.handle_physical_key(key_event.physical_key, key_event.state);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => self.action_states.set(InputAction::PanUp, is_pressed),
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.action_states.set(InputAction::PanDown, is_pressed)
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.action_states.set(InputAction::PanLeft, is_pressed)
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.action_states.set(InputAction::PanRight, is_pressed)
            }
            KeyCode::Escape => {
                self.action_states.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.mark_quit_requested();
                }
            }
            KeyCode::KeyG => self.toggle_view_mode.handle(state),
            KeyCode::KeyF => self.toggle_fog_mode.handle(state),
            KeyCode::KeyP => self.toggle_performance.handle(state),
            KeyCode::Enter | KeyCode::NumpadEnter => self.confirm.handle(state),
            KeyCode::Backspace => self.cancel.handle(state),
            KeyCode::Equal | KeyCode::NumpadAdd => {
                self.zoom_in.handle(state);
                if self.zoom_in.take() {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(1);
                }
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                self.zoom_out.handle(state);
                if self.zoom_out.take() {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_sub(1);
                }
            }
            _ => {}
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let edges = PressedEdges {
            toggle_view_mode: self.toggle_view_mode.take(),
            toggle_fog_mode: self.toggle_fog_mode.take(),
            toggle_performance: self.toggle_performance.take(),
            confirm: self.confirm.take(),
            cancel: self.cancel.take(),
            pointer_pressed: std::mem::take(&mut self.left_pressed_edge),
            pointer_released: std::mem::take(&mut self.left_released_edge),
        };
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            edges,
            self.left_mouse_is_down,
            self.cursor_position_px,
            self.pending_zoom_steps,
            (self.window_width, self.window_height),
        );
        self.pending_zoom_steps = 0;
        snapshot
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2 { x, y });
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = zoom_steps_from_scroll_delta(delta);
        self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(steps);
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.left_pressed_edge = true;
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => {
                if self.left_mouse_is_down {
                    self.left_released_edge = true;
                }
                self.left_mouse_is_down = false;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

/// `LoopConfig` timing with zero and out-of-range values replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LoopTiming {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    metrics_log_interval: Duration,
    fallback_interval: Duration,
    render_fps_cap: Option<u32>,
}

impl LoopTiming {
    fn from_config(config: &LoopConfig) -> Self {
        let target_tps = config.target_tps.max(1);
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / target_tps as f64),
            max_frame_delta: non_zero_or(config.max_frame_delta, Duration::from_millis(250)),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            metrics_log_interval: non_zero_or(config.metrics_log_interval, Duration::from_secs(1)),
            fallback_interval: non_zero_or(
                config.fallback_recompute_interval,
                DEFAULT_FALLBACK_INTERVAL,
            ),
            render_fps_cap: config.max_render_fps.filter(|fps| *fps > 0),
        }
    }

    /// Folds one frame's delta (capped at `max_frame_delta`) into the
    /// accumulator and drains whole ticks. Backlog past the tick cap is dropped.
    fn plan_ticks(&self, accumulator: Duration, frame_dt: Duration) -> StepPlan {
        let mut pending = accumulator.saturating_add(frame_dt.min(self.max_frame_delta));
        let mut ticks_to_run = 0u32;
        while pending >= self.fixed_dt && ticks_to_run < self.max_ticks_per_frame {
            pending -= self.fixed_dt;
            ticks_to_run += 1;
        }
        let dropped_backlog = if pending >= self.fixed_dt {
            std::mem::take(&mut pending)
        } else {
            Duration::ZERO
        };
        StepPlan {
            ticks_to_run,
            remaining_accumulator: pending,
            dropped_backlog,
        }
    }

    fn render_frame_target(&self) -> Option<Duration> {
        self.render_fps_cap
            .map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
    }

    /// Sleep needed before presenting so frames stay under the render cap.
    fn cap_sleep(&self, since_last_present: Duration) -> Duration {
        self.render_frame_target()
            .map_or(Duration::ZERO, |target| target.saturating_sub(since_last_present))
    }

    fn render_cap_label(&self) -> String {
        self.render_fps_cap
            .map_or_else(|| "off".to_string(), |fps| fps.to_string())
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

fn zoom_steps_from_scroll_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(tps: u32, max_ticks_per_frame: u32) -> LoopTiming {
        LoopTiming::from_config(&LoopConfig {
            target_tps: tps,
            max_ticks_per_frame,
            ..LoopConfig::default()
        })
    }

    #[test]
    fn long_frames_are_capped_before_ticking() {
        let timing = timing(10, 100);
        let plan = timing.plan_ticks(Duration::ZERO, Duration::from_millis(600));
        // 600 ms is capped to 250 ms: two 100 ms ticks and 50 ms left over.
        assert_eq!(plan.ticks_to_run, 2);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(50));
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn leftover_accumulator_carries_into_the_next_frame() {
        let timing = timing(10, 5);
        let plan = timing.plan_ticks(Duration::from_millis(60), Duration::from_millis(40));
        assert_eq!(plan.ticks_to_run, 1);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn backlog_past_the_tick_cap_is_dropped() {
        let timing = timing(10, 1);
        let plan = timing.plan_ticks(Duration::from_millis(150), Duration::from_millis(100));
        assert_eq!(plan.ticks_to_run, 1);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(150));
    }

    #[test]
    fn view_mode_toggle_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyG), ElementState::Pressed);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.toggle_view_mode_pressed());
        assert!(!second.toggle_view_mode_pressed());
    }

    #[test]
    fn held_toggle_does_not_spam_press_edges() {
        let mut input = InputCollector::default();
        let key = PhysicalKey::Code(KeyCode::KeyF);

        input.handle_physical_key(key, ElementState::Pressed);
        let first = input.snapshot_for_tick();
        input.handle_physical_key(key, ElementState::Pressed);
        let second = input.snapshot_for_tick();
        input.handle_physical_key(key, ElementState::Released);
        input.handle_physical_key(key, ElementState::Pressed);
        let third = input.snapshot_for_tick();

        assert!(first.toggle_fog_mode_pressed());
        assert!(!second.toggle_fog_mode_pressed());
        assert!(third.toggle_fog_mode_pressed());
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_pan_actions() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::KeyW), ElementState::Pressed);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), ElementState::Pressed);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::PanUp));
        assert!(snapshot.is_down(InputAction::PanLeft));
        assert_eq!(snapshot.pan_axis(), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        let key = PhysicalKey::Code(KeyCode::KeyD);
        input.handle_physical_key(key, ElementState::Pressed);
        input.handle_physical_key(key, ElementState::Released);

        assert!(!input.snapshot_for_tick().is_down(InputAction::PanRight));
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Escape), ElementState::Pressed);
        assert!(input.quit_requested);
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn confirm_and_cancel_keys_map_to_edges() {
        let mut input = InputCollector::default();
        input.handle_physical_key(PhysicalKey::Code(KeyCode::NumpadEnter), ElementState::Pressed);
        input.handle_physical_key(PhysicalKey::Code(KeyCode::Backspace), ElementState::Pressed);
        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.confirm_pressed());
        assert!(snapshot.cancel_pressed());
    }

    #[test]
    fn drag_reports_press_hold_and_release() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let pressed = input.snapshot_for_tick();
        let held = input.snapshot_for_tick();
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        let released = input.snapshot_for_tick();

        assert!(pressed.pointer_pressed() && pressed.pointer_down());
        assert!(!held.pointer_pressed() && held.pointer_down());
        assert!(released.pointer_released() && !released.pointer_down());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.pointer_released());
        assert!(!snapshot.pointer_pressed());
    }

    #[test]
    fn snapshot_carries_cursor_and_window_size() {
        let mut input = InputCollector::new(1280, 720);
        input.set_cursor_position_px(100.0, 200.0);
        let snapshot = input.snapshot_for_tick();

        assert_eq!(snapshot.window_size(), (1280, 720));
        let cursor = snapshot.cursor_position_px().expect("cursor");
        assert!((cursor.x - 100.0).abs() < 0.0001);
        assert!((cursor.y - 200.0).abs() < 0.0001);

        input.clear_cursor_position();
        assert!(input.snapshot_for_tick().cursor_position_px().is_none());
    }

    #[test]
    fn zoom_keys_are_edge_triggered_only() {
        let mut input = InputCollector::new(1280, 720);
        let zoom_in = PhysicalKey::Code(KeyCode::Equal);

        input.handle_physical_key(zoom_in, ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 1);

        input.handle_physical_key(zoom_in, ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 0);

        input.handle_physical_key(zoom_in, ElementState::Released);
        input.handle_physical_key(zoom_in, ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 1);

        input.handle_physical_key(PhysicalKey::Code(KeyCode::Minus), ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), -1);
    }

    #[test]
    fn mouse_wheel_adds_zoom_steps_and_snapshot_resets_pending() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, -2.0));

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert_eq!(first.zoom_delta_steps(), -1);
        assert_eq!(second.zoom_delta_steps(), 0);
    }

    #[test]
    fn pixel_wheel_delta_maps_to_single_discrete_step_direction() {
        let step = |y: f64| {
            zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
                winit::dpi::PhysicalPosition::new(0.0, y),
            ))
        };
        assert_eq!(step(3.0), 1);
        assert_eq!(step(-5.0), -1);
        assert_eq!(step(0.0), 0);
    }

    #[test]
    fn render_cap_sleeps_only_inside_the_frame_budget() {
        let uncapped = LoopTiming::from_config(&LoopConfig::default());
        assert_eq!(uncapped.cap_sleep(Duration::ZERO), Duration::ZERO);
        assert_eq!(uncapped.render_cap_label(), "off");

        let capped = LoopTiming::from_config(&LoopConfig {
            max_render_fps: Some(50),
            ..LoopConfig::default()
        });
        assert_eq!(capped.cap_sleep(Duration::from_millis(25)), Duration::ZERO);
        assert_eq!(capped.cap_sleep(Duration::from_millis(5)), Duration::from_millis(15));
        assert_eq!(capped.render_cap_label(), "50");
    }

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let timing = LoopTiming::from_config(&LoopConfig {
            target_tps: 0,
            max_frame_delta: Duration::ZERO,
            max_ticks_per_frame: 0,
            fallback_recompute_interval: Duration::ZERO,
            max_render_fps: Some(0),
            ..LoopConfig::default()
        });
        assert_eq!(timing.fixed_dt, Duration::from_secs(1));
        assert_eq!(timing.max_frame_delta, Duration::from_millis(250));
        assert_eq!(timing.max_ticks_per_frame, 1);
        assert_eq!(timing.fallback_interval, DEFAULT_FALLBACK_INTERVAL);
        assert_eq!(timing.render_fps_cap, None);
    }

    #[test]
    fn loop_config_reads_partial_json() {
        let config: LoopConfig =
            serde_json::from_str(r#"{"window_title":"Crypt","side_panel_width":240}"#)
                .expect("config");
        assert_eq!(config.window_title, "Crypt");
        assert_eq!(config.side_panel_width, 240);
        assert_eq!(config.target_tps, 60);
        assert_eq!(config.fallback_recompute_interval, DEFAULT_FALLBACK_INTERVAL);
    }
}
