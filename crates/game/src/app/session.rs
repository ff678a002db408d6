use tabletop_engine::{
    grid_to_world_center, screen_to_world, world_to_grid, DragLine, FogRevealMode, FrameOverlay,
    InputSnapshot, MovementSession, MovementTier, MovementVerdict, Rgb, ScreenPosition, Session,
    SessionCommand, TabletopContext, TokenId, ViewMode, WorldPosition,
};
use tracing::{info, warn};

/// Pan speed in screen pixels; divided by zoom so the feel is zoom independent.
const PAN_SPEED_PX_PER_SECOND: f32 = 600.0;

const INVALID_COLOR: Rgb = Rgb::new(231, 76, 60);
const NEEDS_AP_COLOR: Rgb = Rgb::new(243, 156, 18);
const WITHIN_BASE_COLOR: Rgb = Rgb::new(46, 204, 113);
const WITHIN_PAID_COLOR: Rgb = Rgb::new(52, 152, 219);

pub(crate) fn tier_color(tier: MovementTier) -> Rgb {
    match tier {
        MovementTier::Invalid => INVALID_COLOR,
        MovementTier::NeedsActionPoints => NEEDS_AP_COLOR,
        MovementTier::WithinBase => WITHIN_BASE_COLOR,
        MovementTier::WithinPaid => WITHIN_PAID_COLOR,
    }
}

/// Dropped move that costs action points, held until confirmed or cancelled.
#[derive(Debug, Clone, PartialEq)]
struct PendingMove {
    token: TokenId,
    from: WorldPosition,
    target: WorldPosition,
    verdict: MovementVerdict,
}

/// Host side of the tabletop: camera controls, mode toggles and token drags.
#[derive(Debug, Default)]
pub(crate) struct TabletopSession {
    drag: Option<MovementSession>,
    pending: Option<PendingMove>,
}

impl TabletopSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn apply_camera_input(
        &self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        context: &mut TabletopContext,
    ) {
        let axis = input.pan_axis();
        if axis.x != 0.0 || axis.y != 0.0 {
            let step =
                PAN_SPEED_PX_PER_SECOND * fixed_dt_seconds / context.camera().effective_zoom();
            context.camera_mut().pan_by(axis.x * step, axis.y * step);
        }
        let steps = input.zoom_delta_steps();
        if steps != 0 {
            context.camera_mut().apply_zoom_steps(steps);
        }
    }

    fn apply_toggles(&self, input: &InputSnapshot, context: &mut TabletopContext) {
        if input.toggle_view_mode_pressed() {
            let mode = context.view_mode().toggled();
            context.set_view_mode(mode);
            info!(mode = ?mode, "view_mode_changed");
        }
        if input.toggle_fog_mode_pressed() {
            let mode = match context.visibility_settings().fog_reveal_mode {
                FogRevealMode::Permanent => FogRevealMode::Temporary,
                FogRevealMode::Temporary => FogRevealMode::Permanent,
            };
            context.set_fog_reveal_mode(mode);
            info!(mode = ?mode, "fog_mode_changed");
        }
        if input.toggle_performance_pressed() {
            let enabled = !context.lighting_settings().performance_mode;
            context.set_performance_mode(enabled);
            info!(enabled, "performance_mode_changed");
        }
    }

    fn resolve_pending(&mut self, input: &InputSnapshot, context: &mut TabletopContext) {
        if input.cancel_pressed() {
            if let Some(pending) = self.pending.take() {
                info!(token = ?pending.token, "move_cancelled");
            }
            return;
        }
        if input.confirm_pressed() {
            if let Some(pending) = self.pending.take() {
                commit_move(context, pending.token, pending.target, &pending.verdict);
            }
        }
    }

    fn handle_drag(&mut self, input: &InputSnapshot, context: &mut TabletopContext) {
        let cursor_world = input
            .cursor_position_px()
            .and_then(|cursor| cursor_to_world(cursor, context));

        if input.pointer_pressed() && self.drag.is_none() && self.pending.is_none() {
            if let Some(world) = cursor_world {
                self.drag = pick_token(context, world)
                    .map(|(token, start)| MovementSession::begin(token, start));
            }
        }

        if let (Some(drag), Some(world)) = (self.drag.as_mut(), cursor_world) {
            if input.pointer_down() || input.pointer_released() {
                let grid = context.grid();
                let target = grid_to_world_center(world_to_grid(world, grid), grid);
                drag.update(target, context.grid(), context.combat());
            }
        }

        if input.pointer_released() {
            if let Some(drag) = self.drag.take() {
                self.drop_token(drag, context);
            }
        }
    }

    fn drop_token(&mut self, drag: MovementSession, context: &mut TabletopContext) {
        if drag.feet_moved <= 0.0 {
            return;
        }
        let verdict = drag.verdict;
        match verdict.tier() {
            MovementTier::Invalid => {
                info!(
                    token = ?drag.token,
                    feet = verdict.feet_moved,
                    ap_needed = verdict.additional_ap_needed,
                    "move_rejected"
                );
            }
            MovementTier::NeedsActionPoints if verdict.enforced => {
                info!(
                    token = ?drag.token,
                    feet = verdict.feet_moved,
                    ap_needed = verdict.additional_ap_needed,
                    "move_needs_confirmation"
                );
                self.pending = Some(PendingMove {
                    token: drag.token,
                    from: drag.start,
                    target: drag.current,
                    verdict,
                });
            }
            _ => commit_move(context, drag.token, drag.current, &verdict),
        }
    }

    #[cfg(test)]
    fn has_pending_move(&self) -> bool {
        self.pending.is_some()
    }
}

impl Session for TabletopSession {
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        context: &mut TabletopContext,
    ) -> SessionCommand {
        if input.quit_requested() {
            return SessionCommand::Quit;
        }
        self.apply_camera_input(fixed_dt_seconds, input, context);
        self.apply_toggles(input, context);
        self.resolve_pending(input, context);
        self.handle_drag(input, context);
        SessionCommand::None
    }

    fn overlay(&self, context: &TabletopContext) -> FrameOverlay {
        let line = match (&self.drag, &self.pending) {
            (Some(drag), _) => Some((drag.start, drag.current, drag.verdict.tier())),
            (None, Some(pending)) => Some((pending.from, pending.target, pending.verdict.tier())),
            (None, None) => None,
        };
        match line {
            Some((from, to, tier)) => FrameOverlay {
                drag_line: Some(DragLine {
                    from,
                    to,
                    color: tier_color(tier),
                }),
                highlighted_cell: Some(world_to_grid(to, context.grid())),
            },
            None => FrameOverlay::default(),
        }
    }

    fn title(&self, context: &TabletopContext) -> Option<String> {
        let mode = match context.view_mode() {
            ViewMode::GameMaster => "GM",
            ViewMode::Player => "Player",
        };
        let fog = match context.visibility_settings().fog_reveal_mode {
            FogRevealMode::Permanent => "permanent fog",
            FogRevealMode::Temporary => "temporary fog",
        };
        let mut title = format!(
            "Tabletop | {mode} | {fog} | zoom {:.2}",
            context.camera().effective_zoom()
        );
        if context.lighting_settings().performance_mode {
            title.push_str(" | performance");
        }
        if let Some(pending) = &self.pending {
            title.push_str(&format!(
                " | {} AP: Enter to confirm, Backspace to cancel",
                pending.verdict.additional_ap_needed
            ));
        }
        Some(title)
    }
}

/// Cursor in world space, or `None` over the side panel.
fn cursor_to_world(cursor: ScreenPosition, context: &TabletopContext) -> Option<WorldPosition> {
    let (width, height) = context.viewport().drawable_size();
    if cursor.x < 0.0 || cursor.y < 0.0 || cursor.x >= width as f32 || cursor.y >= height as f32 {
        return None;
    }
    Some(screen_to_world(cursor, context.camera(), context.viewport()))
}

/// Token under the cursor. Players cannot pick up tokens hidden by fog.
fn pick_token(context: &TabletopContext, world: WorldPosition) -> Option<(TokenId, WorldPosition)> {
    let grid = context.grid();
    let cell = world_to_grid(world, grid);
    let fogged = context.view_mode() == ViewMode::Player
        && context.visibility_settings().dynamic_fog_enabled
        && !context.fog().is_revealed(cell);
    if fogged {
        return None;
    }
    context
        .tokens()
        .iter()
        .find(|token| token.cell(grid) == cell)
        .map(|token| (token.id, token.position))
}

fn commit_move(
    context: &mut TabletopContext,
    token: TokenId,
    target: WorldPosition,
    verdict: &MovementVerdict,
) {
    if verdict.enforced {
        if let Err(error) = context.combat_mut().confirm_movement(token, verdict) {
            warn!(token = ?token, error = %error, "move_rejected");
            return;
        }
    }
    match context.move_token(token, target) {
        Ok(_) => info!(
            token = ?token,
            feet = verdict.feet_moved,
            ap_spent = verdict.additional_ap_needed,
            "token_moved"
        ),
        Err(error) => warn!(token = ?token, error = %error, "move_rejected"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use tabletop_engine::{CombatantTurn, GridConfig, InputAction, Token, Vec2, Viewport};

    const DT: f32 = 1.0 / 60.0;

    /// 400x400 drawable area with the camera on (200, 200): screen and world coincide.
    fn context_with_token() -> TabletopContext {
        let mut context = TabletopContext::new(GridConfig::default());
        context.set_viewport(Viewport::new(400, 400));
        context.camera_mut().center_on(Vec2::new(200.0, 200.0));
        context
            .upsert_token(Token::new(TokenId(1), "Fighter", Vec2::new(25.0, 25.0)))
            .expect("token");
        context.recompute(Instant::now(), 0.0);
        context
    }

    fn enter_combat(context: &mut TabletopContext, speed: f32, action_points: u32) {
        context
            .combat_mut()
            .add_combatant(TokenId(1), CombatantTurn::new(speed, action_points));
        context.combat_mut().start();
    }

    fn drag(session: &mut TabletopSession, context: &mut TabletopContext, to: Vec2) {
        let press = InputSnapshot::empty()
            .with_cursor_position_px(Some(Vec2::new(25.0, 25.0)))
            .with_pointer_pressed(true)
            .with_pointer_down(true);
        session.update(DT, &press, context);
        let hold = InputSnapshot::empty()
            .with_cursor_position_px(Some(to))
            .with_pointer_down(true);
        session.update(DT, &hold, context);
        let release = InputSnapshot::empty()
            .with_cursor_position_px(Some(to))
            .with_pointer_released(true);
        session.update(DT, &release, context);
    }

    #[test]
    fn free_drag_moves_token_to_cell_centre() {
        let mut context = context_with_token();
        let mut session = TabletopSession::new();
        drag(&mut session, &mut context, Vec2::new(160.0, 30.0));
        let token = context.tokens().get(TokenId(1)).expect("token");
        assert_eq!(token.position, Vec2::new(175.0, 25.0));
    }

    #[test]
    fn drag_line_colour_follows_the_verdict() {
        let mut context = context_with_token();
        enter_combat(&mut context, 30.0, 1);
        let mut session = TabletopSession::new();
        let press = InputSnapshot::empty()
            .with_cursor_position_px(Some(Vec2::new(25.0, 25.0)))
            .with_pointer_pressed(true)
            .with_pointer_down(true);
        session.update(DT, &press, &mut context);

        // Six cells is 30 ft, inside the base speed.
        let hold = InputSnapshot::empty()
            .with_cursor_position_px(Some(Vec2::new(325.0, 25.0)))
            .with_pointer_down(true);
        session.update(DT, &hold, &mut context);
        let line = session.overlay(&context).drag_line.expect("line");
        assert_eq!(line.color, WITHIN_BASE_COLOR);

        // Seven cells is 35 ft and needs an action point.
        let hold = InputSnapshot::empty()
            .with_cursor_position_px(Some(Vec2::new(375.0, 25.0)))
            .with_pointer_down(true);
        session.update(DT, &hold, &mut context);
        let line = session.overlay(&context).drag_line.expect("line");
        assert_eq!(line.color, NEEDS_AP_COLOR);
    }

    #[test]
    fn paid_move_waits_for_confirmation() {
        let mut context = context_with_token();
        enter_combat(&mut context, 30.0, 1);
        let mut session = TabletopSession::new();
        drag(&mut session, &mut context, Vec2::new(375.0, 25.0));
        assert!(session.has_pending_move());
        assert_eq!(
            context.tokens().get(TokenId(1)).expect("token").position,
            Vec2::new(25.0, 25.0)
        );

        session.update(DT, &InputSnapshot::empty().with_confirm(true), &mut context);
        assert!(!session.has_pending_move());
        assert_eq!(
            context.tokens().get(TokenId(1)).expect("token").position,
            Vec2::new(375.0, 25.0)
        );
        let turn = context.combat().turn(TokenId(1)).expect("turn");
        assert_eq!(turn.action_points, 0);
        assert!((turn.movement_used - 35.0).abs() < 1e-3);
    }

    #[test]
    fn cancelled_move_leaves_token_and_budget_untouched() {
        let mut context = context_with_token();
        enter_combat(&mut context, 30.0, 1);
        let mut session = TabletopSession::new();
        drag(&mut session, &mut context, Vec2::new(375.0, 25.0));
        session.update(DT, &InputSnapshot::empty().with_cancel(true), &mut context);
        assert!(!session.has_pending_move());
        assert_eq!(
            context.tokens().get(TokenId(1)).expect("token").position,
            Vec2::new(25.0, 25.0)
        );
        assert_eq!(context.combat().turn(TokenId(1)).expect("turn").action_points, 1);
    }

    #[test]
    fn move_beyond_action_points_is_rejected() {
        let mut context = context_with_token();
        enter_combat(&mut context, 10.0, 0);
        let mut session = TabletopSession::new();
        drag(&mut session, &mut context, Vec2::new(375.0, 25.0));
        assert!(!session.has_pending_move());
        assert_eq!(
            context.tokens().get(TokenId(1)).expect("token").position,
            Vec2::new(25.0, 25.0)
        );
    }

    #[test]
    fn players_cannot_grab_fogged_tokens() {
        let mut context = TabletopContext::new(GridConfig::default());
        context.set_viewport(Viewport::new(400, 400));
        context.camera_mut().center_on(Vec2::new(200.0, 200.0));
        context
            .upsert_token(Token::new(TokenId(1), "Fighter", Vec2::new(25.0, 25.0)))
            .expect("token");
        // No recompute yet, so nothing is revealed.
        assert!(pick_token(&context, Vec2::new(25.0, 25.0)).is_none());
        context.set_view_mode(ViewMode::GameMaster);
        assert_eq!(
            pick_token(&context, Vec2::new(25.0, 25.0)),
            Some((TokenId(1), Vec2::new(25.0, 25.0)))
        );
    }

    #[test]
    fn toggles_flip_modes() {
        let mut context = context_with_token();
        let mut session = TabletopSession::new();
        let input = InputSnapshot::empty()
            .with_toggle_view_mode(true)
            .with_toggle_fog_mode(true)
            .with_toggle_performance(true);
        session.update(DT, &input, &mut context);
        assert_eq!(context.view_mode(), ViewMode::GameMaster);
        assert_eq!(
            context.visibility_settings().fog_reveal_mode,
            FogRevealMode::Temporary
        );
        assert!(context.lighting_settings().performance_mode);
        let title = session.title(&context).expect("title");
        assert!(title.contains("GM"));
        assert!(title.contains("performance"));
    }

    #[test]
    fn panning_scales_with_zoom() {
        let mut context = context_with_token();
        context.camera_mut().set_zoom_clamped(2.0);
        let mut session = TabletopSession::new();
        let input = InputSnapshot::empty().with_action_down(InputAction::PanRight, true);
        session.update(0.5, &input, &mut context);
        assert!((context.camera().x - 350.0).abs() < 1e-3);
    }

    #[test]
    fn scroll_zooms_by_whole_steps() {
        let mut context = context_with_token();
        let mut session = TabletopSession::new();
        let input = InputSnapshot::empty().with_zoom_delta_steps(2);
        session.update(DT, &input, &mut context);
        assert!((context.camera().zoom_level - 1.21).abs() < 1e-3);
    }

    #[test]
    fn quit_is_reported() {
        let mut context = context_with_token();
        let mut session = TabletopSession::new();
        let input = InputSnapshot::empty().with_quit_requested(true);
        assert_eq!(session.update(DT, &input, &mut context), SessionCommand::Quit);
    }
}
