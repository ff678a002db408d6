use crate::app::{GridCoordinate, InputSnapshot, WorldPosition};
use crate::context::TabletopContext;
use crate::lighting::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    None,
    Quit,
}

/// In-progress token drag, drawn over everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragLine {
    pub from: WorldPosition,
    pub to: WorldPosition,
    pub color: Rgb,
}

/// Per-frame decorations a session asks the renderer to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOverlay {
    pub drag_line: Option<DragLine>,
    pub highlighted_cell: Option<GridCoordinate>,
}

/// Interactive layer driven by the loop runner at the fixed tick rate.
///
/// Sessions edit the tabletop only through `TabletopContext`, so every edit
/// marks the derived state it invalidates before the next frame's recompute.
pub trait Session {
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        context: &mut TabletopContext,
    ) -> SessionCommand;

    fn overlay(&self, _context: &TabletopContext) -> FrameOverlay {
        FrameOverlay::default()
    }

    fn title(&self, _context: &TabletopContext) -> Option<String> {
        None
    }
}
