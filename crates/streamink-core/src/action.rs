//! Page-local actions: the edits and commands replayed against a page.

use crate::shapes::{Brush, Rgba, ShapeHandle, TextFont};
use kurbo::{Point, Rect, Size};

/// A pointer sample in page coordinates (page width = 1).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PenPoint {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
}

impl PenPoint {
    /// The synthetic point atomic tools run with.
    pub const ZERO: PenPoint = PenPoint {
        x: 0.0,
        y: 0.0,
        pressure: 0.0,
    };

    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self { x, y, pressure }
    }

    /// Position as a kurbo point.
    pub fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Modifier-key snapshot taken when an action was produced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

/// Handle and brush carried by every shape-creating tool action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSpec {
    pub handle: ShapeHandle,
    pub brush: Brush,
}

impl BrushSpec {
    pub fn new(handle: ShapeHandle, brush: Brush) -> Self {
        Self { handle, brush }
    }
}

/// One-byte wire tag of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionType {
    ToolBegin = 0,
    ToolExecute = 1,
    ToolEnd = 2,
    ExtendView = 3,
    Key = 4,
    Undo = 5,
    Redo = 6,
    ClearShapes = 7,
    Pan = 8,
    Zoom = 9,
    ZoomOut = 10,
    Arrow = 11,
    Ellipse = 12,
    Highlighter = 13,
    Latex = 14,
    Line = 15,
    Pen = 16,
    Pointer = 17,
    Rectangle = 18,
    Rubber = 19,
    Text = 20,
    TextChange = 21,
    TextFontChange = 22,
    TextMove = 23,
    TextRemove = 24,
    TextHighlight = 25,
    DeleteShape = 26,
}

impl TryFrom<u8> for ActionType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        use ActionType::*;
        const TABLE: [ActionType; 27] = [
            ToolBegin,
            ToolExecute,
            ToolEnd,
            ExtendView,
            Key,
            Undo,
            Redo,
            ClearShapes,
            Pan,
            Zoom,
            ZoomOut,
            Arrow,
            Ellipse,
            Highlighter,
            Latex,
            Line,
            Pen,
            Pointer,
            Rectangle,
            Rubber,
            Text,
            TextChange,
            TextFontChange,
            TextMove,
            TextRemove,
            TextHighlight,
            DeleteShape,
        ];
        TABLE.get(tag as usize).copied().ok_or(tag)
    }
}

/// Payload of an action, one variant per wire type.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    ToolBegin(PenPoint),
    ToolExecute(PenPoint),
    ToolEnd(PenPoint),
    /// Show the sub-region of the page at `origin` with `size`, as sent.
    ExtendView { origin: Point, size: Size },
    Key,
    Undo,
    Redo,
    ClearShapes,
    Pan,
    Zoom(BrushSpec),
    ZoomOut,
    Arrow(BrushSpec),
    Ellipse(BrushSpec),
    Highlighter(BrushSpec),
    Latex(ShapeHandle),
    Line(BrushSpec),
    Pen(BrushSpec),
    Pointer(BrushSpec),
    Rectangle(BrushSpec),
    Rubber(ShapeHandle),
    Text(ShapeHandle),
    TextChange {
        handle: ShapeHandle,
        text: String,
    },
    TextFontChange {
        handle: ShapeHandle,
        color: Rgba,
        font: TextFont,
    },
    TextMove {
        handle: ShapeHandle,
        position: Point,
    },
    TextRemove(ShapeHandle),
    TextHighlight {
        handle: ShapeHandle,
        color: Rgba,
        rects: Vec<Rect>,
    },
    DeleteShape(ShapeHandle),
}

impl ActionKind {
    /// Wire tag for this payload.
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionKind::ToolBegin(_) => ActionType::ToolBegin,
            ActionKind::ToolExecute(_) => ActionType::ToolExecute,
            ActionKind::ToolEnd(_) => ActionType::ToolEnd,
            ActionKind::ExtendView { .. } => ActionType::ExtendView,
            ActionKind::Key => ActionType::Key,
            ActionKind::Undo => ActionType::Undo,
            ActionKind::Redo => ActionType::Redo,
            ActionKind::ClearShapes => ActionType::ClearShapes,
            ActionKind::Pan => ActionType::Pan,
            ActionKind::Zoom(_) => ActionType::Zoom,
            ActionKind::ZoomOut => ActionType::ZoomOut,
            ActionKind::Arrow(_) => ActionType::Arrow,
            ActionKind::Ellipse(_) => ActionType::Ellipse,
            ActionKind::Highlighter(_) => ActionType::Highlighter,
            ActionKind::Latex(_) => ActionType::Latex,
            ActionKind::Line(_) => ActionType::Line,
            ActionKind::Pen(_) => ActionType::Pen,
            ActionKind::Pointer(_) => ActionType::Pointer,
            ActionKind::Rectangle(_) => ActionType::Rectangle,
            ActionKind::Rubber(_) => ActionType::Rubber,
            ActionKind::Text(_) => ActionType::Text,
            ActionKind::TextChange { .. } => ActionType::TextChange,
            ActionKind::TextFontChange { .. } => ActionType::TextFontChange,
            ActionKind::TextMove { .. } => ActionType::TextMove,
            ActionKind::TextRemove(_) => ActionType::TextRemove,
            ActionKind::TextHighlight { .. } => ActionType::TextHighlight,
            ActionKind::DeleteShape(_) => ActionType::DeleteShape,
        }
    }
}

/// A discrete, serializable edit or command applied to a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Producer clock at creation.
    pub timestamp: i32,
    /// Local modifier snapshot; never sent over the wire.
    pub key_event: Option<KeyEvent>,
    kind: ActionKind,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            timestamp: 0,
            key_event: None,
            kind,
        }
    }

    pub fn with_timestamp(kind: ActionKind, timestamp: i32) -> Self {
        Self {
            timestamp,
            key_event: None,
            kind,
        }
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    pub fn set_timestamp(&mut self, timestamp: i32) {
        self.timestamp = timestamp;
    }

    pub fn set_key_event(&mut self, key_event: Option<KeyEvent>) {
        self.key_event = key_event;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_table_matches_discriminants() {
        for tag in 0u8..=26 {
            let ty = ActionType::try_from(tag).unwrap();
            assert_eq!(ty as u8, tag);
        }
        assert_eq!(ActionType::try_from(27), Err(27));
        assert_eq!(ActionType::try_from(255), Err(255));
    }

    #[test]
    fn test_kind_reports_type() {
        let action = Action::new(ActionKind::ToolBegin(PenPoint::new(0.1, 0.2, 1.0)));
        assert_eq!(action.action_type(), ActionType::ToolBegin);
        let action = Action::new(ActionKind::DeleteShape(3));
        assert_eq!(action.action_type(), ActionType::DeleteShape);
    }

    #[test]
    fn test_post_construction_fields() {
        let mut action = Action::new(ActionKind::Undo);
        action.set_timestamp(42);
        action.set_key_event(Some(KeyEvent::shift()));
        assert_eq!(action.timestamp, 42);
        assert!(action.key_event.unwrap().shift);
    }
}
