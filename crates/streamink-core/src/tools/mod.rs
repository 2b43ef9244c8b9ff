//! Tool state machine turning pointer events and actions into page edits.

mod tool;

pub use tool::{AtomicOp, GeometryKind, RUBBER_TOLERANCE, Tool};

use crate::action::{Action, ActionKind, KeyEvent, PenPoint};
use crate::page::{Page, PageError};
use crate::shapes::StrokeKind;
use kurbo::Rect;
use thiserror::Error;

/// Tool errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("No tool selected")]
    NoTool,
    #[error("Tool '{0}' has no gesture in progress")]
    NotActive(&'static str),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// State of the tool machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolState {
    /// No tool selected.
    #[default]
    Idle,
    /// Tool selected, no gesture in progress.
    Armed,
    /// Between begin and end of a gesture.
    Active,
}

/// Holds the selected tool and routes gestures to it.
#[derive(Debug, Clone, Default)]
pub struct ToolController {
    tool: Option<Tool>,
    state: ToolState,
    /// Latest modifier snapshot.
    modifiers: KeyEvent,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn tool(&self) -> Option<&Tool> {
        self.tool.as_ref()
    }

    pub fn modifiers(&self) -> KeyEvent {
        self.modifiers
    }

    /// Select a continuous tool, dropping any unfinished gesture.
    ///
    /// Atomic tools are run immediately instead; see [`Self::select_and_execute`].
    pub fn set_tool(&mut self, tool: Tool, page: &mut Page) -> ToolResult<()> {
        if tool.is_atomic() {
            return self.select_and_execute(tool, page);
        }
        if self.state == ToolState::Active {
            log::debug!(
                "Switching to {} during an unfinished {} gesture",
                tool.name(),
                self.tool.as_ref().map_or("?", Tool::name)
            );
        }
        self.tool = Some(tool);
        self.state = ToolState::Armed;
        Ok(())
    }

    /// Run an atomic tool as one begin/execute/end triple at the zero
    /// point, then restore the tool (and gesture state) it displaced.
    pub fn select_and_execute(&mut self, tool: Tool, page: &mut Page) -> ToolResult<()> {
        let previous = self.tool.replace(tool);
        let previous_state = self.state;
        self.state = ToolState::Armed;

        let result = self
            .begin_tool(PenPoint::ZERO, page)
            .and_then(|()| self.execute_tool(PenPoint::ZERO, page))
            .and_then(|()| self.end_tool(PenPoint::ZERO, page));

        self.state = match (&previous, previous_state) {
            (None, _) => ToolState::Idle,
            (Some(_), ToolState::Active) => ToolState::Active,
            (Some(_), _) => ToolState::Armed,
        };
        self.tool = previous;
        result
    }

    /// Start a gesture with the selected tool.
    pub fn begin_tool(&mut self, point: PenPoint, page: &mut Page) -> ToolResult<()> {
        let tool = self.tool.as_mut().ok_or(ToolError::NoTool)?;
        self.state = ToolState::Active;
        let result = tool.begin(point, page, &mut self.modifiers);
        if result.is_err() {
            self.state = ToolState::Armed;
        }
        result
    }

    /// Continue the current gesture.
    pub fn execute_tool(&mut self, point: PenPoint, page: &mut Page) -> ToolResult<()> {
        let modifiers = self.modifiers;
        let tool = self.active_tool()?;
        tool.execute(point, page, modifiers)
    }

    /// Finish the current gesture.
    pub fn end_tool(&mut self, point: PenPoint, page: &mut Page) -> ToolResult<()> {
        let modifiers = self.modifiers;
        let tool = self.active_tool()?;
        let result = tool.end(point, page, modifiers);
        self.state = ToolState::Armed;
        result
    }

    fn active_tool(&mut self) -> ToolResult<&mut Tool> {
        let tool = self.tool.as_mut().ok_or(ToolError::NoTool)?;
        if self.state != ToolState::Active {
            return Err(ToolError::NotActive(tool.name()));
        }
        Ok(tool)
    }

    /// Apply one action to `page`.
    pub fn execute(&mut self, action: &Action, page: &mut Page) -> ToolResult<()> {
        if let Some(key_event) = action.key_event {
            self.modifiers = key_event;
        }

        match action.kind() {
            ActionKind::ToolBegin(point) => self.begin_tool(*point, page),
            ActionKind::ToolExecute(point) => self.execute_tool(*point, page),
            ActionKind::ToolEnd(point) => self.end_tool(*point, page),

            ActionKind::Pen(spec) => self.set_tool(Tool::stroke(StrokeKind::Pen, *spec), page),
            ActionKind::Highlighter(spec) => self.set_tool(Tool::stroke(StrokeKind::Highlighter, *spec), page),
            ActionKind::Pointer(spec) => self.set_tool(Tool::stroke(StrokeKind::Pointer, *spec), page),
            ActionKind::Line(spec) => self.set_tool(Tool::geometry(GeometryKind::Line, *spec), page),
            ActionKind::Arrow(spec) => self.set_tool(Tool::geometry(GeometryKind::Arrow, *spec), page),
            ActionKind::Rectangle(spec) => self.set_tool(Tool::geometry(GeometryKind::Rectangle, *spec), page),
            ActionKind::Ellipse(spec) => self.set_tool(Tool::geometry(GeometryKind::Ellipse, *spec), page),
            ActionKind::Zoom(spec) => self.set_tool(Tool::zoom(*spec), page),
            ActionKind::Pan => self.set_tool(Tool::pan(), page),
            ActionKind::Rubber(_) => self.set_tool(Tool::rubber(), page),
            ActionKind::Text(handle) => self.set_tool(
                Tool::Text {
                    handle: *handle,
                    latex: false,
                },
                page,
            ),
            ActionKind::Latex(handle) => self.set_tool(
                Tool::Text {
                    handle: *handle,
                    latex: true,
                },
                page,
            ),

            ActionKind::Key => {
                let event = action.key_event.unwrap_or_default();
                self.select_and_execute(Tool::Atomic(AtomicOp::Key(event)), page)
            }
            ActionKind::Undo => self.select_and_execute(Tool::Atomic(AtomicOp::Undo), page),
            ActionKind::Redo => self.select_and_execute(Tool::Atomic(AtomicOp::Redo), page),
            ActionKind::ClearShapes => self.select_and_execute(Tool::Atomic(AtomicOp::ClearShapes), page),
            ActionKind::ZoomOut => self.select_and_execute(Tool::Atomic(AtomicOp::ZoomOut), page),
            ActionKind::ExtendView { origin, size } => {
                let rect = Rect::from_origin_size(*origin, *size);
                self.select_and_execute(Tool::Atomic(AtomicOp::ExtendView(rect)), page)
            }
            ActionKind::DeleteShape(handle) => {
                self.select_and_execute(Tool::Atomic(AtomicOp::DeleteShape(*handle)), page)
            }
            ActionKind::TextRemove(handle) => self.select_and_execute(Tool::Atomic(AtomicOp::TextRemove(*handle)), page),
            ActionKind::TextMove { handle, position } => self.select_and_execute(
                Tool::Atomic(AtomicOp::TextMove {
                    handle: *handle,
                    position: *position,
                }),
                page,
            ),
            ActionKind::TextChange { handle, text } => self.select_and_execute(
                Tool::Atomic(AtomicOp::TextChange {
                    handle: *handle,
                    text: text.clone(),
                }),
                page,
            ),
            ActionKind::TextFontChange { handle, color, font } => self.select_and_execute(
                Tool::Atomic(AtomicOp::TextFontChange {
                    handle: *handle,
                    color: *color,
                    font: font.clone(),
                }),
                page,
            ),
            ActionKind::TextHighlight { handle, color, rects } => self.select_and_execute(
                Tool::Atomic(AtomicOp::TextHighlight {
                    handle: *handle,
                    color: *color,
                    rects: rects.clone(),
                }),
                page,
            ),
        }
    }
}
