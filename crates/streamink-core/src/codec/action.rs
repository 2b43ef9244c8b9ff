//! Action frames: `i32 length | u8 tag | i32 timestamp | payload`.

use super::{ACTION_HEADER_LEN, CodecError, CodecResult, FrameWriter, ProgressiveReader, checked_length};
use crate::action::{Action, ActionKind, ActionType, BrushSpec, PenPoint};
use crate::config::{CodecConfig, UnknownActionPolicy};
use crate::shapes::{Brush, Rgba, TextFont};
use kurbo::{Point, Rect, Size};

/// Bytes of one encoded highlight rect.
const RECT_LEN: usize = 32;

/// Decode a buffer holding exactly one action frame, rejecting unknown tags.
pub fn decode_action(data: &[u8]) -> CodecResult<Action> {
    let mut reader = ProgressiveReader::new(data);
    let config = CodecConfig::default();
    let action = read_action(&mut reader, &config)?
        .ok_or_else(|| CodecError::Corrupt("unknown action skipped".to_string()))?;
    if !reader.is_exhausted() {
        return Err(CodecError::Corrupt(format!(
            "{} trailing bytes after action frame",
            reader.remaining()
        )));
    }
    Ok(action)
}

/// Read one action frame from `reader`.
///
/// Returns `Ok(None)` when the frame carries an unknown tag and the config
/// asks to skip those; the cursor is then positioned after the frame.
pub fn read_action(reader: &mut ProgressiveReader<'_>, config: &CodecConfig) -> CodecResult<Option<Action>> {
    let declared = checked_length(reader.read_i32()?, "action frame")?;
    if declared < ACTION_HEADER_LEN {
        return Err(CodecError::Corrupt(format!(
            "action frame length {declared} shorter than its header"
        )));
    }
    if declared > config.max_frame_length {
        return Err(CodecError::FrameTooLarge {
            max: config.max_frame_length,
            got: declared,
        });
    }

    let mut frame = reader.sub_reader(declared)?;
    let tag = frame.read_u8()?;
    let timestamp = frame.read_i32()?;

    let Ok(action_type) = ActionType::try_from(tag) else {
        return match config.unknown_action {
            UnknownActionPolicy::Reject => Err(CodecError::NotImplemented { family: "action", tag }),
            UnknownActionPolicy::Skip => {
                log::debug!("Skipping action frame with unknown tag {tag} ({declared} bytes)");
                Ok(None)
            }
        };
    };

    let kind = decode_payload(action_type, &mut frame)?;
    if !frame.is_exhausted() {
        return Err(CodecError::LengthMismatch {
            declared: declared - ACTION_HEADER_LEN,
            consumed: frame.offset() - ACTION_HEADER_LEN,
        });
    }

    Ok(Some(Action::with_timestamp(kind, timestamp)))
}

/// Encode an action as one complete frame, length prefix included.
pub fn encode_action(action: &Action) -> CodecResult<Vec<u8>> {
    let mut w = FrameWriter::with_capacity(64);
    w.put_u8(action.action_type() as u8);
    w.put_i32(action.timestamp);
    encode_payload(action.kind(), &mut w)?;
    w.finish_frame()
}

fn read_point(r: &mut ProgressiveReader<'_>) -> CodecResult<PenPoint> {
    Ok(PenPoint::new(r.read_f32()?, r.read_f32()?, r.read_f32()?))
}

fn read_brush(r: &mut ProgressiveReader<'_>) -> CodecResult<BrushSpec> {
    let handle = r.read_i32()?;
    let color = Rgba::from_i32(r.read_i32()?);
    let width = r.read_f64()?;
    Ok(BrushSpec::new(handle, Brush::new(color, width)))
}

fn read_rect(r: &mut ProgressiveReader<'_>) -> CodecResult<Rect> {
    Ok(Rect::new(r.read_f64()?, r.read_f64()?, r.read_f64()?, r.read_f64()?))
}

fn decode_payload(ty: ActionType, r: &mut ProgressiveReader<'_>) -> CodecResult<ActionKind> {
    let kind = match ty {
        ActionType::ToolBegin => ActionKind::ToolBegin(read_point(r)?),
        ActionType::ToolExecute => ActionKind::ToolExecute(read_point(r)?),
        ActionType::ToolEnd => ActionKind::ToolEnd(read_point(r)?),
        ActionType::ExtendView => ActionKind::ExtendView {
            origin: Point::new(r.read_f64()?, r.read_f64()?),
            size: Size::new(r.read_f64()?, r.read_f64()?),
        },
        ActionType::Key => ActionKind::Key,
        ActionType::Undo => ActionKind::Undo,
        ActionType::Redo => ActionKind::Redo,
        ActionType::ClearShapes => ActionKind::ClearShapes,
        ActionType::Pan => ActionKind::Pan,
        ActionType::Zoom => ActionKind::Zoom(read_brush(r)?),
        ActionType::ZoomOut => ActionKind::ZoomOut,
        ActionType::Arrow => ActionKind::Arrow(read_brush(r)?),
        ActionType::Ellipse => ActionKind::Ellipse(read_brush(r)?),
        ActionType::Highlighter => ActionKind::Highlighter(read_brush(r)?),
        ActionType::Latex => ActionKind::Latex(r.read_i32()?),
        ActionType::Line => ActionKind::Line(read_brush(r)?),
        ActionType::Pen => ActionKind::Pen(read_brush(r)?),
        ActionType::Pointer => ActionKind::Pointer(read_brush(r)?),
        ActionType::Rectangle => ActionKind::Rectangle(read_brush(r)?),
        ActionType::Rubber => ActionKind::Rubber(r.read_i32()?),
        ActionType::Text => ActionKind::Text(r.read_i32()?),
        ActionType::TextChange => ActionKind::TextChange {
            handle: r.read_i32()?,
            text: r.read_prefixed_string()?,
        },
        ActionType::TextFontChange => {
            let handle = r.read_i32()?;
            let color = Rgba::from_i32(r.read_i32()?);
            let size = r.read_f64()?;
            let flags = r.read_i8()?;
            let mut font = TextFont {
                family: String::new(),
                size,
                bold: false,
                italic: false,
            };
            font.set_flags(flags);
            font.family = r.read_prefixed_string()?;
            ActionKind::TextFontChange { handle, color, font }
        }
        ActionType::TextMove => ActionKind::TextMove {
            handle: r.read_i32()?,
            position: Point::new(r.read_f64()?, r.read_f64()?),
        },
        ActionType::TextRemove => ActionKind::TextRemove(r.read_i32()?),
        ActionType::TextHighlight => {
            let handle = r.read_i32()?;
            let color = Rgba::from_i32(r.read_i32()?);
            let byte_len = checked_length(r.read_i32()?, "highlight rects")?;
            if byte_len % RECT_LEN != 0 {
                return Err(CodecError::Corrupt(format!(
                    "highlight rect block of {byte_len} bytes is not a multiple of {RECT_LEN}"
                )));
            }
            let mut block = r.sub_reader(byte_len)?;
            let mut rects = Vec::with_capacity(byte_len / RECT_LEN);
            while !block.is_exhausted() {
                rects.push(read_rect(&mut block)?);
            }
            ActionKind::TextHighlight { handle, color, rects }
        }
        ActionType::DeleteShape => ActionKind::DeleteShape(r.read_i32()?),
    };
    Ok(kind)
}

fn put_point(w: &mut FrameWriter, p: &PenPoint) {
    w.put_f32(p.x);
    w.put_f32(p.y);
    w.put_f32(p.pressure);
}

fn put_brush(w: &mut FrameWriter, spec: &BrushSpec) {
    w.put_i32(spec.handle);
    w.put_i32(spec.brush.color.to_i32());
    w.put_f64(spec.brush.width);
}

fn encode_payload(kind: &ActionKind, w: &mut FrameWriter) -> CodecResult<()> {
    match kind {
        ActionKind::ToolBegin(p) | ActionKind::ToolExecute(p) | ActionKind::ToolEnd(p) => put_point(w, p),
        ActionKind::ExtendView { origin, size } => {
            w.put_f64(origin.x);
            w.put_f64(origin.y);
            w.put_f64(size.width);
            w.put_f64(size.height);
        }
        ActionKind::Key
        | ActionKind::Undo
        | ActionKind::Redo
        | ActionKind::ClearShapes
        | ActionKind::Pan
        | ActionKind::ZoomOut => {}
        ActionKind::Zoom(spec)
        | ActionKind::Arrow(spec)
        | ActionKind::Ellipse(spec)
        | ActionKind::Highlighter(spec)
        | ActionKind::Line(spec)
        | ActionKind::Pen(spec)
        | ActionKind::Pointer(spec)
        | ActionKind::Rectangle(spec) => put_brush(w, spec),
        ActionKind::Latex(handle)
        | ActionKind::Rubber(handle)
        | ActionKind::Text(handle)
        | ActionKind::TextRemove(handle)
        | ActionKind::DeleteShape(handle) => w.put_i32(*handle),
        ActionKind::TextChange { handle, text } => {
            w.put_i32(*handle);
            w.put_prefixed_string(text)?;
        }
        ActionKind::TextFontChange { handle, color, font } => {
            w.put_i32(*handle);
            w.put_i32(color.to_i32());
            w.put_f64(font.size);
            w.put_i8(font.flags());
            w.put_prefixed_string(&font.family)?;
        }
        ActionKind::TextMove { handle, position } => {
            w.put_i32(*handle);
            w.put_f64(position.x);
            w.put_f64(position.y);
        }
        ActionKind::TextHighlight { handle, color, rects } => {
            w.put_i32(*handle);
            w.put_i32(color.to_i32());
            w.put_len(rects.len() * RECT_LEN)?;
            for rect in rects {
                w.put_f64(rect.x0);
                w.put_f64(rect.y0);
                w.put_f64(rect.x1);
                w.put_f64(rect.y1);
            }
        }
    }
    Ok(())
}
