//! Stream action frames: `i32 length | u8 tag | payload`.

use super::{
    CodecError, CodecResult, FrameWriter, ProgressiveReader, STREAM_HEADER_LEN, checked_length, encode_action,
    read_action, read_recorded_page,
};
use crate::config::{CodecConfig, UnknownActionPolicy};
use crate::stream::{DocumentInfo, DocumentType, MediaKind, StreamAction, StreamActionType};

/// Decode a buffer holding exactly one stream frame, rejecting unknown tags.
pub fn decode_stream_action(data: &[u8]) -> CodecResult<StreamAction> {
    let mut reader = ProgressiveReader::new(data);
    let action = read_stream_action(&mut reader, &CodecConfig::default())?
        .ok_or_else(|| CodecError::Corrupt("unknown stream action skipped".to_string()))?;
    if !reader.is_exhausted() {
        return Err(CodecError::Corrupt(format!(
            "{} trailing bytes after stream frame",
            reader.remaining()
        )));
    }
    Ok(action)
}

/// Read one stream frame from `reader`.
///
/// Returns `Ok(None)` when the frame, or the page action it wraps, has an
/// unknown tag and the config asks to skip those.
pub fn read_stream_action(
    reader: &mut ProgressiveReader<'_>,
    config: &CodecConfig,
) -> CodecResult<Option<StreamAction>> {
    let declared = checked_length(reader.read_i32()?, "stream frame")?;
    if declared < STREAM_HEADER_LEN {
        return Err(CodecError::Corrupt("empty stream frame".to_string()));
    }
    if declared > config.max_frame_length {
        return Err(CodecError::FrameTooLarge {
            max: config.max_frame_length,
            got: declared,
        });
    }

    let mut frame = reader.sub_reader(declared)?;
    let tag = frame.read_u8()?;
    let Ok(action_type) = StreamActionType::try_from(tag) else {
        return match config.unknown_action {
            UnknownActionPolicy::Reject => Err(CodecError::NotImplemented { family: "stream action", tag }),
            UnknownActionPolicy::Skip => {
                log::debug!("Skipping stream frame with unknown tag {tag} ({declared} bytes)");
                Ok(None)
            }
        };
    };

    let Some(action) = decode_payload(action_type, &mut frame, config)? else {
        return Ok(None);
    };
    if !frame.is_exhausted() {
        return Err(CodecError::LengthMismatch {
            declared: declared - STREAM_HEADER_LEN,
            consumed: frame.offset() - STREAM_HEADER_LEN,
        });
    }
    Ok(Some(action))
}

fn read_document(r: &mut ProgressiveReader<'_>) -> CodecResult<DocumentInfo> {
    let id = r.read_i64()?;
    let raw_type = r.read_i8()?;
    let doc_type = DocumentType::try_from(raw_type)
        .map_err(|t| CodecError::Corrupt(format!("unknown document type {t}")))?;
    let title_len = checked_length(r.read_i32()?, "title")?;
    let name_len = checked_length(r.read_i32()?, "name")?;
    let checksum_len = checked_length(r.read_i32()?, "checksum")?;
    Ok(DocumentInfo {
        id,
        doc_type,
        title: r.read_string(title_len)?,
        name: r.read_string(name_len)?,
        checksum: r.read_string(checksum_len)?,
    })
}

fn decode_payload(
    ty: StreamActionType,
    r: &mut ProgressiveReader<'_>,
    config: &CodecConfig,
) -> CodecResult<Option<StreamAction>> {
    let action = match ty {
        StreamActionType::DocumentCreated => StreamAction::DocumentCreated(read_document(r)?),
        StreamActionType::DocumentClosed => StreamAction::DocumentClosed(read_document(r)?),
        StreamActionType::DocumentSelected => StreamAction::DocumentSelected(read_document(r)?),
        StreamActionType::PageCreated => StreamAction::PageCreated {
            document_id: r.read_i64()?,
            page_number: r.read_i32()?,
        },
        StreamActionType::PageDeleted => StreamAction::PageDeleted {
            document_id: r.read_i64()?,
            page_number: r.read_i32()?,
        },
        StreamActionType::PageSelected => StreamAction::PageSelected {
            document_id: r.read_i64()?,
            page_number: r.read_i32()?,
        },
        StreamActionType::PageAction => {
            let document_id = r.read_i64()?;
            let page_number = r.read_i32()?;
            let Some(action) = read_action(r, config)? else {
                return Ok(None);
            };
            StreamAction::PageAction {
                document_id,
                page_number,
                action,
            }
        }
        StreamActionType::PageActionsBulk => {
            let document_id = r.read_i64()?;
            let record_len = checked_length(r.read_i32()?, "recorded page")?;
            let mut record = r.sub_reader(record_len)?;
            StreamAction::PageActionsBulk {
                document_id,
                page: read_recorded_page(&mut record, config)?,
            }
        }
        StreamActionType::SpeechPublished => StreamAction::SpeechPublished {
            publisher_id: r.read_i64()?,
            display_name: r.read_prefixed_string()?,
        },
        StreamActionType::CameraChange => media_change(MediaKind::Camera, r)?,
        StreamActionType::MicrophoneChange => media_change(MediaKind::Audio, r)?,
        StreamActionType::ScreenShareChange => media_change(MediaKind::Screen, r)?,
    };
    Ok(Some(action))
}

fn media_change(kind: MediaKind, r: &mut ProgressiveReader<'_>) -> CodecResult<StreamAction> {
    Ok(StreamAction::MediaChange {
        kind,
        enabled: r.read_i8()? != 0,
    })
}

/// Encode a stream action as one complete frame, length prefix included.
pub fn encode_stream_action(action: &StreamAction) -> CodecResult<Vec<u8>> {
    let mut w = FrameWriter::with_capacity(32);
    w.put_u8(action.action_type() as u8);

    match action {
        StreamAction::DocumentCreated(info) | StreamAction::DocumentClosed(info) | StreamAction::DocumentSelected(info) => {
            w.put_i64(info.id);
            w.put_i8(info.doc_type as i8);
            w.put_len(info.title.len())?;
            w.put_len(info.name.len())?;
            w.put_len(info.checksum.len())?;
            w.put_bytes(info.title.as_bytes());
            w.put_bytes(info.name.as_bytes());
            w.put_bytes(info.checksum.as_bytes());
        }
        StreamAction::PageCreated {
            document_id,
            page_number,
        }
        | StreamAction::PageDeleted {
            document_id,
            page_number,
        }
        | StreamAction::PageSelected {
            document_id,
            page_number,
        } => {
            w.put_i64(*document_id);
            w.put_i32(*page_number);
        }
        StreamAction::PageAction {
            document_id,
            page_number,
            action,
        } => {
            w.put_i64(*document_id);
            w.put_i32(*page_number);
            w.put_bytes(&encode_action(action)?);
        }
        StreamAction::PageActionsBulk { document_id, page } => {
            w.put_i64(*document_id);
            let record = page.encode()?;
            w.put_len(record.len())?;
            w.put_bytes(&record);
        }
        StreamAction::SpeechPublished {
            publisher_id,
            display_name,
        } => {
            w.put_i64(*publisher_id);
            w.put_prefixed_string(display_name)?;
        }
        StreamAction::MediaChange { enabled, .. } => w.put_i8(i8::from(*enabled)),
    }

    w.finish_frame()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionKind, PenPoint};
    use crate::stream::RecordedPage;

    fn roundtrip(action: StreamAction) {
        let bytes = encode_stream_action(&action).unwrap();
        assert_eq!(decode_stream_action(&bytes).unwrap(), action);
    }

    #[test]
    fn test_media_change_is_six_bytes() {
        let action = StreamAction::MediaChange {
            kind: MediaKind::Camera,
            enabled: true,
        };
        let bytes = encode_stream_action(&action).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 2, StreamActionType::CameraChange as u8, 1]);
        assert_eq!(decode_stream_action(&bytes).unwrap(), action);
    }

    #[test]
    fn test_document_layout() {
        let info = DocumentInfo::new(7, DocumentType::Pdf, "Intro", "a.pdf");
        let bytes = encode_stream_action(&StreamAction::DocumentCreated(info.clone())).unwrap();
        // tag + id + type + three lengths + strings
        assert_eq!(bytes.len(), 4 + 1 + 8 + 1 + 12 + 5 + 5);
        assert_eq!(&bytes[5..13], &7i64.to_be_bytes());
        assert_eq!(bytes[13], 0);
        assert_eq!(decode_stream_action(&bytes).unwrap(), StreamAction::DocumentCreated(info));
    }

    #[test]
    fn test_zero_padded_title() {
        let mut bytes = encode_stream_action(&StreamAction::DocumentSelected(DocumentInfo::new(
            1,
            DocumentType::Whiteboard,
            "ab\0\0",
            "",
        )))
        .unwrap();
        let decoded = decode_stream_action(&bytes).unwrap();
        let StreamAction::DocumentSelected(info) = decoded else {
            panic!("wrong variant");
        };
        assert_eq!(info.title, "ab");

        // unknown document type
        bytes[13] = 9;
        assert!(matches!(decode_stream_action(&bytes), Err(CodecError::Corrupt(_))));
    }

    #[test]
    fn test_roundtrip_page_events() {
        roundtrip(StreamAction::PageSelected {
            document_id: 7,
            page_number: 2,
        });
        roundtrip(StreamAction::PageDeleted {
            document_id: i64::MAX,
            page_number: 0,
        });
        roundtrip(StreamAction::PageAction {
            document_id: 7,
            page_number: 1,
            action: Action::with_timestamp(ActionKind::ToolExecute(PenPoint::new(0.5, 0.5, 0.5)), 99),
        });
        roundtrip(StreamAction::PageActionsBulk {
            document_id: 7,
            page: RecordedPage::new(4, 12, vec![Action::new(ActionKind::ClearShapes)], Vec::new()),
        });
        roundtrip(StreamAction::SpeechPublished {
            publisher_id: -3,
            display_name: "Ada".to_string(),
        });
    }

    #[test]
    fn test_unknown_stream_tag() {
        let bytes = [0, 0, 0, 1, 42];
        assert_eq!(
            decode_stream_action(&bytes),
            Err(CodecError::NotImplemented {
                family: "stream action",
                tag: 42
            })
        );

        let config = CodecConfig {
            unknown_action: UnknownActionPolicy::Skip,
            ..CodecConfig::default()
        };
        let mut reader = ProgressiveReader::new(&bytes);
        assert_eq!(read_stream_action(&mut reader, &config).unwrap(), None);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_truncated_media_change() {
        let bytes = [0, 0, 0, 2, StreamActionType::ScreenShareChange as u8];
        assert!(matches!(
            decode_stream_action(&bytes),
            Err(CodecError::OutOfBounds { .. })
        ));
    }
}
