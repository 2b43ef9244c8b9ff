//! Recorded pages: a baseline and a playback action list per page.
//!
//! Record layout: `i32 pageNumber | i32 timestamp | i32 staticLen | actions |
//! i32 playbackLen | actions`. A buffer of records repeats
//! `i32 outerLen | record` until exhausted.

use super::{CodecError, CodecResult, FrameWriter, ProgressiveReader, encode_action, read_action};
use crate::action::Action;
use crate::config::{CodecConfig, CorruptLengthPolicy};
use crate::stream::RecordedPage;

impl RecordedPage {
    /// Encode the record body, without an outer length.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut w = FrameWriter::new();
        w.put_i32(self.page_number);
        w.put_i32(self.timestamp);
        put_action_block(&mut w, &self.static_actions)?;
        put_action_block(&mut w, &self.playback_actions)?;
        Ok(w.into_inner())
    }
}

fn put_action_block(w: &mut FrameWriter, actions: &[Action]) -> CodecResult<()> {
    let mut block = Vec::new();
    for action in actions {
        block.extend(encode_action(action)?);
    }
    w.put_len(block.len())?;
    w.put_bytes(&block);
    Ok(())
}

/// Encode records back to back, each behind its outer length.
pub fn encode_records(pages: &[RecordedPage]) -> CodecResult<Vec<u8>> {
    let mut w = FrameWriter::new();
    for page in pages {
        let body = page.encode()?;
        w.put_len(body.len())?;
        w.put_bytes(&body);
    }
    Ok(w.into_inner())
}

/// Read one record body; `reader` must span exactly the record.
pub fn read_recorded_page(reader: &mut ProgressiveReader<'_>, config: &CodecConfig) -> CodecResult<RecordedPage> {
    let page_number = reader.read_i32()?;
    let timestamp = reader.read_i32()?;
    let static_actions = read_action_block(reader, config, "static")?;
    let playback_actions = read_action_block(reader, config, "playback")?;
    if !reader.is_exhausted() {
        return Err(CodecError::LengthMismatch {
            declared: reader.len(),
            consumed: reader.offset(),
        });
    }
    Ok(RecordedPage::new(page_number, timestamp, static_actions, playback_actions))
}

fn read_action_block(
    reader: &mut ProgressiveReader<'_>,
    config: &CodecConfig,
    which: &str,
) -> CodecResult<Vec<Action>> {
    let declared = reader.read_i32()?;
    let len = usize::try_from(declared).map_err(|_| {
        log::warn!("Negative {which} block length {declared} in recorded page");
        CodecError::Corrupt(format!("negative {which} block length {declared}"))
    })?;
    let mut block = reader.sub_reader(len)?;
    let mut actions = Vec::new();
    while !block.is_exhausted() {
        if let Some(action) = read_action(&mut block, config)? {
            actions.push(action);
        }
    }
    Ok(actions)
}

/// Decode every record in `data`.
///
/// A negative length is corruption: with [`CorruptLengthPolicy::Abort`]
/// decoding fails, with [`CorruptLengthPolicy::Truncate`] the records read
/// so far are returned.
pub fn decode_records(data: &[u8], config: &CodecConfig) -> CodecResult<Vec<RecordedPage>> {
    let mut reader = ProgressiveReader::new(data);
    let mut pages = Vec::new();

    while !reader.is_exhausted() {
        let outer = reader.read_i32()?;
        let Ok(len) = usize::try_from(outer) else {
            log::warn!(
                "Negative record length {outer} at offset {} after {} records",
                reader.offset() - 4,
                pages.len()
            );
            match config.corrupt_length {
                CorruptLengthPolicy::Abort => {
                    return Err(CodecError::Corrupt(format!("negative record length {outer}")));
                }
                CorruptLengthPolicy::Truncate => break,
            }
        };

        let mut record = reader.sub_reader(len)?;
        match read_recorded_page(&mut record, config) {
            Ok(page) => pages.push(page),
            Err(CodecError::Corrupt(reason)) if config.corrupt_length == CorruptLengthPolicy::Truncate => {
                log::warn!("Stopping after {} records: {reason}", pages.len());
                break;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, BrushSpec, PenPoint};
    use crate::shapes::Brush;

    fn sample_page(number: i32) -> RecordedPage {
        RecordedPage::new(
            number,
            100,
            vec![
                Action::with_timestamp(ActionKind::Pen(BrushSpec::new(1, Brush::default())), 1),
                Action::with_timestamp(ActionKind::ToolBegin(PenPoint::new(0.1, 0.1, 1.0)), 2),
                Action::with_timestamp(ActionKind::ToolEnd(PenPoint::new(0.2, 0.2, 1.0)), 3),
            ],
            vec![Action::with_timestamp(ActionKind::Undo, 4)],
        )
    }

    #[test]
    fn test_empty_blocks() {
        let mut data = Vec::new();
        data.extend(16i32.to_be_bytes());
        data.extend(2i32.to_be_bytes());
        data.extend(55i32.to_be_bytes());
        data.extend(0i32.to_be_bytes());
        data.extend(0i32.to_be_bytes());

        let pages = decode_records(&data, &CodecConfig::default()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 2);
        assert_eq!(pages[0].timestamp, 55);
        assert!(pages[0].static_actions.is_empty());
        assert!(pages[0].playback_actions.is_empty());
    }

    #[test]
    fn test_records_roundtrip() {
        let pages = vec![sample_page(0), sample_page(3)];
        let data = encode_records(&pages).unwrap();
        assert_eq!(decode_records(&data, &CodecConfig::default()).unwrap(), pages);
        assert!(decode_records(&[], &CodecConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_negative_outer_length_policies() {
        let mut data = encode_records(&[sample_page(0)]).unwrap();
        data.extend((-5i32).to_be_bytes());
        data.extend([1, 2, 3]);

        let abort = CodecConfig::default();
        assert!(matches!(decode_records(&data, &abort), Err(CodecError::Corrupt(_))));

        let truncate = CodecConfig {
            corrupt_length: CorruptLengthPolicy::Truncate,
            ..CodecConfig::default()
        };
        let pages = decode_records(&data, &truncate).unwrap();
        assert_eq!(pages, vec![sample_page(0)]);
    }

    #[test]
    fn test_negative_block_length() {
        let mut body = Vec::new();
        body.extend(1i32.to_be_bytes());
        body.extend(0i32.to_be_bytes());
        body.extend((-1i32).to_be_bytes());
        let mut data = (body.len() as i32).to_be_bytes().to_vec();
        data.extend(body);

        assert!(matches!(
            decode_records(&data, &CodecConfig::default()),
            Err(CodecError::Corrupt(_))
        ));
        let truncate = CodecConfig {
            corrupt_length: CorruptLengthPolicy::Truncate,
            ..CodecConfig::default()
        };
        assert!(decode_records(&data, &truncate).unwrap().is_empty());
    }

    #[test]
    fn test_outer_length_past_end() {
        let mut data = encode_records(&[sample_page(0)]).unwrap();
        let len = i32::from_be_bytes([data[0], data[1], data[2], data[3]]) + 10;
        data[..4].copy_from_slice(&len.to_be_bytes());
        assert!(matches!(
            decode_records(&data, &CodecConfig::default()),
            Err(CodecError::OutOfBounds { .. })
        ));
    }
}
