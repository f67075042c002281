use crate::error::GatewayError;

/// Longest text sent in a single PDU, in characters
pub const SINGLE_MESSAGE_LIMIT: usize = 160;

/// Characters carried by each segment of a longer text
pub const SEGMENT_LENGTH: usize = 140;

/// sar_total_segments is a single octet
pub const MAX_SEGMENTS: usize = 255;

/// Split `text` into the pieces submitted one PDU each.
///
/// Text of at most [`SINGLE_MESSAGE_LIMIT`] characters stays whole. Longer
/// text is cut every [`SEGMENT_LENGTH`] characters; the pieces concatenate back
/// to the original.
pub fn split(text: &str) -> Result<Vec<&str>, GatewayError> {
    let length = text.chars().count();
    if length <= SINGLE_MESSAGE_LIMIT {
        return Ok(vec![text]);
    }

    let count = length.div_ceil(SEGMENT_LENGTH);
    if count > MAX_SEGMENTS {
        return Err(GatewayError::local(format!(
            "text of {length} characters needs {count} segments, at most {MAX_SEGMENTS} are allowed"
        )));
    }

    let mut segments = Vec::with_capacity(count);
    let mut start = 0;
    for (position, (offset, _)) in text.char_indices().enumerate() {
        if position > 0 && position % SEGMENT_LENGTH == 0 {
            segments.push(&text[start..offset]);
            start = offset;
        }
    }
    segments.push(&text[start..]);
    Ok(segments)
}

/// Value of more_messages_to_send, inverted for SMSCs that read the flag the
/// other way round.
pub fn more_messages_to_send(more: bool, flip: bool) -> u8 {
    u8::from(more ^ flip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn text(length: usize) -> String {
        (0..length)
            .map(|n| char::from(b'a' + (n % 26) as u8))
            .collect()
    }

    #[test]
    fn short_text_is_not_split() {
        assert_eq!(split("").unwrap(), vec![""]);
        let limit = text(SINGLE_MESSAGE_LIMIT);
        assert_eq!(split(&limit).unwrap(), vec![limit.as_str()]);
    }

    #[test]
    fn long_text_is_cut_every_140_characters() {
        let original = text(300);
        let segments = split(&original).unwrap();
        let lengths: Vec<_> = segments.iter().map(|s| s.chars().count()).collect();
        assert_eq!(lengths, vec![140, 140, 20]);
        assert_eq!(segments.concat(), original);
    }

    #[test]
    fn segment_count_is_ceiling() {
        for length in [161, 280, 281, 420, 1000] {
            let original = text(length);
            let segments = split(&original).unwrap();
            assert_eq!(segments.len(), length.div_ceil(SEGMENT_LENGTH), "length {length}");
            assert_eq!(segments.concat(), original);
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        let original = "é".repeat(141) + &"ü".repeat(40);
        let segments = split(&original).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].chars().count(), 140);
        assert_eq!(segments[1].chars().count(), 41);
        assert_eq!(segments.concat(), original);
    }

    #[test]
    fn too_many_segments_is_a_local_error() {
        let allowed = text(MAX_SEGMENTS * SEGMENT_LENGTH);
        assert_eq!(split(&allowed).unwrap().len(), MAX_SEGMENTS);

        let err = split(&text(MAX_SEGMENTS * SEGMENT_LENGTH + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LocalApplication);
    }

    #[test]
    fn more_messages_flag_can_be_flipped() {
        assert_eq!(more_messages_to_send(false, false), 0);
        assert_eq!(more_messages_to_send(true, false), 1);
        assert_eq!(more_messages_to_send(false, true), 1);
        assert_eq!(more_messages_to_send(true, true), 0);
    }
}
