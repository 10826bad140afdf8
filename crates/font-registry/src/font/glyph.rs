//! Composite glyph inspection.

use crate::{errors::ParseError, font::TableTag, reader::TableReader};

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Extracts the glyph indices referenced by a composite glyph. Returns an empty
/// list for empty and simple glyphs.
pub(crate) fn component_indices(data: &[u8]) -> Result<Vec<u16>, ParseError> {
    if data.is_empty() {
        return Ok(vec![]);
    }
    let mut reader = TableReader::for_table(data, TableTag::GLYF);
    let contour_count = reader.read_i16()?;
    if contour_count >= 0 {
        return Ok(vec![]);
    }
    reader.skip(8)?; // bounding box

    let mut components = vec![];
    loop {
        let flags = reader.read_u16()?;
        components.push(reader.read_u16()?);

        let mut arg_len = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            4
        } else {
            2
        };
        if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            arg_len += 8;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            arg_len += 4;
        } else if flags & WE_HAVE_A_SCALE != 0 {
            arg_len += 2;
        }
        reader.skip(arg_len)?;

        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseErrorKind;

    fn composite_glyph(components: &[(u16, u16, &[u8])]) -> Vec<u8> {
        let mut data = (-1_i16).to_be_bytes().to_vec();
        data.extend_from_slice(&[0; 8]); // bounding box
        for (flags, glyph, args) in components {
            data.extend_from_slice(&flags.to_be_bytes());
            data.extend_from_slice(&glyph.to_be_bytes());
            data.extend_from_slice(args);
        }
        data
    }

    #[test]
    fn empty_and_simple_glyphs_have_no_components() {
        assert_eq!(component_indices(&[]).unwrap(), []);

        let mut simple = 1_i16.to_be_bytes().to_vec();
        simple.extend_from_slice(&[0; 10]);
        assert_eq!(component_indices(&simple).unwrap(), []);
    }

    #[test]
    fn walking_composite_components() {
        let data = composite_glyph(&[
            (MORE_COMPONENTS | ARG_1_AND_2_ARE_WORDS, 5, &[0; 4]),
            (MORE_COMPONENTS | WE_HAVE_A_SCALE, 7, &[0; 4]),
            (WE_HAVE_A_TWO_BY_TWO | ARG_1_AND_2_ARE_WORDS, 9, &[0; 12]),
        ]);
        assert_eq!(component_indices(&data).unwrap(), [5, 7, 9]);
    }

    #[test]
    fn truncated_composite_fails() {
        let data = composite_glyph(&[(MORE_COMPONENTS, 5, &[0; 2])]);
        let err = component_indices(&data).unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::UnexpectedEof), "{err}");
    }
}
