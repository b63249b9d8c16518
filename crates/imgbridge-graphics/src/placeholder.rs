//! Kitty Unicode placeholders.
//!
//! Instead of an APC placement, a client may draw an image by printing
//! U+10EEEE cells. The foreground color carries the image id and the
//! underline color the placement id (both as 24-bit `0xRRGGBB`). Combining
//! diacritics after each placeholder give the source row, the source column
//! and optionally the most significant byte of the image id.
//!
//! A missing row repeats the previous cell's row. A missing column continues
//! from the previous cell in the same row. A missing high byte repeats the
//! previous one.
//!
//! Reference: <https://sw.kovidgoyal.net/kitty/graphics-protocol/#unicode-placeholders>

mod diacritics;

use std::ops::Range;

pub use diacritics::ROW_COLUMN_DIACRITICS;

pub const IMAGE_PLACEHOLDER: char = '\u{10EEEE}';

/// A horizontal run of placeholder cells that shows one slice of an image row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFragment {
    /// Grid column of the first cell.
    pub dst_col: u32,
    /// Image row, in cells.
    pub src_row: u32,
    /// Image columns covered, in cells.
    pub src_range: Range<u32>,
    pub image_id: u32,
    pub placement_id: u32,
}

/// The number a row/column diacritic stands for.
pub fn diacritic_value(c: char) -> Option<u32> {
    ROW_COLUMN_DIACRITICS
        .binary_search(&c)
        .ok()
        .and_then(|i| u32::try_from(i).ok())
}

/// Position of one placeholder cell inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    index: u32,
    row: u32,
    col: u32,
    id_msb: u32,
}

/// Split a text run into image fragments.
///
/// `start_column` is the grid column of the first character of `text`.
/// Returns `None` when `text` does not start with [`IMAGE_PLACEHOLDER`], so
/// the caller can render it as ordinary text.
pub fn parse_placeholders(
    text: &str,
    start_column: u32,
    foreground: u32,
    underline: u32,
) -> Option<Vec<ImageFragment>> {
    if !text.starts_with(IMAGE_PLACEHOLDER) {
        return None;
    }

    let image_low = foreground & 0x00FF_FFFF;
    let placement_id = underline & 0x00FF_FFFF;

    let mut fragments: Vec<ImageFragment> = Vec::new();
    let mut prev: Option<Cell> = None;

    for (index, cell_text) in text.split(IMAGE_PLACEHOLDER).skip(1).enumerate() {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        let Some(cell) = decode_cell(index, cell_text, prev) else {
            log::warn!("invalid kitty placeholder cell {cell_text:?} at index {index}");
            continue;
        };
        prev = Some(cell);

        let image_id = (cell.id_msb << 24) | image_low;
        let dst_col = start_column.saturating_add(cell.index);

        if let Some(last) = fragments.last_mut() {
            let len = last.src_range.end - last.src_range.start;
            let contiguous = last.image_id == image_id
                && last.src_row == cell.row
                && last.src_range.end == cell.col
                && last.dst_col.saturating_add(len) == dst_col;
            if contiguous {
                last.src_range.end += 1;
                continue;
            }
        }

        fragments.push(ImageFragment {
            dst_col,
            src_row: cell.row,
            src_range: cell.col..cell.col.saturating_add(1),
            image_id,
            placement_id,
        });
    }

    Some(fragments)
}

/// Decode the diacritics following one placeholder.
fn decode_cell(index: u32, diacritics: &str, prev: Option<Cell>) -> Option<Cell> {
    let values = diacritics
        .chars()
        .map(diacritic_value)
        .collect::<Option<Vec<u32>>>()?;
    // At most row, column and high byte.
    if values.len() > 3 {
        return None;
    }
    let row = values.first().copied();
    let col = values.get(1).copied();
    let id_msb = values.get(2).copied();
    if id_msb.is_some_and(|b| b > 0xFF) {
        return None;
    }

    let prev_in_row = prev.filter(|p| row.is_none_or(|r| r == p.row));
    let row = row.or(prev.map(|p| p.row)).unwrap_or(0);
    let col = col
        .or(prev_in_row.map(|p| p.col.saturating_add(1)))
        .unwrap_or(0);
    let id_msb = id_msb.or(prev.map(|p| p.id_msb)).unwrap_or(0);

    Some(Cell {
        index,
        row,
        col,
        id_msb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: usize) -> char {
        ROW_COLUMN_DIACRITICS[n]
    }

    fn cell(row: usize, col: usize) -> String {
        [IMAGE_PLACEHOLDER, d(row), d(col)].iter().collect()
    }

    #[test]
    fn table_is_sorted_for_binary_search() {
        assert!(ROW_COLUMN_DIACRITICS.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(diacritic_value('\u{0305}'), Some(0));
        assert_eq!(diacritic_value('\u{030D}'), Some(1));
        assert_eq!(diacritic_value('a'), None);
    }

    #[test]
    fn plain_text_is_not_a_placeholder() {
        assert_eq!(parse_placeholders("hello", 0, 1, 0), None);
    }

    #[test]
    fn consecutive_columns_form_one_fragment() {
        let text = format!("{}{}{}", cell(2, 0), cell(2, 1), cell(2, 2));
        let fragments = parse_placeholders(&text, 10, 0x00_00_07, 0x00_00_03).unwrap();
        assert_eq!(
            fragments,
            vec![ImageFragment {
                dst_col: 10,
                src_row: 2,
                src_range: 0..3,
                image_id: 7,
                placement_id: 3,
            }]
        );
    }

    #[test]
    fn column_jump_starts_new_fragment() {
        let text = format!("{}{}{}", cell(0, 0), cell(0, 1), cell(0, 5));
        let fragments = parse_placeholders(&text, 0, 1, 0).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].src_range, 0..2);
        assert_eq!(fragments[1].dst_col, 2);
        assert_eq!(fragments[1].src_range, 5..6);
    }

    #[test]
    fn bare_placeholders_continue_previous_cell() {
        let text = format!("{}{IMAGE_PLACEHOLDER}{IMAGE_PLACEHOLDER}", cell(4, 1));
        let fragments = parse_placeholders(&text, 0, 1, 0).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].src_row, 4);
        assert_eq!(fragments[0].src_range, 1..4);
    }

    #[test]
    fn first_bare_placeholder_is_origin() {
        let text: String = [IMAGE_PLACEHOLDER; 2].iter().collect();
        let fragments = parse_placeholders(&text, 0, 1, 0).unwrap();
        assert_eq!(fragments[0].src_row, 0);
        assert_eq!(fragments[0].src_range, 0..2);
    }

    #[test]
    fn image_id_comes_from_colors() {
        let text: String = [IMAGE_PLACEHOLDER, d(0), d(0), d(2)].iter().collect();
        let fragments = parse_placeholders(&text, 0, 0x12_34_56, 0xAB_CD_EF).unwrap();
        assert_eq!(fragments[0].image_id, 0x0212_3456);
        assert_eq!(fragments[0].placement_id, 0x00AB_CDEF);
    }

    #[test]
    fn invalid_cell_is_skipped_but_keeps_its_column() {
        let text = format!("{}{IMAGE_PLACEHOLDER}x{}", cell(0, 0), cell(0, 2));
        let fragments = parse_placeholders(&text, 0, 1, 0).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].dst_col, 2);
        assert_eq!(fragments[1].src_range, 2..3);
    }

    #[test]
    fn high_byte_past_255_is_invalid() {
        let text: String = [IMAGE_PLACEHOLDER, d(0), d(0), d(256)].iter().collect();
        assert_eq!(parse_placeholders(&text, 0, 1, 0), Some(Vec::new()));
    }

    #[test]
    fn new_row_without_column_starts_at_zero() {
        let row_only: String = [IMAGE_PLACEHOLDER, d(1)].iter().collect();
        let text = format!("{}{row_only}", cell(0, 3));
        let fragments = parse_placeholders(&text, 0, 1, 0).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].src_row, 1);
        assert_eq!(fragments[1].src_range, 0..1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn fragments_cover_every_valid_cell(
                cells in prop::collection::vec((0usize..297, 0usize..297), 1..40),
                start in 0u32..200,
            ) {
                let text: String = cells.iter().map(|&(r, c)| cell(r, c)).collect();
                let fragments = parse_placeholders(&text, start, 1, 0).unwrap();
                let covered: u32 = fragments
                    .iter()
                    .map(|f| f.src_range.end - f.src_range.start)
                    .sum();
                prop_assert_eq!(covered as usize, cells.len());
            }

            #[test]
            fn parser_never_panics(text in "\\PC{0,64}", fg in any::<u32>(), ul in any::<u32>()) {
                let with_marker = format!("{IMAGE_PLACEHOLDER}{text}");
                let _ = parse_placeholders(&with_marker, 0, fg, ul);
            }
        }
    }
}
