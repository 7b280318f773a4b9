//! Grid coordinates and the printable bounding box.
//!
//! `Position` is a zero-based (row, column) pair whose textual form is the
//! familiar letters-then-digits label (`A1`, `AB27`). Malformed labels and
//! out-of-bounds coordinates map to the single invalid sentinel rather
//! than an error, so positions can flow through formula rewriting and only
//! surface as `#REF!` at evaluation time.

use core::fmt;

use once_cell::sync::Lazy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const LETTERS: i32 = 26;

// Precomputed labels for A..=ZZ; wider columns fall back to the loop.
static COLUMN_LABELS: Lazy<Vec<String>> = Lazy::new(|| {
    let mut labels = Vec::with_capacity(702);
    for c in b'A'..=b'Z' {
        labels.push(String::from(c as char));
    }
    for c1 in b'A'..=b'Z' {
        for c2 in b'A'..=b'Z' {
            labels.push(format!("{}{}", c1 as char, c2 as char));
        }
    }
    labels
});

pub(crate) fn column_to_letters(col: i32) -> String {
    if (0..702).contains(&col) {
        return COLUMN_LABELS[col as usize].clone();
    }

    let mut col = col;
    let mut buf = Vec::new();
    loop {
        buf.push(b'A' + (col % LETTERS) as u8);
        col /= LETTERS;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    String::from_utf8(buf).expect("only ASCII A-Z")
}

/// Zero-based cell coordinate.
///
/// The derived ordering is lexicographic by `(row, col)`, which is the
/// order reference lists are kept in.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// Sentinel for a reference that points nowhere, e.g. after the rows
    /// it lived in were deleted.
    pub const INVALID: Self = Self { row: -1, col: -1 };

    pub const MAX_ROWS: i32 = 16_384;
    pub const MAX_COLS: i32 = 16_384;

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        (0..Self::MAX_ROWS).contains(&self.row) && (0..Self::MAX_COLS).contains(&self.col)
    }

    /// Parse a letters-then-digits label.
    ///
    /// Returns [`Position::INVALID`] for anything malformed: missing or
    /// lowercase letters, missing digits, trailing garbage, row `0`, or a
    /// coordinate outside the `MAX_ROWS`/`MAX_COLS` bounds.
    pub fn parse(s: &str) -> Self {
        let bytes = s.as_bytes();
        let letters = bytes
            .iter()
            .take_while(|b| b.is_ascii_uppercase())
            .count();
        if letters == 0 || letters == bytes.len() {
            return Self::INVALID;
        }

        // Base-26 with no zero digit: A..Z, AA..AZ, BA.. The +1 step
        // re-biases every letter after the first.
        let mut col: i32 = 0;
        for (idx, &b) in bytes[..letters].iter().enumerate() {
            if idx != 0 {
                col += 1;
            }
            col = col * LETTERS + i32::from(b - b'A');
            if col >= Self::MAX_COLS {
                return Self::INVALID;
            }
        }

        let mut row: i32 = 0;
        for &b in &bytes[letters..] {
            if !b.is_ascii_digit() {
                return Self::INVALID;
            }
            row = row * 10 + i32::from(b - b'0');
            if row > Self::MAX_ROWS {
                return Self::INVALID;
            }
        }
        if row == 0 {
            return Self::INVALID;
        }

        Self { row: row - 1, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return Ok(());
        }
        f.write_str(&column_to_letters(self.col))?;
        write!(f, "{}", self.row + 1)
    }
}

/// Printable bounding box of a sheet, in rows and columns.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_roundtrip() {
        for label in ["A1", "Z1", "AA1", "AZ10", "BA2", "ZZ99", "AAA1", "XFD16384"] {
            let pos = Position::parse(label);
            assert!(pos.is_valid(), "{label} should parse");
            assert_eq!(pos.to_string(), label);
        }
    }

    #[test]
    fn column_biasing() {
        assert_eq!(Position::parse("A1"), Position::new(0, 0));
        assert_eq!(Position::parse("Z1"), Position::new(0, 25));
        assert_eq!(Position::parse("AA1"), Position::new(0, 26));
        assert_eq!(Position::parse("AB27"), Position::new(26, 27));
        assert_eq!(Position::parse("BA1"), Position::new(0, 52));
    }

    #[test]
    fn malformed_labels_are_invalid() {
        for label in ["", "A", "1", "A0", "a1", "A1B", "1A", "A-1", "A 1", "Б1"] {
            assert_eq!(Position::parse(label), Position::INVALID, "{label:?}");
        }
    }

    #[test]
    fn out_of_bounds_labels_are_invalid() {
        assert_eq!(Position::parse("A16385"), Position::INVALID);
        assert_eq!(Position::parse("A99999999999999999"), Position::INVALID);
        assert_eq!(Position::parse("XFE1"), Position::INVALID);
        assert_eq!(Position::parse("AAAA1"), Position::INVALID);
    }

    #[test]
    fn bounds_check() {
        assert!(Position::new(0, 0).is_valid());
        assert!(Position::new(Position::MAX_ROWS - 1, Position::MAX_COLS - 1).is_valid());
        assert!(!Position::new(Position::MAX_ROWS, 0).is_valid());
        assert!(!Position::new(0, Position::MAX_COLS).is_valid());
        assert!(!Position::INVALID.is_valid());
    }

    #[test]
    fn invalid_renders_empty() {
        assert_eq!(Position::INVALID.to_string(), "");
        assert_eq!(Position::new(-1, 3).to_string(), "");
    }

    #[test]
    fn ordering_is_row_major() {
        let mut positions = vec![
            Position::new(1, 0),
            Position::new(0, 2),
            Position::new(0, 1),
            Position::new(2, 0),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(1, 0),
                Position::new(2, 0),
            ]
        );
    }

    #[test]
    fn wide_column_labels() {
        assert_eq!(column_to_letters(701), "ZZ");
        assert_eq!(column_to_letters(702), "AAA");
        assert_eq!(Position::parse("AAA1").col, 702);
    }
}
