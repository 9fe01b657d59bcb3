//! A1 notation helpers (0-based rows and columns).

use crate::grid::GridError;
use crate::range::Range;

/// Convert a 0-based column index to letters (0 -> A, 25 -> Z, 26 -> AA).
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut c = col;
    loop {
        result.insert(0, (b'A' + (c % 26) as u8) as char);
        if c < 26 {
            break;
        }
        c = c / 26 - 1;
    }
    result
}

/// Convert column letters to a 0-based index. Case-insensitive.
pub fn letter_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
    }
    Some(col - 1)
}

/// Convert 0-based row/col to A1 notation (0,0 -> A1)
pub fn cell_to_a1(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// Convert 0-based range to A1 notation
pub fn range_to_a1(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> String {
    if start_row == end_row && start_col == end_col {
        cell_to_a1(start_row, start_col)
    } else {
        format!("{}:{}", cell_to_a1(start_row, start_col), cell_to_a1(end_row, end_col))
    }
}

/// Parse a single cell reference such as `D5` or `$D$5`.
pub fn parse_a1_cell(text: &str) -> Result<(usize, usize), GridError> {
    let invalid = || GridError::InvalidAddress(text.to_string());
    let cleaned: String = text.trim().chars().filter(|c| *c != '$').collect();
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (letters, digits) = cleaned.split_at(split);
    let col = letter_to_col(letters).ok_or_else(invalid)?;
    let row: usize = digits.parse().map_err(|_| invalid())?;
    if row == 0 {
        return Err(invalid());
    }
    Ok((row - 1, col))
}

/// Sheet-qualified address, quoting the sheet name unless it is a plain
/// identifier. Inverse of [`parse_a1_range`].
pub fn qualified_a1(sheet: &str, range: &Range) -> String {
    let plain = !sheet.is_empty()
        && !sheet.starts_with(|c: char| c.is_ascii_digit())
        && sheet.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        format!("{}!{}", sheet, range.to_a1())
    } else {
        format!("'{}'!{}", sheet.replace('\'', "''"), range.to_a1())
    }
}

/// Parse a range address, optionally sheet-qualified (`'My Sheet'!A1:B3`).
///
/// Returns the sheet name when one was present.
pub fn parse_a1_range(text: &str) -> Result<(Option<String>, Range), GridError> {
    let (sheet, body) = match text.rsplit_once('!') {
        Some((sheet, body)) => {
            let sheet = sheet.trim().trim_matches('\'').replace("''", "'");
            (Some(sheet), body)
        }
        None => (None, text),
    };
    let range = match body.split_once(':') {
        Some((start, end)) => {
            let (r1, c1) = parse_a1_cell(start)?;
            let (r2, c2) = parse_a1_cell(end)?;
            Range::new(r1, c1, r2, c2)
        }
        None => {
            let (r, c) = parse_a1_cell(body)?;
            Range::single(r, c)
        }
    };
    Ok((sheet, range))
}
