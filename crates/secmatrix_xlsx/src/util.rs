//! Stateless helper utilities used by the pivot renderer and XLSX sink.

use crate::conf::{
    C_SHEET_NAME_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::error::{Result, SecMatrixError};

////////////////////////////////////////////////////////////////////////////////
// #region RunDetection

/// Split `values` into maximal runs of equal adjacent items.
///
/// Returns inclusive `(start, end)` index pairs covering every position.
pub fn derive_contiguous_runs<T: PartialEq>(values: &[T]) -> Vec<(usize, usize)> {
    let mut l_runs = Vec::new();
    let mut n_idx_start = 0;

    while n_idx_start < values.len() {
        let mut n_idx_end = n_idx_start;
        while n_idx_end + 1 < values.len() && values[n_idx_end + 1] == values[n_idx_start] {
            n_idx_end += 1;
        }
        l_runs.push((n_idx_start, n_idx_end));
        n_idx_start = n_idx_end + 1;
    }

    l_runs
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_DEFAULT.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Fail when a `height` x `width` grid cannot fit on one worksheet.
pub fn validate_grid_within_excel_limits(height: usize, width: usize) -> Result<()> {
    if height > N_NROWS_EXCEL_MAX || width > N_NCOLS_EXCEL_MAX {
        return Err(SecMatrixError::ExcelLimit {
            rows: height,
            cols: width,
        });
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Casting

pub(crate) fn cast_row_num(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| SecMatrixError::Xlsx(format!("row index overflow: {value}")))
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| SecMatrixError::Xlsx(format!("column index overflow: {value}")))
}

/// Whether `value` is an `#RRGGBB` color literal.
pub fn is_hex_color(value: &str) -> bool {
    let Some(c_digits) = value.strip_prefix('#') else {
        return false;
    };
    c_digits.len() == 6 && c_digits.chars().all(|chr| chr.is_ascii_hexdigit())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
