//! Tabular data source adapter: CSV / Arrow IPC payloads into assignment rows.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::{AnyValue, Column, CsvReadOptions, DataFrame, IpcReader, SerReader};
use tracing::{debug, warn};

use crate::conf::{
    C_FIELD_MEMBER_NAME, C_FIELD_MEMBER_VALUE, C_FIELD_OPERATION, C_FIELD_SECURITY_OBJECT_CODE,
    C_FIELD_USER, TUP_FIELD_RENAMES,
};
use crate::error::{Result, SecMatrixError};
use crate::spec::{SpecAssignmentRow, SpecAssignmentTable};

const TUP_FIELDS_REQUIRED: [&str; 5] = [
    C_FIELD_USER,
    C_FIELD_SECURITY_OBJECT_CODE,
    C_FIELD_MEMBER_VALUE,
    C_FIELD_MEMBER_NAME,
    C_FIELD_OPERATION,
];

const TUP_IPC_EXTENSIONS: [&str; 3] = ["arrow", "ipc", "feather"];

const V_UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Map a raw extract field name to its canonical name.
///
/// Unknown names (including canonical ones) pass through trimmed.
pub fn normalize_field_name(name: &str) -> &str {
    let c_name = name.trim();
    TUP_FIELD_RENAMES
        .iter()
        .find(|(c_raw, _)| *c_raw == c_name)
        .map_or(c_name, |(_, c_canonical)| *c_canonical)
}

/// Read rows from a CSV payload with a header line.
///
/// Blank payloads produce an empty table. Every column is read as text.
pub fn read_assignment_rows_from_csv_bytes(v_csv: &[u8]) -> Result<SpecAssignmentTable> {
    let v_csv = v_csv.strip_prefix(V_UTF8_BOM).unwrap_or(v_csv);
    if v_csv.iter().all(u8::is_ascii_whitespace) {
        debug!("blank CSV payload; no assignment rows");
        return Ok(SpecAssignmentTable::default());
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(v_csv.to_vec()))
        .finish()
        .map_err(|err| SecMatrixError::Source(format!("CSV parse failed: {err}")))?;

    read_assignment_rows_from_dataframe(&df)
}

/// Read rows from an Arrow IPC file payload.
pub fn read_assignment_rows_from_ipc_bytes(v_ipc: &[u8]) -> Result<SpecAssignmentTable> {
    let df = IpcReader::new(Cursor::new(v_ipc.to_vec()))
        .finish()
        .map_err(|err| SecMatrixError::Source(format!("IPC parse failed: {err}")))?;

    read_assignment_rows_from_dataframe(&df)
}

/// Read rows from a file, choosing IPC for `.arrow`/`.ipc`/`.feather` and CSV otherwise.
pub fn read_assignment_rows_from_path(path: &Path) -> Result<SpecAssignmentTable> {
    let v_bytes = std::fs::read(path).map_err(|source| SecMatrixError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let if_is_ipc = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            TUP_IPC_EXTENSIONS
                .iter()
                .any(|c_ext| ext.eq_ignore_ascii_case(c_ext))
        });

    debug!(path = %path.display(), if_is_ipc, "reading assignment source");
    if if_is_ipc {
        read_assignment_rows_from_ipc_bytes(&v_bytes)
    } else {
        read_assignment_rows_from_csv_bytes(&v_bytes)
    }
}

/// Normalize a dataframe into assignment rows.
///
/// A missing field yields empty strings on every row plus one warning; null
/// cells become empty strings.
pub fn read_assignment_rows_from_dataframe(df: &DataFrame) -> Result<SpecAssignmentTable> {
    let mut table = SpecAssignmentTable::default();

    let l_colnames_df: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();

    let mut l_cols_by_field: Vec<Option<&Column>> = Vec::with_capacity(TUP_FIELDS_REQUIRED.len());
    for c_field in TUP_FIELDS_REQUIRED {
        let c_colname_source = l_colnames_df
            .iter()
            .find(|c_name| normalize_field_name(c_name) == c_field);

        match c_colname_source {
            Some(c_name) => l_cols_by_field.push(Some(df.column(c_name)?)),
            None => {
                warn!(field = c_field, "assignment field missing; using empty values");
                table.warn(format!(
                    "Missing field {c_field:?}; treated as empty for every row."
                ));
                l_cols_by_field.push(None);
            }
        }
    }

    let n_height_df = df.height();
    table.rows.reserve(n_height_df);
    for n_idx_row in 0..n_height_df {
        let mut l_values = Vec::with_capacity(l_cols_by_field.len());
        for col in &l_cols_by_field {
            let c_value = match col {
                Some(col) => derive_text_from_any_value(col.get(n_idx_row)?),
                None => String::new(),
            };
            l_values.push(c_value);
        }

        let mut it_values = l_values.into_iter();
        let mut take_next = || it_values.next().unwrap_or_default();
        table.rows.push(SpecAssignmentRow {
            user: take_next(),
            security_object_code: take_next(),
            member_value: take_next(),
            member_name: take_next(),
            operation: take_next(),
        });
    }

    debug!(
        cnt_rows = table.rows.len(),
        cnt_warnings = table.warnings.len(),
        "assignment rows normalized"
    );
    Ok(table)
}

fn derive_text_from_any_value(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(val) => val.to_string(),
        AnyValue::StringOwned(val) => val.to_string(),
        _ => value.to_string(),
    }
}

impl SpecAssignmentTable {
    fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}
