//! `secmatrix_xlsx` v1:
//! Security assignment matrix kernel.
//!
//! Turns long-format security object assignments into a styled XLSX pivot
//! (one row per user, one column per `(code, member)` pair).
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : rows/matrix/grid models and options
//! - `error`  : collaborator failure type
//! - `source` : CSV / Arrow IPC ingestion
//! - `pivot`  : pure pivot renderer
//! - `util`   : pure helper functions
//! - `config` : TOML configuration
//! - `writer` : grid sink and XLSX writer
pub mod conf;
pub mod config;
pub mod error;
pub mod pivot;
pub mod source;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_FILE_NAME_DEFAULT, C_MIME_XLSX, C_SHEET_NAME_DEFAULT, TUP_BUILTIN_CODE_LABELS,
    derive_builtin_code_label_map, derive_default_render_options,
};
pub use config::SpecSecMatrixConfig;
pub use error::{Result, SecMatrixError};
pub use pivot::{build_pivot_matrix, enumerate_columns, plan_column_groups, render_output_grid};
pub use source::{
    normalize_field_name, read_assignment_rows_from_csv_bytes, read_assignment_rows_from_dataframe,
    read_assignment_rows_from_ipc_bytes, read_assignment_rows_from_path,
};
pub use spec::{
    EnumGridStyle, SpecAssignmentRow, SpecAssignmentTable, SpecCellFormat, SpecCodeLabelMap,
    SpecColumnGroup, SpecColumnKey, SpecGridCaptions, SpecGridFormats, SpecOutputGrid,
    SpecPivotMatrix, SpecPivotReport, SpecRenderOptions,
};
pub use writer::{GridSink, XlsxGridSink, XlsxReportWriter, write_output_grid};
