use std::collections::BTreeMap;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};
use secmatrix_xlsx::{
    C_FILE_NAME_DEFAULT, C_MIME_XLSX, SecMatrixError, SpecSecMatrixConfig, XlsxReportWriter,
    derive_builtin_code_label_map, read_assignment_rows_from_csv_bytes,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "secmatrix.xlsx.report.v2";
const C_BRIDGE_TRANSPORT: &str = "csv_bytes";

/// Render CSV assignment bytes into XLSX workbook bytes.
///
/// Returns `(xlsx_bytes, report)`; `report` holds the pivot counters and a
/// `warnings` list.
#[pyfunction]
#[pyo3(signature = (
    data,
    labels = None,
    sheet_name = None,
    if_replace_labels = false
))]
fn render_assignment_report<'py>(
    py: Python<'py>,
    data: &[u8],
    labels: Option<BTreeMap<String, String>>,
    sheet_name: Option<String>,
    if_replace_labels: bool,
) -> PyResult<(Bound<'py, PyBytes>, Bound<'py, PyDict>)> {
    let cfg = SpecSecMatrixConfig {
        sheet_name,
        if_replace_labels,
        labels: labels.unwrap_or_default(),
        ..Default::default()
    };
    cfg.validate().map_err(convert_error)?;

    let table = read_assignment_rows_from_csv_bytes(data).map_err(convert_error)?;
    let writer = XlsxReportWriter::new(cfg.code_label_map(), cfg.render_options());
    let (v_bytes, report) = writer.render_to_bytes(&table).map_err(convert_error)?;

    let dict_report = PyDict::new(py);
    for (c_key, n_count) in report.to_dict() {
        dict_report.set_item(c_key, n_count)?;
    }
    dict_report.set_item("warnings", report.warnings)?;

    Ok((PyBytes::new(py, &v_bytes), dict_report))
}

/// Built-in code to context-name table.
#[pyfunction]
fn builtin_labels() -> BTreeMap<String, String> {
    derive_builtin_code_label_map()
        .iter()
        .map(|(code, label)| (code.to_string(), label.to_string()))
        .collect()
}

fn convert_error(err: SecMatrixError) -> PyErr {
    match err {
        SecMatrixError::Source(_) | SecMatrixError::Config(_) => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

#[pymodule]
fn _secmatrix_xlsx_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(render_assignment_report, module)?)?;
    module.add_function(wrap_pyfunction!(builtin_labels, module)?)?;
    module.add("FILE_NAME", C_FILE_NAME_DEFAULT)?;
    module.add("MIME_TYPE", C_MIME_XLSX)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
