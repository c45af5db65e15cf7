//! Constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecCodeLabelMap, SpecGridFormats, SpecRenderOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Default output sheet name.
pub const C_SHEET_NAME_DEFAULT: &str = "Assignments";
/// Download file name of the generated workbook.
pub const C_FILE_NAME_DEFAULT: &str = "Formatted_Security_Assignment.xlsx";
/// MIME type of the generated workbook.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Presence marker stored in the pivot matrix.
pub const C_ASSIGNMENT_MARKER: &str = "*";
/// Text written into assigned cells.
pub const C_CELL_MARKER_TEXT: &str = "X";

/// Number of header rows above the data rows.
pub const N_ROWS_HEADER: usize = 3;
/// Default label-column width.
pub const N_WIDTH_LABEL_COL_DEFAULT: f64 = 25.0;
/// Default data-column width.
pub const N_WIDTH_DATA_COL_DEFAULT: f64 = 4.0;
/// Upper bound accepted for any column width.
pub const N_WIDTH_COL_MAX: f64 = 255.0;

/// Row 0 caption in the label column.
pub const C_CAPTION_CONTEXT_NAME: &str = "Fusion Security Context Name";
/// Row 1 caption in the label column.
pub const C_CAPTION_OBJECT_CODE: &str = "Security Object Code";
/// Row 2 caption in the label column.
pub const C_CAPTION_USER: &str = "User";

/// Fill of even-indexed group headers.
pub const C_COLOR_GROUP_PRIMARY: &str = "#FCE4D6";
/// Fill of odd-indexed group headers.
pub const C_COLOR_GROUP_ALTERNATE: &str = "#D9E1F2";
/// Fill of marker cells.
pub const C_COLOR_MARKER: &str = "#BDD7EE";

////////////////////////////////////////////////////////////////////////////////
// #region FieldNames

/// Canonical field: user.
pub const C_FIELD_USER: &str = "User";
/// Canonical field: security object code.
pub const C_FIELD_SECURITY_OBJECT_CODE: &str = "Security Object Code";
/// Canonical field: member value.
pub const C_FIELD_MEMBER_VALUE: &str = "Member Value";
/// Canonical field: member name.
pub const C_FIELD_MEMBER_NAME: &str = "Member Name";
/// Canonical field: operation.
pub const C_FIELD_OPERATION: &str = "Operation";

/// Raw extract field names and their canonical replacements.
pub const TUP_FIELD_RENAMES: [(&str, &str); 5] = [
    ("USERNAME", C_FIELD_USER),
    ("SEC_OBJ_CODE", C_FIELD_SECURITY_OBJECT_CODE),
    ("SEC_OBJ_MEMBER_VAL", C_FIELD_MEMBER_VALUE),
    ("SEC_OBJ_MEMBER_NAME", C_FIELD_MEMBER_NAME),
    ("OPERATION", C_FIELD_OPERATION),
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BuiltinLabels

/// Built-in security object code to context name table.
pub const TUP_BUILTIN_CODE_LABELS: [(&str, &str); 18] = [
    ("OA4F_SEC_FIN_AP_BUSINESSUNIT_LIST", "AP Business Units"),
    ("OA4F_SEC_FIN_AR_BUSINESSUNIT_LIST", "AR Business Units"),
    ("OA4F_SEC_CST_COST_ORG_LIST", "Cost Organizations"),
    ("OA4F_SEC_FIN_FA_ASSET_BOOK_LIST", "FA Asset Book"),
    ("OA4F_SEC_HCM_BUSINESSUNIT_LIST", "HCM Business Units"),
    ("OA4F_SEC_HCM_COUNTRY_LIST", "HCM Country List"),
    ("OA4F_SEC_HCM_DEPARTMENT_LIST", "HCM Departments"),
    ("OA4F_SEC_HCM_LEGAL_EMPLOYER_LIST", "HCM Legal Employers"),
    ("OA4F_SEC_HCM_SEE_SELF_RECORD", "HCM Show Self Record"),
    ("OA4F_SEC_INV_BUSINESSUNIT_LIST", "Inventory Business Units"),
    ("OA4F_SEC_INV_ORG_TRANSACTIONS_LIST", "Inventory Organizations"),
    ("OA4F_SEC_FIN_LEDGER_LIST", "Ledgers"),
    (
        "OA4F_SEC_OM_BUSINESS_UNIT_LIST",
        "Order Management Business Units",
    ),
    ("OA4F_SEC_PPM_PROJECT_BUSINESSUNIT_LIST", "Project Business Units"),
    (
        "OA4F_SEC_PPM_EXPENDITURE_BUSINESSUNIT_LIST",
        "Project Expenditure Business Units",
    ),
    ("OA4F_SEC_PPM_PROJECT_ORGANIZATION_LIST", "Project Organizations"),
    (
        "OA4F_SEC_PROC_REQ_BUSINESSUNIT_LIST",
        "Requisition Business Units",
    ),
    (
        "OA4F_SEC_PROC_SPEND_PRC_BUSINESSUNIT_LIST",
        "Spend Procurement Business Units",
    ),
];

/// Build the built-in code label map.
pub fn derive_builtin_code_label_map() -> SpecCodeLabelMap {
    SpecCodeLabelMap::from_pairs(TUP_BUILTIN_CODE_LABELS)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatPresets

/// Build default per-style formats used by [`crate::writer::XlsxGridSink`].
pub fn derive_default_grid_formats() -> SpecGridFormats {
    derive_grid_formats_with_colors(
        C_COLOR_GROUP_PRIMARY,
        C_COLOR_GROUP_ALTERNATE,
        C_COLOR_MARKER,
    )
}

/// Build per-style formats with custom fills.
pub fn derive_grid_formats_with_colors(
    color_group_primary: &str,
    color_group_alternate: &str,
    color_marker: &str,
) -> SpecGridFormats {
    let cfg_header_fmt_spec = SpecCellFormat {
        text_wrap: Some(true),
        rotation: Some(90),
        align: Some("center".to_string()),
        valign: Some("bottom".to_string()),
        border: Some(true),
        ..Default::default()
    };

    SpecGridFormats {
        header: cfg_header_fmt_spec.clone(),
        group_primary: cfg_header_fmt_spec.with_(SpecCellFormat {
            bg_color: Some(color_group_primary.to_string()),
            ..Default::default()
        }),
        group_alternate: cfg_header_fmt_spec.with_(SpecCellFormat {
            bg_color: Some(color_group_alternate.to_string()),
            ..Default::default()
        }),
        marker: SpecCellFormat {
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            border: Some(true),
            bg_color: Some(color_marker.to_string()),
            ..Default::default()
        },
    }
}

/// Build default render options.
pub fn derive_default_render_options() -> SpecRenderOptions {
    SpecRenderOptions::default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
