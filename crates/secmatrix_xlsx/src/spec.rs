//! Shared assignment-matrix specification models.

use std::collections::BTreeMap;
use std::fmt;

use crate::conf::{
    C_CAPTION_CONTEXT_NAME, C_CAPTION_OBJECT_CODE, C_CAPTION_USER, C_SHEET_NAME_DEFAULT,
    N_WIDTH_DATA_COL_DEFAULT, N_WIDTH_LABEL_COL_DEFAULT, derive_default_grid_formats,
};

////////////////////////////////////////////////////////////////////////////////
// #region SourceRows

/// One normalized source assignment (one input line).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecAssignmentRow {
    /// Login name of the assigned user.
    pub user: String,
    /// Security object code, e.g. `OA4F_SEC_HCM_COUNTRY_LIST`.
    pub security_object_code: String,
    /// Member key within the security object list.
    pub member_value: String,
    /// Member display name within the security object list.
    pub member_name: String,
    /// Source operation flag.
    pub operation: String,
}

impl SpecAssignmentRow {
    /// Build a row from its five fields.
    pub fn new(
        user: impl Into<String>,
        security_object_code: impl Into<String>,
        member_value: impl Into<String>,
        member_name: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            security_object_code: security_object_code.into(),
            member_value: member_value.into(),
            member_name: member_name.into(),
            operation: operation.into(),
        }
    }

    /// Pivot column this row contributes to.
    pub fn column_key(&self) -> SpecColumnKey {
        SpecColumnKey::new(&self.security_object_code, &self.member_name)
    }
}

/// Rows read from one tabular source plus ingestion warnings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecAssignmentTable {
    /// Normalized rows in source order.
    pub rows: Vec<SpecAssignmentRow>,
    /// Non-fatal ingestion warnings (e.g. missing fields).
    pub warnings: Vec<String>,
}

/// Security object code to Fusion security context name lookup.
///
/// Lookups never fail: an unknown code resolves to itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCodeLabelMap {
    dict_labels: BTreeMap<String, String>,
}

impl SpecCodeLabelMap {
    /// Empty map; every code falls back to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(code, label)` pairs. Later pairs overwrite earlier ones.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (code, label) in pairs {
            map.insert(code, label);
        }
        map
    }

    /// Insert or replace one label.
    pub fn insert(&mut self, code: impl Into<String>, label: impl Into<String>) {
        self.dict_labels.insert(code.into(), label.into());
    }

    /// Overlay `other` onto `self`.
    pub fn extend(&mut self, other: &SpecCodeLabelMap) {
        for (code, label) in &other.dict_labels {
            self.dict_labels.insert(code.clone(), label.clone());
        }
    }

    /// Resolve a code to its label, falling back to the raw code.
    pub fn label_for<'a>(&'a self, code: &'a str) -> &'a str {
        self.dict_labels.get(code).map_or(code, String::as_str)
    }

    /// Whether an explicit label exists for `code`.
    pub fn contains(&self, code: &str) -> bool {
        self.dict_labels.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.dict_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict_labels.is_empty()
    }

    /// Iterate `(code, label)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dict_labels
            .iter()
            .map(|(code, label)| (code.as_str(), label.as_str()))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PivotModels

/// One pivot column: `(security object code, member name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecColumnKey {
    /// Security object code.
    pub security_object_code: String,
    /// Member display name.
    pub member_name: String,
}

impl SpecColumnKey {
    pub fn new(security_object_code: impl Into<String>, member_name: impl Into<String>) -> Self {
        Self {
            security_object_code: security_object_code.into(),
            member_name: member_name.into(),
        }
    }

    /// Composite ordering key used for column sorting.
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.security_object_code, &self.member_name)
    }
}

/// Wide user x column presence matrix.
///
/// Users keep first-encounter order. A repeated `(user, column)` key keeps
/// the first stored marker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecPivotMatrix {
    /// Users in first-encounter order.
    pub users: Vec<String>,
    /// Markers by user, then by column.
    pub dict_markers: BTreeMap<String, BTreeMap<SpecColumnKey, String>>,
    /// Number of source rows dropped because their key was already present.
    pub cnt_duplicates: usize,
}

impl SpecPivotMatrix {
    /// Marker stored for `(user, column)`, if any.
    pub fn marker(&self, user: &str, column: &SpecColumnKey) -> Option<&str> {
        self.dict_markers
            .get(user)
            .and_then(|dict_cols| dict_cols.get(column))
            .map(String::as_str)
    }

    /// Whether `(user, column)` holds a marker.
    pub fn has_marker(&self, user: &str, column: &SpecColumnKey) -> bool {
        self.marker(user, column).is_some()
    }

    /// Total number of stored markers.
    pub fn marker_count(&self) -> usize {
        self.dict_markers.values().map(BTreeMap::len).sum()
    }
}

/// Contiguous run of sorted columns sharing one security object code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnGroup {
    /// Zero-based position of this group among all groups.
    pub idx_group: usize,
    /// Shared security object code.
    pub security_object_code: String,
    /// Context label (raw code when unmapped).
    pub label: String,
    /// Member names in column order.
    pub member_names: Vec<String>,
    /// First data column index (inclusive, zero-based over data columns).
    pub idx_start: usize,
    /// Last data column index (inclusive, zero-based over data columns).
    pub idx_end: usize,
}

impl SpecColumnGroup {
    /// Number of columns spanned by the group.
    pub fn width(&self) -> usize {
        self.idx_end - self.idx_start + 1
    }

    /// Header style class, alternating on group index parity.
    pub fn style(&self) -> EnumGridStyle {
        EnumGridStyle::from_group_index(self.idx_group)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridModels

/// Side-channel style class attached to grid cells; resolved by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumGridStyle {
    /// No format (user names).
    Plain,
    /// Rotated, bordered caption cell without fill.
    Header,
    /// Group header fill used by even group indices.
    GroupPrimary,
    /// Group header fill used by odd group indices.
    GroupAlternate,
    /// Assignment marker cell.
    Marker,
}

impl EnumGridStyle {
    /// Group header class for the `idx_group`-th group.
    pub fn from_group_index(idx_group: usize) -> Self {
        if idx_group % 2 == 0 {
            Self::GroupPrimary
        } else {
            Self::GroupAlternate
        }
    }
}

/// One written cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridCell {
    /// Zero-based sheet row.
    pub row_idx: usize,
    /// Zero-based sheet column.
    pub col_idx: usize,
    /// Cell text.
    pub text: String,
    /// Style class.
    pub style: EnumGridStyle,
}

/// Horizontal merge across one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridMerge {
    /// Row index where merge is applied.
    pub row_idx: usize,
    /// Start column index (inclusive).
    pub col_idx_start: usize,
    /// End column index (inclusive).
    pub col_idx_end: usize,
    /// Merge display text.
    pub text: String,
    /// Style class applied to the whole range.
    pub style: EnumGridStyle,
}

/// Column width directive.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnWidth {
    /// Zero-based sheet column.
    pub col_idx: usize,
    /// Width in character units.
    pub width: f64,
}

/// Fully planned output sheet.
///
/// Rows `0..n_rows_header` are headers, the rest one row per user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecOutputGrid {
    /// Target sheet name.
    pub sheet_name: String,
    /// Plain (non-merged) cells, in write order.
    pub cells: Vec<SpecGridCell>,
    /// Merged ranges, in write order.
    pub merges: Vec<SpecGridMerge>,
    /// Column widths.
    pub widths: Vec<SpecColumnWidth>,
    /// Sorted data columns (sheet column `i + 1`).
    pub columns: Vec<SpecColumnKey>,
    /// Column groups over `columns`.
    pub groups: Vec<SpecColumnGroup>,
    /// Users in data-row order (sheet row `i + n_rows_header`).
    pub users: Vec<String>,
    /// Number of header rows.
    pub n_rows_header: usize,
}

impl SpecOutputGrid {
    /// Total sheet rows (header + data).
    pub fn height(&self) -> usize {
        self.n_rows_header + self.users.len()
    }

    /// Total sheet columns (label column + data).
    pub fn width(&self) -> usize {
        1 + self.columns.len()
    }

    /// Number of data rows.
    pub fn height_data(&self) -> usize {
        self.users.len()
    }

    /// Text shown at `(row, col)`: plain cell text or merge anchor text.
    pub fn text_at(&self, row_idx: usize, col_idx: usize) -> Option<&str> {
        if let Some(cell) = self
            .cells
            .iter()
            .find(|cell| cell.row_idx == row_idx && cell.col_idx == col_idx)
        {
            return Some(&cell.text);
        }
        self.merges
            .iter()
            .find(|merge| merge.row_idx == row_idx && merge.col_idx_start == col_idx)
            .map(|merge| merge.text.as_str())
    }

    /// Style at `(row, col)`, including cells covered by a merge.
    pub fn style_at(&self, row_idx: usize, col_idx: usize) -> Option<EnumGridStyle> {
        if let Some(cell) = self
            .cells
            .iter()
            .find(|cell| cell.row_idx == row_idx && cell.col_idx == col_idx)
        {
            return Some(cell.style);
        }
        self.merges
            .iter()
            .find(|merge| {
                merge.row_idx == row_idx
                    && merge.col_idx_start <= col_idx
                    && col_idx <= merge.col_idx_end
            })
            .map(|merge| merge.style)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Concrete cell format applied by the sink for one style class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Thin border on all sides.
    pub border: Option<bool>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Text rotation in degrees.
    pub rotation: Option<i64>,

    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            rotation: other.rotation.or(self.rotation),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

/// Resolved formats per style class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridFormats {
    /// Caption cells in the label column.
    pub header: SpecCellFormat,
    /// Even-indexed group headers.
    pub group_primary: SpecCellFormat,
    /// Odd-indexed group headers.
    pub group_alternate: SpecCellFormat,
    /// Marker cells.
    pub marker: SpecCellFormat,
}

impl SpecGridFormats {
    /// Format for `style`; `Plain` has none.
    pub fn format_for(&self, style: EnumGridStyle) -> Option<&SpecCellFormat> {
        match style {
            EnumGridStyle::Plain => None,
            EnumGridStyle::Header => Some(&self.header),
            EnumGridStyle::GroupPrimary => Some(&self.group_primary),
            EnumGridStyle::GroupAlternate => Some(&self.group_alternate),
            EnumGridStyle::Marker => Some(&self.marker),
        }
    }
}

impl Default for SpecGridFormats {
    fn default() -> Self {
        derive_default_grid_formats()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RenderOptions

/// Label-column captions for the three header rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridCaptions {
    /// Row 0 caption.
    pub context_name: String,
    /// Row 1 caption.
    pub object_code: String,
    /// Row 2 caption.
    pub user: String,
}

impl Default for SpecGridCaptions {
    fn default() -> Self {
        Self {
            context_name: C_CAPTION_CONTEXT_NAME.to_string(),
            object_code: C_CAPTION_OBJECT_CODE.to_string(),
            user: C_CAPTION_USER.to_string(),
        }
    }
}

/// Options controlling grid rendering and sheet output.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecRenderOptions {
    /// Output sheet name (sanitized before use).
    pub sheet_name: String,
    /// Label-column captions.
    pub captions: SpecGridCaptions,
    /// Per-style formats.
    pub formats: SpecGridFormats,
    /// Width of the label column.
    pub width_label_col: f64,
    /// Width of every data column.
    pub width_data_col: f64,
}

impl Default for SpecRenderOptions {
    fn default() -> Self {
        Self {
            sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
            captions: SpecGridCaptions::default(),
            formats: SpecGridFormats::default(),
            width_label_col: N_WIDTH_LABEL_COL_DEFAULT,
            width_data_col: N_WIDTH_DATA_COL_DEFAULT,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Counters and diagnostics for one render call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecPivotReport {
    /// Source rows consumed.
    pub cnt_rows_input: u64,
    /// Distinct users (data rows).
    pub cnt_users: u64,
    /// Distinct `(code, member)` columns.
    pub cnt_columns: u64,
    /// Column groups.
    pub cnt_groups: u64,
    /// Marker cells written.
    pub cnt_markers: u64,
    /// Rows dropped as duplicate `(user, code, member)` keys.
    pub cnt_duplicates: u64,
    /// Groups whose code had no label.
    pub cnt_codes_unmapped: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecPivotReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_input".to_string(), self.cnt_rows_input);
        dict_counts.insert("cnt_users".to_string(), self.cnt_users);
        dict_counts.insert("cnt_columns".to_string(), self.cnt_columns);
        dict_counts.insert("cnt_groups".to_string(), self.cnt_groups);
        dict_counts.insert("cnt_markers".to_string(), self.cnt_markers);
        dict_counts.insert("cnt_duplicates".to_string(), self.cnt_duplicates);
        dict_counts.insert("cnt_codes_unmapped".to_string(), self.cnt_codes_unmapped);
        dict_counts.insert("cnt_warnings".to_string(), self.warnings.len() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} rows={} users={} columns={} groups={} markers={} duplicates={} unmapped={} warnings={}",
            self.cnt_rows_input,
            self.cnt_users,
            self.cnt_columns,
            self.cnt_groups,
            self.cnt_markers,
            self.cnt_duplicates,
            self.cnt_codes_unmapped,
            self.warnings.len()
        )
    }
}

impl fmt::Display for SpecPivotReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[PIVOT]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_label_map_falls_back_to_raw_code() {
        let map = SpecCodeLabelMap::from_pairs([("A_CODE", "A Label")]);
        assert_eq!(map.label_for("A_CODE"), "A Label");
        assert_eq!(map.label_for("UNKNOWN_CODE"), "UNKNOWN_CODE");
        assert!(!map.contains("UNKNOWN_CODE"));
        assert_eq!(SpecCodeLabelMap::new().label_for(""), "");
    }

    #[test]
    fn test_code_label_map_extend_overwrites() {
        let mut map = SpecCodeLabelMap::from_pairs([("A", "one"), ("B", "two")]);
        map.extend(&SpecCodeLabelMap::from_pairs([("B", "deux"), ("C", "trois")]));

        assert_eq!(map.len(), 3);
        assert_eq!(map.label_for("B"), "deux");
        assert_eq!(
            map.iter().map(|(code, _)| code).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn test_group_style_alternates_on_parity() {
        assert_eq!(
            EnumGridStyle::from_group_index(0),
            EnumGridStyle::GroupPrimary
        );
        assert_eq!(
            EnumGridStyle::from_group_index(1),
            EnumGridStyle::GroupAlternate
        );
        assert_eq!(
            EnumGridStyle::from_group_index(4),
            EnumGridStyle::GroupPrimary
        );
    }

    #[test]
    fn test_cell_format_merge_prefers_patch() {
        let base = SpecCellFormat {
            border: Some(true),
            align: Some("center".to_string()),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bg_color: Some("#D9E1F2".to_string()),
            align: Some("left".to_string()),
            ..Default::default()
        });

        assert_eq!(merged.border, Some(true));
        assert_eq!(merged.align.as_deref(), Some("left"));
        assert_eq!(merged.bg_color.as_deref(), Some("#D9E1F2"));
        assert_eq!(merged.rotation, None);
    }

    #[test]
    fn test_pivot_report_format_and_dict() {
        let report = SpecPivotReport {
            cnt_rows_input: 3,
            cnt_users: 2,
            cnt_columns: 2,
            cnt_groups: 2,
            cnt_markers: 3,
            cnt_duplicates: 0,
            cnt_codes_unmapped: 1,
            warnings: vec!["w".to_string()],
        };

        assert_eq!(report.to_dict()["cnt_warnings"], 1);
        assert_eq!(
            report.to_string(),
            "[PIVOT] rows=3 users=2 columns=2 groups=2 markers=3 duplicates=0 unmapped=1 warnings=1"
        );
    }
}
