//! Assignment pivot renderer.
//!
//! Reshapes long-format assignment rows into a user x `(code, member)`
//! matrix and plans the styled output grid:
//! - row 0 : context label per column group (merged across the group)
//! - row 1 : raw security object code per column group (merged)
//! - row 2 : member name per column
//! - row 3+: one row per user, `X` where assigned
//!
//! Everything here is pure; failures of the surrounding I/O live elsewhere.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::conf::{C_ASSIGNMENT_MARKER, C_CELL_MARKER_TEXT, N_ROWS_HEADER};
use crate::spec::{
    EnumGridStyle, SpecAssignmentRow, SpecCodeLabelMap, SpecColumnGroup, SpecColumnKey,
    SpecColumnWidth, SpecGridCell, SpecGridMerge, SpecOutputGrid, SpecPivotMatrix,
    SpecPivotReport, SpecRenderOptions,
};
use crate::util::{derive_contiguous_runs, sanitize_sheet_name};

const N_ROW_IDX_LABEL: usize = 0;
const N_ROW_IDX_CODE: usize = 1;
const N_ROW_IDX_MEMBER: usize = 2;

////////////////////////////////////////////////////////////////////////////////
// #region Pivot

/// Fold rows into a presence matrix keyed by `(user, code, member name)`.
///
/// The first marker stored for a key is kept; repeats only bump
/// [`SpecPivotMatrix::cnt_duplicates`].
pub fn build_pivot_matrix(rows: &[SpecAssignmentRow]) -> SpecPivotMatrix {
    let mut matrix = SpecPivotMatrix::default();

    for row in rows {
        if !matrix.dict_markers.contains_key(&row.user) {
            matrix.users.push(row.user.clone());
        }
        let dict_cols = matrix.dict_markers.entry(row.user.clone()).or_default();

        let column = row.column_key();
        if dict_cols.contains_key(&column) {
            matrix.cnt_duplicates += 1;
            debug!(
                user = %row.user,
                code = %row.security_object_code,
                member = %row.member_name,
                "duplicate assignment dropped"
            );
            continue;
        }
        dict_cols.insert(column, C_ASSIGNMENT_MARKER.to_string());
    }

    matrix
}

/// Distinct columns across all users, sorted by `(code, member name)`.
pub fn enumerate_columns(matrix: &SpecPivotMatrix) -> Vec<SpecColumnKey> {
    let set_columns: BTreeSet<&SpecColumnKey> = matrix
        .dict_markers
        .values()
        .flat_map(BTreeMap::keys)
        .collect();

    let mut l_columns: Vec<SpecColumnKey> = set_columns.into_iter().cloned().collect();
    l_columns.sort_by(|col_a, col_b| col_a.sort_key().cmp(&col_b.sort_key()));
    l_columns
}

/// Split sorted columns into maximal runs sharing one code.
pub fn plan_column_groups(
    columns: &[SpecColumnKey],
    labels: &SpecCodeLabelMap,
) -> Vec<SpecColumnGroup> {
    let l_codes: Vec<&str> = columns
        .iter()
        .map(|col| col.security_object_code.as_str())
        .collect();

    derive_contiguous_runs(&l_codes)
        .into_iter()
        .enumerate()
        .map(|(idx_group, (idx_start, idx_end))| {
            let c_code = l_codes[idx_start];
            SpecColumnGroup {
                idx_group,
                security_object_code: c_code.to_string(),
                label: labels.label_for(c_code).to_string(),
                member_names: columns[idx_start..=idx_end]
                    .iter()
                    .map(|col| col.member_name.clone())
                    .collect(),
                idx_start,
                idx_end,
            }
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridAssembly

/// Plan the full output grid for `rows`.
///
/// Never fails: unknown codes fall back to the raw code and an empty input
/// yields the three header rows only.
pub fn render_output_grid(
    rows: &[SpecAssignmentRow],
    labels: &SpecCodeLabelMap,
    options: &SpecRenderOptions,
) -> (SpecOutputGrid, SpecPivotReport) {
    let matrix = build_pivot_matrix(rows);
    let l_columns = enumerate_columns(&matrix);
    let l_groups = plan_column_groups(&l_columns, labels);

    let mut grid = SpecOutputGrid {
        sheet_name: sanitize_sheet_name(&options.sheet_name, "_"),
        n_rows_header: N_ROWS_HEADER,
        ..Default::default()
    };

    write_header_rows(&mut grid, &l_groups, options);

    let mut n_markers = 0usize;
    for (n_idx_user, c_user) in matrix.users.iter().enumerate() {
        let n_row_idx = N_ROWS_HEADER + n_idx_user;
        grid.cells.push(SpecGridCell {
            row_idx: n_row_idx,
            col_idx: 0,
            text: c_user.clone(),
            style: EnumGridStyle::Plain,
        });

        for (n_idx_col, column) in l_columns.iter().enumerate() {
            if matrix.has_marker(c_user, column) {
                grid.cells.push(SpecGridCell {
                    row_idx: n_row_idx,
                    col_idx: 1 + n_idx_col,
                    text: C_CELL_MARKER_TEXT.to_string(),
                    style: EnumGridStyle::Marker,
                });
                n_markers += 1;
            }
        }
    }

    grid.widths.push(SpecColumnWidth {
        col_idx: 0,
        width: options.width_label_col,
    });
    for n_idx_col in 0..l_columns.len() {
        grid.widths.push(SpecColumnWidth {
            col_idx: 1 + n_idx_col,
            width: options.width_data_col,
        });
    }

    let report = SpecPivotReport {
        cnt_rows_input: rows.len() as u64,
        cnt_users: matrix.users.len() as u64,
        cnt_columns: l_columns.len() as u64,
        cnt_groups: l_groups.len() as u64,
        cnt_markers: n_markers as u64,
        cnt_duplicates: matrix.cnt_duplicates as u64,
        cnt_codes_unmapped: l_groups
            .iter()
            .filter(|group| !labels.contains(&group.security_object_code))
            .count() as u64,
        warnings: vec![],
    };
    debug!(%report, "pivot grid planned");

    grid.columns = l_columns;
    grid.groups = l_groups;
    grid.users = matrix.users;
    (grid, report)
}

fn write_header_rows(
    grid: &mut SpecOutputGrid,
    groups: &[SpecColumnGroup],
    options: &SpecRenderOptions,
) {
    let captions = &options.captions;
    for (n_row_idx, c_caption) in [
        (N_ROW_IDX_LABEL, &captions.context_name),
        (N_ROW_IDX_CODE, &captions.object_code),
        (N_ROW_IDX_MEMBER, &captions.user),
    ] {
        grid.cells.push(SpecGridCell {
            row_idx: n_row_idx,
            col_idx: 0,
            text: c_caption.clone(),
            style: EnumGridStyle::Header,
        });
    }

    for group in groups {
        let n_col_start = 1 + group.idx_start;
        let n_col_end = 1 + group.idx_end;
        let style = group.style();

        for (n_row_idx, c_text) in [
            (N_ROW_IDX_LABEL, &group.label),
            (N_ROW_IDX_CODE, &group.security_object_code),
        ] {
            // Single-cell merges are rejected by the XLSX format.
            if group.width() == 1 {
                grid.cells.push(SpecGridCell {
                    row_idx: n_row_idx,
                    col_idx: n_col_start,
                    text: c_text.clone(),
                    style,
                });
            } else {
                grid.merges.push(SpecGridMerge {
                    row_idx: n_row_idx,
                    col_idx_start: n_col_start,
                    col_idx_end: n_col_end,
                    text: c_text.clone(),
                    style,
                });
            }
        }

        for (n_offset, c_member) in group.member_names.iter().enumerate() {
            grid.cells.push(SpecGridCell {
                row_idx: N_ROW_IDX_MEMBER,
                col_idx: n_col_start + n_offset,
                text: c_member.clone(),
                style,
            });
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::derive_builtin_code_label_map;

    const C_AP: &str = "OA4F_SEC_FIN_AP_BUSINESSUNIT_LIST";
    const C_COUNTRY: &str = "OA4F_SEC_HCM_COUNTRY_LIST";

    fn row(user: &str, code: &str, member: &str) -> SpecAssignmentRow {
        SpecAssignmentRow::new(user, code, "V", member, "ADD")
    }

    fn rows_example() -> Vec<SpecAssignmentRow> {
        vec![
            row("alice", C_AP, "US BU"),
            row("alice", C_COUNTRY, "US"),
            row("bob", C_AP, "US BU"),
        ]
    }

    #[test]
    fn test_example_scenario() {
        let (grid, report) = render_output_grid(
            &rows_example(),
            &derive_builtin_code_label_map(),
            &SpecRenderOptions::default(),
        );

        assert_eq!(
            grid.columns,
            vec![
                SpecColumnKey::new(C_AP, "US BU"),
                SpecColumnKey::new(C_COUNTRY, "US")
            ]
        );
        assert_eq!(grid.text_at(0, 1), Some("AP Business Units"));
        assert_eq!(grid.text_at(0, 2), Some("HCM Country List"));
        assert_eq!(grid.text_at(1, 1), Some(C_AP));
        assert_eq!(grid.text_at(2, 1), Some("US BU"));
        assert_eq!(grid.text_at(2, 2), Some("US"));

        assert_eq!(grid.height_data(), 2);
        assert_eq!(grid.text_at(3, 0), Some("alice"));
        assert_eq!(grid.text_at(3, 1), Some("X"));
        assert_eq!(grid.text_at(3, 2), Some("X"));
        assert_eq!(grid.text_at(4, 0), Some("bob"));
        assert_eq!(grid.text_at(4, 1), Some("X"));
        assert_eq!(grid.text_at(4, 2), None);

        assert_eq!(report.cnt_markers, 3);
        assert_eq!(report.cnt_codes_unmapped, 0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let labels = derive_builtin_code_label_map();
        let options = SpecRenderOptions::default();
        let (grid_a, report_a) = render_output_grid(&rows_example(), &labels, &options);
        let (grid_b, report_b) = render_output_grid(&rows_example(), &labels, &options);
        assert_eq!(grid_a, grid_b);
        assert_eq!(report_a, report_b);
    }

    #[test]
    fn test_columns_are_distinct_and_sorted_by_code_then_member() {
        let rows = vec![
            row("u1", "B_CODE", "m2"),
            row("u2", "A_CODE", "z"),
            row("u1", "B_CODE", "M1"),
            row("u3", "A_CODE", "a"),
            row("u3", "B_CODE", "m2"),
        ];
        let columns = enumerate_columns(&build_pivot_matrix(&rows));

        assert_eq!(
            columns,
            vec![
                SpecColumnKey::new("A_CODE", "a"),
                SpecColumnKey::new("A_CODE", "z"),
                SpecColumnKey::new("B_CODE", "M1"),
                SpecColumnKey::new("B_CODE", "m2"),
            ]
        );
    }

    #[test]
    fn test_column_order_ignores_input_order() {
        let mut rows = rows_example();
        let (grid_fwd, _) =
            render_output_grid(&rows, &SpecCodeLabelMap::new(), &SpecRenderOptions::default());
        rows.reverse();
        let (grid_rev, _) =
            render_output_grid(&rows, &SpecCodeLabelMap::new(), &SpecRenderOptions::default());
        assert_eq!(grid_fwd.columns, grid_rev.columns);
        assert_eq!(grid_rev.users, vec!["bob".to_string(), "alice".to_string()]);
    }

    #[test]
    fn test_users_keep_first_encounter_order() {
        let rows = vec![
            row("zed", "C", "m"),
            row("amy", "C", "m"),
            row("zed", "D", "m"),
        ];
        let matrix = build_pivot_matrix(&rows);
        assert_eq!(matrix.users, vec!["zed".to_string(), "amy".to_string()]);
    }

    #[test]
    fn test_duplicates_keep_first_and_are_counted() {
        let rows = vec![
            SpecAssignmentRow::new("alice", C_AP, "V1", "US BU", "ADD"),
            SpecAssignmentRow::new("alice", C_AP, "V9", "US BU", "REMOVE"),
        ];
        let matrix = build_pivot_matrix(&rows);
        assert_eq!(matrix.cnt_duplicates, 1);
        assert_eq!(matrix.marker_count(), 1);
        assert_eq!(
            matrix.marker("alice", &SpecColumnKey::new(C_AP, "US BU")),
            Some(C_ASSIGNMENT_MARKER)
        );

        let (grid, report) =
            render_output_grid(&rows, &SpecCodeLabelMap::new(), &SpecRenderOptions::default());
        assert_eq!(grid.columns.len(), 1);
        assert_eq!(report.cnt_duplicates, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_groups_cover_maximal_code_runs_and_alternate_styles() {
        let rows = vec![
            row("u", "A", "1"),
            row("u", "A", "2"),
            row("u", "B", "1"),
            row("u", "C", "1"),
            row("u", "C", "2"),
            row("u", "C", "3"),
        ];
        let (grid, _) =
            render_output_grid(&rows, &SpecCodeLabelMap::new(), &SpecRenderOptions::default());

        let l_spans: Vec<(usize, usize)> = grid
            .groups
            .iter()
            .map(|group| (group.idx_start, group.idx_end))
            .collect();
        assert_eq!(l_spans, vec![(0, 1), (2, 2), (3, 5)]);
        assert_eq!(
            grid.groups.iter().map(SpecColumnGroup::width).collect::<Vec<_>>(),
            vec![2, 1, 3]
        );

        assert_eq!(grid.style_at(0, 1), Some(EnumGridStyle::GroupPrimary));
        assert_eq!(grid.style_at(0, 2), Some(EnumGridStyle::GroupPrimary));
        assert_eq!(grid.style_at(1, 3), Some(EnumGridStyle::GroupAlternate));
        assert_eq!(grid.style_at(2, 5), Some(EnumGridStyle::GroupPrimary));
        assert_eq!(grid.style_at(0, 6), Some(EnumGridStyle::GroupPrimary));

        assert_eq!(
            grid.merges
                .iter()
                .map(|merge| (merge.row_idx, merge.col_idx_start, merge.col_idx_end))
                .collect::<Vec<_>>(),
            vec![(0, 1, 2), (1, 1, 2), (0, 4, 6), (1, 4, 6)]
        );
        // Single-column group B is written as plain cells.
        assert_eq!(grid.text_at(0, 3), Some("B"));
        assert_eq!(grid.text_at(1, 3), Some("B"));
    }

    #[test]
    fn test_style_depends_on_group_position_not_code() {
        let rows_ab = vec![row("u", "A", "1"), row("u", "B", "1")];
        let rows_b = vec![row("u", "B", "1")];
        let options = SpecRenderOptions::default();
        let labels = SpecCodeLabelMap::new();

        let (grid_ab, _) = render_output_grid(&rows_ab, &labels, &options);
        let (grid_b, _) = render_output_grid(&rows_b, &labels, &options);
        assert_eq!(grid_ab.groups[1].style(), EnumGridStyle::GroupAlternate);
        assert_eq!(grid_b.groups[0].style(), EnumGridStyle::GroupPrimary);
    }

    #[test]
    fn test_unmapped_code_falls_back_to_raw_code() {
        let rows = vec![row("u", "OA4F_SEC_UNKNOWN_LIST", "m")];
        let (grid, report) = render_output_grid(
            &rows,
            &derive_builtin_code_label_map(),
            &SpecRenderOptions::default(),
        );
        assert_eq!(grid.text_at(0, 1), Some("OA4F_SEC_UNKNOWN_LIST"));
        assert_eq!(grid.groups[0].label, "OA4F_SEC_UNKNOWN_LIST");
        assert_eq!(report.cnt_codes_unmapped, 1);
    }

    #[test]
    fn test_empty_input_yields_header_rows_only() {
        let (grid, report) =
            render_output_grid(&[], &SpecCodeLabelMap::new(), &SpecRenderOptions::default());

        assert_eq!(grid.n_rows_header, 3);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.height_data(), 0);
        assert_eq!(grid.width(), 1);
        assert!(grid.merges.is_empty());
        assert!(grid.cells.iter().all(|cell| cell.row_idx < 3));
        assert_eq!(grid.text_at(2, 0), Some("User"));
        assert_eq!(report.cnt_users, 0);
    }

    #[test]
    fn test_markers_match_input_exactly() {
        let rows = vec![
            row("a", "C1", "m1"),
            row("b", "C1", "m2"),
            row("c", "C2", "m1"),
            row("a", "C2", "m1"),
        ];
        let (grid, report) =
            render_output_grid(&rows, &SpecCodeLabelMap::new(), &SpecRenderOptions::default());

        for (n_idx_user, c_user) in grid.users.iter().enumerate() {
            for (n_idx_col, column) in grid.columns.iter().enumerate() {
                let if_expected = rows.iter().any(|r| {
                    r.user == *c_user
                        && r.security_object_code == column.security_object_code
                        && r.member_name == column.member_name
                });
                let c_text = grid.text_at(3 + n_idx_user, 1 + n_idx_col);
                assert_eq!(c_text == Some("X"), if_expected, "{c_user} {column:?}");
            }
        }
        assert_eq!(report.cnt_markers, 4);
    }

    #[test]
    fn test_empty_fields_still_pivot() {
        let rows = vec![SpecAssignmentRow::default()];
        let (grid, _) =
            render_output_grid(&rows, &SpecCodeLabelMap::new(), &SpecRenderOptions::default());
        assert_eq!(grid.users, vec![String::new()]);
        assert_eq!(grid.columns, vec![SpecColumnKey::new("", "")]);
        assert_eq!(grid.text_at(3, 1), Some("X"));
    }

    #[test]
    fn test_column_widths() {
        let (grid, _) = render_output_grid(
            &rows_example(),
            &SpecCodeLabelMap::new(),
            &SpecRenderOptions::default(),
        );
        assert_eq!(grid.widths.len(), 3);
        assert_eq!(grid.widths[0].width, 25.0);
        assert!(grid.widths[1..].iter().all(|w| w.width == 4.0));
        assert_eq!(grid.style_at(3, 1), Some(EnumGridStyle::Marker));
        assert_eq!(grid.style_at(3, 0), Some(EnumGridStyle::Plain));
        assert_eq!(grid.style_at(0, 0), Some(EnumGridStyle::Header));
    }
}
