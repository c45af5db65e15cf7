//! Spreadsheet sink: replays a planned grid onto an XLSX worksheet.

use std::collections::BTreeMap;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::info;

use crate::error::{Result, SecMatrixError};
use crate::pivot::render_output_grid;
use crate::spec::{
    EnumGridStyle, SpecAssignmentTable, SpecCellFormat, SpecCodeLabelMap, SpecGridFormats,
    SpecOutputGrid, SpecPivotReport, SpecRenderOptions,
};
use crate::util::{cast_col_num, cast_row_num, validate_grid_within_excel_limits};

////////////////////////////////////////////////////////////////////////////////
// #region SinkContract

/// Output sink for a planned grid.
///
/// Indices are zero-based sheet coordinates; `style` is resolved by the sink.
pub trait GridSink {
    /// Write one text cell.
    fn write_cell(
        &mut self,
        row_idx: usize,
        col_idx: usize,
        text: &str,
        style: EnumGridStyle,
    ) -> Result<()>;

    /// Merge `col_idx_start..=col_idx_end` on one row and write `text` into it.
    fn merge_range(
        &mut self,
        row_idx: usize,
        col_idx_start: usize,
        col_idx_end: usize,
        text: &str,
        style: EnumGridStyle,
    ) -> Result<()>;

    /// Set one column width in character units.
    fn set_column_width(&mut self, col_idx: usize, width: f64) -> Result<()>;
}

/// Replay `grid` onto `sink`: cells, then merges, then widths.
pub fn write_output_grid<S: GridSink + ?Sized>(sink: &mut S, grid: &SpecOutputGrid) -> Result<()> {
    validate_grid_within_excel_limits(grid.height(), grid.width())?;

    for cell in &grid.cells {
        sink.write_cell(cell.row_idx, cell.col_idx, &cell.text, cell.style)?;
    }
    for merge in &grid.merges {
        sink.merge_range(
            merge.row_idx,
            merge.col_idx_start,
            merge.col_idx_end,
            &merge.text,
            merge.style,
        )?;
    }
    for width in &grid.widths {
        sink.set_column_width(width.col_idx, width.width)?;
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region XlsxSink

/// [`GridSink`] writing into a `rust_xlsxwriter` worksheet.
pub struct XlsxGridSink<'a> {
    worksheet: &'a mut Worksheet,
    dict_formats: BTreeMap<EnumGridStyle, Format>,
    fmt_plain: Format,
}

impl<'a> XlsxGridSink<'a> {
    /// Bind to `worksheet`, resolving every style class once.
    pub fn new(worksheet: &'a mut Worksheet, formats: &SpecGridFormats) -> Self {
        let dict_formats = [
            EnumGridStyle::Header,
            EnumGridStyle::GroupPrimary,
            EnumGridStyle::GroupAlternate,
            EnumGridStyle::Marker,
        ]
        .into_iter()
        .filter_map(|style| {
            formats
                .format_for(style)
                .map(|spec| (style, derive_rust_xlsx_format(spec)))
        })
        .collect();

        Self {
            worksheet,
            dict_formats,
            fmt_plain: Format::new(),
        }
    }

    fn format_for(&self, style: EnumGridStyle) -> Option<&Format> {
        self.dict_formats.get(&style)
    }
}

impl GridSink for XlsxGridSink<'_> {
    fn write_cell(
        &mut self,
        row_idx: usize,
        col_idx: usize,
        text: &str,
        style: EnumGridStyle,
    ) -> Result<()> {
        let n_row = cast_row_num(row_idx)?;
        let n_col = cast_col_num(col_idx)?;

        match (self.dict_formats.get(&style), text.is_empty()) {
            (Some(format), true) => {
                self.worksheet.write_blank(n_row, n_col, format)?;
            }
            (Some(format), false) => {
                self.worksheet
                    .write_string_with_format(n_row, n_col, text, format)?;
            }
            (None, true) => {}
            (None, false) => {
                self.worksheet.write_string(n_row, n_col, text)?;
            }
        }
        Ok(())
    }

    fn merge_range(
        &mut self,
        row_idx: usize,
        col_idx_start: usize,
        col_idx_end: usize,
        text: &str,
        style: EnumGridStyle,
    ) -> Result<()> {
        let n_row = cast_row_num(row_idx)?;
        let format = self.format_for(style).unwrap_or(&self.fmt_plain).clone();
        self.worksheet.merge_range(
            n_row,
            cast_col_num(col_idx_start)?,
            n_row,
            cast_col_num(col_idx_end)?,
            text,
            &format,
        )?;
        Ok(())
    }

    fn set_column_width(&mut self, col_idx: usize, width: f64) -> Result<()> {
        self.worksheet
            .set_column_width(cast_col_num(col_idx)?, width)?;
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportWriter

/// Renders assignment tables into single-sheet XLSX workbooks.
#[derive(Debug, Clone, Default)]
pub struct XlsxReportWriter {
    labels: SpecCodeLabelMap,
    options: SpecRenderOptions,
}

impl XlsxReportWriter {
    /// Create writer with an injected label map and render options.
    pub fn new(labels: SpecCodeLabelMap, options: SpecRenderOptions) -> Self {
        Self { labels, options }
    }

    /// Plan the grid for `table`, carrying source warnings into the report.
    pub fn plan(&self, table: &SpecAssignmentTable) -> (SpecOutputGrid, SpecPivotReport) {
        let (grid, mut report) = render_output_grid(&table.rows, &self.labels, &self.options);
        for c_warning in &table.warnings {
            report.warn(c_warning);
        }
        (grid, report)
    }

    /// Build an in-memory workbook with one rendered sheet.
    pub fn render_workbook(
        &self,
        table: &SpecAssignmentTable,
    ) -> Result<(Workbook, SpecPivotReport)> {
        let (grid, report) = self.plan(table);

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&grid.sheet_name)?;

        let mut sink = XlsxGridSink::new(worksheet, &self.options.formats);
        write_output_grid(&mut sink, &grid)?;

        Ok((workbook, report))
    }

    /// Render `table` and return the XLSX file bytes.
    pub fn render_to_bytes(&self, table: &SpecAssignmentTable) -> Result<(Vec<u8>, SpecPivotReport)> {
        let (mut workbook, report) = self.render_workbook(table)?;
        let v_bytes = workbook.save_to_buffer()?;
        Ok((v_bytes, report))
    }

    /// Render `table` and write the XLSX file to `path`.
    pub fn render_to_file(
        &self,
        table: &SpecAssignmentTable,
        path: &Path,
    ) -> Result<SpecPivotReport> {
        let (v_bytes, report) = self.render_to_bytes(table)?;
        std::fs::write(path, &v_bytes).map_err(|source| SecMatrixError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), n_bytes = v_bytes.len(), "assignment workbook written");
        Ok(report)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

/// Convert a format spec into a `rust_xlsxwriter` format.
pub fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = spec.rotation {
        format = format.set_rotation(val.clamp(-90, 270) as i16);
    }

    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if spec.border.unwrap_or(false) {
        format = format.set_border(FormatBorder::Thin);
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "center" => Some(FormatAlign::Center),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
