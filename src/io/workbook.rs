//! Editable worksheet access.
//!
//! [`SheetDocument`] is the narrow surface the merge pipeline needs from a
//! spreadsheet codec: cell text, owned cell styles, row deletion, column
//! insertion and save-as. [`UmyaDocument`] implements it on top of
//! `umya-spreadsheet`, operating on the workbook's active sheet. Rows and
//! columns are 1-based throughout.

use std::path::Path;

use umya_spreadsheet::{
    Border, Color, HorizontalAlignmentValues, PatternValues, Spreadsheet, Style,
    VerticalAlignmentRunValues, VerticalAlignmentValues, Worksheet,
};

use crate::error::{Result, ToolError};
use crate::model::{
    AlignmentStyle, BorderEdge, BorderStyle, CellStyle, CellValue, ColorSpec, FillStyle,
    FontStyle, GENERAL_FORMAT, HorizontalAlign, VerticalAlign,
};

pub trait SheetDocument {
    /// Text of the cell, `None` when the cell is absent or its text is empty.
    fn cell_text(&self, row: u32, column: u32) -> Option<String>;

    /// Owned snapshot of the cell's style; absent cells yield the default style.
    fn cell_style(&self, row: u32, column: u32) -> CellStyle;

    /// Last row holding a cell, including style-only cells.
    fn highest_row(&self) -> u32;

    fn delete_rows(&mut self, start_row: u32, count: u32);

    /// Inserts `count` empty columns before `column`, shifting existing cells right.
    fn insert_columns(&mut self, column: u32, count: u32);

    /// Stores `value` and replaces the cell's style with `style`.
    fn write_cell(&mut self, row: u32, column: u32, value: &CellValue, style: &CellStyle);

    fn save_as(&self, path: &Path) -> Result<()>;
}

/// A workbook loaded for in-place editing.
///
/// The file it was loaded from is never written to; results go through
/// [`SheetDocument::save_as`].
pub struct UmyaDocument {
    book: Spreadsheet,
}

impl UmyaDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let book =
            umya_spreadsheet::reader::xlsx::read(path).map_err(|error| ToolError::WorkbookLoad {
                path: path.to_path_buf(),
                reason: error.to_string(),
            })?;
        Ok(Self { book })
    }

    fn sheet(&self) -> &Worksheet {
        self.book.get_active_sheet()
    }

    fn sheet_mut(&mut self) -> &mut Worksheet {
        self.book.get_active_sheet_mut()
    }
}

impl SheetDocument for UmyaDocument {
    fn cell_text(&self, row: u32, column: u32) -> Option<String> {
        let cell = self.sheet().get_cell((column, row))?;
        let text = cell.get_value().to_string();
        if text.is_empty() { None } else { Some(text) }
    }

    fn cell_style(&self, row: u32, column: u32) -> CellStyle {
        self.sheet()
            .get_cell((column, row))
            .map(|cell| style_from_umya(cell.get_style()))
            .unwrap_or_default()
    }

    fn highest_row(&self) -> u32 {
        self.sheet().get_highest_row()
    }

    fn delete_rows(&mut self, start_row: u32, count: u32) {
        if count == 0 {
            return;
        }
        self.sheet_mut().remove_row(&start_row, &count);
    }

    fn insert_columns(&mut self, column: u32, count: u32) {
        if count == 0 {
            return;
        }
        self.sheet_mut().insert_new_column_by_index(&column, &count);
    }

    fn write_cell(&mut self, row: u32, column: u32, value: &CellValue, style: &CellStyle) {
        let cell = self.sheet_mut().get_cell_mut((column, row));
        match value {
            CellValue::Number(number) => {
                cell.set_value_number(*number);
            }
            CellValue::Text(text) => {
                cell.set_value_string(text.clone());
            }
        }
        cell.set_style(style_to_umya(style));
    }

    fn save_as(&self, path: &Path) -> Result<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, path).map_err(|error| {
            ToolError::Save {
                path: path.to_path_buf(),
                reason: error.to_string(),
            }
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// An untouched `Color` is "no colour". Anything else is kept, including theme
// index 0, which is a real colour and not the absence of one.
fn color_from_umya(color: &Color) -> Option<ColorSpec> {
    if *color == Color::default() {
        return None;
    }
    let tint = Some(color.get_tint().clone()).filter(|tint| *tint != 0.0);
    if let Some(argb) = non_empty(&color.get_argb().to_string()) {
        return Some(ColorSpec {
            tint,
            ..ColorSpec::argb(&argb)
        });
    }
    let indexed = color.get_indexed().clone();
    if indexed != 0 {
        return Some(ColorSpec {
            indexed: Some(indexed),
            tint,
            ..ColorSpec::default()
        });
    }
    Some(ColorSpec::theme(color.get_theme_index().clone(), tint))
}

fn color_to_umya(spec: &ColorSpec, target: &mut Color) {
    if let Some(argb) = &spec.argb {
        target.set_argb(argb.clone());
    } else if let Some(index) = spec.indexed {
        target.set_indexed(index);
    } else if let Some(index) = spec.theme {
        target.set_theme_index(index);
    }
    if let Some(tint) = spec.tint {
        target.set_tint(tint);
    }
}

fn style_from_umya(style: &Style) -> CellStyle {
    let number_format = style
        .get_number_format()
        .map(|format| format.get_format_code().to_string())
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| GENERAL_FORMAT.to_string());

    let font = style
        .get_font()
        .map(|font| FontStyle {
            name: non_empty(&font.get_name().to_string()),
            size: Some(font.get_size().clone()).filter(|size| *size > 0.0),
            bold: font.get_bold().clone(),
            italic: font.get_italic().clone(),
            underline: non_empty(&font.get_underline().to_string())
                .filter(|kind| kind != "none"),
            strikethrough: font.get_strikethrough().clone(),
            color: color_from_umya(font.get_color()),
            vertical_text: match font.get_vertical_text_alignment().get_val() {
                VerticalAlignmentRunValues::Superscript => Some("superscript".to_string()),
                VerticalAlignmentRunValues::Subscript => Some("subscript".to_string()),
                VerticalAlignmentRunValues::Baseline => None,
            },
        })
        .unwrap_or_default();

    let fill = style
        .get_fill()
        .and_then(|fill| fill.get_pattern_fill())
        .map(|pattern| FillStyle {
            pattern: Some(pattern_name(pattern.get_pattern_type()).to_string()),
            foreground_color: pattern.get_foreground_color().and_then(color_from_umya),
            background_color: pattern.get_background_color().and_then(color_from_umya),
        })
        .unwrap_or_default();

    let border = style
        .get_borders()
        .map(|borders| BorderStyle {
            left: edge_from_umya(borders.get_left()),
            right: edge_from_umya(borders.get_right()),
            top: edge_from_umya(borders.get_top()),
            bottom: edge_from_umya(borders.get_bottom()),
            diagonal: edge_from_umya(borders.get_diagonal()),
            diagonal_up: borders.get_diagonal_up().clone(),
            diagonal_down: borders.get_diagonal_down().clone(),
        })
        .unwrap_or_default();

    let alignment = style
        .get_alignment()
        .map(|alignment| AlignmentStyle {
            horizontal: horizontal_from_umya(alignment.get_horizontal()),
            vertical: vertical_from_umya(alignment.get_vertical()),
            wrap_text: alignment.get_wrap_text().clone(),
            text_rotation: alignment.get_text_rotation().clone(),
            ..AlignmentStyle::default()
        })
        .unwrap_or_default();

    CellStyle {
        number_format,
        font,
        fill,
        border,
        alignment,
    }
}

fn edge_from_umya(border: &Border) -> BorderEdge {
    BorderEdge {
        style: non_empty(&border.get_border_style().to_string()).filter(|style| style != "none"),
        color: color_from_umya(border.get_color()),
    }
}

// Builds a brand-new umya style field by field; nothing is shared with the
// reference cell's style.
fn style_to_umya(source: &CellStyle) -> Style {
    let mut style = Style::default();

    style
        .get_number_format_mut()
        .set_format_code(source.number_format.clone());

    let font = style.get_font_mut();
    if let Some(name) = &source.font.name {
        font.set_name(name.clone());
    }
    if let Some(size) = source.font.size {
        font.set_size(size);
    }
    font.set_bold(source.font.bold);
    font.set_italic(source.font.italic);
    font.set_strikethrough(source.font.strikethrough);
    if let Some(underline) = &source.font.underline {
        font.set_underline(underline.clone());
    }
    if let Some(color) = &source.font.color {
        color_to_umya(color, font.get_color_mut());
    }
    let run = match source.font.vertical_text.as_deref() {
        Some("superscript") => Some(VerticalAlignmentRunValues::Superscript),
        Some("subscript") => Some(VerticalAlignmentRunValues::Subscript),
        _ => None,
    };
    if let Some(run) = run {
        font.get_vertical_text_alignment_mut().set_val(run);
    }

    if let Some(pattern) = source.fill.pattern.as_deref().and_then(pattern_from_name) {
        let fill = style.get_fill_mut().get_pattern_fill_mut();
        fill.set_pattern_type(pattern);
        if let Some(color) = &source.fill.foreground_color {
            color_to_umya(color, fill.get_foreground_color_mut());
        }
        if let Some(color) = &source.fill.background_color {
            color_to_umya(color, fill.get_background_color_mut());
        }
    }

    let borders = style.get_borders_mut();
    edge_to_umya(&source.border.left, borders.get_left_mut());
    edge_to_umya(&source.border.right, borders.get_right_mut());
    edge_to_umya(&source.border.top, borders.get_top_mut());
    edge_to_umya(&source.border.bottom, borders.get_bottom_mut());
    edge_to_umya(&source.border.diagonal, borders.get_diagonal_mut());
    borders.set_diagonal_up(source.border.diagonal_up);
    borders.set_diagonal_down(source.border.diagonal_down);

    let alignment = style.get_alignment_mut();
    alignment.set_horizontal(horizontal_to_umya(source.alignment.horizontal));
    alignment.set_vertical(vertical_to_umya(source.alignment.vertical));
    alignment.set_wrap_text(source.alignment.wrap_text);
    alignment.set_text_rotation(source.alignment.text_rotation);

    style
}

fn edge_to_umya(edge: &BorderEdge, target: &mut Border) {
    if let Some(kind) = &edge.style {
        target.set_border_style(kind.clone());
    }
    if let Some(color) = &edge.color {
        color_to_umya(color, target.get_color_mut());
    }
}

#[allow(unreachable_patterns)]
fn horizontal_from_umya(value: &HorizontalAlignmentValues) -> HorizontalAlign {
    match value {
        HorizontalAlignmentValues::General => HorizontalAlign::General,
        HorizontalAlignmentValues::Left => HorizontalAlign::Left,
        HorizontalAlignmentValues::Center => HorizontalAlign::Center,
        HorizontalAlignmentValues::Right => HorizontalAlign::Right,
        HorizontalAlignmentValues::Fill => HorizontalAlign::Fill,
        HorizontalAlignmentValues::Justify => HorizontalAlign::Justify,
        HorizontalAlignmentValues::CenterContinuous => HorizontalAlign::CenterContinuous,
        HorizontalAlignmentValues::Distributed => HorizontalAlign::Distributed,
        _ => HorizontalAlign::General,
    }
}

fn horizontal_to_umya(value: HorizontalAlign) -> HorizontalAlignmentValues {
    match value {
        HorizontalAlign::General => HorizontalAlignmentValues::General,
        HorizontalAlign::Left => HorizontalAlignmentValues::Left,
        HorizontalAlign::Center => HorizontalAlignmentValues::Center,
        HorizontalAlign::Right => HorizontalAlignmentValues::Right,
        HorizontalAlign::Fill => HorizontalAlignmentValues::Fill,
        HorizontalAlign::Justify => HorizontalAlignmentValues::Justify,
        HorizontalAlign::CenterContinuous => HorizontalAlignmentValues::CenterContinuous,
        HorizontalAlign::Distributed => HorizontalAlignmentValues::Distributed,
    }
}

#[allow(unreachable_patterns)]
fn vertical_from_umya(value: &VerticalAlignmentValues) -> VerticalAlign {
    match value {
        VerticalAlignmentValues::Top => VerticalAlign::Top,
        VerticalAlignmentValues::Center => VerticalAlign::Center,
        VerticalAlignmentValues::Bottom => VerticalAlign::Bottom,
        VerticalAlignmentValues::Justify => VerticalAlign::Justify,
        VerticalAlignmentValues::Distributed => VerticalAlign::Distributed,
        _ => VerticalAlign::Bottom,
    }
}

fn vertical_to_umya(value: VerticalAlign) -> VerticalAlignmentValues {
    match value {
        VerticalAlign::Top => VerticalAlignmentValues::Top,
        VerticalAlign::Center => VerticalAlignmentValues::Center,
        VerticalAlign::Bottom => VerticalAlignmentValues::Bottom,
        VerticalAlign::Justify => VerticalAlignmentValues::Justify,
        VerticalAlign::Distributed => VerticalAlignmentValues::Distributed,
    }
}

const PATTERNS: [(PatternValues, &str); 19] = [
    (PatternValues::None, "none"),
    (PatternValues::Solid, "solid"),
    (PatternValues::MediumGray, "mediumGray"),
    (PatternValues::DarkGray, "darkGray"),
    (PatternValues::LightGray, "lightGray"),
    (PatternValues::DarkHorizontal, "darkHorizontal"),
    (PatternValues::DarkVertical, "darkVertical"),
    (PatternValues::DarkDown, "darkDown"),
    (PatternValues::DarkUp, "darkUp"),
    (PatternValues::DarkGrid, "darkGrid"),
    (PatternValues::DarkTrellis, "darkTrellis"),
    (PatternValues::LightHorizontal, "lightHorizontal"),
    (PatternValues::LightVertical, "lightVertical"),
    (PatternValues::LightDown, "lightDown"),
    (PatternValues::LightUp, "lightUp"),
    (PatternValues::LightGrid, "lightGrid"),
    (PatternValues::LightTrellis, "lightTrellis"),
    (PatternValues::Gray125, "gray125"),
    (PatternValues::Gray0625, "gray0625"),
];

fn pattern_name(value: &PatternValues) -> &'static str {
    PATTERNS
        .iter()
        .find(|(pattern, _)| pattern == value)
        .map(|(_, name)| *name)
        .unwrap_or("none")
}

fn pattern_from_name(name: &str) -> Option<PatternValues> {
    PATTERNS
        .iter()
        .find(|(_, known)| *known == name)
        .map(|(pattern, _)| pattern.clone())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_names_round_trip() {
        for (pattern, name) in PATTERNS.iter() {
            assert_eq!(pattern_name(pattern), *name);
            assert_eq!(pattern_from_name(name), Some(pattern.clone()));
        }
        assert_eq!(pattern_from_name("checkerboard"), None);
    }

    #[test]
    fn fresh_umya_style_carries_every_attribute() {
        let source = CellStyle {
            number_format: "#,##0.00".into(),
            font: FontStyle {
                name: Some("Arial".into()),
                size: Some(12.0),
                bold: true,
                italic: true,
                underline: Some("single".into()),
                strikethrough: false,
                color: Some(ColorSpec::argb("FFFF0000")),
                vertical_text: Some("superscript".into()),
            },
            fill: FillStyle {
                pattern: Some("solid".into()),
                foreground_color: Some(ColorSpec::argb("FFFFFF00")),
                background_color: None,
            },
            border: BorderStyle {
                bottom: BorderEdge {
                    style: Some("thin".into()),
                    color: Some(ColorSpec::argb("FF000000")),
                },
                diagonal: BorderEdge {
                    style: Some("dashed".into()),
                    color: None,
                },
                diagonal_down: true,
                ..BorderStyle::default()
            },
            alignment: AlignmentStyle {
                horizontal: HorizontalAlign::Right,
                vertical: VerticalAlign::Center,
                wrap_text: true,
                ..AlignmentStyle::default()
            },
        };

        let restored = style_from_umya(&style_to_umya(&source));

        assert_eq!(restored.number_format, "#,##0.00");
        assert_eq!(restored.font.name.as_deref(), Some("Arial"));
        assert_eq!(restored.font.size, Some(12.0));
        assert!(restored.font.bold);
        assert!(restored.font.italic);
        assert_eq!(restored.font.color, Some(ColorSpec::argb("FFFF0000")));
        assert_eq!(restored.font.vertical_text.as_deref(), Some("superscript"));
        assert_eq!(restored.fill.pattern.as_deref(), Some("solid"));
        assert_eq!(
            restored.fill.foreground_color,
            Some(ColorSpec::argb("FFFFFF00"))
        );
        assert_eq!(restored.fill.background_color, None);
        assert_eq!(restored.border.bottom.style.as_deref(), Some("thin"));
        assert_eq!(restored.border.left.style, None);
        assert_eq!(restored.border.left.color, None);
        assert_eq!(restored.border.diagonal.style.as_deref(), Some("dashed"));
        assert!(restored.border.diagonal_down);
        assert!(!restored.border.diagonal_up);
        assert_eq!(restored.alignment.horizontal, HorizontalAlign::Right);
        assert_eq!(restored.alignment.vertical, VerticalAlign::Center);
        assert!(restored.alignment.wrap_text);
    }

    #[test]
    fn theme_and_indexed_colours_survive_the_copy() {
        let mut reference = Style::default();
        {
            let fill = reference.get_fill_mut().get_pattern_fill_mut();
            fill.set_pattern_type(PatternValues::Solid);
            let foreground = fill.get_foreground_color_mut();
            foreground.set_theme_index(4);
            foreground.set_tint(-0.25);
            fill.get_background_color_mut().set_theme_index(0);
        }
        reference
            .get_borders_mut()
            .get_top_mut()
            .get_color_mut()
            .set_indexed(64);

        let snapshot = style_from_umya(&reference);
        assert_eq!(
            snapshot.fill.foreground_color,
            Some(ColorSpec::theme(4, Some(-0.25)))
        );
        assert_eq!(
            snapshot.fill.background_color,
            Some(ColorSpec::theme(0, None))
        );
        assert!(snapshot.border.top.color.is_some());

        let copied = style_from_umya(&style_to_umya(&snapshot));
        assert_eq!(copied.fill, snapshot.fill);
        assert_eq!(copied.border.top.color, snapshot.border.top.color);
    }
}
