use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Visual properties applied to header or body cells. Colors are `#RRGGBB`
/// strings; `None` leaves the backend default in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    pub font_size: f64,
    pub font_name: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub font_color: Option<String>,
    pub fill_color: Option<String>,
    pub wrap_text: bool,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    pub border_style: BorderStyle,
    pub border_color: Option<String>,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            font_name: None,
            bold: false,
            italic: false,
            font_color: None,
            fill_color: None,
            wrap_text: false,
            horizontal_alignment: HorizontalAlignment::Left,
            vertical_alignment: VerticalAlignment::Top,
            border_style: BorderStyle::None,
            border_color: None,
        }
    }
}

/// One aspect of a cell style (font, fill/alignment, border) that can be
/// layered onto an existing style.
pub trait StyleAspect {
    fn apply(&self, style: &mut CellStyle);
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontAspect {
    pub name: Option<String>,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<String>,
}

impl Default for FontAspect {
    fn default() -> Self {
        Self {
            name: None,
            size: 12.0,
            bold: false,
            italic: false,
            color: None,
        }
    }
}

impl StyleAspect for FontAspect {
    fn apply(&self, style: &mut CellStyle) {
        style.font_name = self.name.clone();
        style.font_size = self.size;
        style.bold = self.bold;
        style.italic = self.italic;
        style.font_color = self.color.clone();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellAspect {
    pub fill_color: Option<String>,
    pub wrap_text: bool,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
}

impl StyleAspect for CellAspect {
    fn apply(&self, style: &mut CellStyle) {
        style.fill_color = self.fill_color.clone();
        style.wrap_text = self.wrap_text;
        style.horizontal_alignment = self.horizontal_alignment;
        style.vertical_alignment = self.vertical_alignment;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderAspect {
    pub style: BorderStyle,
    pub color: Option<String>,
}

impl StyleAspect for BorderAspect {
    fn apply(&self, style: &mut CellStyle) {
        style.border_style = self.style;
        style.border_color = self.color.clone();
    }
}

/// Style declarations for one section (header or body) of a record type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionStyles {
    pub style: Option<CellStyle>,
    pub font: Option<FontAspect>,
    pub cell: Option<CellAspect>,
    pub border: Option<BorderAspect>,
}

impl SectionStyles {
    /// Whole-style declaration first, otherwise the aspects layered onto a
    /// default style. `None` when the section declares nothing.
    pub fn resolve(&self) -> Option<CellStyle> {
        if let Some(style) = &self.style {
            return Some(style.clone());
        }
        let aspects: [Option<&dyn StyleAspect>; 3] = [
            self.font.as_ref().map(|aspect| aspect as &dyn StyleAspect),
            self.cell.as_ref().map(|aspect| aspect as &dyn StyleAspect),
            self.border.as_ref().map(|aspect| aspect as &dyn StyleAspect),
        ];
        if aspects.iter().all(Option::is_none) {
            return None;
        }
        let mut style = CellStyle::default();
        for aspect in aspects.into_iter().flatten() {
            aspect.apply(&mut style);
        }
        Some(style)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeStyles {
    pub header: SectionStyles,
    pub body: SectionStyles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_resolves_to_none() {
        assert_eq!(SectionStyles::default().resolve(), None);
    }

    #[test]
    fn whole_style_wins_over_aspects() {
        let section = SectionStyles {
            style: Some(CellStyle {
                bold: true,
                ..CellStyle::default()
            }),
            font: Some(FontAspect {
                size: 20.0,
                ..FontAspect::default()
            }),
            ..SectionStyles::default()
        };
        let resolved = section.resolve().unwrap();
        assert!(resolved.bold);
        assert_eq!(resolved.font_size, 12.0);
    }

    #[test]
    fn aspects_layer_onto_default_style() {
        let section = SectionStyles {
            font: Some(FontAspect {
                bold: true,
                ..FontAspect::default()
            }),
            border: Some(BorderAspect {
                style: BorderStyle::Thin,
                color: Some("#000000".to_string()),
            }),
            ..SectionStyles::default()
        };
        let resolved = section.resolve().unwrap();
        assert!(resolved.bold);
        assert_eq!(resolved.border_style, BorderStyle::Thin);
        assert_eq!(resolved.fill_color, None);
    }
}
