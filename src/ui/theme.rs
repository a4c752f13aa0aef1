//! Theme configuration and the color registry.
//!
//! Supports light and dark themes with automatic terminal detection. A
//! [`Theme`] is resolved once into a [`ColorRegistry`], a fixed lookup
//! table indexed by [`ColorLabel`].

use ratatui::style::{Color, Modifier, Style};

use crate::data::SeverityBand;

/// Semantic color labels used by the layout code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorLabel {
    /// Plain text.
    Default,
    /// Labels, headers and identity lines.
    Title,
    /// Metric in the OK band.
    Ok,
    /// Metric in the WARNING band.
    Warning,
    /// Metric in the CRITICAL band.
    Critical,
    /// Inverted band used for section separators.
    Reverse,
    /// Queue table rows.
    Row,
    /// The selected queue row.
    Highlight,
    /// Error banner shown when a fetch fails.
    Banner,
    /// Footer key hints.
    Hint,
}

impl ColorLabel {
    /// Number of labels.
    pub const COUNT: usize = 10;

    /// Every label, in table order.
    pub const ALL: [ColorLabel; Self::COUNT] = [
        ColorLabel::Default,
        ColorLabel::Title,
        ColorLabel::Ok,
        ColorLabel::Warning,
        ColorLabel::Critical,
        ColorLabel::Reverse,
        ColorLabel::Row,
        ColorLabel::Highlight,
        ColorLabel::Banner,
        ColorLabel::Hint,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl From<SeverityBand> for ColorLabel {
    fn from(band: SeverityBand) -> Self {
        match band {
            SeverityBand::Ok => ColorLabel::Ok,
            SeverityBand::Warning => ColorLabel::Warning,
            SeverityBand::Critical => ColorLabel::Critical,
        }
    }
}

/// Read-only mapping from [`ColorLabel`] to a renderable [`Style`].
///
/// Built once when the screen is acquired. Lookups cannot fail: every
/// label has a slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRegistry {
    styles: [Style; ColorLabel::COUNT],
}

impl ColorRegistry {
    /// Build the registry from a theme.
    pub fn new(theme: &Theme) -> Self {
        let styles = ColorLabel::ALL.map(|label| theme.style_for(label));
        Self { styles }
    }

    /// Resolve a label to its style.
    pub fn resolve(&self, label: ColorLabel) -> Style {
        self.styles[label.index()]
    }
}

impl Default for ColorRegistry {
    fn default() -> Self {
        Self::new(&Theme::dark())
    }
}

/// Color and style theme for the dashboard.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Foreground for plain text.
    pub text: Color,
    /// Accent color for titles and labels.
    pub accent: Color,
    /// Color for the OK band.
    pub ok: Color,
    /// Color for the WARNING band.
    pub warning: Color,
    /// Color for the CRITICAL band.
    pub critical: Color,
    /// Color for queue rows.
    pub row: Color,
    /// Style for the selected queue row.
    pub selected: Style,
    /// Style for separator bands.
    pub separator: Style,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            text: Color::White,
            accent: Color::Cyan,
            ok: Color::Green,
            warning: Color::Magenta,
            critical: Color::Red,
            row: Color::Gray,
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Black).bg(Color::White),
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            text: Color::Black,
            accent: Color::Blue,
            ok: Color::Green,
            warning: Color::Magenta,
            critical: Color::Red,
            row: Color::DarkGray,
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::White).bg(Color::Black),
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Falls back to the dark palette when the terminal does not answer.
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    fn style_for(&self, label: ColorLabel) -> Style {
        match label {
            ColorLabel::Default => Style::default().fg(self.text),
            ColorLabel::Title => Style::default().fg(self.accent).add_modifier(Modifier::BOLD),
            ColorLabel::Ok => Style::default().fg(self.ok),
            ColorLabel::Warning => Style::default().fg(self.warning),
            ColorLabel::Critical => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
            ColorLabel::Reverse => self.separator,
            ColorLabel::Row => Style::default().fg(self.row),
            ColorLabel::Highlight => self.selected,
            ColorLabel::Banner => Style::default()
                .fg(Color::White)
                .bg(self.critical)
                .add_modifier(Modifier::BOLD),
            ColorLabel::Hint => Style::default().add_modifier(Modifier::DIM),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_labels_have_distinct_slots() {
        for (i, label) in ColorLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
    }

    #[test]
    fn test_resolve_severity_labels() {
        let theme = Theme::dark();
        let registry = ColorRegistry::new(&theme);
        assert_eq!(registry.resolve(ColorLabel::Ok).fg, Some(Color::Green));
        assert_eq!(registry.resolve(SeverityBand::Warning.into()).fg, Some(Color::Magenta));
        assert_eq!(registry.resolve(ColorLabel::Critical).fg, Some(Color::Red));
        assert!(registry
            .resolve(ColorLabel::Critical)
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn test_light_theme_differs() {
        let dark = ColorRegistry::new(&Theme::dark());
        let light = ColorRegistry::new(&Theme::light());
        assert_ne!(dark.resolve(ColorLabel::Title), light.resolve(ColorLabel::Title));
        assert_eq!(dark.resolve(ColorLabel::Ok), light.resolve(ColorLabel::Ok));
    }
}
