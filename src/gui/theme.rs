/// Theme system: a light and a dark report theme
///
/// Both themes take their accents from the report's primary and secondary
/// brand colors so the widgets match the chart palette.

use egui::Color32;

use crate::config::{PRIMARY_COLOR, SECONDARY_COLOR};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AppTheme {
    Light,
    Dark,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Light => "☀ Light",
            AppTheme::Dark => "🌙 Dark",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Light => AppTheme::Dark,
            AppTheme::Dark => AppTheme::Light,
        }
    }
}

fn rgb(c: [u8; 3]) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub panel_fill: Color32,
    pub window_fill: Color32,
    pub faint_bg: Color32,

    pub widget_bg: Color32,
    pub widget_bg_stroke: Color32,
    pub widget_inactive_bg: Color32,
    pub widget_hovered_bg: Color32,
    pub widget_hovered_stroke: Color32,
    pub widget_active_bg: Color32,

    pub selection_bg: Color32,
    pub selection_stroke: Color32,

    pub text_primary: Color32,
    pub text_muted: Color32,
    pub heading: Color32,

    pub accent: Color32,
    pub success: Color32,
    pub error: Color32,

    pub status_bar_bg: Color32,
    pub status_text: Color32,
    pub shadow_color: Color32,

    pub is_dark: bool,
}

impl ThemeColors {
    pub fn from_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Light => Self::light(),
            AppTheme::Dark => Self::dark(),
        }
    }

    fn light() -> Self {
        Self {
            panel_fill: Color32::from_rgb(0xF7, 0xF8, 0xF9),
            window_fill: Color32::WHITE,
            faint_bg: Color32::from_rgb(0xEF, 0xF2, 0xF4),

            widget_bg: Color32::from_rgb(0xEB, 0xEE, 0xF0),
            widget_bg_stroke: Color32::from_rgb(0xD0, 0xD5, 0xDA),
            widget_inactive_bg: Color32::from_rgb(0xE2, 0xE7, 0xEB),
            widget_hovered_bg: Color32::from_rgb(0xD5, 0xE6, 0xEE),
            widget_hovered_stroke: rgb(SECONDARY_COLOR),
            widget_active_bg: rgb(SECONDARY_COLOR),

            selection_bg: Color32::from_rgba_premultiplied(0x30, 0x8A, 0xAD, 0x40),
            selection_stroke: rgb(SECONDARY_COLOR),

            text_primary: Color32::from_rgb(0x22, 0x28, 0x30),
            text_muted: Color32::from_rgb(0x86, 0x8C, 0x94),
            heading: rgb(PRIMARY_COLOR),

            accent: rgb(SECONDARY_COLOR),
            success: Color32::from_rgb(0x27, 0x8B, 0x4A),
            error: Color32::from_rgb(0xD0, 0x30, 0x30),

            status_bar_bg: Color32::from_rgb(0xEF, 0xF2, 0xF4),
            status_text: Color32::from_rgb(0x44, 0x4A, 0x52),
            shadow_color: Color32::from_rgba_premultiplied(0, 0, 0, 25),

            is_dark: false,
        }
    }

    fn dark() -> Self {
        Self {
            panel_fill: rgb(PRIMARY_COLOR),
            window_fill: Color32::from_rgb(0x06, 0x1E, 0x33),
            faint_bg: Color32::from_rgb(0x0A, 0x25, 0x3A),

            widget_bg: Color32::from_rgb(0x0C, 0x2A, 0x42),
            widget_bg_stroke: Color32::from_rgb(0x1E, 0x45, 0x60),
            widget_inactive_bg: Color32::from_rgb(0x10, 0x30, 0x4A),
            widget_hovered_bg: Color32::from_rgb(0x16, 0x3C, 0x58),
            widget_hovered_stroke: Color32::from_rgb(0x5F, 0xB8, 0xD8),
            widget_active_bg: rgb(SECONDARY_COLOR),

            selection_bg: Color32::from_rgba_premultiplied(0x30, 0x8A, 0xAD, 0x60),
            selection_stroke: Color32::from_rgb(0x5F, 0xB8, 0xD8),

            text_primary: Color32::from_rgb(0xE2, 0xE8, 0xEE),
            text_muted: Color32::from_rgb(0x7A, 0x8C, 0x9C),
            heading: Color32::from_rgb(0x8F, 0xD0, 0xE8),

            accent: Color32::from_rgb(0x5F, 0xB8, 0xD8),
            success: Color32::from_rgb(0x4C, 0xC3, 0x7A),
            error: Color32::from_rgb(0xFF, 0x5A, 0x5A),

            status_bar_bg: Color32::from_rgb(0x00, 0x0E, 0x1A),
            status_text: Color32::from_rgb(0xA0, 0xB0, 0xC0),
            shadow_color: Color32::from_rgba_premultiplied(0, 0, 0, 60),

            is_dark: true,
        }
    }
}

pub fn apply_theme(ctx: &egui::Context, theme: AppTheme) {
    let c = ThemeColors::from_theme(theme);

    let mut visuals = if c.is_dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = c.panel_fill;
    visuals.window_fill = c.window_fill;
    visuals.faint_bg_color = c.faint_bg;
    visuals.override_text_color = Some(c.text_primary);

    visuals.widgets.noninteractive.bg_fill = c.widget_bg;
    visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(0.5, c.widget_bg_stroke);
    visuals.widgets.noninteractive.corner_radius = egui::CornerRadius::same(3);

    visuals.widgets.inactive.bg_fill = c.widget_inactive_bg;
    visuals.widgets.inactive.weak_bg_fill = c.widget_inactive_bg;
    visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(4);

    visuals.widgets.hovered.bg_fill = c.widget_hovered_bg;
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, c.widget_hovered_stroke);

    visuals.widgets.active.bg_fill = c.widget_active_bg;
    visuals.widgets.active.fg_stroke = egui::Stroke::new(1.5, Color32::WHITE);

    visuals.selection.bg_fill = c.selection_bg;
    visuals.selection.stroke = egui::Stroke::new(1.5, c.selection_stroke);
    visuals.hyperlink_color = c.accent;

    visuals.window_shadow = egui::epaint::Shadow {
        offset: [0, 2],
        blur: 8,
        spread: 0,
        color: c.shadow_color,
    };

    ctx.set_visuals(visuals);
}

/// Heading text in the theme's heading color
pub fn heading(text: &str, colors: &ThemeColors) -> egui::RichText {
    egui::RichText::new(text).heading().color(colors.heading)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_themes_toggle_and_share_brand_accent() {
        assert_eq!(AppTheme::Light.next(), AppTheme::Dark);
        assert_eq!(AppTheme::Dark.next(), AppTheme::Light);
        let light = ThemeColors::from_theme(AppTheme::Light);
        assert!(!light.is_dark);
        assert_eq!(light.accent, rgb(SECONDARY_COLOR));
        assert_eq!(ThemeColors::from_theme(AppTheme::Dark).panel_fill, rgb(PRIMARY_COLOR));
    }
}
