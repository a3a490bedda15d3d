//! Toggle button appearance.

use polysnap_core::EnableToggle;

/// DOM id of the toggle button; also guards against creating it twice.
pub const BUTTON_ID: &str = "wme-polygon-snap-toggle";

/// Button glyph.
pub const BUTTON_GLYPH: &str = "\u{1F9F2}";

/// Styles applied once when the button is created.
pub const BASE_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("bottom", "30px"),
    ("right", "60px"),
    ("z-index", "10000"),
    ("width", "36px"),
    ("height", "36px"),
    ("border-radius", "50%"),
    ("border", "2px solid #4a90d9"),
    ("font-size", "18px"),
    ("cursor", "pointer"),
    ("box-shadow", "0 2px 8px rgba(0,0,0,0.25)"),
    ("display", "flex"),
    ("align-items", "center"),
    ("justify-content", "center"),
    ("transition", "all 0.2s ease"),
    ("opacity", "0.9"),
    ("line-height", "1"),
];

/// Hover styles: (opacity, transform).
pub const HOVER_STYLE: (&str, &str) = ("1", "scale(1.1)");
pub const REST_STYLE: (&str, &str) = ("0.9", "scale(1)");

/// State-dependent part of the button style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleStyle {
    pub background: &'static str,
    pub border_color: &'static str,
    pub color: &'static str,
    pub title: String,
}

/// Style for the given enable state.
pub fn toggle_style(toggle: EnableToggle) -> ToggleStyle {
    let title = format!("Polygon Snap: {}", toggle.label());
    if toggle.is_enabled() {
        ToggleStyle {
            background: "#4a90d9",
            border_color: "#3a7bc8",
            color: "#fff",
            title,
        }
    } else {
        ToggleStyle {
            background: "#fff",
            border_color: "#ccc",
            color: "#999",
            title,
        }
    }
}
