//! Page Layout
//!
//! Physical page setup for the output document. Values are in centimeters
//! and points; the packaging backend converts to twips.

use serde::{Deserialize, Serialize};

/// Where the active layout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAuthority {
    /// Legacy template settings
    #[default]
    System,
    /// Supplied by a build profile (validated)
    Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Margins {
    pub top_cm: f32,
    pub bottom_cm: f32,
    pub left_cm: f32,
    pub right_cm: f32,
}

impl Margins {
    pub fn uniform(cm: f32) -> Self {
        Self { top_cm: cm, bottom_cm: cm, left_cm: cm, right_cm: cm }
    }

    fn all(&self) -> [f32; 4] {
        [self.top_cm, self.bottom_cm, self.left_cm, self.right_cm]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageLayout {
    pub authority: LayoutAuthority,
    pub page_width_cm: f32,
    pub page_height_cm: f32,
    pub margins: Margins,
    pub header_distance_cm: f32,
    pub footer_distance_cm: f32,
    pub font_name: String,
    pub font_size_pt: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            authority: LayoutAuthority::System,
            page_width_cm: 21.59,
            page_height_cm: 27.94,
            margins: Margins::uniform(2.5),
            header_distance_cm: 1.0,
            footer_distance_cm: 1.27,
            font_name: "Times New Roman".to_string(),
            font_size_pt: 11.0,
        }
    }
}

impl PageLayout {
    /// Accept a profile-supplied layout after range checks.
    pub fn from_profile(mut layout: PageLayout) -> Result<Self, &'static str> {
        if layout.margins.all().iter().any(|m| !(0.0..=10.0).contains(m)) {
            return Err("Margins must be between 0 and 10 cm");
        }
        if !(0.0..=10.0).contains(&layout.header_distance_cm)
            || !(0.0..=10.0).contains(&layout.footer_distance_cm)
        {
            return Err("Header and footer distances must be between 0 and 10 cm");
        }
        if !(6.0..=72.0).contains(&layout.font_size_pt) {
            return Err("Font size must be between 6 and 72 pt");
        }
        if layout.font_name.trim().is_empty() {
            return Err("Font name must not be empty");
        }
        let horizontal = layout.margins.left_cm + layout.margins.right_cm;
        let vertical = layout.margins.top_cm + layout.margins.bottom_cm;
        if horizontal >= layout.page_width_cm || vertical >= layout.page_height_cm {
            return Err("Margins leave no printable area");
        }
        layout.authority = LayoutAuthority::Profile;
        Ok(layout)
    }
}
