//! Banner Composer - Letterhead Block for Declaration Pages

use std::fs;
use std::path::Path;

use image::ImageFormat;
use tracing::{debug, warn};

use crate::builder::{Alignment, BorderLine, DocumentBuilder, ImageAsset, ParagraphFormat, RunStyle};

pub const LOGO_WIDTH_CM: f32 = 6.4;
pub const FALLBACK_LABEL: &str = "UNIDAD DE ANÁLISIS FINANCIERO";

fn divider() -> BorderLine {
    BorderLine {
        size: 8,
        space: 1,
        color: "666666".to_string(),
    }
}

/// Load the letterhead logo. Any failure means "no logo", never an error.
pub fn load_logo(path: &Path) -> Option<ImageAsset> {
    if !path.exists() {
        debug!(path = %path.display(), "logo asset not found, using text letterhead");
        return None;
    }

    let extension = match ImageFormat::from_path(path) {
        Ok(ImageFormat::Png) => "png",
        Ok(ImageFormat::Jpeg) => "jpeg",
        Ok(other) => {
            warn!(path = %path.display(), format = ?other, "unsupported logo format");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot determine logo format");
            return None;
        }
    };

    let (width_px, height_px) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read logo dimensions");
            return None;
        }
    };

    match fs::read(path) {
        Ok(bytes) => Some(ImageAsset {
            bytes,
            extension: extension.to_string(),
            width_px,
            height_px,
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read logo");
            None
        }
    }
}

/// Emit the logo (or text fallback) paragraph and the ruled divider under it.
pub fn compose_banner<B: DocumentBuilder + ?Sized>(
    builder: &mut B,
    page_break_before: bool,
    logo: Option<&ImageAsset>,
) {
    if page_break_before {
        builder.add_page_break();
    }

    builder.add_paragraph(
        ParagraphFormat::new()
            .align(Alignment::Left)
            .space_before(0.0)
            .space_after(4.0),
    );
    match logo {
        Some(image) => builder.add_image(image, LOGO_WIDTH_CM),
        None => builder.add_run(FALLBACK_LABEL, RunStyle::bold().size(12.0)),
    }

    builder.add_paragraph(
        ParagraphFormat::new()
            .space_before(0.0)
            .space_after(10.0)
            .bottom_border(divider()),
    );
}
