//! Share artifacts: the public play link and its scannable QR code.

use giftwrap_domain::ExperienceId;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Luma};
use qrcode::QrCode;

/// Minimum rendered QR size in pixels; scales up for longer payloads.
const QR_MIN_DIMENSIONS: u32 = 240;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("QR encoding failed: {0}")]
    Qr(String),
    #[error("PNG encoding failed: {0}")]
    Png(String),
}

/// The derived shareable artifacts for one experience.
#[derive(Debug, Clone)]
pub struct ShareArtifacts {
    pub play_url: String,
    pub qr_png: Vec<u8>,
}

/// Derives public URLs and QR codes from the configured base domain.
#[derive(Debug, Clone)]
pub struct ShareLinkBuilder {
    base_url: String,
}

impl ShareLinkBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Canonical play URL for the full (paid) experience.
    pub fn play_url(&self, id: &ExperienceId) -> String {
        format!("{}/experience/{}", self.base_url, id)
    }

    /// Preview URL shown before payment.
    pub fn demo_url(&self, id: &ExperienceId) -> String {
        format!("{}/demo/{}", self.base_url, id)
    }

    /// Build the play link and render it into a QR PNG.
    pub fn build(&self, id: &ExperienceId) -> Result<ShareArtifacts, ShareError> {
        let play_url = self.play_url(id);

        let code = QrCode::new(play_url.as_bytes()).map_err(|e| ShareError::Qr(e.to_string()))?;
        let img = code
            .render::<Luma<u8>>()
            .min_dimensions(QR_MIN_DIMENSIONS, QR_MIN_DIMENSIONS)
            .build();

        let mut qr_png = Vec::new();
        PngEncoder::new(&mut qr_png)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                ExtendedColorType::L8,
            )
            .map_err(|e| ShareError::Png(e.to_string()))?;

        Ok(ShareArtifacts { play_url, qr_png })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_derived_from_the_base_domain() {
        let share = ShareLinkBuilder::new("https://giftwrap.example/");
        let id = ExperienceId::from_string("ab12cd34");
        assert_eq!(
            share.play_url(&id),
            "https://giftwrap.example/experience/ab12cd34"
        );
        assert_eq!(share.demo_url(&id), "https://giftwrap.example/demo/ab12cd34");
    }

    #[test]
    fn build_renders_a_png() {
        let share = ShareLinkBuilder::new("https://giftwrap.example");
        let id = ExperienceId::from_string("ab12cd34");
        let artifacts = share.build(&id).expect("artifacts");

        assert!(artifacts.play_url.ends_with("/experience/ab12cd34"));
        // PNG magic bytes
        assert_eq!(&artifacts.qr_png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
