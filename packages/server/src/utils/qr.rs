use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

/// Prefix of every QR code data URL produced by [`to_data_url`].
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR code generation failed: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("QR code rendering failed: {0}")]
    Render(#[from] image::ImageError),
}

/// Encode `link` as a QR code and return it as a PNG data URL.
pub fn to_data_url(link: &str) -> Result<String, QrError> {
    let code = QrCode::new(link.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(200, 200)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(png)))
}
