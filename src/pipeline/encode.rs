//! Image encoding: pdfium `DynamicImage` → PNG [`ImageBlob`] → base64 `ImageData`.
//!
//! Embedded PDF images come in many filters (DCT, Flate, JBIG2, CCITT) and
//! colour spaces. pdfium decodes them to a bitmap; re-encoding that bitmap as
//! PNG gives the model server a single lossless format it always accepts.

use crate::output::ImageBlob;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a decoded image object as a PNG blob.
pub fn encode_blob(index: usize, img: &DynamicImage) -> Result<ImageBlob, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    debug!(
        "Encoded image {} ({}x{}) → {} PNG bytes",
        index,
        img.width(),
        img.height(),
        buf.len()
    );

    Ok(ImageBlob {
        index,
        data: buf,
        mime_type: "image/png".to_string(),
        width: img.width(),
        height: img.height(),
    })
}

/// Wrap a blob as base64 image data for a vision request.
pub fn to_image_data(blob: &ImageBlob) -> ImageData {
    ImageData::new(STANDARD.encode(&blob.data), blob.mime_type.clone())
}
