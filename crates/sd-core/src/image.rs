//! Decoded image resources.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Serde helper: `Vec<u8>` as a base64 string, the form image payloads take
/// inside JSON content.
pub(crate) mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// A validated raster image: the original encoded bytes plus the pixel
/// dimensions read at decode time.
///
/// The encoded bytes are kept rather than decoded pixels so that content
/// round-trips byte-for-byte and stays compact in the interchange form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResource {
    #[serde(with = "base64_bytes")]
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl ImageResource {
    /// Decode image bytes (PNG or JPEG), failing with
    /// [`SessionError::ImageDecode`](crate::SessionError::ImageDecode) on
    /// anything unreadable.
    pub fn decode(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionError;

    fn png_fixture(w: u32, h: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decode_reads_dimensions_and_keeps_bytes() {
        let bytes = png_fixture(3, 2);
        let res = ImageResource::decode(bytes.clone()).unwrap();
        assert_eq!((res.width(), res.height()), (3, 2));
        assert_eq!(res.bytes(), &bytes[..]);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = ImageResource::decode(&b"not an image"[..]).unwrap_err();
        assert!(matches!(err, SessionError::ImageDecode(_)));
    }

    #[test]
    fn serde_roundtrip_is_base64() {
        let res = ImageResource::decode(png_fixture(1, 1)).unwrap();
        let json = serde_json::to_string(&res).unwrap();
        assert!(json.contains("\"bytes\":\""), "bytes field is a string");
        let back: ImageResource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, res);
    }
}
