//! Decoded frame buffer and payload decoding.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{PipelineError, PipelineResult};

/// An inbound frame payload as received from the transport.
#[derive(Debug, Clone)]
pub enum FramePayload {
    /// Base64-encoded image, optionally carrying a `data:image/...;base64,`
    /// prefix.
    Base64(String),
    /// Raw encoded image bytes (JPEG/PNG).
    Binary(Vec<u8>),
}

/// An immutable decoded RGB frame.
///
/// Owned exclusively by the dispatch task processing it; dropped once
/// processing completes.
#[derive(Debug)]
pub struct Frame {
    seq: u64,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Decode a transport payload into an RGB frame with the given sequence
    /// number.
    ///
    /// Grayscale and RGBA inputs are converted to RGB.
    pub fn decode(seq: u64, payload: &FramePayload) -> PipelineResult<Frame> {
        match payload {
            FramePayload::Base64(data) => {
                // Strip the data-URL header if the browser sent one
                let encoded = match data.split_once("base64,") {
                    Some((_, rest)) => rest,
                    None => data.as_str(),
                };
                let bytes = BASE64
                    .decode(encoded.trim())
                    .map_err(|e| PipelineError::decode(format!("invalid base64: {e}")))?;
                Self::from_encoded(seq, &bytes)
            }
            FramePayload::Binary(bytes) => Self::from_encoded(seq, bytes),
        }
    }

    /// Build a frame from an already-decoded RGB8 buffer.
    ///
    /// `data` must hold exactly `width * height * 3` bytes.
    pub fn from_rgb(seq: u64, width: u32, height: u32, data: Vec<u8>) -> PipelineResult<Frame> {
        if width == 0 || height == 0 {
            return Err(PipelineError::decode("empty image"));
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(PipelineError::decode(format!(
                "RGB buffer length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Frame {
            seq,
            width,
            height,
            data,
        })
    }

    fn from_encoded(seq: u64, bytes: &[u8]) -> PipelineResult<Frame> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| PipelineError::decode(format!("unsupported image data: {e}")))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::decode("empty image"));
        }
        Ok(Frame {
            seq,
            width,
            height,
            data: image.into_raw(),
        })
    }

    /// Sequence number assigned at admission time.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB8 pixel data, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 red PNG.
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0xF8,
        0xCF, 0xC0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0xF7, 0x03, 0x41, 0x43, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_decode_binary() {
        let frame = Frame::decode(0, &FramePayload::Binary(TINY_PNG.to_vec())).unwrap();
        assert_eq!(frame.width(), 1);
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.data().len(), 3);
    }

    #[test]
    fn test_decode_base64_with_data_url_prefix() {
        let payload = format!("data:image/png;base64,{}", BASE64.encode(TINY_PNG));
        let frame = Frame::decode(7, &FramePayload::Base64(payload)).unwrap();
        assert_eq!(frame.seq(), 7);
        assert_eq!(frame.width(), 1);
    }

    #[test]
    fn test_decode_bare_base64() {
        let frame = Frame::decode(0, &FramePayload::Base64(BASE64.encode(TINY_PNG))).unwrap();
        assert_eq!(frame.height(), 1);
    }

    #[test]
    fn test_decode_garbage_base64() {
        let err = Frame::decode(0, &FramePayload::Base64("!!not-base64!!".into())).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[test]
    fn test_decode_garbage_bytes() {
        let err = Frame::decode(0, &FramePayload::Binary(vec![0, 1, 2, 3])).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[test]
    fn test_from_rgb_length_mismatch() {
        let err = Frame::from_rgb(0, 2, 2, vec![0u8; 5]).unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert!(Frame::from_rgb(0, 2, 2, vec![0u8; 12]).is_ok());
    }
}
