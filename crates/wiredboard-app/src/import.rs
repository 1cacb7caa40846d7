//! Dropped image decoding.
//!
//! Decodes run off the event loop (a worker thread on native, a spawned
//! future on wasm) and report back through a channel that the app drains
//! between events.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use thiserror::Error;
use wiredboard_core::elements::{ImageFormat, data_uri};
use wiredboard_core::interaction::ImportTicket;

/// Image import errors.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("Dropped file is empty")]
    Empty,
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// A decoded image ready to become an element.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub mime: String,
    /// `data:` URI carrying the original bytes.
    pub content: String,
    /// Pixel size, when the format is one we can measure.
    pub dimensions: Option<(u32, u32)>,
}

/// Turn dropped file bytes into element content.
///
/// The file is accepted when its MIME type starts with `image/`, or when the
/// bytes carry a known image signature.
pub fn decode_image(mime: Option<&str>, data: &[u8]) -> Result<DecodedImage, ImportError> {
    if data.is_empty() {
        return Err(ImportError::Empty);
    }

    let declared = mime.map(str::trim).filter(|m| m.starts_with("image/"));
    let sniffed = ImageFormat::from_magic_bytes(data);
    let mime = match (declared, sniffed) {
        (Some(declared), _) => declared.to_string(),
        (None, Some(format)) => format.mime_type().to_string(),
        (None, None) => {
            return Err(ImportError::UnsupportedType(
                mime.unwrap_or("unknown").to_string(),
            ));
        }
    };

    // Raster formats we know are measured, which also rejects truncated files.
    let dimensions = match sniffed.or_else(|| ImageFormat::from_mime(&mime)) {
        Some(_) => {
            let decoded = image::load_from_memory(data).map_err(|e| ImportError::Decode(e.to_string()))?;
            Some((decoded.width(), decoded.height()))
        }
        None => None,
    };

    Ok(DecodedImage {
        content: data_uri(&mime, data),
        mime,
        dimensions,
    })
}

/// Result of one finished decode.
#[derive(Debug)]
pub struct CompletedImport {
    pub ticket: ImportTicket,
    pub file_name: String,
    pub result: Result<DecodedImage, ImportError>,
}

/// In-flight decodes and their completion channel.
pub struct ImportQueue {
    tx: Sender<CompletedImport>,
    rx: Receiver<CompletedImport>,
    in_flight: usize,
}

impl Default for ImportQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, in_flight: 0 }
    }

    /// Number of decodes not yet drained.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Start decoding a dropped file.
    pub fn submit(&mut self, ticket: ImportTicket, file_name: String, mime: Option<String>, data: Vec<u8>) {
        let tx = self.tx.clone();
        self.in_flight += 1;
        log::debug!("Decoding {} ({} bytes)", file_name, data.len());

        let job = move || {
            let result = decode_image(mime.as_deref(), &data);
            // The receiver only goes away with the app itself.
            let _ = tx.send(CompletedImport {
                ticket,
                file_name,
                result,
            });
        };

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(job);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move { job() });
    }

    /// Collect every decode that has finished so far.
    pub fn drain(&mut self) -> Vec<CompletedImport> {
        let mut done = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(completed) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    done.push(completed);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        done
    }

    /// Block until every submitted decode has finished.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn wait(&mut self) -> Vec<CompletedImport> {
        let mut done = Vec::new();
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(completed) => {
                    self.in_flight -= 1;
                    done.push(completed);
                }
                Err(_) => break,
            }
        }
        done
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use kurbo::Point;
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_decode_png_by_mime() {
        let decoded = decode_image(Some("image/png"), &png_bytes(4, 3)).unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.dimensions, Some((4, 3)));
        assert!(decoded.content.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_decode_sniffs_missing_mime() {
        let decoded = decode_image(None, &png_bytes(2, 2)).unwrap();
        assert_eq!(decoded.mime, "image/png");
        let decoded = decode_image(Some("application/octet-stream"), &png_bytes(2, 2)).unwrap();
        assert_eq!(decoded.mime, "image/png");
    }

    #[test]
    fn test_unmeasured_image_type_accepted() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;
        let decoded = decode_image(Some("image/svg+xml"), svg).unwrap();
        assert_eq!(decoded.dimensions, None);
        assert!(decoded.content.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(decode_image(Some("image/png"), &[]), Err(ImportError::Empty)));
        assert!(matches!(
            decode_image(Some("text/plain"), b"hello world"),
            Err(ImportError::UnsupportedType(t)) if t == "text/plain"
        ));
        let mut truncated = png_bytes(8, 8);
        truncated.truncate(20);
        assert!(matches!(decode_image(Some("image/png"), &truncated), Err(ImportError::Decode(_))));
    }

    #[test]
    fn test_queue_roundtrip() {
        let mut queue = ImportQueue::new();
        let ticket = ImportTicket {
            position: Point::new(1.0, 2.0),
            generation: 0,
        };
        queue.submit(ticket, "a.png".to_string(), Some("image/png".to_string()), png_bytes(1, 1));
        queue.submit(ticket, "b.txt".to_string(), Some("text/plain".to_string()), b"x".to_vec());
        assert_eq!(queue.pending(), 2);

        let mut done = queue.wait();
        assert_eq!(queue.pending(), 0);
        done.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        assert!(done[0].result.is_ok());
        assert!(done[1].result.is_err());
        assert!(queue.drain().is_empty());
    }
}
