//! Share targets: where an exported drawing goes.

use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Share errors.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Render failed: {0}")]
    Render(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// An exported drawing in both raw and encoded form.
#[derive(Debug, Clone)]
pub struct SharedImage {
    /// Straight-alpha RGBA pixels.
    pub rgba: RgbaImage,
    /// PNG-encoded bytes.
    pub png: Vec<u8>,
}

impl SharedImage {
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
}

/// A destination for exported drawings.
pub trait ShareTarget {
    fn share(&self, image: &SharedImage) -> Result<(), ShareError>;
}

/// Writes each shared image as a new PNG in a directory.
pub struct DirectoryShare {
    dir: PathBuf,
}

impl DirectoryShare {
    /// Create the target, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ShareError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            ShareError::Io(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ShareTarget for DirectoryShare {
    fn share(&self, image: &SharedImage) -> Result<(), ShareError> {
        let path = self.dir.join(format!("doodle-{}.png", Uuid::new_v4()));
        fs::write(&path, &image.png)
            .map_err(|e| ShareError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
        log::info!("Exported PNG to: {:?}", path);
        Ok(())
    }
}

#[cfg(feature = "native")]
mod native {
    use super::{ShareError, ShareTarget, SharedImage};

    /// Asks the user where to save the PNG.
    pub struct FileShare;

    impl ShareTarget for FileShare {
        fn share(&self, image: &SharedImage) -> Result<(), ShareError> {
            let dialog = rfd::FileDialog::new()
                .set_title("Save Doodle")
                .set_file_name("doodle.png")
                .add_filter("PNG Image", &["png"]);

            let Some(path) = dialog.save_file() else {
                log::debug!("Save dialog cancelled");
                return Ok(());
            };
            std::fs::write(&path, &image.png)
                .map_err(|e| ShareError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
            log::info!("Exported PNG to: {:?}", path);
            Ok(())
        }
    }

    /// Copies the image to the system clipboard.
    pub struct ClipboardShare;

    impl ShareTarget for ClipboardShare {
        fn share(&self, image: &SharedImage) -> Result<(), ShareError> {
            // arboard expects raw RGBA, not PNG
            let image_data = arboard::ImageData {
                width: image.width() as usize,
                height: image.height() as usize,
                bytes: std::borrow::Cow::Borrowed(image.rgba.as_raw()),
            };
            let mut clipboard =
                arboard::Clipboard::new().map_err(|e| ShareError::Clipboard(e.to_string()))?;
            clipboard
                .set_image(image_data)
                .map_err(|e| ShareError::Clipboard(e.to_string()))?;
            log::info!("Copied {}x{} image to clipboard", image.width(), image.height());
            Ok(())
        }
    }
}

#[cfg(feature = "native")]
pub use native::{ClipboardShare, FileShare};

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_directory_share_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryShare::new(dir.path().join("exports")).unwrap();
        let image = SharedImage {
            rgba: RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])),
            png: b"\x89PNG fake".to_vec(),
        };

        target.share(&image).unwrap();
        target.share(&image).unwrap();

        let files: Vec<_> = fs::read_dir(target.dir()).unwrap().collect();
        assert_eq!(files.len(), 2);
    }
}
