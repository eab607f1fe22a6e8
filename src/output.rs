use image::{ImageError, ImageFormat, RgbImage};
use std::path::Path;

use crate::error::{Error, Result};

/// Write an RGB image, choosing the encoding from the file extension.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        Error::parameter(format!("no image format for {}: {}", path.display(), e))
    })?;

    image.save_with_format(path, format).map_err(|e| match e {
        ImageError::IoError(source) => Error::FileOpen {
            path: path.to_path_buf(),
            source,
        },
        other => Error::parameter(format!("cannot write {}: {}", path.display(), other)),
    })?;

    let (w, h) = image.dimensions();
    tracing::info!("Wrote {}x{} {:?} image to {}", w, h, format, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::Rgb;

    #[test]
    fn format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 80, y as u8 * 100, 7]));
        for name in ["out.bmp", "out.png"] {
            let path = dir.path().join(name);
            save_image(&img, &path).unwrap();
            assert_eq!(image::open(&path).unwrap().to_rgb8(), img);
        }
    }

    #[test]
    fn unknown_extension_and_bad_directory() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(1, 1);
        let err = save_image(&img, &dir.path().join("out.nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameter);

        let err = save_image(&img, &dir.path().join("missing/out.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileOpen);
    }
}
