use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tree_core::constants::PHOTO_TEXTURE_MAX_SIDE;
use tree_core::{texture_extent, NewPhoto, PhotoPixels};

#[derive(Debug, Default)]
pub struct Args {
    pub store_dir: Option<PathBuf>,
    pub images: Vec<PathBuf>,
}

/// `tree-native [--store <dir>] [image ...]`
pub fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--store" => {
                let dir = it
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--store needs a directory"))?;
                out.store_dir = Some(dir.into());
            }
            flag if flag.starts_with("--") => anyhow::bail!("unknown flag {flag}"),
            path => out.images.push(path.into()),
        }
    }
    Ok(out)
}

/// Width over height read from the image header.
pub fn aspect_ratio(path: &Path) -> anyhow::Result<f32> {
    let (w, h) = image::image_dimensions(path)?;
    if w == 0 || h == 0 {
        anyhow::bail!("{} has no pixels", path.display());
    }
    Ok(w as f32 / h as f32)
}

/// Unreadable files are logged and skipped.
pub fn load_images(paths: &[PathBuf]) -> Vec<NewPhoto> {
    paths
        .iter()
        .filter_map(|path| match aspect_ratio(path) {
            Ok(aspect_ratio) => Some(NewPhoto {
                image: path.display().to_string(),
                aspect_ratio,
            }),
            Err(e) => {
                log::error!("[store] cannot import {}: {e}", path.display());
                None
            }
        })
        .collect()
}

/// Decodes a photo to RGBA8, downscaled to fit the texture size limit.
pub fn decode_pixels(path: &Path) -> anyhow::Result<PhotoPixels> {
    let img = image::open(path)?;
    let (w, h) = texture_extent(img.width(), img.height(), PHOTO_TEXTURE_MAX_SIDE);
    let img = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    Ok(PhotoPixels::new(w, h, rgba.into_raw())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_store_and_images() {
        let a = parse_args(args(&["a.jpg", "--store", "/tmp/tree", "b.png"])).unwrap();
        assert_eq!(a.store_dir, Some(PathBuf::from("/tmp/tree")));
        assert_eq!(a.images, [PathBuf::from("a.jpg"), PathBuf::from("b.png")]);
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(parse_args(args(&["--store"])).is_err());
        assert!(parse_args(args(&["--fast"])).is_err());
    }

    #[test]
    fn missing_files_are_skipped() {
        let photos = load_images(&[PathBuf::from("/definitely/not/here.png")]);
        assert!(photos.is_empty());
    }

    fn write_png(name: &str, width: u32, height: u32) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "tree-native-{name}-{}.png",
            std::process::id()
        ));
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 10, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn decodes_small_images_as_is() {
        let path = write_png("small", 6, 4);
        let px = decode_pixels(&path).unwrap();
        assert_eq!((px.width(), px.height()), (6, 4));
        assert_eq!(&px.rgba()[..4], &[200, 40, 10, 255]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn decodes_large_images_within_the_texture_limit() {
        let path = write_png("large", PHOTO_TEXTURE_MAX_SIDE * 2, 8);
        let px = decode_pixels(&path).unwrap();
        assert_eq!((px.width(), px.height()), (PHOTO_TEXTURE_MAX_SIDE, 4));
        assert_eq!(px.rgba().len(), (PHOTO_TEXTURE_MAX_SIDE * 4 * 4) as usize);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn undecodable_files_are_errors() {
        assert!(decode_pixels(Path::new("/definitely/not/here.png")).is_err());
    }
}
