//! Asset sourcing and background decoding.
//!
//! Encoded assets are read on the calling thread. Decoding runs on rayon
//! workers, one job per asset, and each result is sent as soon as it is
//! ready. Color and depth race: either may arrive first.

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use depthview::prep::{fit_pair, DEFAULT_MAX_WIDTH};
use depthview::{
    AssetDecodeError, BuildOptions, ColorImage, DepthMap, EncodedAsset, ViewerBuilder,
    ViewerDocument,
};
use std::{fs, path::PathBuf};

/// Where the viewer gets its two assets from.
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// A previously built viewer document.
    Document(PathBuf),
    /// A photo and depth map, built in memory the same way `depth2view` does.
    Files { image: PathBuf, depth: PathBuf },
}

#[derive(Debug)]
pub enum LoadEvent {
    Color(Result<ColorImage, AssetDecodeError>),
    Depth(Result<DepthMap, AssetDecodeError>),
}

/// Reads the encoded color and depth assets from `source`.
pub fn read_assets(source: &AssetSource) -> Result<(EncodedAsset, EncodedAsset)> {
    match source {
        AssetSource::Document(path) => {
            let html = fs::read_to_string(path)
                .with_context(|| format!("read viewer document {}", path.display()))?;
            let assets = ViewerDocument::extract_assets(&html)
                .with_context(|| format!("no embedded assets in {}", path.display()))?;
            Ok(assets)
        }
        AssetSource::Files { image, depth } => {
            let color = image::open(image)
                .with_context(|| format!("open image {}", image.display()))?;
            let depth_img = image::open(depth)
                .with_context(|| format!("open depth map {}", depth.display()))?;

            let (color, depth) = fit_pair(
                &ColorImage::from(&color),
                DepthMap::from(&depth_img),
                DEFAULT_MAX_WIDTH,
                false,
            )?;

            let doc = ViewerBuilder::new(BuildOptions::default())
                .build(&color, &depth)
                .context("failed to encode viewer assets")?;
            Ok((doc.color_asset().clone(), doc.depth_asset().clone()))
        }
    }
}

/// Decodes both assets on the rayon pool. The receiver yields exactly one
/// [`LoadEvent::Color`] and one [`LoadEvent::Depth`], in completion order.
pub fn spawn_decode(color: EncodedAsset, depth: EncodedAsset) -> Receiver<LoadEvent> {
    let (tx, rx) = unbounded();

    let color_tx = tx.clone();
    rayon::spawn(move || {
        if color_tx.send(LoadEvent::Color(color.decode_color())).is_err() {
            log::debug!("Viewer closed before the color asset decoded");
        }
    });
    rayon::spawn(move || {
        if tx.send(LoadEvent::Depth(depth.decode_depth())).is_err() {
            log::debug!("Viewer closed before the depth asset decoded");
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn assets() -> (EncodedAsset, EncodedAsset) {
        let doc = depthview::build(
            &ColorImage::filled(6, 4, [10, 20, 30]).unwrap(),
            &DepthMap::filled(6, 4, 99).unwrap(),
        )
        .unwrap();
        (doc.color_asset().clone(), doc.depth_asset().clone())
    }

    fn collect(rx: &Receiver<LoadEvent>) -> Vec<LoadEvent> {
        (0..2)
            .map(|_| rx.recv_timeout(Duration::from_secs(10)).unwrap())
            .collect()
    }

    #[test]
    fn both_assets_arrive_once() {
        let (color, depth) = assets();
        let events = collect(&spawn_decode(color, depth));

        let mut saw = (false, false);
        for ev in events {
            match ev {
                LoadEvent::Color(r) => {
                    assert_eq!(r.unwrap().width(), 6);
                    saw.0 = true;
                }
                LoadEvent::Depth(r) => {
                    assert_eq!(r.unwrap(), DepthMap::filled(6, 4, 99).unwrap());
                    saw.1 = true;
                }
            }
        }
        assert_eq!(saw, (true, true));
    }

    #[test]
    fn decode_failure_is_delivered_not_dropped() {
        let (color, _) = assets();
        let broken = EncodedAsset::from_data_uri("data:image/png;base64,AAAA").unwrap();
        let events = collect(&spawn_decode(color, broken));
        assert!(events
            .iter()
            .any(|ev| matches!(ev, LoadEvent::Depth(Err(AssetDecodeError::Image(_))))));
    }

    #[test]
    fn document_source_round_trips_assets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.html");
        let doc = depthview::build(
            &ColorImage::filled(3, 3, [1, 1, 1]).unwrap(),
            &DepthMap::filled(3, 3, 7).unwrap(),
        )
        .unwrap();
        fs::write(&path, doc.html()).unwrap();

        let (color, depth) = read_assets(&AssetSource::Document(path)).unwrap();
        assert_eq!(&color, doc.color_asset());
        assert_eq!(&depth, doc.depth_asset());
    }

    #[test]
    fn wide_photos_are_capped_and_depth_follows() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("photo.png");
        let depth = dir.path().join("depth.png");
        image::RgbImage::from_pixel(1024, 10, image::Rgb([90, 90, 90]))
            .save(&image)
            .unwrap();
        image::GrayImage::from_pixel(1024, 10, image::Luma([50]))
            .save(&depth)
            .unwrap();

        let (color, depth) = read_assets(&AssetSource::Files { image, depth }).unwrap();
        let color = color.decode_color().unwrap();
        let depth = depth.decode_depth().unwrap();
        assert_eq!(color.width(), DEFAULT_MAX_WIDTH);
        assert_eq!(depth.dimensions(), color.dimensions());
    }

    #[test]
    fn document_without_assets_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.html");
        fs::write(&path, "<html></html>").unwrap();
        assert!(read_assets(&AssetSource::Document(path)).is_err());
    }
}
