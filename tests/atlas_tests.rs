use image::RgbaImage;
use photo_carousel::atlas::{build_atlas, compose_atlas};

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba(rgba))
}

#[test]
fn uv_bands_are_disjoint_and_cover_unit_interval() {
    let atlas = compose_atlas(vec![
        solid(4, 2, [255, 0, 0, 255]),
        solid(2, 6, [0, 255, 0, 255]),
        solid(3, 4, [0, 0, 255, 255]),
    ]);
    assert_eq!(atlas.width, 4);
    assert_eq!(atlas.height, 12);

    let infos = &atlas.images;
    assert_eq!(infos.len(), 3);

    // top band starts at v = 1.0, bottom band ends at v = 0.0
    assert!((infos[0].uvs.y_start - 1.0).abs() < 1e-6);
    assert!(infos.last().unwrap().uvs.y_end.abs() < 1e-6);

    // consecutive bands touch exactly: no gap, no overlap
    for pair in infos.windows(2) {
        assert!((pair[0].uvs.y_end - pair[1].uvs.y_start).abs() < 1e-6);
    }
    for info in infos {
        assert!(info.uvs.y_start > info.uvs.y_end);
        assert_eq!(info.uvs.x_start, 0.0);
    }

    // x extent is relative to the widest image
    assert!((infos[0].uvs.x_end - 1.0).abs() < 1e-6);
    assert!((infos[1].uvs.x_end - 0.5).abs() < 1e-6);
    assert!((infos[2].uvs.x_end - 0.75).abs() < 1e-6);

    // source order and natural dimensions preserved
    assert_eq!((infos[0].width, infos[0].height), (4, 2));
    assert!((infos[0].aspect_ratio - 2.0).abs() < 1e-6);
    assert!((infos[1].aspect_ratio - 1.0 / 3.0).abs() < 1e-6);
}

#[test]
fn atlas_pixels_stack_top_down() {
    let atlas = compose_atlas(vec![
        solid(1, 1, [255, 0, 0, 255]),
        solid(1, 1, [0, 255, 0, 255]),
    ]);
    assert_eq!((atlas.width, atlas.height), (1, 2));
    assert_eq!(&atlas.pixels[0..4], &[255, 0, 0, 255]);
    assert_eq!(&atlas.pixels[4..8], &[0, 255, 0, 255]);
}

#[test]
fn zero_sources_degenerate_to_placeholder() {
    let atlas = compose_atlas(Vec::new());
    assert_eq!((atlas.width, atlas.height), (1, 1));
    assert_eq!(atlas.pixels.len(), 4);
    assert!(atlas.images.is_empty());
}

#[tokio::test]
async fn failed_loads_are_dropped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("good.png");
    solid(3, 2, [10, 20, 30, 255]).save(&good).unwrap();

    let broken = dir.path().join("broken.png");
    std::fs::write(&broken, b"not a png").unwrap();

    let missing = dir.path().join("missing.png");

    let atlas = build_atlas(&[broken, good, missing]).await;
    assert_eq!(atlas.images.len(), 1);
    let info = &atlas.images[0];
    assert_eq!((info.width, info.height), (3, 2));
    // a lone survivor owns the whole atlas
    assert!((info.uvs.y_start - 1.0).abs() < 1e-6);
    assert!(info.uvs.y_end.abs() < 1e-6);
    assert!((info.uvs.x_end - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn all_failing_sources_yield_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("nope.jpg");
    std::fs::write(&broken, b"junk").unwrap();

    let atlas = build_atlas(&[broken, dir.path().join("gone.png")]).await;
    assert_eq!((atlas.width, atlas.height), (1, 1));
    assert!(atlas.images.is_empty());
}

#[tokio::test]
async fn load_order_follows_source_order() {
    let dir = tempfile::tempdir().unwrap();
    // distinct heights so each entry is identifiable after composition
    for (name, h) in [("z_first.png", 2), ("a_second.png", 3), ("m_third.png", 4)] {
        solid(2, h, [7, 7, 7, 255]).save(dir.path().join(name)).unwrap();
    }
    let paths = vec![
        dir.path().join("z_first.png"),
        dir.path().join("a_second.png"),
        dir.path().join("m_third.png"),
    ];

    let atlas = build_atlas(&paths).await;
    let heights: Vec<u32> = atlas.images.iter().map(|i| i.height).collect();
    assert_eq!(heights, vec![2, 3, 4]);
}
