use photo_carousel::atlas::{ImageInfo, UvRect};
use photo_carousel::gallery::Gallery;
use photo_carousel::layout::LayoutParams;
use photo_carousel::scroll::ScrollState;

fn mock_infos(n: usize) -> Vec<ImageInfo> {
    (0..n)
        .map(|i| {
            let band = 1.0 / n as f32;
            ImageInfo {
                width: 512,
                height: 512,
                aspect_ratio: 1.0,
                uvs: UvRect {
                    x_start: 0.0,
                    x_end: 1.0,
                    y_start: 1.0 - i as f32 * band,
                    y_end: 1.0 - (i + 1) as f32 * band,
                },
            }
        })
        .collect()
}

fn new_gallery() -> Gallery {
    Gallery::new(LayoutParams::default(), Some(1), ScrollState::default())
}

#[test]
fn render_before_atlas_is_a_guarded_noop() {
    let mut g = new_gallery();
    g.update_scroll(5.0, 1.0);
    g.render(0.5);
    assert!(g.cylinder_params().is_none());
    assert!(g.center_params().is_none());
    assert!(g.layout().is_none());
}

#[test]
fn empty_atlas_suppresses_both_surfaces() {
    let mut g = new_gallery();
    g.install_atlas(Vec::new());
    g.render(1.0);
    assert!(g.cylinder_params().is_none());
    assert!(g.center_params().is_none());
}

#[test]
fn install_atlas_runs_once() {
    let mut g = new_gallery();
    g.install_atlas(mock_infos(3));
    let first = g.layout().unwrap().instances.clone();
    g.install_atlas(mock_infos(5));
    assert_eq!(g.images().len(), 3);
    assert_eq!(g.layout().unwrap().instances, first);
}

#[test]
fn single_image_end_to_end_frame() {
    let mut g = new_gallery();
    g.install_atlas(mock_infos(1));
    g.render(1.0);

    let cyl = g.cylinder_params().unwrap();
    assert_eq!(cyl.time, 1.0);
    assert_eq!(cyl.z_range, 120.0);
    assert_eq!(cyl.max_z, 60.0);
    assert_eq!(cyl.direction, 1.0);
    for v in [cyl.scroll, cyl.speed] {
        assert!(v.is_finite());
    }

    assert_eq!(g.center_index(), 0);
    let center = g.center_params().unwrap();
    assert_eq!(center.uv.y_start, 1.0);
    assert_eq!(center.uv.y_end, 0.0);
}

#[test]
fn center_view_follows_the_scroll_accumulator() {
    // drift disabled so the accumulator holds exactly the fed value
    let scroll = ScrollState::new(0.0, 0.1);
    let mut g = Gallery::new(LayoutParams::default(), Some(1), scroll);
    let images = mock_infos(5);
    g.install_atlas(images.clone());

    g.update_scroll(7.6, 1.0);
    g.render(0.0);

    assert_eq!(g.center_index(), 3);
    let center = g.center_params().unwrap();
    assert_eq!(center.uv.y_start, images[3].uvs.y_start);
    assert_eq!(center.uv.y_end, images[3].uvs.y_end);
}

#[test]
fn direction_is_republished_each_frame() {
    let mut g = new_gallery();
    g.install_atlas(mock_infos(2));
    g.update_scroll(1.0, -1.0);
    g.render(0.0);
    assert_eq!(g.cylinder_params().unwrap().direction, -1.0);
}
