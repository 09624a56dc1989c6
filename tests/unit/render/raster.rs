use super::*;
use crate::animation::directive::DirectiveKind;
use crate::animation::ease::Ease;
use crate::scene::element::Element;
use crate::scene::stage::{MountGuard, Stage};

const SOLID: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
  <rect x="0" y="0" width="40" height="20" fill="#ff0000"/>
</svg>"##;

fn mount(stage: &Stage) -> MountGuard {
    let element = Element::from_svg_str(SOLID).unwrap();
    stage
        .mount_offscreen(
            &element,
            Canvas {
                width: 40,
                height: 20,
            },
        )
        .unwrap()
}

fn descriptor(guard: &MountGuard, index: u64, total: u64, kinds: &[DirectiveKind]) -> FrameDescriptor {
    let animations: Arc<[AnimationDirective]> = kinds
        .iter()
        .map(|k| AnimationDirective::new(*k).with_ease(Ease::Linear))
        .collect();
    FrameDescriptor::new(FrameIndex(index), total, guard.staged().clone(), animations)
}

fn decode(frame: &EncodedFrame) -> image::RgbaImage {
    image::load_from_memory(&frame.png).unwrap().to_rgba8()
}

#[test]
fn normalized_time_is_index_over_total() {
    let stage = Stage::new();
    let guard = mount(&stage);
    let d = descriptor(&guard, 3, 10, &[DirectiveKind::Fade]);
    assert!((d.normalized_time - 0.3).abs() < 1e-12);
    assert_eq!(d.canvas.width, 40);
}

#[test]
fn fade_start_is_fully_transparent() {
    let stage = Stage::new();
    let guard = mount(&stage);
    let r = SvgRasterizer::new();
    let frame = r
        .capture_frame(&descriptor(&guard, 0, 10, &[DirectiveKind::Fade]))
        .unwrap();
    assert_eq!(frame.file_name(), "frame000000.png");
    let img = decode(&frame);
    assert_eq!(img.dimensions(), (40, 20));
    assert!(img.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn fade_midpoint_is_half_opaque() {
    let stage = Stage::new();
    let guard = mount(&stage);
    let r = SvgRasterizer::new();
    let frame = r
        .capture_frame(&descriptor(&guard, 5, 10, &[DirectiveKind::Fade]))
        .unwrap();
    let img = decode(&frame);
    let a = img.get_pixel(20, 10).0[3];
    assert!((120..=135).contains(&a), "alpha {a}");
    assert_eq!(img.get_pixel(20, 10).0[0], 255);
}

#[test]
fn static_frame_without_animations_is_opaque() {
    let stage = Stage::new();
    let guard = mount(&stage);
    let r = SvgRasterizer::new();
    let frame = r.capture_frame(&descriptor(&guard, 0, 1, &[])).unwrap();
    let img = decode(&frame);
    assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(38, 18).0, [255, 0, 0, 255]);
}

#[test]
fn slide_shifts_content_left() {
    let stage = Stage::new();
    let guard = mount(&stage);
    let r = SvgRasterizer::new();
    let p = Presentation {
        offset_x: -30.0,
        ..Presentation::BASELINE
    };
    let pixmap = r.rasterize(guard.staged(), &p).unwrap();
    let frame = EncodedFrame {
        index: FrameIndex(0),
        png: encode_png(&pixmap).unwrap(),
    };
    let img = decode(&frame);
    assert_eq!(img.get_pixel(5, 10).0[3], 255);
    assert_eq!(img.get_pixel(35, 10).0[3], 0);
}

#[test]
fn three_d_frame_goes_through_compositor() {
    let stage = Stage::new();
    let guard = mount(&stage);
    let r = SvgRasterizer::new();
    let frame = r
        .capture_frame(&descriptor(&guard, 5, 10, &[DirectiveKind::ThreeD]))
        .unwrap();
    // Edge-on at t = 0.5.
    let img = decode(&frame);
    assert!(img.pixels().all(|p| p.0[3] == 0));

    let frame = r
        .capture_frame(&descriptor(&guard, 0, 10, &[DirectiveKind::ThreeD]))
        .unwrap();
    let img = decode(&frame);
    assert_eq!(img.get_pixel(20, 10).0, [255, 0, 0, 255]);
    r.release();
}
