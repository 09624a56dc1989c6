use super::*;

const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100">
  <rect x="0" y="0" width="200" height="100" fill="#3366ff"/>
</svg>"##;

#[test]
fn guard_unmounts_on_drop() {
    let stage = Stage::new();
    let element = Element::from_svg_str(SVG).unwrap();
    let guard = stage
        .mount_offscreen(
            &element,
            Canvas {
                width: 64,
                height: 64,
            },
        )
        .unwrap();
    let id = guard.id();
    assert!(stage.is_mounted(id));
    assert_eq!(stage.mounted_count(), 1);

    drop(guard);
    assert!(!stage.is_mounted(id));
    assert_eq!(stage.mounted_count(), 0);
}

#[test]
fn mounts_get_distinct_ids() {
    let stage = Stage::new();
    let element = Element::from_svg_str(SVG).unwrap();
    let canvas = Canvas {
        width: 10,
        height: 10,
    };
    let a = stage.mount_offscreen(&element, canvas).unwrap();
    let b = stage.mount_offscreen(&element, canvas).unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(stage.mounted_count(), 2);
}

#[test]
fn fit_is_uniform_and_centered() {
    let stage = Stage::new();
    let element = Element::from_svg_str(SVG).unwrap();
    let guard = stage
        .mount_offscreen(
            &element,
            Canvas {
                width: 100,
                height: 100,
            },
        )
        .unwrap();
    // 200x100 scaled by 0.5 -> 100x50, centered vertically with 25px bands.
    let c = guard.staged().fit().as_coeffs();
    assert!((c[0] - 0.5).abs() < 1e-12);
    assert!((c[3] - 0.5).abs() < 1e-12);
    assert!((c[4] - 0.0).abs() < 1e-12);
    assert!((c[5] - 25.0).abs() < 1e-12);
}

#[test]
fn zero_canvas_is_rejected() {
    let stage = Stage::new();
    let element = Element::from_svg_str(SVG).unwrap();
    assert!(
        stage
            .mount_offscreen(
                &element,
                Canvas {
                    width: 0,
                    height: 10
                }
            )
            .is_err()
    );
    assert_eq!(stage.mounted_count(), 0);
}
