use super::*;

fn at(progress: f64, directives: &[AnimationDirective]) -> Presentation {
    let mut p = Presentation {
        opacity: 0.42,
        offset_x: 17.0,
        scale: 3.0,
        rotation_deg: 9.0,
    };
    apply_animation_state(&mut p, progress, directives);
    p
}

fn one(kind: DirectiveKind) -> Vec<AnimationDirective> {
    vec![AnimationDirective::new(kind)]
}

#[test]
fn every_kind_starts_at_from_state_and_ends_at_to_state() {
    let start = at(0.0, &one(DirectiveKind::Fade));
    assert_eq!(start.opacity, 0.0);
    assert_eq!(at(1.0, &one(DirectiveKind::Fade)).opacity, 1.0);

    let start = at(0.0, &one(DirectiveKind::Slide));
    assert_eq!(start.offset_x, SLIDE_FROM_X);
    assert_eq!(start.opacity, 0.0);
    let end = at(1.0, &one(DirectiveKind::Slide));
    assert_eq!(end.offset_x, 0.0);
    assert_eq!(end.opacity, 1.0);

    let start = at(0.0, &one(DirectiveKind::Zoom));
    assert_eq!(start.scale, 0.0);
    assert_eq!(start.opacity, 0.0);
    let end = at(1.0, &one(DirectiveKind::Zoom));
    assert_eq!(end.scale, 1.0);
    assert_eq!(end.opacity, 1.0);

    let start = at(0.0, &one(DirectiveKind::Rotate));
    assert_eq!(start.rotation_deg, ROTATE_FROM_DEG);
    assert_eq!(start.opacity, 0.0);
    let end = at(1.0, &one(DirectiveKind::Rotate));
    assert_eq!(end.rotation_deg, 0.0);
    assert_eq!(end.opacity, 1.0);
}

#[test]
fn apply_resets_untouched_properties_to_baseline() {
    let p = at(0.5, &one(DirectiveKind::Fade));
    assert_eq!(p.offset_x, 0.0);
    assert_eq!(p.scale, 1.0);
    assert_eq!(p.rotation_deg, 0.0);
}

#[test]
fn three_d_only_leaves_baseline() {
    for t in [0.0, 0.5, 1.0] {
        assert_eq!(at(t, &one(DirectiveKind::ThreeD)), Presentation::BASELINE);
    }
    assert_eq!(at(0.3, &[]), Presentation::BASELINE);
}

#[test]
fn linear_fade_midpoint() {
    let d = vec![AnimationDirective::new(DirectiveKind::Fade).with_ease(Ease::Linear)];
    assert!((at(0.5, &d).opacity - 0.5).abs() < 1e-12);
}

#[test]
fn directives_are_laid_out_sequentially_with_delay() {
    let d = vec![
        AnimationDirective::new(DirectiveKind::Slide)
            .with_duration(1.0)
            .with_ease(Ease::Linear),
        AnimationDirective::new(DirectiveKind::Zoom)
            .with_duration(1.0)
            .with_delay(2.0)
            .with_ease(Ease::Linear),
    ];
    let tl = Timeline::compose(&d);
    assert_eq!(tl.total_duration(), 4.0);

    // 1s in: slide complete, zoom not yet started -> scale held at its "from" value.
    let p = tl.seek(0.25);
    assert_eq!(p.offset_x, 0.0);
    assert_eq!(p.scale, 0.0);
    assert_eq!(p.opacity, 1.0);

    // 3.5s in: zoom half way and now governing opacity.
    let p = tl.seek(0.875);
    assert!((p.scale - 0.5).abs() < 1e-12);
    assert!((p.opacity - 0.5).abs() < 1e-12);
}

#[test]
fn later_directive_overrides_shared_property() {
    let d = vec![
        AnimationDirective::new(DirectiveKind::Fade).with_ease(Ease::Linear),
        AnimationDirective::new(DirectiveKind::Fade).with_ease(Ease::Linear),
    ];
    let tl = Timeline::compose(&d);
    // Right at the start of the second fade the opacity drops back to its "from" value.
    let p = tl.seek(0.5);
    assert_eq!(p.opacity, 0.0);
    let p = tl.seek(0.75);
    assert!((p.opacity - 0.5).abs() < 1e-12);
}

#[test]
fn seek_clamps_out_of_range_progress() {
    let d = one(DirectiveKind::Fade);
    assert_eq!(at(-3.0, &d).opacity, 0.0);
    assert_eq!(at(7.0, &d).opacity, 1.0);
    assert_eq!(at(f64::NAN, &d).opacity, 0.0);
}

#[test]
fn affine_is_identity_at_baseline() {
    let a = Presentation::BASELINE.to_affine(Vec2::new(50.0, 20.0));
    let c = a.as_coeffs();
    let id = Affine::IDENTITY.as_coeffs();
    for (x, y) in c.iter().zip(id.iter()) {
        assert!((x - y).abs() < 1e-9);
    }
}
