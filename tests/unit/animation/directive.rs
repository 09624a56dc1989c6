use super::*;

#[test]
fn kind_parses_aliases() {
    assert_eq!("Fade".parse::<DirectiveKind>().unwrap(), DirectiveKind::Fade);
    assert_eq!("3d".parse::<DirectiveKind>().unwrap(), DirectiveKind::ThreeD);
    assert_eq!(
        "three-d".parse::<DirectiveKind>().unwrap(),
        DirectiveKind::ThreeD
    );
    assert_eq!("spin".parse::<DirectiveKind>().unwrap(), DirectiveKind::Rotate);
}

#[test]
fn unknown_kind_is_rejected() {
    let err = "wobble".parse::<DirectiveKind>().unwrap_err();
    assert!(err.to_string().contains("unknown animation kind 'wobble'"));
    assert!("  ".parse::<DirectiveKind>().is_err());
}

#[test]
fn json_defaults_fill_timing() {
    let d: AnimationDirective = serde_json::from_str(r#"{ "type": "slide" }"#).unwrap();
    assert_eq!(d.kind, DirectiveKind::Slide);
    assert_eq!(d.duration, 1.0);
    assert_eq!(d.delay, 0.0);
    assert_eq!(d.ease, Ease::OutQuad);

    let d: AnimationDirective =
        serde_json::from_str(r#"{ "kind": "three-d", "duration": 2, "ease": "none" }"#).unwrap();
    assert_eq!(d.kind, DirectiveKind::ThreeD);
    assert_eq!(d.duration, 2.0);
    assert_eq!(d.ease, Ease::Linear);
}

#[test]
fn compact_form_parses_all_fields() {
    let d = AnimationDirective::parse_compact("zoom:0.5:0.25:sine.inOut").unwrap();
    assert_eq!(d.kind, DirectiveKind::Zoom);
    assert_eq!(d.duration, 0.5);
    assert_eq!(d.delay, 0.25);
    assert_eq!(d.ease, Ease::InOutSine);

    let d = AnimationDirective::parse_compact("rotate").unwrap();
    assert_eq!(d, AnimationDirective::new(DirectiveKind::Rotate));

    assert!(AnimationDirective::parse_compact("fade:-1").is_err());
    assert!(AnimationDirective::parse_compact("fade:1:0:none:extra").is_err());
}

#[test]
fn three_d_detection() {
    let plain = [AnimationDirective::new(DirectiveKind::Fade)];
    assert!(!wants_three_d(&plain));
    let with_3d = [
        AnimationDirective::new(DirectiveKind::Fade),
        AnimationDirective::new(DirectiveKind::ThreeD),
    ];
    assert!(wants_three_d(&with_3d));
}
