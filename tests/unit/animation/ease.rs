use super::*;

const ALL: [Ease; 10] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::InSine,
    Ease::OutSine,
    Ease::InOutSine,
];

#[test]
fn endpoints_are_stable() {
    for ease in ALL {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
        assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in ALL {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b, "{ease:?}");
        assert!(b < c, "{ease:?}");
    }
}

#[test]
fn parses_gsap_and_css_names() {
    assert_eq!("power1.out".parse::<Ease>().unwrap(), Ease::OutQuad);
    assert_eq!("Power2.InOut".parse::<Ease>().unwrap(), Ease::InOutCubic);
    assert_eq!("none".parse::<Ease>().unwrap(), Ease::Linear);
    assert_eq!("ease-in".parse::<Ease>().unwrap(), Ease::InCubic);
    assert_eq!("in_out_sine".parse::<Ease>().unwrap(), Ease::InOutSine);
    assert!("bounce.out".parse::<Ease>().is_err());
}

#[test]
fn canonical_names_parse_back() {
    for ease in ALL {
        assert_eq!(ease.name().parse::<Ease>().unwrap(), ease);
    }
}

#[test]
fn serde_uses_names() {
    let ease: Ease = serde_json::from_str("\"sine.out\"").unwrap();
    assert_eq!(ease, Ease::OutSine);
    assert_eq!(serde_json::to_string(&Ease::Linear).unwrap(), "\"none\"");
    assert!(serde_json::from_str::<Ease>("\"wobble\"").is_err());
}
