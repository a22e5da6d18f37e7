use crt_tv::theme::{Theme, UnknownTheme};

#[test]
fn stored_values_round_trip() {
    for theme in Theme::ALL {
        assert_eq!(theme.as_str().parse::<Theme>(), Ok(theme));
        assert_eq!(theme.to_string(), theme.as_str());
    }
}

#[test]
fn absent_or_unknown_preference_means_auto() {
    assert_eq!(Theme::from_stored(None), Theme::Auto);
    assert_eq!(Theme::from_stored(Some("sepia")), Theme::Auto);
    assert_eq!(Theme::from_stored(Some("Dark")), Theme::Auto);
    assert_eq!(Theme::from_stored(Some("darkest")), Theme::Darkest);
    assert_eq!("sepia".parse::<Theme>(), Err(UnknownTheme("sepia".into())));
}

#[test]
fn auto_is_never_persisted() {
    assert!(!Theme::Auto.is_persisted());
    assert!(Theme::Light.is_persisted());
    assert!(Theme::Dark.is_persisted());
    assert!(Theme::Darkest.is_persisted());
}

#[test]
fn icons_and_labels() {
    assert_eq!(Theme::Light.icon(), "/theme-icon-light.svg");
    assert_eq!(Theme::Darkest.label(), "Darkest");
}

#[test]
fn only_auto_and_darkest_follow_the_os() {
    let following: Vec<_> = Theme::ALL.into_iter().filter(|t| t.follows_os()).collect();
    assert_eq!(following, [Theme::Auto, Theme::Darkest]);
}
