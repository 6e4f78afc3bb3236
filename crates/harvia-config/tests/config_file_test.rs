#![allow(clippy::unwrap_used)]
// Round-tripping config files through disk.

use pretty_assertions::assert_eq;

use harvia_config::{Config, Profile, load_config_from, save_config_to};
use harvia_core::ListingPolicy;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert_eq!(config.defaults.output, "table");
    assert_eq!(config.defaults.timeout, 30);
    assert!(config.profiles.is_empty());
}

#[test]
fn saved_profiles_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.profiles.insert(
        "cabin".into(),
        Profile {
            username: Some("sauna@example.com".into()),
            device: Some("sauna-1".into()),
            listing_policy: Some(ListingPolicy::SkipFailed),
            ..Profile::default()
        },
    );
    config.default_profile = Some("cabin".into());
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded.active_profile_name(None), "cabin");
    let cabin = loaded.profile("cabin").unwrap();
    assert_eq!(cabin.username.as_deref(), Some("sauna@example.com"));
    assert_eq!(cabin.device.as_deref(), Some("sauna-1"));
    assert_eq!(cabin.listing_policy, Some(ListingPolicy::SkipFailed));
    assert!(cabin.password.is_none());
}

#[test]
fn hand_written_toml_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "home"

[defaults]
output = "json"
listing_policy = "skip-failed"

[profiles.home]
username = "me@example.com"
region = "eu-west-1"
"#,
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.defaults.output, "json");
    assert_eq!(config.defaults.listing_policy, ListingPolicy::SkipFailed);
    assert_eq!(config.defaults.timeout, 30);
    assert_eq!(
        config.profile("home").unwrap().region.as_deref(),
        Some("eu-west-1")
    );
}
