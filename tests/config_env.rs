// tests/config_env.rs
use egf_calendar::config::{Config, ENV_CONFIG_PATH, ENV_DATA_DIR, ENV_SOURCE_URL};
use std::path::PathBuf;
use std::{env, fs};

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so a real config/ in the repo is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_DATA_DIR);
    env::remove_var(ENV_SOURCE_URL);

    // 1) Nothing -> defaults
    let c = Config::load_default().unwrap();
    assert_eq!(c, Config::default());

    // 2) Fallback TOML in ./config/
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/egf_calendar.toml"),
        r#"name = "cal"
feed_ttl_minutes = 60"#,
    )
    .unwrap();
    let c = Config::load_default().unwrap();
    assert_eq!(c.name, "cal");
    assert_eq!(c.feed_ttl_minutes, 60);

    // 3) Env path wins over the fallback
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, r#"name = "other""#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(Config::load_default().unwrap().name, "other");

    // 4) Per-field overrides on top
    env::set_var(ENV_DATA_DIR, "/srv/www");
    env::set_var(ENV_SOURCE_URL, "https://mirror.example/calendar/");
    let c = Config::load_default().unwrap();
    assert_eq!(c.data_dir, PathBuf::from("/srv/www"));
    assert_eq!(c.source_url, "https://mirror.example/calendar/");

    // 5) Env path pointing nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(Config::load_default().is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_DATA_DIR);
    env::remove_var(ENV_SOURCE_URL);
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn invalid_override_is_rejected() {
    env::remove_var(ENV_CONFIG_PATH);
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("c.toml");
    fs::write(&p, "").unwrap();
    env::set_var(ENV_SOURCE_URL, "file:///etc/passwd");
    let res = Config::load_from(&p);
    env::remove_var(ENV_SOURCE_URL);
    assert!(res.is_err());
}
