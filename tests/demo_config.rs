use std::sync::Mutex;

use tempfile::NamedTempFile;

use arena_vision::{DemoConfig, SourceError, SourceKind};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ARENA_CONFIG",
        "ARENA_SOURCE",
        "ARENA_DEVICE",
        "ARENA_STREAM_URL",
        "ARENA_PIPELINE",
        "ARENA_ROBOT_ADDR",
        "ARENA_CALIBRATION",
        "ARENA_FRAME_WIDTH",
        "ARENA_FRAME_HEIGHT",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_load_without_any_configuration() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = DemoConfig::load().expect("load defaults");
    assert_eq!(cfg.source, SourceKind::MulticastStream);
    assert_eq!(cfg.width, 1232);
    assert_eq!(cfg.height, 1232);
    assert!(cfg.calibration.is_none());
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "source": "pipeline-stream",
        "video": {
            "stream_url": "rtp://224.1.1.1:5200",
            "width": 800,
            "height": 600
        },
        "robot": {
            "addr": "10.0.0.42:3001"
        },
        "detection": {
            "marker_size_m": 0.1
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("ARENA_CONFIG", file.path());
    std::env::set_var("ARENA_SOURCE", "device");
    std::env::set_var("ARENA_FRAME_WIDTH", "640");

    let cfg = DemoConfig::load().expect("load config");
    // Env wins over file, file wins over defaults.
    assert_eq!(cfg.source, SourceKind::Device);
    assert_eq!(cfg.width, 640);
    assert_eq!(cfg.height, 600);
    assert_eq!(cfg.stream_url, "rtp://224.1.1.1:5200");
    assert_eq!(cfg.robot_addr, "10.0.0.42:3001");
    assert_eq!(cfg.marker_size_m, 0.1);

    clear_env();
}

#[test]
fn unknown_source_kind_in_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ARENA_SOURCE", "webcam");
    let err = DemoConfig::load().unwrap_err();
    match err {
        SourceError::UnsupportedSource { kind, valid } => {
            assert_eq!(kind, "webcam");
            assert!(valid.contains("device"));
        }
        other => panic!("expected UnsupportedSource, got {:?}", other),
    }

    clear_env();
}

#[test]
fn empty_env_overrides_are_ignored() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ARENA_SOURCE", "");
    std::env::set_var("ARENA_FRAME_WIDTH", "");
    std::env::set_var("ARENA_FRAME_HEIGHT", "");

    let cfg = DemoConfig::load().expect("empty overrides fall back to defaults");
    assert_eq!(cfg.source, SourceKind::MulticastStream);
    assert_eq!(cfg.width, 1232);
    assert_eq!(cfg.height, 1232);

    clear_env();
}

#[test]
fn zero_frame_dimensions_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ARENA_FRAME_WIDTH", "0");
    let err = DemoConfig::load().unwrap_err();
    assert!(matches!(err, SourceError::Configuration(_)));

    clear_env();
}
