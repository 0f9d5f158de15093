use std::sync::Mutex;

use tempfile::NamedTempFile;

use oakview::config::ViewerConfig;
use oakview::detect::Label;
use oakview::pipeline::StalePolicy;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "OAKVIEW_CONFIG",
        "OAKVIEW_MODEL",
        "OAKVIEW_INPUT",
        "OAKVIEW_TARGET_LABEL",
        "OAKVIEW_MIN_CONFIDENCE",
        "OAKVIEW_OUTPUT_DIR",
        "OAKVIEW_STALE_POLICY",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ViewerConfig::load().expect("load config");
    assert_eq!(cfg.model.to_str(), Some("models/mobilenet-ssd.onnx"));
    assert_eq!(cfg.detection.label, Label::Person);
    assert_eq!(cfg.detection.min_confidence, 0.75);
    assert_eq!(cfg.detection.stale_policy, StalePolicy::CarryForward);
    assert_eq!(cfg.jpeg.prefix, "test");
    assert_eq!(cfg.jpeg.quality, 90);
    assert_eq!(cfg.tracker.max_tracklets, 20);
    assert_eq!(cfg.tracker.confidence_threshold, 0.9);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "model": "models/ssd-lite.onnx",
            "input": "walk-720p.mp4",
            "target_fps": 15,
            "output_dir": "captures",
            "detection": {
                "label": "chair",
                "min_confidence": 0.6,
                "stale_policy": "clear-on-miss"
            },
            "jpeg": { "prefix": "cam", "quality": 75 },
            "tracker": { "max_tracklets": 5, "min_iou": 0.5 }
        }"#,
    );

    std::env::set_var("OAKVIEW_CONFIG", file.path());
    std::env::set_var("OAKVIEW_TARGET_LABEL", "person");
    std::env::set_var("OAKVIEW_STALE_POLICY", "hold-last-hit");
    std::env::set_var("OAKVIEW_OUTPUT_DIR", "/tmp/oakview-out");

    let cfg = ViewerConfig::load().expect("load config");

    assert_eq!(cfg.model.to_str(), Some("models/ssd-lite.onnx"));
    assert_eq!(cfg.input, "walk-720p.mp4");
    assert_eq!(cfg.target_fps, 15);
    assert_eq!(cfg.output_dir.to_str(), Some("/tmp/oakview-out"));
    assert_eq!(cfg.detection.label, Label::Person);
    assert_eq!(cfg.detection.min_confidence, 0.6);
    assert_eq!(cfg.detection.stale_policy, StalePolicy::HoldLastHit);
    assert_eq!(cfg.jpeg.prefix, "cam");
    assert_eq!(cfg.jpeg.quality, 75);
    assert_eq!(cfg.tracker.max_tracklets, 5);
    assert_eq!(cfg.tracker.min_iou, 0.5);
    assert_eq!(cfg.tracker.max_lost_frames, 10);

    clear_env();
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("OAKVIEW_MIN_CONFIDENCE", "high");
    assert!(ViewerConfig::load().is_err());
    clear_env();

    std::env::set_var("OAKVIEW_MIN_CONFIDENCE", "1.5");
    assert!(ViewerConfig::load().is_err());
    clear_env();

    std::env::set_var("OAKVIEW_TARGET_LABEL", "unicorn");
    assert!(ViewerConfig::load().is_err());
    clear_env();
}

#[test]
fn rejects_unreadable_or_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("OAKVIEW_CONFIG", "/nonexistent/oakview.json");
    let err = ViewerConfig::load().unwrap_err().to_string();
    assert!(err.contains("failed to read config file"));

    let file = write_config("{ not json");
    std::env::set_var("OAKVIEW_CONFIG", file.path());
    let err = ViewerConfig::load().unwrap_err().to_string();
    assert!(err.contains("invalid config file"));

    clear_env();
}
