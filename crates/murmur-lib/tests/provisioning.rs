mod common;

use common::{Fixture, OFFLINE_URL, VOICE_CONFIG, engine_tarball, truncating_server};
use mockito::Matcher;
use murmur_core::voice::{Quality, VoiceSpec};
use murmur_lib::Error;

const AMY_DIR: &str = "/voices/en/en_US/amy/medium";

#[test]
fn engine_installs_once() {
    let fx = Fixture::new();
    let mut server = mockito::Server::new();
    let release = server
        .mock("GET", "/release/piper_linux_x86_64.tar.gz")
        .with_body(engine_tarball())
        .expect(1)
        .create();
    let prov = fx.provisioner(&server.url(), Fixture::linux());

    let first = prov.ensure_engine_installed().unwrap();
    let second = prov.ensure_engine_installed().unwrap();

    release.assert();
    assert_eq!(first, second);
    assert_eq!(first, fx.storage.engine_dir().join("piper"));
    assert!(first.is_file());
    assert!(fx.storage.engine_dir().join("espeak-ng-data").is_dir());
    assert!(fx.temp_entries().is_empty(), "archive left behind");
}

#[test]
fn existing_engine_dir_skips_network() {
    let fx = Fixture::new();
    std::fs::create_dir_all(fx.storage.engine_dir()).unwrap();
    let prov = fx.provisioner(OFFLINE_URL, Fixture::linux());

    let exe = prov.ensure_engine_installed().unwrap();
    assert_eq!(exe, fx.storage.engine_dir().join("piper"));
}

#[test]
fn engine_download_failure_is_install_error() {
    let fx = Fixture::new();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/release/piper_linux_aarch64.tar.gz")
        .with_status(500)
        .create();
    let platform = murmur_core::platform::PlatformInfo::from_parts("linux", "aarch64").unwrap();
    let prov = fx.provisioner(&server.url(), platform);

    let err = prov.ensure_engine_installed().unwrap_err();
    assert!(matches!(err, Error::Install(_)), "{err}");
    assert!(!fx.storage.engine_dir().exists());
    assert!(fx.temp_entries().is_empty());
}

#[test]
fn corrupt_engine_archive_is_install_error() {
    let fx = Fixture::new();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/release/piper_linux_x86_64.tar.gz")
        .with_body("<html>rate limited</html>")
        .create();
    let prov = fx.provisioner(&server.url(), Fixture::linux());

    let err = prov.ensure_engine_installed().unwrap_err();
    assert!(matches!(err, Error::Install(_)), "{err}");
    assert!(!fx.storage.engine_dir().exists());
}

#[test]
fn voice_asset_downloads_both_files() {
    let fx = Fixture::new();
    let mut server = mockito::Server::new();
    let model = server
        .mock("GET", format!("{AMY_DIR}/en_US-amy-medium.onnx").as_str())
        .match_query(Matcher::UrlEncoded("download".into(), "true".into()))
        .with_body(vec![1u8; 4096])
        .create();
    let config = server
        .mock("GET", format!("{AMY_DIR}/en_US-amy-medium.onnx.json").as_str())
        .match_query(Matcher::Any)
        .with_body(VOICE_CONFIG)
        .create();
    let prov = fx.provisioner(&server.url(), Fixture::linux());

    let spec = VoiceSpec::new("amy", None).unwrap();
    let asset = prov.ensure_voice_asset(&spec).unwrap();

    model.assert();
    config.assert();
    assert_eq!(asset.model, fx.storage.voices_dir().join("en_US-amy-medium.onnx"));
    assert_eq!(std::fs::read(&asset.model).unwrap(), vec![1u8; 4096]);
    assert_eq!(asset.sample_rate().unwrap(), 22050);
    assert!(fx.temp_entries().is_empty());
}

#[test]
fn present_voice_files_are_not_refetched() {
    let fx = Fixture::new();
    let spec = VoiceSpec::new("amy", None).unwrap();
    fx.install_voice(&spec);
    let prov = fx.provisioner(OFFLINE_URL, Fixture::linux());

    let asset = prov.ensure_voice_asset(&spec).unwrap();
    assert_eq!(std::fs::read(&asset.model).unwrap(), b"onnx");
}

#[test]
fn partial_voice_is_completed() {
    let fx = Fixture::new();
    let spec = VoiceSpec::new("amy", None).unwrap();
    let model_path = fx.storage.voices_dir().join(spec.model_filename());
    std::fs::write(&model_path, b"kept").unwrap();

    let mut server = mockito::Server::new();
    let model = server
        .mock("GET", format!("{AMY_DIR}/en_US-amy-medium.onnx").as_str())
        .match_query(Matcher::Any)
        .expect(0)
        .create();
    let config = server
        .mock("GET", format!("{AMY_DIR}/en_US-amy-medium.onnx.json").as_str())
        .match_query(Matcher::Any)
        .with_body(VOICE_CONFIG)
        .expect(1)
        .create();
    let prov = fx.provisioner(&server.url(), Fixture::linux());

    let asset = prov.ensure_voice_asset(&spec).unwrap();

    model.assert();
    config.assert();
    assert_eq!(std::fs::read(&asset.model).unwrap(), b"kept");
    assert!(asset.config.is_file());
}

#[test]
fn unavailable_quality_points_to_catalog() {
    let fx = Fixture::new();
    let mut server = mockito::Server::new();
    server
        .mock("GET", Matcher::Regex("^/voices/".into()))
        .match_query(Matcher::Any)
        .with_status(404)
        .create();
    let prov = fx.provisioner(&server.url(), Fixture::linux());

    let spec = VoiceSpec::new("danny", Some(Quality::High)).unwrap();
    let err = prov.ensure_voice_asset(&spec).unwrap_err();

    match &err {
        Error::VoiceUnavailable {
            voice,
            quality,
            catalog,
        } => {
            assert_eq!(voice, "danny");
            assert_eq!(*quality, Quality::High);
            assert_eq!(catalog, &format!("{}/tree/en/en_US", server.url()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("/tree/en/en_US"));
    assert!(fx.voice_entries().is_empty());
    assert!(fx.temp_entries().is_empty());
}

#[test]
fn interrupted_download_leaves_no_file() {
    let fx = Fixture::new();
    let prov = fx.provisioner(&truncating_server(), Fixture::linux());

    let spec = VoiceSpec::new("ryan", None).unwrap();
    let err = prov.ensure_voice_asset(&spec).unwrap_err();

    assert!(matches!(err, Error::Download { .. }), "{err}");
    assert!(!fx.storage.voices_dir().join(spec.model_filename()).exists());
    assert!(fx.voice_entries().is_empty());
    assert!(fx.temp_entries().is_empty());
}

#[test]
fn malformed_config_is_not_published() {
    let fx = Fixture::new();
    let mut server = mockito::Server::new();
    server
        .mock("GET", format!("{AMY_DIR}/en_US-amy-medium.onnx").as_str())
        .match_query(Matcher::Any)
        .with_body("model")
        .create();
    server
        .mock("GET", format!("{AMY_DIR}/en_US-amy-medium.onnx.json").as_str())
        .match_query(Matcher::Any)
        .with_body("{\"audio\": ")
        .create();
    let prov = fx.provisioner(&server.url(), Fixture::linux());

    let spec = VoiceSpec::new("amy", None).unwrap();
    let err = prov.ensure_voice_asset(&spec).unwrap_err();

    assert!(matches!(err, Error::Download { .. }), "{err}");
    assert!(fx.storage.voices_dir().join(spec.model_filename()).is_file());
    assert!(!fx.storage.voices_dir().join(spec.config_filename()).exists());
    assert!(fx.temp_entries().is_empty());
}

#[test]
fn progress_callback_sees_completion() {
    use std::sync::{Arc, Mutex};

    let fx = Fixture::new();
    let mut server = mockito::Server::new();
    server
        .mock("GET", Matcher::Regex("^/voices/".into()))
        .match_query(Matcher::Any)
        .with_body(VOICE_CONFIG)
        .create();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let prov = fx
        .provisioner(&server.url(), Fixture::linux())
        .with_progress(move |p| {
            if p.status == "complete" {
                sink.lock().unwrap().push(p.asset.clone());
            }
        });

    prov.ensure_voice_asset(&VoiceSpec::new("alba", None).unwrap())
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        ["en_GB-alba-medium.onnx", "en_GB-alba-medium.onnx.json"]
    );
}
