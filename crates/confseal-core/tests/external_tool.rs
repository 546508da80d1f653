//! Drives the external backend with a small shell script standing in for
//! the real cipher tool, and with the system `openssl` when one is installed.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use confseal_core::{
    Cipher, ConfigCodec, ConfigLayout, ExternalCipher, ExternalCipherSettings, FailureKind,
    FileResult, Passphrase,
};

/// Stores the passphrase on the first line; refuses to decrypt on mismatch
/// with the same message openssl prints.
const FAKE_TOOL: &str = r#"#!/bin/sh
if [ "$1" = "version" ]; then
    echo "fakecipher 1.0"
    exit 0
fi
mode="$1"
in="$2"
out="$3"
IFS= read -r pass
case "$mode" in
    enc)
        { printf '%s\n' "$pass"; cat "$in"; } > "$out" || exit 2
        ;;
    dec)
        IFS= read -r stored < "$in"
        if [ "$stored" != "$pass" ]; then
            echo "bad decrypt" >&2
            exit 1
        fi
        tail -n +2 "$in" > "$out" || exit 2
        ;;
    *)
        echo "unknown mode $mode" >&2
        exit 3
        ;;
esac
"#;

fn install_tool(dir: &Path) -> PathBuf {
    let script = dir.join("fakecipher.sh");
    fs::write(&script, FAKE_TOOL).expect("write tool");
    script
}

fn settings(script: &Path) -> ExternalCipherSettings {
    let script = script.to_string_lossy().to_string();
    let args = |mode: &str| vec![script.clone(), mode.to_string(), "{in}".into(), "{out}".into()];
    ExternalCipherSettings {
        program: "sh".to_string(),
        encrypt_args: args("enc"),
        decrypt_args: args("dec"),
        passphrase_args: Vec::new(),
        version_args: vec![script.clone(), "version".to_string()],
        legacy_provider_args: Vec::new(),
    }
}

fn setup() -> (tempfile::TempDir, PathBuf, ConfigCodec<ExternalCipher>) {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool = install_tool(temp.path());
    let config = temp.path().join("config");
    fs::create_dir(&config).unwrap();
    let cipher = ExternalCipher::new(settings(&tool)).expect("valid settings");
    let codec = ConfigCodec::new(ConfigLayout::new(&config), cipher);
    (temp, config, codec)
}

#[test]
fn test_scenario_encrypt_then_decrypt_from_ciphertext_only() {
    let (_temp, config, codec) = setup();
    fs::write(config.join("base.json"), "{}").unwrap();
    fs::write(config.join("test.json"), "{}").unwrap();
    let original = "{\"broker\": {\"key\": \"k-123\"}}";
    fs::write(config.join("main.json"), original).unwrap();
    let passphrase = Passphrase::provided("ask-the-quant-team").unwrap();

    let report = codec.encrypt_all(&passphrase, |_| {}).unwrap();
    assert!(report.is_success());

    let mut produced: Vec<String> = fs::read_dir(&config)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".cast5"))
        .collect();
    produced.sort();
    assert_eq!(produced, vec!["main.json.cast5"]);

    for name in ["base.json", "test.json", "main.json"] {
        fs::remove_file(config.join(name)).unwrap();
    }

    let report = codec.decrypt_all(&passphrase, |_| {}).unwrap();
    assert!(report.is_success());
    assert_eq!(
        fs::read_to_string(config.join("main.json")).unwrap(),
        original
    );
}

#[test]
fn test_bad_decrypt_maps_to_passphrase_failure() {
    let (_temp, config, codec) = setup();
    fs::write(config.join("main.json"), "{}").unwrap();
    let right = Passphrase::provided("right-one").unwrap();
    let wrong = Passphrase::provided("wrong-one").unwrap();

    codec.encrypt_all(&right, |_| {}).unwrap();
    let report = codec.decrypt_all(&wrong, |_| {}).unwrap();

    assert_eq!(report.failed(), 1);
    match &report.outcomes[0].result {
        FileResult::Failed { kind, message } => {
            assert_eq!(*kind, FailureKind::Passphrase);
            assert!(message.contains("Incorrect passphrase"));
        }
        FileResult::Written => panic!("decrypt with wrong passphrase must fail"),
    }
}

#[test]
fn test_each_file_attempted_when_one_fails() {
    let (_temp, config, codec) = setup();
    let right = Passphrase::provided("right-one").unwrap();
    let wrong = Passphrase::provided("wrong-one").unwrap();
    fs::write(config.join("a.json"), "{\"a\":1}").unwrap();
    fs::write(config.join("c.json"), "{\"c\":1}").unwrap();
    codec.encrypt_all(&right, |_| {}).unwrap();

    // b.json is sealed with a different passphrase.
    fs::write(config.join("b.json"), "{\"b\":1}").unwrap();
    let only_b = codec
        .layout()
        .plan_encrypt()
        .unwrap()
        .into_iter()
        .filter(|job| job.source.ends_with("b.json"))
        .collect::<Vec<_>>();
    codec.run_jobs(confseal_core::Direction::Encrypt, &only_b, &wrong, |_| {});
    for name in ["a.json", "b.json", "c.json"] {
        fs::remove_file(config.join(name)).unwrap();
    }

    let mut started = Vec::new();
    let report = codec
        .decrypt_all(&right, |event| {
            if let confseal_core::BatchEvent::Started { job, .. } = event {
                started.push(job.source.clone());
            }
        })
        .unwrap();

    assert_eq!(started.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert!(config.join("a.json").exists());
    assert!(!config.join("b.json").exists());
    assert!(config.join("c.json").exists());
}

#[test]
fn test_missing_tool_fails_every_file() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("a.json"), "{}").unwrap();
    fs::write(temp.path().join("b.json"), "{}").unwrap();
    let cipher = ExternalCipher::new(ExternalCipherSettings {
        program: "confseal-no-such-cipher-tool".to_string(),
        ..ExternalCipherSettings::default()
    })
    .unwrap();
    let codec = ConfigCodec::new(ConfigLayout::new(temp.path()), cipher);
    let passphrase = Passphrase::provided("whatever").unwrap();

    let report = codec.encrypt_all(&passphrase, |_| {}).unwrap();

    assert_eq!(report.failed(), 2);
    assert!(report.failures().all(|o| matches!(
        o.result,
        FileResult::Failed {
            kind: FailureKind::ToolMissing,
            ..
        }
    )));
    assert!(!temp.path().join("a.json.cast5").exists());
}

#[test]
fn test_probe_reports_tool_version() {
    let (_temp, _config, codec) = setup();
    assert_eq!(codec.cipher().probe().unwrap(), "fakecipher 1.0");
}

fn shared_secret() -> Passphrase {
    Passphrase::provided("ask-the-ops-team").unwrap()
}

/// `None` when no `openssl` is installed; those tests then return early.
fn system_openssl(config: &Path) -> Option<ConfigCodec<ExternalCipher>> {
    let installed = std::process::Command::new("openssl")
        .arg("version")
        .output()
        .is_ok_and(|out| out.status.success());
    if !installed {
        eprintln!("openssl not on PATH; skipping");
        return None;
    }
    let cipher =
        ExternalCipher::new(ExternalCipherSettings::default()).expect("default settings");
    Some(ConfigCodec::new(ConfigLayout::new(config), cipher))
}

#[test]
fn test_default_openssl_round_trip() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path();
    let Some(codec) = system_openssl(config) else {
        return;
    };
    let original = "{\n  \"db\": {\"password\": \"s3cret\"}\n}\n";
    fs::write(config.join("main.json"), original).unwrap();
    fs::write(config.join("base.json"), "{}").unwrap();

    let report = codec.encrypt_all(&shared_secret(), |_| {}).unwrap();
    assert!(report.is_success(), "{:?}", report.outcomes);
    let sealed = fs::read(config.join("main.json.cast5")).unwrap();
    assert!(sealed.starts_with(b"Salted__"));
    assert!(!config.join("base.json.cast5").exists());

    fs::remove_file(config.join("main.json")).unwrap();
    let report = codec.decrypt_all(&shared_secret(), |_| {}).unwrap();

    assert!(report.is_success(), "{:?}", report.outcomes);
    assert_eq!(fs::read_to_string(config.join("main.json")).unwrap(), original);
}

#[test]
fn test_default_openssl_wrong_passphrase_keeps_plaintext() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path();
    let Some(codec) = system_openssl(config) else {
        return;
    };
    fs::write(config.join("main.json"), "{\"v\": 1}").unwrap();
    codec.encrypt_all(&shared_secret(), |_| {}).unwrap();
    fs::write(config.join("main.json"), "{\"v\": \"local\"}").unwrap();

    let wrong = Passphrase::provided("not-the-shared-secret").unwrap();
    let report = codec.decrypt_all(&wrong, |_| {}).unwrap();

    assert_eq!(report.failed(), 1);
    let failure = report.failures().next().unwrap();
    assert!(
        matches!(
            failure.result,
            FileResult::Failed {
                kind: FailureKind::Passphrase | FailureKind::InvalidPlaintext,
                ..
            }
        ),
        "{:?}",
        failure.result
    );
    assert_eq!(
        fs::read_to_string(config.join("main.json")).unwrap(),
        "{\"v\": \"local\"}"
    );
}
