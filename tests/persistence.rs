//! Restart and concurrency behaviour of the settings store.

use std::sync::Arc;

use relay_settings::relay::NoopBootstrapper;
use relay_settings::settings::{ConnectionFactory, GlobalSettings, Submission};

mod common;

use common::{full_form, Harness};

fn submission(value: serde_json::Value) -> Submission {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_restart_reproduces_record() {
    let harness = Harness::new(Arc::new(NoopBootstrapper));
    harness.controller.submit(submission(full_form("restart"))).await.unwrap();

    let on_disk = std::fs::read_to_string(harness.store.path()).unwrap();
    assert!(!on_disk.contains("restart-secret"));
    assert!(!on_disk.contains("restart-mq-secret"));

    let restarted = harness.restart();
    assert_eq!(*restarted.snapshot(), *harness.store.snapshot());
    assert_eq!(
        restarted.connection_factory(),
        Some(ConnectionFactory::new("https://restart.example.com", "restart-user", "restart-secret"))
    );
    assert_eq!(restarted.mq_password(), "restart-mq-secret");
    assert_eq!(restarted.msg_custom_text(), "restart");
}

#[tokio::test]
async fn test_restart_with_other_key_starts_fresh() {
    let harness = Harness::new(Arc::new(NoopBootstrapper));
    harness.controller.submit(submission(full_form("rotated"))).await.unwrap();

    let other = relay_settings::settings::SettingsStore::load(
        harness.store.path(),
        relay_settings::settings::SecretCipher::generate(),
    );
    assert_eq!(*other.snapshot(), GlobalSettings::default());
}

fn assert_not_torn(settings: &GlobalSettings) {
    let host = settings.relay.host.clone();
    match settings.connection_factory() {
        // Submissions with a connection factory carry matching broker fields.
        Some(cf) => {
            let tag = cf.username.trim_end_matches("-user").to_string();
            assert_eq!(host, format!("mq-{}.example.com", tag), "torn record: {:?}", settings);
            assert_eq!(settings.relay.exchange, format!("{}-exchange", tag));
        }
        // Submissions without one are the "b" series.
        None => assert!(host.starts_with("mq-b"), "torn record: {:?}", settings),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_never_tear() {
    let harness = Harness::new(Arc::new(NoopBootstrapper));
    let mut tasks = Vec::new();

    for i in 0..40 {
        let controller = harness.controller.clone();
        let store = harness.store.clone();
        tasks.push(tokio::spawn(async move {
            let form = if i % 2 == 0 {
                full_form(&format!("a{}", i))
            } else {
                let mut form = full_form(&format!("b{}", i));
                form.as_object_mut().unwrap().remove("connectionFactory");
                form
            };
            controller.submit(submission(form)).await.unwrap();
            assert_not_torn(&store.snapshot());
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    let last = harness.store.snapshot();
    assert_not_torn(&last);
    assert_eq!(*harness.restart().snapshot(), *last);
}
