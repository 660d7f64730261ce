//! Tests for the run module.

use super::*;

use mcsw::config::Cli;
use mcsw::protocol::PlayerSample;
use mcsw::status::EventMessages;

fn config(args: &[&str]) -> ValidatedConfig {
    let mut full_args = vec!["mcsw"];
    full_args.extend(args);
    ValidatedConfig::from_raw(&Cli::parse_from_iter(full_args), None).unwrap()
}

mod registry_setup {
    use super::*;

    #[test]
    fn shared_targets_share_one_probe() {
        let config = config(&[
            "--server",
            "a.example.org",
            "--server",
            "A.EXAMPLE.ORG:25565",
            "--server",
            "b.example.org",
        ]);

        let registry = build_registry(&config);

        assert_eq!(registry.entries().len(), 3);
        assert_eq!(registry.probes().len(), 2);
    }

    #[test]
    fn registry_uses_configured_settings() {
        let config = config(&["--server", "a", "--timeout", "7", "--parallelism", "2"]);

        let registry = build_registry(&config);

        assert_eq!(registry.settings().probe_timeout, Duration::from_secs(7));
        assert_eq!(registry.settings().parallelism, 2);
    }

    #[test]
    fn entries_carry_labels_and_notify_settings() {
        let config = config(&["--server", "a.example.org:25570", "--notify-names"]);

        let registry = build_registry(&config);
        let entry = &registry.entries()[0];

        assert_eq!(entry.label(), "a.example.org:25570");
        assert!(entry.notify().named_players);
    }
}

mod rendering {
    use super::*;

    #[test]
    fn events_are_prefixed_with_label() {
        let events = [
            StatusEvent::online("Hello"),
            StatusEvent::joined(PlayerSample::new("1", "Alex")),
        ];

        let lines = render_events("lobby", &events, &EventMessages::default());

        assert_eq!(
            lines,
            vec![
                "[lobby] Server is online: Hello".to_string(),
                "[lobby] Player joined: Alex".to_string(),
            ]
        );
    }
}

mod run_error {
    use super::*;

    #[test]
    fn auto_update_error_displays_source() {
        let error = RunError::AutoUpdate(RegistryError::NoSubscriber);
        assert!(error.to_string().contains("at least one subscriber"));
    }

    #[tokio::test]
    async fn ping_rejects_invalid_address() {
        let result = ping_once("host:notaport", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(RunError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn ping_reports_offline_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = ping_once(&format!("127.0.0.1:{port}"), Duration::from_secs(1)).await;

        assert!(matches!(result, Err(RunError::Offline { .. })));
    }
}
