use studio_edge::config::EdgeConfig;

#[test]
fn test_env_overrides_nested_settings() {
    temp_env::with_vars(
        [
            ("STUDIO_EDGE_SERVER__PORT", Some("4321")),
            ("STUDIO_EDGE_GATE__LOGIN_PATH", Some("/signin")),
            ("STUDIO_EDGE_PAGES__MAX_BODY_BYTES", Some("1024")),
        ],
        || {
            let config = EdgeConfig::from_sources(None, None).unwrap();
            assert_eq!(config.server.port, 4321);
            assert_eq!(config.gate.login_path, "/signin");
            assert_eq!(config.pages.max_body_bytes, 1024);
        },
    );
}

#[test]
fn test_backend_url_wins_over_env() {
    temp_env::with_vars(
        [("STUDIO_EDGE_BACKEND__ORIGIN", Some("http://env-backend:9000"))],
        || {
            let config = EdgeConfig::from_sources(None, None).unwrap();
            assert_eq!(config.backend.origin, "http://env-backend:9000");

            let config =
                EdgeConfig::from_sources(None, Some("http://api.internal:8000".to_string()))
                    .unwrap();
            assert_eq!(config.backend.origin, "http://api.internal:8000");
        },
    );
}
