use super::*;
use crate::cli::settings::SettingError;
use serde_json::json;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn no_subcommand_means_shell() {
    let args = parse_args(&["icd-mcp"]);
    assert_eq!(args.command, None);
    assert_eq!(args.server_url, None);
    assert_eq!(args.routing, None);
}

#[test]
fn global_flags_parse_after_subcommand() {
    let args = parse_args(&[
        "icd-mcp",
        "names",
        "--server-url",
        "http://mcp.internal:3000",
        "--routing",
        "intent",
        "--log-level",
        "debug",
    ]);

    assert_eq!(args.command, Some(Commands::Names));
    assert_eq!(args.server_url.as_deref(), Some("http://mcp.internal:3000"));
    assert_eq!(args.routing, Some(RoutingMode::Intent));
    assert_eq!(args.log_level.as_deref(), Some("debug"));
}

#[test]
fn unknown_routing_mode_is_rejected() {
    assert!(Args::try_parse_from(["icd-mcp", "--routing", "fastest"]).is_err());
}

#[test]
fn call_takes_name_and_optional_json() {
    let args = parse_args(&["icd-mcp", "call", "pods_list", r#"{"namespace": "default"}"#]);
    assert_eq!(
        args.command,
        Some(Commands::Call {
            name: "pods_list".to_string(),
            arguments: Some(r#"{"namespace": "default"}"#.to_string()),
        })
    );

    let args = parse_args(&["icd-mcp", "call", "namespaces_list"]);
    assert_eq!(
        args.command,
        Some(Commands::Call {
            name: "namespaces_list".to_string(),
            arguments: None,
        })
    );
}

#[test]
fn config_subcommands_parse() {
    let args = parse_args(&["icd-mcp", "config", "set", "routing", "intent"]);
    assert_eq!(
        args.command,
        Some(Commands::Config {
            action: Some(ConfigCommand::Set {
                key: "routing".to_string(),
                value: "intent".to_string(),
            }),
        })
    );

    let args = parse_args(&["icd-mcp", "config"]);
    assert_eq!(args.command, Some(Commands::Config { action: None }));
}

#[test]
fn one_shot_requests_map_from_subcommands() {
    assert_eq!(
        OneShot::from_command(&Commands::Tools),
        Ok(Some(OneShot::ListTools))
    );
    assert_eq!(
        OneShot::from_command(&Commands::Info {
            name: "pods_get".to_string()
        }),
        Ok(Some(OneShot::ToolInfo("pods_get".to_string())))
    );
    assert_eq!(OneShot::from_command(&Commands::Shell), Ok(None));
    assert_eq!(OneShot::from_command(&Commands::Health), Ok(None));
}

#[test]
fn one_shot_call_validates_arguments_before_connecting() {
    let request = OneShot::from_command(&Commands::Call {
        name: "pods_list".to_string(),
        arguments: Some(r#"{"namespace": "default"}"#.to_string()),
    })
    .expect("valid arguments");
    let Some(OneShot::CallTool(name, arguments)) = request else {
        panic!("expected a tool call, got {request:?}");
    };
    assert_eq!(name, "pods_list");
    assert_eq!(Value::Object(arguments), json!({"namespace": "default"}));

    let err = OneShot::from_command(&Commands::Call {
        name: "pods_list".to_string(),
        arguments: Some("[1]".to_string()),
    })
    .expect_err("arrays are not arguments");
    assert!(matches!(err, McpError::InvalidUserInput(_)));
}

#[test]
fn registry_sets_and_unsets_known_keys() {
    let registry = SettingRegistry::new();
    let mut config = Config::default();

    let message = registry
        .set("server-url", "http://mcp.internal:3000/", &mut config)
        .expect("valid url");
    assert_eq!(message, "✅ Set server-url to: http://mcp.internal:3000");
    assert_eq!(config.server_url.as_deref(), Some("http://mcp.internal:3000"));

    registry
        .set("routing", "intent", &mut config)
        .expect("valid mode");
    registry
        .set("session_timeout", "30s", &mut config)
        .expect("underscore alias and unit suffix");
    registry
        .set("log-level", "WARNING", &mut config)
        .expect("python level name");
    assert_eq!(config.routing, Some(RoutingMode::Intent));
    assert_eq!(config.session_timeout_secs, Some(30));
    assert_eq!(config.log_level.as_deref(), Some("warn"));

    assert_eq!(
        registry.unset("routing", &mut config).expect("known key"),
        "✅ Unset routing"
    );
    assert_eq!(config.routing, None);
}

#[test]
fn registry_rejects_unknown_keys_and_bad_values() {
    let registry = SettingRegistry::new();
    let mut config = Config::default();

    assert_eq!(
        registry.set("theme", "dark", &mut config),
        Err(SettingError::UnknownKey("theme".to_string()))
    );
    assert!(matches!(
        registry.set("server-url", "localhost:3000", &mut config),
        Err(SettingError::InvalidValue { key: "server-url", .. })
    ));
    assert!(matches!(
        registry.set("session-timeout", "0", &mut config),
        Err(SettingError::InvalidValue { .. })
    ));
    assert!(matches!(
        registry.set("log-level", "chatty", &mut config),
        Err(SettingError::InvalidValue { .. })
    ));
    assert_eq!(config, Config::default());
}

#[test]
fn format_all_lists_keys_in_display_order() {
    let registry = SettingRegistry::new();
    let config = Config {
        server_url: Some("http://localhost:3000".to_string()),
        session_timeout_secs: Some(10),
        ..Default::default()
    };

    assert_eq!(
        registry.format_all(&config),
        "Current configuration:\n  \
         server-url: http://localhost:3000\n  \
         log-level: (unset)\n  \
         routing: (unset)\n  \
         session-timeout: 10s"
    );
    assert_eq!(
        registry.keys_display_order(),
        &["server-url", "log-level", "routing", "session-timeout"]
    );
}
