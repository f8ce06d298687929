//! Unit tests for the command registry and the startup command table.

use oncall_bot::command::{
    build_registry, CommandDescriptor, CommandRegistry, Dispatcher, InvocationContext,
    MinMaxValidator, DEFAULT_COMMAND,
};
use oncall_bot::BoxFuture;

fn noop<'a>(_ctx: &'a InvocationContext, _dispatcher: &'a Dispatcher) -> BoxFuture<'a, ()> {
    Box::pin(async { Ok(()) })
}

fn registry() -> CommandRegistry {
    CommandRegistry::new(
        CommandDescriptor::new(DEFAULT_COMMAND, noop)
            .usage("")
            .help("fallback"),
    )
}

#[test]
fn lookup_is_case_insensitive() {
    let mut registry = registry();
    registry.register(CommandDescriptor::new("Ping", noop).usage("ping <channel>"));

    assert_eq!(registry.lookup("PING").name(), "ping");
    assert!(registry.contains("ping"));
}

#[test]
fn unknown_names_resolve_to_the_fallback() {
    let registry = registry();
    let fallback = registry.lookup("no-such-command");
    assert_eq!(fallback.help_text(), "fallback");
    assert!(!registry.contains("no-such-command"));
    assert!(!registry.contains(DEFAULT_COMMAND), "fallback is not a listed command");
}

#[test]
fn duplicate_registration_replaces_in_place() {
    let mut registry = registry();
    registry
        .register(CommandDescriptor::new("a", noop).help("first"))
        .register(CommandDescriptor::new("b", noop).help("second"))
        .register(CommandDescriptor::new("a", noop).help("replaced"));

    let names: Vec<&str> = registry.iter().map(CommandDescriptor::name).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(registry.lookup("a").help_text(), "replaced");
}

#[test]
fn registering_the_default_name_replaces_the_fallback() {
    let mut registry = registry();
    registry.register(CommandDescriptor::new(DEFAULT_COMMAND, noop).help("new fallback"));

    assert_eq!(registry.lookup("anything").help_text(), "new fallback");
    assert_eq!(registry.iter().count(), 0);
}

#[test]
fn help_renders_visible_commands_then_the_fallback() {
    let mut registry = registry();
    registry
        .register(
            CommandDescriptor::new("ping", noop)
                .usage("ping <channel_name>")
                .help("ping oncall"),
        )
        .register(
            CommandDescriptor::new("secret", noop)
                .usage("secret")
                .help("hidden")
                .hidden(),
        );

    assert_eq!(
        registry.render_help(),
        "Hi, I'm oncall bot, I can help you to manage oncall schedule. Here are all the available commands:\n - `ping <channel_name>`: ping oncall\n - ``: fallback"
    );
}

#[test]
fn descriptors_run_their_validator() {
    let descriptor = CommandDescriptor::new("x", noop).validator(MinMaxValidator::exactly(2));
    assert!(descriptor.validate(&["one".to_owned()]).is_some());
    assert!(descriptor
        .validate(&["one".to_owned(), "two".to_owned()])
        .is_none());
    assert!(CommandDescriptor::new("y", noop).validate(&[]).is_none());
}

#[test]
fn startup_table_registers_every_command() {
    let registry = build_registry();
    for name in [
        "help",
        "set-pagerduty",
        "get-pagerduty",
        "set-sheet-url",
        "get-sheet-url",
        "log-request",
        "mark-complete",
        "unmark-complete",
        "ping",
        "join",
        "summary",
        "set-jira-project",
        "get-jira-project",
        "create-ticket",
        "channel-name",
    ] {
        assert!(registry.contains(name), "{name} should be registered");
    }
    assert!(!registry.lookup("channel-name").is_visible());
}

#[test]
fn startup_validators_match_command_arity() {
    let registry = build_registry();
    let args = |n: usize| -> Vec<String> { (0..n).map(|i| i.to_string()).collect() };

    assert!(registry.lookup("set-pagerduty").validate(&args(1)).is_none());
    assert!(registry.lookup("set-pagerduty").validate(&args(2)).is_some());
    assert!(registry.lookup("get-pagerduty").validate(&args(0)).is_none());
    assert!(registry.lookup("summary").validate(&args(1)).is_some());
    assert!(registry.lookup("summary").validate(&args(3)).is_none());
    assert!(registry.lookup("create-ticket").validate(&args(2)).is_none());
    assert!(registry.lookup("log-request").validate(&args(5)).is_none());
    assert!(registry.lookup("mark-complete").validate(&args(3)).is_none());
}
