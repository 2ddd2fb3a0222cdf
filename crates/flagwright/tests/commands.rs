//! Command recognition, scoped flags, callbacks and environment injection.

use std::sync::Arc;

use flagwright::{Command, ConfigError, Flag, FlagKey, MockEnv, ParseError, Parser};
use parking_lot::Mutex;

fn user_tree() -> Command {
    Command::new("user")
        .description("Manage users")
        .subcommand(Command::new("create"))
        .subcommand(Command::new("delete"))
}

fn chain(depth: usize) -> Command {
    let mut cmd = Command::new(format!("level{}", depth));
    for level in (1..depth).rev() {
        cmd = Command::new(format!("level{}", level)).subcommand(cmd);
    }
    cmd
}

// ============================================================================
// Recognition
// ============================================================================

#[test]
fn nested_command_is_recognized() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();

    assert!(parser.parse(["user", "create"]));
    assert_eq!(parser.commands(), vec!["user create"]);
    assert!(parser.has_command("user create"));
    assert!(!parser.has_command("user delete"));
}

#[test]
fn command_split_by_flags_is_a_continuation() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser.register(Flag::new("team").scope("user")).unwrap();

    assert!(parser.parse(["user", "--team", "core", "create"]));
    assert_eq!(parser.commands(), vec!["user create"]);
    assert_eq!(parser.value_in("user", "team").as_deref(), Some("core"));
}

#[test]
fn continuation_keeps_commands_from_earlier_parses() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser.register(Flag::new("team").scope("user")).unwrap();

    assert!(parser.parse(["user"]));
    assert_eq!(parser.commands(), vec!["user"]);

    assert!(parser.parse(["user", "--team", "core", "create"]));
    assert_eq!(parser.commands(), vec!["user", "user create"]);
}

#[test]
fn unmatched_tokens_after_a_command_are_positionals() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();

    assert!(parser.parse(["user", "create", "ada", "grace"]));
    let values: Vec<_> = parser.positionals().iter().map(|p| p.value()).collect();
    assert_eq!(values, vec!["ada", "grace"]);
    assert_eq!(parser.positionals()[0].position(), 2);
}

#[test]
fn second_top_level_command_starts_a_new_context() {
    let mut parser = Parser::new();
    parser.command(Command::new("build")).unwrap();
    parser.command(Command::new("test")).unwrap();
    parser.register(Flag::new("out").scope("build")).unwrap();

    assert!(!parser.parse(["build", "test", "--out", "dist"]));
    assert_eq!(parser.commands(), vec!["build", "test"]);
    assert!(matches!(
        &parser.errors()[0],
        ParseError::OutOfScope { flag, paths } if flag == "--out" && paths == &vec!["build".to_string()]
    ));
}

#[test]
fn depth_limit_is_inclusive() {
    let mut parser = Parser::new();
    assert!(parser.command(chain(10)).is_ok());

    let mut parser = Parser::new();
    assert!(matches!(
        parser.command(chain(11)),
        Err(ConfigError::DepthExceeded {
            depth: 11,
            max: 10,
            ..
        })
    ));
}

#[test]
fn configured_depth_limit() {
    let mut parser = Parser::builder().max_depth(2).build();
    assert!(parser.command(chain(2)).is_ok());
    assert!(parser.command(Command::new("x").subcommand(chain(2))).is_err());
}

#[test]
fn duplicate_command_rejected() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    assert!(matches!(
        parser.command(Command::new("user")),
        Err(ConfigError::DuplicateCommand { .. })
    ));
}

#[test]
fn command_under_extends_the_tree() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser
        .command_under("user", Command::new("list"))
        .unwrap();

    assert!(parser.parse(["user", "list"]));
    assert!(parser.has_command("user list"));
}

// ============================================================================
// Scoped flags
// ============================================================================

#[test]
fn scoped_flag_before_its_command_is_out_of_scope() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser
        .register(Flag::new("force").scope("user delete").standalone())
        .unwrap();

    assert!(!parser.parse(["--force", "user", "delete"]));
    assert!(matches!(parser.errors()[0], ParseError::OutOfScope { .. }));
}

#[test]
fn scoped_flag_after_its_command() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser
        .register(Flag::new("force").scope("user delete").standalone())
        .unwrap();

    assert!(parser.parse(["user", "delete", "--force"]));
    assert_eq!(
        parser.options().get(&FlagKey::scoped("user delete", "force")),
        Some(&"true".to_string())
    );
}

#[test]
fn flag_applies_to_every_active_scope() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser
        .register(Flag::new("verbose").scope("user").standalone())
        .unwrap();
    parser
        .register(Flag::new("verbose").scope("user create").standalone())
        .unwrap();

    assert!(parser.parse(["user", "create", "--verbose"]));
    assert_eq!(parser.get_bool(("user", "verbose")), Ok(true));
    assert_eq!(parser.get_bool(("user create", "verbose")), Ok(true));
}

#[test]
fn global_flag_wins_over_scoped_namesake() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser.register(Flag::new("out")).unwrap();
    parser.register(Flag::new("out").scope("user")).unwrap();

    assert!(parser.parse(["user", "--out", "x"]));
    assert_eq!(parser.value("out").as_deref(), Some("x"));
    assert_eq!(parser.value_in("user", "out"), None);
}

#[test]
fn required_scoped_flag_only_when_command_given() {
    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser
        .register(Flag::new("name").scope("user create").required())
        .unwrap();

    assert!(parser.parse(["user", "delete"]));

    let mut parser = Parser::new();
    parser.command(user_tree()).unwrap();
    parser
        .register(Flag::new("name").scope("user create").required())
        .unwrap();
    assert!(!parser.parse(["user", "create"]));
    assert!(matches!(
        parser.errors()[0],
        ParseError::MissingRequired { .. }
    ));
}

// ============================================================================
// Callbacks
// ============================================================================

fn recording(log: &Arc<Mutex<Vec<String>>>, name: &str) -> Command {
    let log = Arc::clone(log);
    Command::new(name).callback(move |ctx| {
        log.lock().push(ctx.path());
        Ok(())
    })
}

#[test]
fn queued_callbacks_run_on_request() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut parser = Parser::new();
    parser.command(recording(&log, "build")).unwrap();
    parser.command(recording(&log, "test")).unwrap();

    assert!(parser.parse(["build", "test"]));
    assert!(log.lock().is_empty());
    assert_eq!(parser.pending_callbacks(), vec!["build", "test"]);

    assert_eq!(parser.run_callbacks(), 2);
    assert_eq!(*log.lock(), vec!["build", "test"]);
    assert!(parser.pending_callbacks().is_empty());
}

#[test]
fn eager_callbacks_run_during_the_pass() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut parser = Parser::builder().eager_callbacks(true).build();
    parser.command(recording(&log, "build")).unwrap();
    parser.command(recording(&log, "test")).unwrap();

    assert!(parser.parse(["build", "test"]));
    assert_eq!(*log.lock(), vec!["build", "test"]);
    assert!(parser.pending_callbacks().is_empty());
}

#[test]
fn callback_sees_resolved_options() {
    let seen = Arc::new(Mutex::new(None));
    let mut parser = Parser::new();
    parser
        .register(Flag::new("out").scope("build"))
        .unwrap();
    let captured = Arc::clone(&seen);
    parser
        .command(Command::new("build").callback(move |ctx| {
            *captured.lock() = ctx.value("out").map(str::to_string);
            Ok(())
        }))
        .unwrap();

    assert!(parser.parse(["build", "--out", "dist"]));
    parser.run_callbacks();
    assert_eq!(seen.lock().as_deref(), Some("dist"));
}

#[test]
fn callback_errors_are_stored_not_fatal() {
    let mut parser = Parser::builder().eager_callbacks(true).build();
    parser
        .command(Command::new("deploy").callback(|_| anyhow::bail!("no target configured")))
        .unwrap();

    assert!(parser.parse(["deploy"]));
    assert!(parser.success());
    let err = parser.callback_error("deploy").unwrap();
    assert_eq!(err.to_string(), "no target configured");
    assert_eq!(parser.callback_errors().len(), 1);
}

// ============================================================================
// Environment injection
// ============================================================================

#[test]
fn explicit_env_var_feeds_scoped_flag() {
    let mut parser = Parser::builder()
        .env_reader(MockEnv::new().with_var("OUT_DIR", "from-env"))
        .build();
    parser.command(Command::new("build")).unwrap();
    parser
        .register(Flag::new("out").scope("build").env("OUT_DIR"))
        .unwrap();

    assert!(parser.parse(["build"]));
    assert_eq!(parser.value_in("build", "out").as_deref(), Some("from-env"));
    assert!(parser.positionals().is_empty());
}

#[test]
fn command_line_wins_over_environment() {
    let mut parser = Parser::builder()
        .env_reader(MockEnv::new().with_var("OUT_DIR", "from-env"))
        .build();
    parser.command(Command::new("build")).unwrap();
    parser
        .register(Flag::new("out").scope("build").env("OUT_DIR"))
        .unwrap();

    assert!(parser.parse(["build", "--out", "cli"]));
    assert_eq!(parser.value_in("build", "out").as_deref(), Some("cli"));
}

#[test]
fn env_is_not_injected_for_inactive_commands() {
    let mut parser = Parser::builder()
        .env_reader(MockEnv::new().with_var("OUT_DIR", "from-env"))
        .build();
    parser.command(Command::new("build")).unwrap();
    parser
        .register(Flag::new("out").scope("build").env("OUT_DIR"))
        .unwrap();

    assert!(parser.parse(Vec::<String>::new()));
    assert!(parser.options().is_empty());
}

#[test]
fn derived_env_names_with_prefix() {
    let env = MockEnv::new()
        .with_var("APP_VERBOSE", "1")
        .with_var("APP_USER_CREATE_DRY_RUN", "true");
    let mut parser = Parser::builder().env_prefix("APP").env_reader(env).build();
    parser.command(user_tree()).unwrap();
    parser
        .register(Flag::new("verbose").standalone())
        .unwrap();
    parser
        .register(Flag::new("dry-run").scope("user create").standalone())
        .unwrap();

    assert!(parser.parse(["user", "create"]));
    assert_eq!(parser.get_bool("verbose"), Ok(true));
    assert_eq!(parser.get_bool(("user create", "dry-run")), Ok(true));
}

#[test]
fn non_boolean_env_for_standalone_is_ignored() {
    let mut parser = Parser::builder()
        .env_prefix("APP")
        .env_reader(MockEnv::new().with_var("APP_VERBOSE", "yes"))
        .build();
    parser
        .register(Flag::new("verbose").standalone())
        .unwrap();

    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.get_bool("verbose"), Ok(false));
}

#[test]
fn env_value_pinned_to_scoped_flag() {
    let mut parser = Parser::builder()
        .env_reader(MockEnv::new().with_var("BUILD_OUT", "scoped"))
        .build();
    parser.command(Command::new("build")).unwrap();
    parser.register(Flag::new("out")).unwrap();
    parser
        .register(Flag::new("out").scope("build").env("BUILD_OUT"))
        .unwrap();

    assert!(parser.parse(["build"]));
    assert_eq!(parser.value_in("build", "out").as_deref(), Some("scoped"));
    assert_eq!(parser.value("out"), None);
}
