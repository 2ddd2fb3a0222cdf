//! Secure flags: deferred resolution through a secret source.

use flagwright::{Command, Flag, InputError, MockEnv, MockSecrets, ParseError, Parser, SecretChain};
use flagwright_input::{EnvSecret, MockTerminal, PromptSecret};
use serial_test::serial;

fn token_flag() -> Flag {
    Flag::new("token").secure("Token: ")
}

#[test]
fn value_comes_from_the_secret_source() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().with("token", "abc123"))
        .build();
    parser.register(token_flag()).unwrap();

    assert!(parser.parse(["--token"]));
    assert_eq!(parser.value("token").as_deref(), Some("abc123"));
}

#[test]
fn inline_value_skips_the_source() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().failing("token"))
        .build();
    parser.register(token_flag()).unwrap();

    assert!(parser.parse(["--token=inline"]));
    assert_eq!(parser.value("token").as_deref(), Some("inline"));
}

#[test]
fn absent_optional_secure_flag_is_left_alone() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().failing("token"))
        .build();
    parser.register(token_flag()).unwrap();

    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.value("token"), None);
}

#[test]
fn not_resolved_after_hard_errors() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().failing("token"))
        .build();
    parser.register(token_flag()).unwrap();

    assert!(!parser.parse(["--token", "--nope"]));
    assert_eq!(parser.errors().len(), 1);
    assert!(matches!(parser.errors()[0], ParseError::UnknownFlag { .. }));
    assert_eq!(parser.value("token"), None);
}

#[test]
fn required_secure_flag_is_requested_without_appearing() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().with("password", "pw"))
        .build();
    parser
        .register(Flag::new("password").secure("Password: ").required())
        .unwrap();

    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.value("password").as_deref(), Some("pw"));
}

#[test]
fn required_secure_flag_without_any_input_fails() {
    let mut parser = Parser::builder().secret_source(MockSecrets::new()).build();
    parser
        .register(Flag::new("password").secure("Password: ").required())
        .unwrap();

    assert!(!parser.parse(Vec::<String>::new()));
    assert!(matches!(
        &parser.errors()[0],
        ParseError::Secure { flag, source: InputError::NoInput(_) } if flag == "password"
    ));
}

#[test]
fn secure_default_used_when_source_has_nothing() {
    let mut parser = Parser::builder().secret_source(MockSecrets::new()).build();
    parser
        .register(token_flag().required().default("fallback"))
        .unwrap();

    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.value("token").as_deref(), Some("fallback"));
}

#[test]
fn source_failure_is_a_parse_error() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().failing("token"))
        .build();
    parser.register(token_flag()).unwrap();

    assert!(!parser.parse(["--token"]));
    assert!(matches!(
        &parser.errors()[0],
        ParseError::Secure {
            source: InputError::PromptCancelled,
            ..
        }
    ));
}

#[test]
fn secure_value_is_checked_against_accepted_patterns() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().with("pin", "12"))
        .build();
    parser
        .register(
            Flag::new("pin")
                .secure("PIN: ")
                .accept(r"^\d{4}$", "four digits"),
        )
        .unwrap();

    assert!(!parser.parse(["--pin"]));
    assert!(matches!(parser.errors()[0], ParseError::NotAccepted { .. }));
}

#[test]
fn scoped_required_secure_flag_only_with_its_command() {
    let source = MockSecrets::new().failing("deploy::key");
    let mut parser = Parser::builder().secret_source(source).build();
    parser.command(Command::new("deploy")).unwrap();
    parser.command(Command::new("status")).unwrap();
    parser
        .register(Flag::new("key").scope("deploy").secure("Key: ").required())
        .unwrap();

    assert!(parser.parse(["status"]));

    parser.clear(flagwright::Reset::session());
    assert!(!parser.parse(["deploy"]));
    assert!(matches!(
        &parser.errors()[0],
        ParseError::Secure { flag, .. } if flag == "deploy::key"
    ));
}

// ============================================================================
// Environment and chained sources
// ============================================================================

#[test]
fn environment_seeds_secure_flag() {
    let mut parser = Parser::builder()
        .env_reader(MockEnv::new().with_var("API_TOKEN", "from-env"))
        .secret_source(MockSecrets::new().failing("token"))
        .build();
    parser.register(token_flag().env("API_TOKEN")).unwrap();

    assert!(parser.parse(Vec::<String>::new()));
    assert_eq!(parser.value("token").as_deref(), Some("from-env"));
}

#[test]
fn command_line_value_beats_environment_seed() {
    let mut parser = Parser::builder()
        .env_reader(MockEnv::new().with_var("API_TOKEN", "from-env"))
        .secret_source(MockSecrets::new())
        .build();
    parser.register(token_flag().env("API_TOKEN")).unwrap();

    assert!(parser.parse(["--token=typed"]));
    assert_eq!(parser.value("token").as_deref(), Some("typed"));
}

#[test]
fn chain_tries_environment_then_table() {
    let chain = SecretChain::new()
        .try_source(EnvSecret::with_reader(
            MockEnv::new().with_var("FW_TOKEN", "chained-env"),
        ))
        .try_source(MockSecrets::new().with("password", "table"));
    let mut parser = Parser::builder()
        .env_reader(MockEnv::new())
        .secret_source(chain)
        .build();
    parser.register(token_flag().env("FW_TOKEN")).unwrap();
    parser
        .register(Flag::new("password").secure("Password: "))
        .unwrap();

    assert!(parser.parse(["--token", "--password"]));
    assert_eq!(parser.value("token").as_deref(), Some("chained-env"));
    assert_eq!(parser.value("password").as_deref(), Some("table"));
}

#[test]
fn terminal_prompt_answers_secure_flag() {
    let prompt = PromptSecret::with_terminal(MockTerminal::with_response("s3cret"));
    let mut parser = Parser::builder().secret_source(prompt).build();
    parser.register(token_flag()).unwrap();

    assert!(parser.parse(["--token"]));
    assert_eq!(parser.value("token").as_deref(), Some("s3cret"));
}

#[test]
#[serial]
fn real_environment_seeds_secure_flag() {
    std::env::set_var("FLAGWRIGHT_TEST_TOKEN", "process-env");
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().failing("token"))
        .build();
    parser
        .register(token_flag().env("FLAGWRIGHT_TEST_TOKEN"))
        .unwrap();

    let ok = parser.parse(Vec::<String>::new());
    std::env::remove_var("FLAGWRIGHT_TEST_TOKEN");

    assert!(ok);
    assert_eq!(parser.value("token").as_deref(), Some("process-env"));
}

#[test]
fn debug_output_redacts_secure_values() {
    let mut parser = Parser::builder()
        .secret_source(MockSecrets::new().with("token", "hunter2"))
        .build();
    parser.register(token_flag()).unwrap();
    parser.register(Flag::new("user")).unwrap();

    assert!(parser.parse(["--token", "--user", "ada"]));
    let shown = format!("{:?}", parser);
    assert!(!shown.contains("hunter2"));
    assert!(shown.contains("[REDACTED]"));
    assert!(shown.contains("ada"));
}
