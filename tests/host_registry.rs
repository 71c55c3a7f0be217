use find_id::client::Account;
use find_id::config::Settings;
use find_id::host::runner::build_registry;
use find_id::i18n::Locale;
use find_id::testing::{FakeChatClient, InvocationBuilder};
use std::sync::Arc;

fn settings(prefix: &str) -> Settings {
    Settings {
        api_id: 1,
        api_hash: "0123456789abcdef0123456789abcdef".into(),
        phone: None,
        session_file: "test.session".into(),
        command_prefix: prefix.into(),
        locale: Locale::En,
        custom_emoji: false,
        photo_limit: 10,
        outgoing_only: true,
    }
}

#[test]
fn test_registry_offers_id_and_help() {
    let client = Arc::new(FakeChatClient::new());
    let registry = build_registry(&settings("."), client);

    let names: Vec<&str> = registry.infos().iter().map(|info| info.name).collect();
    assert_eq!(names, vec!["help", "id"]);

    let (command, parsed) = registry.lookup(".ID @alice").expect("id should match");
    assert_eq!(command.name(), "id");
    assert_eq!(parsed.args.as_deref(), Some("@alice"));

    assert!(registry.lookup("!id").is_none());
    assert!(registry.lookup(".unknown").is_none());
}

#[test]
fn test_custom_prefix() {
    let client = Arc::new(FakeChatClient::new());
    let registry = build_registry(&settings("!"), client);

    assert!(registry.lookup("!id").is_some());
    assert!(registry.lookup(".id").is_none());
}

#[tokio::test]
async fn test_help_lists_commands_and_usage() {
    let client = Arc::new(FakeChatClient::new());
    let registry = build_registry(&settings("."), client.clone());
    let me = Account::bare(1);

    let (help, parsed) = registry.lookup(".help").expect("help should match");
    let invocation = InvocationBuilder::from_account(&me).build();
    assert!(parsed.args.is_none());
    help.execute(invocation).await;
    let listing = client.last_edit_text().expect("help should answer");
    assert!(listing.contains("<code>.id</code>"));
    assert!(listing.contains("<code>.help</code>"));

    let (help, parsed) = registry.lookup(".help id").expect("help should match");
    let invocation = InvocationBuilder::from_account(&me)
        .args(parsed.args.as_deref().unwrap_or_default())
        .build();
    help.execute(invocation).await;
    let usage = client.last_edit_text().expect("help should answer");
    assert!(usage.contains("<code>.id @username</code>"));
    assert!(usage.contains("<code>.id &lt;user_id&gt;</code>"));
}
