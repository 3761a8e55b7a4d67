use anyhow::Result;

use super::build;

#[test]
fn it_has_a_valid_command_tree() {
    build().debug_assert();
}

#[test]
fn it_accepts_config_flags_after_the_chat_subcommand() -> Result<()> {
    let matches = build().try_get_matches_from(vec![
        "agentchat",
        "chat",
        "--project-endpoint",
        "https://example.com/api/projects/demo",
        "-a",
        "asst_abc",
        "--poll-interval",
        "250",
    ])?;

    let chat = matches.subcommand_matches("chat").unwrap();
    assert_eq!(
        chat.get_one::<String>("agent-id").map(|e| return e.as_str()),
        Some("asst_abc")
    );
    assert_eq!(
        chat.get_one::<String>("poll-interval").map(|e| return e.as_str()),
        Some("250")
    );

    return Ok(());
}

#[test]
fn it_requires_a_shell_for_completions() {
    let res = build().try_get_matches_from(vec!["agentchat", "completions"]);
    assert!(res.is_err());
}

#[test]
fn it_defaults_to_no_subcommand() -> Result<()> {
    let matches = build().try_get_matches_from(vec!["agentchat"])?;
    assert!(matches.subcommand().is_none());

    return Ok(());
}
