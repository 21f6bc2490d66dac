//! Typed lines to client events, as the terminal front end sees them.

use insta::assert_snapshot;
use lexo_cli::commands::{Command, parse};

fn mapping(inputs: &[&str]) -> String {
    inputs
        .iter()
        .map(|input| format!("{input:?} => {:?}", parse(input).into_event()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn session_commands() {
    assert_snapshot!(mapping(&["/join", "/resume", "/leave", "/reset", "/emote gg"]), @r#"
    "/join" => Some(Join { resume: false })
    "/resume" => Some(Join { resume: true })
    "/leave" => Some(Leave)
    "/reset" => Some(Reset)
    "/emote gg" => Some(SendEmote { symbol: "gg" })
    "#);
}

#[test]
fn words_pass_through_untouched() {
    // Case folding and validation belong to the client.
    assert_snapshot!(mapping(&["Kalem", "  ab", "a1"]), @r#"
    "Kalem" => Some(Submit { text: "Kalem" })
    "  ab" => Some(Submit { text: "ab" })
    "a1" => Some(Submit { text: "a1" })
    "#);
}

#[test]
fn front_end_commands_produce_no_event() {
    assert_snapshot!(mapping(&["/quit", "/q", "/help", "/emote", "/dance"]), @r#"
    "/quit" => None
    "/q" => None
    "/help" => None
    "/emote" => None
    "/dance" => None
    "#);
    assert_eq!(parse("/q"), Command::Quit);
}
