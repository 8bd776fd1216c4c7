//! Driving a persona through the line console.

mod common;

use common::{player, Fixture};
use tavernkeep::bot::console;
use tavernkeep::bot::Persona;
use tavernkeep::storage::Document;

#[tokio::test]
async fn console_runs_commands_until_quit() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);
    let input: &[u8] = b"/ping\nhello there\n:quit\n/ping\n";
    let mut output: Vec<u8> = Vec::new();

    console::run(&mut bot, player(), input, &mut output).await.unwrap();

    let printed = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = printed.lines().collect();
    assert!(lines[0].starts_with("🟢 Stanley is online"), "{}", printed);
    assert_eq!(lines[1], "🏓 Pong!");
    // Chatter is ignored and nothing runs after :quit.
    assert_eq!(lines.len(), 2, "{}", printed);
}

#[tokio::test]
async fn console_switches_callers_and_admin_rights() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);
    let script = "/admin_givegold <@2> 4\n\
                  :as 900 Gamemaster\n\
                  /admin_givegold <@2> 4\n\
                  :as 2 Brom\n\
                  /balance\n\
                  :admin maybe\n";
    let mut output: Vec<u8> = Vec::new();

    console::run(&mut bot, player(), script.as_bytes(), &mut output).await.unwrap();

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("(only you can see this) ❌ You need administrator permissions"), "{}", printed);
    assert!(printed.contains("* acting as Gamemaster (900), admin true"), "{}", printed);
    assert!(printed.contains("✨ <@900> **rewarded** <@2> `4 gp, 0 sp, 0 cp`!"), "{}", printed);
    assert!(printed.contains("* acting as Brom (2), admin false"), "{}", printed);
    assert!(printed.contains("💰 Your balance: `4 gp, 0 sp, 0 cp`."), "{}", printed);
    assert!(printed.contains("* usage: :admin on|off (currently off)"), "{}", printed);

    assert_eq!(fx.read(Document::GoldData)["2"]["gp"], 4);
}

#[tokio::test]
async fn console_reassembles_lines_split_across_reads() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);
    let stdin = tokio_test::io::Builder::new()
        .read(b"/pi")
        .read(b"ng\n/bal")
        .read(b"ance\n")
        .build();
    let mut output: Vec<u8> = Vec::new();

    console::run(&mut bot, player(), tokio::io::BufReader::new(stdin), &mut output)
        .await
        .unwrap();

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("🏓 Pong!\n"), "{}", printed);
    assert!(printed.contains("💰 Your balance: `0 gp, 0 sp, 0 cp`."), "{}", printed);
}
