//! Line-oriented front end: one command per line on stdin, replies on stdout.
//!
//! Besides persona commands the console understands two control lines:
//! `:as <id> [name]` switches the acting caller and `:admin on|off` toggles
//! admin rights for the current caller. `:quit` ends the session.

use anyhow::Result;
use log::{debug, info};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::command::Caller;
use super::Bot;

enum Control {
    SwitchCaller(Caller),
    Admin(bool),
    Quit,
    Unknown(String),
}

fn control(line: &str, current: &Caller, admin_ids: &[String]) -> Option<Control> {
    let rest = line.strip_prefix(':')?;
    let mut words = rest.split_whitespace();
    let verb = words.next().unwrap_or_default();
    Some(match verb {
        "as" => match words.next() {
            Some(id) => {
                let name = words.collect::<Vec<_>>().join(" ");
                let name = if name.is_empty() { id.to_string() } else { name };
                let is_admin = admin_ids.iter().any(|a| a == id);
                Control::SwitchCaller(Caller::new(id, name).admin(is_admin))
            }
            None => Control::Unknown("usage: :as <id> [name]".into()),
        },
        "admin" => match words.next() {
            Some("on") => Control::Admin(true),
            Some("off") => Control::Admin(false),
            _ => Control::Unknown(format!(
                "usage: :admin on|off (currently {})",
                if current.is_admin { "on" } else { "off" }
            )),
        },
        "quit" | "exit" => Control::Quit,
        other => Control::Unknown(format!("unknown console command :{}", other)),
    })
}

/// Run `bot` over `input` until end of input or `:quit`.
pub async fn run<R, W>(bot: &mut Bot, mut caller: Caller, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let name = bot.persona().display_name(bot.config()).to_string();
    let presence = bot.presence();
    output
        .write_all(format!("🟢 {} is online: {}\n", name, presence).as_bytes())
        .await?;
    output.flush().await?;
    info!("{} console started for {}", name, caller.user_id);

    let admin_ids = bot.config().bot.admin_ids.clone();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(ctl) = control(line, &caller, &admin_ids) {
            let note = match ctl {
                Control::SwitchCaller(next) => {
                    caller = next;
                    format!("acting as {} ({}), admin {}", caller.display_name, caller.user_id, caller.is_admin)
                }
                Control::Admin(on) => {
                    caller.is_admin = on;
                    format!("admin {}", if on { "on" } else { "off" })
                }
                Control::Quit => break,
                Control::Unknown(msg) => msg,
            };
            output.write_all(format!("* {}\n", note).as_bytes()).await?;
            output.flush().await?;
            continue;
        }

        let replies = bot.handle(&caller, line).await;
        if replies.is_empty() {
            debug!("Ignored non-command line");
        }
        for reply in replies {
            output.write_all(reply.render().as_bytes()).await?;
            output.write_all(b"\n").await?;
        }
        output.flush().await?;
    }
    info!("{} console closed", name);
    Ok(())
}
