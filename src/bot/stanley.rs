//! Stanley: gold, the gear shop, item requests and the audit log.

use anyhow::Result;
use log::{info, warn};

use super::command::{help_embed, mention, opt, req, Args, Caller, CommandSpec};
use super::reply::{paginate, Reply};
use super::{capitalize, Bot};
use crate::game::audit::{AuditEntry, AuditLog};
use crate::game::currency::Coins;
use crate::game::errors::GameError;
use crate::game::gold::GoldBook;
use crate::game::inventory::Inventories;
use crate::game::requests::{Catalog, Requests};
use crate::game::responses::ResponseBook;
use crate::game::shop::{display_category, Shop};
use crate::logutil::escape_log;
use crate::storage::Document;

const DEFAULT_AUDIT_LIMIT: i64 = 10;
const AUDIT_LINES_PER_MESSAGE: usize = 10;

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "ping",
        description: "Test if the bot is working.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "stanley_help",
        description: "Displays Stanley's available commands.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "balance",
        description: "Check your current gold balance.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "stanley_inventory",
        description: "Check your inventory.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "givegold",
        description: "Give gold to another player.",
        admin_only: false,
        params: &[req("member"), opt("gp"), opt("sp"), opt("cp")],
    },
    CommandSpec {
        name: "shop",
        description: "Browse Stanley's legendary wares.",
        admin_only: false,
        params: &[opt("category")],
    },
    CommandSpec {
        name: "buy",
        description: "Purchase an item from Stanley's shop.",
        admin_only: false,
        params: &[req("item")],
    },
    CommandSpec {
        name: "sell",
        description: "Sell an item back to Stanley for half its value.",
        admin_only: false,
        params: &[req("item")],
    },
    CommandSpec {
        name: "request",
        description: "Request an approved item from Stanley's catalog.",
        admin_only: false,
        params: &[req("item")],
    },
    CommandSpec {
        name: "requests_available",
        description: "Lists all requestable items.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "all_requests",
        description: "View all pending item requests.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "takegold",
        description: "(Admin) Remove gold from a player.",
        admin_only: true,
        params: &[req("member"), opt("gp"), opt("sp"), opt("cp")],
    },
    CommandSpec {
        name: "admin_givegold",
        description: "(Admin) Give gold to a player without deducting it.",
        admin_only: true,
        params: &[req("member"), opt("gp"), opt("sp"), opt("cp")],
    },
    CommandSpec {
        name: "refresh_market",
        description: "(Admin) Restock Stanley's shelves.",
        admin_only: true,
        params: &[],
    },
    CommandSpec {
        name: "request_add",
        description: "(Admin) Add a new item to the requestable list.",
        admin_only: true,
        params: &[req("item"), req("price_gp"), req("rarity"), req("category")],
    },
    CommandSpec {
        name: "request_approve",
        description: "(Admin) Approve a requested item and add it to the shop.",
        admin_only: true,
        params: &[req("item"), opt("stock")],
    },
    CommandSpec {
        name: "audit_log",
        description: "(Admin) View recent shop transactions.",
        admin_only: true,
        params: &[opt("limit")],
    },
];

pub(crate) async fn dispatch(bot: &mut Bot, caller: &Caller, command: &str, args: &Args) -> Result<Vec<Reply>> {
    match command {
        "ping" => Ok(vec![Reply::text("🏓 Pong!")]),
        "stanley_help" => Ok(vec![Reply::embed(help_embed(
            "📜 Stanley's Commands",
            COMMANDS,
            bot.config.bot.embed_field_limit,
        ))]),
        "balance" => balance(bot, caller).await,
        "stanley_inventory" => inventory(bot, caller).await,
        "givegold" => givegold(bot, caller, args).await,
        "shop" => shop(bot, args.get("category")).await,
        "buy" => buy(bot, caller, args.text("item")?).await,
        "sell" => sell(bot, caller, args.text("item")?).await,
        "request" => request(bot, caller, args.text("item")?).await,
        "requests_available" => requests_available(bot).await,
        "all_requests" => all_requests(bot).await,
        "takegold" => takegold(bot, caller, args).await,
        "admin_givegold" => admin_givegold(bot, caller, args).await,
        "refresh_market" => refresh_market(bot, caller).await,
        "request_add" => request_add(bot, caller, args).await,
        "request_approve" => request_approve(bot, caller, args).await,
        "audit_log" => audit_log(bot, args.int_or("limit", DEFAULT_AUDIT_LIMIT)?).await,
        other => {
            warn!("Stanley has no handler for /{}", other);
            Ok(vec![Reply::private(format!("❌ `/{}` is not one of Stanley's commands.", other))])
        }
    }
}

/// Pick a line from Stanley's response file.
async fn say(bot: &mut Bot, category: &str, vars: &[(&str, &str)]) -> Result<String> {
    let responses: ResponseBook = bot.store.load(Document::StanleyResponses).await?;
    Ok(responses.pick(category, vars, &mut *bot.roller))
}

/// Title-case an item name the way Stanley writes it on the shelf labels.
fn title(item: &str) -> String {
    item.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn gp(price_cp: u64) -> u64 {
    price_cp / 100
}

async fn balance(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let player = caller.user_id.clone();
    let coins = bot
        .store
        .update(Document::GoldData, move |gold: &mut GoldBook| gold.ensure(&player))
        .await?;
    Ok(vec![Reply::text(format!("💰 Your balance: `{}`.", coins.ledger()))])
}

async fn inventory(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let inventory: Inventories = bot.store.load(Document::PlayerInventories).await?;
    let bag = match inventory.bag(&caller.user_id) {
        Some(bag) if !bag.is_empty() => bag,
        _ => {
            return Ok(vec![Reply::text(format!(
                "🎒 {}, you own absolutely nothing. Not even a rusty dagger. How tragic.",
                caller.mention()
            ))])
        }
    };
    let lines: Vec<String> = bag
        .iter()
        .map(|(item, qty)| format!("🔹 **{}** (x{})", title(item), qty))
        .collect();

    // Leave room for the page header.
    let limit = bot.config.bot.message_limit.saturating_sub(100);
    let pages = paginate(&lines, limit);
    let total = pages.len();
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            Reply::text(format!(
                "🎒 **{}'s Inventory (Page {}/{})**\n{}",
                caller.display_name,
                i + 1,
                total,
                page
            ))
        })
        .collect())
}

/// Amount from the gp/sp/cp arguments, refusing zero.
fn amount(args: &Args) -> Result<(String, Coins)> {
    let member = args
        .member("member")?
        .ok_or_else(|| GameError::InvalidArgument("`member` is required".into()))?;
    let coins = args.coins()?;
    if coins.is_zero() {
        return Err(GameError::InvalidArgument("you must specify an amount of gold".into()).into());
    }
    Ok((member, coins))
}

async fn givegold(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let (member, coins) = amount(args)?;
    if member == caller.user_id {
        return Err(GameError::InvalidArgument("you can't give gold to yourself".into()).into());
    }
    let from = caller.user_id.clone();
    let to = member.clone();
    let given = bot
        .store
        .update(Document::GoldData, move |gold: &mut GoldBook| gold.give(&from, &to, coins))
        .await?;
    if let Err(GameError::InsufficientFunds { .. }) = given {
        return Ok(vec![Reply::text("❌ You don't have enough gold!")]);
    }
    given?;
    info!(
        target: "audit",
        "{} gave {} to {}",
        escape_log(&caller.user_id),
        coins,
        escape_log(&member)
    );
    let total_gp = (coins.total_cp() / 100).to_string();
    let line = say(
        bot,
        "givegold_success",
        &[
            ("user", caller.display_name.as_str()),
            ("receiver", mention(&member).as_str()),
            ("amount", total_gp.as_str()),
        ],
    )
    .await?;
    Ok(vec![Reply::text(line)])
}

async fn takegold(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let (member, coins) = amount(args)?;
    let target = member.clone();
    let taken = bot
        .store
        .update(Document::GoldData, move |gold: &mut GoldBook| gold.take(&target, coins))
        .await?;
    match taken {
        Err(GameError::InsufficientFunds { .. }) => {
            return Ok(vec![Reply::text("❌ Player does not have enough gold!")]);
        }
        other => {
            other?;
        }
    }
    warn!(
        target: "audit",
        "Admin {} took {} from {}",
        escape_log(&caller.user_id),
        coins,
        escape_log(&member)
    );
    let total_gp = (coins.total_cp() / 100).to_string();
    let line = say(
        bot,
        "takegold_success",
        &[
            ("user", caller.display_name.as_str()),
            ("target", mention(&member).as_str()),
            ("amount", total_gp.as_str()),
        ],
    )
    .await?;
    Ok(vec![Reply::text(line)])
}

async fn admin_givegold(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let (member, coins) = amount(args)?;
    let target = member.clone();
    bot.store
        .update(Document::GoldData, move |gold: &mut GoldBook| gold.grant(&target, coins))
        .await?;
    info!(
        target: "audit",
        "Admin {} granted {} to {}",
        escape_log(&caller.user_id),
        coins,
        escape_log(&member)
    );
    Ok(vec![Reply::text(format!(
        "✨ {} **rewarded** {} `{}`!",
        caller.mention(),
        mention(&member),
        coins.ledger()
    ))])
}

async fn shop(bot: &mut Bot, category: Option<&str>) -> Result<Vec<Reply>> {
    let shop: Shop = bot.store.load(Document::StanleyShop).await?;
    if shop.is_empty() {
        return Ok(vec![Reply::text("⚠️ No shop items available!")]);
    }
    let limit = bot.config.bot.message_limit;

    let Some(category) = category.filter(|c| !c.trim().is_empty()) else {
        let mut text = String::from("🛒 **Welcome to Stanley's Shop!**\n\n**🛍️ Available Categories:**");
        for key in shop.categories() {
            text.push_str(&format!("\n🔹 **{}** → `/shop {}`", display_category(key), key));
        }
        text.push_str("\n\n💡 *Try selecting a category from the autocomplete list!*");
        return Ok(paginate(&[text], limit).into_iter().map(Reply::text).collect());
    };

    let Some((key, items)) = shop.category(category) else {
        return Ok(vec![Reply::text(format!(
            "❌ **Error:** `{}` is not a valid category.",
            category.trim()
        ))]);
    };
    let mut lines = vec![format!("🛒 **{} Available Items:**", display_category(key))];
    lines.extend(items.iter().map(|(item, data)| {
        format!(
            "• **{}** - {} (Stock: {})",
            title(item),
            Coins::from_cp(data.price_cp),
            data.stock
        )
    }));
    lines.push(String::new());
    lines.push("_\"See something you like? Just `/buy item_name` and it's yours... for a price.\"_".to_string());
    Ok(paginate(&lines, limit).into_iter().map(Reply::text).collect())
}

async fn buy(bot: &mut Bot, caller: &Caller, item: &str) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let mut shop: Shop = batch.load(Document::StanleyShop).await?;
    let mut gold: GoldBook = batch.load(Document::GoldData).await?;
    let mut inventory: Inventories = batch.load(Document::PlayerInventories).await?;
    let mut audit: AuditLog = batch.load(Document::AuditLog).await?;

    let trade = match shop.buy(&caller.user_id, item, &mut gold, &mut inventory) {
        Ok(trade) => trade,
        Err(GameError::NotFound(_)) => {
            drop(batch);
            let line = say(bot, "buy_not_available", &[("item", item.trim())]).await?;
            return Ok(vec![Reply::text(line)]);
        }
        Err(GameError::OutOfStock(name)) => {
            drop(batch);
            let line = say(bot, "buy_no_stock", &[("item", name.as_str())]).await?;
            return Ok(vec![Reply::text(line)]);
        }
        Err(GameError::InsufficientFunds { .. }) => {
            return Ok(vec![Reply::text(format!(
                "❌ You don't have enough gold to buy `{}`.",
                item.trim()
            ))]);
        }
        Err(e) => return Err(e.into()),
    };
    audit.record(
        AuditEntry::new(&caller.display_name, "bought", &trade.item, gp(trade.price_cp)),
        bot.config.game.audit_cap,
    );
    batch.stage(Document::StanleyShop, &shop)?;
    batch.stage(Document::GoldData, &gold)?;
    batch.stage(Document::PlayerInventories, &inventory)?;
    batch.stage(Document::AuditLog, &audit)?;
    batch.commit().await?;

    let line = say(
        bot,
        "buy_success",
        &[("user", caller.display_name.as_str()), ("item", trade.item.as_str())],
    )
    .await?;
    Ok(vec![Reply::text(line)])
}

async fn sell(bot: &mut Bot, caller: &Caller, item: &str) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let mut inventory: Inventories = batch.load(Document::PlayerInventories).await?;
    if inventory.bag(&caller.user_id).map_or(true, |b| b.is_empty()) {
        return Ok(vec![Reply::text(format!(
            "❌ {}, you don't have anything to sell!",
            caller.mention()
        ))]);
    }
    let mut shop: Shop = batch.load(Document::StanleyShop).await?;
    let mut gold: GoldBook = batch.load(Document::GoldData).await?;
    let mut audit: AuditLog = batch.load(Document::AuditLog).await?;

    let user = caller.display_name.as_str();
    let trade = match shop.sell(&caller.user_id, item, &mut gold, &mut inventory) {
        Ok(trade) => trade,
        Err(GameError::InsufficientItems(_)) => {
            drop(batch);
            let line = say(bot, "sell_no_item", &[("user", user), ("item", item.trim())]).await?;
            return Ok(vec![Reply::text(line)]);
        }
        Err(GameError::NotFound(held)) => {
            drop(batch);
            let line = say(bot, "sell_not_shop_item", &[("user", user), ("item", held.as_str())]).await?;
            return Ok(vec![Reply::text(line)]);
        }
        Err(e) => return Err(e.into()),
    };
    audit.record(
        AuditEntry::new(user, "sold", &trade.item, gp(trade.price_cp)),
        bot.config.game.audit_cap,
    );
    batch.stage(Document::StanleyShop, &shop)?;
    batch.stage(Document::GoldData, &gold)?;
    batch.stage(Document::PlayerInventories, &inventory)?;
    batch.stage(Document::AuditLog, &audit)?;
    batch.commit().await?;

    let price = gp(trade.price_cp).to_string();
    let line = say(
        bot,
        "sell_success",
        &[("user", user), ("item", trade.item.as_str()), ("price_gp", price.as_str())],
    )
    .await?;
    Ok(vec![Reply::text(line)])
}

async fn request(bot: &mut Bot, caller: &Caller, item: &str) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let catalog: Catalog = batch.load(Document::RequestableItems).await?;
    let mut requests: Requests = batch.load(Document::Requests).await?;

    let name = match requests.request(&catalog, &caller.user_id, item) {
        Ok(name) => name,
        Err(GameError::NotFound(name)) => {
            return Ok(vec![Reply::text(format!(
                "❌ `{}` is not a requestable item.\n📜 **Stanley flips through his catalog.**\n\
                 _\"You can only request pre-approved items. Try `/requests_available` to see the list!\"_",
                name
            ))]);
        }
        Err(GameError::InvalidArgument(_)) => {
            return Ok(vec![Reply::text(format!(
                "📜 **Stanley sighs.**\n_\"You've already requested `{}`. Patience, adventurer!\"_",
                item.trim().to_lowercase()
            ))]);
        }
        Err(e) => return Err(e.into()),
    };
    batch.stage(Document::Requests, &requests)?;
    batch.commit().await?;
    Ok(vec![Reply::text(format!(
        "📜 **Stanley records your request.**\n_\"Give me some time, and I’ll see what I can do.\"_\n\
         Your request for `{}` has been added.",
        name
    ))])
}

async fn requests_available(bot: &mut Bot) -> Result<Vec<Reply>> {
    let catalog: Catalog = bot.store.load(Document::RequestableItems).await?;
    if catalog.is_empty() {
        return Ok(vec![Reply::text(
            "📜 **Stanley shrugs.**\n_\"Nothing is requestable at the moment!\"_",
        )]);
    }
    let mut lines = vec!["📜 **Items Available for Request:**".to_string()];
    for (category, items) in catalog.available() {
        let listed = items.iter().map(|i| format!("`{}`", i)).collect::<Vec<_>>().join(", ");
        lines.push(format!("**{}**: {}", display_category(category), listed));
    }
    Ok(paginate(&lines, bot.config.bot.message_limit.saturating_sub(2))
        .into_iter()
        .enumerate()
        .map(|(i, page)| if i == 0 { Reply::text(page) } else { Reply::text(format!("🔹 {}", page)) })
        .collect())
}

async fn all_requests(bot: &mut Bot) -> Result<Vec<Reply>> {
    let requests: Requests = bot.store.load(Document::Requests).await?;
    let pending = requests.pending();
    if pending.is_empty() {
        let line = say(bot, "requests_none", &[]).await?;
        return Ok(vec![Reply::text(line)]);
    }
    let mut lines = vec!["📜 **Pending Requests:**".to_string()];
    for (item, players) in pending {
        let who = players.iter().map(|p| mention(p)).collect::<Vec<_>>().join(", ");
        lines.push(format!("• **{}** → {}", title(item), who));
    }
    Ok(paginate(&lines, bot.config.bot.message_limit)
        .into_iter()
        .map(Reply::text)
        .collect())
}

async fn refresh_market(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let minimum = bot.config.game.default_restock;
    let changed = bot
        .store
        .update(Document::StanleyShop, move |shop: &mut Shop| shop.restock(minimum))
        .await?;
    info!(
        "Admin {} restocked the shop ({} items topped up)",
        escape_log(&caller.user_id),
        changed
    );
    Ok(vec![Reply::text("🔄 **Market refreshed!**")])
}

async fn request_add(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let item = args.text("item")?.to_string();
    let price = args.int_or("price_gp", -1)?;
    if price < 0 {
        return Err(GameError::InvalidArgument("price_gp must be zero or more".into()).into());
    }
    let rarity = args.text("rarity")?.to_string();
    let category = args.text("category")?.to_string();

    let name = item.clone();
    let added = bot
        .store
        .update(Document::RequestableItems, move |catalog: &mut Catalog| {
            catalog.add(&name, price as u64, &rarity, &category)
        })
        .await?;
    let category = match added {
        Ok(category) => category,
        Err(GameError::InvalidArgument(m)) if m.contains("already") => {
            return Ok(vec![Reply::text(format!(
                "⚠️ `{}` is already in the requestable items list.",
                item.trim().to_lowercase()
            ))]);
        }
        Err(e) => return Err(e.into()),
    };
    info!(
        "Admin {} listed {} as requestable",
        escape_log(&caller.user_id),
        escape_log(&item)
    );
    Ok(vec![Reply::text(format!(
        "✅ **{}** has been added to the **requestable items list** under `{}`!",
        capitalize(&item.trim().to_lowercase()),
        category
    ))])
}

async fn request_approve(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let item = args.text("item")?;
    let stock = args.int_or("stock", 1)?;
    if stock <= 0 {
        return Ok(vec![Reply::text(format!(
            "❌ Cannot approve `{}` with zero stock!",
            item.trim().to_lowercase()
        ))]);
    }
    let stock = u32::try_from(stock).map_err(|_| GameError::InvalidArgument("stock is too large".into()))?;

    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let catalog: Catalog = batch.load(Document::RequestableItems).await?;
    let mut requests: Requests = batch.load(Document::Requests).await?;
    let mut shop: Shop = batch.load(Document::StanleyShop).await?;
    requests.approve(&catalog, &mut shop, item, stock)?;
    batch.stage(Document::Requests, &requests)?;
    batch.stage(Document::StanleyShop, &shop)?;
    batch.commit().await?;

    info!(
        "Admin {} approved {} with stock {}",
        escape_log(&caller.user_id),
        escape_log(item),
        stock
    );
    Ok(vec![Reply::text(format!(
        "✅ **{}** has been approved and added to Stanley's shop with `{}` in stock!",
        capitalize(&item.trim().to_lowercase()),
        stock
    ))])
}

async fn audit_log(bot: &mut Bot, limit: i64) -> Result<Vec<Reply>> {
    let audit: AuditLog = bot.store.load(Document::AuditLog).await?;
    if audit.is_empty() {
        let line = say(bot, "audit_log_empty", &[]).await?;
        return Ok(vec![Reply::text(line)]);
    }
    let limit = usize::try_from(limit.max(1)).unwrap_or(1);
    let lines: Vec<String> = audit
        .recent(limit)
        .into_iter()
        .map(|e| {
            format!(
                "• `{}` - **{}** {} `{}` for `{} gp`",
                e.date(),
                e.user,
                e.action,
                e.item,
                e.price_gp
            )
        })
        .collect();
    Ok(lines
        .chunks(AUDIT_LINES_PER_MESSAGE)
        .enumerate()
        .map(|(i, chunk)| {
            let body = chunk.join("\n");
            if i == 0 {
                Reply::text(format!("📜 **Recent Transactions:**\n{}", body))
            } else {
                Reply::text(body)
            }
        })
        .collect())
}
