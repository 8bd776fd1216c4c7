//! Basil: herbalism, alchemy and the ingredient market.

use anyhow::Result;
use log::{info, warn};
use std::time::Instant;

use super::command::{help_embed, mention, opt, req, Args, Caller, CommandSpec};
use super::reply::{split_text, Embed, Reply};
use super::{now_secs, Bot, PendingCraft};
use crate::game::alchemy::{
    self, basil_session, CraftOutcome, CraftedStock, EnhancedBook, RecipeBook, SessionReport, MAX_SESSION_DAYS,
};
use crate::game::clock::{Cooldowns, InGameTime};
use crate::game::errors::{GameError, GameResult};
use crate::game::gold::GoldBook;
use crate::game::herbalism::{find_ingredient, Herbalist, IngredientTable, TerrainTables};
use crate::game::inventory::Inventories;
use crate::game::market::{quote, Market};
use crate::game::responses::ResponseBook;
use crate::game::stats::{check_range, stats_for, PlayerStats, StatsTable, MODIFIER_RANGE, PROFICIENCY_RANGE};
use crate::logutil::escape_log;
use crate::storage::{Batch, Document};

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "basil_help",
        description: "Displays Basil's available commands.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "alchemy",
        description: "Provides alchemy-related help and lists available recipes.",
        admin_only: false,
        params: &[opt("recipe")],
    },
    CommandSpec {
        name: "craft_item",
        description: "Attempt to craft a potion or poison.",
        admin_only: false,
        params: &[req("recipe")],
    },
    CommandSpec {
        name: "confirm",
        description: "Confirm your pending crafting attempt.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "cancel",
        description: "Cancel your pending crafting attempt.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "craftable",
        description: "Check which potions and poisons you can craft based on your ingredients.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "gather",
        description: "Gather herbs based on terrain type.",
        admin_only: false,
        params: &[opt("terrain")],
    },
    CommandSpec {
        name: "identify",
        description: "Identify an unknown herb with an Herbalism check.",
        admin_only: false,
        params: &[req("ingredient")],
    },
    CommandSpec {
        name: "inventory",
        description: "View your inventory.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "market",
        description: "View available ingredients for purchase.",
        admin_only: false,
        params: &[],
    },
    CommandSpec {
        name: "quote",
        description: "Get the current price for selling an ingredient.",
        admin_only: false,
        params: &[req("ingredient")],
    },
    CommandSpec {
        name: "buy",
        description: "Purchase an ingredient from the market.",
        admin_only: false,
        params: &[req("ingredient")],
    },
    CommandSpec {
        name: "sell",
        description: "Sell an ingredient.",
        admin_only: false,
        params: &[req("ingredient")],
    },
    CommandSpec {
        name: "set_basil_stats",
        description: "Set your intelligence, wisdom, proficiency bonus, and tool proficiencies.",
        admin_only: false,
        params: &[
            req("intelligence"),
            req("wisdom"),
            req("proficiency"),
            req("proficient"),
            req("herbalism_kit"),
            req("alchemist_tools"),
            opt("charisma"),
            opt("persuasion"),
        ],
    },
    CommandSpec {
        name: "add_item",
        description: "(Admin) Adds an item to a player's inventory.",
        admin_only: true,
        params: &[req("member"), req("item"), req("quantity")],
    },
    CommandSpec {
        name: "remove_item",
        description: "(Admin) Removes an item from a player's inventory.",
        admin_only: true,
        params: &[req("member"), req("item"), req("quantity")],
    },
    CommandSpec {
        name: "advance_time",
        description: "(Admin) Advances in-game time by a set number of hours.",
        admin_only: true,
        params: &[req("hours")],
    },
    CommandSpec {
        name: "basil_crafting",
        description: "(Admin) Simulate Basil crafting potions for a set number of in-game days.",
        admin_only: true,
        params: &[req("days")],
    },
    CommandSpec {
        name: "reset_market",
        description: "(Admin) Reset and regenerate the market inventory.",
        admin_only: true,
        params: &[],
    },
    CommandSpec {
        name: "reset_inventory",
        description: "(Admin) Reset a player's inventory, or everyone's.",
        admin_only: true,
        params: &[opt("member")],
    },
    CommandSpec {
        name: "open_shop",
        description: "(Admin) Resets and prepares Basil's shop.",
        admin_only: true,
        params: &[],
    },
];

pub(crate) async fn dispatch(bot: &mut Bot, caller: &Caller, command: &str, args: &Args) -> Result<Vec<Reply>> {
    match command {
        "basil_help" => Ok(vec![Reply::embed(help_embed(
            "📜 Basil's Commands",
            COMMANDS,
            bot.config.bot.embed_field_limit,
        ))]),
        "alchemy" => alchemy_guide(bot, args.get("recipe")).await,
        "craft_item" => craft_item(bot, caller, args.text("recipe")?).await,
        "confirm" => confirm(bot, caller).await,
        "cancel" => Ok(vec![cancel(bot, caller)]),
        "craftable" => craftable(bot, caller).await,
        "gather" => gather(bot, caller, args.get("terrain")).await,
        "identify" => identify(bot, caller, args.text("ingredient")?).await,
        "inventory" => inventory(bot, caller).await,
        "market" => market(bot).await,
        "quote" => quote_price(bot, caller, args.text("ingredient")?).await,
        "buy" => buy(bot, caller, args.text("ingredient")?).await,
        "sell" => sell(bot, caller, args.text("ingredient")?).await,
        "set_basil_stats" => set_stats(bot, caller, args).await,
        "add_item" => add_item(bot, caller, args).await,
        "remove_item" => remove_item(bot, caller, args).await,
        "advance_time" => advance_time(bot, caller, args.int_or("hours", 0)?).await,
        "basil_crafting" => basil_crafting(bot, caller, args.int_or("days", 0)?).await,
        "reset_market" => reset_market(bot, caller).await,
        "reset_inventory" => reset_inventory(bot, caller, args.member("member")?).await,
        "open_shop" => open_shop(bot, caller).await,
        other => {
            warn!("Basil has no handler for /{}", other);
            Ok(vec![Reply::private(format!("❌ `/{}` is not one of Basil's commands.", other))])
        }
    }
}

/// The market, regenerated and staged when it has gone stale.
async fn current_market(bot: &mut Bot, batch: &mut Batch<'_>, ingredients: &IngredientTable) -> GameResult<Market> {
    let mut market: Market = batch.load(Document::Market).await?;
    let refresh_days = bot.config.game.market_refresh_days;
    if market.refresh_if_stale(ingredients, now_secs(), refresh_days, &mut *bot.roller) {
        batch.stage(Document::Market, &market)?;
    }
    Ok(market)
}

async fn alchemy_guide(bot: &mut Bot, recipe: Option<&str>) -> Result<Vec<Reply>> {
    let recipes: RecipeBook = bot.store.load(Document::Recipes).await?;
    if let Some(name) = recipe.filter(|r| !r.trim().is_empty()) {
        return match alchemy::recipe_card(&recipes, name) {
            Some(card) => Ok(vec![Reply::text(card)]),
            None => Ok(vec![Reply::text("❌ That recipe does not exist.")]),
        };
    }
    let names = alchemy::recipe_names(&recipes);
    let listing = if names.is_empty() {
        "No recipes found!".to_string()
    } else {
        names.join(", ")
    };
    let embed = Embed::new("Alchemy Guide")
        .field(
            "How to Craft",
            "Use `/craft_item recipe` when you hold every ingredient, then `/confirm`.",
        )
        .field("View Recipes", "Use `/alchemy [recipe]` to view specific recipes.")
        .split_field("Available Recipes", &listing, bot.config.bot.embed_field_limit);
    Ok(vec![Reply::embed(embed)])
}

async fn craft_item(bot: &mut Bot, caller: &Caller, recipe: &str) -> Result<Vec<Reply>> {
    let recipes: RecipeBook = bot.store.load(Document::Recipes).await?;
    let inventory: Inventories = bot.store.load(Document::PlayerInventories).await?;
    let Some((name, data)) = alchemy::find_recipe(&recipes, recipe) else {
        return Ok(vec![Reply::text("❌ That recipe does not exist!")]);
    };
    if !inventory.has_ingredients(&caller.user_id, &data.base, &data.modifiers) {
        return Ok(vec![Reply::text("❌ You lack the required ingredients.")]);
    }
    bot.pending.insert(
        caller.user_id.clone(),
        PendingCraft {
            recipe: name.to_string(),
            created_at: Instant::now(),
        },
    );
    info!("{} is deciding whether to craft {}", escape_log(&caller.user_id), name);
    Ok(vec![Reply::private(format!(
        "🛠️ Do you want to craft **{}**?\nUse `/confirm` or `/cancel` within {} seconds.",
        name, bot.config.game.confirm_timeout_secs
    ))])
}

async fn confirm(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let Some(pending) = bot.pending.remove(&caller.user_id) else {
        return Ok(vec![Reply::private("❌ You have no crafting attempt waiting for confirmation.")]);
    };
    if pending.created_at.elapsed() >= bot.confirm_timeout() {
        info!("Crafting confirmation for {} expired", escape_log(&caller.user_id));
        return Ok(vec![Reply::private(
            "⌛ Your crafting confirmation expired. Use `/craft_item` to try again.",
        )]);
    }

    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let recipes: RecipeBook = batch.load(Document::Recipes).await?;
    let enhanced: EnhancedBook = batch.load(Document::EnhancedRecipes).await?;
    let stats: StatsTable = batch.load(Document::PlayerStats).await?;
    let mut inventory: Inventories = batch.load(Document::PlayerInventories).await?;

    let report = alchemy::craft(
        &caller.user_id,
        &pending.recipe,
        &recipes,
        &enhanced,
        &stats_for(&stats, &caller.user_id),
        bot.config.game.tool_bonus,
        &mut inventory,
        &mut *bot.roller,
    )?;
    batch.stage(Document::PlayerInventories, &inventory)?;
    batch.commit().await?;

    let recipe = &report.recipe;
    let line = match &report.outcome {
        CraftOutcome::CriticalFailure { bad_brew } => format!(
            "💀 **Critical Failure!** You messed up and created **{}** instead of {}!",
            bad_brew, recipe
        ),
        CraftOutcome::Failure => "❌ **Crafting Failed!** The potion failed to form correctly.".to_string(),
        CraftOutcome::Success { item, .. } => format!("✅ **Crafting Success!** You crafted **{}** successfully.", item),
        CraftOutcome::CriticalSuccess {
            item,
            enhancement: Some(effect),
            ..
        } => format!("🌟 **Critical Success!** You crafted **{}**! 🎉\n\n**Effect:** {}", item, effect),
        CraftOutcome::CriticalSuccess { item, .. } => format!(
            "🌟 **Critical Success!** You crafted **{}** with extra precision and gained an additional dose!",
            item
        ),
    };
    let roll = format!(
        "🎲 Rolled {} + {} = {} vs DC {}",
        report.check.roll,
        report.check.modifiers.total(),
        report.check.total(),
        report.check.dc
    );
    Ok(vec![Reply::text(format!("{}\n{}", line, roll))])
}

fn cancel(bot: &mut Bot, caller: &Caller) -> Reply {
    match bot.pending.remove(&caller.user_id) {
        Some(p) => {
            info!("{} cancelled crafting {}", escape_log(&caller.user_id), p.recipe);
            Reply::private("❌ Crafting cancelled.")
        }
        None => Reply::private("❌ You have no crafting attempt waiting for confirmation."),
    }
}

async fn craftable(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let recipes: RecipeBook = bot.store.load(Document::Recipes).await?;
    let inventory: Inventories = bot.store.load(Document::PlayerInventories).await?;
    if inventory.bag(&caller.user_id).map_or(true, |b| b.is_empty()) {
        return Ok(vec![Reply::text("❌ Your inventory is empty! Gather some ingredients first.")]);
    }
    let names = alchemy::craftable(&recipes, &inventory, &caller.user_id);
    if names.is_empty() {
        return Ok(vec![Reply::text(
            "🧪 You don’t have enough ingredients to craft any potions or poisons yet.",
        )]);
    }
    let list = names.iter().map(|r| format!("• **{}**", r)).collect::<Vec<_>>().join("\n");
    let embed = Embed::new("🧪 Craftable Potions & Poisons").split_field(
        "You can craft:",
        &list,
        bot.config.bot.embed_field_limit,
    );
    Ok(vec![Reply::embed(embed)])
}

async fn gather(bot: &mut Bot, caller: &Caller, terrain: Option<&str>) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let terrains: TerrainTables = batch.load(Document::TerrainTables).await?;

    let Some(terrain) = terrain.filter(|t| !t.trim().is_empty()) else {
        if terrains.is_empty() {
            return Err(GameError::NotFound(
                "no terrain data found; an admin should update `terrain_tables.json`".into(),
            )
            .into());
        }
        let mut lines = vec!["🌍 **Select a terrain to gather herbs from:**".to_string()];
        lines.extend(terrains.keys().map(|t| format!("• {}", t)));
        lines.push("Use `/gather terrain:<name>` to search.".to_string());
        return Ok(vec![Reply::private(lines.join("\n"))]);
    };

    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let stats: StatsTable = batch.load(Document::PlayerStats).await?;
    let responses: ResponseBook = batch.load(Document::BasilResponses).await?;
    let clock: InGameTime = batch.load(Document::InGameTime).await?;
    let mut cooldowns: Cooldowns = batch.load(Document::PlayerCooldowns).await?;
    let mut inventory: Inventories = batch.load(Document::PlayerInventories).await?;

    let herbalist = Herbalist {
        ingredients: &ingredients,
        terrains: &terrains,
        tool_bonus: bot.config.game.tool_bonus,
    };
    let attempts = bot.config.game.gather_attempts_per_day;
    let report = herbalist.gather(
        &caller.user_id,
        terrain,
        &stats_for(&stats, &caller.user_id),
        cooldowns.entry(&caller.user_id, attempts),
        &mut inventory,
        clock.total_hours(),
        &mut *bot.roller,
    )?;
    batch.stage(Document::PlayerCooldowns, &cooldowns)?;
    batch.stage(Document::PlayerInventories, &inventory)?;
    batch.commit().await?;

    let headline = match &report.found {
        Some(found) => format!(
            "🌿 You gathered **{}x {}** ({}).",
            found.quantity, found.ingredient, found.rarity
        ),
        None => responses.pick_or(
            "gather_nothing",
            &[("user", caller.display_name.as_str()), ("terrain", report.terrain.as_str())],
            &mut *bot.roller,
            "You searched but found nothing useful.",
        ),
    };
    Ok(vec![Reply::text(format!(
        "{}\n🎲 Rolled {} + {} = {} in the {} · {} gathering attempts left",
        headline,
        report.roll,
        report.modifiers.total(),
        report.total(),
        report.terrain,
        report.attempts_left
    ))])
}

async fn identify(bot: &mut Bot, caller: &Caller, ingredient: &str) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let terrains: TerrainTables = batch.load(Document::TerrainTables).await?;
    let stats: StatsTable = batch.load(Document::PlayerStats).await?;
    let clock: InGameTime = batch.load(Document::InGameTime).await?;
    let mut cooldowns: Cooldowns = batch.load(Document::PlayerCooldowns).await?;
    let mut inventory: Inventories = batch.load(Document::PlayerInventories).await?;

    let herbalist = Herbalist {
        ingredients: &ingredients,
        terrains: &terrains,
        tool_bonus: bot.config.game.tool_bonus,
    };
    let attempts = bot.config.game.gather_attempts_per_day;
    let report = herbalist.identify(
        &caller.user_id,
        ingredient,
        &stats_for(&stats, &caller.user_id),
        cooldowns.entry(&caller.user_id, attempts),
        &mut inventory,
        clock.days,
        &mut *bot.roller,
    )?;
    batch.stage(Document::PlayerCooldowns, &cooldowns)?;
    batch.stage(Document::PlayerInventories, &inventory)?;
    batch.commit().await?;

    let line = if report.success() {
        format!("✅ Success! You identify **{}**: {}", report.ingredient, report.effect)
    } else {
        "❌ You failed to identify the herb. Try again later!".to_string()
    };
    Ok(vec![Reply::text(line)])
}

async fn inventory(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let inventory: Inventories = bot.store.load(Document::PlayerInventories).await?;
    let Some(bag) = inventory.bag(&caller.user_id).filter(|b| !b.is_empty()) else {
        return Ok(vec![Reply::text("Your inventory is empty.")]);
    };
    let listing = bag
        .iter()
        .map(|(item, qty)| format!("**{}**: {}", item, qty))
        .collect::<Vec<_>>()
        .join("\n");
    let pages = split_text(&listing, bot.config.bot.message_limit);
    let total = pages.len();
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| {
            let title = if total == 1 {
                format!("{}'s Inventory", caller.display_name)
            } else {
                format!("{}'s Inventory (Page {}/{})", caller.display_name, i + 1, total)
            };
            Reply::embed(Embed::new(title).description(page))
        })
        .collect())
}

async fn market(bot: &mut Bot) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let market = current_market(bot, &mut batch, &ingredients).await?;
    batch.commit().await?;

    if market.items.is_empty() {
        return Ok(vec![Reply::text("🛒 The market is empty. Check back later!")]);
    }
    let listing = market
        .items
        .iter()
        .map(|(item, entry)| {
            let stock = if entry.stock > 0 {
                entry.stock.to_string()
            } else {
                "❌ Out of Stock".to_string()
            };
            let rarity = ingredients.get(item).map(|i| i.rarity.as_str()).unwrap_or("Common");
            format!("**{}** (Stock: {}) - {} - `{} gp`", item, stock, rarity, entry.base_price)
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(split_text(&listing, bot.config.bot.message_limit)
        .into_iter()
        .map(|page| Reply::embed(Embed::new("🛒 Market Inventory").description(page)))
        .collect())
}

async fn quote_price(bot: &mut Bot, caller: &Caller, ingredient: &str) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let stats: StatsTable = batch.load(Document::PlayerStats).await?;
    let market = current_market(bot, &mut batch, &ingredients).await?;
    batch.commit().await?;

    let name = market
        .find_name(ingredient)
        .or_else(|| find_ingredient(&ingredients, ingredient).map(|(n, _)| n.to_string()))
        .unwrap_or_else(|| ingredient.trim().to_string());
    let price = quote(market.base_price(&name, &ingredients), &stats_for(&stats, &caller.user_id));
    Ok(vec![Reply::text(format!(
        "💰 Current selling price for **{}**: `{} gp`.",
        name, price
    ))])
}

async fn buy(bot: &mut Bot, caller: &Caller, ingredient: &str) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let mut market = current_market(bot, &mut batch, &ingredients).await?;
    let mut gold: GoldBook = batch.load(Document::GoldData).await?;
    let mut inventory: Inventories = batch.load(Document::PlayerInventories).await?;

    let bought = market.buy(&caller.user_id, ingredient, &mut gold, &mut inventory);
    let (name, price) = match bought {
        Ok(v) => v,
        Err(e) => {
            // A stale market may have been regenerated above; keep it.
            batch.commit().await?;
            return Err(e.into());
        }
    };
    batch.stage(Document::Market, &market)?;
    batch.stage(Document::GoldData, &gold)?;
    batch.stage(Document::PlayerInventories, &inventory)?;
    batch.commit().await?;
    Ok(vec![Reply::text(format!("✅ You purchased **{}** for `{} gp`!", name, price))])
}

async fn sell(bot: &mut Bot, caller: &Caller, ingredient: &str) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let stats: StatsTable = batch.load(Document::PlayerStats).await?;
    let mut market = current_market(bot, &mut batch, &ingredients).await?;
    let mut gold: GoldBook = batch.load(Document::GoldData).await?;
    let mut inventory: Inventories = batch.load(Document::PlayerInventories).await?;

    let sold = market.sell(
        &caller.user_id,
        ingredient,
        &stats_for(&stats, &caller.user_id),
        &ingredients,
        &mut gold,
        &mut inventory,
    );
    let (name, price) = match sold {
        Ok(v) => v,
        Err(e) => {
            batch.commit().await?;
            return Err(e.into());
        }
    };
    batch.stage(Document::Market, &market)?;
    batch.stage(Document::GoldData, &gold)?;
    batch.stage(Document::PlayerInventories, &inventory)?;
    batch.commit().await?;
    Ok(vec![Reply::text(format!("💰 You sold **{}** for `{} gp`.", name, price))])
}

async fn set_stats(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let required_int = |name: &str| -> GameResult<i64> {
        args.int(name)?
            .ok_or_else(|| GameError::InvalidArgument(format!("`{}` is required", name)))
    };
    let required_flag = |name: &str| -> GameResult<bool> {
        args.flag(name)?
            .ok_or_else(|| GameError::InvalidArgument(format!("`{}` is required", name)))
    };
    let intelligence = check_range("intelligence", required_int("intelligence")?, MODIFIER_RANGE)?;
    let wisdom = check_range("wisdom", required_int("wisdom")?, MODIFIER_RANGE)?;
    let proficiency = check_range("proficiency", required_int("proficiency")?, PROFICIENCY_RANGE)?;
    let proficient = required_flag("proficient")?;
    let herbalism_kit = required_flag("herbalism_kit")?;
    let alchemist_tools = required_flag("alchemist_tools")?;
    let charisma = args
        .int("charisma")?
        .map(|c| check_range("charisma", c, MODIFIER_RANGE))
        .transpose()?;
    let persuasion = args.flag("persuasion")?;

    let player = caller.user_id.clone();
    let stats = bot
        .store
        .update(Document::PlayerStats, move |table: &mut StatsTable| {
            let entry = table.entry(player).or_insert_with(PlayerStats::default);
            entry.intelligence_mod = intelligence;
            entry.wisdom_mod = wisdom;
            entry.proficiency_bonus = proficiency;
            entry.proficient = proficient;
            entry.herbalism_kit = herbalism_kit;
            entry.alchemist_tools = alchemist_tools;
            if let Some(c) = charisma {
                entry.charisma_mod = c;
            }
            if let Some(p) = persuasion {
                entry.proficient_persuasion = p;
            }
            entry.clone()
        })
        .await?;
    info!("{} updated their stats", escape_log(&caller.user_id));

    Ok(vec![Reply::text(format!(
        "✅ **Stats updated!**\n\
         📜 **Intelligence Modifier:** `{}`\n\
         🧠 **Wisdom Modifier:** `{}`\n\
         🎖️ **Proficiency Bonus:** `{}`\n\
         🔬 **Proficient in Herbalism & Alchemy:** `{}`\n\
         🌿 **Herbalism Kit Proficiency:** `{}`\n\
         ⚗️ **Alchemist Tools Proficiency:** `{}`\n\
         🗣️ **Charisma Modifier:** `{}`\n\
         🤝 **Persuasion Proficiency:** `{}`",
        stats.intelligence_mod,
        stats.wisdom_mod,
        stats.proficiency_bonus,
        stats.proficient,
        stats.herbalism_kit,
        stats.alchemist_tools,
        stats.charisma_mod,
        stats.proficient_persuasion
    ))])
}

/// Member, item and a positive quantity for the admin inventory commands.
fn item_args(args: &Args) -> GameResult<(String, String, u32)> {
    let member = args
        .member("member")?
        .ok_or_else(|| GameError::InvalidArgument("`member` is required".into()))?;
    let item = args.text("item")?.trim().to_string();
    let quantity = args.int_or("quantity", 0)?;
    if quantity <= 0 {
        return Err(GameError::InvalidArgument("quantity must be greater than **zero**".into()));
    }
    let quantity = u32::try_from(quantity)
        .map_err(|_| GameError::InvalidArgument("quantity is too large".into()))?;
    Ok((member, item, quantity))
}

async fn add_item(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let (member, item, quantity) = item_args(args)?;
    let (target, name) = (member.clone(), item.clone());
    bot.store
        .update(Document::PlayerInventories, move |inv: &mut Inventories| {
            inv.add(&target, &name, quantity);
        })
        .await?;
    info!(
        "Admin {} added {}x {} to {}",
        escape_log(&caller.user_id),
        quantity,
        escape_log(&item),
        escape_log(&member)
    );
    Ok(vec![Reply::text(format!(
        "Added {}x {} to {}'s inventory.",
        quantity,
        item,
        mention(&member)
    ))])
}

async fn remove_item(bot: &mut Bot, caller: &Caller, args: &Args) -> Result<Vec<Reply>> {
    let (member, item, quantity) = item_args(args)?;
    let (target, wanted) = (member.clone(), item.clone());
    let removed = bot
        .store
        .update(Document::PlayerInventories, move |inv: &mut Inventories| {
            match inv.find_name(&target, &wanted) {
                Some(name) if inv.quantity(&target, &name) >= quantity => {
                    inv.remove(&target, &name, quantity);
                    true
                }
                _ => false,
            }
        })
        .await?;
    if !removed {
        return Ok(vec![Reply::text(format!(
            "❌ {} does not have `{}x {}` to remove.",
            mention(&member),
            quantity,
            item
        ))]);
    }
    info!(
        "Admin {} removed {}x {} from {}",
        escape_log(&caller.user_id),
        quantity,
        escape_log(&item),
        escape_log(&member)
    );
    Ok(vec![Reply::text(format!(
        "✅ **Removed** `{}x {}` from {}'s inventory.",
        quantity,
        item,
        mention(&member)
    ))])
}

/// Basil's brewing run over `days`, drawing on his market stock.
async fn run_session(bot: &mut Bot, batch: &mut Batch<'_>, days: u32) -> GameResult<SessionReport> {
    let recipes: RecipeBook = batch.load(Document::Recipes).await?;
    let enhanced: EnhancedBook = batch.load(Document::EnhancedRecipes).await?;
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let mut market = current_market(bot, batch, &ingredients).await?;
    let mut crafted: CraftedStock = batch.load(Document::CraftedItems).await?;
    let report = basil_session(
        days,
        &recipes,
        &enhanced,
        bot.config.game.basil_craft_bonus,
        &mut market,
        &mut crafted,
        &mut *bot.roller,
    );
    batch.stage(Document::Market, &market)?;
    batch.stage(Document::CraftedItems, &crafted)?;
    Ok(report)
}

fn session_lines(report: &SessionReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.crafted.is_empty() {
        lines.push("**🧪 Basil has crafted:**".to_string());
        for c in &report.crafted {
            match &c.effect {
                Some(effect) => lines.push(format!("• **{}** x{} ({})", c.item, c.quantity, effect)),
                None => lines.push(format!("• **{}** x{}", c.item, c.quantity)),
            }
        }
    }
    if !report.failures.is_empty() {
        lines.push("**⚠️ Basil had some critical failures:**".to_string());
        lines.extend(report.failures.iter().map(|f| format!("• **{}** (Toxic Failure!)", f)));
    }
    if report.crafted.is_empty() && report.failures.is_empty() {
        lines.push("🔬 Basil worked hard but didn't successfully finish any potions this time.".to_string());
    }
    lines
}

async fn advance_time(bot: &mut Bot, caller: &Caller, hours: i64) -> Result<Vec<Reply>> {
    if hours <= 0 {
        return Err(GameError::InvalidArgument("hours must be a positive number".into()).into());
    }
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let mut clock: InGameTime = batch.load(Document::InGameTime).await?;
    let days = clock.advance(hours as u64);
    batch.stage(Document::InGameTime, &clock)?;

    let mut text = format!(
        "🕰️ **Time Advanced!**\n⏳ In-game time: `{} hours, {} days`",
        clock.hours, clock.days
    );
    if days > 0 {
        let mut cooldowns: Cooldowns = batch.load(Document::PlayerCooldowns).await?;
        let players = cooldowns.reset_gather_attempts(bot.config.game.gather_attempts_per_day);
        batch.stage(Document::PlayerCooldowns, &cooldowns)?;
        info!("New day: refilled gather attempts for {} players", players);

        let days = u32::try_from(days).unwrap_or(u32::MAX).min(MAX_SESSION_DAYS);
        let report = run_session(bot, &mut batch, days).await?;
        text.push_str("\n\n");
        text.push_str(&session_lines(&report).join("\n"));
    }
    batch.commit().await?;
    info!(
        "Admin {} advanced time by {} hours; now {}h, {}d",
        escape_log(&caller.user_id),
        hours,
        clock.hours,
        clock.days
    );
    Ok(split_text(&text, bot.config.bot.message_limit)
        .into_iter()
        .map(Reply::text)
        .collect())
}

async fn basil_crafting(bot: &mut Bot, caller: &Caller, days: i64) -> Result<Vec<Reply>> {
    if days < 1 {
        return Err(GameError::InvalidArgument("days must be at least 1".into()).into());
    }
    let days = u32::try_from(days)
        .ok()
        .filter(|d| *d <= MAX_SESSION_DAYS)
        .ok_or_else(|| GameError::InvalidArgument(format!("days must be at most {}", MAX_SESSION_DAYS)))?;
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let report = run_session(bot, &mut batch, days).await?;
    batch.commit().await?;
    info!(
        "Admin {} ran Basil's crafting for {} days ({} attempts, {} skipped)",
        escape_log(&caller.user_id),
        days,
        report.attempts,
        report.skipped
    );

    let mut lines = vec![format!("🔬 **Basil crafted for {} in-game days.**", days)];
    lines.extend(session_lines(&report));
    Ok(split_text(&lines.join("\n"), bot.config.bot.message_limit)
        .into_iter()
        .map(Reply::text)
        .collect())
}

async fn reset_market(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let market = Market::generate(&ingredients, now_secs(), &mut *bot.roller);
    batch.stage(Document::Market, &market)?;
    batch.commit().await?;
    warn!("Admin {} reset the market", escape_log(&caller.user_id));
    Ok(vec![Reply::text("✅ The market has been **refreshed** with new items!")])
}

async fn reset_inventory(bot: &mut Bot, caller: &Caller, member: Option<String>) -> Result<Vec<Reply>> {
    match member {
        Some(member) => {
            let target = member.clone();
            bot.store
                .update(Document::PlayerInventories, move |inv: &mut Inventories| inv.clear(&target))
                .await?;
            info!(
                "Admin {} reset {}'s inventory",
                escape_log(&caller.user_id),
                escape_log(&member)
            );
            Ok(vec![Reply::text(format!("✅ {}'s inventory has been reset!", mention(&member)))])
        }
        None => {
            let cleared = bot
                .store
                .update(Document::PlayerInventories, |inv: &mut Inventories| {
                    let players = inv.players();
                    for p in &players {
                        inv.clear(p);
                    }
                    players.len()
                })
                .await?;
            warn!(
                "Admin {} reset ALL player inventories ({} players)",
                escape_log(&caller.user_id),
                cleared
            );
            Ok(vec![Reply::text("✅ **All** player inventories have been reset!")])
        }
    }
}

async fn open_shop(bot: &mut Bot, caller: &Caller) -> Result<Vec<Reply>> {
    let store = bot.store.clone();
    let mut batch = store.batch().await?;
    for doc in [
        Document::Recipes,
        Document::EnhancedRecipes,
        Document::Ingredients,
        Document::TerrainTables,
    ] {
        batch.reset(doc).await?;
    }
    let ingredients: IngredientTable = batch.load(Document::Ingredients).await?;
    let recipes: RecipeBook = batch.load(Document::Recipes).await?;
    let mut market = Market::generate(&ingredients, now_secs(), &mut *bot.roller);
    let mut crafted: CraftedStock = batch.load(Document::CraftedItems).await?;
    let shelved = market.shelve_crafted(&mut crafted, bot.config.game.crafted_potion_price_gp);
    batch.stage(Document::Market, &market)?;
    batch.stage(Document::CraftedItems, &crafted)?;
    batch.commit().await?;
    info!("Admin {} reset Basil's shop inventory", escape_log(&caller.user_id));

    Ok(vec![Reply::text(format!(
        "🔄 Reset {} recipes and {} ingredients from defaults.\n\
         🛒 Market stocked with {} items, including {} of Basil's own brews.\n\
         ✅ **Basil's shop has been fully reset and stocked with new items!**",
        recipes.len(),
        ingredients.len(),
        market.items.len(),
        shelved
    ))])
}
