//! Stanley end to end: gold, the shop, requests and the audit log.

mod common;

use common::{admin, player, text, Fixture};
use tavernkeep::bot::{Caller, Persona, ADMIN_ONLY_LINE};
use tavernkeep::storage::Document;

fn brom() -> Caller {
    Caller::new("2", "Brom")
}

#[tokio::test]
async fn ping_and_help() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);

    assert_eq!(text(&bot.handle(&player(), "/ping").await), "🏓 Pong!");

    let help = text(&bot.handle(&player(), "/stanley_help").await);
    assert!(help.starts_with("== 📜 Stanley's Commands =="), "{}", help);
    assert!(help.contains("**/givegold** - Give gold to another player."), "{}", help);
    assert!(help.contains("Admin Commands"), "{}", help);
    assert!(help.contains("**/audit_log**"), "{}", help);
}

#[tokio::test]
async fn givegold_moves_coins_between_players() {
    let fx = Fixture::new();
    fx.write(Document::GoldData, r#"{"1": {"gp": 10, "sp": 0, "cp": 0}}"#);
    let mut bot = fx.bot(Persona::Stanley, []);

    let out = text(&bot.handle(&player(), "/givegold <@2> 3").await);
    assert!(out.contains("`3 gp`"), "{}", out);
    assert!(out.contains("<@2>"), "{}", out);

    let gold = fx.read(Document::GoldData);
    assert_eq!(gold["1"]["gp"], 7);
    assert_eq!(gold["2"]["gp"], 3);

    let balance = text(&bot.handle(&brom(), "/balance").await);
    assert_eq!(balance, "💰 Your balance: `3 gp, 0 sp, 0 cp`.");
}

#[tokio::test]
async fn givegold_refusals_leave_balances_alone() {
    let fx = Fixture::new();
    fx.write(Document::GoldData, r#"{"1": {"gp": 2, "sp": 0, "cp": 0}}"#);
    let mut bot = fx.bot(Persona::Stanley, []);

    assert_eq!(
        text(&bot.handle(&player(), "/givegold <@2> 50").await),
        "❌ You don't have enough gold!"
    );
    assert_eq!(
        text(&bot.handle(&player(), "/givegold <@1> 1").await),
        "❌ You can't give gold to yourself."
    );
    assert_eq!(
        text(&bot.handle(&player(), "/givegold <@2>").await),
        "❌ You must specify an amount of gold."
    );
    let gold = fx.read(Document::GoldData);
    assert_eq!(gold["1"]["gp"], 2);
    assert!(gold.get("2").is_none(), "{}", gold);
}

#[tokio::test]
async fn admins_grant_and_take_gold() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);

    let out = text(&bot.handle(&admin(), "/admin_givegold <@2> gp:5 sp:3").await);
    assert_eq!(out, "✨ <@900> **rewarded** <@2> `5 gp, 3 sp, 0 cp`!");

    let out = text(&bot.handle(&admin(), "/takegold <@2> 2").await);
    assert!(out.contains("`2 gp`"), "{}", out);
    let gold = fx.read(Document::GoldData);
    assert_eq!(gold["2"]["gp"], 3);
    assert_eq!(gold["2"]["sp"], 3);

    assert_eq!(
        text(&bot.handle(&admin(), "/takegold <@2> 100").await),
        "❌ Player does not have enough gold!"
    );

    let refused = bot.handle(&player(), "/takegold <@2> 1").await;
    assert!(refused[0].ephemeral);
    assert_eq!(refused[0].content, ADMIN_ONLY_LINE);
}

#[tokio::test]
async fn shop_lists_categories_and_items() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);

    let out = text(&bot.handle(&player(), "/shop").await);
    assert!(out.starts_with("🛒 **Welcome to Stanley's Shop!**"), "{}", out);
    assert!(out.contains("🔹 **Adventuring Gear** → `/shop adventuring_gear`"), "{}", out);

    let out = text(&bot.handle(&player(), "/shop weapons").await);
    assert!(out.starts_with("🛒 **Weapons Available Items:**"), "{}", out);
    assert!(out.contains("• **Dagger** - 2 gp (Stock: 6)"), "{}", out);

    let out = text(&bot.handle(&player(), "/shop Adventuring Gear").await);
    assert!(out.contains("• **Rope (50 Feet)** - 1 gp (Stock: 5)"), "{}", out);

    assert_eq!(
        text(&bot.handle(&player(), "/shop potions").await),
        "❌ **Error:** `potions` is not a valid category."
    );
}

#[tokio::test]
async fn buying_and_selling_are_audited() {
    let fx = Fixture::new();
    fx.write(Document::GoldData, r#"{"1": {"gp": 10, "sp": 0, "cp": 0}}"#);
    let mut bot = fx.bot(Persona::Stanley, []);

    let empty = text(&bot.handle(&admin(), "/audit_log").await);
    assert!(empty.contains("The books are clean"), "{}", empty);

    let out = text(&bot.handle(&player(), "/buy dagger").await);
    assert!(out.contains("**Ada** bought **Dagger**"), "{}", out);
    assert_eq!(fx.read(Document::GoldData)["1"]["gp"], 8);
    assert_eq!(fx.read(Document::StanleyShop)["weapons"]["Dagger"]["stock"], 5);
    assert_eq!(fx.read(Document::PlayerInventories)["1"]["Dagger"], 1);

    let bag = text(&bot.handle(&player(), "/stanley_inventory").await);
    assert_eq!(bag, "🎒 **Ada's Inventory (Page 1/1)**\n🔹 **Dagger** (x1)");

    let out = text(&bot.handle(&player(), "/sell DAGGER").await);
    assert!(out.contains("**Ada** sold **Dagger** for `1 gp`"), "{}", out);
    assert_eq!(fx.read(Document::GoldData)["1"]["gp"], 9);
    assert_eq!(fx.read(Document::StanleyShop)["weapons"]["Dagger"]["stock"], 6);

    let log = fx.read(Document::AuditLog);
    assert_eq!(log.as_array().map(Vec::len), Some(2));
    assert_eq!(log[0]["action"], "bought");
    assert_eq!(log[1]["user"], "Ada");

    let out = text(&bot.handle(&admin(), "/audit_log limit:5").await);
    assert!(out.starts_with("📜 **Recent Transactions:**"), "{}", out);
    let sold = out.find("**Ada** sold `Dagger` for `1 gp`").expect("sale line");
    let bought = out.find("**Ada** bought `Dagger` for `2 gp`").expect("purchase line");
    assert!(sold < bought, "newest first: {}", out);
}

#[tokio::test]
async fn shop_refusals() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);

    let out = text(&bot.handle(&player(), "/buy vorpal sword").await);
    assert!(out.contains("`vorpal sword` isn't on my shelves"), "{}", out);

    assert_eq!(
        text(&bot.handle(&brom(), "/buy longsword").await),
        "❌ You don't have enough gold to buy `longsword`."
    );
    assert_eq!(fx.read(Document::StanleyShop)["weapons"]["Longsword"]["stock"], 2);

    assert_eq!(
        text(&bot.handle(&brom(), "/sell torch").await),
        "❌ <@2>, you don't have anything to sell!"
    );
    assert_eq!(
        text(&bot.handle(&brom(), "/stanley_inventory").await),
        "🎒 <@2>, you own absolutely nothing. Not even a rusty dagger. How tragic."
    );
}

#[tokio::test]
async fn refresh_market_tops_up_empty_shelves() {
    let fx = Fixture::new();
    fx.write(
        Document::StanleyShop,
        r#"{"adventuring_gear": {"Torch": {"price_cp": 1, "stock": 0}, "Bedroll": {"price_cp": 100, "stock": 9}}}"#,
    );
    let mut bot = fx.bot(Persona::Stanley, []);

    let out = text(&bot.handle(&brom(), "/buy torch").await);
    assert!(out.contains("`Torch` is out of stock") || out.contains("Sold out of `Torch`"), "{}", out);

    assert_eq!(text(&bot.handle(&admin(), "/refresh_market").await), "🔄 **Market refreshed!**");
    let shop = fx.read(Document::StanleyShop);
    assert_eq!(shop["adventuring_gear"]["Torch"]["stock"], 3);
    assert_eq!(shop["adventuring_gear"]["Bedroll"]["stock"], 9);
}

#[tokio::test]
async fn requests_flow_from_player_to_shop() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);

    let out = text(&bot.handle(&player(), "/request Ring of Protection").await);
    assert!(out.contains("Your request for `ring of protection` has been added."), "{}", out);

    let again = text(&bot.handle(&player(), "/request ring of protection").await);
    assert!(again.contains("Stanley sighs"), "{}", again);
    assert!(again.contains("already requested `ring of protection`"), "{}", again);

    let out = text(&bot.handle(&player(), "/request vorpal sword").await);
    assert!(out.starts_with("❌ `vorpal sword` is not a requestable item."), "{}", out);

    bot.handle(&brom(), "/request ring of protection").await;
    let pending = text(&bot.handle(&player(), "/all_requests").await);
    assert!(pending.contains("• **Ring Of Protection** → <@1>, <@2>"), "{}", pending);

    assert_eq!(
        text(&bot.handle(&admin(), "/request_approve item:\"ring of protection\" stock:0").await),
        "❌ Cannot approve `ring of protection` with zero stock!"
    );
    let out = text(&bot.handle(&admin(), "/request_approve item:\"ring of protection\" stock:2").await);
    assert_eq!(
        out,
        "✅ **Ring of protection** has been approved and added to Stanley's shop with `2` in stock!"
    );

    let shop = fx.read(Document::StanleyShop);
    assert_eq!(shop["magic_items"]["ring of protection"]["stock"], 2);
    assert_eq!(shop["magic_items"]["ring of protection"]["price_cp"], 350_000);

    let none = text(&bot.handle(&player(), "/all_requests").await);
    assert!(none.contains("empty ledger"), "{}", none);

    assert_eq!(
        text(&bot.handle(&admin(), r#"/request_approve "heavy crossbow""#).await),
        "❌ Heavy crossbow is not in the request list."
    );
}

#[tokio::test]
async fn admins_extend_the_request_catalog() {
    let fx = Fixture::new();
    let mut bot = fx.bot(Persona::Stanley, []);

    let out = text(
        &bot.handle(
            &admin(),
            "/request_add item:\"Flame Tongue\" price_gp:5000 rarity:Rare category:magic_items",
        )
        .await,
    );
    assert_eq!(
        out,
        "✅ **Flame tongue** has been added to the **requestable items list** under `magic_items`!"
    );

    let dup = text(
        &bot.handle(
            &admin(),
            "/request_add item:\"flame tongue\" price_gp:5000 rarity:Rare category:magic_items",
        )
        .await,
    );
    assert_eq!(dup, "⚠️ `flame tongue` is already in the requestable items list.");

    let elsewhere = text(
        &bot.handle(
            &admin(),
            "/request_add item:\"FLAME TONGUE\" price_gp:4000 rarity:Rare category:weapons",
        )
        .await,
    );
    assert_eq!(elsewhere, "⚠️ `flame tongue` is already in the requestable items list.");
    let catalog = fx.read(Document::RequestableItems);
    assert_eq!(catalog["magic_items"]["flame tongue"]["price_gp"], 5000);
    assert!(catalog.get("weapons").map_or(true, |w| w.get("flame tongue").is_none()), "{}", catalog);

    let listing = text(&bot.handle(&player(), "/requests_available").await);
    assert!(listing.starts_with("📜 **Items Available for Request:**"), "{}", listing);
    assert!(listing.contains("**Magic Items**:"), "{}", listing);
    assert!(listing.contains("`flame tongue`"), "{}", listing);

    let out = text(&bot.handle(&player(), "/request flame tongue").await);
    assert!(out.contains("`flame tongue` has been added"), "{}", out);
}
