//! Customer flows driven through the update handler.

use sqlx::PgPool;

use studybot_bot::db::{CartRepository, PurchaseRepository, UserRepository};
use studybot_core::TelegramId;
use studybot_integration_tests::{TestBot, create_category, create_project};

const CUSTOMER: i64 = 5001;

#[sqlx::test(migrations = "../bot/migrations")]
async fn start_registers_and_greets(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);

    bot.text(CUSTOMER, "/start").await;

    let user = UserRepository::new(bot.pool())
        .get_by_telegram_id(TelegramId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.username.as_deref(), Some("user5001"));
    assert!(!user.is_blocked);

    let texts = bot.messenger.texts_to(CUSTOMER);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Hi, User5001"));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn referral_link_records_referrer(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);
    bot.text(CUSTOMER, "/start").await;
    let users = UserRepository::new(bot.pool());
    let referrer = users
        .get_by_telegram_id(TelegramId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap();

    bot.text(5002, &format!("/start {}", referrer.referral_code.to_lowercase()))
        .await;

    let friend = users
        .get_by_telegram_id(TelegramId::new(5002))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(friend.referred_by, Some(referrer.id));
    assert_eq!(users.referral_count(referrer.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn referral_does_not_change_existing_user(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);
    bot.text(CUSTOMER, "/start").await;
    bot.text(5002, "/start").await;
    let users = UserRepository::new(bot.pool());
    let referrer = users
        .get_by_telegram_id(TelegramId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap();

    bot.text(5002, &format!("/start {}", referrer.referral_code)).await;

    let existing = users
        .get_by_telegram_id(TelegramId::new(5002))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.referred_by, None);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn cart_checkout_records_purchases(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);
    let category = create_category(bot.pool(), "Python").await;
    let bot_project = create_project(bot.pool(), &category, "Shop bot", 8_000).await;
    let parser = create_project(bot.pool(), &category, "Parser", 3_000).await;

    bot.press(CUSTOMER, &format!("ca:{}", bot_project.id)).await;
    bot.press(CUSTOMER, &format!("ca:{}", parser.id)).await;
    bot.press(CUSTOMER, &format!("ca:{}", parser.id)).await;

    let answers = bot.messenger.answers();
    assert_eq!(answers[0].0.as_deref(), Some("🛒 Added to cart"));
    assert_eq!(answers[2].0.as_deref(), Some("Already in your cart"));

    let user = UserRepository::new(bot.pool())
        .get_by_telegram_id(TelegramId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(CartRepository::new(bot.pool()).count(user.id).await.unwrap(), 2);

    bot.messenger.clear();
    bot.press(CUSTOMER, "checkout").await;

    let texts = bot.messenger.texts_to(CUSTOMER);
    assert!(texts.iter().any(|t| t.contains("Payment successful")));

    let purchases = PurchaseRepository::new(bot.pool());
    assert!(purchases.has_purchased(user.id, bot_project.id).await.unwrap());
    assert!(purchases.has_purchased(user.id, parser.id).await.unwrap());
    assert!(
        CartRepository::new(bot.pool())
            .get(user.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn owned_project_cannot_be_added_again(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);
    let category = create_category(bot.pool(), "Web").await;
    let project = create_project(bot.pool(), &category, "Portfolio", 3_000).await;

    bot.press(CUSTOMER, &format!("buy:{}", project.id)).await;
    bot.messenger.clear();
    bot.press(CUSTOMER, &format!("ca:{}", project.id)).await;

    assert_eq!(
        bot.messenger.answers(),
        vec![(Some("You already own this project.".to_string()), true)]
    );
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn empty_cart_checkout_is_refused(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);

    bot.press(CUSTOMER, "checkout").await;

    let answers = bot.messenger.answers();
    assert_eq!(answers.len(), 1);
    assert!(answers[0].1);
    assert!(
        answers[0]
            .0
            .as_deref()
            .is_some_and(|t| t.contains("Your cart is empty"))
    );
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn blocked_user_only_gets_notice(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);
    bot.text(CUSTOMER, "/start").await;
    let users = UserRepository::new(bot.pool());
    let user = users
        .get_by_telegram_id(TelegramId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap();
    users.set_blocked(user.id, true).await.unwrap();
    bot.messenger.clear();

    bot.text(CUSTOMER, "/menu").await;

    let texts = bot.messenger.texts_to(CUSTOMER);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("restricted"));
}
