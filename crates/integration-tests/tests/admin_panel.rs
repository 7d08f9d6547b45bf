//! Admin panel flows driven through the update handler.

use sqlx::PgPool;

use studybot_bot::db::{
    AdminRepository, OrderRepository, TicketRepository, UserRepository, broadcasts,
};
use studybot_bot::models::{NewOrder, NewTicket, Order, User};
use studybot_core::{AdminRole, BroadcastAudience, OrderStatus, ProjectType, TelegramId, TicketStatus};
use studybot_integration_tests::TestBot;

const ADMIN: i64 = 9001;
const CUSTOMER: i64 = 5001;

async fn customer(bot: &TestBot) -> User {
    bot.text(CUSTOMER, "/start").await;
    UserRepository::new(bot.pool())
        .get_by_telegram_id(TelegramId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap()
}

async fn place_order(bot: &TestBot, user: &User) -> Order {
    OrderRepository::new(bot.pool())
        .create(&NewOrder {
            user_id: user.id,
            project_type: ProjectType::Diploma,
            description: "Diploma on warehouse automation".to_string(),
            technologies: Some("Django".to_string()),
            deadline: Some("June".to_string()),
            budget: Some("20000".to_string()),
            contact_info: None,
        })
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn bootstrap_admin_is_recorded(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);

    bot.text(ADMIN, "/admin").await;

    let admin = AdminRepository::new(bot.pool())
        .find(TelegramId::new(ADMIN))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, AdminRole::Admin);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn regular_user_cannot_open_panel(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);

    bot.text(CUSTOMER, "/admin").await;
    bot.press(CUSTOMER, "a:stats").await;

    assert!(
        AdminRepository::new(bot.pool())
            .find(TelegramId::new(CUSTOMER))
            .await
            .unwrap()
            .is_none()
    );
    let answers = bot.messenger.answers();
    assert_eq!(answers.len(), 1);
    assert!(answers[0].1);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn content_manager_cannot_manage_orders(pool: PgPool) {
    let bot = TestBot::new(pool, &[]);
    AdminRepository::new(bot.pool())
        .grant(TelegramId::new(7001), AdminRole::ContentManager)
        .await
        .unwrap();

    bot.press(7001, "a:om").await;

    assert_eq!(
        bot.messenger.answers(),
        vec![(Some("⛔ You don't have access to this section.".to_string()), true)]
    );
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn status_change_notifies_customer(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);
    let user = customer(&bot).await;
    let order = place_order(&bot, &user).await;
    bot.messenger.clear();

    bot.press(ADMIN, &format!("a:os:{}:accepted", order.id)).await;

    let order = OrderRepository::new(bot.pool())
        .get(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Accepted);

    let notices = bot.messenger.texts_to(CUSTOMER);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains(&format!("Order #{} is now <b>Accepted</b>", order.id)));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn invalid_status_change_is_refused(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);
    let user = customer(&bot).await;
    let order = place_order(&bot, &user).await;
    bot.messenger.clear();

    bot.press(ADMIN, &format!("a:os:{}:completed", order.id)).await;

    let unchanged = OrderRepository::new(bot.pool())
        .get(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, OrderStatus::New);
    assert!(bot.messenger.texts_to(CUSTOMER).is_empty());
    assert!(bot.messenger.answers().iter().all(|(_, alert)| *alert));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn rejection_asks_for_reason(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);
    let user = customer(&bot).await;
    let order = place_order(&bot, &user).await;
    let orders = OrderRepository::new(bot.pool());
    bot.messenger.clear();

    bot.press(ADMIN, &format!("a:os:{}:rejected", order.id)).await;
    assert_eq!(
        orders.get(order.id).await.unwrap().unwrap().status,
        OrderStatus::New
    );

    bot.text(ADMIN, "We don't take diplomas this month").await;

    let rejected = orders.get(order.id).await.unwrap().unwrap();
    assert_eq!(rejected.status, OrderStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("We don't take diplomas this month")
    );
    let notices = bot.messenger.texts_to(CUSTOMER);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("Reason: We don't take diplomas this month"));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn ticket_reply_reaches_author(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);
    let user = customer(&bot).await;
    let ticket = TicketRepository::new(bot.pool())
        .create(&NewTicket {
            user_id: user.id,
            order_id: None,
            subject: "Download link".to_string(),
            message: "The file does not open".to_string(),
        })
        .await
        .unwrap();
    bot.messenger.clear();

    bot.press(ADMIN, &format!("a:tr:{}", ticket.id)).await;
    bot.text(ADMIN, "Sent you a fresh copy").await;

    let answered = TicketRepository::new(bot.pool())
        .get(ticket.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(answered.admin_response.as_deref(), Some("Sent you a fresh copy"));
    assert_ne!(answered.status, TicketStatus::Closed);

    let notices = bot.messenger.texts_to(CUSTOMER);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("Sent you a fresh copy"));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn admin_cannot_block_self(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);
    bot.text(ADMIN, "/admin").await;
    let users = UserRepository::new(bot.pool());
    let me = users
        .get_by_telegram_id(TelegramId::new(ADMIN))
        .await
        .unwrap()
        .unwrap();

    bot.press(ADMIN, &format!("a:ub:{}:1", me.id)).await;

    let me = users.get_by_id(me.id).await.unwrap().unwrap();
    assert!(!me.is_blocked);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn broadcast_is_delivered_and_recorded(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);
    customer(&bot).await;
    bot.text(5002, "/start").await;
    bot.text(ADMIN, "/admin").await;
    bot.messenger.clear();

    let broadcast = studybot_bot::services::run_broadcast(
        bot.pool(),
        bot.state.messenger(),
        TelegramId::new(ADMIN),
        "New projects in the catalog!",
        BroadcastAudience::All,
        std::time::Duration::ZERO,
    )
    .await
    .unwrap();

    assert_eq!(broadcast.total_sent, 3);
    assert_eq!(broadcast.successful, 3);
    assert!(broadcast.sent_at.is_some());
    assert_eq!(
        bot.messenger.texts_to(CUSTOMER),
        vec!["New projects in the catalog!".to_string()]
    );

    let history = broadcasts::list_recent_broadcasts(bot.pool(), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, broadcast.id);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn broadcast_counts_unreachable_chats(pool: PgPool) {
    let bot = TestBot::new(pool, &[ADMIN]);
    customer(&bot).await;
    bot.text(5002, "/start").await;
    bot.messenger.block_chat(5002);

    let broadcast = studybot_bot::services::run_broadcast(
        bot.pool(),
        bot.state.messenger(),
        TelegramId::new(ADMIN),
        "Discounts this week",
        BroadcastAudience::All,
        std::time::Duration::ZERO,
    )
    .await
    .unwrap();

    assert_eq!(broadcast.total_sent, 2);
    assert_eq!(broadcast.successful, 1);
    assert_eq!(broadcast.failed, 1);
}
