//! Repository behaviour against a real database.

use rust_decimal::Decimal;
use sqlx::PgPool;

use studybot_bot::db::purchases::record_purchase;
use studybot_bot::db::{
    CartRepository, CategoryRepository, OrderRepository, ProjectRepository, PurchaseRepository,
    RepositoryError, UserRepository, broadcasts,
};
use studybot_bot::models::{
    CategoryUpdate, NewCategory, NewOrder, NewProject, NewPurchase, NewUser, ProfileUpdate,
    ProjectUpdate, User,
};
use studybot_bot::services::{StubGateway, buy_now, checkout_cart};
use studybot_core::{
    BroadcastAudience, OrderStatus, Phone, Price, ProjectLevel, ProjectType, TelegramId,
};
use studybot_integration_tests::{create_category, create_project};

fn tenge(amount: i64) -> Price {
    Price::from_amount(Decimal::from(amount))
}

async fn register(pool: &PgPool, telegram_id: i64) -> User {
    let (user, is_new) = UserRepository::new(pool)
        .register(&NewUser {
            telegram_id: TelegramId::new(telegram_id),
            username: None,
            first_name: Some("Test".to_string()),
            last_name: None,
            referred_by: None,
        })
        .await
        .unwrap();
    assert!(is_new);
    user
}

fn custom_order(user: &User) -> NewOrder {
    NewOrder {
        user_id: user.id,
        project_type: ProjectType::Coursework,
        description: "Coursework on graph algorithms".to_string(),
        technologies: Some("Python".to_string()),
        deadline: Some("end of May".to_string()),
        budget: None,
        contact_info: None,
    }
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn register_twice_returns_existing_user(pool: PgPool) {
    let user = register(&pool, 1001).await;

    let (again, is_new) = UserRepository::new(&pool)
        .register(&NewUser {
            telegram_id: TelegramId::new(1001),
            username: Some("renamed".to_string()),
            first_name: None,
            last_name: None,
            referred_by: None,
        })
        .await
        .unwrap();

    assert!(!is_new);
    assert_eq!(again.id, user.id);
    assert_eq!(again.referral_code, user.referral_code);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn cart_add_is_idempotent(pool: PgPool) {
    let user = register(&pool, 1002).await;
    let category = create_category(&pool, "Python").await;
    let project = create_project(&pool, &category, "Parser", 5_000).await;
    let cart = CartRepository::new(&pool);

    assert!(cart.add(user.id, project.id).await.unwrap());
    assert!(!cart.add(user.id, project.id).await.unwrap());
    assert_eq!(cart.count(user.id).await.unwrap(), 1);

    assert!(cart.remove(user.id, project.id).await.unwrap());
    assert!(cart.get(user.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn category_delete_refused_while_projects_exist(pool: PgPool) {
    let category = create_category(&pool, "Java").await;
    let empty = create_category(&pool, "Go").await;
    create_project(&pool, &category, "Calculator", 2_500).await;
    let categories = CategoryRepository::new(&pool);

    let result = categories.delete(category.id).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    assert!(categories.get(category.id).await.unwrap().is_some());

    categories.delete(empty.id).await.unwrap();
    assert!(categories.get(empty.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn order_transitions_follow_the_workflow(pool: PgPool) {
    let user = register(&pool, 1003).await;
    let orders = OrderRepository::new(&pool);
    let order = orders.create(&custom_order(&user)).await.unwrap();
    assert_eq!(order.status, OrderStatus::New);

    let skipped = orders.transition(order.id, OrderStatus::Completed, None).await;
    assert!(matches!(skipped, Err(RepositoryError::Conflict(_))));

    for next in [
        OrderStatus::Accepted,
        OrderStatus::InProgress,
        OrderStatus::ReadyForCheck,
        OrderStatus::Completed,
    ] {
        let updated = orders.transition(order.id, next, None).await.unwrap();
        assert_eq!(updated.status, next);
    }

    let done = orders.get(order.id).await.unwrap().unwrap();
    assert!(done.completed_at.is_some());

    let reopened = orders.transition(order.id, OrderStatus::InProgress, None).await;
    assert!(matches!(reopened, Err(RepositoryError::Conflict(_))));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn rejection_keeps_reason(pool: PgPool) {
    let user = register(&pool, 1004).await;
    let orders = OrderRepository::new(&pool);
    let order = orders.create(&custom_order(&user)).await.unwrap();

    let rejected = orders
        .transition(order.id, OrderStatus::Rejected, Some("Deadline too short"))
        .await
        .unwrap();

    assert_eq!(rejected.status, OrderStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Deadline too short"));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn broadcast_recipients_skip_blocked_users(pool: PgPool) {
    let active = register(&pool, 2001).await;
    let blocked = register(&pool, 2002).await;
    UserRepository::new(&pool)
        .set_blocked(blocked.id, true)
        .await
        .unwrap();

    let recipients = broadcasts::recipients(&pool, BroadcastAudience::All)
        .await
        .unwrap();

    assert_eq!(recipients, vec![active.telegram_id]);
    assert_eq!(
        broadcasts::count_recipients(&pool, BroadcastAudience::All)
            .await
            .unwrap(),
        1
    );
    assert!(
        broadcasts::recipients(&pool, BroadcastAudience::Buyers)
            .await
            .unwrap()
            .is_empty()
    );
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn created_category_keeps_supplied_fields(pool: PgPool) {
    let new = NewCategory {
        name: "C++".to_string(),
        description: Some("Console and Qt projects".to_string()),
        icon: Some("⚙️".to_string()),
    };
    let categories = CategoryRepository::new(&pool);

    let created = categories.create(&new).await.unwrap();
    let stored = categories.get(created.id).await.unwrap().unwrap();

    assert_eq!(stored.name, new.name);
    assert_eq!(stored.description, new.description);
    assert_eq!(stored.icon, new.icon);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn created_project_keeps_supplied_fields(pool: PgPool) {
    let category = create_category(&pool, "Web").await;
    let new = NewProject {
        title: "Online library".to_string(),
        description: "Catalog with loans and search".to_string(),
        category_id: category.id,
        project_type: ProjectType::Coursework,
        level: ProjectLevel::Advanced,
        programming_languages: Some("Python, JavaScript".to_string()),
        technologies: Some("Django, PostgreSQL".to_string()),
        price: Price::parse_input("12 500,50").unwrap(),
    };
    let projects = ProjectRepository::new(&pool);

    let created = projects.create(&new).await.unwrap();
    let stored = projects.get(created.id).await.unwrap().unwrap();

    assert_eq!(stored.title, new.title);
    assert_eq!(stored.description, new.description);
    assert_eq!(stored.category_id, new.category_id);
    assert_eq!(stored.project_type, new.project_type);
    assert_eq!(stored.level, new.level);
    assert_eq!(stored.programming_languages, new.programming_languages);
    assert_eq!(stored.technologies, new.technologies);
    assert_eq!(stored.price, new.price);
    assert_eq!(stored.discount_price, None);
    assert_eq!(stored.purchases_count, 0);
    assert!(stored.is_active);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn project_update_changes_one_field(pool: PgPool) {
    let category = create_category(&pool, "Python").await;
    let before = create_project(&pool, &category, "Weather bot", 4_000).await;
    let projects = ProjectRepository::new(&pool);

    let renamed = projects
        .update(before.id, &ProjectUpdate::Title("Weather bot v2".to_string()))
        .await
        .unwrap();
    assert_eq!(renamed.title, "Weather bot v2");
    assert_eq!(renamed.description, before.description);
    assert_eq!(renamed.price, before.price);
    assert_eq!(renamed.discount_price, before.discount_price);
    assert_eq!(renamed.programming_languages, before.programming_languages);
    assert_eq!(renamed.category_id, before.category_id);

    let discounted = projects
        .update(before.id, &ProjectUpdate::DiscountPrice(Some(tenge(3_500))))
        .await
        .unwrap();
    assert_eq!(discounted.discount_price, Some(tenge(3_500)));
    assert_eq!(discounted.title, "Weather bot v2");
    assert_eq!(discounted.price, before.price);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn category_update_changes_one_field(pool: PgPool) {
    let before = create_category(&pool, "Python").await;
    let categories = CategoryRepository::new(&pool);

    let updated = categories
        .update(before.id, &CategoryUpdate::Description(Some("Bots and parsers".to_string())))
        .await
        .unwrap();

    assert_eq!(updated.description.as_deref(), Some("Bots and parsers"));
    assert_eq!(updated.name, before.name);
    assert_eq!(updated.icon, before.icon);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn profile_update_changes_one_field(pool: PgPool) {
    let before = register(&pool, 1005).await;
    let phone = Phone::parse("+7 701 123 45 67").unwrap();

    let updated = UserRepository::new(&pool)
        .update_profile(before.id, &ProfileUpdate::Phone(phone.clone()))
        .await
        .unwrap();

    assert_eq!(updated.phone, Some(phone));
    assert_eq!(updated.first_name, before.first_name);
    assert_eq!(updated.email, before.email);
    assert_eq!(updated.referral_code, before.referral_code);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn order_price_quote_changes_only_price(pool: PgPool) {
    let user = register(&pool, 1006).await;
    let orders = OrderRepository::new(&pool);
    let before = orders.create(&custom_order(&user)).await.unwrap();
    assert_eq!(before.price, None);

    let quoted = orders.set_price(before.id, tenge(18_000)).await.unwrap();

    assert_eq!(quoted.price, Some(tenge(18_000)));
    assert_eq!(quoted.status, before.status);
    assert_eq!(quoted.description, before.description);
    assert_eq!(quoted.deadline, before.deadline);
    assert!(!quoted.is_paid);
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn purchased_project_cannot_be_deleted(pool: PgPool) {
    let user = register(&pool, 1007).await;
    let category = create_category(&pool, "Java").await;
    let project = create_project(&pool, &category, "Bank system", 9_000).await;
    let unsold = create_project(&pool, &category, "Chess", 4_000).await;
    buy_now(&pool, &StubGateway, user.id, project.id).await.unwrap();
    let projects = ProjectRepository::new(&pool);

    let result = projects.delete(project.id).await;
    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    assert!(projects.get(project.id).await.unwrap().is_some());

    projects.delete(unsold.id).await.unwrap();
    assert!(projects.get(unsold.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn repeat_purchase_is_recorded_once(pool: PgPool) {
    let user = register(&pool, 1008).await;
    let category = create_category(&pool, "Python").await;
    let project = create_project(&pool, &category, "Telegram parser", 5_000).await;
    let new = NewPurchase {
        user_id: user.id,
        project_id: project.id,
        price: project.price,
        payment_method: "test".to_string(),
        transaction_id: Some("test-first".to_string()),
    };
    let mut conn = pool.acquire().await.unwrap();

    let first = record_purchase(&mut conn, &new).await.unwrap();
    let second = record_purchase(&mut conn, &new).await.unwrap();
    drop(conn);

    assert!(first.is_some());
    assert!(second.is_none());

    let again = buy_now(&pool, &StubGateway, user.id, project.id).await;
    assert!(
        again
            .unwrap_err()
            .to_string()
            .contains("You already own this project.")
    );

    let stored = ProjectRepository::new(&pool)
        .get(project.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.purchases_count, 1);
    assert_eq!(
        PurchaseRepository::new(&pool)
            .list_by_user(user.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn checkout_stores_discounted_price(pool: PgPool) {
    let user = register(&pool, 1009).await;
    let category = create_category(&pool, "Web").await;
    let project = create_project(&pool, &category, "React store", 15_000).await;
    ProjectRepository::new(&pool)
        .update(project.id, &ProjectUpdate::DiscountPrice(Some(tenge(13_000))))
        .await
        .unwrap();
    CartRepository::new(&pool)
        .add(user.id, project.id)
        .await
        .unwrap();

    let outcome = checkout_cart(&pool, &StubGateway, user.id).await.unwrap();
    assert_eq!(outcome.total(), tenge(13_000));

    let purchases = PurchaseRepository::new(&pool);
    let owned = purchases.list_by_user(user.id).await.unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].purchase.price, tenge(13_000));
    assert_eq!(purchases.total_spent(user.id).await.unwrap(), tenge(13_000));
}

#[sqlx::test(migrations = "../bot/migrations")]
async fn checkout_charges_only_new_lines(pool: PgPool) {
    let user = register(&pool, 1010).await;
    let category = create_category(&pool, "Python").await;
    let owned = create_project(&pool, &category, "Quiz bot", 6_000).await;
    let fresh = create_project(&pool, &category, "Scraper", 2_000).await;
    let cart = CartRepository::new(&pool);
    cart.add(user.id, owned.id).await.unwrap();
    cart.add(user.id, fresh.id).await.unwrap();
    buy_now(&pool, &StubGateway, user.id, owned.id).await.unwrap();
    // The direct purchase already took the owned project out of the cart.
    sqlx::query("INSERT INTO cart_items (user_id, project_id) VALUES ($1, $2)")
        .bind(user.id)
        .bind(owned.id)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = checkout_cart(&pool, &StubGateway, user.id).await.unwrap();

    assert_eq!(outcome.already_owned, vec!["Quiz bot".to_string()]);
    assert_eq!(outcome.purchased.len(), 1);
    assert_eq!(outcome.purchased[0].project_id, fresh.id);
    assert_eq!(outcome.total(), tenge(2_000));
    assert!(cart.get(user.id).await.unwrap().is_empty());
}
