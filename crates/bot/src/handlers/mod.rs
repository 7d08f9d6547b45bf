//! Update handlers.
//!
//! [`handle_update`] identifies the sender, routes the update to a handler
//! and delivers the [`Reply`]. Handlers never talk to Telegram directly:
//! they return a screen plus anything else to send, and this module decides
//! whether to edit the message a button belongs to or send a new one.

pub mod account;
pub mod admin;
pub mod callback;
pub mod catalog;
pub mod commands;
pub mod dialogue;
pub mod support;

use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use studybot_core::{AdminRole, AdminSection, TelegramId};

pub use callback::{AdminAction, Callback, UnknownCallback};

use crate::conversation::Dialogue;
use crate::db::{AdminRepository, UserRepository};
use crate::error::{AppError, set_sentry_user};
use crate::models::{NewUser, User};
use crate::services::{Notification, admin_chat_ids, deliver};
use crate::state::AppState;
use crate::telegram::{self, CallbackQuery, Message, MessageRef, OutgoingDocument, Update};
use crate::views::{self, Screen};

/// Telegram cuts callback alerts longer than this.
const MAX_ALERT_CHARS: usize = 200;

/// Everything to send back for one update.
#[derive(Debug, Default)]
pub struct Reply {
    pub screen: Option<Screen>,
    /// Send the screen as a new message even when a button was pressed.
    pub fresh: bool,
    /// Short text shown over the chat when answering a button.
    pub toast: Option<String>,
    /// Show `toast` as a modal alert instead.
    pub alert: bool,
    pub documents: Vec<OutgoingDocument>,
    pub notifications: Vec<Notification>,
}

impl Reply {
    #[must_use]
    pub fn screen(screen: Screen) -> Self {
        Self {
            screen: Some(screen),
            ..Self::default()
        }
    }

    /// A screen that must not replace the message the button was on.
    #[must_use]
    pub fn fresh(screen: Screen) -> Self {
        Self {
            screen: Some(screen),
            fresh: true,
            ..Self::default()
        }
    }

    pub fn toast(text: impl Into<String>) -> Self {
        Self {
            toast: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            toast: Some(text.into()),
            alert: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_toast(mut self, text: impl Into<String>) -> Self {
        self.toast = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_document(mut self, document: OutgoingDocument) -> Self {
        self.documents.push(document);
        self
    }

    #[must_use]
    pub fn with_notifications(mut self, notifications: Vec<Notification>) -> Self {
        self.notifications.extend(notifications);
        self
    }
}

pub type HandlerResult = Result<Reply, AppError>;

/// The sender of the update being handled.
pub struct Ctx<'a> {
    pub state: &'a AppState,
    pub chat_id: i64,
    pub user: User,
    /// Admin role, if the sender has one.
    pub role: Option<AdminRole>,
}

impl Ctx<'_> {
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        self.state.pool()
    }

    #[must_use]
    pub const fn chat(&self) -> TelegramId {
        TelegramId::new(self.chat_id)
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_some()
    }

    /// The sender's role, if it may open `section`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` otherwise.
    pub fn require(&self, section: AdminSection) -> Result<AdminRole, AppError> {
        match self.role {
            Some(role) if role.can(section) => Ok(role),
            Some(role) => Err(AppError::Forbidden(format!("{} may not open {section:?}", role.label()))),
            None => Err(AppError::Forbidden("not an admin".to_string())),
        }
    }

    pub async fn dialogue(&self) -> Option<Dialogue> {
        self.state.dialogues().get(self.chat()).await
    }

    pub async fn set_dialogue(&self, dialogue: Dialogue) {
        self.state.dialogues().set(self.chat(), dialogue).await;
    }

    pub async fn clear_dialogue(&self) -> Option<Dialogue> {
        self.state.dialogues().clear(self.chat()).await
    }

    /// The same message for every admin chat.
    ///
    /// # Errors
    ///
    /// Returns error if the admin list cannot be loaded.
    pub async fn notify_admins(
        &self,
        text: &str,
        keyboard: Option<&telegram::Keyboard>,
    ) -> Result<Vec<Notification>, AppError> {
        let chats = admin_chat_ids(self.pool(), self.state.config()).await?;
        Ok(Notification::to_all(chats, text, keyboard))
    }
}

/// Handle one update end to end. Errors are reported and turned into a
/// message for the user; nothing is returned.
#[instrument(skip_all, fields(update_id = update.update_id))]
pub async fn handle_update(state: &AppState, update: Update) {
    let (Some(chat_id), Some(sender)) = (update.chat_id(), update.sender().cloned()) else {
        debug!("Update without chat or sender ignored");
        return;
    };
    if sender.is_bot {
        return;
    }
    set_sentry_user(sender.id, sender.username.as_deref());

    let Update {
        message,
        callback_query,
        ..
    } = update;

    let reply = match dispatch(state, chat_id, &sender, message.as_ref(), callback_query.as_ref())
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            e.report();
            error_reply(&e, callback_query.is_some())
        }
    };

    send_reply(state, chat_id, callback_query.as_ref(), reply).await;
}

fn error_reply(error: &AppError, from_button: bool) -> Reply {
    let message = error.user_message();
    if from_button {
        Reply::alert(views::truncate(&message, MAX_ALERT_CHARS))
    } else {
        Reply::screen(Screen::text(message))
    }
}

async fn dispatch(
    state: &AppState,
    chat_id: i64,
    sender: &telegram::User,
    message: Option<&Message>,
    callback: Option<&CallbackQuery>,
) -> HandlerResult {
    let text = message.and_then(|m| m.text.as_deref()).map(str::trim);
    let referral = text.and_then(commands::start_payload);

    let (user, is_new) = identify(state, sender, referral).await?;
    let role = admin_role(state, user.telegram_id).await?;
    let ctx = Ctx {
        state,
        chat_id,
        user,
        role,
    };

    if ctx.user.is_blocked && !ctx.is_admin() {
        debug!(telegram_id = %ctx.user.telegram_id, "Blocked user ignored");
        let notice = views::menu::blocked();
        return Ok(if callback.is_some() {
            Reply::alert(notice.text)
        } else {
            Reply::screen(notice)
        });
    }

    if let Some(query) = callback {
        let Some(data) = query.data.as_deref() else {
            return Ok(Reply::default());
        };
        return match data.parse::<Callback>() {
            Ok(callback) => route_callback(&ctx, callback).await,
            Err(e) => {
                debug!(error = %e, "Stale button pressed");
                Ok(Reply::toast("This button is no longer valid."))
            }
        };
    }

    let Some(message) = message else {
        return Ok(Reply::default());
    };
    if let Some(document) = &message.document {
        return dialogue::on_document(&ctx, document).await;
    }
    match text {
        Some(text) if text.starts_with('/') => commands::handle(&ctx, text, is_new).await,
        Some(text) if !text.is_empty() => dialogue::on_text(&ctx, text).await,
        _ => Ok(Reply::screen(views::menu::unknown_input(ctx.is_admin()))),
    }
}

/// Load the sender's account, registering it on first contact.
async fn identify(
    state: &AppState,
    sender: &telegram::User,
    referral: Option<&str>,
) -> Result<(User, bool), AppError> {
    let users = UserRepository::new(state.pool());
    let telegram_id = TelegramId::new(sender.id);

    if let Some(user) = users.get_by_telegram_id(telegram_id).await? {
        users
            .touch(
                user.id,
                sender.username.as_deref(),
                Some(sender.first_name.as_str()),
                sender.last_name.as_deref(),
            )
            .await?;
        return Ok((user, false));
    }

    let referred_by = match referral {
        Some(code) => users.get_by_referral_code(code).await?.map(|u| u.id),
        None => None,
    };
    let (user, is_new) = users
        .register(&NewUser {
            telegram_id,
            username: sender.username.clone(),
            first_name: Some(sender.first_name.clone()),
            last_name: sender.last_name.clone(),
            referred_by,
        })
        .await?;
    if is_new {
        info!(
            telegram_id = %telegram_id,
            referred = referred_by.is_some(),
            "User registered"
        );
    }
    Ok((user, is_new))
}

/// Role from the `admins` table, or full rights for ids in `ADMIN_IDS`.
async fn admin_role(state: &AppState, telegram_id: TelegramId) -> Result<Option<AdminRole>, AppError> {
    if let Some(admin) = AdminRepository::new(state.pool()).find(telegram_id).await? {
        return Ok(Some(admin.role));
    }
    Ok(state
        .config()
        .is_bootstrap_admin(telegram_id)
        .then_some(AdminRole::Admin))
}

async fn route_callback(ctx: &Ctx<'_>, callback: Callback) -> HandlerResult {
    match callback {
        Callback::Noop => Ok(Reply::default()),
        Callback::Menu => {
            ctx.clear_dialogue().await;
            Ok(Reply::screen(views::menu::main_menu(ctx.is_admin())))
        }
        Callback::Help => Ok(Reply::screen(views::menu::help())),

        Callback::Catalog => Ok(Reply::screen(views::catalog::catalog_menu())),
        Callback::Categories => catalog::categories(ctx).await,
        Callback::List { filter, page } => catalog::list(ctx, filter, page).await,
        Callback::Project(id) => catalog::card(ctx, id).await,
        Callback::Search => catalog::start_search(ctx).await,
        Callback::AddToCart(id) => catalog::add_to_cart(ctx, id).await,
        Callback::RemoveFromCart {
            project_id,
            in_cart,
        } => catalog::remove_from_cart(ctx, project_id, in_cart).await,
        Callback::Cart => catalog::cart(ctx).await,
        Callback::ClearCart => catalog::clear_cart(ctx).await,
        Callback::Checkout => catalog::checkout(ctx).await,
        Callback::BuyNow(id) => catalog::buy_now(ctx, id).await,
        Callback::Download(id) => catalog::download(ctx, id).await,
        Callback::Rate(id) => catalog::start_review(ctx, id).await,

        Callback::MyOrders => Ok(Reply::screen(views::account::my_orders_menu())),
        Callback::Purchases => account::purchases(ctx).await,
        Callback::Orders => account::orders(ctx).await,
        Callback::Order(id) => account::order(ctx, id).await,
        Callback::PayOrder(id) => account::pay(ctx, id).await,
        Callback::OrderResult(id) => account::download_result(ctx, id).await,
        Callback::OrderTicket(id) => support::start_ticket(ctx, Some(id)).await,
        Callback::NewOrder => account::start_order(ctx).await,
        Callback::Profile => account::profile(ctx).await,
        Callback::ProfileStats => account::profile_stats(ctx).await,
        Callback::EditProfile(field) => account::start_profile_edit(ctx, field).await,
        Callback::Referral => account::referral(ctx).await,

        Callback::Support => Ok(Reply::screen(views::support::support_menu())),
        Callback::Faq => Ok(Reply::screen(views::menu::faq())),
        Callback::NewTicket => support::start_ticket(ctx, None).await,
        Callback::Tickets => support::tickets(ctx).await,
        Callback::Ticket(id) => support::ticket(ctx, id).await,

        Callback::PickType(_)
        | Callback::PickLevel(_)
        | Callback::PickCategory(_)
        | Callback::PickAudience(_)
        | Callback::PickRating(_)
        | Callback::Skip
        | Callback::Confirm
        | Callback::Cancel => dialogue::on_button(ctx, callback).await,

        Callback::Admin(action) => admin::handle(ctx, action).await,
    }
}

/// Deliver a reply: edit or send the screen, answer the button, then send
/// documents and notifications.
async fn send_reply(
    state: &AppState,
    chat_id: i64,
    callback: Option<&CallbackQuery>,
    reply: Reply,
) {
    let messenger = state.messenger();

    if let Some(query) = callback {
        if let Err(e) = messenger
            .answer_callback(&query.id, reply.toast.as_deref(), reply.alert)
            .await
        {
            debug!(error = %e, "Callback answer failed");
        }
    }

    if let Some(screen) = &reply.screen {
        let source = callback
            .and_then(|q| q.message.as_ref())
            .filter(|_| !reply.fresh)
            .map(|m| MessageRef {
                chat_id: m.chat.id,
                message_id: m.message_id,
            });
        send_screen(state, chat_id, source, screen).await;
    }

    for document in reply.documents {
        let file_name = document.file_name.clone();
        if let Err(e) = messenger.send_document(chat_id, document).await {
            let error = AppError::from(e);
            error.report();
            warn!(file_name = %file_name, "Document not delivered");
            send_screen(state, chat_id, None, &Screen::text(error.user_message())).await;
        }
    }

    if !reply.notifications.is_empty() {
        let delivered = deliver(messenger, &reply.notifications).await;
        debug!(
            delivered,
            total = reply.notifications.len(),
            "Notifications sent"
        );
    }
}

async fn send_screen(state: &AppState, chat_id: i64, source: Option<MessageRef>, screen: &Screen) {
    let messenger = state.messenger();

    if let Some(source) = source {
        match messenger.edit_text(source, &screen.text, screen.markup()).await {
            Ok(()) => return,
            Err(e) if e.is_message_not_modified() => return,
            Err(e) => debug!(error = %e, "Edit failed, sending a new message"),
        }
    }

    if let Err(e) = messenger.send_text(chat_id, &screen.text, screen.markup()).await {
        AppError::from(e).report();
    }
}
