//! Chat screens.
//!
//! A [`Screen`] is the text and keyboard of one bot message. View functions
//! are pure: they take models and return screens, and handlers decide
//! whether to send a screen as a new message or edit an existing one.
//!
//! All text is Telegram HTML. Anything that came from a user goes through
//! [`escape`].

pub mod account;
pub mod admin;
pub mod catalog;
pub mod menu;
pub mod support;
pub mod wizard;

use chrono::{DateTime, Utc};

use crate::handlers::callback::Callback;
use crate::telegram::{Button, Keyboard};

/// Items per page in every paginated list.
pub const PAGE_SIZE: u32 = 5;

/// Longest description shown in list entries before it is cut.
pub const PREVIEW_CHARS: usize = 100;

/// Text and buttons of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Screen {
    pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    /// A screen without buttons.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Keyboard::new())
    }

    /// The keyboard, or `None` when it has no buttons.
    #[must_use]
    pub fn markup(&self) -> Option<&Keyboard> {
        (!self.keyboard.is_empty()).then_some(&self.keyboard)
    }
}

/// Put a one-line notice above an existing screen.
#[must_use]
pub fn with_notice(notice: &str, mut screen: Screen) -> Screen {
    screen.text = format!("{notice}\n\n{}", screen.text);
    screen
}

/// Escape text for Telegram HTML.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// `19.10.2026 14:05`
#[must_use]
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

/// `19.10.2026`
#[must_use]
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%d.%m.%Y").to_string()
}

/// Cut `text` to `max` characters, ending with `…` when shortened.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Number of pages needed for `total` items; never less than one.
#[must_use]
pub fn page_count(total: i64) -> u32 {
    let total = u64::try_from(total).unwrap_or(0);
    let pages = total.div_ceil(u64::from(PAGE_SIZE)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp a requested page to the last existing one.
#[must_use]
pub fn clamp_page(page: u32, total: i64) -> u32 {
    page.min(page_count(total) - 1)
}

/// Row offset of a page.
#[must_use]
pub const fn page_offset(page: u32) -> u32 {
    page.saturating_mul(PAGE_SIZE)
}

/// `◀️  2/5  ▶️` navigation row. Arrows appear only where a page exists.
pub fn pager(page: u32, total: i64, to: impl Fn(u32) -> Callback) -> Vec<Button> {
    let pages = page_count(total);
    if pages <= 1 {
        return Vec::new();
    }
    let mut row = Vec::with_capacity(3);
    if page > 0 {
        row.push(Button::callback("◀️", to(page - 1)));
    }
    row.push(Button::callback(format!("{}/{pages}", page + 1), Callback::Noop));
    if page + 1 < pages {
        row.push(Button::callback("▶️", to(page + 1)));
    }
    row
}

/// Single `⬅️ Back` button row.
pub fn back(to: impl Into<Callback>) -> [Button; 1] {
    [Button::callback("⬅️ Back", to.into())]
}

/// `🏠 Main menu` button row.
#[must_use]
pub fn home() -> [Button; 1] {
    [Button::callback("🏠 Main menu", Callback::Menu)]
}

/// `❌ Cancel` button row.
#[must_use]
pub fn cancel() -> [Button; 1] {
    [Button::callback("❌ Cancel", Callback::Cancel)]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
        assert_eq!(escape("Курсовая"), "Курсовая");
    }

    #[test]
    fn test_format_datetime() {
        let at = Utc.with_ymd_and_hms(2026, 5, 3, 9, 7, 0).unwrap();
        assert_eq!(format_datetime(&at), "03.05.2026 09:07");
        assert_eq!(format_date(&at), "03.05.2026");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 100), "short");
        let long = "a".repeat(150);
        let cut = truncate(&long, 100);
        assert_eq!(cut.chars().count(), 100);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(5), 1);
        assert_eq!(page_count(6), 2);
        assert_eq!(page_count(11), 3);
        assert_eq!(clamp_page(9, 11), 2);
        assert_eq!(page_offset(2), 10);
    }

    #[test]
    fn test_pager() {
        let to = |page| Callback::Admin(crate::handlers::callback::AdminAction::Projects { page });
        assert!(pager(0, 5, to).is_empty());

        let first = pager(0, 12, to);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].text, "1/3");

        let middle = pager(1, 12, to);
        let data: Vec<_> = middle
            .iter()
            .filter_map(|b| b.callback_data.as_deref())
            .collect();
        assert_eq!(data, ["a:pl:0", "noop", "a:pl:2"]);
    }
}
