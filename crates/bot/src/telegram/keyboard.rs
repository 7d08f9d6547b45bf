//! Inline keyboard markup builder.

use std::fmt::Display;

use serde::Serialize;

/// An inline keyboard attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    inline_keyboard: Vec<Vec<Button>>,
}

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Button {
    /// A button that sends `data` back as a callback query.
    pub fn callback(text: impl Into<String>, data: impl Display) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.to_string()),
            url: None,
        }
    }

    /// A button that opens a link.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

impl Keyboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons. Empty rows are dropped.
    #[must_use]
    pub fn row(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        let row: Vec<Button> = buttons.into_iter().collect();
        if !row.is_empty() {
            self.inline_keyboard.push(row);
        }
        self
    }

    /// Append a row holding a single callback button.
    #[must_use]
    pub fn button(self, text: impl Into<String>, data: impl Display) -> Self {
        self.row([Button::callback(text, data)])
    }

    /// Lay `buttons` out `per_row` to a row.
    #[must_use]
    pub fn grid(mut self, buttons: impl IntoIterator<Item = Button>, per_row: usize) -> Self {
        let mut row = Vec::with_capacity(per_row);
        for button in buttons {
            row.push(button);
            if row.len() == per_row.max(1) {
                self.inline_keyboard.push(std::mem::take(&mut row));
            }
        }
        if !row.is_empty() {
            self.inline_keyboard.push(row);
        }
        self
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Button>] {
        &self.inline_keyboard
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inline_keyboard.is_empty()
    }

    /// Every callback payload on the keyboard, in reading order.
    pub fn callback_data(&self) -> impl Iterator<Item = &str> {
        self.inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| b.callback_data.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout() {
        let keyboard = Keyboard::new().grid(
            (1..=5).map(|i| Button::callback(format!("{i}⭐"), format!("rate:{i}"))),
            2,
        );
        let sizes: Vec<usize> = keyboard.rows().iter().map(Vec::len).collect();
        assert_eq!(sizes, [2, 2, 1]);
    }

    #[test]
    fn test_serializes_inline_keyboard() {
        let keyboard = Keyboard::new()
            .button("🛍 Catalog", "catalog")
            .row([Button::url("Demo", "https://example.kz/demo")]);
        let json = serde_json::to_value(&keyboard).unwrap_or_default();
        assert_eq!(json["inline_keyboard"][0][0]["callback_data"], "catalog");
        assert_eq!(json["inline_keyboard"][1][0]["url"], "https://example.kz/demo");
        assert!(json["inline_keyboard"][1][0].get("callback_data").is_none());
    }

    #[test]
    fn test_empty_rows_are_dropped() {
        let keyboard = Keyboard::new().row(Vec::new()).button("Back", "menu");
        assert_eq!(keyboard.rows().len(), 1);
        assert_eq!(keyboard.callback_data().collect::<Vec<_>>(), ["menu"]);
    }
}
