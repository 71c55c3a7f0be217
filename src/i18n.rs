//! Localized strings and month names.

use serde::Deserialize;

/// Language used for every user-visible string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

/// User-visible strings for one locale.
///
/// Values are markup fragments: they are embedded as-is and must already be valid HTML.
#[derive(Debug)]
pub struct Strings {
    pub banner_title: &'static str,
    pub getting_info: &'static str,
    pub no_user: &'static str,
    pub error: &'static str,
    pub name: &'static str,
    pub username: &'static str,
    pub id: &'static str,
    pub created: &'static str,
    pub unknown: &'static str,
    pub usage_title: &'static str,
    pub usage_self: &'static str,
    pub usage_username: &'static str,
    pub usage_id: &'static str,
    pub usage_reply: &'static str,
    pub id_description: &'static str,
    pub help_title: &'static str,
    pub help_description: &'static str,
    pub help_unknown_command: &'static str,
}

static EN: Strings = Strings {
    banner_title: "Success",
    getting_info: "🔎 <b>Getting information...</b>",
    no_user: "⚠️ <b>User not found.</b>",
    error: "😵 <b>An error occurred:</b>",
    name: "Name:",
    username: "Username:",
    id: "ID:",
    created: "Creation date (approximate):",
    unknown: "Unknown",
    usage_title: "Usage:",
    usage_self: "information about yourself",
    usage_username: "information about a user by username",
    usage_id: "information by id",
    usage_reply: "(as a reply) information about the replied user",
    id_description: "Show the id and information about a user",
    help_title: "Commands:",
    help_description: "List commands or show the usage of one",
    help_unknown_command: "⚠️ <b>Unknown command.</b>",
};

static RU: Strings = Strings {
    banner_title: "Успех",
    getting_info: "🔎 <b>Получаю информацию...</b>",
    no_user: "⚠️ <b>Пользователь не найден.</b>",
    error: "😵 <b>Произошла ошибка:</b>",
    name: "Имя:",
    username: "Юзернейм:",
    id: "Айди:",
    created: "Дата (приблизительная) создания:",
    unknown: "Неизвестно",
    usage_title: "Использование:",
    usage_self: "информация о себе",
    usage_username: "информация о пользователе по юзернейму",
    usage_id: "информация по id",
    usage_reply: "(в ответ на сообщение) информация о том, на кого отвечают",
    id_description: "Показать id и информацию о пользователе",
    help_title: "Команды:",
    help_description: "Список команд или справка по одной из них",
    help_unknown_command: "⚠️ <b>Неизвестная команда.</b>",
};

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// Genitive case, as used after a day number.
const MONTHS_RU: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

impl Locale {
    /// String table for this locale
    #[must_use]
    pub const fn strings(self) -> &'static Strings {
        match self {
            Self::En => &EN,
            Self::Ru => &RU,
        }
    }

    /// Month name for a 1-based month number, `None` outside `1..=12`.
    #[must_use]
    pub fn month_name(self, month: u32) -> Option<&'static str> {
        let table = match self {
            Self::En => &MONTHS_EN,
            Self::Ru => &MONTHS_RU,
        };
        let index = usize::try_from(month.checked_sub(1)?).ok()?;
        table.get(index).copied()
    }
}
