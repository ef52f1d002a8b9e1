//! `owntv://` links used by the launcher row and the command line

use crate::models::Screen;

pub const SCHEME: &str = "owntv://";

/// Where a link points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLink {
    Home,
    /// Player opened on the selected channel with this id
    Player(String),
    Settings,
    Reorder,
}

impl DeepLink {
    pub fn parse(link: &str) -> Option<Self> {
        let rest = link.trim().strip_prefix(SCHEME)?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        match path.trim_end_matches('/') {
            "" | "home" => Some(DeepLink::Home),
            "settings" => Some(DeepLink::Settings),
            "reorder" => Some(DeepLink::Reorder),
            "player" => query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(k, _)| *k == "id")
                .map(|(_, v)| v)
                .filter(|v| !v.is_empty())
                .map(|v| DeepLink::Player(v.to_string())),
            _ => None,
        }
    }

    pub fn screen(&self) -> Screen {
        match self {
            DeepLink::Home => Screen::Home,
            DeepLink::Player(_) => Screen::Player,
            DeepLink::Settings => Screen::Settings,
            DeepLink::Reorder => Screen::Reorder,
        }
    }
}

/// Link that opens the player on `id`
pub fn player_link(id: &str) -> String {
    format!("{}player?id={}", SCHEME, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_link() {
        assert_eq!(
            DeepLink::parse("owntv://player?id=TRT1.tr"),
            Some(DeepLink::Player("TRT1.tr".to_string()))
        );
        assert_eq!(DeepLink::parse(&player_link("a")), Some(DeepLink::Player("a".to_string())));
    }

    #[test]
    fn test_parse_screens() {
        assert_eq!(DeepLink::parse("owntv://"), Some(DeepLink::Home));
        assert_eq!(DeepLink::parse("owntv://home"), Some(DeepLink::Home));
        assert_eq!(DeepLink::parse("owntv://settings/"), Some(DeepLink::Settings));
        assert_eq!(DeepLink::parse("owntv://reorder").map(|l| l.screen()), Some(Screen::Reorder));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(DeepLink::parse("owntv://player"), None);
        assert_eq!(DeepLink::parse("owntv://player?id="), None);
        assert_eq!(DeepLink::parse("owntv://nowhere"), None);
        assert_eq!(DeepLink::parse("http://home"), None);
    }
}
