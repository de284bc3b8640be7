use iced::widget::{button, column, container, row, text};
use iced::{Alignment, Element, Length};

use super::pill_style;
use crate::shell::Screen;

/// One entry of the bottom navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarItem {
    pub screen: Screen,
    pub label: &'static str,
    pub icon: &'static str,
}

pub const ITEMS: &[BarItem] = &[
    BarItem { screen: Screen::Home, label: "Home", icon: "🏠" },
    BarItem { screen: Screen::Explore, label: "Explore", icon: "🔍" },
    BarItem { screen: Screen::Create, label: "Create", icon: "➕" },
    BarItem { screen: Screen::Market, label: "Market", icon: "🛒" },
    BarItem { screen: Screen::Wallet, label: "Coins", icon: "🪙" },
    BarItem { screen: Screen::Notifications, label: "Alerts", icon: "🔔" },
    BarItem { screen: Screen::Messages, label: "Messages", icon: "💬" },
    BarItem { screen: Screen::Profile, label: "Profile", icon: "👤" },
];

pub fn view<'a, Message, F>(current: Screen, on_select: F) -> Element<'a, Message>
where
    Message: Clone + 'a,
    F: Fn(String) -> Message,
{
    let items = ITEMS.iter().map(|item| {
        let content = column![text(item.icon).size(16), text(item.label).size(11)]
            .spacing(2)
            .align_x(Alignment::Center);

        button(content)
            .padding([6, 10])
            .style(pill_style(item.screen == current))
            .on_press(on_select(item.screen.id().to_string()))
            .into()
    });

    container(row(items).spacing(4).align_y(Alignment::Center))
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding(8)
        .into()
}
