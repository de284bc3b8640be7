use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Element, Length};

use crate::backend::User;
use crate::shell::{Screen, Shell};

pub fn loading<'a, Message: 'a>() -> Element<'a, Message> {
    container(text("Loading AUREVI...").size(18).style(text::secondary))
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Title of the current screen plus the signed-in user and sign-out
pub fn header<'a, Message: Clone + 'a>(
    screen: Screen,
    user: Option<&'a User>,
    on_sign_out: Message,
) -> Element<'a, Message> {
    let who = user
        .map(|user| user.email.as_deref().unwrap_or(user.id.as_str()))
        .unwrap_or_default();

    row![
        text(screen.title()).size(24),
        Space::with_width(Length::Fill),
        text(who).size(12).style(text::secondary),
        button(text("Sign out").size(12))
            .style(button::secondary)
            .on_press(on_sign_out),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}

/// Screens whose content lives outside this client
pub fn placeholder<'a, Message: 'a>(shell: &'a Shell) -> Element<'a, Message> {
    let screen = shell.current();
    let detail = match screen {
        Screen::Watch => match shell.param_str("videoId") {
            Some(id) => format!("Video {}", id),
            None => "No video selected.".to_string(),
        },
        Screen::MarketDetail => match shell.params().and_then(|p| p.get("item")) {
            Some(item) => item.to_string(),
            None => "No item selected.".to_string(),
        },
        _ => "Coming soon.".to_string(),
    };

    container(
        column![
            text(screen.title()).size(20),
            text(detail).size(14).style(text::secondary),
        ]
        .spacing(8)
        .align_x(Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .center_y(Length::Fill)
    .into()
}
