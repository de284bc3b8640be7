use iced::widget::{button, column, text};
use iced::Element;
use iced_aw::Wrap;

use super::pill_style;
use crate::world::World;

/// "Pentaverso:" pills, one per world, plus a debug caption.
/// Pressing a pill emits the world's identifier.
pub fn view<'a, Message, F>(active: World, on_select: F) -> Element<'a, Message>
where
    Message: Clone + 'a,
    F: Fn(String) -> Message,
{
    let pills: Vec<Element<'a, Message>> = World::ALL
        .iter()
        .map(|world| {
            button(text(world.label()).size(13))
                .padding([4, 12])
                .style(pill_style(*world == active))
                .on_press(on_select(world.id().to_string()))
                .into()
        })
        .collect();

    column![
        text("Pentaverso:").size(14),
        Wrap::with_elements(pills).spacing(6.0).line_spacing(6.0),
        text(active.description()).size(12),
        text(format!("active: {}", active.id())).size(11),
    ]
    .spacing(6)
    .into()
}
