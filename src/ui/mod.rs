/// User interface components
///
/// Views are plain functions from state to `Element`; none of them hold state
/// except the sign-in form.
/// - `world_switcher`: world pills
/// - `bottom_bar`: main navigation
/// - `create`: the Create screen
/// - `auth`: sign-in gate
/// - `screens`: header, loading indicator and placeholder screens

pub mod auth;
pub mod bottom_bar;
pub mod create;
pub mod screens;
pub mod world_switcher;

use iced::widget::button;
use iced::Theme;

type ButtonStyle = fn(&Theme, button::Status) -> button::Style;

/// Highlighted pill for the selected option, muted otherwise
pub fn pill_style(active: bool) -> ButtonStyle {
    if active {
        button::primary
    } else {
        button::secondary
    }
}
