/// The "Create" screen
///
/// - `draft`: form fields, modes and the duet sub-session
/// - `flow`: the state machine driving the draft
/// - `submit`: upload, insert and analysis pipeline
/// - `mission`: personal-mission fetch
/// - `screen`: a mounted screen running the flow's effects

pub mod draft;
pub mod error;
pub mod flow;
pub mod mission;
pub mod screen;
pub mod submit;

pub use flow::{CreateEvent, CreateFlow};
pub use screen::{CreateScreen, Services};
