/// Worlds: named content-scoping contexts the user switches between
///
/// This module holds:
/// - The closed registry of worlds with labels and descriptions (registry.rs)
/// - The session-lifetime active world shared by every screen (context.rs)

pub mod registry;
pub mod context;

pub use context::WorldContext;
pub use registry::World;
