/// Active world shared across screens.
///
/// The context is an owned handle that gets cloned into whoever needs it.
/// Readers either poll `active()` or hold a `watch::Receiver` from
/// `subscribe()`; the only writer action is `select`/`set`.

use std::sync::Arc;
use tokio::sync::watch;

use super::registry::World;

/// Returned when `select` is given an identifier outside the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown world identifier: {0:?}")]
pub struct UnknownWorld(pub String);

/// Session-lifetime active world
#[derive(Debug, Clone)]
pub struct WorldContext {
    tx: Arc<watch::Sender<World>>,
}

impl WorldContext {
    /// Create a context initialized to the default world
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(World::default());
        Self { tx: Arc::new(tx) }
    }

    /// The currently active world
    pub fn active(&self) -> World {
        *self.tx.borrow()
    }

    /// Select a world by identifier.
    /// Unknown identifiers leave the active world untouched.
    pub fn select(&self, id: &str) -> Result<World, UnknownWorld> {
        let world = World::from_id(id).ok_or_else(|| UnknownWorld(id.to_string()))?;
        self.set(world);
        Ok(world)
    }

    /// Make `world` the active one
    pub fn set(&self, world: World) {
        // send_replace succeeds even when nobody is subscribed
        let previous = self.tx.send_replace(world);
        if previous != world {
            tracing::debug!(from = previous.id(), to = world.id(), "🌍 active world changed");
        }
    }

    /// Subscribe to changes of the active world
    pub fn subscribe(&self) -> watch::Receiver<World> {
        self.tx.subscribe()
    }
}

impl Default for WorldContext {
    fn default() -> Self {
        Self::new()
    }
}
