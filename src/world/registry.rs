/// Static registry of worlds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five fixed worlds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum World {
    /// Sharing with everyone (default)
    #[default]
    Public,
    Private,
    Family,
    Creative,
    Kids,
}

impl World {
    /// Every world, in the order the switcher renders them
    pub const ALL: &'static [World] = &[
        World::Public,
        World::Private,
        World::Family,
        World::Creative,
        World::Kids,
    ];

    /// Stable identifier used by `WorldContext::select`
    pub fn id(self) -> &'static str {
        match self {
            World::Public => "public",
            World::Private => "private",
            World::Family => "family",
            World::Creative => "creative",
            World::Kids => "kids",
        }
    }

    /// Look up a world by identifier
    pub fn from_id(id: &str) -> Option<World> {
        World::ALL.iter().copied().find(|world| world.id() == id)
    }

    /// Label shown on the switcher pill
    pub fn label(self) -> &'static str {
        match self {
            World::Public => "Public world",
            World::Private => "Private world",
            World::Family => "Family world",
            World::Creative => "Creative world",
            World::Kids => "Kids world",
        }
    }

    /// Short description for cards and tooltips
    pub fn description(self) -> &'static str {
        match self {
            World::Public => "A space to share with the world.",
            World::Private => "Personal notes and intimate projects.",
            World::Family => "Moments with family and close friends.",
            World::Creative => "Ideas, music and creative projects.",
            World::Kids => "A gentle, safe zone for content.",
        }
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
