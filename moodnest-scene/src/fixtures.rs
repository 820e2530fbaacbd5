//! Registry of instrumented lamp fixtures.
//!
//! Fixtures are addressed by index handles stamped with the registry epoch.
//! Replacing the registry contents (a scene reload) bumps the epoch, so every
//! handle issued for the previous scene stops resolving.

use crate::graph::NodeId;
use crate::material::MaterialId;

/// A classified lamp mesh paired with the one point light it owns.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LampFixture {
    pub mesh: NodeId,
    pub light: NodeId,
    /// Emissive material created for this lamp alone.
    pub material: MaterialId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FixtureHandle {
    index: u32,
    epoch: u32,
}

impl FixtureHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    fixtures: Vec<LampFixture>,
    epoch: u32,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every fixture, invalidating all previously issued handles.
    pub fn replace_all(&mut self, fixtures: Vec<LampFixture>) -> Vec<FixtureHandle> {
        self.epoch = self.epoch.wrapping_add(1);
        self.fixtures = fixtures;
        self.handles()
    }

    /// Drops every fixture and invalidates outstanding handles.
    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    pub fn handles(&self) -> Vec<FixtureHandle> {
        (0..self.fixtures.len())
            .map(|i| FixtureHandle {
                index: i as u32,
                epoch: self.epoch,
            })
            .collect()
    }

    pub fn get(&self, handle: FixtureHandle) -> Option<&LampFixture> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.fixtures.get(handle.index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LampFixture> {
        self.fixtures.iter()
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}
