#![forbid(unsafe_code)]

use std::collections::HashMap;

use tracing::warn;

use crate::error::SlotError;
use crate::slot::{Slot, SlotId};
use crate::tag::{TagDomain, TagSet};

/// Registry of annotated declaration sites for one analysis unit.
///
/// Slots are immutable once registered. A slot whose contract fails the
/// registration precondition is still recorded, with an empty required set,
/// so every later lookup treats it as unconstrained.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: HashMap<SlotId, Slot>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_slot(&mut self, mut slot: Slot) -> Result<(), SlotError> {
        if self.slots.contains_key(&slot.id) {
            warn!(slot = %slot.id, "duplicate slot registration ignored");
            return Err(SlotError::Duplicate { slot: slot.id });
        }

        let conflict = mixed_domains(&slot.required);
        if let Some((resource, numeric)) = conflict.clone() {
            warn!(slot = %slot.id, %resource, %numeric, "slot mixes tag domains");
            slot.required = TagSet::new();
        }

        let id = slot.id.clone();
        self.slots.insert(id.clone(), slot);

        match conflict {
            Some((resource, numeric)) => Err(SlotError::MixedDomains {
                slot: id,
                resource,
                numeric,
            }),
            None => Ok(()),
        }
    }

    /// Registers every slot, collecting the failures instead of stopping at the first.
    pub fn register_all(&mut self, slots: impl IntoIterator<Item = Slot>) -> Vec<SlotError> {
        slots
            .into_iter()
            .filter_map(|slot| self.register_slot(slot).err())
            .collect()
    }

    pub fn lookup(&self, id: &SlotId) -> Option<&TagSet> {
        self.slots.get(id).map(|s| &s.required)
    }

    pub fn slot(&self, id: &SlotId) -> Option<&Slot> {
        self.slots.get(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn mixed_domains(required: &TagSet) -> Option<(String, String)> {
    let resource = required.iter().find(|t| t.domain() == TagDomain::Resource)?;
    let numeric = required.iter().find(|t| t.domain() == TagDomain::Numeric)?;
    Some((resource.display(), numeric.display()))
}
