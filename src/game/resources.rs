use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Resource;

/// Per-resource card counts. Also used for costs and discard selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResourceBundle {
    counts: [u8; Resource::ALL.len()],
}

impl ResourceBundle {
    pub const fn from_counts(counts: [u8; 5]) -> Self {
        Self { counts }
    }

    pub const fn zero() -> Self {
        Self {
            counts: [0; Resource::ALL.len()],
        }
    }

    pub fn single(resource: Resource, amount: u8) -> Self {
        let mut bundle = Self::zero();
        bundle.add(resource, amount);
        bundle
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&v| v as u32).sum()
    }

    pub fn add(&mut self, resource: Resource, amount: u8) {
        let idx = resource_index(resource);
        self.counts[idx] = self.counts[idx].saturating_add(amount);
    }

    pub fn add_bundle(&mut self, other: &ResourceBundle) {
        for (idx, value) in other.counts.iter().enumerate() {
            self.counts[idx] = self.counts[idx].saturating_add(*value);
        }
    }

    pub fn subtract(&mut self, resource: Resource, amount: u8) -> Result<(), ResourceError> {
        let idx = resource_index(resource);
        if self.counts[idx] < amount {
            return Err(ResourceError::InsufficientResource {
                resource,
                available: self.counts[idx],
                requested: amount,
            });
        }
        self.counts[idx] -= amount;
        Ok(())
    }

    /// Removes `other` entirely or not at all.
    pub fn subtract_bundle(&mut self, other: &ResourceBundle) -> Result<(), ResourceError> {
        if let Some((resource, available, requested)) = self.first_shortfall(other) {
            return Err(ResourceError::InsufficientResource {
                resource,
                available,
                requested,
            });
        }
        for (idx, value) in other.counts.iter().enumerate() {
            self.counts[idx] -= *value;
        }
        Ok(())
    }

    pub fn can_afford(&self, other: &ResourceBundle) -> bool {
        self.first_shortfall(other).is_none()
    }

    fn first_shortfall(&self, other: &ResourceBundle) -> Option<(Resource, u8, u8)> {
        self.iter()
            .zip(other.counts.iter().copied())
            .find(|((_, have), need)| have < need)
            .map(|((resource, have), need)| (resource, have, need))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&value| value == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, u8)> + '_ {
        Resource::ALL.into_iter().zip(self.counts.iter().copied())
    }

    /// One entry per card, so a uniform pick is weighted by count.
    pub fn cards(&self) -> Vec<Resource> {
        self.iter()
            .flat_map(|(resource, amount)| std::iter::repeat(resource).take(amount as usize))
            .collect()
    }

    pub fn get(&self, resource: Resource) -> u8 {
        self.counts[resource_index(resource)]
    }
}

impl fmt::Display for ResourceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .filter(|(_, amount)| *amount > 0)
            .map(|(resource, amount)| format!("{amount} {}", resource.to_string().to_lowercase()))
            .collect();
        if parts.is_empty() {
            write!(f, "nothing")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("not enough {resource}: have {available}, need {requested}")]
    InsufficientResource {
        resource: Resource,
        available: u8,
        requested: u8,
    },
}

const fn resource_index(resource: Resource) -> usize {
    match resource {
        Resource::Wood => 0,
        Resource::Brick => 1,
        Resource::Sheep => 2,
        Resource::Wheat => 3,
        Resource::Ore => 4,
    }
}

pub const COST_ROAD: ResourceBundle = ResourceBundle::from_counts([1, 1, 0, 0, 0]);
pub const COST_SETTLEMENT: ResourceBundle = ResourceBundle::from_counts([1, 1, 1, 1, 0]);
pub const COST_CITY: ResourceBundle = ResourceBundle::from_counts([0, 0, 0, 2, 3]);
pub const COST_DEVELOPMENT: ResourceBundle = ResourceBundle::from_counts([0, 0, 1, 1, 1]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtract_bundle_is_all_or_nothing() {
        let mut hand = ResourceBundle::from_counts([1, 0, 1, 1, 0]);
        let err = hand.subtract_bundle(&COST_SETTLEMENT).unwrap_err();
        assert_eq!(
            err,
            ResourceError::InsufficientResource {
                resource: Resource::Brick,
                available: 0,
                requested: 1,
            }
        );
        assert_eq!(hand, ResourceBundle::from_counts([1, 0, 1, 1, 0]));
    }

    #[test]
    fn cards_flatten_by_count() {
        let hand = ResourceBundle::from_counts([2, 0, 0, 1, 0]);
        assert_eq!(
            hand.cards(),
            vec![Resource::Wood, Resource::Wood, Resource::Wheat]
        );
    }

    #[test]
    fn display_lists_non_zero_piles() {
        assert_eq!(COST_CITY.to_string(), "2 wheat, 3 ore");
        assert_eq!(ResourceBundle::zero().to_string(), "nothing");
    }
}
