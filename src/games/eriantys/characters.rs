//! Character card catalog.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::engine::action::CharacterCardStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterKind {
    /// Two extra mother nature steps this turn.
    Courier,
    /// Puts a no-entry tile on an island.
    Herbalist,
    /// One colour counts for nobody in this turn's influence.
    MushroomSeller,
}

#[derive(Debug, Clone, Copy)]
pub struct CharacterSpec {
    pub kind: CharacterKind,
    pub name: &'static str,
    pub cost: usize,
    /// Follow-up step the card waits for, if any.
    pub step: Option<CharacterCardStep>,
}

pub static CATALOG: Lazy<Vec<CharacterSpec>> = Lazy::new(|| {
    vec![
        CharacterSpec {
            kind: CharacterKind::Courier,
            name: "Courier",
            cost: 1,
            step: None,
        },
        CharacterSpec {
            kind: CharacterKind::Herbalist,
            name: "Herbalist",
            cost: 2,
            step: Some(CharacterCardStep::PlaceNoEntryTile),
        },
        CharacterSpec {
            kind: CharacterKind::MushroomSeller,
            name: "Mushroom Seller",
            cost: 3,
            step: Some(CharacterCardStep::ExcludeColor),
        },
    ]
});

pub fn spec(kind: CharacterKind) -> &'static CharacterSpec {
    let index = match kind {
        CharacterKind::Courier => 0,
        CharacterKind::Herbalist => 1,
        CharacterKind::MushroomSeller => 2,
    };
    &CATALOG[index]
}

/// A character card on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCard {
    pub kind: CharacterKind,
    /// A coin is left on the card the first time it is used, raising its cost.
    pub coin_on_card: bool,
    /// Herbalist only.
    pub no_entry_tiles: usize,
}

impl CharacterCard {
    pub fn new(kind: CharacterKind, no_entry_tiles: usize) -> Self {
        Self {
            kind,
            coin_on_card: false,
            no_entry_tiles: if kind == CharacterKind::Herbalist {
                no_entry_tiles
            } else {
                0
            },
        }
    }

    pub fn cost(&self) -> usize {
        spec(self.kind).cost + usize::from(self.coin_on_card)
    }

    pub fn step(&self) -> Option<CharacterCardStep> {
        spec(self.kind).step
    }

    pub fn accepts(&self, step: CharacterCardStep) -> bool {
        self.step() == Some(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_rises_after_first_use() {
        let mut card = CharacterCard::new(CharacterKind::Herbalist, 4);
        assert_eq!(card.cost(), 2);
        card.coin_on_card = true;
        assert_eq!(card.cost(), 3);
        assert_eq!(card.no_entry_tiles, 4);
    }

    #[test]
    fn test_steps() {
        let courier = CharacterCard::new(CharacterKind::Courier, 4);
        assert_eq!(courier.no_entry_tiles, 0);
        assert!(!courier.accepts(CharacterCardStep::PlaceNoEntryTile));
        let seller = CharacterCard::new(CharacterKind::MushroomSeller, 0);
        assert!(seller.accepts(CharacterCardStep::ExcludeColor));
    }
}
