//! Built-in drink catalog.
//!
//! Amounts are typical servings. Anything logged with a substance ID that is
//! not listed here counts as a manual entry.

use serde::Serialize;

/// A catalog drink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Drink {
    pub id: &'static str,
    pub name: &'static str,
    pub caffeine_mg: f64,
}

/// Every drink the app knows about.
pub const CATALOG: &[Drink] = &[
    Drink {
        id: "espresso",
        name: "Espresso",
        caffeine_mg: 63.0,
    },
    Drink {
        id: "double-espresso",
        name: "Double espresso",
        caffeine_mg: 126.0,
    },
    Drink {
        id: "drip-coffee",
        name: "Drip coffee",
        caffeine_mg: 95.0,
    },
    Drink {
        id: "americano",
        name: "Americano",
        caffeine_mg: 126.0,
    },
    Drink {
        id: "latte",
        name: "Latte",
        caffeine_mg: 126.0,
    },
    Drink {
        id: "cappuccino",
        name: "Cappuccino",
        caffeine_mg: 63.0,
    },
    Drink {
        id: "cold-brew",
        name: "Cold brew",
        caffeine_mg: 200.0,
    },
    Drink {
        id: "black-tea",
        name: "Black tea",
        caffeine_mg: 47.0,
    },
    Drink {
        id: "green-tea",
        name: "Green tea",
        caffeine_mg: 28.0,
    },
    Drink {
        id: "cola",
        name: "Cola",
        caffeine_mg: 34.0,
    },
    Drink {
        id: "energy-drink",
        name: "Energy drink",
        caffeine_mg: 80.0,
    },
    Drink {
        id: "decaf",
        name: "Decaf coffee",
        caffeine_mg: 3.0,
    },
];

/// Substance ID recorded for drinks typed in by hand.
pub const MANUAL_SUBSTANCE_ID: &str = "custom";

/// Looks up a catalog drink by ID.
pub fn lookup(id: &str) -> Option<&'static Drink> {
    CATALOG.iter().find(|d| d.id == id)
}

/// Returns true if the substance ID is a catalog entry.
pub fn is_catalog(id: &str) -> bool {
    lookup(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn catalog_ids_are_unique() {
        let ids: HashSet<_> = CATALOG.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn lookup_finds_drip_coffee() {
        let drink = lookup("drip-coffee").unwrap();
        assert_eq!(drink.name, "Drip coffee");
        assert!((drink.caffeine_mg - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn manual_id_is_not_in_catalog() {
        assert!(!is_catalog(MANUAL_SUBSTANCE_ID));
        assert!(is_catalog("espresso"));
    }
}
