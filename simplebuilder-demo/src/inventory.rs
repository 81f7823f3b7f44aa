use std::collections::BTreeMap;

use simplebuilder_macros::GenerateBuilder;

#[derive(Debug, Clone, Default, PartialEq, GenerateBuilder)]
pub struct Item {
    pub sku: String,
    pub quantities: BTreeMap<String, u32>,
}

/// Reserves stock for `item`, returning the reservation code.
pub fn reserve(item: &Item) -> u32 {
    internal::Reservation::for_item(item).code
}

// Not reachable from the crate root, so no builder is generated for it.
mod internal {
    use super::Item;

    #[derive(Debug, Default, crate::simple_builder_gen::GenerateBuilder)]
    pub struct Reservation {
        pub code: u32,
    }

    impl Reservation {
        pub fn for_item(item: &Item) -> Self {
            Self {
                code: item.quantities.values().sum(),
            }
        }
    }
}

pub mod pricing {
    use super::Item;

    #[derive(Debug, Clone, PartialEq, crate::simple_builder_gen::GenerateBuilder)]
    pub struct Quote {
        pub item: Item,
        pub unit_price: f64,
    }

    impl Quote {
        pub fn total(&self) -> f64 {
            let count: u32 = self.item.quantities.values().sum();
            f64::from(count) * self.unit_price
        }
    }
}
