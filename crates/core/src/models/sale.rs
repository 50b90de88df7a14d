use super::sold_item::SoldItem;

/// The sale currently being rung up at the till, before checkout.
#[derive(Debug, Clone, Default)]
pub struct Sale {
    /// Items added so far, in entry order.
    pub items: Vec<SoldItem>,
}

impl Sale {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.price)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
