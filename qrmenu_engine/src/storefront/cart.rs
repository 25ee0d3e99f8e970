use serde::{Deserialize, Serialize};

use crate::db_types::{MenuItem, Money, OrderLine};

/// The most portions of a single dish that one order may carry
pub const MAX_LINE_QUANTITY: i64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl CartLine {
    /// `None` if the line total does not fit in a `Money`
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        OrderLine {
            menu_item_id: line.menu_item_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// A customer's cart. One line per menu item, kept in the order items were first added.
///
/// Totals are computed from the lines on every call; nothing is cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one portion of `item`. Returns the new quantity of that line.
    pub fn add_to_cart(&mut self, item: &MenuItem) -> i64 {
        match self.lines.iter_mut().find(|l| l.menu_item_id == item.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                line.quantity
            },
            None => {
                self.lines.push(CartLine {
                    menu_item_id: item.id,
                    name: item.name.clone(),
                    unit_price: item.price,
                    quantity: 1,
                });
                1
            },
        }
    }

    /// Sets the quantity of a line. Zero or less removes it. Unknown items are ignored.
    pub fn update_quantity(&mut self, menu_item_id: i64, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(menu_item_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.menu_item_id == menu_item_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove_from_cart(&mut self, menu_item_id: i64) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.menu_item_id != menu_item_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn quantity_of(&self, menu_item_id: i64) -> i64 {
        self.lines.iter().find(|l| l.menu_item_id == menu_item_id).map(|l| l.quantity).unwrap_or(0)
    }

    /// The cart total, or `None` if it overflows.
    pub fn total(&self) -> Option<Money> {
        Money::checked_sum(self.lines.iter().map(CartLine::line_total))
    }

    pub fn item_count(&self) -> i64 {
        self.lines.iter().fold(0, |acc, l| acc.saturating_add(l.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// A deep copy of the lines, to be stored on the order
    pub fn snapshot(&self) -> Vec<OrderLine> {
        self.lines.iter().map(OrderLine::from).collect()
    }
}
