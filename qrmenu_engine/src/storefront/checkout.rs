//! Checkout: turning a cart into an order
//!
//! Submission is a single insert of one order row, whose line items are a deep copy of the cart. Menu items can be
//! edited freely afterwards without changing what the order says was bought or what it cost.
//!
//! On success the cart is emptied and the customer's active-order pointer is set. On failure nothing is written and
//! the cart is left exactly as it was, so the customer can fix the problem and try again.
use std::{collections::HashMap, fmt::Debug};

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    api::{errors::CheckoutError, menu_api::validate_table, order_flow_api::OrderFlowApi},
    availability::{is_purchasable, InventorySnapshot},
    db::traits::{MenuManagement, OrderManagement},
    db_types::{GeoPoint, NewOrder, Order, OrderId, OrderType, PaymentMethod, Restaurant},
    events::EventProducers,
    live::ActiveOrderStore,
    storefront::{Cart, MAX_LINE_QUANTITY},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fulfilment {
    Delivery { address: String, location: Option<GeoPoint> },
    DineIn { table_number: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub customer_name: String,
    pub customer_phone: String,
    pub fulfilment: Fulfilment,
    pub payment_method: PaymentMethod,
}

impl CheckoutDetails {
    /// A table number (from the QR code) makes this a dine-in order; the address and location are then ignored.
    pub fn new<S: Into<String>>(
        customer_name: S,
        customer_phone: S,
        table_number: Option<i64>,
        address: Option<String>,
        location: Option<GeoPoint>,
    ) -> Self {
        let fulfilment = match table_number {
            Some(table_number) => Fulfilment::DineIn { table_number },
            None => Fulfilment::Delivery { address: address.unwrap_or_default(), location },
        };
        Self {
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
            fulfilment,
            payment_method: PaymentMethod::default(),
        }
    }

    pub fn with_payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    pub fn order_type(&self) -> OrderType {
        match self.fulfilment {
            Fulfilment::Delivery { .. } => OrderType::Delivery,
            Fulfilment::DineIn { .. } => OrderType::DineIn,
        }
    }
}

/// What the customer sees after a successful checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub tracking_path: String,
}

/// A line of a checkout request. Prices are never taken from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRequestLine {
    pub menu_item_id: i64,
    pub quantity: i64,
}

pub fn tracking_path(order_id: &OrderId) -> String {
    format!("/order-success/{}", order_id.as_str())
}

/// Checks the form and the cart. This does not touch storage.
pub fn validate(details: &CheckoutDetails, cart: &Cart, restaurant: &Restaurant) -> Result<(), CheckoutError> {
    if details.customer_name.trim().is_empty() {
        return Err(CheckoutError::Validation("Please enter your name".into()));
    }
    if details.customer_phone.trim().is_empty() {
        return Err(CheckoutError::Validation("Please enter your phone number".into()));
    }
    match &details.fulfilment {
        Fulfilment::Delivery { address, location } => {
            if address.trim().is_empty() {
                return Err(CheckoutError::Validation("Please enter a delivery address".into()));
            }
            if matches!(location, Some(p) if !p.is_valid()) {
                return Err(CheckoutError::Validation("The delivery location is not a valid coordinate".into()));
            }
        },
        Fulfilment::DineIn { table_number } => {
            if !validate_table(restaurant, *table_number) {
                return Err(CheckoutError::InvalidTable(*table_number));
            }
        },
    }
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    validate_cart(cart)?;
    if !restaurant.is_accepting_orders {
        return Err(CheckoutError::NotAcceptingOrders(restaurant.name.clone()));
    }
    Ok(())
}

/// Every line must be within the per-line cap and the order total must be representable.
pub fn validate_cart(cart: &Cart) -> Result<(), CheckoutError> {
    if let Some(line) = cart.lines().iter().find(|l| l.quantity > MAX_LINE_QUANTITY) {
        return Err(too_many(&line.name));
    }
    if cart.total().is_none() {
        return Err(CheckoutError::Validation("The order total is too large".into()));
    }
    Ok(())
}

fn too_many(name: &str) -> CheckoutError {
    CheckoutError::Validation(format!("At most {MAX_LINE_QUANTITY} portions of {name} can be ordered at once"))
}

/// Builds the order row. Dine-in orders use the table label as their address and carry no location.
pub fn build_new_order(restaurant: &Restaurant, cart: &Cart, details: CheckoutDetails) -> NewOrder {
    let order_type = details.order_type();
    let (customer_address, location, table_number) = match details.fulfilment {
        Fulfilment::Delivery { address, location } => (address.trim().to_string(), location, None),
        Fulfilment::DineIn { table_number } => (format!("Table {table_number}"), None, Some(table_number)),
    };
    NewOrder {
        restaurant_id: restaurant.id,
        customer_name: details.customer_name.trim().to_string(),
        customer_phone: details.customer_phone.trim().to_string(),
        customer_address,
        location,
        order_details: cart.snapshot(),
        payment_method: details.payment_method,
        order_type,
        table_number,
    }
}

#[derive(Clone)]
pub struct CheckoutApi<B> {
    flow: OrderFlowApi<B>,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { flow: OrderFlowApi::new(db, producers) }
    }
}

impl<B> CheckoutApi<B>
where B: OrderManagement + MenuManagement
{
    /// Builds a cart from item ids and quantities, priced from the current menu.
    pub async fn price_cart(&self, restaurant_id: i64, request: &[CartRequestLine]) -> Result<Cart, CheckoutError> {
        let menu = self.flow.db().fetch_menu_for_restaurant(restaurant_id, false).await?;
        let menu = menu.into_iter().map(|i| (i.id, i)).collect::<HashMap<_, _>>();
        let mut cart = Cart::new();
        for line in request {
            if line.quantity <= 0 {
                return Err(CheckoutError::Validation(format!("Quantities must be positive, not {}", line.quantity)));
            }
            let item = menu.get(&line.menu_item_id).ok_or(CheckoutError::UnknownMenuItem(line.menu_item_id))?;
            let quantity = cart
                .quantity_of(item.id)
                .checked_add(line.quantity)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or_else(|| too_many(&item.name))?;
            cart.add_to_cart(item);
            cart.update_quantity(item.id, quantity);
        }
        validate_cart(&cart)?;
        Ok(cart)
    }

    /// Places the order. See the module documentation for what happens on success and on failure.
    pub async fn submit<S>(
        &self,
        restaurant: &Restaurant,
        cart: &mut Cart,
        details: CheckoutDetails,
        active_order: &S,
    ) -> Result<CheckoutReceipt, CheckoutError>
    where
        S: ActiveOrderStore + ?Sized,
    {
        validate(&details, cart, restaurant)?;
        self.check_purchasable(restaurant.id, cart).await?;
        let new_order = build_new_order(restaurant, cart, details);
        let order = self.flow.place_order(new_order).await.map_err(|e| {
            warn!("🛒 Checkout at '{}' failed. The cart has been kept. {e}", restaurant.slug);
            CheckoutError::from(e)
        })?;
        active_order.set(order.id.clone());
        cart.clear();
        let tracking_path = tracking_path(&order.id);
        info!("🛒 Checkout complete at '{}'. Tracking at {tracking_path}", restaurant.slug);
        Ok(CheckoutReceipt { order, tracking_path })
    }

    async fn check_purchasable(&self, restaurant_id: i64, cart: &Cart) -> Result<(), CheckoutError> {
        let db = self.flow.db();
        let menu = db.fetch_menu_for_restaurant(restaurant_id, false).await?;
        let snapshot = db.fetch_inventory_for_restaurant(restaurant_id).await?.iter().collect::<InventorySnapshot>();
        for line in cart.lines() {
            let item = menu
                .iter()
                .find(|i| i.id == line.menu_item_id)
                .ok_or(CheckoutError::UnknownMenuItem(line.menu_item_id))?;
            if !is_purchasable(item, &snapshot) {
                debug!("🛒 {} can no longer be ordered", item.name);
                return Err(CheckoutError::ItemUnavailable(item.name.clone()));
            }
        }
        Ok(())
    }
}
