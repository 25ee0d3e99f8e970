use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use qrmenu_common::{Money, Quantity};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Menu items without a category are listed under this bucket
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------      Restaurant       -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    /// The identity of the owner, as asserted by the identity provider
    pub owner_id: String,
    pub name: String,
    /// Public URL key. Globally unique, and never changes once the restaurant has been created.
    pub slug: String,
    pub city: String,
    pub theme_color: Option<String>,
    pub logo_url: Option<String>,
    pub tagline: Option<String>,
    pub is_accepting_orders: bool,
    pub total_tables: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The settings form for a restaurant. Saving it for the first time creates the restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantSettings {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub theme_color: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default = "default_true")]
    pub is_accepting_orders: bool,
    #[serde(default)]
    pub total_tables: i64,
}

fn default_true() -> bool {
    true
}

impl RestaurantSettings {
    pub fn new<S: Into<String>>(name: S, slug: S) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            city: String::default(),
            theme_color: None,
            logo_url: None,
            tagline: None,
            is_accepting_orders: true,
            total_tables: 0,
        }
    }

    pub fn with_tables(mut self, total_tables: i64) -> Self {
        self.total_tables = total_tables;
        self
    }

    pub fn with_city<S: Into<String>>(mut self, city: S) -> Self {
        self.city = city.into();
        self
    }

    pub fn accepting_orders(mut self, accepting: bool) -> Self {
        self.is_accepting_orders = accepting;
        self
    }
}

/// The subset of restaurant data shown to customers in page headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicBranding {
    pub name: String,
    pub slug: String,
    pub city: String,
    pub theme_color: Option<String>,
    pub logo_url: Option<String>,
    pub tagline: Option<String>,
}

impl From<&Restaurant> for PublicBranding {
    fn from(r: &Restaurant) -> Self {
        Self {
            name: r.name.clone(),
            slug: r.slug.clone(),
            city: r.city.clone(),
            theme_color: r.theme_color.clone(),
            logo_url: r.logo_url.clone(),
            tagline: r.tagline.clone(),
        }
    }
}

//--------------------------------------       MenuItem        -------------------------------------------------------
/// Associates a menu item with an inventory component it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLink {
    pub inventory_item_id: i64,
    pub quantity_required: Quantity,
}

impl RecipeLink {
    pub fn new(inventory_item_id: i64, quantity_required: Quantity) -> Self {
        Self { inventory_item_id, quantity_required }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub price: Money,
    pub category: String,
    pub is_veg: bool,
    pub image_url: Option<String>,
    /// Owner-controlled override. Independent of the computed stock check.
    pub is_available: bool,
    pub recipe: Vec<RecipeLink>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    /// Always overwritten with the owner's restaurant when the item is added
    #[serde(default)]
    pub restaurant_id: i64,
    pub name: String,
    pub price: Money,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub is_veg: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub recipe: Vec<RecipeLink>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl NewMenuItem {
    pub fn new<S: Into<String>>(restaurant_id: i64, name: S, price: Money) -> Self {
        Self {
            restaurant_id,
            name: name.into(),
            price,
            category: DEFAULT_CATEGORY.to_string(),
            is_veg: false,
            image_url: None,
            is_available: true,
            recipe: Vec::new(),
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = normalize_category(category.into());
        self
    }

    pub fn veg(mut self) -> Self {
        self.is_veg = true;
        self
    }

    pub fn with_ingredient(mut self, inventory_item_id: i64, quantity_required: Quantity) -> Self {
        self.recipe.push(RecipeLink::new(inventory_item_id, quantity_required));
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }
}

/// Blank categories fall back to [`DEFAULT_CATEGORY`]
pub fn normalize_category(category: String) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// The editable fields of a menu item. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub is_veg: Option<bool>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

impl MenuItemUpdate {
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(normalize_category(category.into()));
        self
    }

    pub fn with_availability(mut self, is_available: bool) -> Self {
        self.is_available = Some(is_available);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.price.is_none() &&
            self.category.is_none() &&
            self.is_veg.is_none() &&
            self.image_url.is_none() &&
            self.is_available.is_none()
    }
}

//--------------------------------------     InventoryItem     -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub current_stock: Quantity,
    pub unit: String,
    pub cost_per_unit: Money,
    pub low_stock_threshold: Quantity,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.low_stock_threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    #[serde(default)]
    pub restaurant_id: i64,
    pub name: String,
    pub current_stock: Quantity,
    pub unit: String,
    #[serde(default)]
    pub cost_per_unit: Money,
    #[serde(default)]
    pub low_stock_threshold: Quantity,
}

impl NewInventoryItem {
    pub fn new<S: Into<String>>(restaurant_id: i64, name: S, current_stock: Quantity, unit: S) -> Self {
        Self {
            restaurant_id,
            name: name.into(),
            current_stock,
            unit: unit.into(),
            cost_per_unit: Money::default(),
            low_stock_threshold: Quantity::default(),
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: Quantity) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The lifecycle status of an order. See [`crate::lifecycle`] for the legal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and the restaurant has not acted on it yet.
    Pending,
    /// The restaurant has accepted the order.
    Confirmed,
    /// The kitchen is preparing the order.
    Preparing,
    /// The order has left the restaurant.
    OutForDelivery,
    /// The order reached the customer. Terminal.
    Delivered,
    /// The order was cancelled. Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------       OrderType       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Delivery,
    DineIn,
}

impl Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Delivery => write!(f, "DELIVERY"),
            OrderType::DineIn => write!(f, "DINE_IN"),
        }
    }
}

//--------------------------------------     PaymentMethod     -------------------------------------------------------
/// How the customer intends to pay. Only the tag is recorded; no settlement happens here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Card,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Order ids appear in public tracking URLs, so they are random rather than sequential
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Order id cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------       GeoPoint        -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

//--------------------------------------       OrderLine       -------------------------------------------------------
/// One line of the order snapshot, copied from the cart at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl OrderLine {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------         Order         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub restaurant_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    /// The delivery address, or "Table N" for dine-in orders
    pub customer_address: String,
    pub location: Option<GeoPoint>,
    /// Immutable snapshot of the cart at checkout time
    pub order_details: Vec<OrderLine>,
    pub total_amount: Money,
    pub status: OrderStatusType,
    pub payment_method: PaymentMethod,
    pub order_type: OrderType,
    pub table_number: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn item_count(&self) -> i64 {
        self.order_details.iter().fold(0, |acc, l| acc.saturating_add(l.quantity))
    }
}

//--------------------------------------        NewOrder       -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub restaurant_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub location: Option<GeoPoint>,
    pub order_details: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub order_type: OrderType,
    pub table_number: Option<i64>,
}

impl NewOrder {
    /// The order total is always derived from the lines, so the two can never disagree. `None` if it overflows.
    pub fn total_amount(&self) -> Option<Money> {
        Money::checked_sum(self.order_details.iter().map(OrderLine::line_total))
    }

    pub fn is_equivalent(&self, order: &Order) -> bool {
        self.restaurant_id == order.restaurant_id &&
            self.customer_name == order.customer_name &&
            self.customer_phone == order.customer_phone &&
            self.customer_address == order.customer_address &&
            self.order_details == order.order_details &&
            self.total_amount() == Some(order.total_amount) &&
            self.order_type == order.order_type &&
            self.table_number == order.table_number
    }
}

//--------------------------------------         Review        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub restaurant_id: i64,
    pub author_name: String,
    pub rating: i64,
    pub comment: String,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub author_name: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

impl NewReview {
    pub fn is_valid_rating(&self) -> bool {
        (1..=5).contains(&self.rating)
    }
}
