use std::fmt::Display;

use qrmenu_engine::{
    db_types::{GeoPoint, Money, OrderId, OrderStatusType, PaymentMethod, Quantity},
    lifecycle::OwnerAction,
    storefront::{CartRequestLine, CheckoutDetails, CheckoutReceipt},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The `?table=N` parameter that a table's QR code adds to the menu URL
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TableQuery {
    pub table: Option<i64>,
}

/// The checkout form. Only item ids and quantities are taken from the client; prices come from the current menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    pub items: Vec<CartRequestLine>,
}

impl CheckoutRequest {
    /// The location is only used when both coordinates were sent
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    pub fn into_details(self, table_number: Option<i64>) -> CheckoutDetails {
        let location = self.location();
        let payment_method = self.payment_method.unwrap_or_default();
        CheckoutDetails::new(self.customer_name, self.customer_phone, table_number, self.customer_address, location)
            .with_payment_method(payment_method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub tracking_path: String,
    pub total_amount: Money,
}

impl From<CheckoutReceipt> for CheckoutResponse {
    fn from(receipt: CheckoutReceipt) -> Self {
        Self {
            order_id: receipt.order.id,
            tracking_path: receipt.tracking_path,
            total_amount: receipt.order.total_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOrderResponse {
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: OwnerAction,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockRequest {
    /// In thousandths of the item's unit
    pub current_stock: Quantity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub is_visible: bool,
}
