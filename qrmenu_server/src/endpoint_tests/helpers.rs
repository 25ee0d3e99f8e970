use actix_web::{
    cookie::Cookie,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{Duration, Utc};
use log::debug;
use qrmenu_engine::db_types::{
    MenuItem,
    Money,
    NewOrder,
    Order,
    OrderId,
    OrderLine,
    OrderStatusType,
    OrderType,
    PaymentMethod,
    Restaurant,
};

use crate::{
    auth::TokenIssuer,
    config::{AuthConfig, ServerOptions},
};

// A signing secret for tests only. DO NOT re-use it anywhere.
const TEST_JWT_SECRET: &str = "endpoint-tests-only-4c1f9b7e2d8a6053e1f7";

pub const OWNER_ID: &str = "owner-spice-garden";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(owner_id: &str, lifetime: Duration) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(owner_id, Some(lifetime)).expect("Failed to sign token")
}

pub fn owner_token() -> String {
    issue_token(OWNER_ID, Duration::hours(1))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cookies: Vec<Cookie<'static>>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().find(|c| c.name() == name)
    }
}

/// Sends `req` to an app holding the test token issuer and whatever `configure` registers. Cookies are not marked
/// `Secure` so that tests can inspect them like a browser on plain HTTP would.
pub async fn send_request<F>(req: TestRequest, token: Option<&str>, configure: F) -> TestResponse
where F: FnOnce(&mut ServiceConfig) {
    let req = match token {
        Some(token) => req.insert_header((header::AUTHORIZATION, format!("Bearer {token}"))),
        None => req,
    };
    let options = ServerOptions { secure_cookies: false, ..Default::default() };
    let app = App::new()
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .app_data(web::Data::new(options))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let cookies = res.response().cookies().map(|c| c.into_owned()).collect();
    let body = test::read_body(res).await;
    TestResponse { status, cookies, body: String::from_utf8_lossy(&body).into_owned() }
}

pub fn restaurant(id: i64, owner_id: &str, slug: &str) -> Restaurant {
    Restaurant {
        id,
        owner_id: owner_id.into(),
        name: "Spice Garden".into(),
        slug: slug.into(),
        city: "Bengaluru".into(),
        theme_color: Some("#c2410c".into()),
        logo_url: None,
        tagline: Some("South Indian breakfasts".into()),
        is_accepting_orders: true,
        total_tables: 12,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn menu_item(id: i64, restaurant_id: i64, name: &str, price: i64, category: &str) -> MenuItem {
    MenuItem {
        id,
        restaurant_id,
        name: name.into(),
        price: Money::from_major(price),
        category: category.into(),
        is_veg: true,
        image_url: None,
        is_available: true,
        recipe: vec![],
        updated_at: Utc::now(),
    }
}

pub fn order(id: &str, restaurant_id: i64, status: OrderStatusType) -> Order {
    Order {
        id: OrderId::from(id),
        restaurant_id,
        customer_name: "Asha".into(),
        customer_phone: "9845012345".into(),
        customer_address: "12 MG Road".into(),
        location: None,
        order_details: vec![OrderLine {
            menu_item_id: 1,
            name: "Masala Dosa".into(),
            unit_price: Money::from_major(90),
            quantity: 2,
        }],
        total_amount: Money::from_major(180),
        status,
        payment_method: PaymentMethod::Cash,
        order_type: OrderType::Delivery,
        table_number: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn with_status(order: &Order, status: OrderStatusType) -> Order {
    Order { status, updated_at: Utc::now(), ..order.clone() }
}

/// The row a backend would store for `order`
pub fn placed_order(id: &str, order: NewOrder) -> Order {
    let total_amount = order.total_amount().unwrap();
    Order {
        id: OrderId::from(id),
        restaurant_id: order.restaurant_id,
        customer_name: order.customer_name,
        customer_phone: order.customer_phone,
        customer_address: order.customer_address,
        location: order.location,
        order_details: order.order_details,
        total_amount,
        status: OrderStatusType::Pending,
        payment_method: order.payment_method,
        order_type: order.order_type,
        table_number: order.table_number,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
