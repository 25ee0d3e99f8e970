use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use qrmenu_engine::{
    db_types::{InventoryItem, Money, Quantity, Review},
    GatewayError,
    MenuApi,
    RestaurantApi,
};
use serde_json::json;

use super::{
    helpers::{menu_item, owner_token, restaurant, send_request, OWNER_ID},
    mocks::MockStorefront,
};
use crate::routes::{
    AddMenuItemRoute,
    InventoryStockRoute,
    MenuAvailabilityRoute,
    MyRestaurantRoute,
    ReviewVisibilityRoute,
    SaveRestaurantRoute,
};

fn configure(menu: MockStorefront, restaurants: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(MenuApi::new(menu)))
            .app_data(web::Data::new(RestaurantApi::new(restaurants)))
            .service(MyRestaurantRoute::<MockStorefront>::new())
            .service(SaveRestaurantRoute::<MockStorefront>::new())
            .service(ReviewVisibilityRoute::<MockStorefront>::new())
            .service(AddMenuItemRoute::<MockStorefront>::new())
            .service(MenuAvailabilityRoute::<MockStorefront>::new())
            .service(InventoryStockRoute::<MockStorefront>::new());
    }
}

fn existing_restaurant() -> MockStorefront {
    let mut db = MockStorefront::new();
    db.expect_fetch_restaurant_for_owner().returning(|owner| Ok(Some(restaurant(3, owner, "spice-garden"))));
    db
}

fn settings(slug: &str) -> serde_json::Value {
    json!({ "name": "Spice Garden", "slug": slug, "city": "Bengaluru", "total_tables": 12 })
}

#[actix_web::test]
async fn first_save_creates_the_restaurant() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_fetch_restaurant_for_owner().returning(|_| Ok(None));
    db.expect_upsert_restaurant().withf(|owner, s| owner == OWNER_ID && s.slug == "spice-garden").times(1).returning(
        |owner, s| {
            let mut r = restaurant(3, owner, &s.slug);
            r.total_tables = s.total_tables;
            Ok(r)
        },
    );
    let req = TestRequest::put().uri("/api/restaurant").set_json(settings("spice-garden"));
    let res = send_request(req, Some(&owner_token()), configure(MockStorefront::new(), db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["slug"], "spice-garden");
    assert_eq!(res.json()["is_accepting_orders"], true);
}

#[actix_web::test]
async fn the_slug_is_fixed_once_published() {
    let _ = env_logger::try_init().ok();
    let mut db = existing_restaurant();
    db.expect_upsert_restaurant().never();
    let req = TestRequest::put().uri("/api/restaurant").set_json(settings("spice-garden-2"));
    let res = send_request(req, Some(&owner_token()), configure(MockStorefront::new(), db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn the_slug_must_be_unique() {
    let _ = env_logger::try_init().ok();
    let mut db = MockStorefront::new();
    db.expect_fetch_restaurant_for_owner().returning(|_| Ok(None));
    db.expect_upsert_restaurant().returning(|_, _| Err(GatewayError::Duplicate("restaurants.slug".into())));
    let req = TestRequest::put().uri("/api/restaurant").set_json(settings("spice-garden"));
    let res = send_request(req, Some(&owner_token()), configure(MockStorefront::new(), db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn invalid_slug() {
    let _ = env_logger::try_init().ok();
    let mut db = existing_restaurant();
    db.expect_upsert_restaurant().never();
    let req = TestRequest::put().uri("/api/restaurant").set_json(settings("Spice Garden!"));
    let res = send_request(req, Some(&owner_token()), configure(MockStorefront::new(), db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn settings_need_a_token() {
    let _ = env_logger::try_init().ok();
    let res = send_request(
        TestRequest::get().uri("/api/restaurant"),
        None,
        configure(MockStorefront::new(), existing_restaurant()),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    let res = send_request(
        TestRequest::get().uri("/api/restaurant"),
        Some(&owner_token()),
        configure(MockStorefront::new(), existing_restaurant()),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["owner_id"], OWNER_ID);
}

#[actix_web::test]
async fn approve_a_review() {
    let _ = env_logger::try_init().ok();
    let mut db = existing_restaurant();
    let review = |restaurant_id, is_visible| Review {
        id: 11,
        restaurant_id,
        author_name: "Meera".into(),
        rating: 4,
        comment: String::new(),
        is_visible,
        created_at: Utc::now(),
    };
    db.expect_fetch_review().returning(move |id| Ok(Some(review(if id == 11 { 3 } else { 9 }, false))));
    db.expect_set_review_visibility()
        .withf(|id, visible| *id == 11 && *visible)
        .times(1)
        .returning(move |_, visible| Ok(Some(review(3, visible))));
    let req = TestRequest::patch().uri("/api/reviews/11/visibility").set_json(json!({ "is_visible": true }));
    let res = send_request(req, Some(&owner_token()), configure(MockStorefront::new(), db)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["is_visible"], true);
}

#[actix_web::test]
async fn add_a_menu_item() {
    let _ = env_logger::try_init().ok();
    let mut menu = MockStorefront::new();
    menu.expect_insert_menu_item()
        .withf(|item| item.restaurant_id == 3 && item.name == "Rava Dosa" && item.category == "Breakfast")
        .times(1)
        .returning(|item| Ok(menu_item(4, item.restaurant_id, &item.name, 110, &item.category)));
    // The client cannot pick the restaurant
    let body =
        json!({ "restaurant_id": 9, "name": "Rava Dosa", "price": Money::from_major(110), "category": "Breakfast" });
    let req = TestRequest::post().uri("/api/menu").set_json(body);
    let res = send_request(req, Some(&owner_token()), configure(menu, existing_restaurant())).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["restaurant_id"], 3);
}

#[actix_web::test]
async fn menu_items_need_a_positive_price() {
    let _ = env_logger::try_init().ok();
    let mut menu = MockStorefront::new();
    menu.expect_insert_menu_item().never();
    let req = TestRequest::post().uri("/api/menu").set_json(json!({ "name": "Free Dosa", "price": 0 }));
    let res = send_request(req, Some(&owner_token()), configure(menu, existing_restaurant())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn switch_off_another_restaurants_item() {
    let _ = env_logger::try_init().ok();
    let mut menu = MockStorefront::new();
    menu.expect_fetch_menu_item().returning(|id| Ok(Some(menu_item(id, 9, "Biryani", 250, "Mains"))));
    menu.expect_update_menu_item().never();
    let req = TestRequest::patch().uri("/api/menu/5/availability").set_json(json!({ "is_available": false }));
    let res = send_request(req, Some(&owner_token()), configure(menu, existing_restaurant())).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn switch_off_a_menu_item() {
    let _ = env_logger::try_init().ok();
    let mut menu = MockStorefront::new();
    menu.expect_fetch_menu_item().returning(|id| Ok(Some(menu_item(id, 3, "Masala Dosa", 90, "Breakfast"))));
    menu.expect_update_menu_item()
        .withf(|id, update| *id == 1 && update.is_available == Some(false))
        .times(1)
        .returning(|id, _| {
            let mut item = menu_item(id, 3, "Masala Dosa", 90, "Breakfast");
            item.is_available = false;
            Ok(Some(item))
        });
    let req = TestRequest::patch().uri("/api/menu/1/availability").set_json(json!({ "is_available": false }));
    let res = send_request(req, Some(&owner_token()), configure(menu, existing_restaurant())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["is_available"], false);
}

fn inventory_item(id: i64, restaurant_id: i64, current_stock: Quantity) -> InventoryItem {
    InventoryItem {
        id,
        restaurant_id,
        name: "Dosa batter".into(),
        current_stock,
        unit: "kg".into(),
        cost_per_unit: Money::from_major(60),
        low_stock_threshold: Quantity::from_units(2),
        updated_at: Utc::now(),
    }
}

#[actix_web::test]
async fn restock_an_inventory_item() {
    let _ = env_logger::try_init().ok();
    let mut menu = MockStorefront::new();
    menu.expect_fetch_inventory_item().returning(|id| Ok(Some(inventory_item(id, 3, Quantity::default()))));
    menu.expect_update_inventory_stock()
        .withf(|id, stock| *id == 7 && *stock == Quantity::from_units(5))
        .times(1)
        .returning(|id, stock| Ok(Some(inventory_item(id, 3, stock))));
    let req = TestRequest::patch()
        .uri("/api/inventory/7/stock")
        .set_json(json!({ "current_stock": Quantity::from_units(5) }));
    let res = send_request(req, Some(&owner_token()), configure(menu, existing_restaurant())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["current_stock"], json!(Quantity::from_units(5)));
}

#[actix_web::test]
async fn stock_cannot_go_negative() {
    let _ = env_logger::try_init().ok();
    let mut menu = MockStorefront::new();
    menu.expect_update_inventory_stock().never();
    let req = TestRequest::patch()
        .uri("/api/inventory/7/stock")
        .set_json(json!({ "current_stock": Quantity::from_units(-1) }));
    let res = send_request(req, Some(&owner_token()), configure(menu, existing_restaurant())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
