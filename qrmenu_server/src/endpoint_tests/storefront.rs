use actix_web::{cookie::Cookie, http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use qrmenu_engine::{
    db_types::{Money, OrderStatusType, OrderType, PaymentMethod, Review},
    events::{ChangeFeed, EventProducers},
    CheckoutApi,
    GatewayError,
    MenuApi,
    OrderFlowApi,
    RestaurantApi,
};
use serde_json::json;

use super::{
    helpers::{menu_item, order, placed_order, restaurant, send_request, OWNER_ID},
    mocks::MockStorefront,
};
use crate::{
    helpers::ACTIVE_ORDER_COOKIE,
    routes::{
        active_order,
        health,
        CheckoutRoute,
        OrderSuccessLiveRoute,
        OrderSuccessRoute,
        PublicMenuRoute,
        SubmitReviewRoute,
    },
};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let res = send_request(TestRequest::get().uri("/health"), None, |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "👍️\n");
}

//----------------------------------------------   Menu  ----------------------------------------------------

fn configure_menu(db: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(MenuApi::new(db))).service(PublicMenuRoute::<MockStorefront>::new());
    }
}

fn menu_backend() -> MockStorefront {
    let mut db = MockStorefront::new();
    db.expect_fetch_restaurant_by_slug().returning(|slug| match slug {
        "spice-garden" => Ok(Some(restaurant(3, OWNER_ID, "spice-garden"))),
        _ => Ok(None),
    });
    db.expect_fetch_inventory_for_restaurant().returning(|_| Ok(vec![]));
    db.expect_fetch_menu_for_restaurant().withf(|id, only_available| *id == 3 && *only_available).returning(|_, _| {
        Ok(vec![
            menu_item(1, 3, "Masala Dosa", 90, "Breakfast"),
            menu_item(2, 3, "Filter Coffee", 30, "Drinks"),
            menu_item(3, 3, "Idli", 40, "Breakfast"),
        ])
    });
    db.expect_fetch_visible_reviews().returning(|_| {
        Ok(vec![Review {
            id: 1,
            restaurant_id: 3,
            author_name: "Ravi".into(),
            rating: 5,
            comment: "Crisp dosas".into(),
            is_visible: true,
            created_at: chrono::Utc::now(),
        }])
    });
    db
}

#[actix_web::test]
async fn menu_of_unknown_restaurant() {
    let _ = env_logger::try_init().ok();
    let res = send_request(TestRequest::get().uri("/menu/nowhere"), None, configure_menu(menu_backend())).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "No restaurant is published at 'nowhere'");
}

#[actix_web::test]
async fn menu_is_grouped_by_category() {
    let _ = env_logger::try_init().ok();
    let res = send_request(TestRequest::get().uri("/menu/spice-garden"), None, configure_menu(menu_backend())).await;
    assert_eq!(res.status, StatusCode::OK);
    let menu = res.json();
    assert_eq!(menu["branding"]["name"], "Spice Garden");
    assert_eq!(menu["table_number"], serde_json::Value::Null);
    let categories = menu["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["name"], "Breakfast");
    assert_eq!(categories[0]["items"].as_array().unwrap().len(), 2);
    assert_eq!(categories[0]["items"][1]["name"], "Idli");
    assert_eq!(categories[0]["items"][1]["is_out_of_stock"], false);
    assert_eq!(categories[1]["name"], "Drinks");
    assert_eq!(menu["reviews"][0]["author_name"], "Ravi");
}

#[actix_web::test]
async fn menu_for_a_table() {
    let _ = env_logger::try_init().ok();
    let res =
        send_request(TestRequest::get().uri("/menu/spice-garden?table=4"), None, configure_menu(menu_backend())).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["table_number"], 4);
    // The restaurant has 12 tables
    let res =
        send_request(TestRequest::get().uri("/menu/spice-garden?table=13"), None, configure_menu(menu_backend())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res =
        send_request(TestRequest::get().uri("/menu/spice-garden?table=0"), None, configure_menu(menu_backend())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

//----------------------------------------------   Checkout  ----------------------------------------------------

fn configure_checkout(restaurants: MockStorefront, checkout: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(RestaurantApi::new(restaurants)))
            .app_data(web::Data::new(CheckoutApi::new(checkout, EventProducers::default())))
            .service(CheckoutRoute::<MockStorefront>::new());
    }
}

fn slug_lookup(accepting: bool) -> MockStorefront {
    let mut db = MockStorefront::new();
    db.expect_fetch_restaurant_by_slug().returning(move |slug| {
        let mut restaurant = restaurant(3, OWNER_ID, slug);
        restaurant.is_accepting_orders = accepting;
        Ok(Some(restaurant))
    });
    db
}

fn checkout_backend() -> MockStorefront {
    let mut db = MockStorefront::new();
    db.expect_fetch_menu_for_restaurant().withf(|id, _| *id == 3).returning(|_, _| {
        Ok(vec![menu_item(1, 3, "Masala Dosa", 90, "Breakfast"), menu_item(2, 3, "Filter Coffee", 30, "Drinks")])
    });
    db.expect_fetch_inventory_for_restaurant().returning(|_| Ok(vec![]));
    db
}

fn checkout_form() -> serde_json::Value {
    json!({
        "customer_name": "  Asha ",
        "customer_phone": "9845012345",
        "customer_address": "12 MG Road",
        "payment_method": "upi",
        "items": [
            { "menu_item_id": 1, "quantity": 2 },
            { "menu_item_id": 2, "quantity": 1 }
        ]
    })
}

#[actix_web::test]
async fn delivery_checkout() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order()
        .withf(|o| {
            o.order_type == OrderType::Delivery &&
                o.customer_name == "Asha" &&
                o.customer_address == "12 MG Road" &&
                o.payment_method == PaymentMethod::Upi &&
                o.table_number.is_none() &&
                o.order_details.len() == 2 &&
                o.order_details[0].quantity == 2
        })
        .times(1)
        .returning(|o| Ok(placed_order("ord-1", o)));
    let req = TestRequest::post().uri("/menu/spice-garden/checkout").set_json(checkout_form());
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let receipt = res.json();
    assert_eq!(receipt["order_id"], "ord-1");
    assert_eq!(receipt["tracking_path"], "/order-success/ord-1");
    assert_eq!(receipt["total_amount"], json!(Money::from_major(210)));
    let cookie = res.cookie(ACTIVE_ORDER_COOKIE).expect("No active-order cookie");
    assert_eq!(cookie.value(), "ord-1");
    assert_eq!(cookie.http_only(), Some(true));
}

#[actix_web::test]
async fn dine_in_checkout_ignores_the_address() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order()
        .withf(|o| {
            o.order_type == OrderType::DineIn &&
                o.customer_address == "Table 7" &&
                o.table_number == Some(7) &&
                o.location.is_none()
        })
        .times(1)
        .returning(|o| Ok(placed_order("ord-2", o)));
    let mut form = checkout_form();
    form["latitude"] = json!(12.97);
    form["longitude"] = json!(77.59);
    let req = TestRequest::post().uri("/menu/spice-garden/checkout?table=7").set_json(form);
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.cookie(ACTIVE_ORDER_COOKIE).map(|c| c.value().to_string()), Some("ord-2".to_string()));
}

#[actix_web::test]
async fn checkout_with_an_empty_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order().never();
    let mut form = checkout_form();
    form["items"] = json!([]);
    let req = TestRequest::post().uri("/menu/spice-garden/checkout").set_json(form);
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Your cart is empty");
    assert!(res.cookie(ACTIVE_ORDER_COOKIE).is_none());
}

#[actix_web::test]
async fn checkout_without_a_phone_number() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order().never();
    let mut form = checkout_form();
    form["customer_phone"] = json!("   ");
    let req = TestRequest::post().uri("/menu/spice-garden/checkout").set_json(form);
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn checkout_when_the_kitchen_is_closed() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order().never();
    let req = TestRequest::post()
        .uri("/menu/spice-garden/checkout")
        .cookie(Cookie::new(ACTIVE_ORDER_COOKIE, "ord-old"))
        .set_json(checkout_form());
    let res = send_request(req, None, configure_checkout(slug_lookup(false), db)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json()["error"], "Spice Garden is not accepting orders right now");
    // The pointer to the earlier order is left alone
    assert!(res.cookie(ACTIVE_ORDER_COOKIE).is_none());
}

#[actix_web::test]
async fn checkout_with_a_stale_menu_item() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order().never();
    let mut form = checkout_form();
    form["items"] = json!([{ "menu_item_id": 99, "quantity": 1 }]);
    let req = TestRequest::post().uri("/menu/spice-garden/checkout").set_json(form);
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn checkout_with_an_absurd_quantity() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order().never();
    let mut form = checkout_form();
    form["items"] = json!([{ "menu_item_id": 1, "quantity": 1_000_000_000_000_000i64 }]);
    let req = TestRequest::post().uri("/menu/spice-garden/checkout").set_json(form);
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "At most 1000 portions of Masala Dosa can be ordered at once");

    // Two lines for one dish are added up before the cap is applied
    let mut db = checkout_backend();
    db.expect_insert_order().never();
    let mut form = checkout_form();
    form["items"] = json!([{ "menu_item_id": 1, "quantity": 600 }, { "menu_item_id": 1, "quantity": i64::MAX }]);
    let req = TestRequest::post().uri("/menu/spice-garden/checkout").set_json(form);
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.cookie(ACTIVE_ORDER_COOKIE).is_none());
}

#[actix_web::test]
async fn failed_order_insert() {
    let _ = env_logger::try_init().ok();
    let mut db = checkout_backend();
    db.expect_insert_order().returning(|_| Err(GatewayError::DriverError("disk I/O error".into())));
    let req = TestRequest::post().uri("/menu/spice-garden/checkout").set_json(checkout_form());
    let res = send_request(req, None, configure_checkout(slug_lookup(true), db)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.cookie(ACTIVE_ORDER_COOKIE).is_none());
}

//----------------------------------------------   Reviews  ----------------------------------------------------

fn configure_reviews(db: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(RestaurantApi::new(db))).service(SubmitReviewRoute::<MockStorefront>::new());
    }
}

#[actix_web::test]
async fn reviews_start_hidden() {
    let _ = env_logger::try_init().ok();
    let mut db = slug_lookup(true);
    db.expect_insert_review().withf(|id, r| *id == 3 && r.rating == 4).times(1).returning(|id, r| {
        Ok(Review {
            id: 11,
            restaurant_id: id,
            author_name: r.author_name,
            rating: r.rating,
            comment: r.comment,
            is_visible: false,
            created_at: chrono::Utc::now(),
        })
    });
    let req = TestRequest::post()
        .uri("/menu/spice-garden/reviews")
        .set_json(json!({ "author_name": "Meera", "rating": 4, "comment": "Good coffee" }));
    let res = send_request(req, None, configure_reviews(db)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["is_visible"], false);
}

#[actix_web::test]
async fn reviews_need_a_rating_from_one_to_five() {
    let _ = env_logger::try_init().ok();
    let mut db = slug_lookup(true);
    db.expect_insert_review().never();
    let req =
        TestRequest::post().uri("/menu/spice-garden/reviews").set_json(json!({ "author_name": "Meera", "rating": 6 }));
    let res = send_request(req, None, configure_reviews(db)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

//----------------------------------------------   Order tracking  ----------------------------------------------------

#[actix_web::test]
async fn active_order_comes_from_the_cookie() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/active-order").cookie(Cookie::new(ACTIVE_ORDER_COOKIE, "ord-1"));
    let res = send_request(req, None, |cfg| {
        cfg.service(active_order);
    })
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "order_id": "ord-1" }));
    let res = send_request(TestRequest::get().uri("/active-order"), None, |cfg| {
        cfg.service(active_order);
    })
    .await;
    assert_eq!(res.json(), json!({ "order_id": null }));
}

fn tracking_backend(status: OrderStatusType) -> MockStorefront {
    let mut db = MockStorefront::new();
    db.expect_fetch_order().returning(move |id| match id.as_str() {
        "ord-1" => Ok(Some(order("ord-1", 3, status))),
        _ => Ok(None),
    });
    db.expect_fetch_restaurant().returning(|id| Ok(Some(restaurant(id, OWNER_ID, "spice-garden"))));
    db
}

fn configure_tracking(flow: MockStorefront, restaurants: MockStorefront) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(flow, EventProducers::default())))
            .app_data(web::Data::new(RestaurantApi::new(restaurants)))
            .service(OrderSuccessLiveRoute::<MockStorefront>::new())
            .service(OrderSuccessRoute::<MockStorefront>::new());
    }
}

#[actix_web::test]
async fn tracking_an_unknown_order() {
    let _ = env_logger::try_init().ok();
    let configure = configure_tracking(tracking_backend(OrderStatusType::Pending), MockStorefront::new());
    let res = send_request(TestRequest::get().uri("/order-success/ord-404"), None, configure).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn tracking_an_order_in_progress() {
    let _ = env_logger::try_init().ok();
    let configure = configure_tracking(
        tracking_backend(OrderStatusType::Preparing),
        tracking_backend(OrderStatusType::Preparing),
    );
    let req = TestRequest::get().uri("/order-success/ord-1").cookie(Cookie::new(ACTIVE_ORDER_COOKIE, "ord-1"));
    let res = send_request(req, None, configure).await;
    assert_eq!(res.status, StatusCode::OK);
    let state = res.json();
    assert_eq!(state["view"]["state"], "tracking");
    assert_eq!(state["view"]["is_terminal"], false);
    assert_eq!(state["view"]["progress"].as_array().unwrap().len(), 5);
    assert_eq!(state["branding"]["slug"], "spice-garden");
    assert!(res.cookie(ACTIVE_ORDER_COOKIE).is_none());
}

#[actix_web::test]
async fn finished_orders_clear_the_active_order() {
    let _ = env_logger::try_init().ok();
    let configure = configure_tracking(
        tracking_backend(OrderStatusType::Delivered),
        tracking_backend(OrderStatusType::Delivered),
    );
    let req = TestRequest::get().uri("/order-success/ord-1").cookie(Cookie::new(ACTIVE_ORDER_COOKIE, "ord-1"));
    let res = send_request(req, None, configure).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["view"]["is_terminal"], true);
    let cookie = res.cookie(ACTIVE_ORDER_COOKIE).expect("Expected a removal cookie");
    assert_eq!(cookie.value(), "");
}

#[actix_web::test]
async fn finished_orders_keep_a_newer_active_order() {
    let _ = env_logger::try_init().ok();
    let configure = configure_tracking(
        tracking_backend(OrderStatusType::Cancelled),
        tracking_backend(OrderStatusType::Cancelled),
    );
    let req = TestRequest::get().uri("/order-success/ord-1").cookie(Cookie::new(ACTIVE_ORDER_COOKIE, "ord-2"));
    let res = send_request(req, None, configure).await;
    assert_eq!(res.status, StatusCode::OK);
    let state = res.json();
    assert_eq!(state["view"]["progress"], serde_json::Value::Null);
    assert!(state["view"]["terminal_message"].is_string());
    assert!(res.cookie(ACTIVE_ORDER_COOKIE).is_none());
}

#[actix_web::test]
async fn live_tracker_ends_with_the_order() {
    let _ = env_logger::try_init().ok();
    let mut flow = MockStorefront::new();
    flow.expect_clone().returning(|| {
        let feed = ChangeFeed::new(8);
        let mut db = tracking_backend(OrderStatusType::Delivered);
        db.expect_subscribe().returning(move |filter| feed.subscribe(filter));
        db
    });
    let configure = configure_tracking(flow, MockStorefront::new());
    let res = send_request(TestRequest::get().uri("/order-success/ord-1/live"), None, configure).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.starts_with("data: "));
    assert!(res.body.contains(r#""state":"tracking""#));
    assert!(res.body.contains(r#""status":"delivered""#));
    assert!(res.body.ends_with("\n\n"));
}
