use cucumber::{given, then, when};
use qrmenu_engine::{
    db_types::{
        GeoPoint,
        MenuItemUpdate,
        Money,
        NewInventoryItem,
        NewMenuItem,
        OrderStatusType,
        OrderType,
        Quantity,
        RestaurantSettings,
    },
    lifecycle::{owner_actions, Actor, OwnerAction},
    live::ActiveOrderStore,
    storefront::CheckoutDetails,
    CheckoutError,
    MenuManagement,
    OrderFlowError,
    OrderManagement,
};

use crate::cucumber::{world::Storefront, StorefrontWorld};

//--------------------------------------         Setup         -------------------------------------------------------

#[given(expr = "a restaurant {string} with {int} tables")]
async fn fresh_restaurant(world: &mut StorefrontWorld, slug: String, tables: i64) {
    world.system = Some(Storefront::new("owner-1", &slug, tables).await);
}

#[given(expr = "a second restaurant {string}")]
async fn second_restaurant(world: &mut StorefrontWorld, slug: String) {
    let sys = world.sys();
    let owner = format!("owner-of-{slug}");
    let settings = RestaurantSettings::new("Dosa Corner", slug.as_str());
    let r = sys.restaurants.save_settings(&owner, settings).await.expect("Error creating second restaurant");
    sys.restaurant_ids.insert(slug, r.id);
}

#[given("the restaurant is not accepting orders")]
async fn stop_taking_orders(world: &mut StorefrontWorld) {
    let sys = world.sys();
    let restaurant = sys.restaurants.restaurant_by_slug(&sys.current_slug).await.expect("Restaurant is missing");
    let settings = RestaurantSettings::new(restaurant.name.as_str(), restaurant.slug.as_str())
        .with_tables(restaurant.total_tables)
        .accepting_orders(false);
    sys.restaurants.save_settings("owner-1", settings).await.expect("Error saving settings");
}

#[given(expr = "a dish {string} at {int} that needs {int} grams of {string} with {int} grams in stock")]
async fn dish_with_recipe(
    world: &mut StorefrontWorld,
    dish: String,
    price: i64,
    needed: i64,
    component: String,
    stock: i64,
) {
    let sys = world.sys();
    let restaurant_id = sys.restaurant_id();
    let component = NewInventoryItem::new(restaurant_id, component.as_str(), Quantity::from_milli(stock), "kg");
    let component = sys.menu.add_inventory_item(restaurant_id, component).await.expect("Error adding inventory");
    let item = NewMenuItem::new(restaurant_id, dish.as_str(), Money::from_major(price))
        .with_category("Mains")
        .with_ingredient(component.id, Quantity::from_milli(needed));
    let item = sys.menu.add_menu_item(restaurant_id, item).await.expect("Error adding dish");
    sys.dishes.insert(dish, item.id);
}

//--------------------------------------         Cart          -------------------------------------------------------

#[when(expr = "the customer adds {int} of {string} to the cart")]
async fn add_to_cart(world: &mut StorefrontWorld, quantity: i64, dish: String) {
    let sys = world.sys();
    let item = sys.db.fetch_menu_item(sys.dish(&dish)).await.expect("Error fetching dish").expect("Dish is missing");
    for _ in 0..quantity {
        sys.cart.add_to_cart(&item);
    }
}

#[then(expr = "the cart total is {int}")]
async fn cart_total(world: &mut StorefrontWorld, total: i64) {
    assert_eq!(world.sys().cart.total(), Some(Money::from_major(total)));
}

#[then("the cart is empty")]
async fn cart_is_empty(world: &mut StorefrontWorld) {
    assert!(world.sys().cart.is_empty());
}

#[then(expr = "the cart still holds {int} of {string}")]
async fn cart_holds(world: &mut StorefrontWorld, quantity: i64, dish: String) {
    let sys = world.sys();
    assert_eq!(sys.cart.quantity_of(sys.dish(&dish)), quantity);
}

//--------------------------------------       Checkout        -------------------------------------------------------

async fn checkout(sys: &mut Storefront, details: CheckoutDetails) {
    let restaurant = sys.restaurants.restaurant_by_slug(&sys.current_slug).await.expect("Restaurant is missing");
    match sys.checkout.submit(&restaurant, &mut sys.cart, details, &sys.active_order).await {
        Ok(receipt) => {
            assert_eq!(receipt.tracking_path, format!("/order-success/{}", receipt.order.id.as_str()));
            sys.last_order = Some(receipt.order);
            sys.checkout_error = None;
        },
        Err(e) => sys.checkout_error = Some(e),
    }
}

#[when(expr = "{string} checks out for delivery to {string} with phone {string}")]
async fn checkout_delivery(world: &mut StorefrontWorld, name: String, address: String, phone: String) {
    let details = CheckoutDetails::new(name, phone, None, Some(address), Some(GeoPoint::new(12.97, 77.59)));
    checkout(world.sys(), details).await;
}

#[when(expr = "{string} checks out at table {int} with phone {string}")]
async fn checkout_dine_in(world: &mut StorefrontWorld, name: String, table: i64, phone: String) {
    let details = CheckoutDetails::new(name, phone, Some(table), None, None);
    checkout(world.sys(), details).await;
}

#[given(expr = "{string} has placed an order")]
async fn placed_order(world: &mut StorefrontWorld, name: String) {
    add_to_cart(world, 2, "Dish A".into()).await;
    add_to_cart(world, 1, "Dish B".into()).await;
    checkout_delivery(world, name, "12 MG Road".into(), "9845012345".into()).await;
    assert!(world.sys().last_order.is_some(), "Checkout failed: {:?}", world.sys().checkout_error);
}

#[then("the active order points at the new order")]
async fn active_order_is_set(world: &mut StorefrontWorld) {
    let sys = world.sys();
    assert_eq!(sys.active_order.get(), Some(sys.order().id.clone()));
}

#[then("no active order is set")]
async fn no_active_order(world: &mut StorefrontWorld) {
    assert_eq!(world.sys().active_order.get(), None);
}

#[then("checkout fails with a validation error")]
async fn validation_error(world: &mut StorefrontWorld) {
    let err = world.sys().checkout_error.clone();
    assert!(matches!(err, Some(CheckoutError::Validation(_))), "Expected a validation error, got {err:?}");
}

#[then("checkout fails because the restaurant is closed")]
async fn restaurant_closed(world: &mut StorefrontWorld) {
    let err = world.sys().checkout_error.clone();
    assert!(matches!(err, Some(CheckoutError::NotAcceptingOrders(_))), "Got {err:?}");
}

#[then(expr = "checkout fails because table {int} does not exist")]
async fn no_such_table(world: &mut StorefrontWorld, table: i64) {
    let err = world.sys().checkout_error.clone();
    assert!(matches!(err, Some(CheckoutError::InvalidTable(t)) if t == table), "Got {err:?}");
}

#[then(expr = "checkout fails because {string} is unavailable")]
async fn item_unavailable(world: &mut StorefrontWorld, dish: String) {
    let err = world.sys().checkout_error.clone();
    assert!(matches!(&err, Some(CheckoutError::ItemUnavailable(name)) if name == &dish), "Got {err:?}");
}

#[then(expr = "{string} is out of stock on the public menu")]
async fn out_of_stock(world: &mut StorefrontWorld, dish: String) {
    let sys = world.sys();
    let menu = sys.menu.public_menu(&sys.current_slug, None).await.expect("Error fetching menu");
    let id = sys.dish(&dish);
    let item = menu.items().find(|i| i.item.id == id).expect("Dish is not on the menu");
    assert!(item.is_out_of_stock);
    assert!(!item.is_purchasable());
}

//--------------------------------------       The order       -------------------------------------------------------

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut StorefrontWorld, status: String) {
    let sys = world.sys();
    let expected = status.parse::<OrderStatusType>().expect("Not a status");
    let stored = sys.db.fetch_order(&sys.order().id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(stored.status, expected);
}

#[then(expr = "the order type is {word}")]
async fn order_type(world: &mut StorefrontWorld, order_type_str: String) {
    let expected = match order_type_str.as_str() {
        "DELIVERY" => OrderType::Delivery,
        "DINE_IN" => OrderType::DineIn,
        s => panic!("Unknown order type {s}"),
    };
    assert_eq!(world.sys().order().order_type, expected);
}

#[then(expr = "the order is for table {int}")]
async fn order_table(world: &mut StorefrontWorld, table: i64) {
    assert_eq!(world.sys().order().table_number, Some(table));
}

#[then(expr = "the order address is {string}")]
async fn order_address(world: &mut StorefrontWorld, address: String) {
    assert_eq!(world.sys().order().customer_address, address);
}

#[then("the order has no location")]
async fn no_location(world: &mut StorefrontWorld) {
    assert_eq!(world.sys().order().location, None);
}

#[then(expr = "the stored order has {int} lines and a total of {int}")]
async fn stored_totals(world: &mut StorefrontWorld, lines: usize, total: i64) {
    let sys = world.sys();
    let stored = sys.db.fetch_order(&sys.order().id).await.expect("Error fetching order").expect("Order is missing");
    assert_eq!(stored.order_details.len(), lines);
    assert_eq!(stored.total_amount, Money::from_major(total));
}

#[then(expr = "stored order line {int} is {int} x {string} at {int}")]
async fn stored_line(world: &mut StorefrontWorld, n: usize, quantity: i64, name: String, price: i64) {
    let sys = world.sys();
    let stored = sys.db.fetch_order(&sys.order().id).await.expect("Error fetching order").expect("Order is missing");
    let line = &stored.order_details[n - 1];
    assert_eq!(line.quantity, quantity);
    assert_eq!(line.name, name);
    assert_eq!(line.unit_price, Money::from_major(price));
}

//--------------------------------------      Menu edits       -------------------------------------------------------

#[when(expr = "the owner changes the price of {string} to {int}")]
async fn change_price(world: &mut StorefrontWorld, dish: String, price: i64) {
    let sys = world.sys();
    let update = MenuItemUpdate::default().with_price(Money::from_major(price));
    sys.menu.update_menu_item(sys.restaurant_id(), sys.dish(&dish), update).await.expect("Error changing price");
}

#[when(expr = "the owner renames {string} to {string}")]
async fn rename(world: &mut StorefrontWorld, dish: String, name: String) {
    let sys = world.sys();
    let update = MenuItemUpdate::default().with_name(name.as_str());
    sys.menu.update_menu_item(sys.restaurant_id(), sys.dish(&dish), update).await.expect("Error renaming dish");
}

#[when(expr = "the owner switches off {string}")]
async fn switch_off(world: &mut StorefrontWorld, dish: String) {
    let sys = world.sys();
    sys.menu.set_item_availability(sys.restaurant_id(), sys.dish(&dish), false).await.expect("Error switching off");
}

//--------------------------------------       Lifecycle       -------------------------------------------------------

async fn owner_action(sys: &mut Storefront, slug: &str, action: OwnerAction) {
    let restaurant_id = sys.restaurant_ids[slug];
    let order_id = sys.order().id.clone();
    match sys.flow.perform_owner_action(restaurant_id, &order_id, action).await {
        Ok(_) => sys.flow_error = None,
        Err(e) => sys.flow_error = Some(e),
    }
}

#[when("the owner advances the order")]
async fn advance(world: &mut StorefrontWorld) {
    let sys = world.sys();
    let slug = sys.current_slug.clone();
    owner_action(sys, &slug, OwnerAction::Advance).await;
}

#[when("the owner cancels the order")]
async fn cancel(world: &mut StorefrontWorld) {
    let sys = world.sys();
    let slug = sys.current_slug.clone();
    owner_action(sys, &slug, OwnerAction::Cancel).await;
}

#[when(expr = "the owner of {string} advances the order")]
async fn other_owner_advances(world: &mut StorefrontWorld, slug: String) {
    owner_action(world.sys(), &slug, OwnerAction::Advance).await;
}

#[when(expr = "the integration moves the order to {word}")]
async fn integration_moves(world: &mut StorefrontWorld, status: String) {
    let sys = world.sys();
    let to = status.parse::<OrderStatusType>().expect("Not a status");
    let order_id = sys.order().id.clone();
    match sys.flow.transition_order(&order_id, to, Actor::Integration).await {
        Ok(_) => sys.flow_error = None,
        Err(e) => sys.flow_error = Some(e),
    }
}

#[then(expr = "the owner is offered {string}")]
async fn offered_actions(world: &mut StorefrontWorld, expected: String) {
    let sys = world.sys();
    let stored = sys.db.fetch_order(&sys.order().id).await.expect("Error fetching order").expect("Order is missing");
    let offered = owner_actions(stored.status)
        .into_iter()
        .map(|a| format!("{} to {}", a.action, a.target))
        .collect::<Vec<_>>()
        .join(", ");
    let expected = if expected == "nothing" { String::new() } else { expected };
    assert_eq!(offered, expected);
}

#[then("the transition is rejected as illegal")]
async fn rejected_illegal(world: &mut StorefrontWorld) {
    let err = world.sys().flow_error.clone();
    assert!(matches!(err, Some(OrderFlowError::IllegalTransition { .. })), "Got {err:?}");
}

#[then("the action is not available")]
async fn rejected_unavailable(world: &mut StorefrontWorld) {
    let err = world.sys().flow_error.clone();
    assert!(matches!(err, Some(OrderFlowError::ActionUnavailable { .. })), "Got {err:?}");
}

#[then("the request is forbidden")]
async fn rejected_forbidden(world: &mut StorefrontWorld) {
    let err = world.sys().flow_error.clone();
    assert!(matches!(err, Some(OrderFlowError::Forbidden(_))), "Got {err:?}");
}
