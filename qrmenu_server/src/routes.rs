//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
//!
//! The live endpoints (`.../live`) answer with a server-sent event stream. Each stream owns a running live view, which
//! stops as soon as the client disconnects and the stream is dropped.
use std::convert::Infallible;

use actix_web::{get, web, web::Bytes, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use futures::{future::ready, stream, Stream, StreamExt};
use log::*;
use qrmenu_engine::{
    db_types::{NewInventoryItem, NewMenuItem, NewReview, OrderId, Restaurant, RestaurantSettings},
    lifecycle::Actor,
    live::{ActiveOrderStore, BoardHandle, BoardRow, BoardState, OrderBoard, OrderTracker, TrackerHandle, TrackerState},
    ChangeNotifications,
    CheckoutApi,
    MenuApi,
    MenuManagement,
    OrderFlowApi,
    OrderManagement,
    RestaurantApi,
    RestaurantManagement,
};

use crate::{
    auth::OwnerClaims,
    config::ServerOptions,
    data_objects::{
        ActionRequest,
        ActiveOrderResponse,
        AvailabilityRequest,
        CheckoutRequest,
        CheckoutResponse,
        JsonResponse,
        StatusRequest,
        StockRequest,
        TableQuery,
        VisibilityRequest,
    },
    errors::ServerError,
    helpers::{active_order_cookie, active_order_from_request, sse_event, sse_response},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Storefront  ----------------------------------------------------
route!(public_menu => Get "/menu/{slug}" impl MenuManagement, RestaurantManagement);
/// The public menu of the restaurant at `slug`: branding, items grouped by category with their stock signals, and the
/// approved reviews. A `?table=N` parameter (from a table's QR code) turns the page into a dine-in menu.
pub async fn public_menu<B>(
    path: web::Path<String>,
    query: web::Query<TableQuery>,
    api: web::Data<MenuApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MenuManagement + RestaurantManagement,
{
    let slug = path.into_inner();
    debug!("💻️ GET menu for '{slug}' (table: {:?})", query.table);
    let menu = api.public_menu(&slug, query.table).await?;
    Ok(HttpResponse::Ok().json(menu))
}

route!(checkout => Post "/menu/{slug}/checkout" impl OrderManagement, MenuManagement, RestaurantManagement);
/// Places an order at the restaurant at `slug`.
///
/// The cart is rebuilt from the current menu, so the prices the customer pays are always the ones on the menu right
/// now. On success the response carries the tracking path and sets the active-order cookie.
pub async fn checkout<B>(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<TableQuery>,
    body: web::Json<CheckoutRequest>,
    restaurants: web::Data<RestaurantApi<B>>,
    api: web::Data<CheckoutApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + MenuManagement + RestaurantManagement,
{
    let slug = path.into_inner();
    debug!("💻️ POST checkout at '{slug}'");
    let restaurant = restaurants.restaurant_by_slug(&slug).await?;
    let request = body.into_inner();
    let mut cart = api.price_cart(restaurant.id, &request.items).await?;
    let details = request.into_details(query.table);
    let pointer = active_order_from_request(&req);
    let receipt = api.submit(&restaurant, &mut cart, details, &pointer).await?;
    Ok(HttpResponse::Created()
        .cookie(active_order_cookie(&pointer, &options))
        .json(CheckoutResponse::from(receipt)))
}

route!(submit_review => Post "/menu/{slug}/reviews" impl RestaurantManagement);
/// Reviews are stored hidden. They appear on the menu once the owner makes them visible.
pub async fn submit_review<B: RestaurantManagement>(
    path: web::Path<String>,
    body: web::Json<NewReview>,
    api: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let slug = path.into_inner();
    debug!("💻️ POST review for '{slug}'");
    let review = api.submit_review(&slug, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(review))
}

//----------------------------------------------   Order tracking  ----------------------------------------------------
route!(order_success => Get "/order-success/{order_id}" impl OrderManagement, RestaurantManagement);
/// The customer's view of an order: the order snapshot, the restaurant's branding, and either the progress steps or
/// the terminal message. Once the order is finished, the active-order cookie is removed if it still points here.
pub async fn order_success<B>(
    req: HttpRequest,
    path: web::Path<String>,
    flow: web::Data<OrderFlowApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + RestaurantManagement,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET order-success for {order_id}");
    let order = flow
        .fetch_order(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    let branding = restaurants.branding(order.restaurant_id).await?;
    let state = TrackerState { order_id: order_id.clone(), view: Some(order).into(), branding, last_error: None };
    let mut response = HttpResponse::Ok();
    let pointer = active_order_from_request(&req);
    if state.view.is_terminal() && pointer.clear_if(&order_id) {
        debug!("💻️ Order {order_id} is finished. Removing the active-order cookie");
        response.cookie(active_order_cookie(&pointer, &options));
    }
    Ok(response.json(state))
}

route!(order_success_live => Get "/order-success/{order_id}/live" impl OrderManagement, RestaurantManagement, ChangeNotifications, Clone);
/// A live stream of the customer's view of an order. The stream ends once the order is finished.
pub async fn order_success_live<B>(path: web::Path<String>, flow: web::Data<OrderFlowApi<B>>) -> HttpResponse
where B: OrderManagement + RestaurantManagement + ChangeNotifications + Clone + 'static {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET live tracker for {order_id}");
    let tracker = OrderTracker::new(flow.db().clone(), order_id).start();
    sse_response(tracker_events(tracker))
}

fn tracker_events(tracker: TrackerHandle) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let first = sse_event(&tracker.snapshot());
    stream::once(ready(Ok::<_, Infallible>(first))).chain(stream::unfold(tracker, |mut tracker| async move {
        let state = tracker.changed().await?;
        Some((Ok::<_, Infallible>(sse_event(&state)), tracker))
    }))
}

#[get("/active-order")]
pub async fn active_order(req: HttpRequest) -> impl Responder {
    let order_id = active_order_from_request(&req).get();
    trace!("💻️ GET active order: {order_id:?}");
    HttpResponse::Ok().json(ActiveOrderResponse { order_id })
}

//----------------------------------------------   Order board  ----------------------------------------------------
async fn owner_restaurant<B: RestaurantManagement>(
    claims: &OwnerClaims,
    api: &RestaurantApi<B>,
) -> Result<Restaurant, ServerError> {
    api.restaurant_for_owner(claims.owner_id()).await.map_err(|e| {
        debug!("💻️ No restaurant for owner {}. {e}", claims.owner_id());
        ServerError::from(e)
    })
}

route!(order_board => Get "/api/orders" impl OrderManagement, RestaurantManagement);
/// A snapshot of the owner's order board: the newest orders first, each with the actions the owner may take.
pub async fn order_board<B>(
    claims: OwnerClaims,
    flow: web::Data<OrderFlowApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + RestaurantManagement,
{
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    debug!("💻️ GET order board for '{}'", restaurant.slug);
    let orders = flow.orders_for_restaurant(restaurant.id, options.board_order_limit).await?;
    let board = BoardState {
        restaurant_id: restaurant.id,
        loaded: true,
        rows: orders.into_iter().map(BoardRow::from).collect(),
        last_error: None,
        refreshed_at: Some(Utc::now()),
    };
    Ok(HttpResponse::Ok().json(board))
}

route!(order_board_live => Get "/api/orders/live" impl OrderManagement, RestaurantManagement, ChangeNotifications, Clone);
/// A live stream of the owner's order board. A fresh snapshot is sent every time one of the restaurant's orders
/// changes.
pub async fn order_board_live<B>(
    claims: OwnerClaims,
    flow: web::Data<OrderFlowApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + RestaurantManagement + ChangeNotifications + Clone + 'static,
{
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    info!("💻️ Live order board opened for '{}'", restaurant.slug);
    let board = OrderBoard::new(flow.get_ref().clone(), restaurant.id).with_limit(options.board_order_limit).start();
    Ok(sse_response(board_events(board)))
}

fn board_events<B: 'static>(board: BoardHandle<B>) -> impl Stream<Item = Result<Bytes, Infallible>> {
    let first = sse_event(&board.snapshot());
    stream::once(ready(Ok::<_, Infallible>(first))).chain(stream::unfold(board, |mut board| async move {
        let state = board.changed().await?;
        Some((Ok::<_, Infallible>(sse_event(&state)), board))
    }))
}

route!(order_detail => Get "/api/orders/{order_id}" impl OrderManagement, RestaurantManagement);
pub async fn order_detail<B>(
    claims: OwnerClaims,
    path: web::Path<String>,
    flow: web::Data<OrderFlowApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + RestaurantManagement,
{
    let order_id = OrderId::from(path.into_inner());
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    debug!("💻️ GET order {order_id} for '{}'", restaurant.slug);
    let order = flow.order_for_restaurant(restaurant.id, &order_id).await?;
    Ok(HttpResponse::Ok().json(BoardRow::from(order)))
}

route!(order_action => Post "/api/orders/{order_id}/actions" impl OrderManagement, RestaurantManagement);
/// Performs one of the actions offered on the order board (`advance` or `cancel`).
pub async fn order_action<B>(
    claims: OwnerClaims,
    path: web::Path<String>,
    body: web::Json<ActionRequest>,
    flow: web::Data<OrderFlowApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + RestaurantManagement,
{
    let order_id = OrderId::from(path.into_inner());
    let action = body.action;
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    debug!("💻️ POST {action} on order {order_id} for '{}'", restaurant.slug);
    let order = flow.perform_owner_action(restaurant.id, &order_id, action).await?;
    Ok(HttpResponse::Ok().json(BoardRow::from(order)))
}

route!(order_status => Post "/api/orders/{order_id}/status" impl OrderManagement, RestaurantManagement);
/// Moves an order to any status the lifecycle allows from where it is now. This is the surface for integrations such
/// as a delivery partner; people use the order board actions instead.
pub async fn order_status<B>(
    claims: OwnerClaims,
    path: web::Path<String>,
    body: web::Json<StatusRequest>,
    flow: web::Data<OrderFlowApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + RestaurantManagement,
{
    let order_id = OrderId::from(path.into_inner());
    let status = body.status;
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    debug!("💻️ POST status {status} for order {order_id} at '{}'", restaurant.slug);
    let order = flow.transition_for_restaurant(restaurant.id, &order_id, status, Actor::Integration).await?;
    Ok(HttpResponse::Ok().json(BoardRow::from(order)))
}

//----------------------------------------------   Restaurant settings  -----------------------------------------------
route!(my_restaurant => Get "/api/restaurant" impl RestaurantManagement);
pub async fn my_restaurant<B: RestaurantManagement>(
    claims: OwnerClaims,
    api: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let restaurant = owner_restaurant(&claims, &api).await?;
    Ok(HttpResponse::Ok().json(restaurant))
}

route!(save_restaurant => Put "/api/restaurant" impl RestaurantManagement);
/// Saves the owner's settings. The first save creates the restaurant. The slug cannot change after that.
pub async fn save_restaurant<B: RestaurantManagement>(
    claims: OwnerClaims,
    body: web::Json<RestaurantSettings>,
    api: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT restaurant settings for owner {}", claims.owner_id());
    let restaurant = api.save_settings(claims.owner_id(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(restaurant))
}

route!(review_visibility => Patch "/api/reviews/{review_id}/visibility" impl RestaurantManagement);
pub async fn review_visibility<B: RestaurantManagement>(
    claims: OwnerClaims,
    path: web::Path<i64>,
    body: web::Json<VisibilityRequest>,
    api: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let review_id = path.into_inner();
    let restaurant = owner_restaurant(&claims, &api).await?;
    debug!("💻️ PATCH review {review_id} visibility for '{}'", restaurant.slug);
    let review = api.set_review_visibility(restaurant.id, review_id, body.is_visible).await?;
    Ok(HttpResponse::Ok().json(review))
}

//----------------------------------------------   Menu & inventory  -----------------------------------------------
route!(my_menu => Get "/api/menu" impl MenuManagement, RestaurantManagement);
/// The owner's full menu, including items that are switched off
pub async fn my_menu<B>(
    claims: OwnerClaims,
    api: web::Data<MenuApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MenuManagement + RestaurantManagement,
{
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    let items = api.menu_for_restaurant(restaurant.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(add_menu_item => Post "/api/menu" impl MenuManagement, RestaurantManagement);
pub async fn add_menu_item<B>(
    claims: OwnerClaims,
    body: web::Json<NewMenuItem>,
    api: web::Data<MenuApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MenuManagement + RestaurantManagement,
{
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    let item = api.add_menu_item(restaurant.id, body.into_inner()).await?;
    info!("💻️ '{}' added to the menu of '{}'", item.name, restaurant.slug);
    Ok(HttpResponse::Created().json(item))
}

route!(menu_availability => Patch "/api/menu/{item_id}/availability" impl MenuManagement, RestaurantManagement);
pub async fn menu_availability<B>(
    claims: OwnerClaims,
    path: web::Path<i64>,
    body: web::Json<AvailabilityRequest>,
    api: web::Data<MenuApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MenuManagement + RestaurantManagement,
{
    let item_id = path.into_inner();
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    debug!("💻️ PATCH availability of menu item {item_id} for '{}'", restaurant.slug);
    let item = api.set_item_availability(restaurant.id, item_id, body.is_available).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(my_inventory => Get "/api/inventory" impl MenuManagement, RestaurantManagement);
pub async fn my_inventory<B>(
    claims: OwnerClaims,
    api: web::Data<MenuApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MenuManagement + RestaurantManagement,
{
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    let items = api.inventory(restaurant.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(add_inventory_item => Post "/api/inventory" impl MenuManagement, RestaurantManagement);
pub async fn add_inventory_item<B>(
    claims: OwnerClaims,
    body: web::Json<NewInventoryItem>,
    api: web::Data<MenuApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MenuManagement + RestaurantManagement,
{
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    let item = api.add_inventory_item(restaurant.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(item))
}

route!(inventory_stock => Patch "/api/inventory/{item_id}/stock" impl MenuManagement, RestaurantManagement);
/// Sets the stock level of an inventory item. Menu items that need it are re-evaluated on the next menu fetch.
pub async fn inventory_stock<B>(
    claims: OwnerClaims,
    path: web::Path<i64>,
    body: web::Json<StockRequest>,
    api: web::Data<MenuApi<B>>,
    restaurants: web::Data<RestaurantApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: MenuManagement + RestaurantManagement,
{
    let item_id = path.into_inner();
    let restaurant = owner_restaurant(&claims, &restaurants).await?;
    debug!("💻️ PATCH stock of inventory item {item_id} for '{}'", restaurant.slug);
    let item = api.update_stock(restaurant.id, item_id, body.current_stock).await?;
    Ok(HttpResponse::Ok().json(item))
}

//----------------------------------------------   Misc  ----------------------------------------------------
/// Catch-all for paths that don't match any route
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    debug!("💻️ No route for {} {}", req.method(), req.path());
    HttpResponse::NotFound().json(JsonResponse::failure(format!("{} does not exist", req.path())))
}
