use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use futures::FutureExt;
use log::*;
use qrmenu_engine::{
    events::{ChangeFeed, EventHandlers, EventHooks, EventProducers},
    CheckoutApi,
    MenuApi,
    OrderFlowApi,
    RestaurantApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    routes::{
        active_order,
        health,
        not_found,
        AddInventoryItemRoute,
        AddMenuItemRoute,
        CheckoutRoute,
        InventoryStockRoute,
        MenuAvailabilityRoute,
        MyInventoryRoute,
        MyMenuRoute,
        MyRestaurantRoute,
        OrderActionRoute,
        OrderBoardLiveRoute,
        OrderBoardRoute,
        OrderDetailRoute,
        OrderStatusRoute,
        OrderSuccessLiveRoute,
        OrderSuccessRoute,
        PublicMenuRoute,
        ReviewVisibilityRoute,
        SaveRestaurantRoute,
        SubmitReviewRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let feed = ChangeFeed::new(config.change_feed_capacity);
    let db = SqliteDatabase::new_with_feed(&config.database_url, config.db_max_connections, feed)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🚀️ Database migrations are up to date");
    }
    let handlers = EventHandlers::new(config.event_buffer_size, audit_log_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Hooks that write every new order and every status change to the `qrm::audit` log target.
pub fn audit_log_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|ev| {
            async move {
                let order = ev.order;
                info!(
                    target: "qrm::audit",
                    "🪝️ Order {} placed at restaurant {}. {} for {} ({} item(s), {})",
                    order.id,
                    order.restaurant_id,
                    order.order_type,
                    order.total_amount,
                    order.item_count(),
                    order.payment_method
                );
            }
            .boxed()
        })
        .on_status_changed(|ev| {
            async move {
                info!(
                    target: "qrm::audit",
                    "🪝️ Order {} at restaurant {} moved from {} to {}",
                    ev.order.id,
                    ev.order.restaurant_id,
                    ev.old_status,
                    ev.new_status()
                );
            }
            .boxed()
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let checkout_api = CheckoutApi::new(db.clone(), producers.clone());
        let menu_api = MenuApi::new(db.clone());
        let restaurant_api = RestaurantApi::new(db.clone());
        let token_issuer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("qrm::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(menu_api))
            .app_data(web::Data::new(restaurant_api))
            .app_data(web::Data::new(token_issuer))
            .app_data(web::Data::new(options));
        // Routes that require an owner token. The live board must be registered before the order detail route.
        let owner_scope = web::scope("/api")
            .service(OrderBoardRoute::<SqliteDatabase>::new())
            .service(OrderBoardLiveRoute::<SqliteDatabase>::new())
            .service(OrderDetailRoute::<SqliteDatabase>::new())
            .service(OrderActionRoute::<SqliteDatabase>::new())
            .service(OrderStatusRoute::<SqliteDatabase>::new())
            .service(MyRestaurantRoute::<SqliteDatabase>::new())
            .service(SaveRestaurantRoute::<SqliteDatabase>::new())
            .service(ReviewVisibilityRoute::<SqliteDatabase>::new())
            .service(MyMenuRoute::<SqliteDatabase>::new())
            .service(AddMenuItemRoute::<SqliteDatabase>::new())
            .service(MenuAvailabilityRoute::<SqliteDatabase>::new())
            .service(MyInventoryRoute::<SqliteDatabase>::new())
            .service(AddInventoryItemRoute::<SqliteDatabase>::new())
            .service(InventoryStockRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(active_order)
            .service(PublicMenuRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(SubmitReviewRoute::<SqliteDatabase>::new())
            .service(OrderSuccessRoute::<SqliteDatabase>::new())
            .service(OrderSuccessLiveRoute::<SqliteDatabase>::new())
            .service(owner_scope)
            .default_service(web::to(not_found))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
