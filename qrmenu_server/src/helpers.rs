use std::convert::Infallible;

use actix_web::{
    cookie::{Cookie, SameSite},
    http::header,
    web::Bytes,
    HttpRequest,
    HttpResponse,
};
use futures::Stream;
use log::{trace, warn};
use qrmenu_engine::{
    db_types::OrderId,
    live::{ActiveOrderStore, MemoryActiveOrderStore},
};
use serde::Serialize;

use crate::config::ServerOptions;

/// The cookie holding the customer's last active order id
pub const ACTIVE_ORDER_COOKIE: &str = "qrm_active_order";

/// Loads the active-order pointer from the request's cookie. Handlers hand the store to the engine, then call
/// [`active_order_cookie`] to write back whatever the engine left in it.
pub fn active_order_from_request(req: &HttpRequest) -> MemoryActiveOrderStore {
    let store = MemoryActiveOrderStore::new();
    if let Some(cookie) = req.cookie(ACTIVE_ORDER_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            trace!("💻️ Request carries active order {value}");
            store.set(OrderId::from(value));
        }
    }
    store
}

/// The cookie that records `store`'s pointer, or a removal cookie if the pointer is empty.
pub fn active_order_cookie(store: &MemoryActiveOrderStore, options: &ServerOptions) -> Cookie<'static> {
    let mut cookie = Cookie::build(ACTIVE_ORDER_COOKIE, String::new())
        .path("/")
        .http_only(true)
        .secure(options.secure_cookies)
        .same_site(SameSite::Lax)
        .finish();
    match store.get() {
        Some(order_id) => cookie.set_value(order_id.to_string()),
        None => cookie.make_removal(),
    }
    cookie
}

/// Formats `data` as a single server-sent event
pub fn sse_event<T: Serialize>(data: &T) -> Bytes {
    match serde_json::to_string(data) {
        Ok(json) => Bytes::from(format!("data: {json}\n\n")),
        Err(e) => {
            warn!("💻️ Could not serialize an event for the live stream. {e}");
            Bytes::from_static(b": skipped an event that could not be serialized\n\n")
        },
    }
}

pub fn sse_response<S>(events: S) -> HttpResponse
where S: Stream<Item = Result<Bytes, Infallible>> + 'static {
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events)
}
