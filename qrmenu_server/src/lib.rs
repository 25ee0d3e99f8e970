//! # QR Menu Storefront server
//! This crate hosts the HTTP server for the storefront. It is responsible for:
//! * Serving the public menu of each restaurant, optionally scoped to a table by its QR code.
//! * Taking orders at checkout and remembering the customer's active order in a cookie.
//! * Showing customers the status of their order, as a snapshot or as a live event stream.
//! * The owner dashboard API: the order board, order actions, restaurant settings, menu and inventory.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/menu/{slug}`, `/menu/{slug}/checkout`, `/menu/{slug}/reviews`: the public storefront.
//! * `/order-success/{order_id}` and `/order-success/{order_id}/live`: order tracking.
//! * `/active-order`: the order id remembered in the customer's cookie.
//! * `/api/...`: the owner dashboard. These routes need an `Authorization: Bearer <token>` header.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
