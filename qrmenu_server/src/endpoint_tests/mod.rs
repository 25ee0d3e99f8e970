mod helpers;
mod settings;
mod storefront;
