mod cart;
pub mod checkout;

pub use cart::{Cart, CartLine, MAX_LINE_QUANTITY};
pub use checkout::{CartRequestLine, CheckoutApi, CheckoutDetails, CheckoutReceipt, Fulfilment};
