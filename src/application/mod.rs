pub mod checkout;
pub mod reconcile;
pub mod resolver;
pub mod selection;
pub mod session;
