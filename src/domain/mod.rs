pub mod bill;
pub mod checkout;
pub mod payer;
pub mod ports;
