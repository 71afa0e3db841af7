pub mod category;
pub mod product;
pub mod stock_movement;
pub mod user;

pub use category::*;
pub use product::*;
pub use stock_movement::*;
pub use user::*;
