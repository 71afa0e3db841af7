// Typed queries the stock pages run, one repository per table

pub mod categories;
pub mod products;
pub mod stock_movements;
pub mod users;

pub use categories::CategoryRepository;
pub use products::ProductRepository;
pub use stock_movements::{net_change, BulkLine, StockMovementRepository};
pub use users::UserRepository;

pub const PRODUCTS: &str = "products";
pub const CATEGORIES: &str = "categories";
pub const STOCK_MOVEMENTS: &str = "stock_movements";
pub const USERS: &str = "users";
