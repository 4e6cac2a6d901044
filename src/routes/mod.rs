pub mod generate;
pub mod posts;
pub mod versions;

pub use generate::generate_routes;
pub use posts::posts_routes;
pub use versions::versions_routes;
