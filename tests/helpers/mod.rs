pub mod builders;
pub mod mock_service;

pub use builders::{AppBuilder, CsvFixture};
pub use mock_service::MockService;
