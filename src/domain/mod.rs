pub mod espn;
pub mod guide;
pub mod lineup;
pub mod paths;
pub mod refresh;
pub mod settings;
pub mod zap2it;

mod error;

pub use error::AppError;
pub use guide::{Channel, Guide, Programme};
pub use paths::AppPaths;
pub use settings::Settings;
