pub mod fused;
pub mod intent;
pub mod location;
pub mod recommendation;
pub mod response;
pub mod soil;
pub mod ui;

pub use fused::*;
pub use intent::*;
pub use location::*;
pub use recommendation::*;
pub use response::*;
pub use soil::*;
pub use ui::*;
