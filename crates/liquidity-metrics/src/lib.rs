pub mod continuity;
pub mod gaps;
pub mod impact;
pub mod penalties;
pub mod safe_trading;
pub mod scaling;
pub mod spread;

pub use continuity::*;
pub use gaps::*;
pub use impact::*;
pub use penalties::*;
pub use safe_trading::*;
pub use scaling::*;
pub use spread::*;
