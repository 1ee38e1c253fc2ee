pub mod claim;
pub mod clawback;
pub mod initialize;
pub mod set_operator;
pub mod update_pause;

pub use claim::*;
pub use clawback::*;
pub use initialize::*;
pub use set_operator::*;
pub use update_pause::*;
