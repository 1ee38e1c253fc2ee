pub mod process_create_artifact;
pub mod process_create_dummy_csv;
pub mod process_new_distribution;
pub mod process_proof;
pub mod process_relay;
pub mod process_verify_artifact;

pub use process_create_artifact::*;
pub use process_create_dummy_csv::*;
pub use process_new_distribution::*;
pub use process_proof::*;
pub use process_relay::*;
pub use process_verify_artifact::*;
