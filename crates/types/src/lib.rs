pub mod order;
pub mod policy;
pub mod run;
pub mod submission;
pub mod update;

pub use order::*;
pub use policy::*;
pub use run::*;
pub use submission::*;
pub use update::*;
