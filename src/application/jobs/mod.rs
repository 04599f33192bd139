pub mod registrar;

pub use registrar::{JobRegistrar, JobSyncReport};
