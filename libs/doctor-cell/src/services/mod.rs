pub mod catalog;

pub use catalog::{DoctorCatalog, InMemoryDoctorCatalog};
