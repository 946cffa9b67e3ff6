pub mod assessments;
pub mod backup;
pub mod class;
pub mod core;
pub mod grades;
pub mod narrative;
pub mod setup;
pub mod students;
