pub mod conflict;
pub mod lifecycle;
pub mod repository;
pub mod slip;
pub mod validation;
pub mod workflow;

pub use workflow::AppointmentWorkflowService;
