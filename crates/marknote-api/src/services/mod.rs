//! Service layer for business logic.

pub mod containment;
pub mod registration;
pub mod sessions;

pub use containment::ContainmentService;
pub use registration::RegistrationService;
pub use sessions::SessionService;
