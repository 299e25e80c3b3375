pub mod account;
pub mod catalog;
pub mod holiday;
pub mod office;

pub use account::AccountService;
pub use catalog::CatalogService;
pub use holiday::HolidayService;
pub use office::OfficeService;
