pub mod account;
pub mod lead;

pub use account::Account;
pub use lead::{Lead, LeadSource, LeadStatus};
