pub mod counter;
pub mod users;
