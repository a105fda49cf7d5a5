pub mod salary;
pub mod time;
