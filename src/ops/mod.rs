pub mod board;
pub mod countdown;
