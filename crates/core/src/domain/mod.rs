pub mod pickem;
