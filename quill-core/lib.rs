pub mod chars;
