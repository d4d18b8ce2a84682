pub mod debounce;
pub mod scratch;
