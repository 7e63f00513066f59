pub mod webp;
pub mod webp_sys;
