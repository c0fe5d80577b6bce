//! Platform directory resolution.

pub mod xdg_root;
