pub mod assets;
pub mod build_info;
pub mod path;
pub mod response;
