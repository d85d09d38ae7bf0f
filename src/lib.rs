pub mod atlas;
pub mod config;
pub mod error;
pub mod gallery;
pub mod layout;
pub mod scan;
pub mod scroll;
pub mod render {
    pub mod viewer;
}
