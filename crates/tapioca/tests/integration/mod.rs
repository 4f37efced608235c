//! Integration tests.

mod export;
mod grids;
mod particles;
