// Library for tests to access modules

pub mod config;
pub mod display;
pub mod event_loop;
pub mod item;
pub mod models;
pub mod sampler;
pub mod surface;
pub mod typesetter;
