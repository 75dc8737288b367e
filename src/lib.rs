//! Terminal globe of climate-story locations: a braille globe with a
//! command palette, storybook flipbooks, a country data explorer and a
//! contact endpoint.

pub mod app;
pub mod book;
pub mod braille;
pub mod capability;
pub mod config;
pub mod contact;
pub mod data;
pub mod deeplink;
pub mod explorer;
pub mod geo;
pub mod globe;
pub mod hash;
pub mod overlay;
pub mod palette;
pub mod ui;
