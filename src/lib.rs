//! Printable point-of-interest map: loads uMap JSON or KML point data, keeps a
//! color legend, and lists the points inside the current view in a stable,
//! numbered order that can be printed next to the map.

pub mod app;
pub mod braille;
pub mod category;
pub mod config;
pub mod data;
pub mod error;
pub mod fragment;
pub mod geo;
pub mod map;
pub mod printable;
pub mod report;
pub mod ui;
