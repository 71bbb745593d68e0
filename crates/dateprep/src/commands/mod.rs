pub(crate) use assemble::Assemble;
pub(crate) use collections::Collections;
pub(crate) use completions::Completions;
pub(crate) use config::Config;
pub(crate) use dv::Dv;
pub(crate) use import::Import;
pub(crate) use summary::Summary;

mod assemble;
mod collections;
mod completions;
mod config;
mod dv;
mod import;
mod summary;
