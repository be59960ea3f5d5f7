pub mod analyzers;
pub mod config;
pub mod document;
pub mod extract;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod report;
