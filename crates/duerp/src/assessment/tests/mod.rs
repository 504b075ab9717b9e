mod common;
mod document;
mod routing;
mod scoring;
