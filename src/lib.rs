// Copyright 2025 Cornell University
// released under MIT License

pub mod automaton_parser;
pub mod cascade;
pub mod diagnostic;
pub mod emit;
pub mod errors;
pub mod ir;
pub mod markup;
pub mod pipeline;
pub mod rules_parser;
pub mod sink;
pub mod update;
pub mod uppaal;
