pub mod agents;
pub mod cli;
pub mod config;
pub mod doctor;
pub mod error;
pub mod gate;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod report;
pub mod search;
pub mod skill;
pub mod workspace;
